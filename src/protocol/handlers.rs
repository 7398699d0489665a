//! Request handlers for the level editor API.
//!
//! Each handler makes one call into the [`ConfinedFilesystem`] and turns the
//! outcome into a response. Authorization failures come back as
//! `StorageError::AccessDenied` and map to 403 through `IntoResponse`.
//!
//! [`ConfinedFilesystem`]: crate::storage::ConfinedFilesystem

use axum::Json;
use axum::extract::{Form, FromRequest, Multipart, Query, Request, State};
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use log::{debug, info, warn};
use std::ffi::OsStr;
use std::path::Path;

use crate::error::StorageError;
use crate::protocol::AppState;
use crate::protocol::params::{Params, all, first};
use crate::protocol::responses::{
    self, BrowseResponse, SaveResponse, asset, content_type, favicon,
};
use crate::storage::{FileTypeFilter, strip_traversal};

const FAVICON_NAME: &str = "favicon.ico";

/// POST save endpoint: writes `data` to the script at `path`.
///
/// Accepts urlencoded and multipart forms. Outcomes are reported in the JSON
/// body; the status is always 200.
pub async fn save(State(state): State<AppState>, request: Request) -> Json<SaveResponse> {
    let params = save_params(&state, request).await;

    let (Some(path), Some(data)) = (first(&params, "path"), first(&params, "data")) else {
        return Json(SaveResponse::missing_fields());
    };

    let path = strip_traversal(path);
    if !FileTypeFilter::Scripts.matches(Path::new(&path)) {
        return Json(SaveResponse::bad_extension());
    }

    match state.fs.write(&path, data.as_bytes()) {
        Ok(()) => {
            info!("Saved {path} ({} bytes)", data.len());
            Json(SaveResponse::ok())
        }
        Err(e) => {
            warn!("Save failed: {e}");
            Json(SaveResponse::write_failed(&path))
        }
    }
}

/// Decodes the save form. An unreadable body yields no parameters.
async fn save_params(state: &AppState, request: Request) -> Params {
    let multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    if multipart {
        match Multipart::from_request(request, state).await {
            Ok(form) => multipart_params(form).await,
            Err(e) => {
                warn!("Unreadable save form: {e}");
                Params::new()
            }
        }
    } else {
        match Form::<Params>::from_request(request, state).await {
            Ok(Form(params)) => params,
            Err(e) => {
                warn!("Unreadable save form: {e}");
                Params::new()
            }
        }
    }
}

/// Collects the text fields of a multipart form, stopping at the first
/// malformed part.
async fn multipart_params(mut form: Multipart) -> Params {
    let mut params = Params::new();
    loop {
        let field = match form.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart save form: {e}");
                break;
            }
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match field.text().await {
            Ok(value) => params.push((name, value)),
            Err(e) => {
                warn!("Unreadable multipart field {name}: {e}");
                break;
            }
        }
    }
    params
}

/// GET browse endpoint: lists `dir` (default: the root), optionally keeping
/// only images or scripts.
pub async fn browse(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<BrowseResponse>, StorageError> {
    let dir = first(&params, "dir").map(strip_traversal).unwrap_or_default();
    let mut listing = state.fs.browse(&dir)?;

    let types: Vec<&str> = all(&params, "type").collect();
    let filter = if types.contains(&"images") {
        FileTypeFilter::from_param("images")
    } else if types.contains(&"scripts") {
        FileTypeFilter::from_param("scripts")
    } else {
        None
    };
    if let Some(filter) = filter {
        listing.files.retain(|file| filter.matches(Path::new(file)));
    }

    Ok(Json(listing.into()))
}

/// GET glob endpoint: expands every `glob[]` pattern.
pub async fn glob(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Response, StorageError> {
    let patterns: Vec<String> = all(&params, "glob[]").map(str::to_string).collect();
    if patterns.is_empty() {
        debug!("Glob request without patterns");
        return Ok(StatusCode::BAD_REQUEST.into_response());
    }

    let files = state.fs.glob(&patterns)?;
    Ok(Json(files).into_response())
}

/// Fallback: serves static assets for GET, an empty 200 for HEAD and the
/// fixed 405 body for anything else.
pub async fn serve_asset(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method == Method::HEAD {
        return StatusCode::OK.into_response();
    }
    if method != Method::GET {
        return responses::method_not_allowed();
    }

    let path = match uri.path() {
        "/" => state.config.index_file.as_str(),
        "/editor" => state.config.editor_file.as_str(),
        other => other,
    };
    let path = strip_traversal(path.strip_prefix('/').unwrap_or(path));

    match state.fs.read(&path) {
        Ok(data) => asset(data, content_type(&path)),
        Err(e @ StorageError::AccessDenied(_)) => e.into_response(),
        Err(_) if Path::new(&path).file_name() == Some(OsStr::new(FAVICON_NAME)) => favicon(),
        Err(e) => {
            debug!("{e}");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Wrong method on an API endpoint.
pub async fn method_not_allowed() -> Response {
    responses::method_not_allowed()
}
