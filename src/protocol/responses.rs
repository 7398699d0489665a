//! HTTP response handling
//!
//! JSON bodies for the editor API, save error codes, content types and the
//! fixed fallback bodies.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Serialize, Serializer};

use crate::storage::BrowseListing;

/// Save endpoint error codes, carried in the JSON body with HTTP 200
pub const SAVE_OK: u8 = 0;
pub const SAVE_MISSING_FIELDS: u8 = 1;
pub const SAVE_WRITE_FAILED: u8 = 2;
pub const SAVE_BAD_EXTENSION: u8 = 3;

pub const METHOD_NOT_ALLOWED_BODY: &str = "Method Not Allowed";

/// 1x1 transparent GIF served when no favicon exists.
pub const FAVICON_GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\xf0\x00\x00\xff\xff\xff\x00\x00\x00!\xff\x0bXMP DataXMP\x02?x\x00!\xf9\x04\x05\x00\x00\x00\x00,\x00\x00\x00\x00\x01\x00\x01\x00@\x02\x02D\x01\x00;";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SaveResponse {
    pub error: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl SaveResponse {
    pub fn ok() -> Self {
        Self {
            error: SAVE_OK,
            msg: None,
        }
    }

    pub fn missing_fields() -> Self {
        Self {
            error: SAVE_MISSING_FIELDS,
            msg: Some("No Data or Path specified".into()),
        }
    }

    pub fn write_failed(path: &str) -> Self {
        Self {
            error: SAVE_WRITE_FAILED,
            msg: Some(format!("Couldn't write to file {path}")),
        }
    }

    pub fn bad_extension() -> Self {
        Self {
            error: SAVE_BAD_EXTENSION,
            msg: Some("File must have a .js suffix".into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    pub files: Vec<String>,
    pub dirs: Vec<String>,
    /// `false` for the root listing, which is what the editor checks for.
    #[serde(serialize_with = "parent_or_false")]
    pub parent: Option<String>,
}

impl From<BrowseListing> for BrowseResponse {
    fn from(listing: BrowseListing) -> Self {
        Self {
            files: listing.files,
            dirs: listing.dirs,
            parent: listing.parent,
        }
    }
}

fn parent_or_false<S: Serializer>(parent: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match parent {
        Some(parent) => serializer.serialize_str(parent),
        None => serializer.serialize_bool(false),
    }
}

/// Guess a content type from the path's extension.
pub fn content_type(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match ext {
        "js" => "application/javascript",
        "html" => "text/html",
        "css" => "text/css",
        "ico" => "image/vnd.microsoft.icon",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ogg" => "audio/ogg",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

pub fn asset(data: Vec<u8>, content_type: &'static str) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], data).into_response()
}

pub fn favicon() -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "image/gif")], FAVICON_GIF).into_response()
}

pub fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_BODY).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_response_json() {
        assert_eq!(serde_json::to_string(&SaveResponse::ok()).unwrap(), r#"{"error":0}"#);
        assert_eq!(
            serde_json::to_string(&SaveResponse::bad_extension()).unwrap(),
            r#"{"error":3,"msg":"File must have a .js suffix"}"#
        );
    }

    #[test]
    fn root_parent_serializes_as_false() {
        let root = BrowseResponse {
            files: vec![],
            dirs: vec!["lib".into()],
            parent: None,
        };
        assert_eq!(
            serde_json::to_value(&root).unwrap(),
            serde_json::json!({"files": [], "dirs": ["lib"], "parent": false})
        );

        let nested = BrowseResponse {
            files: vec![],
            dirs: vec![],
            parent: Some(String::new()),
        };
        assert_eq!(serde_json::to_value(&nested).unwrap()["parent"], "");
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type("lib/game/main.js"), "application/javascript");
        assert_eq!(content_type("media/tiles.jpeg"), "image/jpeg");
        assert_eq!(content_type("media/music.ogg"), "audio/ogg");
        assert_eq!(content_type("README"), DEFAULT_CONTENT_TYPE);
    }
}
