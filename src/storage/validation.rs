//! Path validation
//!
//! Turns untrusted request paths into paths under the server root and
//! performs the canonicalize-then-contain boundary check.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Substring removal of `..`. A secondary defense only; the boundary check
/// on the canonical path is what actually confines access.
pub fn strip_traversal(raw: &str) -> String {
    raw.replace("..", "")
}

/// Joins `raw` under `root`.
///
/// Root and drive-prefix components are dropped so absolute inputs are
/// re-rooted, and `..` components are applied lexically. Returns `None` when
/// they would climb above `root`, before anything touches the filesystem.
pub fn join_under(root: &Path, raw: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    let mut depth = 0usize;

    for component in Path::new(raw).components() {
        match component {
            Component::Normal(part) => {
                relative.push(part);
                depth += 1;
            }
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                relative.pop();
                depth -= 1;
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    Some(root.join(relative))
}

/// Canonicalizes an existing path, resolving symlinks.
pub fn resolve_existing(path: &Path) -> io::Result<PathBuf> {
    path.canonicalize()
}

/// Canonicalizes a path that may not exist yet by resolving its parent.
///
/// A dangling symlink at `path` is an error: writing through it would create
/// the link target, wherever that is.
pub fn resolve_for_create(path: &Path) -> io::Result<PathBuf> {
    match path.canonicalize() {
        Ok(resolved) => Ok(resolved),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if fs::symlink_metadata(path).is_ok() {
                return Err(e);
            }
            let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
                return Err(e);
            };
            Ok(parent.canonicalize()?.join(name))
        }
        Err(e) => Err(e),
    }
}

/// Segment-aware containment: `/srv/site-old` is not within `/srv/site`.
/// Both paths must already be canonical.
pub fn is_within(canonical: &Path, boundary: &Path) -> bool {
    canonical.starts_with(boundary)
}

/// Root-relative form of `path` with `/` separators, or `None` if `path`
/// is not under `root`.
pub fn to_relative(root: &Path, path: &Path) -> Option<String> {
    let rest = path.strip_prefix(root).ok()?;
    let parts = rest
        .components()
        .map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Joins a root-relative directory and an entry name with `/`.
pub fn join_relative(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_every_traversal_sequence() {
        assert_eq!(strip_traversal("../../etc/passwd"), "//etc/passwd");
        assert_eq!(strip_traversal("lib/....//x.js"), "lib///x.js");
        assert_eq!(strip_traversal("lib/game/main.js"), "lib/game/main.js");
    }

    #[test]
    fn absolute_paths_are_rerooted() {
        let root = Path::new("/srv/site");
        assert_eq!(
            join_under(root, "/etc/passwd"),
            Some(PathBuf::from("/srv/site/etc/passwd"))
        );
        assert_eq!(
            join_under(root, "//lib/./game/x.js"),
            Some(PathBuf::from("/srv/site/lib/game/x.js"))
        );
    }

    #[test]
    fn climbing_above_root_is_rejected() {
        let root = Path::new("/srv/site");
        assert_eq!(join_under(root, "../outside.js"), None);
        assert_eq!(join_under(root, "lib/../../outside.js"), None);
        assert_eq!(
            join_under(root, "lib/../media/a.png"),
            Some(PathBuf::from("/srv/site/media/a.png"))
        );
    }

    #[test]
    fn containment_is_per_segment() {
        let boundary = Path::new("/srv/site");
        assert!(is_within(Path::new("/srv/site"), boundary));
        assert!(is_within(Path::new("/srv/site/lib/main.js"), boundary));
        assert!(!is_within(Path::new("/srv/site-old/main.js"), boundary));
        assert!(!is_within(Path::new("/srv/sitemain.js"), boundary));
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = Path::new("/srv/site");
        let path = root.join("lib").join("game").join("main.js");
        assert_eq!(to_relative(root, &path).as_deref(), Some("lib/game/main.js"));
        assert_eq!(to_relative(root, root).as_deref(), Some(""));
        assert_eq!(to_relative(root, Path::new("/etc/passwd")), None);
    }

    #[test]
    fn resolve_for_create_uses_parent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let resolved = resolve_for_create(&root.join("new.js")).unwrap();
        assert_eq!(resolved, root.join("new.js"));
        assert!(resolve_for_create(&root.join("missing").join("new.js")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn resolve_for_create_refuses_dangling_links() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::os::unix::fs::symlink(root.join("nowhere.js"), root.join("link.js")).unwrap();
        assert!(resolve_for_create(&root.join("link.js")).is_err());
    }
}
