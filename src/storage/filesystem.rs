//! Confined filesystem
//!
//! Sole gateway between request paths and the OS. Every operation resolves
//! its target to a canonical path and checks it against the root (reads,
//! listings, globs) or the writable subtree (writes) before touching it.

use glob::{MatchOptions, Pattern};
use log::{debug, warn};
use std::fs;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};

use crate::error::StorageError;
use crate::storage::extensions::SafeExtensionSet;
use crate::storage::results::BrowseListing;
use crate::storage::validation::{
    is_within, join_relative, join_under, resolve_existing, resolve_for_create, strip_traversal,
    to_relative,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
    List,
}

/// Filesystem view confined to a root directory, with a narrower subtree
/// that may be written.
#[derive(Debug)]
pub struct ConfinedFilesystem {
    root: PathBuf,
    writable: PathBuf,
    extensions: SafeExtensionSet,
}

impl ConfinedFilesystem {
    /// Canonicalizes `root` and `root/writable_dir`. Both must exist and the
    /// writable directory must lie inside the root.
    pub fn new(root: &Path, writable_dir: &Path) -> Result<Self, StorageError> {
        let root = root
            .canonicalize()
            .map_err(|e| StorageError::InvalidRoot(root.display().to_string(), e))?;

        let writable_path = root.join(writable_dir);
        let writable = writable_path
            .canonicalize()
            .map_err(|e| StorageError::InvalidRoot(writable_path.display().to_string(), e))?;

        if !is_within(&writable, &root) {
            return Err(StorageError::InvalidRoot(
                writable.display().to_string(),
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "writable directory is outside the root",
                ),
            ));
        }

        Ok(Self {
            root,
            writable,
            extensions: SafeExtensionSet,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn writable_root(&self) -> &Path {
        &self.writable
    }

    /// Reads a whole file. Callers strip traversal sequences from `raw`
    /// beforehand; containment is still enforced here.
    pub fn read(&self, raw: &str) -> Result<Vec<u8>, StorageError> {
        debug!("Reading {raw}");
        let path = self.authorize(raw, Access::Read)?;
        fs::read(&path).map_err(|e| StorageError::ReadFailure(raw.to_string(), e))
    }

    /// Overwrites a file under the writable subtree, creating it if needed.
    /// Not atomic: a failed write may leave a truncated file behind.
    pub fn write(&self, raw: &str, data: &[u8]) -> Result<(), StorageError> {
        debug!("Writing {raw}");
        let path = self.authorize(raw, Access::Write)?;
        fs::write(&path, data).map_err(|e| StorageError::WriteFailure(raw.to_string(), e))
    }

    /// Expands each pattern under the root and returns root-relative matches
    /// with an allowed extension.
    ///
    /// All-or-nothing: if any match resolves outside the root the whole call
    /// fails with `AccessDenied`.
    pub fn glob(&self, patterns: &[String]) -> Result<Vec<String>, StorageError> {
        debug!("Globbing {patterns:?}");

        let root = self
            .root
            .to_str()
            .ok_or_else(|| StorageError::InvalidPattern("root is not valid UTF-8".into()))?;
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };

        let mut matches = Vec::new();
        for pattern in patterns {
            let relative = join_under(Path::new(""), &strip_traversal(pattern))
                .ok_or_else(|| self.deny(pattern))?;
            let relative = relative
                .to_str()
                .ok_or_else(|| StorageError::InvalidPattern(pattern.clone()))?;
            if relative.is_empty() {
                continue;
            }

            let full = format!("{}{}{}", Pattern::escape(root), MAIN_SEPARATOR_STR, relative);
            let paths = glob::glob_with(&full, options)
                .map_err(|e| StorageError::InvalidPattern(format!("{pattern}: {e}")))?;

            for entry in paths {
                match entry {
                    Ok(path) if self.extensions.matches(&path) => matches.push(path),
                    Ok(_) => {}
                    Err(e) => debug!("Skipping unreadable glob entry: {e}"),
                }
            }
        }

        let mut files = Vec::with_capacity(matches.len());
        for path in &matches {
            let contained =
                resolve_existing(path).is_ok_and(|resolved| is_within(&resolved, &self.root));
            match to_relative(&self.root, path) {
                Some(relative) if contained => files.push(relative),
                _ => return Err(self.deny(&path.display().to_string())),
            }
        }

        Ok(files)
    }

    /// Lists a directory: visible subdirectories, and visible files with an
    /// allowed extension. No extension check applies to the directory itself.
    pub fn browse(&self, raw: &str) -> Result<BrowseListing, StorageError> {
        debug!("Browsing {raw}");
        let dir = self.authorize(raw, Access::List)?;

        let requested = join_under(&self.root, raw)
            .and_then(|joined| to_relative(&self.root, &joined))
            .ok_or_else(|| self.deny(raw))?;

        let entries =
            fs::read_dir(&dir).map_err(|e| StorageError::ReadFailure(raw.to_string(), e))?;

        let mut files = Vec::new();
        let mut dirs = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            let path = entry.path();
            if path.is_dir() {
                dirs.push(join_relative(&requested, name));
            } else if path.is_file() && self.extensions.matches(&path) {
                files.push(join_relative(&requested, name));
            }
        }
        files.sort();
        dirs.sort();

        let parent = if requested.is_empty() {
            None
        } else {
            Some(
                requested
                    .rsplit_once('/')
                    .map(|(parent, _)| parent.to_string())
                    .unwrap_or_default(),
            )
        };

        Ok(BrowseListing {
            files,
            dirs,
            parent,
        })
    }

    /// Resolves `raw` and checks it against the boundary for `access`.
    /// Returns the canonical path, the only form handed to the OS.
    fn authorize(&self, raw: &str, access: Access) -> Result<PathBuf, StorageError> {
        let joined = join_under(&self.root, raw).ok_or_else(|| self.deny(raw))?;

        let check_extension = access != Access::List;
        if check_extension && !self.extensions.matches(&joined) {
            return Err(self.deny(raw));
        }

        let (resolved, boundary) = match access {
            Access::Write => {
                let resolved = resolve_for_create(&joined).map_err(|e| {
                    if is_within(&joined, &self.writable) {
                        StorageError::WriteFailure(raw.to_string(), e)
                    } else {
                        self.deny(raw)
                    }
                })?;
                (resolved, &self.writable)
            }
            Access::Read | Access::List => {
                let resolved = resolve_existing(&joined)
                    .map_err(|e| StorageError::ReadFailure(raw.to_string(), e))?;
                (resolved, &self.root)
            }
        };

        if !is_within(&resolved, boundary) {
            return Err(self.deny(raw));
        }
        // The link target must be servable too, not just the link name.
        if check_extension && !self.extensions.matches(&resolved) {
            return Err(self.deny(raw));
        }

        Ok(resolved)
    }

    fn deny(&self, raw: &str) -> StorageError {
        warn!("Access denied: {raw}");
        StorageError::AccessDenied(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, ConfinedFilesystem) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("site");
        fs::create_dir_all(root.join("lib/game/levels")).unwrap();
        fs::create_dir_all(root.join("media")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("index.html"), "<html></html>").unwrap();
        fs::write(root.join("main.js"), "ig.main();").unwrap();
        fs::write(root.join("secret.txt"), "hunter2").unwrap();
        fs::write(root.join(".hidden.js"), "hidden").unwrap();
        fs::write(root.join("media/tiles.png"), [0x89, b'P', b'N', b'G']).unwrap();
        fs::write(root.join("lib/game/levels/level1.js"), "level").unwrap();
        fs::write(dir.path().join("outside.js"), "outside").unwrap();

        let confined = ConfinedFilesystem::new(&root, Path::new("lib/game/levels")).unwrap();
        (dir, confined)
    }

    fn is_denied<T: std::fmt::Debug>(result: Result<T, StorageError>) -> bool {
        matches!(result, Err(StorageError::AccessDenied(_)))
    }

    #[test]
    fn reads_allowed_file() {
        let (_dir, confined) = fixture();
        assert_eq!(confined.read("main.js").unwrap(), b"ig.main();");
    }

    #[test]
    fn read_rejects_disallowed_extension() {
        let (_dir, confined) = fixture();
        assert!(is_denied(confined.read("secret.txt")));
        assert!(is_denied(confined.read("lib")));
    }

    #[test]
    fn read_rejects_traversal() {
        let (_dir, confined) = fixture();
        assert!(is_denied(confined.read("../outside.js")));
        assert!(is_denied(confined.read("lib/../../outside.js")));
    }

    #[test]
    fn read_missing_file_is_read_failure() {
        let (_dir, confined) = fixture();
        assert!(matches!(
            confined.read("nope.js"),
            Err(StorageError::ReadFailure(_, _))
        ));
    }

    #[test]
    fn write_then_read_back() {
        let (_dir, confined) = fixture();
        confined
            .write("lib/game/levels/level2.js", b"ig.module('level2')")
            .unwrap();
        assert_eq!(
            confined.read("lib/game/levels/level2.js").unwrap(),
            b"ig.module('level2')"
        );
    }

    #[test]
    fn write_outside_writable_subtree_is_denied() {
        let (_dir, confined) = fixture();
        assert!(is_denied(confined.write("main.js", b"overwritten")));
        assert!(is_denied(confined.write("lib/game/main.js", b"new")));
        assert!(is_denied(confined.write("nowhere/at/all.js", b"new")));
        assert_eq!(confined.read("main.js").unwrap(), b"ig.main();");
    }

    #[test]
    fn write_rejects_disallowed_extension() {
        let (_dir, confined) = fixture();
        assert!(is_denied(confined.write("lib/game/levels/notes.txt", b"x")));
    }

    #[test]
    fn writable_dir_must_be_inside_root() {
        let (dir, _) = fixture();
        let result = ConfinedFilesystem::new(&dir.path().join("site"), Path::new(".."));
        assert!(matches!(result, Err(StorageError::InvalidRoot(_, _))));
    }

    #[cfg(unix)]
    #[test]
    fn sibling_directory_sharing_root_prefix_is_outside() {
        let (dir, confined) = fixture();
        let sibling = dir.path().join("site-evil");
        fs::create_dir(&sibling).unwrap();
        fs::write(sibling.join("evil.js"), "evil").unwrap();
        std::os::unix::fs::symlink(sibling.join("evil.js"), confined.root().join("evil.js"))
            .unwrap();

        assert!(is_denied(confined.read("evil.js")));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_disallowed_extension_is_denied() {
        let (_dir, confined) = fixture();
        let root = confined.root().to_path_buf();
        std::os::unix::fs::symlink(root.join("secret.txt"), root.join("secret.js")).unwrap();
        assert!(is_denied(confined.read("secret.js")));
    }

    #[test]
    fn glob_keeps_only_safe_visible_files() {
        let (_dir, confined) = fixture();
        let files = confined.glob(&["*".to_string()]).unwrap();
        assert_eq!(files, vec!["index.html".to_string(), "main.js".to_string()]);
    }

    #[test]
    fn glob_reroots_absolute_and_traversing_patterns() {
        let (_dir, confined) = fixture();
        assert_eq!(confined.glob(&["/*.js".to_string()]).unwrap(), vec!["main.js"]);
        assert_eq!(confined.glob(&["../*.js".to_string()]).unwrap(), vec!["main.js"]);
        assert_eq!(
            confined.glob(&["lib/*/levels/*.js".to_string()]).unwrap(),
            vec!["lib/game/levels/level1.js"]
        );
    }

    #[test]
    fn glob_rejects_invalid_pattern() {
        let (_dir, confined) = fixture();
        assert!(matches!(
            confined.glob(&["media/[".to_string()]),
            Err(StorageError::InvalidPattern(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn glob_is_all_or_nothing() {
        let (dir, confined) = fixture();
        std::os::unix::fs::symlink(dir.path().join("outside.js"), confined.root().join("z.js"))
            .unwrap();
        assert!(is_denied(confined.glob(&["*.js".to_string()])));
    }

    #[test]
    fn browse_root_listing() {
        let (_dir, confined) = fixture();
        let listing = confined.browse("").unwrap();
        assert_eq!(listing.files, vec!["index.html", "main.js"]);
        assert_eq!(listing.dirs, vec!["lib", "media"]);
        assert_eq!(listing.parent, None);
    }

    #[test]
    fn browse_subdirectory_reports_parent() {
        let (_dir, confined) = fixture();
        let listing = confined.browse("lib/game/").unwrap();
        assert!(listing.files.is_empty());
        assert_eq!(listing.dirs, vec!["lib/game/levels"]);
        assert_eq!(listing.parent.as_deref(), Some("lib"));

        let listing = confined.browse("media/").unwrap();
        assert_eq!(listing.files, vec!["media/tiles.png"]);
        assert_eq!(listing.parent.as_deref(), Some(""));
    }

    #[test]
    fn browse_outside_root_is_denied() {
        let (_dir, confined) = fixture();
        assert!(is_denied(confined.browse("../")));
    }
}
