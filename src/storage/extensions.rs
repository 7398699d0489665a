//! File extension allow-list
//!
//! Only files whose extension appears here are ever read, written or globbed.

use std::path::Path;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "gif", "jpeg"];
pub const SOUND_EXTENSIONS: &[&str] = &["ogg"];
pub const SCRIPT_EXTENSION: &str = "js";

const MARKUP_EXTENSIONS: &[&str] = &["js", "html", "css", "ico"];

/// Returns the extension of `path` as a string slice, if it has a UTF-8 one.
pub fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Static set of extensions eligible for filesystem operations.
///
/// Matching is case-sensitive: `level.JS` is not a script.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeExtensionSet;

impl SafeExtensionSet {
    pub fn contains(&self, ext: &str) -> bool {
        MARKUP_EXTENSIONS
            .iter()
            .chain(IMAGE_EXTENSIONS)
            .chain(SOUND_EXTENSIONS)
            .any(|allowed| *allowed == ext)
    }

    /// Whether `path` ends in an allowed extension.
    pub fn matches(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.contains(ext))
    }
}

/// File-list filter for the browse endpoint's `type` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileTypeFilter {
    Images,
    Scripts,
}

impl FileTypeFilter {
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "images" => Some(FileTypeFilter::Images),
            "scripts" => Some(FileTypeFilter::Scripts),
            _ => None,
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        match (self, extension_of(path)) {
            (FileTypeFilter::Images, Some(ext)) => IMAGE_EXTENSIONS.contains(&ext),
            (FileTypeFilter::Scripts, Some(ext)) => ext == SCRIPT_EXTENSION,
            (_, None) => false,
        }
    }
}
