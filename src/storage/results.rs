//! Storage result types
//!
//! Defines result structures returned by storage operations.

/// Result of a directory browse operation
///
/// All paths are root-relative with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseListing {
    pub files: Vec<String>,
    pub dirs: Vec<String>,
    /// Parent of the listed directory; `None` for the root listing and
    /// `Some("")` when the parent is the root itself.
    pub parent: Option<String>,
}
