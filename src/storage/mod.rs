//! Confined file storage
//!
//! Handles path validation, the extension allow-list and the sandboxed
//! filesystem operations behind the editor API.

pub mod extensions;
pub mod filesystem;
pub mod results;
pub mod validation;

pub use extensions::{FileTypeFilter, SafeExtensionSet};
pub use filesystem::ConfinedFilesystem;
pub use results::BrowseListing;
pub use validation::strip_traversal;
