//! Sandbox policy
//!
//! Describes which paths the process may touch and which operation classes
//! it keeps once the sandbox is applied.

use std::path::{Path, PathBuf};

/// Access granted to an exposed path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAccess {
    ReadOnly,
    ReadWriteCreate,
}

impl PathAccess {
    /// Permission string in unveil(2) syntax.
    pub fn unveil_permissions(&self) -> &'static str {
        match self {
            PathAccess::ReadOnly => "r",
            PathAccess::ReadWriteCreate => "rwc",
        }
    }
}

/// Operation classes the process retains, named after pledge(2) promises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promise {
    Stdio,
    Rpath,
    Wpath,
    Cpath,
    Inet,
}

impl Promise {
    pub fn as_str(&self) -> &'static str {
        match self {
            Promise::Stdio => "stdio",
            Promise::Rpath => "rpath",
            Promise::Wpath => "wpath",
            Promise::Cpath => "cpath",
            Promise::Inet => "inet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxPolicy {
    pub paths: Vec<(PathBuf, PathAccess)>,
    pub promises: Vec<Promise>,
}

impl SandboxPolicy {
    /// Root readable, writable subtree read/write/create, and just enough
    /// promises to serve HTTP and touch those files.
    pub fn for_editor(root: &Path, writable: &Path) -> Self {
        Self {
            paths: vec![
                (root.to_path_buf(), PathAccess::ReadOnly),
                (writable.to_path_buf(), PathAccess::ReadWriteCreate),
            ],
            promises: vec![
                Promise::Stdio,
                Promise::Rpath,
                Promise::Wpath,
                Promise::Cpath,
                Promise::Inet,
            ],
        }
    }

    /// Space-separated promise list, as pledge(2) expects it.
    pub fn promise_string(&self) -> String {
        self.promises
            .iter()
            .map(Promise::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_policy() {
        let policy = SandboxPolicy::for_editor(Path::new("/srv/site"), Path::new("/srv/site/lib"));
        assert_eq!(policy.promise_string(), "stdio rpath wpath cpath inet");
        assert_eq!(policy.paths[0].1.unveil_permissions(), "r");
        assert_eq!(policy.paths[1].0, PathBuf::from("/srv/site/lib"));
        assert_eq!(policy.paths[1].1.unveil_permissions(), "rwc");
    }
}
