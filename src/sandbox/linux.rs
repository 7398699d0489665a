//! Linux backend: Landlock path-beneath rules.
//!
//! Landlock restricts filesystem access only; there is no pledge-style
//! operation filter here, so the policy's promises are not enforced on Linux.

use log::debug;
use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::error::SandboxError;
use crate::sandbox::policy::{PathAccess, SandboxPolicy};

#[repr(C)]
struct LandlockRulesetAttr {
    handled_access_fs: u64,
}

#[repr(C, packed)]
struct LandlockPathBeneathAttr {
    allowed_access: u64,
    parent_fd: i32,
}

// ABI v1 access rights
const LANDLOCK_ACCESS_FS_EXECUTE: u64 = 1 << 0;
const LANDLOCK_ACCESS_FS_WRITE_FILE: u64 = 1 << 1;
const LANDLOCK_ACCESS_FS_READ_FILE: u64 = 1 << 2;
const LANDLOCK_ACCESS_FS_READ_DIR: u64 = 1 << 3;
const LANDLOCK_ACCESS_FS_REMOVE_DIR: u64 = 1 << 4;
const LANDLOCK_ACCESS_FS_REMOVE_FILE: u64 = 1 << 5;
const LANDLOCK_ACCESS_FS_MAKE_CHAR: u64 = 1 << 6;
const LANDLOCK_ACCESS_FS_MAKE_DIR: u64 = 1 << 7;
const LANDLOCK_ACCESS_FS_MAKE_REG: u64 = 1 << 8;
const LANDLOCK_ACCESS_FS_MAKE_SOCK: u64 = 1 << 9;
const LANDLOCK_ACCESS_FS_MAKE_FIFO: u64 = 1 << 10;
const LANDLOCK_ACCESS_FS_MAKE_BLOCK: u64 = 1 << 11;
const LANDLOCK_ACCESS_FS_MAKE_SYM: u64 = 1 << 12;

const LANDLOCK_RULE_PATH_BENEATH: libc::c_int = 1;

const HANDLED_ACCESS: u64 = LANDLOCK_ACCESS_FS_EXECUTE
    | LANDLOCK_ACCESS_FS_WRITE_FILE
    | LANDLOCK_ACCESS_FS_READ_FILE
    | LANDLOCK_ACCESS_FS_READ_DIR
    | LANDLOCK_ACCESS_FS_REMOVE_DIR
    | LANDLOCK_ACCESS_FS_REMOVE_FILE
    | LANDLOCK_ACCESS_FS_MAKE_CHAR
    | LANDLOCK_ACCESS_FS_MAKE_DIR
    | LANDLOCK_ACCESS_FS_MAKE_REG
    | LANDLOCK_ACCESS_FS_MAKE_SOCK
    | LANDLOCK_ACCESS_FS_MAKE_FIFO
    | LANDLOCK_ACCESS_FS_MAKE_BLOCK
    | LANDLOCK_ACCESS_FS_MAKE_SYM;

fn allowed_access(access: PathAccess) -> u64 {
    let read = LANDLOCK_ACCESS_FS_READ_FILE | LANDLOCK_ACCESS_FS_READ_DIR;
    match access {
        PathAccess::ReadOnly => read,
        PathAccess::ReadWriteCreate => {
            read | LANDLOCK_ACCESS_FS_WRITE_FILE | LANDLOCK_ACCESS_FS_MAKE_REG
        }
    }
}

/// Closes the wrapped descriptor on drop.
struct Fd(libc::c_int);

impl Drop for Fd {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.0);
        }
    }
}

pub fn apply(policy: &SandboxPolicy) -> Result<(), SandboxError> {
    let attr = LandlockRulesetAttr {
        handled_access_fs: HANDLED_ACCESS,
    };
    let ret = unsafe {
        libc::syscall(
            libc::SYS_landlock_create_ruleset,
            &attr as *const LandlockRulesetAttr,
            std::mem::size_of::<LandlockRulesetAttr>(),
            0u32,
        )
    };
    if ret < 0 {
        let err = io::Error::last_os_error();
        return match err.raw_os_error() {
            // EPERM here means a seccomp filter hides the syscall.
            Some(libc::ENOSYS) | Some(libc::EOPNOTSUPP) | Some(libc::EPERM) => {
                Err(SandboxError::Unsupported)
            }
            _ => Err(SandboxError::SyscallFailed(format!(
                "landlock_create_ruleset failed: {err}"
            ))),
        };
    }
    let ruleset = Fd(ret as libc::c_int);

    for (path, access) in &policy.paths {
        add_rule(&ruleset, path, allowed_access(*access))?;
        debug!("Landlock rule for {} ({:?})", path.display(), access);
    }

    if unsafe { libc::prctl(libc::PR_SET_NO_NEW_PRIVS, 1, 0, 0, 0) } < 0 {
        return Err(SandboxError::SyscallFailed(format!(
            "prctl(PR_SET_NO_NEW_PRIVS) failed: {}",
            io::Error::last_os_error()
        )));
    }

    let ret = unsafe { libc::syscall(libc::SYS_landlock_restrict_self, ruleset.0, 0u32) };
    if ret < 0 {
        return Err(SandboxError::SyscallFailed(format!(
            "landlock_restrict_self failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

fn add_rule(ruleset: &Fd, path: &Path, access: u64) -> Result<(), SandboxError> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| SandboxError::InvalidPath(format!("{}: {e}", path.display())))?;

    let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_PATH | libc::O_CLOEXEC) };
    if fd < 0 {
        return Err(SandboxError::InvalidPath(format!(
            "{}: {}",
            path.display(),
            io::Error::last_os_error()
        )));
    }
    let parent = Fd(fd);

    let attr = LandlockPathBeneathAttr {
        allowed_access: access,
        parent_fd: parent.0,
    };
    let ret = unsafe {
        libc::syscall(
            libc::SYS_landlock_add_rule,
            ruleset.0,
            LANDLOCK_RULE_PATH_BENEATH,
            &attr as *const LandlockPathBeneathAttr,
            0u32,
        )
    };
    if ret < 0 {
        return Err(SandboxError::SyscallFailed(format!(
            "landlock_add_rule failed for {}: {}",
            path.display(),
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writable_access_is_superset_of_read() {
        let read = allowed_access(PathAccess::ReadOnly);
        let write = allowed_access(PathAccess::ReadWriteCreate);
        assert_eq!(write & read, read);
        assert_ne!(write & LANDLOCK_ACCESS_FS_MAKE_REG, 0);
        assert_eq!(read & LANDLOCK_ACCESS_FS_WRITE_FILE, 0);
        assert_eq!(HANDLED_ACCESS & write, write);
    }
}
