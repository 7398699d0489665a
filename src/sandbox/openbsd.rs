//! OpenBSD backend: unveil(2) for paths, pledge(2) for operation classes.

use log::debug;
use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;

use crate::error::SandboxError;
use crate::sandbox::policy::SandboxPolicy;

pub fn apply(policy: &SandboxPolicy) -> Result<(), SandboxError> {
    for (path, access) in &policy.paths {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| SandboxError::InvalidPath(format!("{}: {e}", path.display())))?;
        let permissions = CString::new(access.unveil_permissions())
            .map_err(|e| SandboxError::InvalidPath(e.to_string()))?;

        let ret = unsafe { libc::unveil(c_path.as_ptr(), permissions.as_ptr()) };
        if ret < 0 {
            return Err(last_error("unveil"));
        }
        debug!(
            "Unveiled {} ({})",
            path.display(),
            access.unveil_permissions()
        );
    }

    // Without the "unveil" promise the unveil list above is locked as well.
    let promises = CString::new(policy.promise_string())
        .map_err(|e| SandboxError::SyscallFailed(e.to_string()))?;
    let ret = unsafe { libc::pledge(promises.as_ptr(), std::ptr::null()) };
    if ret < 0 {
        return Err(last_error("pledge"));
    }

    Ok(())
}

fn last_error(call: &str) -> SandboxError {
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ENOSYS) {
        SandboxError::Unsupported
    } else {
        SandboxError::SyscallFailed(format!("{call} failed: {err}"))
    }
}
