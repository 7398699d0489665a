//! Process sandbox
//!
//! OS-enforced restriction applied once at startup, on top of the checks in
//! [`crate::storage::ConfinedFilesystem`]. Callers never branch on platform:
//! [`NativeSandbox`] reports `Unsupported` where the OS lacks a mechanism and
//! [`SandboxInitializer`] treats that as a no-op.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "openbsd")]
mod openbsd;
pub mod policy;

use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::SandboxError;
pub use policy::{PathAccess, Promise, SandboxPolicy};

/// Platform-specific capability restriction.
pub trait Sandbox: Send + Sync {
    /// Applies `policy` to the current process. Irreversible.
    fn apply(&self, policy: &SandboxPolicy) -> Result<(), SandboxError>;

    fn platform_name(&self) -> &'static str;
}

/// Native mechanism for the build target: unveil/pledge on OpenBSD,
/// Landlock on Linux.
#[derive(Debug, Default)]
pub struct NativeSandbox;

impl Sandbox for NativeSandbox {
    #[cfg(target_os = "openbsd")]
    fn apply(&self, policy: &SandboxPolicy) -> Result<(), SandboxError> {
        openbsd::apply(policy)
    }

    #[cfg(target_os = "linux")]
    fn apply(&self, policy: &SandboxPolicy) -> Result<(), SandboxError> {
        linux::apply(policy)
    }

    #[cfg(not(any(target_os = "openbsd", target_os = "linux")))]
    fn apply(&self, _policy: &SandboxPolicy) -> Result<(), SandboxError> {
        Err(SandboxError::Unsupported)
    }

    fn platform_name(&self) -> &'static str {
        std::env::consts::OS
    }
}

/// Applies nothing and reports the mechanism as missing, leaving the
/// filesystem gateway as the only protection.
#[derive(Debug, Default)]
pub struct NoopSandbox;

impl Sandbox for NoopSandbox {
    fn apply(&self, _policy: &SandboxPolicy) -> Result<(), SandboxError> {
        Err(SandboxError::Unsupported)
    }

    fn platform_name(&self) -> &'static str {
        "none"
    }
}

/// Outcome of a successful initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxState {
    Enforced,
    /// The platform has no mechanism; the server runs unsandboxed.
    Unavailable,
}

/// One-shot wrapper around a [`Sandbox`].
pub struct SandboxInitializer {
    sandbox: Box<dyn Sandbox>,
    applied: AtomicBool,
}

impl SandboxInitializer {
    pub fn new(sandbox: Box<dyn Sandbox>) -> Self {
        Self {
            sandbox,
            applied: AtomicBool::new(false),
        }
    }

    /// Selects the native backend where one exists, the no-op one elsewhere.
    pub fn for_platform() -> Self {
        if cfg!(any(target_os = "openbsd", target_os = "linux")) {
            Self::new(Box::new(NativeSandbox))
        } else {
            Self::new(Box::new(NoopSandbox))
        }
    }

    /// Applies `policy`. Any failure other than `Unsupported` is fatal to the
    /// caller; a second call fails with `AlreadyApplied`.
    pub fn initialize(&self, policy: &SandboxPolicy) -> Result<SandboxState, SandboxError> {
        if self.applied.swap(true, Ordering::SeqCst) {
            return Err(SandboxError::AlreadyApplied);
        }

        match self.sandbox.apply(policy) {
            Ok(()) => {
                info!("Sandbox enforced ({})", self.sandbox.platform_name());
                Ok(SandboxState::Enforced)
            }
            Err(SandboxError::Unsupported) => {
                debug!("No sandbox mechanism on {}", self.sandbox.platform_name());
                Ok(SandboxState::Unavailable)
            }
            Err(e) => Err(e),
        }
    }
}
