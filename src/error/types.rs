//! Error types
//!
//! Defines domain-specific error types for the storage gateway, the process
//! sandbox and server startup.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Storage module errors
#[derive(Debug)]
pub enum StorageError {
    /// Path failed the boundary or extension check.
    AccessDenied(String),
    /// Authorized, but the file or directory could not be read.
    ReadFailure(String, io::Error),
    /// Authorized, but the write call failed.
    WriteFailure(String, io::Error),
    InvalidPattern(String),
    /// Root or writable directory unusable at startup.
    InvalidRoot(String, io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::AccessDenied(p) => write!(f, "Access denied: {}", p),
            StorageError::ReadFailure(p, e) => write!(f, "Failed to read {}: {}", p, e),
            StorageError::WriteFailure(p, e) => write!(f, "Failed to write {}: {}", p, e),
            StorageError::InvalidPattern(p) => write!(f, "Invalid glob pattern: {}", p),
            StorageError::InvalidRoot(p, e) => write!(f, "Invalid directory {}: {}", p, e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::ReadFailure(_, e)
            | StorageError::WriteFailure(_, e)
            | StorageError::InvalidRoot(_, e) => Some(e),
            _ => None,
        }
    }
}

/// Sandbox module errors
#[derive(Debug)]
pub enum SandboxError {
    /// The OS has no capability-restriction mechanism we can use.
    Unsupported,
    InvalidPath(String),
    SyscallFailed(String),
    AlreadyApplied,
}

impl fmt::Display for SandboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SandboxError::Unsupported => write!(f, "Sandboxing not supported on this platform"),
            SandboxError::InvalidPath(p) => write!(f, "Invalid sandbox path: {}", p),
            SandboxError::SyscallFailed(msg) => write!(f, "Sandbox syscall failed: {}", msg),
            SandboxError::AlreadyApplied => write!(f, "Sandbox already applied"),
        }
    }
}

impl std::error::Error for SandboxError {}

/// Fatal startup errors
#[derive(Debug)]
pub enum ServerError {
    Config(config::ConfigError),
    MissingIndex(PathBuf),
    Storage(StorageError),
    Sandbox(SandboxError),
    IoError(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ServerError::MissingIndex(p) => {
                write!(f, "Couldn't find {} under root", p.display())
            }
            ServerError::Storage(e) => write!(f, "Storage error: {}", e),
            ServerError::Sandbox(e) => write!(f, "Sandbox error: {}", e),
            ServerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::Config(error)
    }
}

impl From<StorageError> for ServerError {
    fn from(error: StorageError) -> Self {
        ServerError::Storage(error)
    }
}

impl From<SandboxError> for ServerError {
    fn from(error: SandboxError) -> Self {
        ServerError::Sandbox(error)
    }
}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::IoError(error)
    }
}
