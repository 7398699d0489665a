//! Server core functionality
//!
//! Startup checks, listener binding, sandboxing and the serve loop.

pub mod core;

pub use self::core::Server;
