//! Server middleware
//!
//! Provides logging setup and request logging.

pub mod logging;
