//! Logging utilities.
//!
//! This module centralizes logger initialization. Everything else logs
//! through the `log` facade.

mod init;

pub use init::{init_logging, LoggingConfig};
