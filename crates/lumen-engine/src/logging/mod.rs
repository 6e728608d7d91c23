//! Logger initialization.
//!
//! The engine logs through the `log` facade; binaries pick `env_logger` via
//! [`init_logging`].

mod init;

pub use init::{init_logging, LoggingConfig};
