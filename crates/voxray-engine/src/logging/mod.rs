//! Logging utilities.
//!
//! Centralizes logger initialization. Library code only talks to the `log`
//! facade; the binary picks `env_logger` through [`init_logging`].

mod init;

pub use init::{LoggingConfig, init_logging};
