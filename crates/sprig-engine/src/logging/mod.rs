//! `env_logger` setup for binaries built on the engine.
//!
//! The engine itself only talks to the `log` facade.

mod init;

pub use init::{LoggingConfig, init_logging};
