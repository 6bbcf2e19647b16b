//! Process-wide logging setup shared by services embedding the access core.

pub mod subscriber;

pub use subscriber::{init, LogFormat, LoggingConfig};
