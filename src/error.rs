/// Error types for the kvdrive crate.
use thiserror::Error;

/// Errors raised while resolving the connection target.
///
/// All of these are fatal at startup: every virtual client depends on the
/// resolved target, so a malformed spec is surfaced before any client
/// spawns.
#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum TargetError {
    #[error("Invalid port '{port}' in target '{target}'")]
    InvalidPort { target: String, port: String },

    #[error("Missing host in target '{0}'")]
    MissingHost(String),

    #[error("Invalid value '{value}' for environment variable {var}")]
    InvalidEnvPort { var: &'static str, value: String },
}

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Target resolution error: {0}")]
    Target(#[from] TargetError),

    #[error("Transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
