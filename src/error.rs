use thiserror::Error;

/// Startup and configuration errors for the server binary
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to write config file: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Invalid listen address {addr}: {reason}")]
    Address { addr: String, reason: String },

    #[error("Transcript service error: {0}")]
    Caption(#[from] caption_sync_lib::CaptionError),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ServerError>;
