use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scenario: {0}")]
    Scenario(String),

    #[error(transparent)]
    Core(#[from] helm_core::Error),
}
