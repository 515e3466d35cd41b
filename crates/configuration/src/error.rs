use core_types::ErrorShape;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}

impl ConfigError {
    /// Every configuration problem is a problem with what the user supplied.
    pub fn shape(&self) -> ErrorShape {
        ErrorShape::MalformedInput
    }
}
