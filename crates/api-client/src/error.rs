use core_types::ErrorShape;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend has no such artifact yet, which means no run has completed.
    #[error("{artifact} not found. Run a simulation first.")]
    NotFound { artifact: String },

    #[error("Could not reach the simulation backend: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("The backend returned HTTP {status}: {detail}")]
    Server { status: u16, detail: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),
}

impl ApiError {
    pub fn shape(&self) -> ErrorShape {
        match self {
            ApiError::NotFound { .. } => ErrorShape::NoDataYet,
            ApiError::Transport(_) | ApiError::Server { .. } | ApiError::Deserialization(_) => {
                ErrorShape::RunFailed
            }
        }
    }
}
