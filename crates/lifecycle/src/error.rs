use configuration::ConfigError;
use core_types::ErrorShape;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Invalid run configuration: {0}")]
    Validation(#[from] ConfigError),

    #[error("A simulation is already running. Wait for it to finish or reset first.")]
    AlreadyRunning,
}

impl LifecycleError {
    /// Both variants are a request the controller refused before touching the backend.
    pub fn shape(&self) -> ErrorShape {
        match self {
            LifecycleError::Validation(e) => e.shape(),
            LifecycleError::AlreadyRunning => ErrorShape::MalformedInput,
        }
    }
}
