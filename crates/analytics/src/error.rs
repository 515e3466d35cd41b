use core_types::ErrorShape;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Not enough data to perform calculation: {0}")]
    Data(String),

    #[error("No records found for agent '{0}'")]
    UnknownAgent(String),

    #[error("An unexpected error occurred during analytics calculation: {0}")]
    Internal(String),
}

impl AnalyticsError {
    /// Derivations only fail when the inputs are missing or incomplete,
    /// which to a user always reads as "there is nothing to show yet".
    pub fn shape(&self) -> ErrorShape {
        ErrorShape::NoDataYet
    }
}
