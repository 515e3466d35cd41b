use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}

/// The three ways a failure can be presented to the user.
///
/// Every error type in the workspace maps onto exactly one of these, so a consumer
/// never has to guess whether to prompt for a run, report a failure, or reject input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorShape {
    /// The run has not produced the requested data yet.
    NoDataYet,
    /// The run (or the conversation with the backend about it) failed.
    RunFailed,
    /// The user's input was rejected before anything was submitted.
    MalformedInput,
}

impl ErrorShape {
    pub fn headline(&self) -> &'static str {
        match self {
            ErrorShape::NoDataYet => "No simulation data yet. Run a simulation first.",
            ErrorShape::RunFailed => "The simulation run failed.",
            ErrorShape::MalformedInput => "The run configuration was rejected.",
        }
    }
}
