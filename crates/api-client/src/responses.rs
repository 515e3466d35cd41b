use core_types::BackendStatus;
use serde::{Deserialize, Serialize};

// The backend answers in snake_case, so no renaming is needed here.

/// The body of `GET /status`, also embedded in the submit response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: BackendStatus,
    /// Absent when the run has failed.
    #[serde(default)]
    pub day: u32,
    #[serde(default)]
    pub total_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The immediate response from `POST /run-simulation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResponse {
    pub message: String,
    pub state: StatusResponse,
}

/// The error body the backend attaches to non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub detail: String,
}
