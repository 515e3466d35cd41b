//! Drives one simulation run at a time: submit, poll until the backend settles, reset.
//!
//! [`RunStore`] owns the observable [`RunState`]; [`RunController`] is the only thing
//! that mutates it. Consumers gate their views on `RunState::phase` and `has_data`.

pub mod controller;
pub mod error;
pub mod store;

pub use controller::{ControllerOptions, PollOutcome, RunController};
pub use error::LifecycleError;
pub use store::{RunState, RunStore, SubmissionMode};
