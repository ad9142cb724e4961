//! Foundation module - Shared domain primitives.
//!
//! Contains error types and the state machine trait that the rest of the
//! domain builds on.

mod errors;
mod state_machine;

pub use errors::{ErrorCode, ValidationError};
pub use state_machine::StateMachine;
