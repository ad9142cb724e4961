//! Harvest module - the pure state machine behind the backfill walk.
//!
//! The machine never performs I/O. It consumes outcome events and emits the
//! next effect to perform; the application layer runs the effects against
//! the remote source, the converter and the cache.

mod errors;
mod machine;
mod policy;

pub use errors::HarvestError;
pub use machine::{
    next_target, start, transition, HarvestEffect, HarvestEvent, HarvestPhase, HarvestState,
    NextTarget, Step,
};
pub use policy::HarvestPolicy;
