//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (errors, state machine trait)
//! - `cycle` - Publication grid: cycles, forecast offsets, identities
//! - `harvest` - Backfill state machine and its policy
//! - `retrieval` - Nearest-match search plan and retrieval errors

pub mod cycle;
pub mod foundation;
pub mod harvest;
pub mod retrieval;
