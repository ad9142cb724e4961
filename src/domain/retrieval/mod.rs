//! Retrieval module - nearest-match lookup vocabulary.

mod errors;
mod search;

pub use errors::RetrievalError;
pub use search::{SearchDirection, SearchPlan};
