//! Cache maintenance handlers.

mod evict_stale;

pub use evict_stale::{EvictStaleCommand, EvictStaleHandler, EvictionReport};
