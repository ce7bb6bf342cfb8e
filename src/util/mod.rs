//! Shared resource-protection primitives.
//!
//! These are the only pieces of mutable state shared across concurrent
//! tasks within one pipeline run; each serializes its own mutation.

mod breaker;
mod cache;
mod queue;

pub use breaker::{CircuitBreaker, CircuitState};
pub use cache::TtlCache;
pub use queue::BoundedQueue;
