//! Order-specific store logic: price snapshots and the pending to approved transition.

mod actions;
pub mod entity;

pub use actions::*;
