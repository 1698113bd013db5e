//! Product-specific store logic: catalog records and their stock actions.

mod actions;
pub mod entity;

pub use actions::*;
