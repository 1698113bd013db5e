//! Append-only log of stock uploads.

pub mod entity;
