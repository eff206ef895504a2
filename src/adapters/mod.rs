//! Infrastructure adapters for page automation.

pub mod scripted;
