//! Domain layer for the focus harness
//!
//! This module contains the focus data model and the port traits the
//! harness drives a page through.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{HarnessError, HarnessResult};
