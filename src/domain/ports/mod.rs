//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the async trait interfaces the harness consumes:
//! - InputDriver: delivers Tab, Shift+Tab and clicks
//! - FocusQuery: reads active elements, `:focus` counts and `hasFocus()`
//! - LogStream: page log lines in arrival order
//! - SessionFactory: opens a fresh page per scenario
//!
//! The automation transport lives behind these traits; the harness never
//! touches a page any other way.

pub mod focus_query;
pub mod input_driver;
pub mod log_stream;
pub mod session;

pub use focus_query::FocusQuery;
pub use input_driver::InputDriver;
pub use log_stream::{LogStream, LogSubscription};
pub use session::{PageSession, SessionFactory};
