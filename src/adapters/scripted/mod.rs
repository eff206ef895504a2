//! Scripted engines: deterministic in-process pages for each browser engine.
//!
//! Each engine's focus behavior on a fixture is a small state machine. The
//! built-in profiles replay the behavior recorded from real engines; YAML
//! scripts can replace them per engine, fixture and headless mode.

pub mod browser;
pub mod dom;
pub mod profiles;
pub mod script;

pub use browser::{ScriptedBrowser, ScriptedSessionFactory};
pub use script::{EngineScript, InputKind, ObservedState, ScriptFile, ScriptState, ScriptTransition};
