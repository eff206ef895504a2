//! Session port - opens a page for one scenario.

use async_trait::async_trait;
use std::sync::Arc;

use super::{FocusQuery, InputDriver, LogStream};
use crate::domain::errors::HarnessResult;
use crate::domain::models::{Engine, Fixture};

/// The three collaborators bound to one freshly loaded page.
#[derive(Clone)]
pub struct PageSession {
    pub driver: Arc<dyn InputDriver>,
    pub query: Arc<dyn FocusQuery>,
    pub logs: Arc<dyn LogStream>,
}

/// Opens pages on a single engine.
///
/// One factory drives one engine; scenarios each get their own page.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Engine identity used to select expectations.
    fn engine(&self) -> Engine;

    /// Whether the engine runs headless.
    fn headless(&self) -> bool;

    /// Load the fixture into a fresh page.
    async fn open(&self, fixture: Fixture) -> HarnessResult<PageSession>;
}
