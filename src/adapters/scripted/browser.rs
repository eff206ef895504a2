//! Scripted browser: an in-process page driven by an [`EngineScript`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, trace};
use uuid::Uuid;

use super::dom::FixtureDom;
use super::profiles;
use super::script::{EngineScript, InputKind, ObservedState};
use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::{
    DocumentRef, ElementRef, Engine, Fixture, InputAction, Locator, MouseButton, RunContext,
};
use crate::domain::ports::{
    FocusQuery, InputDriver, LogStream, LogSubscription, PageSession, SessionFactory,
};

/// A page whose focus behavior follows a script.
///
/// Inputs with no matching transition leave the page untouched, which is how
/// an engine that ignores a keypress is modelled.
pub struct ScriptedBrowser {
    script: EngineScript,
    dom: FixtureDom,
    current: RwLock<String>,
    subscribers: Mutex<HashMap<Uuid, mpsc::UnboundedSender<String>>>,
    actions_issued: AtomicUsize,
}

impl ScriptedBrowser {
    pub fn new(script: EngineScript) -> HarnessResult<Self> {
        script.validate()?;
        let dom = FixtureDom::for_fixture(script.fixture);
        let current = RwLock::new(script.initial.clone());
        Ok(Self {
            script,
            dom,
            current,
            subscribers: Mutex::new(HashMap::new()),
            actions_issued: AtomicUsize::new(0),
        })
    }

    /// Page running the built-in script for an engine.
    pub fn builtin(context: RunContext, fixture: Fixture) -> HarnessResult<Self> {
        Self::new(profiles::builtin(context, fixture))
    }

    /// Actions received by the driver, matched or not.
    pub fn actions_issued(&self) -> usize {
        self.actions_issued.load(Ordering::SeqCst)
    }

    pub async fn current_state(&self) -> String {
        self.current.read().await.clone()
    }

    async fn observed(&self) -> HarnessResult<ObservedState> {
        let current = self.current.read().await;
        self.script
            .state(&current)
            .map(|state| state.observed.clone())
            .ok_or_else(|| {
                HarnessError::Query(format!("script has no state '{}'", current.as_str()))
            })
    }

    fn check_document(&self, document: DocumentRef) -> HarnessResult<()> {
        if document == DocumentRef::Nested && !self.dom.has_nested_document() {
            return Err(HarnessError::Query(
                "fixture has no nested browsing context".to_string(),
            ));
        }
        Ok(())
    }

    async fn emit(&self, lines: &[String]) {
        let subscribers = self.subscribers.lock().await;
        for line in lines {
            trace!(line = %line, "Page log");
            for sender in subscribers.values() {
                // A closed receiver only means the collector already finished.
                let _ = sender.send(line.clone());
            }
        }
    }

    fn classify(&self, action: &InputAction) -> HarnessResult<(InputKind, Option<&'static str>)> {
        match action {
            InputAction::TabForward => Ok((InputKind::Tab, None)),
            InputAction::TabBackward => Ok((InputKind::ShiftTab, None)),
            InputAction::Click { target, button } => {
                let element = self
                    .dom
                    .resolve(target.document, &target.locator)
                    .ok_or_else(|| HarnessError::Dispatch {
                        action: action.to_string(),
                        reason: "target is detached or not in the fixture".to_string(),
                    })?;
                let kind = match button {
                    MouseButton::Left => InputKind::Click,
                    MouseButton::Right => InputKind::RightClick,
                };
                Ok((kind, Some(element.id)))
            }
        }
    }
}

#[async_trait]
impl InputDriver for ScriptedBrowser {
    async fn issue(&self, action: &InputAction) -> HarnessResult<()> {
        let (input, element) = self.classify(action)?;
        self.actions_issued.fetch_add(1, Ordering::SeqCst);

        let mut current = self.current.write().await;
        match self.script.transition(&current, input, element) {
            Some(transition) => {
                debug!(
                    engine = %self.script.engine,
                    from = current.as_str(),
                    to = %transition.to,
                    %action,
                    "Scripted transition"
                );
                *current = transition.to.clone();
                self.emit(&transition.logs).await;
            }
            None => {
                debug!(
                    engine = %self.script.engine,
                    state = current.as_str(),
                    %action,
                    "Input ignored by page"
                );
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FocusQuery for ScriptedBrowser {
    async fn resolve(
        &self,
        document: DocumentRef,
        locator: &Locator,
    ) -> HarnessResult<Option<ElementRef>> {
        self.check_document(document)?;
        Ok(self
            .dom
            .resolve(document, locator)
            .map(|element| ElementRef(element.id.to_string())))
    }

    async fn active_element(&self, document: DocumentRef) -> HarnessResult<Option<ElementRef>> {
        self.check_document(document)?;
        let observed = self.observed().await?;
        let active = match document {
            DocumentRef::Parent => observed.parent_active,
            DocumentRef::Nested => observed.nested_active,
        };
        Ok(active.map(ElementRef))
    }

    async fn focused_count(&self, document: DocumentRef) -> HarnessResult<u32> {
        self.check_document(document)?;
        let observed = self.observed().await?;
        Ok(match document {
            DocumentRef::Parent => observed.parent_focus_count,
            DocumentRef::Nested => observed.nested_focus_count,
        })
    }

    async fn has_focus(&self, document: DocumentRef) -> HarnessResult<bool> {
        self.check_document(document)?;
        let observed = self.observed().await?;
        Ok(match document {
            DocumentRef::Parent => observed.parent_has_focus,
            DocumentRef::Nested => observed.nested_has_focus,
        })
    }
}

#[async_trait]
impl LogStream for ScriptedBrowser {
    async fn subscribe(&self) -> HarnessResult<LogSubscription> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.subscribers.lock().await.insert(id, sender);
        Ok(LogSubscription { id, receiver })
    }

    async fn unsubscribe(&self, id: Uuid) -> HarnessResult<()> {
        self.subscribers
            .lock()
            .await
            .remove(&id)
            .map(drop)
            .ok_or_else(|| HarnessError::Subscription(format!("unknown subscription {id}")))
    }
}

/// Opens [`ScriptedBrowser`] pages for one engine.
///
/// Custom scripts take precedence over the built-in profile for the same
/// engine, fixture and headless mode.
pub struct ScriptedSessionFactory {
    context: RunContext,
    scripts: Vec<EngineScript>,
    opened: Mutex<Vec<Arc<ScriptedBrowser>>>,
}

impl ScriptedSessionFactory {
    pub fn new(context: RunContext) -> Self {
        Self {
            context,
            scripts: Vec::new(),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn with_scripts(mut self, scripts: Vec<EngineScript>) -> Self {
        self.scripts = scripts;
        self
    }

    fn script_for(&self, fixture: Fixture) -> EngineScript {
        self.scripts
            .iter()
            .find(|script| script.applies_to(self.context, fixture))
            .cloned()
            .unwrap_or_else(|| profiles::builtin(self.context, fixture))
    }

    /// Pages opened so far, oldest first.
    pub async fn opened(&self) -> Vec<Arc<ScriptedBrowser>> {
        self.opened.lock().await.clone()
    }
}

#[async_trait]
impl SessionFactory for ScriptedSessionFactory {
    fn engine(&self) -> Engine {
        self.context.engine
    }

    fn headless(&self) -> bool {
        self.context.headless
    }

    async fn open(&self, fixture: Fixture) -> HarnessResult<PageSession> {
        let browser = Arc::new(ScriptedBrowser::new(self.script_for(fixture))?);
        debug!(context = %self.context, %fixture, "Opened scripted page");
        self.opened.lock().await.push(Arc::clone(&browser));

        Ok(PageSession {
            driver: browser.clone(),
            query: browser.clone(),
            logs: browser,
        })
    }
}
