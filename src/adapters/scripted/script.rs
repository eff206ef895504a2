//! Engine scripts: focus behavior of one engine on one fixture as a state machine.
//!
//! Scripts are plain YAML so recorded engine behavior can be replayed without
//! a browser:
//!
//! ```yaml
//! scripts:
//!   - engine: chromium
//!     fixture: single-document
//!     initial: loaded
//!     states:
//!       loaded:
//!         observed: { parent_has_focus: true }
//!         on:
//!           - input: click
//!             element: input-a
//!             to: input-a
//!             logs: ["Input A focus"]
//!       input-a:
//!         observed: { parent_has_focus: true, parent_active: input-a, parent_focus_count: 1 }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::dom::FixtureDom;
use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::{DocumentRef, Engine, Fixture, RunContext};

/// Input category a transition reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputKind {
    Tab,
    ShiftTab,
    Click,
    RightClick,
}

impl InputKind {
    pub const fn targets_element(self) -> bool {
        matches!(self, Self::Click | Self::RightClick)
    }
}

/// What the page reports while the script sits in a state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedState {
    #[serde(default)]
    pub parent_has_focus: bool,
    #[serde(default)]
    pub nested_has_focus: bool,
    #[serde(default)]
    pub parent_active: Option<String>,
    #[serde(default)]
    pub nested_active: Option<String>,
    #[serde(default)]
    pub parent_focus_count: u32,
    #[serde(default)]
    pub nested_focus_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptTransition {
    pub input: InputKind,

    /// Element id the input lands on; required for clicks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,

    pub to: String,

    /// Lines the page logs while handling the input
    #[serde(default)]
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptState {
    pub observed: ObservedState,
    #[serde(default)]
    pub on: Vec<ScriptTransition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineScript {
    pub engine: Engine,
    pub fixture: Fixture,

    /// Restricts the script to headless or headed runs; unset matches both
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,

    pub initial: String,
    pub states: BTreeMap<String, ScriptState>,
}

/// Top-level layout of a script file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptFile {
    #[serde(default)]
    pub scripts: Vec<EngineScript>,
}

impl ScriptFile {
    pub fn from_yaml(text: &str) -> HarnessResult<Self> {
        let file: Self = serde_yaml::from_str(text)
            .map_err(|e| HarnessError::Script(format!("invalid script YAML: {e}")))?;
        for script in &file.scripts {
            script.validate()?;
        }
        Ok(file)
    }

    pub fn load(path: &Path) -> HarnessResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Script(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&text)
    }
}

impl EngineScript {
    pub fn applies_to(&self, context: RunContext, fixture: Fixture) -> bool {
        self.engine == context.engine
            && self.fixture == fixture
            && self.headless.is_none_or(|headless| headless == context.headless)
    }

    pub fn state(&self, name: &str) -> Option<&ScriptState> {
        self.states.get(name)
    }

    /// First transition out of `state` matching the input, if any.
    pub fn transition(
        &self,
        state: &str,
        input: InputKind,
        element: Option<&str>,
    ) -> Option<&ScriptTransition> {
        self.states.get(state)?.on.iter().find(|transition| {
            transition.input == input && transition.element.as_deref() == element
        })
    }

    /// Check that every state reference and element id is known.
    pub fn validate(&self) -> HarnessResult<()> {
        let dom = FixtureDom::for_fixture(self.fixture);
        let fail = |detail: String| {
            Err(HarnessError::Script(format!(
                "{} / {}: {detail}",
                self.engine, self.fixture
            )))
        };

        if !self.states.contains_key(&self.initial) {
            return fail(format!("initial state '{}' is not defined", self.initial));
        }

        for (name, state) in &self.states {
            let observed = &state.observed;
            if let Some(id) = &observed.parent_active {
                if !dom.contains(DocumentRef::Parent, id) {
                    return fail(format!("state '{name}': no parent element '{id}'"));
                }
            }
            if let Some(id) = &observed.nested_active {
                if !dom.contains(DocumentRef::Nested, id) {
                    return fail(format!("state '{name}': no nested element '{id}'"));
                }
            }
            if !dom.has_nested_document()
                && (observed.nested_has_focus || observed.nested_focus_count > 0)
            {
                return fail(format!(
                    "state '{name}': nested observables on a single-document fixture"
                ));
            }

            for transition in &state.on {
                if !self.states.contains_key(&transition.to) {
                    return fail(format!(
                        "state '{name}': transition to undefined state '{}'",
                        transition.to
                    ));
                }
                match (&transition.element, transition.input.targets_element()) {
                    (None, true) => {
                        return fail(format!("state '{name}': click without an element"));
                    }
                    (Some(_), false) => {
                        return fail(format!("state '{name}': keyboard input with an element"));
                    }
                    (Some(id), true) if dom.element(id).is_none() => {
                        return fail(format!("state '{name}': unknown element '{id}'"));
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }
}
