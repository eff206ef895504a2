//! Scenario vocabulary: documents, locators, input actions and plans.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::snapshot::{FocusSnapshot, TrackedInput};
use crate::domain::errors::UnknownScenario;

/// Which document of the page a query or element refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentRef {
    /// The top-level document.
    Parent,
    /// The document of the single nested browsing context.
    Nested,
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parent => f.write_str("parent"),
            Self::Nested => f.write_str("nested"),
        }
    }
}

/// Opaque handle to a live element, as handed out by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(pub String);

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable selector used to re-resolve an element on every sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    Placeholder(String),
    Role { role: String, index: usize },
    Tag(String),
}

impl Locator {
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::Placeholder(text.into())
    }

    pub fn textbox(index: usize) -> Self {
        Self::Role {
            role: "textbox".to_string(),
            index,
        }
    }

    pub fn iframe() -> Self {
        Self::Tag("iframe".to_string())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placeholder(text) => write!(f, "placeholder={text:?}"),
            Self::Role { role, index } => write!(f, "role={role}[{index}]"),
            Self::Tag(tag) => write!(f, "tag={tag}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
}

/// An element to click, located within a specific document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementTarget {
    pub document: DocumentRef,
    pub locator: Locator,
}

/// One discrete input action delivered by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InputAction {
    TabForward,
    TabBackward,
    Click {
        target: ElementTarget,
        #[serde(default)]
        button: MouseButton,
    },
}

impl InputAction {
    pub const fn click(target: ElementTarget) -> Self {
        Self::Click {
            target,
            button: MouseButton::Left,
        }
    }
}

impl fmt::Display for InputAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TabForward => f.write_str("Tab"),
            Self::TabBackward => f.write_str("Shift+Tab"),
            Self::Click {
                target,
                button: MouseButton::Left,
            } => write!(f, "click {} in {}", target.locator, target.document),
            Self::Click {
                target,
                button: MouseButton::Right,
            } => write!(f, "right-click {} in {}", target.locator, target.document),
        }
    }
}

/// Page markup a scenario runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fixture {
    /// Three inputs directly in the top-level document.
    SingleDocument,
    /// Three inputs inside an iframe embedded in the top-level document.
    NestedFrame,
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleDocument => f.write_str("single-document"),
            Self::NestedFrame => f.write_str("nested-frame"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedElement {
    pub input: TrackedInput,
    pub locator: Locator,
}

/// Where the sampler finds each observable for a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureLayout {
    /// Document the tracked inputs live in.
    pub input_document: DocumentRef,
    pub inputs: Vec<TrackedElement>,
    /// Locator of the iframe element in the parent document, if any.
    pub frame: Option<Locator>,
}

impl FixtureLayout {
    /// Inputs located by placeholder text.
    pub fn by_placeholder(fixture: Fixture) -> Self {
        Self::with_locators(fixture, |input| Locator::placeholder(input.placeholder()))
    }

    /// Inputs located by textbox role and position.
    pub fn by_role(fixture: Fixture) -> Self {
        Self::with_locators(fixture, |input| Locator::textbox(input.index()))
    }

    fn with_locators(fixture: Fixture, locate: impl Fn(TrackedInput) -> Locator) -> Self {
        let inputs = TrackedInput::ALL
            .into_iter()
            .map(|input| TrackedElement {
                input,
                locator: locate(input),
            })
            .collect();
        match fixture {
            Fixture::SingleDocument => Self {
                input_document: DocumentRef::Parent,
                inputs,
                frame: None,
            },
            Fixture::NestedFrame => Self {
                input_document: DocumentRef::Nested,
                inputs,
                frame: Some(Locator::iframe()),
            },
        }
    }

    pub fn locator_for(&self, input: TrackedInput) -> Option<&Locator> {
        self.inputs
            .iter()
            .find(|tracked| tracked.input == input)
            .map(|tracked| &tracked.locator)
    }

    /// Click target for a tracked input.
    pub fn target(&self, input: TrackedInput) -> Option<ElementTarget> {
        self.locator_for(input).map(|locator| ElementTarget {
            document: self.input_document,
            locator: locator.clone(),
        })
    }
}

/// Condition over the latest snapshot that ends a converge phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "input", rename_all = "kebab-case")]
pub enum StabilityPredicate {
    /// The parent document has lost focus.
    DocumentUnfocused,
    /// Both the parent and the nested document report focus.
    DocumentsFocused,
    /// The input is active and the nested document has focus.
    InputFocusedInFocusedFrame(TrackedInput),
}

impl StabilityPredicate {
    pub const fn holds(&self, snapshot: &FocusSnapshot) -> bool {
        match self {
            Self::DocumentUnfocused => !snapshot.document_has_focus,
            Self::DocumentsFocused => {
                snapshot.document_has_focus && snapshot.iframe_document_has_focus
            }
            Self::InputFocusedInFocusedFrame(input) => {
                snapshot.is_input_focused(*input) && snapshot.iframe_document_has_focus
            }
        }
    }
}

impl fmt::Display for StabilityPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DocumentUnfocused => f.write_str("document unfocused"),
            Self::DocumentsFocused => f.write_str("document and iframe document focused"),
            Self::InputFocusedInFocusedFrame(input) => {
                write!(f, "{input} focused with iframe document focused")
            }
        }
    }
}

/// Partial expectation checked after a setup step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Checkpoint {
    pub document_has_focus: Option<bool>,
    pub iframe_document_has_focus: Option<bool>,
    pub focused_input: Option<TrackedInput>,
}

impl Checkpoint {
    /// Parent document focused with `input` active.
    pub const fn focused(input: TrackedInput) -> Self {
        Self {
            document_has_focus: Some(true),
            iframe_document_has_focus: None,
            focused_input: Some(input),
        }
    }

    /// Both documents focused with `input` active.
    pub const fn focused_in_frame(input: TrackedInput) -> Self {
        Self {
            document_has_focus: Some(true),
            iframe_document_has_focus: Some(true),
            focused_input: Some(input),
        }
    }

    /// Describe every way `snapshot` violates this checkpoint.
    pub fn violations(&self, snapshot: &FocusSnapshot) -> Vec<String> {
        let mut violations = Vec::new();
        if let Some(expected) = self.document_has_focus {
            if snapshot.document_has_focus != expected {
                violations.push(format!("documentHasFocus is {}", snapshot.document_has_focus));
            }
        }
        if let Some(expected) = self.iframe_document_has_focus {
            if snapshot.iframe_document_has_focus != expected {
                violations.push(format!(
                    "iframeDocumentHasFocus is {}",
                    snapshot.iframe_document_has_focus
                ));
            }
        }
        if let Some(input) = self.focused_input {
            if !snapshot.is_input_focused(input) {
                violations.push(format!("{input} is not focused"));
            }
        }
        violations
    }
}

/// An action issued before the seed snapshot, optionally verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupStep {
    pub action: InputAction,
    pub checkpoint: Option<Checkpoint>,
}

impl SetupStep {
    pub const fn checked(action: InputAction, checkpoint: Checkpoint) -> Self {
        Self {
            action,
            checkpoint: Some(checkpoint),
        }
    }

    pub const fn unchecked(action: InputAction) -> Self {
        Self {
            action,
            checkpoint: None,
        }
    }
}

/// A traced segment of a scenario. Every issued action adds one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Phase {
    /// Issue exactly one action.
    Step { action: InputAction },
    /// Issue the action until the predicate holds on the latest snapshot.
    Converge {
        action: InputAction,
        until: StabilityPredicate,
    },
}

/// Closed set of scenarios in the differential suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioId {
    Tabbing,
    ShiftTabbing,
    TabbingInIframe,
    ShiftTabbingInIframe,
    ClickToRestoreFocus,
}

impl ScenarioId {
    pub const ALL: [Self; 5] = [
        Self::Tabbing,
        Self::ShiftTabbing,
        Self::TabbingInIframe,
        Self::ShiftTabbingInIframe,
        Self::ClickToRestoreFocus,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tabbing => "tabbing",
            Self::ShiftTabbing => "shift-tabbing",
            Self::TabbingInIframe => "tabbing-in-iframe",
            Self::ShiftTabbingInIframe => "shift-tabbing-in-iframe",
            Self::ClickToRestoreFocus => "click-to-restore-focus",
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioId {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownScenario(s.to_string()))
    }
}

/// Everything the runner needs to execute one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioPlan {
    pub id: ScenarioId,
    pub fixture: Fixture,
    pub layout: FixtureLayout,
    pub setup: Vec<SetupStep>,
    pub phases: Vec<Phase>,
}
