//! Expectation matrix - what each engine is known to do in each scenario.
//!
//! The table documents engine behavior as observed, including outcomes that
//! look wrong. It is not a statement of what engines should do.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::domain::models::{
    Engine, EventLog, Expectation, FocusSnapshot, RunContext, ScenarioId, Trace, TrackedInput,
};

static BUILTIN: LazyLock<ExpectationMatrix> = LazyLock::new(ExpectationMatrix::build);

/// Immutable lookup from (engine, headless, scenario) to an expectation.
#[derive(Debug, Clone)]
pub struct ExpectationMatrix {
    entries: HashMap<(RunContext, ScenarioId), Expectation>,
}

impl ExpectationMatrix {
    /// The built-in table, built once per process.
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    pub fn lookup(&self, context: RunContext, scenario: ScenarioId) -> Option<&Expectation> {
        self.entries.get(&(context, scenario))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn build() -> Self {
        let mut entries = HashMap::new();
        for engine in Engine::ALL {
            for headless in [true, false] {
                let context = RunContext { engine, headless };
                for scenario in ScenarioId::ALL {
                    entries.insert((context, scenario), expected(context, scenario));
                }
            }
        }
        Self { entries }
    }
}

fn expected(context: RunContext, scenario: ScenarioId) -> Expectation {
    use Engine::{Chromium, Firefox, Webkit};
    use TrackedInput::{A, B, C};

    match (scenario, context.engine) {
        // Firefox never tabs out of a single document, nor cycles back.
        (ScenarioId::Tabbing | ScenarioId::ShiftTabbing, Firefox) => Expectation::NonConvergent,

        (ScenarioId::Tabbing, Chromium | Webkit) => Expectation::Exact {
            trace: Trace::from(vec![
                page_input(B),
                page_input(C),
                FocusSnapshot::BLURRED,
                page_input(A),
                page_input(B),
            ]),
            log: None,
        },

        (ScenarioId::ShiftTabbing, Chromium | Webkit) => Expectation::Exact {
            trace: Trace::from(vec![
                page_input(B),
                page_input(A),
                FocusSnapshot::BLURRED,
                page_input(C),
                page_input(B),
            ]),
            log: None,
        },

        // Two stops in browser UI, then structural re-entry at the first input.
        (ScenarioId::TabbingInIframe, Chromium) => Expectation::Exact {
            trace: Trace::from(vec![
                FocusSnapshot::BLURRED,
                FocusSnapshot::BLURRED,
                frame_input(A),
            ]),
            log: Some(log(&[
                "parent window blur",
                "window focus",
                "Input B focus",
                "Input B blur",
                "Input C focus",
                "Input C blur",
                "window blur",
                "window focus",
                "Input A focus",
            ])),
        },

        // The iframe element keeps focus and Input C is re-focused twice
        // before the nested document reports focus again.
        (ScenarioId::TabbingInIframe, Firefox) => Expectation::Exact {
            trace: Trace::from(vec![
                frame_shell(),
                FocusSnapshot {
                    input_c_is_focused: true,
                    iframe_focus_count: 1,
                    ..frame_shell()
                },
                frame_input(C),
            ]),
            log: Some(log(&[
                "parent window focus",
                "window focus",
                "Input B focus",
                "Input B blur",
                "Input C focus",
                "Input C blur",
                "window blur",
                "window focus",
                "Input C focus",
                "Input C blur",
                "window blur",
                "window focus",
                "Input C focus",
            ])),
        },

        // WebKit never tabs back into the document.
        (ScenarioId::TabbingInIframe | ScenarioId::ShiftTabbingInIframe, Webkit) => {
            Expectation::NonConvergent
        }

        (ScenarioId::ShiftTabbingInIframe, Chromium) => Expectation::Exact {
            trace: Trace::from(vec![
                FocusSnapshot::BLURRED,
                FocusSnapshot::BLURRED,
                frame_input(C),
            ]),
            log: Some(log(&[
                "parent window blur",
                "window focus",
                "Input B focus",
                "Input B blur",
                "Input A focus",
                "Input A blur",
                "window blur",
                "window focus",
                "Input C focus",
            ])),
        },

        // Forward tabbing converges on Firefox, backward tabbing does not.
        (ScenarioId::ShiftTabbingInIframe, Firefox) => Expectation::NonConvergent,

        (ScenarioId::ClickToRestoreFocus, Chromium | Webkit) => Expectation::Exact {
            trace: Trace::from(vec![FocusSnapshot::BLURRED, frame_input(B)]),
            log: Some(log(&[
                "parent window blur",
                "window focus",
                "Input C focus",
                "Input C blur",
                "window blur",
                "window focus",
                "Input B focus",
            ])),
        },

        (ScenarioId::ClickToRestoreFocus, Firefox) if context.headless => Expectation::Exact {
            trace: Trace::from(vec![frame_shell(), frame_input(B)]),
            log: Some(log(&[
                "parent window focus",
                "window focus",
                "Input C focus",
                "Input C blur",
                "window blur",
                "window focus",
                "Input B focus",
            ])),
        },

        // Headed, the first click focuses Input B without focusing the
        // nested document and something steals focus straight back.
        (ScenarioId::ClickToRestoreFocus, Firefox) => Expectation::Exact {
            trace: Trace::from(vec![
                frame_shell(),
                FocusSnapshot {
                    input_b_is_focused: true,
                    ..frame_shell()
                },
                frame_input(B),
            ]),
            log: Some(log(&[
                "parent window focus",
                "window focus",
                "Input C focus",
                "Input C blur",
                "window blur",
                "window focus",
                "Input B focus",
                "Input B blur",
                "window blur",
                "window focus",
                "Input B focus",
            ])),
        },
    }
}

/// `input` focused in a single-document page.
fn page_input(input: TrackedInput) -> FocusSnapshot {
    let mut snapshot = FocusSnapshot {
        document_has_focus: true,
        page_focus_count: 1,
        ..FocusSnapshot::BLURRED
    };
    snapshot.set_input_focused(input, true);
    snapshot
}

/// `input` focused inside a focused frame.
fn frame_input(input: TrackedInput) -> FocusSnapshot {
    let mut snapshot = FocusSnapshot {
        document_has_focus: true,
        iframe_document_has_focus: true,
        iframe_is_focused: true,
        iframe_focus_count: 1,
        ..FocusSnapshot::BLURRED
    };
    snapshot.set_input_focused(input, true);
    snapshot
}

/// The iframe element is active but its document has no focus.
const fn frame_shell() -> FocusSnapshot {
    FocusSnapshot {
        document_has_focus: true,
        iframe_is_focused: true,
        ..FocusSnapshot::BLURRED
    }
}

fn log(lines: &[&str]) -> EventLog {
    EventLog::from(lines)
}
