//! Built-in engine scripts reproducing recorded focus behavior of each engine.

use std::collections::BTreeMap;

use super::dom::{input_id, FRAME_ID};
use super::script::{EngineScript, InputKind, ObservedState, ScriptState, ScriptTransition};
use crate::domain::models::{Engine, Fixture, RunContext, TrackedInput};

const LOADED: &str = "loaded";
const OUTSIDE: &str = "outside";
const OUTSIDE_FIRST: &str = "outside-1";
const OUTSIDE_SECOND: &str = "outside-2";
const FRAME_SHELL: &str = "frame-shell";

const WINDOW_FOCUS: &str = "window focus";
const WINDOW_BLUR: &str = "window blur";

/// Script for an engine on a fixture.
pub fn builtin(context: RunContext, fixture: Fixture) -> EngineScript {
    match fixture {
        Fixture::SingleDocument => single_document(context),
        Fixture::NestedFrame => nested_frame(context),
    }
}

/// Every built-in script, for listing and validation.
pub fn all() -> Vec<EngineScript> {
    let mut scripts = Vec::new();
    for engine in Engine::ALL {
        for headless in [true, false] {
            for fixture in [Fixture::SingleDocument, Fixture::NestedFrame] {
                scripts.push(builtin(RunContext { engine, headless }, fixture));
            }
        }
    }
    scripts
}

struct ScriptBuilder {
    context: RunContext,
    fixture: Fixture,
    initial: &'static str,
    states: BTreeMap<String, ScriptState>,
}

impl ScriptBuilder {
    fn new(context: RunContext, fixture: Fixture, initial: &'static str) -> Self {
        Self {
            context,
            fixture,
            initial,
            states: BTreeMap::new(),
        }
    }

    fn state(&mut self, name: &str, observed: ObservedState) -> &mut Self {
        self.states.entry(name.to_string()).or_default().observed = observed;
        self
    }

    fn on(
        &mut self,
        from: &str,
        input: InputKind,
        element: Option<&str>,
        to: &str,
        logs: Vec<String>,
    ) -> &mut Self {
        self.states
            .entry(from.to_string())
            .or_default()
            .on
            .push(ScriptTransition {
                input,
                element: element.map(str::to_string),
                to: to.to_string(),
                logs,
            });
        self
    }

    fn click(&mut self, from: &str, input: TrackedInput, to: &str, logs: Vec<String>) -> &mut Self {
        self.on(from, InputKind::Click, Some(input_id(input)), to, logs)
    }

    fn key(&mut self, from: &str, input: InputKind, to: &str, logs: Vec<String>) -> &mut Self {
        self.on(from, input, None, to, logs)
    }

    fn build(self) -> EngineScript {
        EngineScript {
            engine: self.context.engine,
            fixture: self.fixture,
            headless: Some(self.context.headless),
            initial: self.initial.to_string(),
            states: self.states,
        }
    }
}

fn focus(input: TrackedInput) -> String {
    format!("{} focus", input.placeholder())
}

fn blur(input: TrackedInput) -> String {
    format!("{} blur", input.placeholder())
}

fn window_focus() -> String {
    WINDOW_FOCUS.to_string()
}

fn window_blur() -> String {
    WINDOW_BLUR.to_string()
}

/// Neighbour of `input` in tab order, or `None` past either end.
fn neighbour(input: TrackedInput, forward: bool) -> Option<TrackedInput> {
    let index = input.index();
    let next = if forward {
        index.checked_add(1)?
    } else {
        index.checked_sub(1)?
    };
    TrackedInput::ALL.get(next).copied()
}

const fn first(forward: bool) -> TrackedInput {
    if forward {
        TrackedInput::A
    } else {
        TrackedInput::C
    }
}

const fn tab_key(forward: bool) -> InputKind {
    if forward {
        InputKind::Tab
    } else {
        InputKind::ShiftTab
    }
}

fn single_document(context: RunContext) -> EngineScript {
    let mut script = ScriptBuilder::new(context, Fixture::SingleDocument, LOADED);
    script
        .state(
            LOADED,
            ObservedState {
                parent_has_focus: true,
                ..ObservedState::default()
            },
        )
        .state(OUTSIDE, ObservedState::default());

    for input in TrackedInput::ALL {
        script.state(
            input_id(input),
            ObservedState {
                parent_has_focus: true,
                parent_active: Some(input_id(input).to_string()),
                parent_focus_count: 1,
                ..ObservedState::default()
            },
        );
    }

    for target in TrackedInput::ALL {
        let to = input_id(target);
        script.click(LOADED, target, to, vec![focus(target)]);
        script.click(OUTSIDE, target, to, vec![window_focus(), focus(target)]);
        for from in TrackedInput::ALL.into_iter().filter(|&from| from != target) {
            script.click(input_id(from), target, to, vec![blur(from), focus(target)]);
        }
    }

    // Firefox keeps focus on the last input instead of moving to browser UI.
    let leaves_document = context.engine != Engine::Firefox;
    for forward in [true, false] {
        let key = tab_key(forward);
        for from in TrackedInput::ALL {
            match neighbour(from, forward) {
                Some(to) => {
                    script.key(input_id(from), key, input_id(to), vec![blur(from), focus(to)]);
                }
                None if leaves_document => {
                    script.key(input_id(from), key, OUTSIDE, vec![blur(from), window_blur()]);
                }
                None => {}
            }
        }
        let entry = first(forward);
        script.key(
            OUTSIDE,
            key,
            input_id(entry),
            vec![window_focus(), focus(entry)],
        );
    }

    script.build()
}

fn frame_state(input: TrackedInput) -> String {
    format!("frame-{}", input_id(input))
}

fn nested_frame(context: RunContext) -> EngineScript {
    match context.engine {
        Engine::Chromium => blink_like_frame(context, true),
        Engine::Webkit => blink_like_frame(context, false),
        Engine::Firefox => gecko_frame(context),
    }
}

/// States shared by every engine on the nested-frame fixture.
fn frame_base(context: RunContext) -> ScriptBuilder {
    let mut script = ScriptBuilder::new(context, Fixture::NestedFrame, LOADED);
    script.state(
        LOADED,
        ObservedState {
            parent_has_focus: true,
            ..ObservedState::default()
        },
    );
    for input in TrackedInput::ALL {
        script.state(
            &frame_state(input),
            ObservedState {
                parent_has_focus: true,
                nested_has_focus: true,
                parent_active: Some(FRAME_ID.to_string()),
                nested_active: Some(input_id(input).to_string()),
                nested_focus_count: 1,
                ..ObservedState::default()
            },
        );
    }

    for target in TrackedInput::ALL {
        let to = frame_state(target);
        for from in TrackedInput::ALL.into_iter().filter(|&from| from != target) {
            script.click(&frame_state(from), target, &to, vec![blur(from), focus(target)]);
        }
    }

    for forward in [true, false] {
        let key = tab_key(forward);
        for from in TrackedInput::ALL {
            if let Some(to) = neighbour(from, forward) {
                script.key(
                    &frame_state(from),
                    key,
                    &frame_state(to),
                    vec![blur(from), focus(to)],
                );
            }
        }
    }

    script
}

/// Chromium and WebKit: the parent window blurs on the first click into the
/// frame, and tabbing past the edge input leaves the page for two stops of
/// browser UI. Only Chromium tabs back into the page.
fn blink_like_frame(context: RunContext, reenters: bool) -> EngineScript {
    let mut script = frame_base(context);
    script
        .state(OUTSIDE_FIRST, ObservedState::default())
        .state(OUTSIDE_SECOND, ObservedState::default());

    for target in TrackedInput::ALL {
        let to = frame_state(target);
        script.click(
            LOADED,
            target,
            &to,
            vec!["parent window blur".to_string(), window_focus(), focus(target)],
        );
        for outside in [OUTSIDE_FIRST, OUTSIDE_SECOND] {
            script.click(outside, target, &to, vec![window_focus(), focus(target)]);
        }
    }

    for forward in [true, false] {
        let key = tab_key(forward);
        let edge = first(!forward);
        script.key(
            &frame_state(edge),
            key,
            OUTSIDE_FIRST,
            vec![blur(edge), window_blur()],
        );
        if reenters {
            let entry = first(forward);
            script
                .key(OUTSIDE_FIRST, key, OUTSIDE_SECOND, Vec::new())
                .key(
                    OUTSIDE_SECOND,
                    key,
                    &frame_state(entry),
                    vec![window_focus(), focus(entry)],
                );
        }
    }

    script.build()
}

/// Firefox: the iframe element stays active in the parent when the nested
/// document blurs. Tabbing forward re-focuses Input C inside the frame;
/// tabbing backward never gets back in. Headed, the first click out of the
/// shell is immediately blurred again.
fn gecko_frame(context: RunContext) -> EngineScript {
    let mut script = frame_base(context);
    let shell = ObservedState {
        parent_has_focus: true,
        parent_active: Some(FRAME_ID.to_string()),
        ..ObservedState::default()
    };
    script.state(FRAME_SHELL, shell.clone());

    for target in TrackedInput::ALL {
        let to = frame_state(target);
        script.click(
            LOADED,
            target,
            &to,
            vec!["parent window focus".to_string(), window_focus(), focus(target)],
        );

        if context.headless {
            script.click(FRAME_SHELL, target, &to, vec![window_focus(), focus(target)]);
        } else {
            let stolen = format!("stolen-{}", input_id(target));
            script
                .state(
                    &stolen,
                    ObservedState {
                        nested_active: Some(input_id(target).to_string()),
                        ..shell.clone()
                    },
                )
                .click(
                    FRAME_SHELL,
                    target,
                    &stolen,
                    vec![window_focus(), focus(target), blur(target), window_blur()],
                );
            for next in TrackedInput::ALL {
                script.click(&stolen, next, &frame_state(next), vec![window_focus(), focus(next)]);
            }
        }
    }

    for forward in [true, false] {
        let edge = first(!forward);
        script.key(
            &frame_state(edge),
            tab_key(forward),
            FRAME_SHELL,
            vec![blur(edge), window_blur()],
        );
    }

    let shell_c = "shell-input-c";
    script
        .state(
            shell_c,
            ObservedState {
                nested_active: Some(input_id(TrackedInput::C).to_string()),
                nested_focus_count: 1,
                ..shell
            },
        )
        .key(
            FRAME_SHELL,
            InputKind::Tab,
            shell_c,
            vec![window_focus(), focus(TrackedInput::C)],
        )
        .key(
            shell_c,
            InputKind::Tab,
            &frame_state(TrackedInput::C),
            vec![
                blur(TrackedInput::C),
                window_blur(),
                window_focus(),
                focus(TrackedInput::C),
            ],
        );

    script.build()
}
