//! Scenario catalog - the differential focus suite as executable plans.

use crate::domain::models::{
    Checkpoint, Fixture, FixtureLayout, InputAction, Phase, ScenarioId, ScenarioPlan, SetupStep,
    StabilityPredicate, TrackedInput,
};

/// Build the plan for a scenario.
pub fn plan(id: ScenarioId) -> ScenarioPlan {
    match id {
        ScenarioId::Tabbing => cycle_single_document(id, InputAction::TabForward),
        ScenarioId::ShiftTabbing => cycle_single_document(id, InputAction::TabBackward),
        ScenarioId::TabbingInIframe => tab_out_of_frame(id, InputAction::TabForward),
        ScenarioId::ShiftTabbingInIframe => tab_out_of_frame(id, InputAction::TabBackward),
        ScenarioId::ClickToRestoreFocus => click_to_restore_focus(),
    }
}

/// Plans for every scenario, in catalog order.
pub fn all_plans() -> Vec<ScenarioPlan> {
    ScenarioId::ALL.into_iter().map(plan).collect()
}

/// Start on Input B, tab past the last input until the document loses focus,
/// then tab back in twice.
fn cycle_single_document(id: ScenarioId, tab: InputAction) -> ScenarioPlan {
    let fixture = Fixture::SingleDocument;
    let layout = FixtureLayout::by_placeholder(fixture);
    let start = click(&layout, TrackedInput::B);

    ScenarioPlan {
        id,
        fixture,
        setup: vec![SetupStep::checked(start, Checkpoint::focused(TrackedInput::B))],
        phases: vec![
            Phase::Step {
                action: tab.clone(),
            },
            Phase::Converge {
                action: tab.clone(),
                until: StabilityPredicate::DocumentUnfocused,
            },
            Phase::Step {
                action: tab.clone(),
            },
            Phase::Step { action: tab },
        ],
        layout,
    }
}

/// Start on Input B inside the frame, tab to the edge input and once more
/// out of the frame, then keep tabbing until both documents have focus.
fn tab_out_of_frame(id: ScenarioId, tab: InputAction) -> ScenarioPlan {
    let fixture = Fixture::NestedFrame;
    let layout = FixtureLayout::by_placeholder(fixture);
    let edge = if tab == InputAction::TabForward {
        TrackedInput::C
    } else {
        TrackedInput::A
    };

    ScenarioPlan {
        id,
        fixture,
        setup: vec![
            SetupStep::checked(
                click(&layout, TrackedInput::B),
                Checkpoint::focused_in_frame(TrackedInput::B),
            ),
            SetupStep::checked(tab.clone(), Checkpoint::focused_in_frame(edge)),
            SetupStep::unchecked(tab.clone()),
        ],
        phases: vec![Phase::Converge {
            action: tab,
            until: StabilityPredicate::DocumentsFocused,
        }],
        layout,
    }
}

/// Focus Input C, tab out of the frame, then click Input B until it holds
/// focus inside a focused frame.
fn click_to_restore_focus() -> ScenarioPlan {
    let fixture = Fixture::NestedFrame;
    let layout = FixtureLayout::by_role(fixture);

    ScenarioPlan {
        id: ScenarioId::ClickToRestoreFocus,
        fixture,
        setup: vec![
            SetupStep::checked(
                click(&layout, TrackedInput::C),
                Checkpoint::focused_in_frame(TrackedInput::C),
            ),
            SetupStep::unchecked(InputAction::TabForward),
        ],
        phases: vec![Phase::Converge {
            action: click(&layout, TrackedInput::B),
            until: StabilityPredicate::InputFocusedInFocusedFrame(TrackedInput::B),
        }],
        layout,
    }
}

fn click(layout: &FixtureLayout, input: TrackedInput) -> InputAction {
    let target = layout
        .target(input)
        .unwrap_or_else(|| unreachable!("fixture layouts track every input"));
    InputAction::click(target)
}
