//! Focus snapshots and the sequences built from them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the focusable inputs tracked by every fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrackedInput {
    A,
    B,
    C,
}

impl TrackedInput {
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::C];

    /// Placeholder text the fixtures give this input.
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::A => "Input A",
            Self::B => "Input B",
            Self::C => "Input C",
        }
    }

    /// Position among the fixture's textboxes, in document order.
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
        }
    }
}

impl fmt::Display for TrackedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.placeholder())
    }
}

/// Point-in-time capture of every tracked focus observable.
///
/// Field names serialize exactly as the page-side records do, so recorded
/// traces can be pasted into expectation files unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSnapshot {
    pub document_has_focus: bool,
    pub iframe_document_has_focus: bool,
    pub iframe_is_focused: bool,
    pub input_a_is_focused: bool,
    pub input_b_is_focused: bool,
    pub input_c_is_focused: bool,
    pub page_focus_count: u32,
    pub iframe_focus_count: u32,
}

impl FocusSnapshot {
    /// Nothing focused anywhere; focus sits in browser UI.
    pub const BLURRED: Self = Self {
        document_has_focus: false,
        iframe_document_has_focus: false,
        iframe_is_focused: false,
        input_a_is_focused: false,
        input_b_is_focused: false,
        input_c_is_focused: false,
        page_focus_count: 0,
        iframe_focus_count: 0,
    };

    pub const fn is_input_focused(&self, input: TrackedInput) -> bool {
        match input {
            TrackedInput::A => self.input_a_is_focused,
            TrackedInput::B => self.input_b_is_focused,
            TrackedInput::C => self.input_c_is_focused,
        }
    }

    pub fn set_input_focused(&mut self, input: TrackedInput, focused: bool) {
        match input {
            TrackedInput::A => self.input_a_is_focused = focused,
            TrackedInput::B => self.input_b_is_focused = focused,
            TrackedInput::C => self.input_c_is_focused = focused,
        }
    }

    pub fn focused_inputs(&self) -> Vec<TrackedInput> {
        TrackedInput::ALL
            .into_iter()
            .filter(|input| self.is_input_focused(*input))
            .collect()
    }

    /// Values that a single-focus-target model says cannot happen.
    ///
    /// These are reported, never clamped: a count above one is either a
    /// sampling bug or an engine anomaly worth looking at.
    pub fn anomalies(&self) -> Vec<SnapshotAnomaly> {
        let mut anomalies = Vec::new();
        let focused = self.focused_inputs();
        if focused.len() > 1 {
            anomalies.push(SnapshotAnomaly::MultipleInputsFocused(focused));
        }
        if self.page_focus_count > 1 {
            anomalies.push(SnapshotAnomaly::PageFocusCount(self.page_focus_count));
        }
        if self.iframe_focus_count > 1 {
            anomalies.push(SnapshotAnomaly::IframeFocusCount(self.iframe_focus_count));
        }
        anomalies
    }
}

impl fmt::Display for FocusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let focused = self
            .focused_inputs()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        write!(
            f,
            "{{document: {}, iframeDocument: {}, iframe: {}, inputs: [{}], pageCount: {}, iframeCount: {}}}",
            self.document_has_focus,
            self.iframe_document_has_focus,
            self.iframe_is_focused,
            focused.join(", "),
            self.page_focus_count,
            self.iframe_focus_count
        )
    }
}

/// A snapshot value outside the single-focus-target model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SnapshotAnomaly {
    MultipleInputsFocused(Vec<TrackedInput>),
    PageFocusCount(u32),
    IframeFocusCount(u32),
}

impl fmt::Display for SnapshotAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultipleInputsFocused(inputs) => {
                write!(f, "{} inputs report focus at once", inputs.len())
            }
            Self::PageFocusCount(count) => write!(f, "page :focus count is {count}"),
            Self::IframeFocusCount(count) => write!(f, "iframe :focus count is {count}"),
        }
    }
}

/// Ordered snapshots produced during one scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace(Vec<FocusSnapshot>);

impl Trace {
    /// Start a trace from its seed snapshot.
    pub fn seeded(seed: FocusSnapshot) -> Self {
        Self(vec![seed])
    }

    pub fn push(&mut self, snapshot: FocusSnapshot) {
        self.0.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&FocusSnapshot> {
        self.0.last()
    }

    pub fn as_slice(&self) -> &[FocusSnapshot] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FocusSnapshot> {
        self.0.iter()
    }
}

impl From<Vec<FocusSnapshot>> for Trace {
    fn from(snapshots: Vec<FocusSnapshot>) -> Self {
        Self(snapshots)
    }
}

/// Ordered log lines emitted by page listeners during one scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog(Vec<String>);

impl EventLog {
    pub fn push(&mut self, line: impl Into<String>) {
        self.0.push(line.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for EventLog {
    fn from(lines: Vec<String>) -> Self {
        Self(lines)
    }
}

impl From<&[&str]> for EventLog {
    fn from(lines: &[&str]) -> Self {
        Self(lines.iter().map(|line| (*line).to_string()).collect())
    }
}

impl<S: Into<String>> FromIterator<S> for EventLog {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_serializes_with_record_field_names() {
        let snapshot = FocusSnapshot {
            document_has_focus: true,
            input_b_is_focused: true,
            page_focus_count: 1,
            ..FocusSnapshot::BLURRED
        };
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["documentHasFocus"], true);
        assert_eq!(json["inputBIsFocused"], true);
        assert_eq!(json["iframeFocusCount"], 0);
    }

    #[test]
    fn test_anomalies_are_reported_not_clamped() {
        let snapshot = FocusSnapshot {
            input_a_is_focused: true,
            input_c_is_focused: true,
            page_focus_count: 2,
            ..FocusSnapshot::BLURRED
        };
        let anomalies = snapshot.anomalies();
        assert_eq!(anomalies.len(), 2);
        assert_eq!(
            anomalies[0],
            SnapshotAnomaly::MultipleInputsFocused(vec![TrackedInput::A, TrackedInput::C])
        );
        assert_eq!(anomalies[1], SnapshotAnomaly::PageFocusCount(2));
        assert_eq!(snapshot.page_focus_count, 2);
    }

    #[test]
    fn test_well_formed_snapshot_has_no_anomalies() {
        let snapshot = FocusSnapshot {
            document_has_focus: true,
            iframe_document_has_focus: true,
            iframe_is_focused: true,
            input_a_is_focused: true,
            iframe_focus_count: 1,
            ..FocusSnapshot::BLURRED
        };
        assert!(snapshot.anomalies().is_empty());
        assert_eq!(snapshot.focused_inputs(), vec![TrackedInput::A]);
    }
}
