//! Element inventory of the two fixture pages.

use crate::domain::models::{DocumentRef, Fixture, Locator, TrackedInput};

pub const FRAME_ID: &str = "frame";
pub const INPUT_A_ID: &str = "input-a";
pub const INPUT_B_ID: &str = "input-b";
pub const INPUT_C_ID: &str = "input-c";

pub const fn input_id(input: TrackedInput) -> &'static str {
    match input {
        TrackedInput::A => INPUT_A_ID,
        TrackedInput::B => INPUT_B_ID,
        TrackedInput::C => INPUT_C_ID,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomElement {
    pub id: &'static str,
    pub document: DocumentRef,
    pub tag: &'static str,
    pub role: Option<&'static str>,
    pub placeholder: Option<&'static str>,
}

/// Static element list for one fixture, in document order.
#[derive(Debug, Clone)]
pub struct FixtureDom {
    fixture: Fixture,
    elements: Vec<DomElement>,
}

impl FixtureDom {
    pub fn for_fixture(fixture: Fixture) -> Self {
        let input_document = match fixture {
            Fixture::SingleDocument => DocumentRef::Parent,
            Fixture::NestedFrame => DocumentRef::Nested,
        };
        let input = |id, placeholder| DomElement {
            id,
            document: input_document,
            tag: "input",
            role: Some("textbox"),
            placeholder: Some(placeholder),
        };

        let mut elements = Vec::with_capacity(4);
        if fixture == Fixture::NestedFrame {
            elements.push(DomElement {
                id: FRAME_ID,
                document: DocumentRef::Parent,
                tag: "iframe",
                role: None,
                placeholder: None,
            });
        }
        for tracked in TrackedInput::ALL {
            elements.push(input(input_id(tracked), tracked.placeholder()));
        }

        Self { fixture, elements }
    }

    pub fn has_nested_document(&self) -> bool {
        self.fixture == Fixture::NestedFrame
    }

    pub fn resolve(&self, document: DocumentRef, locator: &Locator) -> Option<&DomElement> {
        let mut in_document = self.elements.iter().filter(|el| el.document == document);
        match locator {
            Locator::Placeholder(text) => {
                in_document.find(|el| el.placeholder == Some(text.as_str()))
            }
            Locator::Role { role, index } => in_document
                .filter(|el| el.role == Some(role.as_str()))
                .nth(*index),
            Locator::Tag(tag) => in_document.find(|el| el.tag == tag.as_str()),
        }
    }

    pub fn contains(&self, document: DocumentRef, id: &str) -> bool {
        self.elements
            .iter()
            .any(|el| el.document == document && el.id == id)
    }

    pub fn element(&self, id: &str) -> Option<&DomElement> {
        self.elements.iter().find(|el| el.id == id)
    }
}
