//! Snapshot sampler - assembles one [`FocusSnapshot`] from live queries.

use std::sync::Arc;
use tracing::{trace, warn};

use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::{DocumentRef, ElementRef, FixtureLayout, FocusSnapshot, Locator};
use crate::domain::ports::FocusQuery;

/// Samples the fixed set of focus observables for one page.
///
/// Nothing is cached between samples: tracked elements are re-resolved and
/// compared against the live active element every time.
pub struct SnapshotSampler {
    query: Arc<dyn FocusQuery>,
    layout: FixtureLayout,
}

impl SnapshotSampler {
    pub fn new(query: Arc<dyn FocusQuery>, layout: FixtureLayout) -> Self {
        Self { query, layout }
    }

    /// Take one snapshot.
    ///
    /// No input is issued while sampling, so the sequential queries observe
    /// a single point in time.
    pub async fn sample(&self) -> HarnessResult<FocusSnapshot> {
        let parent_active = self.query.active_element(DocumentRef::Parent).await?;

        let mut snapshot = FocusSnapshot {
            document_has_focus: self.query.has_focus(DocumentRef::Parent).await?,
            page_focus_count: self.query.focused_count(DocumentRef::Parent).await?,
            ..FocusSnapshot::BLURRED
        };

        if let Some(frame_locator) = &self.layout.frame {
            let frame = self.resolve(DocumentRef::Parent, frame_locator).await?;
            snapshot.iframe_is_focused = parent_active.as_ref() == Some(&frame);
            snapshot.iframe_document_has_focus =
                self.query.has_focus(DocumentRef::Nested).await?;
            snapshot.iframe_focus_count = self.query.focused_count(DocumentRef::Nested).await?;
        }

        let input_active = match self.layout.input_document {
            DocumentRef::Parent => parent_active,
            DocumentRef::Nested => self.query.active_element(DocumentRef::Nested).await?,
        };

        for tracked in &self.layout.inputs {
            let element = self
                .resolve(self.layout.input_document, &tracked.locator)
                .await?;
            snapshot.set_input_focused(tracked.input, input_active.as_ref() == Some(&element));
        }

        for anomaly in snapshot.anomalies() {
            warn!(%anomaly, %snapshot, "Snapshot outside the single-focus model");
        }
        trace!(%snapshot, "Sampled focus snapshot");

        Ok(snapshot)
    }

    async fn resolve(&self, document: DocumentRef, locator: &Locator) -> HarnessResult<ElementRef> {
        self.query
            .resolve(document, locator)
            .await?
            .ok_or_else(|| HarnessError::Resolution {
                document,
                locator: locator.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::ScriptedBrowser;
    use crate::domain::models::{
        Engine, Fixture, InputAction, RunContext, TrackedElement, TrackedInput,
    };
    use crate::domain::ports::InputDriver;

    fn nested_browser(engine: Engine) -> Arc<ScriptedBrowser> {
        Arc::new(ScriptedBrowser::builtin(RunContext::headless(engine), Fixture::NestedFrame).unwrap())
    }

    #[tokio::test]
    async fn test_sample_after_click_into_frame() {
        let browser = nested_browser(Engine::Chromium);
        let layout = FixtureLayout::by_placeholder(Fixture::NestedFrame);
        let target = layout.target(TrackedInput::B).unwrap();
        browser.issue(&InputAction::click(target)).await.unwrap();

        let sampler = SnapshotSampler::new(browser, layout);
        let snapshot = sampler.sample().await.unwrap();

        assert_eq!(
            snapshot,
            FocusSnapshot {
                document_has_focus: true,
                iframe_document_has_focus: true,
                iframe_is_focused: true,
                input_b_is_focused: true,
                iframe_focus_count: 1,
                ..FocusSnapshot::BLURRED
            }
        );
    }

    #[tokio::test]
    async fn test_sampling_twice_without_input_is_idempotent() {
        let browser = nested_browser(Engine::Firefox);
        let sampler = SnapshotSampler::new(browser, FixtureLayout::by_role(Fixture::NestedFrame));

        let first = sampler.sample().await.unwrap();
        let second = sampler.sample().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_single_document_leaves_iframe_fields_blank() {
        let browser = Arc::new(
            ScriptedBrowser::builtin(RunContext::headless(Engine::Webkit), Fixture::SingleDocument)
                .unwrap(),
        );
        let layout = FixtureLayout::by_placeholder(Fixture::SingleDocument);
        browser
            .issue(&InputAction::click(layout.target(TrackedInput::C).unwrap()))
            .await
            .unwrap();

        let snapshot = SnapshotSampler::new(browser, layout).sample().await.unwrap();
        assert!(snapshot.document_has_focus);
        assert!(snapshot.input_c_is_focused);
        assert_eq!(snapshot.page_focus_count, 1);
        assert!(!snapshot.iframe_is_focused);
        assert_eq!(snapshot.iframe_focus_count, 0);
    }

    #[tokio::test]
    async fn test_unresolvable_element_is_a_resolution_error() {
        let browser = nested_browser(Engine::Chromium);
        let mut layout = FixtureLayout::by_placeholder(Fixture::NestedFrame);
        layout.inputs.push(TrackedElement {
            input: TrackedInput::A,
            locator: Locator::placeholder("Input Z"),
        });

        let err = SnapshotSampler::new(browser, layout).sample().await.unwrap_err();
        assert_eq!(
            err,
            HarnessError::Resolution {
                document: DocumentRef::Nested,
                locator: Locator::placeholder("Input Z"),
            }
        );
    }
}
