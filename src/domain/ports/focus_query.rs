//! Focus query port - reads live focus state from the page.

use async_trait::async_trait;

use crate::domain::errors::HarnessResult;
use crate::domain::models::{DocumentRef, ElementRef, Locator};

/// Read-only queries against the parent document or the nested context.
///
/// Every call reflects live state; implementations must not cache.
#[async_trait]
pub trait FocusQuery: Send + Sync {
    /// Resolve a locator to an element handle
    ///
    /// # Returns
    /// * `Ok(Some(element))` if the locator matches
    /// * `Ok(None)` if nothing matches
    /// * `Err(HarnessError)` if the query itself failed
    async fn resolve(
        &self,
        document: DocumentRef,
        locator: &Locator,
    ) -> HarnessResult<Option<ElementRef>>;

    /// The document's `activeElement`, or `None` when it is the body or absent
    async fn active_element(&self, document: DocumentRef) -> HarnessResult<Option<ElementRef>>;

    /// Number of elements matching `:focus` in the document
    async fn focused_count(&self, document: DocumentRef) -> HarnessResult<u32>;

    /// `document.hasFocus()`
    async fn has_focus(&self, document: DocumentRef) -> HarnessResult<bool>;
}
