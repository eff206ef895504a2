//! Input driver port - delivers synthetic input to the page under test.

use async_trait::async_trait;

use crate::domain::errors::HarnessResult;
use crate::domain::models::InputAction;

/// Delivers one discrete input action to the automated target.
///
/// Implementations must not return until the action has been dispatched.
/// A stale or detached click target fails with `HarnessError::Dispatch`.
#[async_trait]
pub trait InputDriver: Send + Sync {
    async fn issue(&self, action: &InputAction) -> HarnessResult<()>;
}
