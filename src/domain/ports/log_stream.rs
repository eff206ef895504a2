//! Log stream port - page log lines in arrival order.

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::errors::HarnessResult;

/// A live subscription to the page's log lines.
///
/// The sender side closes once the subscription is removed, which lets the
/// consumer drain everything that arrived before it.
#[derive(Debug)]
pub struct LogSubscription {
    pub id: Uuid,
    pub receiver: mpsc::UnboundedReceiver<String>,
}

/// Source of log lines emitted by listeners inside the page.
#[async_trait]
pub trait LogStream: Send + Sync {
    /// Start receiving log lines. Lines emitted before this call are lost.
    async fn subscribe(&self) -> HarnessResult<LogSubscription>;

    /// Stop delivering to a subscription and close its channel.
    async fn unsubscribe(&self, id: Uuid) -> HarnessResult<()>;
}
