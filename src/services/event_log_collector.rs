//! Event log collector - drains the page log stream in the background.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::EventLog;
use crate::domain::ports::{LogStream, LogSubscription};

/// Appends every log line, in arrival order, to a scenario-owned [`EventLog`].
///
/// Runs concurrently with the convergence loop for the whole scenario. Lines
/// are never reordered, deduplicated or filtered.
pub struct EventLogCollector {
    stream: Arc<dyn LogStream>,
    subscription_id: Uuid,
    log: Arc<Mutex<EventLog>>,
    handle: Option<JoinHandle<()>>,
    drain_timeout: Duration,
}

impl EventLogCollector {
    /// Subscribe and start collecting. Call before issuing any input.
    pub async fn start(stream: Arc<dyn LogStream>, drain_timeout: Duration) -> HarnessResult<Self> {
        let LogSubscription { id, mut receiver } = stream.subscribe().await?;
        let log = Arc::new(Mutex::new(EventLog::default()));

        let sink = Arc::clone(&log);
        let handle = tokio::spawn(async move {
            while let Some(line) = receiver.recv().await {
                trace!(line = %line, "Collected log line");
                sink.lock().await.push(line);
            }
        });

        debug!(subscription = %id, "Event log collector started");
        Ok(Self {
            stream,
            subscription_id: id,
            log,
            handle: Some(handle),
            drain_timeout,
        })
    }

    /// Unsubscribe, wait for the stream to drain and hand back the log.
    ///
    /// If the stream does not close within the drain timeout the listener is
    /// aborted and whatever arrived so far is returned.
    pub async fn finish(mut self) -> HarnessResult<EventLog> {
        let unsubscribed = self.stream.unsubscribe(self.subscription_id).await;

        if let Some(mut handle) = self.handle.take() {
            if unsubscribed.is_err() {
                handle.abort();
            } else {
                match timeout(self.drain_timeout, &mut handle).await {
                    Ok(Ok(())) => {}
                    Ok(Err(join_err)) => {
                        return Err(HarnessError::Subscription(format!(
                            "log listener failed: {join_err}"
                        )));
                    }
                    Err(_) => {
                        warn!(
                            subscription = %self.subscription_id,
                            timeout_ms = self.drain_timeout.as_millis(),
                            "Log stream did not close in time, keeping partial log"
                        );
                        handle.abort();
                    }
                }
            }
        }
        unsubscribed?;

        let log = std::mem::take(&mut *self.log.lock().await);
        debug!(lines = log.len(), "Event log finalized");
        Ok(log)
    }
}

impl Drop for EventLogCollector {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
