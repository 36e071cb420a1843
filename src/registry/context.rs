//! Cancellation and deadlines for registry calls

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellable, deadline-bearing context inherited from a scheduling cycle.
///
/// Clones share the same cancellation token.
#[derive(Debug, Clone, Default)]
pub struct FetchContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl FetchContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// A timeout too large to represent leaves the context without a deadline
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Why no further work should start, if that is the case
    pub fn done_reason(&self) -> Option<&'static str> {
        if self.cancel.is_cancelled() {
            Some("operation cancelled")
        } else if self.deadline.is_some_and(|d| d <= Instant::now()) {
            Some("deadline exceeded")
        } else {
            None
        }
    }

    pub fn is_done(&self) -> bool {
        self.done_reason().is_some()
    }

    /// Run `fut` unless the context is already done, abandoning it on
    /// cancellation or when the earlier of the deadline and `limit` passes.
    pub async fn run<F, T>(&self, limit: Option<Duration>, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if let Some(reason) = self.done_reason() {
            anyhow::bail!("{}", reason);
        }

        let deadline = match (self.deadline, limit.and_then(|l| Instant::now().checked_add(l))) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        let bounded = async {
            match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("deadline exceeded"))),
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => anyhow::bail!("operation cancelled"),
            result = bounded => result,
        }
    }
}
