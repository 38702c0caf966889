//! Hook context and stop signalling.
//!
//! Every lifecycle hook receives a [`Context`]. Forward phases get a context
//! without a deadline; teardown phases get one bounded by the runtime's
//! shutdown timeout. The context also observes the service-wide stop request
//! so that long-running hooks (a component blocking in `start`, say) can
//! return when the service is asked to terminate.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::DeadlineExceeded;

/// Context passed to lifecycle hooks and event listeners.
#[derive(Debug, Clone)]
pub struct Context {
    /// Point in time by which bounded work must finish
    deadline: Option<Instant>,

    /// Stop request receiver
    stop: watch::Receiver<bool>,
}

impl Context {
    /// Create a context observing the given stop signal.
    pub fn new(stop: watch::Receiver<bool>) -> Self {
        Self {
            deadline: None,
            stop,
        }
    }

    /// A context that is never asked to stop and has no deadline.
    pub fn background() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self::new(rx)
    }

    /// Return a copy of this context bounded by `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// Return a copy of this context bounded by `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline, if any. Zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        *self.stop.borrow()
    }

    /// Resolves once a stop has been requested.
    ///
    /// Never resolves if the stop signal can no longer be raised.
    pub async fn stopped(&self) {
        let mut stop = self.stop.clone();
        if stop.wait_for(|requested| *requested).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Run `work` to completion or until the deadline passes.
    ///
    /// Without a deadline the work is awaited unbounded.
    pub async fn bounded<F: Future>(&self, work: F) -> Result<F::Output, DeadlineExceeded> {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, work)
                .await
                .map_err(|_| DeadlineExceeded),
            None => Ok(work.await),
        }
    }
}

/// Handle used to request that a running service stops.
#[derive(Debug, Clone)]
pub struct StopHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Create a new stop handle. No stop is requested initially.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Request a stop. Idempotent.
    pub fn stop(&self) {
        self.sender.send_replace(true);
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        *self.sender.borrow()
    }

    /// A fresh context observing this handle.
    pub fn context(&self) -> Context {
        Context::new(self.sender.subscribe())
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_handle_wakes_context() {
        let handle = StopHandle::new();
        let ctx = handle.context();
        assert!(!ctx.is_stop_requested());

        let waiter = tokio::spawn(async move { ctx.stopped().await });
        handle.stop();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("stop was not observed")
            .unwrap();
        assert!(handle.is_stopped());
        assert!(handle.context().is_stop_requested());
    }

    #[tokio::test]
    async fn test_background_never_stops() {
        let ctx = Context::background();
        let result = tokio::time::timeout(Duration::from_millis(20), ctx.stopped()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_respects_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_millis(50));
        assert!(ctx.remaining().unwrap() <= Duration::from_millis(50));

        let fast = ctx.bounded(async { 7 }).await;
        assert_eq!(fast.unwrap(), 7);

        let slow = ctx
            .bounded(tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert!(slow.is_err());
    }

    #[test]
    fn test_deadline_only_tightens() {
        let now = Instant::now();
        let ctx = Context::background()
            .with_deadline(now + Duration::from_secs(1))
            .with_deadline(now + Duration::from_secs(10));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(1)));
    }
}
