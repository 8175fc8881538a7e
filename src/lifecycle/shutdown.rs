//! Shutdown coordination for the service.
//!
//! ```text
//! shutdown()
//!     → disable every registered component (new requests fail fast with 503)
//!     → wait for outstanding work to reach zero
//!     → stop the listener (once)
//!     → fire ShutdownComplete (once)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

use crate::lifecycle::tracker::WorkTracker;

/// A component that stops accepting new work when told to.
///
/// `disable` must be idempotent and must never be reversed.
pub trait Disable: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Make all subsequent requests fail fast.
    fn disable(&self);
}

type Teardown = Box<dyn Fn() + Send + Sync>;

/// Drives the graceful shutdown sequence.
pub struct ShutdownCoordinator {
    components: Vec<Arc<dyn Disable>>,
    tracker: WorkTracker,
    teardown: Teardown,
    torn_down: AtomicBool,
    complete_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl ShutdownCoordinator {
    /// Create a coordinator for `components`, draining `tracker` before
    /// running `teardown`.
    ///
    /// Returns the one-shot completion handle alongside the coordinator.
    pub fn new<F>(
        components: Vec<Arc<dyn Disable>>,
        tracker: WorkTracker,
        teardown: F,
    ) -> (Self, ShutdownComplete)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let coordinator = Self {
            components,
            tracker,
            teardown: Box::new(teardown),
            torn_down: AtomicBool::new(false),
            complete_tx: Mutex::new(Some(tx)),
        };
        (coordinator, ShutdownComplete { rx, fired: false })
    }

    /// Run the shutdown sequence.
    ///
    /// Safe to call concurrently and repeatedly. Returns `true` for the
    /// call that performed the teardown, `false` for every other call.
    pub async fn shutdown(&self) -> bool {
        self.disable_all();

        tracing::info!(
            outstanding = self.tracker.outstanding(),
            "Draining outstanding work"
        );
        self.tracker.wait_drained().await;

        if self.torn_down.swap(true, Ordering::AcqRel) {
            tracing::debug!("Listener already stopped");
            return false;
        }

        (self.teardown)();

        let tx = self
            .complete_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = tx {
            let _ = tx.send(());
        }

        tracing::info!("Shutdown sequence finished");
        true
    }

    /// Disable every registered component without waiting for the drain.
    ///
    /// Idempotent. Once this returns, new requests to the components fail.
    pub fn disable_all(&self) {
        for component in &self.components {
            component.disable();
            tracing::debug!(component = component.name(), "Component disabled");
        }
    }

    /// Whether the teardown has run.
    pub fn is_shut_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    pub fn tracker(&self) -> &WorkTracker {
        &self.tracker
    }
}

/// One-shot notification that shutdown has completed.
#[derive(Debug)]
pub struct ShutdownComplete {
    rx: oneshot::Receiver<()>,
    fired: bool,
}

impl ShutdownComplete {
    /// Wait for the shutdown sequence to finish.
    ///
    /// Also returns if the coordinator is dropped without completing.
    pub async fn wait(mut self) {
        if !self.fired {
            let _ = (&mut self.rx).await;
        }
    }

    /// Check without waiting.
    pub fn is_complete(&mut self) -> bool {
        if !self.fired {
            self.fired = self.rx.try_recv().is_ok();
        }
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::tracker::WorkKind;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Default)]
    struct MockComponent {
        disabled: AtomicUsize,
    }

    impl Disable for MockComponent {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn disable(&self) {
            self.disabled.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn coordinator(
        component: Arc<MockComponent>,
        tracker: WorkTracker,
    ) -> (Arc<ShutdownCoordinator>, ShutdownComplete, Arc<AtomicUsize>) {
        let teardowns = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&teardowns);
        let (coordinator, complete) = ShutdownCoordinator::new(
            vec![component as Arc<dyn Disable>],
            tracker,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        (Arc::new(coordinator), complete, teardowns)
    }

    #[tokio::test]
    async fn test_idle_shutdown() {
        let component = Arc::new(MockComponent::default());
        let (coordinator, mut complete, teardowns) =
            coordinator(Arc::clone(&component), WorkTracker::new());

        assert!(!complete.is_complete());
        assert!(coordinator.shutdown().await);

        assert_eq!(component.disabled.load(Ordering::SeqCst), 1);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
        assert!(coordinator.is_shut_down());
        assert!(complete.is_complete());
        assert!(complete.is_complete());
    }

    #[tokio::test]
    async fn test_sequential_double_shutdown() {
        let component = Arc::new(MockComponent::default());
        let (coordinator, complete, teardowns) =
            coordinator(Arc::clone(&component), WorkTracker::new());

        assert!(coordinator.shutdown().await);
        assert!(!coordinator.shutdown().await);

        assert_eq!(component.disabled.load(Ordering::SeqCst), 2);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
        tokio::time::timeout(Duration::from_secs(1), complete.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_shutdown() {
        let tracker = WorkTracker::new();
        let guard = tracker.track(WorkKind::Request);
        let (coordinator, complete, teardowns) =
            coordinator(Arc::new(MockComponent::default()), tracker);

        let first = tokio::spawn({
            let coordinator = Arc::clone(&coordinator);
            async move { coordinator.shutdown().await }
        });
        let second = tokio::spawn({
            let coordinator = Arc::clone(&coordinator);
            async move { coordinator.shutdown().await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);

        let results = [first.await.unwrap(), second.await.unwrap()];
        assert_eq!(results.iter().filter(|performed| **performed).count(), 1);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
        tokio::time::timeout(Duration::from_secs(1), complete.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_waits_for_pending_work() {
        let tracker = WorkTracker::new();
        let guard = tracker.track(WorkKind::DeferredJob);
        let component = Arc::new(MockComponent::default());
        let (coordinator, mut complete, teardowns) =
            coordinator(Arc::clone(&component), tracker);

        let shutdown = tokio::spawn({
            let coordinator = Arc::clone(&coordinator);
            async move { coordinator.shutdown().await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(component.disabled.load(Ordering::SeqCst), 1);
        assert_eq!(teardowns.load(Ordering::SeqCst), 0);
        assert!(!complete.is_complete());
        assert!(!shutdown.is_finished());

        drop(guard);
        assert!(shutdown.await.unwrap());
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
        assert!(complete.is_complete());
    }

    #[tokio::test]
    async fn test_disable_all_is_immediate() {
        let tracker = WorkTracker::new();
        let guard = tracker.track(WorkKind::Request);
        let component = Arc::new(MockComponent::default());
        let (coordinator, mut complete, teardowns) =
            coordinator(Arc::clone(&component), tracker);

        coordinator.disable_all();
        assert_eq!(component.disabled.load(Ordering::SeqCst), 1);
        assert_eq!(teardowns.load(Ordering::SeqCst), 0);
        assert!(!coordinator.is_shut_down());
        assert!(!complete.is_complete());

        drop(guard);
        assert!(coordinator.shutdown().await);
        assert_eq!(component.disabled.load(Ordering::SeqCst), 2);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }
}
