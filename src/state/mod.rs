pub mod clock;
pub mod lifecycle;

use std::{future::Future, sync::Arc, time::Duration};

use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;

use crate::{config::AppConfig, dao::match_store::MatchStore, error::ServiceError};

use self::clock::Clock;

pub type SharedState = Arc<AppState>;
/// Longest time an operation waits for its turn on the engine gate.
pub const DEFAULT_GATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Central application state holding the storage handle, the clock and the configuration.
pub struct AppState {
    match_store: RwLock<Option<Arc<dyn MatchStore>>>,
    degraded: watch::Sender<bool>,
    gate: Mutex<()>,
    gate_timeout: Option<Duration>,
    clock: Arc<dyn Clock>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, clock: Arc<dyn Clock>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            match_store: RwLock::new(None),
            degraded: degraded_tx,
            gate: Mutex::new(()),
            gate_timeout: Some(DEFAULT_GATE_TIMEOUT),
            clock,
            config,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current instant according to the installed clock.
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Obtain a handle to the current match store, if one is installed.
    pub async fn match_store(&self) -> Option<Arc<dyn MatchStore>> {
        let guard = self.match_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current match store or [`ServiceError::Degraded`].
    pub async fn require_match_store(&self) -> Result<Arc<dyn MatchStore>, ServiceError> {
        self.match_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new match store implementation and leave degraded mode.
    pub async fn install_match_store(&self, store: Arc<dyn MatchStore>) {
        {
            let mut guard = self.match_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current match store and enter degraded mode.
    pub async fn clear_match_store(&self) {
        {
            let mut guard = self.match_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Run `work` while holding the engine gate.
    ///
    /// Every read-decide-write sequence goes through here, so two operations never observe
    /// the same intermediate state. The timeout only bounds the wait for the gate: once
    /// `work` starts it runs to completion, leaving no half-applied change behind.
    pub async fn run_exclusive<F, Fut, T>(&self, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce(Arc<dyn MatchStore>, OffsetDateTime) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let gate = match self.gate_timeout {
            Some(limit) => match timeout(limit, self.gate.lock()).await {
                Ok(guard) => guard,
                Err(_) => {
                    warn!(
                        timeout_ms = limit.as_millis() as u64,
                        "timed out waiting for the engine gate"
                    );
                    return Err(ServiceError::Timeout);
                }
            },
            None => self.gate.lock().await,
        };

        let store = self.require_match_store().await?;
        let now = self.clock.now();
        let outcome = work(store, now).await;
        drop(gate);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use time::macros::datetime;

    use super::*;
    use crate::{dao::match_store::InMemoryMatchStore, state::clock::ManualClock};

    fn state() -> SharedState {
        AppState::new(
            AppConfig::default(),
            Arc::new(ManualClock::new(datetime!(2025-05-10 20:00 UTC))),
        )
    }

    #[tokio::test]
    async fn starts_degraded_until_store_installed() {
        let state = state();
        assert!(state.is_degraded().await);
        let err = state
            .run_exclusive(|_, _| async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));

        let mut watcher = state.degraded_watcher();
        state
            .install_match_store(Arc::new(InMemoryMatchStore::new()))
            .await;
        assert!(!state.is_degraded().await);
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());

        state.clear_match_store().await;
        assert!(*watcher.borrow_and_update());
    }

    #[tokio::test]
    async fn exclusive_work_never_overlaps() {
        let state = state();
        state
            .install_match_store(Arc::new(InMemoryMatchStore::new()))
            .await;

        let in_flight = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let state = state.clone();
            let in_flight = in_flight.clone();
            handles.push(tokio::spawn(async move {
                state
                    .run_exclusive(|_, _| async move {
                        let seen = in_flight.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok(seen)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 0);
        }
    }
}
