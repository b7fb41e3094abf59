use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{match_store::MatchStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Double `delay`, capped at [`MAX_DELAY`].
fn backoff(delay: Duration) -> Duration {
    (delay * 2).min(MAX_DELAY)
}

/// Keep a storage backend installed, switching to degraded mode while it cannot be reached.
///
/// `connect` is retried with exponential backoff. Once connected the store is polled; a failed
/// health check triggers a few in-place reconnect attempts before the store is dropped and a
/// fresh connection is made.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn MatchStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = backoff(delay);
                continue;
            }
        };

        state.install_match_store(store.clone()).await;
        info!("storage connection established; leaving degraded mode");
        delay = INITIAL_DELAY;

        loop {
            if store.health_check().await.is_ok() {
                if state.is_degraded().await {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false);
                }
                sleep(HEALTH_POLL_INTERVAL).await;
                continue;
            }

            let mut reconnect_delay = INITIAL_DELAY;
            let mut reconnected = false;
            for attempt in 0..MAX_RECONNECT_ATTEMPTS {
                match store.try_reconnect().await {
                    Ok(()) => {
                        info!(attempt, "storage reconnection succeeded");
                        reconnected = true;
                        break;
                    }
                    Err(err) => {
                        if attempt == 0 {
                            warn!(
                                attempt,
                                error = %err,
                                "storage reconnect failed; entering degraded mode"
                            );
                            state.update_degraded(true);
                        } else {
                            warn!(attempt, error = %err, "storage reconnect attempt failed");
                        }
                        sleep(reconnect_delay).await;
                        reconnect_delay = backoff(reconnect_delay);
                    }
                }
            }

            if reconnected {
                state.update_degraded(false);
                sleep(HEALTH_POLL_INTERVAL).await;
                continue;
            }

            warn!("exhausted storage reconnect attempts; dropping the connection");
            state.clear_match_store().await;
            break;
        }

        sleep(delay).await;
        delay = backoff(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_cap() {
        assert_eq!(backoff(INITIAL_DELAY), Duration::from_secs(2));
        assert_eq!(backoff(Duration::from_secs(8)), MAX_DELAY);
        assert_eq!(backoff(MAX_DELAY), MAX_DELAY);
    }

    #[tokio::test]
    async fn installs_store_once_connected() {
        use crate::{
            config::AppConfig,
            dao::match_store::InMemoryMatchStore,
            state::{AppState, clock::SystemClock},
        };

        let state = AppState::new(AppConfig::default(), Arc::new(SystemClock));
        let mut watcher = state.degraded_watcher();
        let handle = tokio::spawn(run(state.clone(), || async {
            Ok(Arc::new(InMemoryMatchStore::new()) as Arc<dyn MatchStore>)
        }));

        watcher.changed().await.unwrap();
        assert!(!*watcher.borrow());
        assert!(state.match_store().await.is_some());
        handle.abort();
    }
}
