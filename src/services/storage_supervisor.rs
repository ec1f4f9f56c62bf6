use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{storage::StorageError, tournament_store::TournamentStore},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the storage backend, install it, then poll its health forever.
///
/// While no backend answers the shared state stays in degraded mode and
/// storage-backed routes answer 503.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn TournamentStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                watch_health(&state, store.as_ref()).await;

                state.clear_store().await;
                warn!("storage handle dropped; reconnecting from scratch");
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
            }
        }

        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

/// Poll the installed store until it fails and cannot be revived in place.
async fn watch_health(state: &SharedState, store: &dyn TournamentStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false);
                }
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                if !reconnect_in_place(state, store).await {
                    warn!("exhausted storage reconnect attempts; staying in degraded mode");
                    return;
                }
                state.update_degraded(false);
            }
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

async fn reconnect_in_place(state: &SharedState, store: &dyn TournamentStore) -> bool {
    let mut delay = INITIAL_DELAY;
    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded after health check failure");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(
                        attempt, error = %err,
                        "storage reconnect first attempt failed; entering degraded mode"
                    );
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig, dao::tournament_store::memory::MemoryTournamentStore, state::AppState,
    };

    #[tokio::test]
    async fn installs_the_connected_store() {
        let state = AppState::new(AppConfig::default());
        let mut watcher = state.degraded_watcher();
        let task = tokio::spawn(run(state.clone(), || async {
            Ok(Arc::new(MemoryTournamentStore::new()) as Arc<dyn TournamentStore>)
        }));

        watcher.changed().await.unwrap();
        assert!(!state.is_degraded());
        assert!(state.store().await.is_some());
        task.abort();
    }

    #[tokio::test]
    async fn failing_backend_keeps_degraded_mode() {
        let state = AppState::new(AppConfig::default());
        let task = tokio::spawn(run(state.clone(), || async {
            Err(StorageError::unavailable(
                "connect".into(),
                std::io::Error::other("refused"),
            ))
        }));

        sleep(Duration::from_millis(50)).await;
        assert!(state.is_degraded());
        assert!(state.store().await.is_none());
        task.abort();
    }
}
