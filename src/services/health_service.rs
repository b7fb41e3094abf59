use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the engine can currently reach its storage.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_match_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
                return HealthResponse::degraded();
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    if state.is_degraded().await {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::match_store::InMemoryMatchStore,
        dto::health::HealthStatus,
        state::{AppState, clock::SystemClock},
    };

    #[tokio::test]
    async fn reports_degraded_until_store_installed() {
        let state = AppState::new(AppConfig::default(), Arc::new(SystemClock));
        assert_eq!(health_status(&state).await.status, HealthStatus::Degraded);

        state
            .install_match_store(Arc::new(InMemoryMatchStore::new()))
            .await;
        assert_eq!(health_status(&state).await.status, HealthStatus::Ok);
    }
}
