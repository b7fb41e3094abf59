//! Table match binary entrypoint wiring configuration, storage and the REST layer.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use table_match_back::{
    config::AppConfig,
    dao::match_store::InMemoryMatchStore,
    routes,
    services::admin_service,
    state::{AppState, SharedState, clock::SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config, Arc::new(SystemClock));
    start_storage(app_state.clone()).await?;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the storage backend: MongoDB under supervision when `MONGO_URI` is set, memory otherwise.
async fn start_storage(state: SharedState) -> anyhow::Result<()> {
    #[cfg(feature = "mongo-store")]
    if let Ok(uri) = env::var("MONGO_URI") {
        spawn_mongo_supervisor(state, uri, env::var("MONGO_DB").ok());
        return Ok(());
    }

    info!("no MONGO_URI configured; keeping matches in memory");
    let store = InMemoryMatchStore::new();
    admin_service::seed_tables(&store, &state.config().tables, state.now())
        .await
        .context("seeding tables")?;
    state.install_match_store(Arc::new(store)).await;
    Ok(())
}

#[cfg(feature = "mongo-store")]
fn spawn_mongo_supervisor(state: SharedState, uri: String, db_name: Option<String>) {
    use table_match_back::{
        dao::{
            match_store::{
                MatchStore,
                mongodb::{MongoConfig, MongoMatchStore},
            },
            storage::StorageError,
        },
        error::ServiceError,
        services::storage_supervisor,
    };

    let seed_state = state.clone();
    let connect = move || {
        let uri = uri.clone();
        let db_name = db_name.clone();
        let state = seed_state.clone();
        async move {
            let config = MongoConfig::from_uri(&uri, db_name.as_deref()).await?;
            let store = MongoMatchStore::connect(config).await?;
            admin_service::seed_tables(&store, &state.config().tables, state.now())
                .await
                .map_err(|err| match err {
                    ServiceError::Unavailable(source) => source,
                    other => StorageError::unavailable("failed to seed tables".into(), other),
                })?;
            Ok::<_, StorageError>(Arc::new(store) as Arc<dyn MatchStore>)
        }
    };

    tokio::spawn(storage_supervisor::run(state, connect));
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
