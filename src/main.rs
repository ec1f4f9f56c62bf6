//! Scorecard Back binary entrypoint wiring REST, SSE and the storage backend.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scorecard_back::{
    build_router,
    config::AppConfig,
    dao::tournament_store::memory::MemoryTournamentStore,
    state::{AppState, SharedState},
};

/// Storage backend selected through `STORAGE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorageBackend {
    Memory,
    #[cfg(feature = "mongo-store")]
    Mongo,
}

impl StorageBackend {
    fn from_env() -> anyhow::Result<Self> {
        match env::var("STORAGE_BACKEND") {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "memory" => Ok(StorageBackend::Memory),
                #[cfg(feature = "mongo-store")]
                "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
                other => anyhow::bail!("unsupported STORAGE_BACKEND `{other}`"),
            },
            #[cfg(feature = "mongo-store")]
            Err(_) => Ok(StorageBackend::Mongo),
            #[cfg(not(feature = "mongo-store"))]
            Err(_) => Ok(StorageBackend::Memory),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    let backend = StorageBackend::from_env()?;
    info!(?backend, "selected storage backend");
    match backend {
        StorageBackend::Memory => {
            app_state
                .set_store(Arc::new(MemoryTournamentStore::new()))
                .await;
        }
        #[cfg(feature = "mongo-store")]
        StorageBackend::Mongo => spawn_mongo_supervisor(app_state.clone()),
    }

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

/// Connect to MongoDB in the background; the server answers 503 on storage
/// routes until the first connection succeeds.
#[cfg(feature = "mongo-store")]
fn spawn_mongo_supervisor(state: SharedState) {
    use scorecard_back::{
        dao::{
            storage::StorageError,
            tournament_store::{
                TournamentStore,
                mongodb::{MongoConfig, MongoTournamentStore},
            },
        },
        services::storage_supervisor,
    };

    let uri = env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let db_name = env::var("MONGO_DB").ok();

    tokio::spawn(storage_supervisor::run(state, move || {
        let uri = uri.clone();
        let db_name = db_name.clone();
        async move {
            let config = MongoConfig::from_uri(&uri, db_name.as_deref())
                .await
                .map_err(StorageError::from)?;
            let store = MongoTournamentStore::connect(config)
                .await
                .map_err(StorageError::from)?;
            Ok(Arc::new(store) as Arc<dyn TournamentStore>)
        }
    }));
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
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
