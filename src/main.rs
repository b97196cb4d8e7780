//! Guesso Back binary entrypoint wiring the HTTP API, SSE notifications and room storage.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guesso_back::{
    config::AppConfig,
    dao::room_store::MemoryRoomStore,
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());
    start_storage(&app_state).await?;

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the storage backend named by `STORAGE_BACKEND` (`memory` or `mongo`).
async fn start_storage(state: &SharedState) -> anyhow::Result<()> {
    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "memory".into());

    match backend.trim().to_ascii_lowercase().as_str() {
        "memory" => {
            info!("using in-memory room storage");
            state
                .install_room_store(Arc::new(MemoryRoomStore::new()))
                .await;
            Ok(())
        }
        "mongo" => start_mongo(state).await,
        other => anyhow::bail!("unknown STORAGE_BACKEND `{other}` (expected `memory` or `mongo`)"),
    }
}

#[cfg(feature = "mongo-store")]
async fn start_mongo(state: &SharedState) -> anyhow::Result<()> {
    use guesso_back::dao::{
        room_store::{
            RoomStore,
            mongodb::{MongoConfig, MongoRoomStore},
        },
        storage::StorageError,
    };
    use guesso_back::services::storage_supervisor;

    let config = MongoConfig::from_env()
        .await
        .context("reading MongoDB settings")?;
    info!(database = %config.database_name, "using MongoDB room storage");

    tokio::spawn(storage_supervisor::run(state.clone(), move || {
        let config = config.clone();
        async move {
            let store = MongoRoomStore::connect(config)
                .await
                .map_err(StorageError::from)?;
            Ok(Arc::new(store) as Arc<dyn RoomStore>)
        }
    }));
    Ok(())
}

#[cfg(not(feature = "mongo-store"))]
async fn start_mongo(_state: &SharedState) -> anyhow::Result<()> {
    anyhow::bail!("STORAGE_BACKEND=mongo requires the `mongo-store` feature")
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
            Err(err) => {
                warn!(error = %err, "cannot install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
