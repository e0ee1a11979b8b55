//! Cardroom Live binary entrypoint wiring REST, SSE, pub/sub, and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardroom_live::{
    config::AppConfig,
    routes,
    state::{AppState, SharedState},
    transport::PushTransport,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let transport = init_push_transport().await;
    let state = AppState::new(config, transport);

    spawn_storage_supervisor(state.clone());

    let app = build_router(state);

    let port = env::var("PORT")
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

/// Connect the Redis push transport when credentials are configured.
///
/// Absent credentials mean every channel acquisition resolves to unavailable
/// and viewers rely on the REST pull.
#[cfg(feature = "redis-push")]
async fn init_push_transport() -> Option<Arc<dyn PushTransport>> {
    use cardroom_live::transport::redis::RedisPushTransport;
    use tracing::warn;

    let url = env::var("REDIS_URL").ok().filter(|value| !value.is_empty())?;
    match RedisPushTransport::connect(&url).await {
        Ok(transport) => Some(Arc::new(transport)),
        Err(err) => {
            warn!(error = %err, "push broker unavailable; realtime broadcasts disabled");
            None
        }
    }
}

#[cfg(not(feature = "redis-push"))]
async fn init_push_transport() -> Option<Arc<dyn PushTransport>> {
    tracing::warn!("built without a push transport; realtime broadcasts disabled");
    None
}

/// Start the background task keeping the MongoDB store installed.
#[cfg(feature = "mongo-store")]
fn spawn_storage_supervisor(state: SharedState) {
    use cardroom_live::dao::live_store::LiveStore;
    use cardroom_live::dao::live_store::mongodb::{MongoConfig, MongoLiveStore};
    use cardroom_live::dao::storage::StorageError;
    use cardroom_live::services::storage_supervisor;

    let uri = env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let db_name = env::var("MONGO_DB").ok();

    tokio::spawn(storage_supervisor::run(state, move || {
        let uri = uri.clone();
        let db_name = db_name.clone();
        async move {
            let config = MongoConfig::from_uri(&uri, db_name.as_deref())
                .await
                .map_err(StorageError::from)?;
            let store = MongoLiveStore::connect(config)
                .await
                .map_err(StorageError::from)?;
            Ok(Arc::new(store) as Arc<dyn LiveStore>)
        }
    }));
}

#[cfg(not(feature = "mongo-store"))]
fn spawn_storage_supervisor(_state: SharedState) {
    tracing::warn!("built without a storage backend; running degraded");
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

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
