mod event;
mod registry;
mod room;
mod shared;
mod ws;

use axum::{
    routing::get,
    Router,
};
use event::EventRouter;
use registry::ConnectionRegistry;
use room::{InMemoryRoomStore, RandomRoomIdGenerator};
use shared::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ws::InMemoryConnectionManager;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomrelay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting room relay server");

    // Wire the core: store + registry behind the event router, fan-out
    // through the connection manager.
    let room_store = Arc::new(InMemoryRoomStore::new(Box::new(
        RandomRoomIdGenerator::new(),
    )));
    let registry = Arc::new(ConnectionRegistry::new());
    let event_router = Arc::new(EventRouter::new(room_store, registry));
    let connection_manager = Arc::new(InMemoryConnectionManager::new());

    let app_state = AppState::new(event_router, connection_manager);

    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/ws", get(ws::websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind listener");
            std::process::exit(1);
        }
    };
    info!("Server running on http://localhost:{port}");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server exited with error");
    }
}
