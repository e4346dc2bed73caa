use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use color_eyre::eyre::{Context, eyre};
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::engine::Engine;
use crate::http_server::http_routes::{source, status_socket, sync};
use crate::http_server::state::AppState;
use crate::ports::source::SourceServiceClient;
use crate::ports::target::TargetServiceClient;
use crate::services::background::spawn_sync_task;

pub fn router<S, T>(app_state: Arc<AppState<S, T>>) -> Router
where
    S: SourceServiceClient + 'static,
    T: TargetServiceClient + 'static,
{
    Router::new()
        .route("/ping", get(sync::ping))
        .route("/sync/playlist/{playlist_id}", post(sync::sync_playlist::<S, T>))
        .route("/sync/all", post(sync::sync_all::<S, T>))
        .route("/sync/state", get(sync::sync_state::<S, T>))
        .route("/sync/mirrors", get(sync::mirrors::<S, T>))
        .route("/sync/status", get(status_socket::status_socket::<S, T>))
        .route("/spotify/me/playlists", get(source::playlists::<S, T>))
        .route(
            "/spotify/me/playlists/{playlist_id}/tracks",
            get(source::playlist_tracks::<S, T>),
        )
        .route(
            "/apple-music/tracks/spotify-track/{track_id}",
            get(source::match_track::<S, T>),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state)
}

pub async fn start(port: u16, engine: Engine, sync_interval: Option<Duration>) -> color_eyre::Result<()> {
    let dispatch_lock = Arc::new(Mutex::new(()));
    let sync_notify = spawn_sync_task(engine.scheduler.clone(), dispatch_lock.clone(), sync_interval);

    let broadcaster = engine.broadcaster.clone();
    let app_state = Arc::new(AppState {
        scheduler: engine.scheduler,
        broadcaster: engine.broadcaster,
        dispatch_lock,
        sync_notify,
    });
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .wrap_err_with(|| eyre!("Failed to bind to port {}", port))?;
    tracing::info!("Listening on port {}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        tracing::info!("Shutting down, closing status observers");
        broadcaster.shutdown();
    })
    .await
    .wrap_err("Failed to start HTTP server")?;

    Ok(())
}
