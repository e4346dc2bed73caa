use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ConnectInfo, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};

use crate::http_server::state::AppState;
use crate::ports::source::SourceServiceClient;
use crate::ports::target::TargetServiceClient;
use crate::services::sync::StatusMessage;

/// `GET /sync/status`: pushes `{"syncing": bool}` on connect and on every transition.
pub async fn status_socket<S, T>(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(app_state): State<Arc<AppState<S, T>>>,
) -> impl IntoResponse
where
    S: SourceServiceClient + 'static,
    T: TargetServiceClient + 'static,
{
    ws.on_upgrade(move |socket| handle_socket(socket, addr, app_state))
}

async fn send_status(
    sender: &mut SplitSink<WebSocket, Message>,
    message: StatusMessage,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(&message).map_err(axum::Error::new)?;
    sender.send(Message::Text(text.into())).await
}

async fn handle_socket<S, T>(socket: WebSocket, addr: SocketAddr, app_state: Arc<AppState<S, T>>)
where
    S: SourceServiceClient + 'static,
    T: TargetServiceClient + 'static,
{
    let (id, mut updates) = app_state.broadcaster.subscribe(&addr.to_string());
    tracing::info!(
        "Status observer {} connected ({} open)",
        id,
        app_state.broadcaster.observer_count()
    );
    let (mut sender, mut receiver) = socket.split();

    let syncing = match app_state.orchestrator().state_store().read().await {
        Ok(state) => state.syncing,
        Err(e) => {
            tracing::warn!("Could not read sync state for {}: {}", id, e);
            false
        }
    };

    if send_status(&mut sender, StatusMessage { syncing }).await.is_ok() {
        loop {
            tokio::select! {
                update = updates.recv() => match update {
                    Some(message) => {
                        if send_status(&mut sender, message).await.is_err() {
                            break;
                        }
                    }
                    // Deregistered by the broadcaster or server shutdown
                    None => break,
                },
                incoming = receiver.next() => match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Pings are answered by the websocket layer
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    app_state.broadcaster.deregister(&id);
    let _ = sender.close().await;
    tracing::info!("Status observer {} disconnected", id);
}
