use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
    routing::get,
};

use crate::{middleware::auth::AuthUser, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/live", get(live_updates))
}

/// Upgrades to a WebSocket and streams bus events until the peer goes away.
/// Delivery is best effort; nothing is persisted or replayed.
pub async fn live_updates(
    State(state): State<AppState>,
    user: AuthUser,
    ws: WebSocketUpgrade,
) -> Response {
    tracing::debug!(user_id = %user.user_id, "live-update subscriber connected");
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, mut socket: WebSocket) {
    let (id, mut rx) = state.events.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(text) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Inbound frames are ignored; the stream is one-way.
                Some(Ok(_)) => {}
            },
        }
    }

    state.events.unsubscribe(id);
}
