//! WebSocket upgrade + message loop. One connection is one session: the
//! state lives on this task's stack and messages are handled in order.
//! Each client event gets exactly one `page` reply.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::controller::handle_event;
use crate::protocol::{ClientEvent, ServerWsMessage};
use crate::session::SessionState;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "trivia", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "trivia", "WebSocket connected");
  let mut session = SessionState::new();

  let first = ServerWsMessage::Page { page: handle_event(&state, &mut session, ClientEvent::View).await };
  if !send(&mut socket, &first).await {
    return;
  }

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply = match serde_json::from_str::<ClientEvent>(&txt) {
          Ok(event) => {
            debug!(target: "trivia", "WS received: {:?}", &event);
            ServerWsMessage::Page { page: handle_event(&state, &mut session, event).await }
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };
        if !send(&mut socket, &reply).await {
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "trivia", player = %session.player_name, phase = %session.phase(), "WebSocket disconnected");
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> bool {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  if let Err(e) = socket.send(Message::Text(out)).await {
    error!(target: "trivia", error = %e, "WS send error");
    return false;
  }
  true
}
