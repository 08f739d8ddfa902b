//! HTTP endpoint handlers. These are thin wrappers that forward to the page controller.
//! Each handler is instrumented and logs the session id and resulting phase.

use std::sync::Arc;
use axum::{extract::{Path, State}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::controller::handle_event;
use crate::leaderboard;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let (session_id, slot) = state.create_session().await;
  let mut session = slot.state.lock().await;
  let page = handle_event(&state, &mut session, ClientEvent::View).await;
  info!(target: "trivia", %session_id, "HTTP session created");
  Json(SessionOut { session_id, page })
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> impl IntoResponse {
  let slot = state.session(&id).await;
  let mut session = slot.state.lock().await;
  Json(handle_event(&state, &mut session, ClientEvent::View).await)
}

#[instrument(level = "info", skip(state, event), fields(%id, event = event.name()))]
pub async fn http_post_event(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(event): Json<ClientEvent>,
) -> impl IntoResponse {
  let slot = state.session(&id).await;
  let mut session = slot.state.lock().await;
  let page = handle_event(&state, &mut session, event).await;
  info!(target: "quiz", %id, phase = %page.phase, "HTTP event handled");
  Json(page)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_leaderboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  match state.leaderboard.load_all().await {
    Ok(rows) => Json(LeaderboardOut { rows: leaderboard::render(&rows), warning: None }),
    Err(e) => Json(LeaderboardOut { rows: Vec::new(), warning: Some(e.to_string()) }),
  }
}
