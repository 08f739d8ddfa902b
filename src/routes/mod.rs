//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws` (one connection = one session)
/// - session API under `/api/v1/...`
/// - reference client from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/session", post(http::http_create_session))
        .route("/api/v1/session/:id", get(http::http_get_session))
        .route("/api/v1/session/:id/event", post(http::http_post_event))
        .route("/api/v1/leaderboard", get(http::http_get_leaderboard))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::IntroCfg;
    use crate::seeds::seed_questions;
    use crate::store::testing::MemoryStore;

    fn router(store: Arc<MemoryStore>) -> Router {
        build_router(Arc::new(AppState::new(store, Duration::ZERO, IntroCfg::default(), seed_questions())))
    }

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = router(Arc::new(MemoryStore::default()));
        let (status, body) = call(&app, Request::get("/api/v1/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn full_quiz_over_http() {
        let store = Arc::new(MemoryStore::with_rows(&[("Bob", 5)]));
        let app = router(store.clone());

        let (status, body) = call(&app, Request::post("/api/v1/session").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"]["phase"], "not_started");
        let id = body["sessionId"].as_str().unwrap().to_string();
        let ev = format!("/api/v1/session/{id}/event");

        let (_, page) = call(&app, post_json(&ev, serde_json::json!({"type": "start_quiz", "name": "Ann"}))).await;
        assert_eq!(page["phase"], "in_progress");
        call(&app, post_json(&ev, serde_json::json!({"type": "submit_answer", "option": "Switzerland"}))).await;
        let (_, page) = call(&app, post_json(&ev, serde_json::json!({"type": "submit_answer", "option": "Monte Rosa"}))).await;
        assert_eq!(page["phase"], "completed");
        assert_eq!(store.appends(), 1);

        let (_, page) = call(&app, Request::get(format!("/api/v1/session/{id}")).body(Body::empty()).unwrap()).await;
        assert_eq!(page["phase"], "completed");
        assert_eq!(store.appends(), 1);

        let (_, board) = call(&app, Request::get("/api/v1/leaderboard").body(Body::empty()).unwrap()).await;
        assert_eq!(board["rows"][0]["name"], "Bob");
        assert_eq!(board["rows"][1]["name"], "Ann");
        assert_eq!(board["rows"][1]["score"], 2);
        assert!(board.get("warning").is_none());
    }

    #[tokio::test]
    async fn malformed_event_is_rejected() {
        let app = router(Arc::new(MemoryStore::default()));
        let req = post_json("/api/v1/session/x/event", serde_json::json!({"type": "teleport"}));
        let res = app.oneshot(req).await.unwrap();
        assert!(res.status().is_client_error());
    }
}
