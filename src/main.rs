//! Kandersteg Trivia · quiz backend
//!
//! - Axum HTTP + WebSocket API serving render commands for the quiz pages
//! - Leaderboard kept in a Google Sheet (read cache + append-only writes)
//! - Static reference client (./static/index.html)
//!
//! Important env variables:
//!   PORT                 : u16 (default 3000)
//!   TRIVIA_SECRETS_PATH  : TOML with spreadsheet target + credential (default ./secrets.toml)
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"
//!
//! Missing or malformed secrets stop the process before it binds a port.

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod seeds;
mod quiz;
mod session;
mod leaderboard;
mod store;
mod sheets;
mod state;
mod protocol;
mod controller;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Secrets are the one fatal dependency: no store, no leaderboard, no app.
  let state = match config::load_secrets_from_env().and_then(AppState::from_secrets) {
    Ok(s) => Arc::new(s),
    Err(e) => {
      error!(target: "trivia", error = %e, "Configuration error; refusing to start");
      eprintln!("Configuration error: {e}");
      return Err(e.into());
    }
  };

  let app = build_router(state);

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "trivia", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "trivia", error = %e, "Failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  info!(target: "trivia", "Shutdown requested");
}
