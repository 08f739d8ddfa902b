//! Error kinds, one enum per concern.
//!
//! Only `ConfigError` is fatal. Store errors are recovered at the gateway
//! boundary and validation errors never leave the session state machine.

use thiserror::Error;

/// Missing or malformed secrets. Startup halts on any of these.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("cannot read secrets file {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("cannot parse secrets file {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: toml::de::Error,
  },
  #[error("secrets field `{0}` is missing or empty")]
  MissingField(&'static str),
  #[error("invalid URL in `{field}`: {message}")]
  InvalidUrl { field: &'static str, message: String },
  #[error("cannot build HTTP client: {0}")]
  Client(#[from] reqwest::Error),
}

/// Failure talking to the remote leaderboard.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
  #[error("leaderboard request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("leaderboard returned HTTP {status}: {message}")]
  Status { status: reqwest::StatusCode, message: String },
  #[error("token exchange failed: {0}")]
  Auth(String),
  #[error("unexpected leaderboard payload: {0}")]
  Payload(String),
}

/// Input rejected before any transition happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("Please enter your name to play.")]
  EmptyName,
  #[error("'{0}' is not one of the options.")]
  UnknownOption(String),
}
