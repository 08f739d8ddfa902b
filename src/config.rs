//! Loading secrets (leaderboard credential + spreadsheet target) from TOML.
//!
//! Expected schema:
//!
//! ```toml
//! [leaderboard]
//! spreadsheet_id = "1AbC..."
//! worksheet = "Sheet1"          # optional
//! cache_ttl_secs = 30           # optional
//!
//! [credentials]
//! client_id = "..."
//! client_secret = "..."
//! refresh_token = "..."
//! token_uri = "https://oauth2.googleapis.com/token"   # optional
//!
//! [intro]                       # optional
//! donation_url = "https://..."
//! ```
//!
//! Unlike the rest of the app, every failure here is fatal.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::error::ConfigError;
use crate::seeds::{DEFAULT_DONATION_URL, DEFAULT_IMAGE_CAPTION, DEFAULT_IMAGE_URL};

pub const DEFAULT_SECRETS_PATH: &str = "./secrets.toml";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_CACHE_TTL_SECS: u64 = 30;

#[derive(Clone, Debug, Deserialize)]
pub struct Secrets {
  pub leaderboard: LeaderboardCfg,
  pub credentials: Credentials,
  #[serde(default)]
  pub intro: IntroCfg,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LeaderboardCfg {
  pub spreadsheet_id: String,
  #[serde(default = "default_worksheet")]
  pub worksheet: String,
  #[serde(default = "default_api_base")]
  pub api_base: String,
  #[serde(default = "default_cache_ttl")]
  pub cache_ttl_secs: u64,
}

impl LeaderboardCfg {
  pub fn cache_ttl(&self) -> Duration { Duration::from_secs(self.cache_ttl_secs) }
}

/// OAuth2 authorized-user credential. Never logged.
#[derive(Clone, Deserialize)]
pub struct Credentials {
  pub client_id: String,
  pub client_secret: String,
  pub refresh_token: String,
  #[serde(default = "default_token_uri")]
  pub token_uri: String,
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("client_id", &self.client_id)
      .field("token_uri", &self.token_uri)
      .finish_non_exhaustive()
  }
}

/// Intro page content. Defaults match the scout group's campaign.
#[derive(Clone, Debug, Deserialize)]
pub struct IntroCfg {
  #[serde(default = "default_donation_url")]
  pub donation_url: String,
  #[serde(default = "default_image_url")]
  pub image_url: String,
  #[serde(default = "default_image_caption")]
  pub image_caption: String,
}

impl Default for IntroCfg {
  fn default() -> Self {
    Self {
      donation_url: default_donation_url(),
      image_url: default_image_url(),
      image_caption: default_image_caption(),
    }
  }
}

fn default_worksheet() -> String { "Sheet1".into() }
fn default_api_base() -> String { DEFAULT_SHEETS_API_BASE.into() }
fn default_cache_ttl() -> u64 { DEFAULT_CACHE_TTL_SECS }
fn default_token_uri() -> String { DEFAULT_TOKEN_URI.into() }
fn default_donation_url() -> String { DEFAULT_DONATION_URL.into() }
fn default_image_url() -> String { DEFAULT_IMAGE_URL.into() }
fn default_image_caption() -> String { DEFAULT_IMAGE_CAPTION.into() }

impl Secrets {
  /// Parse and check required fields.
  pub fn from_toml_str(path: &str, s: &str) -> Result<Self, ConfigError> {
    let secrets: Secrets = toml::from_str(s).map_err(|source| ConfigError::Parse { path: path.to_string(), source })?;
    secrets.validate()?;
    Ok(secrets)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    let required = [
      ("leaderboard.spreadsheet_id", &self.leaderboard.spreadsheet_id),
      ("leaderboard.worksheet", &self.leaderboard.worksheet),
      ("credentials.client_id", &self.credentials.client_id),
      ("credentials.client_secret", &self.credentials.client_secret),
      ("credentials.refresh_token", &self.credentials.refresh_token),
      ("credentials.token_uri", &self.credentials.token_uri),
    ];
    for (field, value) in required {
      if value.trim().is_empty() {
        return Err(ConfigError::MissingField(field));
      }
    }
    Ok(())
  }
}

/// Load secrets from TRIVIA_SECRETS_PATH (default `./secrets.toml`).
pub fn load_secrets_from_env() -> Result<Secrets, ConfigError> {
  let path = std::env::var("TRIVIA_SECRETS_PATH").unwrap_or_else(|_| DEFAULT_SECRETS_PATH.into());
  let raw = std::fs::read_to_string(&path).map_err(|source| {
    error!(target: "trivia", %path, error = %source, "Failed to read secrets file");
    ConfigError::Read { path: path.clone(), source }
  })?;
  match Secrets::from_toml_str(&path, &raw) {
    Ok(s) => {
      info!(target: "trivia", %path, spreadsheet = %s.leaderboard.spreadsheet_id, worksheet = %s.leaderboard.worksheet, "Loaded secrets");
      Ok(s)
    }
    Err(e) => {
      error!(target: "trivia", %path, error = %e, "Invalid secrets file");
      Err(e)
    }
  }
}
