//! Google Sheets leaderboard store.
//!
//! Two calls against the values API: a ranged GET for reads and a ranged
//! `:append` POST for writes, both on columns A:B of one worksheet. Appends
//! use `valueInputOption=RAW` so a name is stored as typed, never parsed as a
//! number or formula. The
//! access token comes from an OAuth2 refresh-token grant and is reused until
//! shortly before it expires.
//!
//! NOTE: tokens and the client secret never reach the logs.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

use crate::config::{Credentials, LeaderboardCfg};
use crate::error::{ConfigError, StoreError};
use crate::leaderboard::RawRow;
use crate::store::LeaderboardStore;
use crate::util::trunc_for_log;

const UA: &str = "kandersteg-trivia/0.1";
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

struct AccessToken {
  value: String,
  expires_at: Instant,
}

pub struct SheetsStore {
  client: reqwest::Client,
  credentials: Credentials,
  values_url: Url,
  append_url: Url,
  token: Mutex<Option<AccessToken>>,
}

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
  #[serde(default = "default_expires_in")]
  expires_in: u64,
}

fn default_expires_in() -> u64 { 3600 }

#[derive(Deserialize)]
struct ValueRange {
  #[serde(default)]
  values: Vec<Vec<Value>>,
}

impl SheetsStore {
  pub fn new(cfg: &LeaderboardCfg, credentials: Credentials) -> Result<Self, ConfigError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()?;

    let range = format!("{}!A:B", cfg.worksheet);
    let read_url = values_url(&cfg.api_base, &cfg.spreadsheet_id, &range)?;
    let mut append_url = values_url(&cfg.api_base, &cfg.spreadsheet_id, &format!("{range}:append"))?;
    append_url
      .query_pairs_mut()
      .append_pair("valueInputOption", "RAW")
      .append_pair("insertDataOption", "INSERT_ROWS");

    Url::parse(&credentials.token_uri).map_err(|e| ConfigError::InvalidUrl {
      field: "credentials.token_uri",
      message: e.to_string(),
    })?;

    Ok(Self { client, credentials, values_url: read_url, append_url, token: Mutex::new(None) })
  }

  /// Cached access token, refreshed when within a minute of expiry.
  #[instrument(level = "debug", skip(self))]
  async fn access_token(&self) -> Result<String, StoreError> {
    let mut slot = self.token.lock().await;
    if let Some(tok) = slot.as_ref() {
      if Instant::now() + TOKEN_REFRESH_MARGIN < tok.expires_at {
        return Ok(tok.value.clone());
      }
    }

    let res = self.client.post(&self.credentials.token_uri)
      .header(USER_AGENT, UA)
      .form(&[
        ("grant_type", "refresh_token"),
        ("client_id", self.credentials.client_id.as_str()),
        ("client_secret", self.credentials.client_secret.as_str()),
        ("refresh_token", self.credentials.refresh_token.as_str()),
      ])
      .send().await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_oauth_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      error!(target: "leaderboard", %status, "Token exchange rejected");
      return Err(StoreError::Auth(format!("HTTP {}: {}", status, msg)));
    }

    let body: TokenResponse = res.json().await?;
    debug!(target: "leaderboard", expires_in = body.expires_in, "Access token refreshed");
    let value = body.access_token.clone();
    *slot = Some(AccessToken {
      value: body.access_token,
      expires_at: Instant::now() + Duration::from_secs(body.expires_in),
    });
    Ok(value)
  }

  async fn check(res: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    if res.status().is_success() {
      return Ok(res);
    }
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    let message = extract_google_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
    Err(StoreError::Status { status, message })
  }
}

#[async_trait]
impl LeaderboardStore for SheetsStore {
  #[instrument(level = "info", skip(self))]
  async fn fetch_rows(&self) -> Result<Vec<RawRow>, StoreError> {
    let token = self.access_token().await?;
    let started = Instant::now();
    let res = self.client.get(self.values_url.clone())
      .header(USER_AGENT, UA)
      .header(AUTHORIZATION, format!("Bearer {}", token))
      .send().await?;
    let res = Self::check(res).await?;
    let body = res.text().await?;
    debug!(target: "leaderboard", bytes = body.len(), elapsed_ms = started.elapsed().as_millis() as u64, "Sheets values read");
    parse_value_range(&body)
  }

  #[instrument(level = "info", skip(self), fields(%name, score))]
  async fn append_row(&self, name: &str, score: u32) -> Result<(), StoreError> {
    let token = self.access_token().await?;
    let res = self.client.post(self.append_url.clone())
      .header(USER_AGENT, UA)
      .header(AUTHORIZATION, format!("Bearer {}", token))
      .json(&append_body(name, score))
      .send().await?;
    Self::check(res).await?;
    Ok(())
  }
}

fn values_url(base: &str, spreadsheet_id: &str, range: &str) -> Result<Url, ConfigError> {
  let invalid = |message: String| ConfigError::InvalidUrl { field: "leaderboard.api_base", message };
  let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
  url.path_segments_mut()
    .map_err(|_| invalid(format!("{} cannot be a base", base)))?
    .pop_if_empty()
    .extend(["spreadsheets", spreadsheet_id, "values", range]);
  Ok(url)
}

/// Request body for one appended row: name as a string, score as a number.
fn append_body(name: &str, score: u32) -> Value {
  json!({ "values": [[name, score]] })
}

/// Data rows from a values response; the first row is the header.
fn parse_value_range(body: &str) -> Result<Vec<RawRow>, StoreError> {
  let vr: ValueRange = serde_json::from_str(body)
    .map_err(|e| StoreError::Payload(format!("{} in {}", e, trunc_for_log(body, 120))))?;
  Ok(vr.values.into_iter().skip(1).collect())
}

fn extract_google_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

fn extract_oauth_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct OErr {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
  }
  serde_json::from_str::<OErr>(body).ok().map(|e| match e.error_description {
    Some(d) => format!("{}: {}", e.error, d),
    None => e.error,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn header_row_is_skipped() {
    let body = r#"{"range":"Sheet1!A1:B3","majorDimension":"ROWS","values":[["Name","Score"],["Ann","7"],["Bob"]]}"#;
    let rows = parse_value_range(body).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], Value::String("Ann".into()));
    assert_eq!(rows[1].len(), 1);
  }

  #[test]
  fn empty_sheet_has_no_values_key() {
    let rows = parse_value_range(r#"{"range":"Sheet1!A1:B1000","majorDimension":"ROWS"}"#).unwrap();
    assert!(rows.is_empty());
  }

  #[test]
  fn garbage_is_a_payload_error() {
    assert!(matches!(parse_value_range("<html>"), Err(StoreError::Payload(_))));
  }

  fn store_from(raw: &str) -> SheetsStore {
    let secrets = crate::config::Secrets::from_toml_str("mem", raw).unwrap();
    SheetsStore::new(&secrets.leaderboard, secrets.credentials).unwrap()
  }

  const SECRETS: &str = r#"
[leaderboard]
spreadsheet_id = "abc"

[credentials]
client_id = "id"
client_secret = "secret"
refresh_token = "refresh"
"#;

  #[test]
  fn append_url_stores_values_raw() {
    let store = store_from(SECRETS);
    assert_eq!(
      store.append_url.as_str(),
      "https://sheets.googleapis.com/v4/spreadsheets/abc/values/Sheet1!A:B:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS"
    );
    assert_eq!(store.values_url.as_str(), "https://sheets.googleapis.com/v4/spreadsheets/abc/values/Sheet1!A:B");
  }

  #[test]
  fn append_url_follows_worksheet_and_api_base() {
    let raw = SECRETS.replace("spreadsheet_id = \"abc\"", "spreadsheet_id = \"abc\"\nworksheet = \"Scores 2026\"\napi_base = \"http://localhost:9000/v4/\"");
    let store = store_from(&raw);
    assert_eq!(
      store.append_url.as_str(),
      "http://localhost:9000/v4/spreadsheets/abc/values/Scores%202026!A:B:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS"
    );
  }

  #[test]
  fn append_body_keeps_names_as_strings() {
    assert_eq!(append_body("007", 2), json!({ "values": [["007", 2]] }));
    let body = append_body("=HYPERLINK(\"x\")", 0);
    assert_eq!(body["values"][0][0], Value::String("=HYPERLINK(\"x\")".into()));
    assert_eq!(body["values"][0][1], json!(0));
  }

  #[test]
  fn urls_encode_the_worksheet_name() {
    let url = values_url(crate::config::DEFAULT_SHEETS_API_BASE, "abc", "My Scores!A:B").unwrap();
    assert_eq!(url.as_str(), "https://sheets.googleapis.com/v4/spreadsheets/abc/values/My%20Scores!A:B");
  }

  #[test]
  fn google_error_message_is_extracted() {
    let body = r#"{"error":{"code":403,"message":"The caller does not have permission","status":"PERMISSION_DENIED"}}"#;
    assert_eq!(extract_google_error(body).as_deref(), Some("The caller does not have permission"));
    let body = r#"{"error":"invalid_grant","error_description":"Token has been expired or revoked."}"#;
    assert_eq!(extract_oauth_error(body).as_deref(), Some("invalid_grant: Token has been expired or revoked."));
  }
}
