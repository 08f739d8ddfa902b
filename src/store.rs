//! Leaderboard store gateway.
//!
//! `LeaderboardStore` is the seam to the remote tabular service.
//! `LeaderboardGateway` wraps one store with a small read cache: reads
//! within `ttl` of the last successful fetch are served from memory,
//! appends always go straight to the store and leave the cache alone.
//! Concurrent misses may each fetch; the last one to finish fills the cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::domain::LeaderboardEntry;
use crate::error::StoreError;
use crate::leaderboard::{entries_from_rows, RawRow};

#[async_trait]
pub trait LeaderboardStore: Send + Sync {
  /// All data rows below the header.
  async fn fetch_rows(&self) -> Result<Vec<RawRow>, StoreError>;
  /// Insert one row after the last used one.
  async fn append_row(&self, name: &str, score: u32) -> Result<(), StoreError>;
}

struct CacheEntry {
  rows: Vec<LeaderboardEntry>,
  fetched_at: Instant,
}

pub struct LeaderboardGateway {
  store: Arc<dyn LeaderboardStore>,
  ttl: Duration,
  cache: Mutex<Option<CacheEntry>>,
}

impl LeaderboardGateway {
  pub fn new(store: Arc<dyn LeaderboardStore>, ttl: Duration) -> Self {
    Self { store, ttl, cache: Mutex::new(None) }
  }

  /// Unsorted entries, possibly from cache. Failed fetches are not cached.
  /// The cache lock is not held across the remote fetch.
  #[instrument(level = "debug", skip(self))]
  pub async fn load_all(&self) -> Result<Vec<LeaderboardEntry>, StoreError> {
    if let Some(entry) = self.cache.lock().await.as_ref() {
      if entry.fetched_at.elapsed() < self.ttl {
        debug!(target: "leaderboard", rows = entry.rows.len(), "Serving leaderboard from cache");
        return Ok(entry.rows.clone());
      }
    }

    match self.store.fetch_rows().await {
      Ok(raw) => {
        let rows = entries_from_rows(&raw);
        info!(target: "leaderboard", rows = rows.len(), "Fetched leaderboard");
        *self.cache.lock().await = Some(CacheEntry { rows: rows.clone(), fetched_at: Instant::now() });
        Ok(rows)
      }
      Err(e) => {
        warn!(target: "leaderboard", error = %e, "Leaderboard read failed");
        Err(e)
      }
    }
  }

  #[instrument(level = "info", skip(self), fields(%name, score))]
  pub async fn append(&self, name: &str, score: u32) -> Result<(), StoreError> {
    match self.store.append_row(name, score).await {
      Ok(()) => {
        info!(target: "leaderboard", %name, score, "Score appended");
        Ok(())
      }
      Err(e) => {
        warn!(target: "leaderboard", %name, score, error = %e, "Leaderboard append failed");
        Err(e)
      }
    }
  }
}

#[cfg(test)]
pub mod testing {
  //! In-memory store with call counters and failure switches.

  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use std::sync::Mutex as StdMutex;

  use serde_json::json;
  use tokio::sync::Notify;

  use super::*;

  fn unavailable(message: &str) -> StoreError {
    StoreError::Status { status: reqwest::StatusCode::SERVICE_UNAVAILABLE, message: message.into() }
  }

  #[derive(Default)]
  pub struct MemoryStore {
    pub rows: StdMutex<Vec<RawRow>>,
    pub reads: AtomicUsize,
    pub appends: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_appends: AtomicBool,
    /// When set, the next read signals `read_entered` and parks until `release_read`.
    pub hold_next_read: AtomicBool,
    pub read_entered: Notify,
    pub release_read: Notify,
  }

  impl MemoryStore {
    pub fn with_rows(rows: &[(&str, u32)]) -> Self {
      let store = Self::default();
      *store.rows.lock().unwrap() = rows.iter().map(|(n, s)| vec![json!(n), json!(s.to_string())]).collect();
      store
    }

    pub fn reads(&self) -> usize { self.reads.load(Ordering::SeqCst) }
    pub fn appends(&self) -> usize { self.appends.load(Ordering::SeqCst) }
  }

  #[async_trait]
  impl LeaderboardStore for MemoryStore {
    async fn fetch_rows(&self) -> Result<Vec<RawRow>, StoreError> {
      self.reads.fetch_add(1, Ordering::SeqCst);
      if self.hold_next_read.swap(false, Ordering::SeqCst) {
        self.read_entered.notify_one();
        self.release_read.notified().await;
      }
      if self.fail_reads.load(Ordering::SeqCst) {
        return Err(unavailable("reads disabled"));
      }
      Ok(self.rows.lock().unwrap().clone())
    }

    async fn append_row(&self, name: &str, score: u32) -> Result<(), StoreError> {
      self.appends.fetch_add(1, Ordering::SeqCst);
      if self.fail_appends.load(Ordering::SeqCst) {
        return Err(unavailable("writes disabled"));
      }
      self.rows.lock().unwrap().push(vec![json!(name), json!(score)]);
      Ok(())
    }
  }
}
