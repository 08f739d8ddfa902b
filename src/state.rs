//! Application state: question bank, intro content, the leaderboard gateway
//! and the table of HTTP sessions.
//!
//! Built once at startup and shared behind an `Arc`. Each session has its
//! own async mutex; a render pass holds it from start to finish, so events
//! for one session are processed one at a time.

use std::{collections::HashMap, sync::Arc, time::{Duration, Instant}};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::{IntroCfg, Secrets};
use crate::domain::Question;
use crate::error::ConfigError;
use crate::seeds::seed_questions;
use crate::session::SessionState;
use crate::sheets::SheetsStore;
use crate::store::{LeaderboardGateway, LeaderboardStore};

/// HTTP sessions untouched for this long are dropped on the next sweep.
const SESSION_IDLE_LIMIT: Duration = Duration::from_secs(6 * 60 * 60);

pub struct SessionSlot {
    pub state: Mutex<SessionState>,
    touched: std::sync::Mutex<Instant>,
}

impl SessionSlot {
    fn new() -> Self {
        Self { state: Mutex::new(SessionState::new()), touched: std::sync::Mutex::new(Instant::now()) }
    }

    fn touch(&self) {
        if let Ok(mut t) = self.touched.lock() {
            *t = Instant::now();
        }
    }

    fn idle_for(&self) -> Duration {
        self.touched.lock().map(|t| t.elapsed()).unwrap_or_default()
    }
}

pub struct AppState {
    pub questions: Vec<Question>,
    pub intro: IntroCfg,
    pub leaderboard: LeaderboardGateway,
    sessions: RwLock<HashMap<String, Arc<SessionSlot>>>,
    idle_limit: Duration,
}

/// Drop sessions idle for `limit` or longer.
fn sweep_idle(sessions: &mut HashMap<String, Arc<SessionSlot>>, limit: Duration) {
    let before = sessions.len();
    sessions.retain(|_, s| s.idle_for() < limit);
    if sessions.len() < before {
        debug!(target: "trivia", dropped = before - sessions.len(), "Dropped idle sessions");
    }
}

impl AppState {
    pub fn new(store: Arc<dyn LeaderboardStore>, cache_ttl: Duration, intro: IntroCfg, questions: Vec<Question>) -> Self {
        Self {
            questions,
            intro,
            leaderboard: LeaderboardGateway::new(store, cache_ttl),
            sessions: RwLock::new(HashMap::new()),
            idle_limit: SESSION_IDLE_LIMIT,
        }
    }

    #[cfg(test)]
    pub fn with_idle_limit(mut self, limit: Duration) -> Self {
        self.idle_limit = limit;
        self
    }

    /// Build state from loaded secrets: Sheets store, cache window, built-in questions.
    #[instrument(level = "info", skip_all)]
    pub fn from_secrets(secrets: Secrets) -> Result<Self, ConfigError> {
        let ttl = secrets.leaderboard.cache_ttl();
        let store = SheetsStore::new(&secrets.leaderboard, secrets.credentials)?;
        let questions = seed_questions();
        info!(target: "trivia", questions = questions.len(), cache_ttl_secs = ttl.as_secs(), "Quiz ready");
        Ok(Self::new(Arc::new(store), ttl, secrets.intro, questions))
    }

    /// Register a fresh session and return its id.
    #[instrument(level = "debug", skip(self))]
    pub async fn create_session(&self) -> (String, Arc<SessionSlot>) {
        let id = Uuid::new_v4().to_string();
        let slot = Arc::new(SessionSlot::new());
        let mut sessions = self.sessions.write().await;
        sweep_idle(&mut sessions, self.idle_limit);
        sessions.insert(id.clone(), slot.clone());
        (id, slot)
    }

    /// Look up a session; an id seen for the first time gets a fresh one.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn session(&self, id: &str) -> Arc<SessionSlot> {
        if let Some(slot) = { self.sessions.read().await.get(id).cloned() } {
            slot.touch();
            return slot;
        }
        let mut sessions = self.sessions.write().await;
        sweep_idle(&mut sessions, self.idle_limit);
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(target: "trivia", %id, "New session on first observation");
                Arc::new(SessionSlot::new())
            })
            .clone()
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::MemoryStore;

    fn state() -> AppState {
        AppState::new(Arc::new(MemoryStore::default()), Duration::ZERO, IntroCfg::default(), seed_questions())
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let st = state();
        let (a, slot_a) = st.create_session().await;
        let (b, _) = st.create_session().await;
        assert_ne!(a, b);
        slot_a.state.lock().await.start("Ann", 2).unwrap();
        assert!(st.session(&a).await.state.lock().await.quiz_started);
        assert!(!st.session(&b).await.state.lock().await.quiz_started);
    }

    #[tokio::test]
    async fn unknown_id_gets_a_fresh_session_once() {
        let st = state();
        let s1 = st.session("abc").await;
        let s2 = st.session("abc").await;
        assert!(Arc::ptr_eq(&s1, &s2));
        assert_eq!(st.session_count().await, 1);
    }

    #[tokio::test]
    async fn client_supplied_ids_are_swept_too() {
        let st = state().with_idle_limit(Duration::ZERO);
        st.session("first").await;
        st.session("second").await;
        st.session("third").await;
        assert_eq!(st.session_count().await, 1);
    }

    #[tokio::test]
    async fn fresh_sessions_survive_the_sweep() {
        let st = state();
        st.session("first").await;
        st.session("second").await;
        st.create_session().await;
        assert_eq!(st.session_count().await, 3);
    }
}
