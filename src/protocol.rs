//! Public protocol: render commands sent to the display surface and the
//! events it sends back. Shared by HTTP and WebSocket.

use serde::{Deserialize, Serialize};

use crate::domain::{LeaderboardEntry, Phase};

/// One render command. A page is an ordered list of these.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Title { text: String },
    Header { text: String },
    Subheader { text: String },
    Text { text: String },
    Markdown { text: String },
    Info { text: String },
    Success { text: String },
    Warning { text: String },
    Error { text: String },
    Image { url: String, caption: String },
    LinkButton { label: String, url: String },
    Divider,
    /// Free-text form; submits `start_quiz` with the entered name.
    NameForm { label: String, submit: String },
    /// Single-choice form; submits `submit_answer` with the chosen option.
    RadioForm { form_id: String, label: String, options: Vec<String>, submit: String },
    /// Plain button; clicking sends `event`.
    Button { label: String, event: String },
    Table { columns: Vec<String>, rows: Vec<LeaderboardEntry> },
    Placeholder { text: String },
}

/// Snapshot produced by one render pass.
#[derive(Clone, Debug, Serialize)]
pub struct Page {
    pub phase: Phase,
    pub blocks: Vec<Block>,
}

impl Page {
    /// Every block as one JSON string, for assertions.
    #[cfg(test)]
    pub fn text(&self) -> String {
        serde_json::to_string(&self.blocks).unwrap_or_default()
    }
}

/// Interaction events coming back from the display surface.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Re-render without changing state.
    View,
    StartQuiz { name: String },
    SubmitAnswer { option: String },
    PlayAgain,
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::View => "view",
            ClientEvent::StartQuiz { .. } => "start_quiz",
            ClientEvent::SubmitAnswer { .. } => "submit_answer",
            ClientEvent::PlayAgain => "play_again",
        }
    }
}

/// Messages the server sends over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Page { page: Page },
    Error { message: String },
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct SessionOut {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub page: Page,
}

#[derive(Serialize)]
pub struct LeaderboardOut {
    pub rows: Vec<LeaderboardEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
