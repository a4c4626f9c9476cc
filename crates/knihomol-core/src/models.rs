//! Core data models for the Knihomol pipeline.
//!
//! These types are shared across all Knihomol crates and represent the
//! domain entities: the extracted media record, conversation turns, and
//! the orchestrator lifecycle stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;

// =============================================================================
// MEDIA RECORD
// =============================================================================

/// Kind of work on the analyzed cover.
///
/// Wire values keep the Czech labels the model schema and the record sheet
/// use ("Kniha" / "Film"). The kind determines creator-label semantics and
/// which external search target the lookup URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "Kniha")]
    Book,
    Film,
}

impl MediaKind {
    /// Label for the creator field: author for books, director for films.
    pub fn creator_label(&self) -> &'static str {
        match self {
            MediaKind::Book => "Autor",
            MediaKind::Film => "Režisér",
        }
    }

    /// Noun used when the chat refers to the work ("o knize" / "o filmu").
    pub fn chat_noun(&self) -> &'static str {
        match self {
            MediaKind::Book => "knize",
            MediaKind::Film => "filmu",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Book => write!(f, "Kniha"),
            MediaKind::Film => write!(f, "Film"),
        }
    }
}

/// True when `s` is exactly four ASCII digits.
pub fn is_pin_format(s: &str) -> bool {
    s.len() == defaults::PIN_LENGTH && s.bytes().all(|b| b.is_ascii_digit())
}

/// The unit of work: one normalized record per analyzed cover image.
///
/// Created by the extraction service, mutated only through explicit user
/// edits in the details stage, and read once by the conversation session
/// at open time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub title: String,
    pub creator: String,
    pub year: String,
    /// Five-sentence Czech synopsis.
    pub annotation: String,
    /// Derived from kind/title/creator, never model-authored.
    pub source_url: String,
    /// Four-digit access code; `"0000"` whenever absent or malformed.
    pub pin: String,
}

impl MediaRecord {
    /// Recompute the lookup URL from the current kind/title/creator.
    ///
    /// Must run before persistence so the link never goes stale after the
    /// user edits title or kind.
    pub fn refresh_source_url(&mut self) {
        self.source_url = crate::lookup::derive_source_url(self.kind, &self.title, &self.creator);
    }

    /// Reset the pin to the default code unless it is exactly four digits.
    pub fn ensure_pin(&mut self) {
        if !is_pin_format(&self.pin) {
            self.pin = defaults::DEFAULT_PIN.to_string();
        }
    }
}

// =============================================================================
// CONVERSATION
// =============================================================================

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One turn of the follow-up conversation. Turns form an append-only
/// ordered sequence; they are never reordered, deduplicated, or truncated
/// by this core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// A user turn stamped now.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// An assistant turn stamped now.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

// =============================================================================
// ORCHESTRATOR LIFECYCLE
// =============================================================================

/// Stage of the capture → analyze → details → chat lifecycle.
/// Exactly one record is live at a time once past `Home`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestratorState {
    Home,
    Capturing,
    Analyzing,
    Details,
    Chat,
}

impl std::fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrchestratorState::Home => "home",
            OrchestratorState::Capturing => "capturing",
            OrchestratorState::Analyzing => "analyzing",
            OrchestratorState::Details => "details",
            OrchestratorState::Chat => "chat",
        };
        write!(f, "{}", name)
    }
}
