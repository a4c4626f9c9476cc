//! Contextual follow-up conversation seeded from an extracted record.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use knihomol_core::{defaults, ChatBackend, ConversationTurn, MediaRecord};

/// Build the system instruction embedding the record snapshot plus the
/// persona (default or caller override).
fn build_system_instruction(record: &MediaRecord, persona_override: Option<&str>) -> String {
    let persona = persona_override.unwrap_or(defaults::CHAT_PERSONA);
    format!(
        "Jsi inteligentní asistent pro kulturu. Uživatel se ptá na dílo ({kind}): \"{title}\".\n\n\
         Kontext:\n\
         {creator_label}: {creator}\n\
         Rok vydání: {year}\n\
         Zdroj: {source}\n\
         Anotace: {annotation}\n\n\
         {persona}",
        kind = record.kind,
        title = record.title,
        creator_label = record.kind.creator_label(),
        creator = record.creator,
        year = record.year,
        source = record.source_url,
        annotation = record.annotation,
        persona = persona,
    )
}

fn greeting(record: &MediaRecord) -> String {
    format!(
        "Ahoj! Jsem připraven odpovídat na otázky o {} \"{}\". Co tě zajímá?",
        record.kind.chat_noun(),
        record.title
    )
}

/// A long-lived dialogue about one record.
///
/// The record is read exactly once, at open time: later edits to the
/// record never reach an already-open session. History is append-only and
/// starts with one greeting turn, so after `n` sends it holds `1 + 2n`
/// turns.
pub struct ConversationSession {
    id: Uuid,
    backend: Arc<dyn ChatBackend>,
    system_instruction: String,
    history: Vec<ConversationTurn>,
}

impl ConversationSession {
    /// Seed a session from a record snapshot. Seeding happens exactly once
    /// per session; supplying a different override later requires a new
    /// session.
    pub fn open(
        backend: Arc<dyn ChatBackend>,
        record: &MediaRecord,
        persona_override: Option<&str>,
    ) -> Self {
        let id = Uuid::new_v4();
        debug!(session_id = %id, title = %record.title, "Opening conversation session");
        Self {
            id,
            backend,
            system_instruction: build_system_instruction(record, persona_override),
            history: vec![ConversationTurn::assistant(greeting(record))],
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Full ordered turn history, greeting first.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// The seeded instruction (stable for the session's lifetime).
    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Exchange one turn and return the assistant text.
    ///
    /// The user turn is appended immediately. A failed send or an empty
    /// model reply becomes a fixed assistant turn instead of an error, so
    /// the dialogue never breaks mid-session. Sends are serialized by the
    /// `&mut self` receiver.
    pub async fn send(&mut self, user_text: impl Into<String>) -> String {
        self.history.push(ConversationTurn::user(user_text));

        let reply = match self
            .backend
            .send_message(&self.system_instruction, &self.history)
            .await
        {
            Ok(text) if text.trim().is_empty() => defaults::CHAT_EMPTY_FALLBACK.to_string(),
            Ok(text) => text,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Chat send failed, inserting fallback turn");
                defaults::CHAT_ERROR_FALLBACK.to_string()
            }
        };

        self.history.push(ConversationTurn::assistant(reply.clone()));
        reply
    }
}
