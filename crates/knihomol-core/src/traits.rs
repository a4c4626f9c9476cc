//! Core traits for Knihomol abstractions.
//!
//! These traits define the model backend seam, enabling pluggable
//! implementations and testability. Backends are injected explicitly into
//! the services that use them; there is no ambient client construction.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::ConversationTurn;

/// Backend for schema-constrained structured extraction from an image.
#[async_trait]
pub trait VisionExtractionBackend: Send + Sync {
    /// Send one image plus an instruction to the model, constrained to the
    /// given output schema, and return the raw model text.
    ///
    /// The text may still be fence-wrapped; stripping and parsing are the
    /// caller's concern. An empty string means the model produced no text.
    async fn generate_record(
        &self,
        image: &[u8],
        mime_type: &str,
        instruction: &str,
        schema: &JsonValue,
        temperature: f32,
    ) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for one turn of a contextual conversation.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Exchange one turn: the full ordered history (ending with the newest
    /// user turn) plus the session's system instruction, returning the
    /// assistant text. An empty string means the model produced no text.
    async fn send_message(
        &self,
        system_instruction: &str,
        history: &[ConversationTurn],
    ) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
