//! Schema-constrained record extraction from a cover image.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, instrument, warn};

use knihomol_core::{
    defaults, derive_source_url, ExtractError, MediaKind, MediaRecord, VisionExtractionBackend,
};

/// Output schema the model is constrained to.
///
/// The lookup URL is deliberately absent: generative models fabricate
/// plausible-looking but invalid identifiers, so the link is derived
/// locally instead.
pub fn record_schema() -> JsonValue {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "type": {
                "type": "STRING",
                "enum": ["Kniha", "Film"],
                "description": "Classify if the image is a Book (Kniha) or a Movie (Film)."
            },
            "title": {
                "type": "STRING",
                "description": "The full title of the work."
            },
            "author": {
                "type": "STRING",
                "description": "The name of the author (if book) or director (if movie)."
            },
            "publicationYear": {
                "type": "STRING",
                "description": "The year of first publication or release."
            },
            "annotation": {
                "type": "STRING",
                "description": "A summary of the work in exactly 5 sentences. Must be in Czech language."
            }
        },
        "required": ["type", "title", "author", "publicationYear", "annotation"]
    })
}

/// Strip a surrounding markdown code fence, which some model responses
/// wrap around the JSON payload despite the response MIME constraint.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let body = body.strip_suffix("```").unwrap_or(body);
    body.trim()
}

/// Structured record exactly as the model returns it (wire field names).
#[derive(Deserialize)]
struct RawRecord {
    #[serde(rename = "type")]
    kind: MediaKind,
    title: String,
    author: String,
    #[serde(rename = "publicationYear")]
    publication_year: String,
    annotation: String,
}

/// One-shot structured extraction: image in, normalized record out.
pub struct ExtractionService {
    backend: Arc<dyn VisionExtractionBackend>,
}

impl ExtractionService {
    pub fn new(backend: Arc<dyn VisionExtractionBackend>) -> Self {
        Self { backend }
    }

    /// Extract a record from one cover image.
    ///
    /// At most one attempt per call; retrying is the caller's decision.
    /// Failure causes stay discriminable through [`ExtractError`].
    #[instrument(skip(self, image, prompt_override), fields(subsystem = "pipeline", component = "extraction", op = "extract", model = %self.backend.model_name()))]
    pub async fn extract(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt_override: Option<&str>,
    ) -> Result<MediaRecord, ExtractError> {
        let instruction = prompt_override.unwrap_or(defaults::EXTRACT_PROMPT);
        let schema = record_schema();

        let text = self
            .backend
            .generate_record(
                image,
                mime_type,
                instruction,
                &schema,
                defaults::EXTRACT_TEMPERATURE,
            )
            .await
            .map_err(|e| ExtractError::Transport(e.to_string()))?;

        if text.trim().is_empty() {
            warn!("Model returned an empty extraction response");
            return Err(ExtractError::EmptyResponse);
        }

        let payload = strip_code_fences(&text);
        let raw: RawRecord =
            serde_json::from_str(payload).map_err(|e| ExtractError::Schema(e.to_string()))?;

        let source_url = derive_source_url(raw.kind, &raw.title, &raw.author);
        debug!(response_len = text.len(), "Extraction parsed");

        Ok(MediaRecord {
            kind: raw.kind,
            title: raw.title,
            creator: raw.author,
            year: raw.publication_year,
            annotation: raw.annotation,
            source_url,
            pin: defaults::DEFAULT_PIN.to_string(),
        })
    }
}
