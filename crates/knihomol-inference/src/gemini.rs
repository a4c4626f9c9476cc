//! Gemini model backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info, instrument, warn};

use knihomol_core::{
    defaults, ChatBackend, ConversationTurn, Error, Result, TurnRole, VisionExtractionBackend,
};

/// Default Gemini endpoint.
pub const DEFAULT_GEMINI_URL: &str = defaults::GEMINI_BASE_URL;

/// Default model for extraction and conversation.
pub const DEFAULT_GEMINI_MODEL: &str = defaults::GEMINI_MODEL;

/// Timeout for model requests (seconds).
pub const MODEL_TIMEOUT_SECS: u64 = defaults::MODEL_TIMEOUT_SECS;

/// Configuration for the Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Create a config with default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout_secs: MODEL_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables.
    ///
    /// `GEMINI_API_KEY` is required; an absent or empty value is a fatal
    /// configuration error. `GEMINI_BASE_URL` and `GEMINI_MODEL` override
    /// the defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(defaults::ENV_GEMINI_API_KEY)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                Error::Config(format!("{} not set", defaults::ENV_GEMINI_API_KEY))
            })?;

        let base_url = std::env::var(defaults::ENV_GEMINI_BASE_URL)
            .unwrap_or_else(|_| DEFAULT_GEMINI_URL.to_string());
        let model = std::env::var(defaults::ENV_GEMINI_MODEL)
            .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());

        Ok(Self {
            api_key,
            base_url,
            model,
            timeout_secs: MODEL_TIMEOUT_SECS,
        })
    }
}

/// Gemini REST backend for both structured extraction and conversation.
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Self {
        info!(
            "Initializing Gemini backend: url={}, model={}",
            config.base_url, config.model
        );
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(GeminiConfig::from_env()?))
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    /// Internal call shared by both trait implementations.
    async fn generate(&self, request: &GenerateContentRequest) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request(format!(
                "Gemini returned {}: {}",
                status, body
            )));
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::Request(format!("Failed to parse response: {}", e)))?;

        Ok(result.first_text())
    }
}

/// One content block of a `generateContent` request.
#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

/// One part within a content block: either text or inline image data.
#[derive(Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn image(mime_type: impl Into<String>, data: String) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data,
            }),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    /// Base64-encoded image bytes.
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Request payload for the `models/{model}:generateContent` endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// Response from the `generateContent` endpoint.
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate; empty when the model
    /// produced no text.
    fn first_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .concat()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl VisionExtractionBackend for GeminiBackend {
    #[instrument(skip(self, image, instruction, schema), fields(subsystem = "inference", component = "gemini", op = "generate_record", model = %self.config.model, prompt_len = instruction.len()))]
    async fn generate_record(
        &self,
        image: &[u8],
        mime_type: &str,
        instruction: &str,
        schema: &JsonValue,
        temperature: f32,
    ) -> Result<String> {
        use base64::Engine;

        let start = Instant::now();
        let data = base64::engine::general_purpose::STANDARD.encode(image);

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::image(mime_type, data), Part::text(instruction)],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(schema.clone()),
                temperature: Some(temperature),
            }),
        };

        let text = self.generate(&request).await?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = text.len(),
            duration_ms = elapsed,
            "Extraction call complete"
        );
        if elapsed > defaults::SLOW_MODEL_CALL_MS {
            warn!(duration_ms = elapsed, slow = true, "Slow extraction call");
        }
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    #[instrument(skip(self, system_instruction, history), fields(subsystem = "inference", component = "gemini", op = "send_message", model = %self.config.model, turn_count = history.len()))]
    async fn send_message(
        &self,
        system_instruction: &str,
        history: &[ConversationTurn],
    ) -> Result<String> {
        let start = Instant::now();

        let contents = history
            .iter()
            .map(|turn| Content {
                role: Some(
                    match turn.role {
                        TurnRole::User => "user",
                        TurnRole::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![Part::text(turn.text.clone())],
            })
            .collect();

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(system_instruction)],
            }),
            generation_config: None,
        };

        let text = self.generate(&request).await?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = text.len(),
            duration_ms = elapsed,
            "Chat call complete"
        );
        if elapsed > defaults::SLOW_MODEL_CALL_MS {
            warn!(duration_ms = elapsed, slow = true, "Slow chat call");
        }
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // Configuration Tests
    // ==========================================================================

    #[test]
    fn test_config_defaults() {
        let config = GeminiConfig::new("key");
        assert_eq!(config.api_key, "key");
        assert_eq!(config.base_url, DEFAULT_GEMINI_URL);
        assert_eq!(config.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.timeout_secs, MODEL_TIMEOUT_SECS);
    }

    #[test]
    fn test_endpoint_format() {
        let mut config = GeminiConfig::new("key");
        config.base_url = "http://localhost:9000".to_string();
        config.model = "test-model".to_string();
        let backend = GeminiBackend::new(config);
        assert_eq!(
            backend.endpoint(),
            "http://localhost:9000/v1beta/models/test-model:generateContent"
        );
    }

    #[test]
    fn test_model_name_accessor() {
        let backend = GeminiBackend::new(GeminiConfig::new("key"));
        assert_eq!(
            VisionExtractionBackend::model_name(&backend),
            DEFAULT_GEMINI_MODEL
        );
        assert_eq!(ChatBackend::model_name(&backend), DEFAULT_GEMINI_MODEL);
    }

    // ==========================================================================
    // Request/Response Struct Tests
    // ==========================================================================

    #[test]
    fn test_request_serialization_with_image() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::image("image/jpeg", "aGVsbG8=".to_string()),
                    Part::text("Analyzuj"),
                ],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(serde_json::json!({"type": "OBJECT"})),
                temperature: Some(0.4),
            }),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["contents"][0]["parts"][0]["inlineData"]["mimeType"],
            "image/jpeg"
        );
        assert_eq!(json["contents"][0]["parts"][1]["text"], "Analyzuj");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        let temperature = json["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.4).abs() < 1e-6);
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn test_request_serialization_chat() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("model".to_string()),
                parts: vec![Part::text("Ahoj!")],
            }],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text("Jsi asistent.")],
            }),
            generation_config: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Jsi asistent.");
        assert!(json["systemInstruction"].get("role").is_none());
        assert!(json.get("generationConfig").is_none());
        // Text parts must not carry an inlineData key
        assert!(json["contents"][0]["parts"][0].get("inlineData").is_none());
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "Hello"}, {"text": " there"}]}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_text(), "Hello there");
    }

    #[test]
    fn test_response_deserialization_no_candidates() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.first_text(), "");

        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert_eq!(response.first_text(), "");
    }

    #[test]
    fn test_response_deserialization_empty_content() {
        let json = r#"{"candidates": [{"content": {"parts": []}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_text(), "");

        let json = r#"{"candidates": [{}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_text(), "");
    }
}
