//! Mock model backend for deterministic testing.
//!
//! Provides a scripted implementation of both backend traits so pipeline
//! tests can run without a live model endpoint. Responses are queued per
//! operation; failures are injected the same way. Every call is logged for
//! assertion.
//!
//! ## Usage
//!
//! ```rust
//! use knihomol_inference::mock::MockModelBackend;
//!
//! let backend = MockModelBackend::new()
//!     .with_extraction_response(r#"{"type":"Film","title":"Kolja","author":"Jan Svěrák","publicationYear":"1996","annotation":"Anotace."}"#)
//!     .with_chat_response("Odpověď.");
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use knihomol_core::{ChatBackend, ConversationTurn, Error, Result, VisionExtractionBackend};

/// Record JSON returned when no extraction response has been scripted.
pub const DEFAULT_RECORD_JSON: &str = r#"{"type":"Kniha","title":"Mock titul","author":"Mock autor","publicationYear":"2000","annotation":"Mock anotace."}"#;

/// Text returned when no chat response has been scripted.
pub const DEFAULT_CHAT_RESPONSE: &str = "Mock response";

/// One logged backend call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

enum Scripted {
    Text(String),
    Failure(String),
}

#[derive(Default)]
struct Inner {
    extraction: VecDeque<Scripted>,
    chat: VecDeque<Scripted>,
    calls: Vec<MockCall>,
}

/// Scripted mock backend implementing both model traits.
#[derive(Clone, Default)]
pub struct MockModelBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MockModelBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw model text for the next extraction call.
    pub fn with_extraction_response(self, text: impl Into<String>) -> Self {
        self.inner
            .lock()
            .unwrap()
            .extraction
            .push_back(Scripted::Text(text.into()));
        self
    }

    /// Queue a transport failure for the next extraction call.
    pub fn with_extraction_failure(self, message: impl Into<String>) -> Self {
        self.inner
            .lock()
            .unwrap()
            .extraction
            .push_back(Scripted::Failure(message.into()));
        self
    }

    /// Queue an assistant text for the next chat call.
    pub fn with_chat_response(self, text: impl Into<String>) -> Self {
        self.inner
            .lock()
            .unwrap()
            .chat
            .push_back(Scripted::Text(text.into()));
        self
    }

    /// Queue a transport failure for the next chat call.
    pub fn with_chat_failure(self, message: impl Into<String>) -> Self {
        self.inner
            .lock()
            .unwrap()
            .chat
            .push_back(Scripted::Failure(message.into()));
        self
    }

    /// Get all logged calls for assertion.
    pub fn calls(&self) -> Vec<MockCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Number of extraction calls made.
    pub fn extraction_call_count(&self) -> usize {
        self.count("generate_record")
    }

    /// Number of chat calls made.
    pub fn chat_call_count(&self) -> usize {
        self.count("send_message")
    }

    fn count(&self, operation: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn log_call(&self, operation: &str, input: &str) {
        self.inner.lock().unwrap().calls.push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
    }

    fn next(&self, operation: &str, default: &str) -> Result<String> {
        let scripted = {
            let mut inner = self.inner.lock().unwrap();
            match operation {
                "generate_record" => inner.extraction.pop_front(),
                _ => inner.chat.pop_front(),
            }
        };
        match scripted {
            Some(Scripted::Text(text)) => Ok(text),
            Some(Scripted::Failure(message)) => Err(Error::Request(message)),
            None => Ok(default.to_string()),
        }
    }
}

#[async_trait]
impl VisionExtractionBackend for MockModelBackend {
    async fn generate_record(
        &self,
        _image: &[u8],
        _mime_type: &str,
        instruction: &str,
        _schema: &JsonValue,
        _temperature: f32,
    ) -> Result<String> {
        self.log_call("generate_record", instruction);
        self.next("generate_record", DEFAULT_RECORD_JSON)
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[async_trait]
impl ChatBackend for MockModelBackend {
    async fn send_message(
        &self,
        _system_instruction: &str,
        history: &[ConversationTurn],
    ) -> Result<String> {
        let last = history.last().map(|t| t.text.as_str()).unwrap_or_default();
        self.log_call("send_message", last);
        self.next("send_message", DEFAULT_CHAT_RESPONSE)
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
