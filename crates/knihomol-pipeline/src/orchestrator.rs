//! Lifecycle state machine: capture → analyze → details → chat.

use std::sync::Arc;

use tracing::{debug, info, warn};

use knihomol_core::{defaults, ChatBackend, Error, MediaRecord, OrchestratorState, Result};

use crate::conversation::ConversationSession;
use crate::extraction::ExtractionService;

/// Owns the capture→analyze→details→chat lifecycle.
///
/// At most one record and one conversation session are live at a time.
/// The session belongs to the current record: created lazily on first chat
/// entry, reused on every re-entry, destroyed only on reset. Both backends
/// are injected at construction.
pub struct AnalysisOrchestrator {
    extraction: ExtractionService,
    chat_backend: Arc<dyn ChatBackend>,
    state: OrchestratorState,
    record: Option<MediaRecord>,
    session: Option<ConversationSession>,
    error_message: Option<String>,
}

impl AnalysisOrchestrator {
    pub fn new(extraction: ExtractionService, chat_backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            extraction,
            chat_backend,
            state: OrchestratorState::Home,
            record: None,
            session: None,
            error_message: None,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// The current record, present in the details and chat stages.
    pub fn record(&self) -> Option<&MediaRecord> {
        self.record.as_ref()
    }

    /// The live conversation session, present once chat has been opened.
    pub fn session(&self) -> Option<&ConversationSession> {
        self.session.as_ref()
    }

    /// User-visible message from the last failed analysis, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Home → Capturing. The capture collaborator (camera or file picker)
    /// takes over until a raw image is available.
    pub fn begin_capture(&mut self) -> Result<()> {
        if self.state != OrchestratorState::Home {
            return Err(Error::State(format!(
                "cannot begin capture from {}",
                self.state
            )));
        }
        self.state = OrchestratorState::Capturing;
        Ok(())
    }

    /// Capturing → Analyzing → Details.
    ///
    /// On extraction failure the machine regresses two stages back to Home
    /// (abandon and retry from scratch) with the visible retry message set;
    /// no record is stored. The failure kind stays in logs and in the
    /// returned error. While an analysis is in flight no second one can be
    /// started.
    pub async fn analyze(
        &mut self,
        image: &[u8],
        mime_type: &str,
        prompt_override: Option<&str>,
    ) -> Result<&MediaRecord> {
        match self.state {
            OrchestratorState::Capturing => {}
            OrchestratorState::Analyzing => {
                return Err(Error::State("an analysis is already in flight".to_string()));
            }
            other => {
                return Err(Error::State(format!("cannot analyze from {}", other)));
            }
        }

        self.state = OrchestratorState::Analyzing;
        self.error_message = None;

        match self.extraction.extract(image, mime_type, prompt_override).await {
            Ok(record) => {
                info!(title = %record.title, kind = %record.kind, "Analysis complete");
                self.state = OrchestratorState::Details;
                Ok(self.record.insert(record))
            }
            Err(e) => {
                warn!(error = %e, "Analysis failed, returning to home");
                self.record = None;
                self.session = None;
                self.state = OrchestratorState::Home;
                self.error_message = Some(defaults::EXTRACT_RETRY_MESSAGE.to_string());
                Err(e.into())
            }
        }
    }

    /// Apply user edits as the current record (details stage only).
    ///
    /// The lookup URL is recomputed from the edited kind/title/creator and
    /// the pin normalized, so the stored record is always
    /// persistence-consistent.
    pub fn save_record(&mut self, mut edited: MediaRecord) -> Result<&MediaRecord> {
        if self.state != OrchestratorState::Details {
            return Err(Error::State(format!(
                "cannot save a record from {}",
                self.state
            )));
        }
        edited.refresh_source_url();
        edited.ensure_pin();
        Ok(self.record.insert(edited))
    }

    /// Details → Chat. The session is created lazily on first entry,
    /// seeded with the record as it stands at this instant; re-entering
    /// reuses the same session (history preserved, no duplicate greeting).
    pub fn open_chat(&mut self, persona_override: Option<&str>) -> Result<()> {
        if self.state != OrchestratorState::Details {
            return Err(Error::State(format!(
                "cannot open chat from {}",
                self.state
            )));
        }
        let record = self
            .record
            .as_ref()
            .ok_or_else(|| Error::State("no record is live".to_string()))?;

        if self.session.is_none() {
            self.session = Some(ConversationSession::open(
                Arc::clone(&self.chat_backend),
                record,
                persona_override,
            ));
        }
        self.state = OrchestratorState::Chat;
        Ok(())
    }

    /// Exchange one chat turn and return the assistant text.
    ///
    /// Conversational failures never surface here; they become fallback
    /// assistant turns inside the session.
    pub async fn send_chat(&mut self, user_text: &str) -> Result<String> {
        if self.state != OrchestratorState::Chat {
            return Err(Error::State(format!("chat is not open in {}", self.state)));
        }
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::State("no conversation session is live".to_string()))?;
        Ok(session.send(user_text).await)
    }

    /// Chat → Details. The session stays alive; history persists across
    /// the toggle.
    pub fn return_to_details(&mut self) -> Result<()> {
        if self.state != OrchestratorState::Chat {
            return Err(Error::State(format!(
                "cannot return to details from {}",
                self.state
            )));
        }
        self.state = OrchestratorState::Details;
        Ok(())
    }

    /// Any state → Home: discards record, conversation, and error message
    /// unconditionally.
    pub fn reset(&mut self) {
        debug!(state = %self.state, "Resetting to home");
        self.state = OrchestratorState::Home;
        self.record = None;
        self.session = None;
        self.error_message = None;
    }
}
