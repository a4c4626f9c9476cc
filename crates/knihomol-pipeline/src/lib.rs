//! # knihomol-pipeline
//!
//! Analysis/chat orchestration pipeline for Knihomol.
//!
//! This crate provides:
//! - [`AnalysisOrchestrator`]: the capture → analyze → details → chat
//!   state machine owning the current record and its conversation session
//! - [`ExtractionService`]: schema-constrained record extraction from a
//!   cover image, with deterministic lookup-URL derivation
//! - [`ConversationSession`]: the long-lived follow-up dialogue seeded
//!   once from the record
//! - [`PinGate`]: the fail-closed PIN allow-list guarding persistence
//! - Sheet export serialization (prefill URL + tab-separated row)
//!
//! Model backends are injected; see `knihomol-inference` for the Gemini
//! implementation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use knihomol_inference::GeminiBackend;
//! use knihomol_pipeline::{AnalysisOrchestrator, ExtractionService};
//!
//! # async fn run(image: Vec<u8>) -> knihomol_core::Result<()> {
//! let backend = Arc::new(GeminiBackend::from_env()?);
//! let mut orchestrator = AnalysisOrchestrator::new(
//!     ExtractionService::new(backend.clone()),
//!     backend,
//! );
//!
//! orchestrator.begin_capture()?;
//! orchestrator.analyze(&image, "image/jpeg", None).await?;
//! orchestrator.open_chat(None)?;
//! let answer = orchestrator.send_chat("Kdo je autor?").await?;
//! # let _ = answer;
//! # Ok(())
//! # }
//! ```

pub mod conversation;
pub mod export;
pub mod extraction;
pub mod orchestrator;
pub mod pin_gate;

// Re-export core types
pub use knihomol_core::*;

pub use conversation::ConversationSession;
pub use export::{sheet_prefill_url, sheet_row};
pub use extraction::{record_schema, ExtractionService};
pub use orchestrator::AnalysisOrchestrator;
pub use pin_gate::{AllowedPinSet, PinDecision, PinGate};
