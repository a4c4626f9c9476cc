//! # knihomol-core
//!
//! Core types, traits, and abstractions for the Knihomol pipeline.
//!
//! This crate provides the foundational data structures and trait
//! definitions that the other Knihomol crates depend on:
//! - The [`MediaRecord`] domain model and conversation types
//! - The model backend traits ([`VisionExtractionBackend`], [`ChatBackend`])
//! - The error taxonomy ([`Error`], [`ExtractError`])
//! - Centralized defaults and structured-logging field names
//! - Deterministic lookup URL derivation

pub mod defaults;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, ExtractError, Result};
pub use lookup::derive_source_url;
pub use models::{
    is_pin_format, ConversationTurn, MediaKind, MediaRecord, OrchestratorState, TurnRole,
};
pub use traits::{ChatBackend, VisionExtractionBackend};
