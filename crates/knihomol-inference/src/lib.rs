//! # knihomol-inference
//!
//! Model backend abstraction for the Knihomol pipeline.
//!
//! This crate provides:
//! - The Gemini REST backend implementing both core backend traits
//!   (schema-constrained extraction and conversational exchange)
//! - A scripted mock backend for tests (feature `mock`)
//!
//! Backends are constructed explicitly and injected into the pipeline
//! services; nothing here reads ambient state beyond `GeminiConfig::from_env`.
//!
//! # Example
//!
//! ```rust,no_run
//! use knihomol_inference::GeminiBackend;
//!
//! let backend = GeminiBackend::from_env().expect("GEMINI_API_KEY must be set");
//! ```

pub mod gemini;

// Mock model backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use knihomol_core::*;

pub use gemini::{GeminiBackend, GeminiConfig};
