//! Structured logging field name constants for the Knihomol pipeline.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "inference", "pipeline"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "gemini", "extraction", "conversation", "pin_gate", "orchestrator"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "extract", "send", "refresh", "analyze"
pub const OPERATION: &str = "op";

/// Conversation session UUID.
pub const SESSION_ID: &str = "session_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of a prompt or instruction.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Number of turns in a conversation history.
pub const TURN_COUNT: &str = "turn_count";

/// Number of pins in a fetched allow-list.
pub const PIN_COUNT: &str = "pin_count";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── State machine fields ──────────────────────────────────────────────────

/// Orchestrator stage name.
pub const STATE: &str = "state";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";
