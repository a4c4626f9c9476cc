//! Centralized default constants for the Knihomol pipeline.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers or prompt strings.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// MODEL ENDPOINT
// =============================================================================

/// Environment variable for the required model-access credential.
/// Its absence is a fatal configuration error, not a recoverable one.
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// Environment variable overriding the model endpoint base URL.
pub const ENV_GEMINI_BASE_URL: &str = "GEMINI_BASE_URL";

/// Environment variable overriding the model name.
pub const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";

/// Default Gemini API base URL.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for both extraction and conversation.
pub const GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Timeout for model requests in seconds.
pub const MODEL_TIMEOUT_SECS: u64 = 120;

/// Threshold above which a model call is logged as slow (milliseconds).
pub const SLOW_MODEL_CALL_MS: u64 = 30_000;

// =============================================================================
// EXTRACTION
// =============================================================================

/// Sampling temperature for structured extraction. Low enough to keep the
/// record fields literal, high enough to phrase the annotation naturally.
pub const EXTRACT_TEMPERATURE: f32 = 0.4;

/// Default instruction sent with the cover image. The annotation register
/// is fixed here: exactly five sentences, Czech.
pub const EXTRACT_PROMPT: &str = "Analyzuj tento obrázek (obal knihy nebo plakát filmu). \
    Rozpoznej, zda jde o knihu nebo film. Extrahuj název, autora (u knihy) nebo režiséra \
    (u filmu) a rok vydání. Napiš krátkou anotaci (přesně 5 vět) v českém jazyce.";

/// Message shown when extraction fails and the user is returned to the start.
pub const EXTRACT_RETRY_MESSAGE: &str =
    "Nepodařilo se analyzovat obrázek. Zkuste to prosím znovu nebo vyfoťte lepší fotku.";

// =============================================================================
// CONVERSATION
// =============================================================================

/// Default persona instruction appended to the record context when a
/// session opens without a caller-supplied override.
pub const CHAT_PERSONA: &str = "Odpovídej stručně, věcně a vždy v českém jazyce. \
    Umožni uživateli zeptat se i na něco v souvislosti s dílem např. detaily ohledně \
    autora/režiséra, postav, herců, dalších děl autora. Věci úplně mimo kontext díla \
    zdvořile odmítni.";

/// Assistant turn inserted when the model returns empty text for a send.
pub const CHAT_EMPTY_FALLBACK: &str = "Omlouvám se, nerozuměl jsem.";

/// Assistant turn inserted when a send fails outright. The dialogue
/// continues; the failure never surfaces as an error to the caller.
pub const CHAT_ERROR_FALLBACK: &str =
    "Došlo k chybě při komunikaci. Zkuste to prosím znovu.";

// =============================================================================
// LOOKUP URL DERIVATION
// =============================================================================

/// Film lookup: CSFD search, keyed on title only.
pub const FILM_SEARCH_BASE: &str = "https://www.csfd.cz/hledat/";

/// Book lookup: Databazeknih search, keyed on title and creator jointly.
/// Book titles collide more often than film titles, so the joint key
/// disambiguates better.
pub const BOOK_SEARCH_BASE: &str = "https://www.databazeknih.cz/vyhledavani/knihy";

// =============================================================================
// PIN GATE
// =============================================================================

/// The default access code. Always valid, even when the allow-list is
/// unreachable (fail-closed: an empty allow-list narrows acceptance to
/// this single code, never widens it).
pub const DEFAULT_PIN: &str = "0000";

/// Required pin length in digits.
pub const PIN_LENGTH: usize = 4;

/// Published CSV source of the allow-list. First column of each row is
/// the pin column; no authentication.
pub const PIN_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vS7M4bPxLokcmCneYwkskLfcAOhk5j2oXuObucilC5S_A8_4btaD48IYfmCUgJ_TV1lO4ZecMahbGay/pub?gid=1455483239&single=true&output=csv";

/// Timeout for the allow-list fetch in seconds.
pub const PIN_FETCH_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// SHEET EXPORT
// =============================================================================

/// Base URL of the external form used as the persistence target.
pub const SHEET_FORM_BASE: &str =
    "https://www.appsheet.com/start/33b34290-cc77-4a7b-9c7e-9cb483dc3f3d";

/// Form view name the prefill URL opens.
pub const SHEET_FORM_VIEW: &str = "Knihomol_AI_Form";
