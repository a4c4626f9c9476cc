//! PIN allow-list gate guarding persistence.
//!
//! The allow-list lives in an externally published CSV sheet. Validation
//! is fail-closed: when the sheet is unreachable the accepted set narrows
//! to the single default code, it never widens.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use knihomol_core::{defaults, is_pin_format, Error, Result};

/// Deduplicated set of exactly-4-digit codes.
///
/// Rebuilt wholesale on each fetch; stale entries are fully discarded on
/// refresh, never accumulated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedPinSet {
    pins: HashSet<String>,
}

impl AllowedPinSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a CSV body: first column of each row, quotes and whitespace
    /// stripped, filtered to exactly-4-digit tokens, deduplicated.
    pub fn parse_csv(body: &str) -> Self {
        let pins = body
            .lines()
            .filter_map(|line| line.split(',').next())
            .map(|cell| cell.trim().trim_matches('"').trim())
            .filter(|cell| is_pin_format(cell))
            .map(str::to_string)
            .collect();
        Self { pins }
    }

    pub fn contains(&self, pin: &str) -> bool {
        self.pins.contains(pin)
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

impl FromIterator<String> for AllowedPinSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            pins: iter.into_iter().filter(|p| is_pin_format(p)).collect(),
        }
    }
}

/// Outcome of committing a candidate pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinDecision {
    /// Always a member of the allowed set or the literal default code.
    pub pin: String,
    /// True when the candidate was well-formed but not allowed: the value
    /// was replaced with the default and the user should confirm or edit.
    pub needs_confirmation: bool,
}

/// Fetches, caches, and validates against the allow-list.
pub struct PinGate {
    client: Client,
    source_url: String,
    allowed: AllowedPinSet,
}

impl PinGate {
    /// Gate against the default published sheet.
    pub fn new() -> Self {
        Self::with_source(defaults::PIN_SHEET_URL)
    }

    pub fn with_source(source_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            source_url: source_url.into(),
            allowed: AllowedPinSet::empty(),
        }
    }

    /// The currently cached allow-list (empty until the first refresh).
    pub fn allowed(&self) -> &AllowedPinSet {
        &self.allowed
    }

    /// Fetch the sheet and rebuild the cached set wholesale.
    ///
    /// On any failure the cache becomes the EMPTY set, so only the default
    /// code validates until a later refresh succeeds.
    #[instrument(skip(self), fields(subsystem = "pipeline", component = "pin_gate", op = "refresh"))]
    pub async fn refresh(&mut self) -> &AllowedPinSet {
        match self.try_fetch().await {
            Ok(set) => {
                info!(pin_count = set.len(), "Allow-list refreshed");
                self.allowed = set;
            }
            Err(e) => {
                warn!(error = %e, "Allow-list fetch failed, failing closed");
                self.allowed = AllowedPinSet::empty();
            }
        }
        &self.allowed
    }

    async fn try_fetch(&self) -> Result<AllowedPinSet> {
        let response = self
            .client
            .get(&self.source_url)
            .timeout(Duration::from_secs(defaults::PIN_FETCH_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| Error::AllowList(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::AllowList(format!(
                "Source returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::AllowList(format!("Failed to read body: {}", e)))?;

        Ok(AllowedPinSet::parse_csv(&body))
    }

    /// Typing-time normalization: keep digits, truncate to four.
    pub fn normalize_partial(input: &str) -> String {
        input
            .chars()
            .filter(char::is_ascii_digit)
            .take(defaults::PIN_LENGTH)
            .collect()
    }

    /// Commit-time validation against the cached allow-list.
    ///
    /// Incomplete input silently falls back to the default code. A
    /// well-formed code outside the allow-list also falls back, but raises
    /// the confirmation flag so the user can accept the default or edit.
    pub fn commit(&self, candidate: &str) -> PinDecision {
        let normalized = Self::normalize_partial(candidate);

        if !is_pin_format(&normalized) {
            return PinDecision {
                pin: defaults::DEFAULT_PIN.to_string(),
                needs_confirmation: false,
            };
        }

        if normalized != defaults::DEFAULT_PIN && !self.allowed.contains(&normalized) {
            debug!("Pin not in allow-list, replacing with default");
            return PinDecision {
                pin: defaults::DEFAULT_PIN.to_string(),
                needs_confirmation: true,
            };
        }

        PinDecision {
            pin: normalized,
            needs_confirmation: false,
        }
    }
}

impl Default for PinGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate_with(pins: &[&str]) -> PinGate {
        let mut gate = PinGate::with_source("http://unused.invalid");
        gate.allowed = pins.iter().map(|p| p.to_string()).collect();
        gate
    }

    // ==========================================================================
    // CSV Parsing Tests
    // ==========================================================================

    #[test]
    fn test_parse_csv_strips_quotes_and_whitespace() {
        let set = AllowedPinSet::parse_csv("1234\n\"5678\"\nabc\n");
        assert_eq!(set.len(), 2);
        assert!(set.contains("1234"));
        assert!(set.contains("5678"));
        assert!(!set.contains("abc"));
    }

    #[test]
    fn test_parse_csv_takes_first_column_only() {
        let set = AllowedPinSet::parse_csv("1234,Alice\n5678,Bob,extra\n");
        assert_eq!(set.len(), 2);
        assert!(set.contains("1234"));
        assert!(set.contains("5678"));
        assert!(!set.contains("Alice"));
    }

    #[test]
    fn test_parse_csv_deduplicates() {
        let set = AllowedPinSet::parse_csv("1234\n1234\n1234\n");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_parse_csv_rejects_malformed_tokens() {
        let set = AllowedPinSet::parse_csv("123\n12345\n12a4\n \n\n");
        assert!(set.is_empty());
    }

    #[test]
    fn test_parse_csv_windows_line_endings() {
        let set = AllowedPinSet::parse_csv("1234\r\n5678\r\n");
        assert_eq!(set.len(), 2);
        assert!(set.contains("1234"));
    }

    // ==========================================================================
    // Normalization Tests
    // ==========================================================================

    #[test]
    fn test_normalize_partial_strips_non_digits() {
        assert_eq!(PinGate::normalize_partial("12a4"), "124");
        assert_eq!(PinGate::normalize_partial(" 1 2 3 4 "), "1234");
        assert_eq!(PinGate::normalize_partial("abc"), "");
    }

    #[test]
    fn test_normalize_partial_truncates_to_four() {
        assert_eq!(PinGate::normalize_partial("123456"), "1234");
    }

    // ==========================================================================
    // Commit Tests
    // ==========================================================================

    #[test]
    fn test_commit_accepts_allowed_pin() {
        let gate = gate_with(&["1234", "5678"]);
        let decision = gate.commit("1234");
        assert_eq!(decision.pin, "1234");
        assert!(!decision.needs_confirmation);
    }

    #[test]
    fn test_commit_default_pin_always_valid() {
        let gate = gate_with(&[]);
        let decision = gate.commit("0000");
        assert_eq!(decision.pin, "0000");
        assert!(!decision.needs_confirmation);
    }

    #[test]
    fn test_commit_unknown_pin_raises_confirmation() {
        let gate = gate_with(&["1234", "5678"]);
        let decision = gate.commit("9999");
        assert_eq!(decision.pin, "0000");
        assert!(decision.needs_confirmation);
    }

    #[test]
    fn test_commit_incomplete_pin_silently_defaults() {
        let gate = gate_with(&["1234"]);
        for partial in ["", "12", "123"] {
            let decision = gate.commit(partial);
            assert_eq!(decision.pin, "0000");
            assert!(!decision.needs_confirmation, "input {:?}", partial);
        }
    }

    #[test]
    fn test_commit_normalizes_before_lookup() {
        let gate = gate_with(&["1234"]);
        let decision = gate.commit(" 1-2-3-4 ");
        assert_eq!(decision.pin, "1234");
        assert!(!decision.needs_confirmation);
    }

    #[test]
    fn test_empty_set_fails_closed() {
        // Fetch failure leaves the empty set: every 4-digit candidate other
        // than the default is rejected with confirmation.
        let gate = gate_with(&[]);
        for candidate in ["1234", "9999", "0001"] {
            let decision = gate.commit(candidate);
            assert_eq!(decision.pin, "0000");
            assert!(decision.needs_confirmation, "candidate {:?}", candidate);
        }
        assert_eq!(gate.commit("0000").pin, "0000");
    }

    #[test]
    fn test_commit_output_always_allowed_or_default() {
        let gate = gate_with(&["1234", "5678"]);
        for candidate in ["", "1", "1234", "5678", "9999", "abcd", "00001", "12345678"] {
            let decision = gate.commit(candidate);
            assert!(
                gate.allowed().contains(&decision.pin) || decision.pin == defaults::DEFAULT_PIN,
                "candidate {:?} produced {:?}",
                candidate,
                decision.pin
            );
        }
    }
}
