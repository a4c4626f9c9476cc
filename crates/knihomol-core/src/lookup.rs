//! Deterministic lookup URL derivation.
//!
//! The lookup link is never taken from the model, because generative models
//! fabricate plausible-looking but invalid identifiers. Instead the URL is
//! recomputed from the record fields whenever they change.

use crate::defaults;
use crate::models::MediaKind;

/// Derive the external search URL for a record.
///
/// Films search CSFD by title alone. Books search Databazeknih by title
/// and creator jointly, since book titles collide more often.
///
/// Pure and deterministic: identical inputs always yield the identical URL.
pub fn derive_source_url(kind: MediaKind, title: &str, creator: &str) -> String {
    match kind {
        MediaKind::Film => format!(
            "{}?q={}",
            defaults::FILM_SEARCH_BASE,
            urlencoding::encode(title)
        ),
        MediaKind::Book => {
            let query = format!("{} {}", title, creator);
            format!(
                "{}?q={}",
                defaults::BOOK_SEARCH_BASE,
                urlencoding::encode(&query)
            )
        }
    }
}
