//! Sheet persistence glue: prefill URL and row serialization.
//!
//! The persistence target is an external form pre-filled via URL-encoded
//! defaults, paired with a tab-separated row the UI copies to the
//! clipboard. Only the serialization contract lives here; clipboard and
//! navigation stay with the UI collaborator.

use knihomol_core::{defaults, is_pin_format, MediaRecord};

/// Collapse tabs and newlines to spaces so a field value can never break
/// row or cell boundaries in the tab-separated export.
fn sanitize_cell(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ").trim().to_string()
}

/// The pin as persisted: the record's code when well-formed, the default
/// otherwise.
fn export_pin(record: &MediaRecord) -> &str {
    if is_pin_format(&record.pin) {
        &record.pin
    } else {
        defaults::DEFAULT_PIN
    }
}

/// One tab-separated row in the sheet's column order:
/// type, title, creator, year, annotation, source, pin.
pub fn sheet_row(record: &MediaRecord) -> String {
    [
        sanitize_cell(&record.kind.to_string()),
        sanitize_cell(&record.title),
        sanitize_cell(&record.creator),
        sanitize_cell(&record.year),
        sanitize_cell(&record.annotation),
        sanitize_cell(&record.source_url),
        export_pin(record).to_string(),
    ]
    .join("\t")
}

/// Prefill URL opening the external form with the record as defaults.
/// Keys are the form's column names.
pub fn sheet_prefill_url(record: &MediaRecord) -> String {
    let form_defaults = serde_json::json!({
        "Typ": record.kind.to_string(),
        "Název": record.title,
        "Autor": record.creator,
        "Rok": record.year,
        "Anotace": record.annotation,
        "Zdroj": record.source_url,
        "PIN": export_pin(record),
    });

    format!(
        "{}#view={}&defaults={}",
        defaults::SHEET_FORM_BASE,
        defaults::SHEET_FORM_VIEW,
        urlencoding::encode(&form_defaults.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use knihomol_core::MediaKind;

    fn record() -> MediaRecord {
        MediaRecord {
            kind: MediaKind::Book,
            title: "Babička".to_string(),
            creator: "Božena Němcová".to_string(),
            year: "1855".to_string(),
            annotation: "Pět vět o knize.".to_string(),
            source_url: "https://www.databazeknih.cz/vyhledavani/knihy?q=Babi%C4%8Dka".to_string(),
            pin: "1234".to_string(),
        }
    }

    #[test]
    fn test_sheet_row_column_order() {
        let row = sheet_row(&record());
        let cells: Vec<&str> = row.split('\t').collect();
        assert_eq!(cells.len(), 7);
        assert_eq!(cells[0], "Kniha");
        assert_eq!(cells[1], "Babička");
        assert_eq!(cells[2], "Božena Němcová");
        assert_eq!(cells[3], "1855");
        assert_eq!(cells[4], "Pět vět o knize.");
        assert_eq!(cells[6], "1234");
    }

    #[test]
    fn test_sheet_row_sanitizes_tabs_and_newlines() {
        let mut rec = record();
        rec.annotation = "První věta.\nDruhá\tvěta.\r\nTřetí.".to_string();
        let row = sheet_row(&rec);

        // Still exactly one row of seven cells
        assert!(!row.contains('\n'));
        assert_eq!(row.split('\t').count(), 7);
        assert!(row.contains("První věta. Druhá věta."));
    }

    #[test]
    fn test_sheet_row_malformed_pin_defaults() {
        let mut rec = record();
        rec.pin = "12".to_string();
        let row = sheet_row(&rec);
        assert!(row.ends_with("\t0000"));
    }

    #[test]
    fn test_prefill_url_shape() {
        let url = sheet_prefill_url(&record());
        assert!(url.starts_with(defaults::SHEET_FORM_BASE));
        assert!(url.contains("#view=Knihomol_AI_Form&defaults="));
    }

    #[test]
    fn test_prefill_url_encodes_defaults_json() {
        let url = sheet_prefill_url(&record());
        let encoded = url.split("&defaults=").nth(1).unwrap();
        let decoded = urlencoding::decode(encoded).unwrap();
        let json: serde_json::Value = serde_json::from_str(&decoded).unwrap();

        assert_eq!(json["Typ"], "Kniha");
        assert_eq!(json["Název"], "Babička");
        assert_eq!(json["Autor"], "Božena Němcová");
        assert_eq!(json["PIN"], "1234");
    }

    #[test]
    fn test_prefill_url_malformed_pin_defaults() {
        let mut rec = record();
        rec.pin = "abcd".to_string();
        let url = sheet_prefill_url(&rec);
        let encoded = url.split("&defaults=").nth(1).unwrap();
        let decoded = urlencoding::decode(encoded).unwrap();
        let json: serde_json::Value = serde_json::from_str(&decoded).unwrap();
        assert_eq!(json["PIN"], "0000");
    }
}
