//! Deterministic, collision-resistant destination filenames
//!
//! Produced names sort by message date and stay stable across runs:
//! `{date}_{sender}_{stem}{ext}`. The date falls back to the run timestamp
//! when the message carries no usable date, so composition never fails.

use chrono::{DateTime, Utc};

/// Longest sender fragment kept in a composed name
const SENDER_MAX_LEN: usize = 20;

/// Build the destination filename for one attachment.
///
/// - date: `YYYY-MM-DD` of the message date, or of `now` when absent
/// - sender: local part of the address, stripped to `[A-Za-z0-9_-]`,
///   truncated to 20 characters
/// - stem: original name without extension, path separators and colons
///   replaced by `_`
/// - extension: preserved verbatim, including case
pub fn compose(
    original_name: &str,
    message_date: Option<DateTime<Utc>>,
    sender: &str,
    now: DateTime<Utc>,
) -> String {
    let date = message_date.unwrap_or(now).format("%Y-%m-%d");
    let sender = sanitize_sender(sender);
    let (stem, extension) = split_extension(original_name);
    let stem = sanitize_stem(stem);

    format!("{}_{}_{}{}", date, sender, stem, extension)
}

/// Make a declared attachment name safe to use as a plain file name,
/// keeping it otherwise recognizable. Used for scratch copies.
pub fn sanitize_plain(name: &str) -> String {
    sanitize_stem(name)
}

/// Local part of the sender identity, reduced to filesystem-safe characters.
/// An identity without `@` is used whole.
fn sanitize_sender(sender: &str) -> String {
    let local = sender.split('@').next().unwrap_or(sender);
    local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(SENDER_MAX_LEN)
        .collect()
}

/// Split `name` into stem and extension, keeping the dot with the extension.
/// A leading dot or a missing dot means there is no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_compose_typical_invoice() {
        let name = compose(
            "Invoice.PDF",
            Some(ts(2025, 3, 2)),
            "jane.doe@firm.com",
            ts(2025, 4, 1),
        );
        assert_eq!(name, "2025-03-02_janedoe_Invoice.PDF");
    }

    #[test]
    fn test_compose_missing_date_falls_back_to_now() {
        let name = compose("scan.pdf", None, "office@acme.pl", ts(2025, 4, 1));
        assert_eq!(name, "2025-04-01_office_scan.pdf");
    }

    #[test]
    fn test_compose_sender_without_at_sign() {
        let name = compose("a.pdf", Some(ts(2025, 1, 5)), "MAILER-DAEMON", ts(2025, 1, 6));
        assert_eq!(name, "2025-01-05_MAILER-DAEMON_a.pdf");
    }

    #[test]
    fn test_compose_sender_truncated_to_twenty_chars() {
        let name = compose(
            "a.pdf",
            Some(ts(2025, 1, 5)),
            "accounts-payable-department@example.com",
            ts(2025, 1, 6),
        );
        assert_eq!(name, "2025-01-05_accounts-payable-dep_a.pdf");
    }

    #[test]
    fn test_compose_strips_odd_sender_characters() {
        let name = compose(
            "a.pdf",
            Some(ts(2025, 1, 5)),
            "\"J. Węgrzyn+tag\"@firm.com",
            ts(2025, 1, 6),
        );
        assert_eq!(name, "2025-01-05_JWgrzyntag_a.pdf");
    }

    #[test]
    fn test_compose_sanitizes_path_separators_in_stem() {
        let name = compose(
            "inv/2025:03\\final.pdf",
            Some(ts(2025, 3, 2)),
            "x@y",
            ts(2025, 4, 1),
        );
        assert_eq!(name, "2025-03-02_x_inv_2025_03_final.pdf");
    }

    #[test]
    fn test_compose_preserves_extension_case() {
        let name = compose("photo.JpG", Some(ts(2025, 3, 2)), "x@y", ts(2025, 4, 1));
        assert!(name.ends_with(".JpG"));
    }

    #[test]
    fn test_compose_name_without_extension() {
        let name = compose("READtoo", Some(ts(2025, 3, 2)), "x@y", ts(2025, 4, 1));
        assert_eq!(name, "2025-03-02_x_READtoo");
    }

    #[test]
    fn test_compose_hidden_file_has_no_extension_split() {
        // ".hidden" is all stem: a leading dot is not an extension separator.
        let name = compose(".hidden", Some(ts(2025, 3, 2)), "x@y", ts(2025, 4, 1));
        assert_eq!(name, "2025-03-02_x_.hidden");
    }

    #[test]
    fn test_sanitize_plain_keeps_extension() {
        assert_eq!(sanitize_plain("inv/03:final.jpg"), "inv_03_final.jpg");
        assert_eq!(sanitize_plain("photo.JPG"), "photo.JPG");
    }

    #[test]
    fn test_compose_is_deterministic() {
        let a = compose("Invoice.pdf", Some(ts(2025, 3, 2)), "a@b", ts(2025, 4, 1));
        let b = compose("Invoice.pdf", Some(ts(2025, 3, 2)), "a@b", ts(2025, 4, 1));
        assert_eq!(a, b);
    }
}
