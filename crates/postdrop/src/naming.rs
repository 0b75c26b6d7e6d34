//! Structured destination-filename derivation.
//!
//! Attachments distributed with email context are renamed to
//! `{sender}_{invoice}_{date}.{ext}`; everything else keeps its original
//! name. All derivations are pure.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;

/// Email metadata used to derive a structured filename.
#[derive(Debug, Clone)]
pub struct EmailContext {
    pub sender: String,
    pub date: String,
    pub subject: String,
}

fn invoice_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)invoice\s*#?(\d+)").expect("valid pattern"))
}

/// Extracts an invoice number from a subject line.
pub fn invoice_number(subject: &str) -> Option<String> {
    invoice_pattern()
        .captures(subject)
        .map(|captures| captures[1].to_string())
}

/// Reduces a From header to a filesystem-safe sender slug: the local part
/// of the address with every non-alphanumeric character replaced by `_`.
///
/// Display-name forms (`Name <user@host>`) are reduced to the address
/// first.
pub fn sender_slug(sender: &str) -> String {
    let address = sender
        .rsplit_once('<')
        .map(|(_, rest)| rest.trim_end_matches('>'))
        .unwrap_or(sender)
        .trim();
    let local = address.split('@').next().unwrap_or(address);

    local
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Date portion (no time) of a message date, accepting RFC 2822 headers,
/// RFC 3339 timestamps and bare `YYYY-MM-DD` dates.
fn iso_date(date: &str) -> Option<String> {
    if let Ok(parsed) = DateTime::parse_from_rfc2822(date) {
        return Some(parsed.format("%Y-%m-%d").to_string());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
        return Some(parsed.format("%Y-%m-%d").to_string());
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|parsed| parsed.format("%Y-%m-%d").to_string())
}

/// Derives the destination filename for one attachment.
///
/// With email context the result is
/// `{sender}_{invoice_or_unknown}_{iso_date}.{original_extension}`;
/// without context (or with an unparseable date) the original name is
/// returned unchanged. Deterministic for identical inputs.
pub fn derive_name(original: &str, context: Option<&EmailContext>) -> String {
    let Some(context) = context else {
        return original.to_string();
    };
    let Some(date) = iso_date(&context.date) else {
        return original.to_string();
    };

    let sender = sender_slug(&context.sender);
    let invoice = invoice_number(&context.subject).unwrap_or_else(|| "unknown".to_string());
    let extension = original
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("file");

    format!("{}_{}_{}.{}", sender, invoice, date, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(sender: &str, date: &str, subject: &str) -> EmailContext {
        EmailContext {
            sender: sender.to_string(),
            date: date.to_string(),
            subject: subject.to_string(),
        }
    }

    #[test]
    fn test_invoice_number_variants() {
        assert_eq!(invoice_number("Invoice #4521").as_deref(), Some("4521"));
        assert_eq!(invoice_number("invoice 99").as_deref(), Some("99"));
        assert_eq!(invoice_number("INVOICE#7").as_deref(), Some("7"));
        assert_eq!(invoice_number("Receipt for March"), None);
        assert_eq!(invoice_number("invoice pending"), None);
    }

    #[test]
    fn test_sender_slug_bare_address() {
        assert_eq!(sender_slug("billing@acme.com"), "billing");
    }

    #[test]
    fn test_sender_slug_display_name() {
        assert_eq!(sender_slug("Acme Billing <billing@acme.com>"), "billing");
    }

    #[test]
    fn test_sender_slug_replaces_non_alphanumerics() {
        assert_eq!(sender_slug("accounts.payable@acme.com"), "accounts_payable");
        assert_eq!(sender_slug("a+b@acme.com"), "a_b");
    }

    #[test]
    fn test_derive_name_full_context() {
        let ctx = context("billing@acme.com", "2024-03-01", "Invoice #4521");
        assert_eq!(
            derive_name("scan.pdf", Some(&ctx)),
            "billing_4521_2024-03-01.pdf"
        );
    }

    #[test]
    fn test_derive_name_rfc2822_date() {
        let ctx = context(
            "billing@acme.com",
            "Fri, 01 Mar 2024 10:30:00 +0000",
            "Invoice #4521",
        );
        assert_eq!(
            derive_name("scan.pdf", Some(&ctx)),
            "billing_4521_2024-03-01.pdf"
        );
    }

    #[test]
    fn test_derive_name_without_invoice_number() {
        let ctx = context("billing@acme.com", "2024-03-01", "Receipt for March");
        assert_eq!(
            derive_name("scan.pdf", Some(&ctx)),
            "billing_unknown_2024-03-01.pdf"
        );
    }

    #[test]
    fn test_derive_name_without_context() {
        assert_eq!(derive_name("scan.pdf", None), "scan.pdf");
    }

    #[test]
    fn test_derive_name_unparseable_date_keeps_original() {
        let ctx = context("billing@acme.com", "sometime last week", "Invoice #1");
        assert_eq!(derive_name("scan.pdf", Some(&ctx)), "scan.pdf");
    }

    #[test]
    fn test_derive_name_missing_extension() {
        let ctx = context("billing@acme.com", "2024-03-01", "Invoice #1");
        assert_eq!(derive_name("scan", Some(&ctx)), "billing_1_2024-03-01.file");
    }

    #[test]
    fn test_derive_name_keeps_last_extension() {
        let ctx = context("billing@acme.com", "2024-03-01", "Invoice #1");
        assert_eq!(
            derive_name("backup.tar.gz", Some(&ctx)),
            "billing_1_2024-03-01.gz"
        );
    }

    #[test]
    fn test_derive_name_is_deterministic() {
        let ctx = context("billing@acme.com", "2024-03-01", "Invoice #4521");
        let first = derive_name("scan.pdf", Some(&ctx));
        let second = derive_name("scan.pdf", Some(&ctx));
        assert_eq!(first, second);
    }
}
