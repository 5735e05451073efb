//! Scalar type validators for regulatory report fields
//!
//! Every predicate here is pure and total: invalid or absent input
//! returns `false`, never a panic or an error. Rules compose these into
//! per-record findings; the predicates themselves know nothing about
//! entities or severities.
//!
//! The decimal profiles mirror the fixed report-field formats:
//! monetary amounts DECIMAL(12,2), rates DECIMAL(15,1), large exposures
//! DECIMAL(18,4), whole-unit counts DECIMAL(14,0) and percentages
//! DECIMAL(5,2).

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

/// ISO 4217 subset accepted by the reporting templates.
pub const VALID_CURRENCIES: &[&str] = &[
    "SGD", "USD", "EUR", "GBP", "JPY", "CNY", "HKD", "AUD", "NZD", "CHF", "CAD", "MYR", "IDR",
    "INR", "KRW", "THB", "TWD", "PHP", "VND",
];

/// Counterparty entity types accepted by the reporting templates.
pub const VALID_ENTITY_TYPES: &[&str] = &[
    "Banks",
    "Merchant Banks",
    "Finance Companies",
    "Non-bank Financial Institutions",
    "Non-financial Corporates",
    "Natural Persons",
    "Governments",
    "Others",
];

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("hard-coded regex")
    })
}

fn lei_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 18 alphanumeric characters followed by 2 check digits.
    RE.get_or_init(|| {
        Regex::new(r"^[A-Z0-9]{18}[0-9]{2}$").expect("hard-coded regex")
    })
}

fn sector_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{5}$").expect("hard-coded regex"))
}

/// Core precision/scale check shared by all decimal profiles: at most
/// `max_total` digits overall and `max_scale` fractional digits.
fn fits_precision(value: Decimal, max_total: u32, max_scale: u32) -> bool {
    let normalized = value.normalize();
    let scale = normalized.scale();
    if scale > max_scale {
        return false;
    }
    let integer_digits = {
        let trunc = normalized.abs().trunc();
        if trunc.is_zero() {
            0
        } else {
            trunc.to_string().len() as u32
        }
    };
    integer_digits + scale <= max_total
}

/// Monetary amount: DECIMAL(12,2).
pub fn is_valid_amount(value: Decimal) -> bool {
    fits_precision(value, 12, 2)
}

/// Interest or exchange rate: DECIMAL(15,1).
pub fn is_valid_rate(value: Decimal) -> bool {
    fits_precision(value, 15, 1)
}

/// Large exposure amount: DECIMAL(18,4).
pub fn is_valid_large_amount(value: Decimal) -> bool {
    fits_precision(value, 18, 4)
}

/// Whole-unit count: DECIMAL(14,0).
pub fn is_valid_integer_amount(value: Decimal) -> bool {
    fits_precision(value, 14, 0)
}

/// Percentage: DECIMAL(5,2).
pub fn is_valid_percentage(value: Decimal) -> bool {
    fits_precision(value, 5, 2)
}

/// ISO `YYYY-MM-DD` date text that parses to a real calendar date.
pub fn is_valid_date(text: &str) -> bool {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}

/// Strictly before the reference date (reference is normally "today",
/// passed in so the predicate stays pure).
pub fn is_past_date(date: NaiveDate, reference: NaiveDate) -> bool {
    date < reference
}

/// Non-empty text within the given length budget.
pub fn is_valid_text(text: &str, max_len: usize) -> bool {
    !text.trim().is_empty() && text.chars().count() <= max_len
}

pub fn is_valid_email(text: &str) -> bool {
    email_regex().is_match(text)
}

/// 20-character Legal Entity Identifier.
pub fn is_valid_lei(text: &str) -> bool {
    lei_regex().is_match(text)
}

pub fn is_valid_currency(code: &str) -> bool {
    VALID_CURRENCIES.contains(&code)
}

/// Fixed-width 5-digit SSIC sector code.
pub fn is_valid_sector_code(code: &str) -> bool {
    sector_code_regex().is_match(code)
}

pub fn is_valid_entity_type(entity_type: &str) -> bool {
    VALID_ENTITY_TYPES.contains(&entity_type)
}

/// Y/N encoding used by report flags.
pub fn is_yes_no(text: &str) -> bool {
    matches!(text, "Y" | "N")
}

/// Y/N/NA tri-state encoding.
pub fn is_yes_no_na(text: &str) -> bool {
    matches!(text, "Y" | "N" | "NA")
}

/// Plain boolean text typing.
pub fn is_boolean_text(text: &str) -> bool {
    matches!(text.to_ascii_lowercase().as_str(), "true" | "false")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dec(text: &str) -> Decimal {
        text.parse().unwrap()
    }

    #[test]
    fn test_amount_precision() {
        assert!(is_valid_amount(dec("1234567890.12")));
        assert!(is_valid_amount(dec("0.01")));
        assert!(is_valid_amount(dec("-99999.99")));
        // 3 fractional digits
        assert!(!is_valid_amount(dec("1.001")));
        // 13 total digits
        assert!(!is_valid_amount(dec("12345678901.12")));
    }

    #[test]
    fn test_trailing_zeros_normalize() {
        // 1.10 normalizes to 1.1 and fits a (15,1) rate profile
        assert!(is_valid_rate(dec("1.10")));
        assert!(!is_valid_rate(dec("1.15")));
    }

    #[test]
    fn test_integer_amount_rejects_fractions() {
        assert!(is_valid_integer_amount(dec("99999999999999")));
        assert!(!is_valid_integer_amount(dec("1.5")));
        assert!(!is_valid_integer_amount(dec("999999999999999")));
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(is_valid_percentage(dec("100.00")));
        assert!(is_valid_percentage(dec("0.25")));
        assert!(!is_valid_percentage(dec("1234.56")));
        assert!(!is_valid_percentage(dec("1.005")));
    }

    #[test]
    fn test_date_checks() {
        assert!(is_valid_date("2025-02-28"));
        assert!(!is_valid_date("2025-02-30"));
        assert!(!is_valid_date("28/02/2025"));
        assert!(!is_valid_date(""));

        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(is_past_date(
            NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
            today
        ));
        assert!(!is_past_date(today, today));
    }

    #[test]
    fn test_lei_format() {
        assert!(is_valid_lei("5493001RKR55V4X61F71"));
        assert!(!is_valid_lei("5493001RKR55V4X61F7")); // 19 chars
        assert!(!is_valid_lei("5493001rkr55v4x61f71")); // lowercase
        assert!(!is_valid_lei("5493001RKR55V4X61FAA")); // check digits not numeric
    }

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("ops@example.com.sg"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
    }

    #[test]
    fn test_enumerated_sets() {
        assert!(is_valid_currency("SGD"));
        assert!(!is_valid_currency("XXX"));
        assert!(is_valid_sector_code("64191"));
        assert!(!is_valid_sector_code("6419"));
        assert!(!is_valid_sector_code("64191A"));
        assert!(is_valid_entity_type("Non-financial Corporates"));
        assert!(!is_valid_entity_type("Hedge Funds"));
        assert!(is_yes_no("Y"));
        assert!(!is_yes_no("NA"));
        assert!(is_yes_no_na("NA"));
        assert!(is_boolean_text("TRUE"));
        assert!(!is_boolean_text("yes"));
    }

    #[test]
    fn test_bounded_text() {
        assert!(is_valid_text("ACME Holdings Pte Ltd", 100));
        assert!(!is_valid_text("   ", 100));
        assert!(!is_valid_text("abcdef", 5));
    }

    proptest! {
        // Totality: arbitrary decimals never panic and profiles nest
        // (anything that fits (12,2) also fits (18,4)).
        #[test]
        fn prop_precision_total_and_nested(mantissa in any::<i64>(), scale in 0u32..10) {
            let value = Decimal::new(mantissa, scale);
            let amount = is_valid_amount(value);
            let large = is_valid_large_amount(value);
            prop_assert!(!amount || large);
        }

        #[test]
        fn prop_date_parser_never_panics(text in "\\PC*") {
            let _ = is_valid_date(&text);
        }
    }
}
