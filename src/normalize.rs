//! Amount parsing and cosmetic text cleanup shared by the parsers.
//!
//! Amounts follow the Brazilian convention (`1.234,56`). Failures are
//! returned as [`Error::InvalidAmount`] so that callers can skip the record
//! and keep going.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

static RE_TRAILING_BR: Lazy<Regex> = Lazy::new(|| Regex::new(r"BR$").unwrap());
// PDF extraction leaves a stray `B` or `P` after the last word of a merchant
// name, glued on or after a single space. A standalone final `B`/`P` word is
// therefore dropped too.
static RE_ARTIFACT_B: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z]) ?B$").unwrap());
static RE_ARTIFACT_P: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z]) ?P$").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn strip_currency(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, 'R' | '$') && !c.is_whitespace())
        .collect()
}

fn to_decimal(cleaned: &str, raw: &str) -> Result<Decimal> {
    if cleaned.is_empty() {
        return Err(Error::InvalidAmount(raw.to_string()));
    }
    Decimal::from_str(cleaned).map_err(|_| Error::InvalidAmount(raw.to_string()))
}

/// Parse a Brazilian currency string (`R$ 1.234,56`) into a decimal.
///
/// Every `.` is a thousands separator and the first `,` is the decimal mark.
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let cleaned = strip_currency(raw).replace('.', "").replacen(',', ".", 1);
    to_decimal(&cleaned, raw)
}

/// Parse an amount whose separator style is not known in advance.
///
/// - both `.` and `,` present: `.` groups thousands, `,` is the decimal mark
/// - only `,`: decimal mark
/// - only `.`: decimal point, kept as-is
pub fn parse_amount_flexible(raw: &str) -> Result<Decimal> {
    let cleaned = strip_currency(raw);
    let normalized = match (cleaned.contains('.'), cleaned.contains(',')) {
        (true, true) => cleaned.replace('.', "").replacen(',', ".", 1),
        (false, true) => cleaned.replacen(',', ".", 1),
        _ => cleaned,
    };
    to_decimal(&normalized, raw)
}

/// Remove extraction artifacts from a merchant description.
pub fn clean_description(raw: &str) -> String {
    let desc = RE_TRAILING_BR.replace(raw, "");
    let desc = RE_ARTIFACT_B.replace(&desc, "$1");
    let desc = RE_ARTIFACT_P.replace(&desc, "$1");
    RE_WHITESPACE.replace_all(&desc, " ").trim().to_string()
}

/// Title-case a city name and strip a trailing `BR` country code.
pub fn format_city(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    RE_TRAILING_BR
        .replace(raw, "")
        .split(' ')
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Drop diacritics, whether the input carries precomposed (`ç`) or
/// decomposed (`c` + U+0327) letters.
pub fn strip_accents(raw: &str) -> String {
    raw.nfd().filter(|c| !is_combining_mark(*c)).collect()
}
