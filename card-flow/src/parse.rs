//! Parsing of free-text answers into the figures the recommendation engine filters on.
//!
//! Every parser returns an explicit [`Result`]; a failure means "no recommendation can be
//! made from this profile" and is never fatal.

use std::num::IntErrorKind;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static SCORE_RANGE_EXACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2,3}\s*-\s*[0-9]{2,3}$").expect("valid regex"));
static SCORE_RANGE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2,3})\s*-\s*[0-9]{2,3}").expect("valid regex"));
static INCOME_THOUSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9.]+)k\b").expect("valid regex"));
static INCOME_LAKH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9.]+)\s*lakh").expect("valid regex"));
static INCOME_PLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9.]+").expect("valid regex"));

const THOUSAND: f64 = 1_000.0;
const LAKH: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no income figure found in {0:?}")]
    MissingIncome(String),

    #[error("malformed number {0:?}")]
    MalformedNumber(String),

    #[error("unrecognised credit score {0:?}")]
    UnrecognisedScore(String),
}

/// Returns true for `unknown`, the empty string, a two/three digit range (`650-700`)
/// or a plain digit string.
pub fn is_valid_score(text: &str) -> bool {
    let t = text.trim().to_lowercase();
    t.is_empty() || t == "unknown" || SCORE_RANGE_EXACT.is_match(&t) || is_all_digits(&t)
}

/// Parses a monthly income such as `60k`, `1.5 lakh`, `75,000` or `about 50000 rupees`.
///
/// The `k` and `lakh` forms only apply to a leading figure; otherwise the first number
/// anywhere in the text is used. Fractions truncate toward zero.
pub fn parse_income(text: &str) -> Result<i64, ParseError> {
    let s = text.to_lowercase().replace(',', "");
    let s = s.trim();

    if let Some(caps) = INCOME_THOUSANDS.captures(s) {
        return scaled(&caps[1], THOUSAND);
    }
    if let Some(caps) = INCOME_LAKH.captures(s) {
        return scaled(&caps[1], LAKH);
    }
    match INCOME_PLAIN.find(s) {
        Some(m) => scaled(m.as_str(), 1.0),
        None => Err(ParseError::MissingIncome(text.to_string())),
    }
}

/// Parses a credit score answer. `Ok(None)` means the score is unknown and should not
/// restrict eligibility; a range yields its lower bound.
pub fn parse_credit_score(text: &str) -> Result<Option<i64>, ParseError> {
    let t = text.trim().to_lowercase();
    if t.is_empty() || t == "unknown" {
        return Ok(None);
    }
    if let Some(caps) = SCORE_RANGE_PREFIX.captures(&t) {
        return whole(&caps[1]).map(Some);
    }
    if is_all_digits(&t) {
        return whole(&t).map(Some);
    }
    Err(ParseError::UnrecognisedScore(text.to_string()))
}

fn scaled(number: &str, factor: f64) -> Result<i64, ParseError> {
    let value: f64 = number
        .parse()
        .map_err(|_| ParseError::MalformedNumber(number.to_string()))?;
    let amount = (value * factor).trunc();
    if !amount.is_finite() {
        return Err(ParseError::MalformedNumber(number.to_string()));
    }
    // Finite figures past i64 saturate; they clear every threshold either way.
    Ok(amount as i64)
}

fn whole(digits: &str) -> Result<i64, ParseError> {
    match digits.parse::<i64>() {
        Ok(value) => Ok(value),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(i64::MAX),
        Err(_) => Err(ParseError::MalformedNumber(digits.to_string())),
    }
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
