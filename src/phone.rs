//! Mobile phone number checks for checkout.

use std::sync::LazyLock;

use regex::Regex;

static LOCAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0[567][0-9]{8}$").expect("Invalid regex"));
static INTERNATIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+213|00213)[567][0-9]{8}$").expect("Invalid regex"));

/// Removes whitespace and `-()`.
pub fn normalize_phone(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect()
}

pub fn is_valid_phone(input: &str) -> bool {
    let phone = normalize_phone(input);
    LOCAL_RE.is_match(&phone) || INTERNATIONAL_RE.is_match(&phone)
}

/// Groups a local number as `0X XX XX XX XX`. Only ASCII digits are
/// accepted, so the byte ranges below fall on character boundaries. International numbers are
/// returned normalized; anything unrecognised is returned as given.
pub fn format_phone(input: &str) -> String {
    let phone = normalize_phone(input);
    if LOCAL_RE.is_match(&phone) {
        return [&phone[0..2], &phone[2..4], &phone[4..6], &phone[6..8], &phone[8..10]].join(" ");
    }
    if INTERNATIONAL_RE.is_match(&phone) {
        return phone;
    }
    input.to_string()
}
