//! Phone number validation.

use std::sync::LazyLock;

use regex::Regex;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 \-]{6,15}$").unwrap());

/// Accepts an optional leading `+` followed by 6 to 15 digits, spaces or
/// hyphens. The whole string must match.
pub fn validate_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}
