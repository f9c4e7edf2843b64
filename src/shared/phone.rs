use lazy_static::lazy_static;
use regex::Regex;

use crate::core::error::{AppError, Result};

lazy_static! {
    /// Anything that is not a digit (used after stripping the leading +)
    static ref NON_DIGIT_RE: Regex = Regex::new(r"[^0-9]").unwrap();
}

/// Normalize an Indonesian phone number to canonical +62 form.
///
/// Accepted inputs (all map to the same canonical number):
/// - local with leading zero:     "0851-5534-7701"
/// - international with plus:     "+6285155347701"
/// - international without plus:  "6285155347701"
/// - bare subscriber number:      "85155347701"
///
/// Phone is the one field where a hard failure is correct: a ticket with
/// an unreachable reporter cannot be confirmed, updated, or rated.
pub fn normalize_phone(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidPhone("empty phone number".to_string()));
    }

    let digits = NON_DIGIT_RE.replace_all(trimmed, "").to_string();

    let national = if let Some(rest) = digits.strip_prefix("62") {
        rest.to_string()
    } else if let Some(rest) = digits.strip_prefix('0') {
        rest.to_string()
    } else {
        digits
    };

    // Indonesian mobile numbers are 9-12 digits after the country code
    // and always start with 8.
    if national.len() < 9 || national.len() > 12 || !national.starts_with('8') {
        return Err(AppError::InvalidPhone(format!(
            "'{}' is not a valid Indonesian mobile number",
            input
        )));
    }

    Ok(format!("+62{}", national))
}

/// Mask a normalized number for display: keep the first 3 and last 3
/// digits, e.g. "+6285155347701" -> "+628*******701".
pub fn mask_phone(normalized: &str) -> String {
    let digits: Vec<char> = normalized.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() <= 6 {
        return normalized.to_string();
    }

    let head: String = digits[..3].iter().collect();
    let tail: String = digits[digits.len() - 3..].iter().collect();
    let stars = "*".repeat(digits.len() - 6);
    format!("+{}{}{}", head, stars, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_forms_normalize_to_same_number() {
        let canonical = "+6285155347701";
        assert_eq!(normalize_phone("0851-5534-7701").unwrap(), canonical);
        assert_eq!(normalize_phone("+6285155347701").unwrap(), canonical);
        assert_eq!(normalize_phone("85155347701").unwrap(), canonical);
        assert_eq!(normalize_phone("6285155347701").unwrap(), canonical);
        assert_eq!(normalize_phone(" 0851 5534 7701 ").unwrap(), canonical);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(normalize_phone("").is_err());
        assert!(normalize_phone("abc").is_err());
        assert!(normalize_phone("0221234").is_err()); // landline-style, not 8-prefixed
        assert!(normalize_phone("812345").is_err()); // too short
        assert!(normalize_phone("8123456789012345").is_err()); // too long
    }

    #[test]
    fn masking_keeps_three_and_three() {
        let masked = mask_phone("+6285155347701");
        assert!(masked.starts_with("+628"));
        assert!(masked.ends_with("701"));
        assert!(masked.contains('*'));
        // Raw middle digits never appear
        assert!(!masked.contains("5534"));
    }
}
