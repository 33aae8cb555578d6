//! Input validation helpers
//!
//! Centralized text length constants and validation functions.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Menu item names
pub const MAX_NAME_LEN: usize = 100;

/// Minimum menu item / recipient name length (after trim)
pub const MIN_NAME_LEN: usize = 2;

/// Notes, descriptions, reviews, cancellation reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Minimum delivery address length (after trim)
pub const MIN_ADDRESS_LEN: usize = 10;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Indian mobile numbers: exactly 10 digits
pub const PHONE_DIGITS: usize = 10;

// ── Predicates ──────────────────────────────────────────────────────

/// Exactly ten ASCII digits, no separators or country prefix
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == PHONE_DIGITS && phone.bytes().all(|b| b.is_ascii_digit())
}

/// Character count of the trimmed value
pub fn trimmed_len(value: &str) -> usize {
    value.trim().chars().count()
}

// ── Validation helpers (CRUD handlers) ──────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({len} chars, max {max_len})"
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value {
        let len = v.chars().count();
        if len > max_len {
            return Err(AppError::validation(format!(
                "{field} is too long ({len} chars, max {max_len})"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone() {
        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("987654321"));
        assert!(!is_valid_phone("+919876543210"));
        assert!(!is_valid_phone("98765-43210"));
        assert!(!is_valid_phone("９８７６５４３２１０"));
    }

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Masala Chai", "name", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("   ", "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text(&"x".repeat(101), "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_optional_text_counts_chars() {
        // 500 个多字节字符仍然合法
        let review = Some("é".repeat(MAX_NOTE_LEN));
        assert!(validate_optional_text(&review, "review", MAX_NOTE_LEN).is_ok());
        let too_long = Some("a".repeat(MAX_NOTE_LEN + 1));
        assert!(validate_optional_text(&too_long, "review", MAX_NOTE_LEN).is_err());
        assert!(validate_optional_text(&None, "review", MAX_NOTE_LEN).is_ok());
    }

    #[test]
    fn test_trimmed_len() {
        assert_eq!(trimmed_len("  ab "), 2);
    }
}
