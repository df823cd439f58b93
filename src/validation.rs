//! Input validation for chat command arguments.
//!
//! Command arguments come straight from a public chat channel and end up in
//! URLs, file-backed caches and log lines, so they are cleaned and bounded here
//! before any service sees them.

/// Longest item / asset / player name accepted from chat.
pub const MAX_QUERY_CHARS: usize = 64;

/// Argument validation errors with messages suitable for replying in chat.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("A name is required")]
    Empty,

    #[error("Name is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Quantity must be a whole number, got '{raw}'")]
    NotANumber { raw: String },

    #[error("Quantity must be between 1 and {max}")]
    QuantityOutOfRange { max: u64 },
}

/// Strip control characters, collapse inner whitespace and enforce
/// [`MAX_QUERY_CHARS`].
pub fn sanitize_query(raw: &str) -> Result<String, ValidationError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(ValidationError::Empty);
    }
    if collapsed.chars().count() > MAX_QUERY_CHARS {
        return Err(ValidationError::TooLong {
            max: MAX_QUERY_CHARS,
        });
    }
    Ok(collapsed)
}

/// Parse a craft quantity and check it against the presentation ceiling.
pub fn validate_craft_quantity(raw: &str, max: u64) -> Result<u64, ValidationError> {
    let raw = raw.trim();
    let value: u64 = raw.parse().map_err(|_| {
        // negative or too large for u64: a number, just not a valid one
        let digits = raw.strip_prefix('-').unwrap_or(raw);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            ValidationError::QuantityOutOfRange { max }
        } else {
            ValidationError::NotANumber {
                raw: raw.to_string(),
            }
        }
    })?;
    if value == 0 || value > max {
        return Err(ValidationError::QuantityOutOfRange { max });
    }
    Ok(value)
}
