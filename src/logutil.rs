//! Logging helpers for chat content.
//!
//! Chat messages are multi-line and user controlled; log them through
//! [`escape_log`] so every record stays on one line.

/// Longest chat preview written to a log record, in characters.
pub const MAX_LOG_PREVIEW: usize = 200;

/// Escape control characters (`\n`, `\r`, `\t`, backslash, others as `\xNN`)
/// and cut the text at [`MAX_LOG_PREVIEW`] characters with an ellipsis.
pub fn escape_log(s: &str) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(s.len().min(MAX_LOG_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_LOG_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Mask a secret for logging: keeps the first four characters.
pub fn redact(secret: &str) -> String {
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    let head: String = secret.chars().take(4).collect();
    format!("{}…", head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_newlines_and_backslashes() {
        assert_eq!(escape_log("!tscraft\nwood\\x"), "!tscraft\\nwood\\\\x");
    }

    #[test]
    fn truncates_long_messages() {
        let long = "a".repeat(MAX_LOG_PREVIEW + 50);
        let esc = escape_log(&long);
        assert_eq!(esc.chars().count(), MAX_LOG_PREVIEW + 1);
        assert!(esc.ends_with('…'));
    }

    #[test]
    fn redacts_secrets() {
        assert_eq!(redact(""), "<unset>");
        assert_eq!(redact("abcdefgh"), "abcd…");
    }
}
