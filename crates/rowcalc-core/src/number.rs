//! Lenient number parsing for display strings
//!
//! Data rows frequently carry numbers formatted for humans: `"10 €"`,
//! `"1 000"`, `"1.000,50"` (French grouping), `"1,000.50"` (English grouping).
//! [`parse_smart_number`] extracts the intended value from such strings.

use lazy_regex::regex_is_match;

/// Parse a human-formatted number, returning 0 when nothing numeric is found
///
/// # Example
/// ```rust
/// use rowcalc_core::parse_smart_number;
///
/// assert_eq!(parse_smart_number("12.5"), 12.5);
/// assert_eq!(parse_smart_number("10 k€"), 10.0);
/// assert_eq!(parse_smart_number("1.000,50"), 1000.5);
/// assert_eq!(parse_smart_number("1,000.50"), 1000.5);
/// assert_eq!(parse_smart_number("abc"), 0.0);
/// ```
pub fn parse_smart_number(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }

    // Fast path for plain numbers
    if regex_is_match!(r"^-?\d+(\.\d+)?$", text) {
        return text.parse().unwrap_or(0.0);
    }

    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{00A0}')
        .collect();

    let last_comma = compact.rfind(',');
    let last_dot = compact.rfind('.');

    let normalized = match (last_comma, last_dot) {
        // "1.000,50": dots group thousands, the comma is the decimal separator
        (Some(c), Some(d)) if c > d => compact.replace('.', "").replacen(',', ".", 1),
        (Some(_), None) => compact.replacen(',', ".", 1),
        // "1,000.50": commas group thousands
        (_, Some(_)) => compact.replace(',', ""),
        (None, None) => compact,
    };

    let cleaned: String = normalized
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    parse_float_prefix(&cleaned).unwrap_or(0.0)
}

/// Parse only strings that are plain numbers (optionally signed, optional
/// fraction and exponent). Used where text must not be coerced silently.
pub fn parse_plain_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if regex_is_match!(r"^[-+]?(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?$", trimmed) {
        trimmed.parse().ok()
    } else {
        None
    }
}

/// Parse the longest leading numeric prefix: `"1.2.3"` → 1.2, `"-"` → None
fn parse_float_prefix(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    if end < bytes.len() && bytes[end] == b'-' {
        end += 1;
    }
    let mut best = None;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {
                seen_digit = true;
                end += 1;
                best = Some(end);
            }
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }

    if !seen_digit {
        return None;
    }
    best.and_then(|end| text[..end].parse().ok())
}
