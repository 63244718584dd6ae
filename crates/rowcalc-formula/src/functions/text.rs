//! Text functions
//!
//! Positions are 0-based character offsets. Pattern arguments of REPLACE are
//! tried as regular expressions first and fall back to literal text when
//! they do not compile; SUBSTITUTE is always literal.

use super::first_error;
use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Compiled patterns, `None` for patterns that are not valid regexes
static PATTERN_CACHE: Lazy<Mutex<HashMap<String, Option<Regex>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

const MAX_CACHED_PATTERNS: usize = 256;

fn compile_pattern(pattern: &str) -> Option<Regex> {
    let mut cache = PATTERN_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(compiled) = cache.get(pattern) {
        return compiled.clone();
    }

    let compiled = Regex::new(pattern).ok();
    if cache.len() >= MAX_CACHED_PATTERNS {
        cache.clear();
    }
    cache.insert(pattern.to_string(), compiled.clone());
    compiled
}

/// Replace the first match of `pattern` in `subject`
///
/// The pattern is compiled as a regular expression. A pattern that does not
/// compile, such as a lone `(` or `[`, is searched for as literal text
/// instead. Without a match the subject comes back unchanged.
///
/// In the replacement, `$1`..`$99` insert a capture group that exists in the
/// pattern, `$&` inserts the whole match and `$$` a single `$`. Any other
/// `$` is kept as written, so `"$US"` stays `"$US"`.
///
/// # Example
/// ```rust
/// use rowcalc_formula::functions::text::replace_first;
///
/// assert_eq!(replace_first("Hello (World)", "H.l+", "Hi"), "Hio (World)");
/// assert_eq!(replace_first("Hello (World)", "(", "X"), "Hello XWorld)");
/// assert_eq!(replace_first("Hello (World)", "[", "X"), "Hello (World)");
/// assert_eq!(replace_first("10 EUR", "EUR", "$US"), "10 $US");
/// ```
pub fn replace_first(subject: &str, pattern: &str, replacement: &str) -> String {
    match compile_pattern(pattern) {
        Some(regex) => match regex.captures(subject) {
            Some(caps) => {
                let (start, end) = caps.get(0).map_or((0, 0), |m| (m.start(), m.end()));
                let mut out = String::with_capacity(subject.len() + replacement.len());
                out.push_str(&subject[..start]);
                expand_replacement(&caps, replacement, &mut out);
                out.push_str(&subject[end..]);
                out
            }
            None => subject.to_string(),
        },
        None => {
            debug!(
                "pattern {:?} is not a valid regex, replacing it literally",
                pattern
            );
            subject.replacen(pattern, replacement, 1)
        }
    }
}

/// Write `replacement` to `out`, expanding `$` references against `caps`
fn expand_replacement(caps: &Captures<'_>, replacement: &str, out: &mut String) {
    let groups = caps.len();
    let mut rest = replacement;

    while let Some(dollar) = rest.find('$') {
        out.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];
        let bytes = after.as_bytes();

        match bytes.first() {
            Some(b'$') => {
                out.push('$');
                rest = &after[1..];
            }
            Some(b'&') => {
                out.push_str(caps.get(0).map_or("", |m| m.as_str()));
                rest = &after[1..];
            }
            Some(d) if d.is_ascii_digit() => {
                let one = (d - b'0') as usize;
                let two = bytes
                    .get(1)
                    .filter(|d| d.is_ascii_digit())
                    .map(|d2| one * 10 + (d2 - b'0') as usize);

                // Prefer the two-digit group when the pattern has it
                let (group, digits) = match two {
                    Some(n) if n >= 1 && n < groups => (Some(n), 2),
                    _ if one >= 1 && one < groups => (Some(one), 1),
                    _ => (None, 0),
                };
                match group {
                    Some(n) => {
                        out.push_str(caps.get(n).map_or("", |m| m.as_str()));
                        rest = &after[digits..];
                    }
                    None => {
                        out.push('$');
                        rest = after;
                    }
                }
            }
            _ => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
}

/// Replace every literal occurrence of `search`; an empty search changes
/// nothing
pub fn substitute_all(subject: &str, search: &str, replacement: &str) -> String {
    if search.is_empty() {
        return subject.to_string();
    }
    subject.replace(search, replacement)
}

/// Characters `start..end` with both bounds clamped to the text and swapped
/// when reversed
fn char_slice(text: &str, start: f64, end: f64) -> String {
    let len = text.chars().count() as f64;
    let clamp = |n: f64| if n.is_nan() { 0.0 } else { n.trunc().clamp(0.0, len) };
    let (a, b) = (clamp(start), clamp(end));
    let (from, to) = if a <= b { (a, b) } else { (b, a) };
    text.chars()
        .skip(from as usize)
        .take((to - from) as usize)
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// REPLACE(text, pattern, replacement)
pub fn fn_replace(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::String(replace_first(
        &args[0].as_string(),
        &args[1].as_string(),
        &args[2].as_string(),
    )))
}

/// SUBSTITUTE(text, search, replacement)
pub fn fn_substitute(
    args: &[FormulaValue],
    _ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::String(substitute_all(
        &args[0].as_string(),
        &args[1].as_string(),
        &args[2].as_string(),
    )))
}

/// CONCAT(text1, ..., [separator])
///
/// With more than two arguments, a last argument of at most three
/// characters is a separator placed between the others.
pub fn fn_concat(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }

    let texts: Vec<String> = args.iter().map(FormulaValue::as_string).collect();
    if texts.len() > 2 {
        if let Some((separator, parts)) = texts.split_last() {
            if separator.chars().count() <= 3 {
                return Ok(FormulaValue::String(parts.join(separator)));
            }
        }
    }
    Ok(FormulaValue::String(texts.concat()))
}

/// MID(text, start, [length])
pub fn fn_mid(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }

    let text = args[0].as_string();
    let start = args[1].to_number();
    let end = match args.get(2) {
        Some(length) => start + length.to_number(),
        None => f64::INFINITY,
    };
    Ok(FormulaValue::String(char_slice(&text, start, end)))
}

/// LEFT(text, count)
pub fn fn_left(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    let text = args[0].as_string();
    Ok(FormulaValue::String(char_slice(&text, 0.0, args[1].to_number())))
}

/// RIGHT(text, count)
pub fn fn_right(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    let text = args[0].as_string();
    let len = text.chars().count() as f64;
    let count = args[1].to_number().max(0.0);
    Ok(FormulaValue::String(char_slice(&text, len - count, len)))
}

/// LEN(text)
pub fn fn_len(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::Number(args[0].as_string().chars().count() as f64))
}

/// FIND(needle, text, [start]): 0-based position of `needle`, or -1
pub fn fn_find(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }

    let needle = args[0].as_string();
    let text = args[1].as_string();
    let start = args
        .get(2)
        .map(FormulaValue::to_number)
        .filter(|n| n.is_finite() && *n > 0.0)
        .map_or(0, |n| n as usize);

    let byte_start = match text.char_indices().nth(start) {
        Some((offset, _)) => offset,
        None => text.len(),
    };

    let position = text[byte_start..]
        .find(&needle)
        .map(|offset| text[..byte_start + offset].chars().count() as f64)
        .unwrap_or(-1.0);
    Ok(FormulaValue::Number(position))
}

/// CONTAINS(text, search)
pub fn fn_contains(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::Boolean(
        args[0].as_string().contains(&args[1].as_string()),
    ))
}

/// TRIM(text)
pub fn fn_trim(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::String(args[0].as_string().trim().to_string()))
}

/// UPPER(text)
pub fn fn_upper(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::String(args[0].as_string().to_uppercase()))
}

/// LOWER(text)
pub fn fn_lower(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::String(args[0].as_string().to_lowercase()))
}

/// CAPITALIZE(text): first letter upper case, the rest lower case
pub fn fn_capitalize(
    args: &[FormulaValue],
    _ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    Ok(FormulaValue::String(capitalize(&args[0].as_string())))
}

/// PROPER(text): capitalize every space-separated word
pub fn fn_proper(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if let Some(err) = first_error(args) {
        return Ok(err);
    }
    let text = args[0].as_string();
    let words: Vec<String> = text.split(' ').map(capitalize).collect();
    Ok(FormulaValue::String(words.join(" ")))
}
