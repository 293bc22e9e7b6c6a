//! Lenient JSON recovery from oracle text.
//!
//! Oracles are asked for one JSON object but sometimes wrap it in prose or
//! markdown fences. Recovery order: whole text, fenced block, first balanced
//! `{...}` object, outermost braces. Anything else is a parse failure; no
//! field values are ever guessed.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").unwrap();
}

/// Recover a single JSON object from raw oracle text.
pub fn parse_json_object(raw: &str) -> Result<Value, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("response is empty".to_string());
    }

    if let Some(value) = try_object(trimmed) {
        return Ok(value);
    }

    if let Some(caps) = CODE_FENCE.captures(trimmed) {
        if let Some(value) = caps.get(1).and_then(|m| try_object(m.as_str().trim())) {
            return Ok(value);
        }
    }

    if let Some(value) = first_balanced_object(trimmed).and_then(try_object) {
        return Ok(value);
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Some(value) = try_object(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err("response does not contain a JSON object".to_string())
}

fn try_object(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Slice of the first brace-balanced object, honouring string literals.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
