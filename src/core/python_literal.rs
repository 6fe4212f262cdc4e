// src/core/python_literal.rs
//! Renders JSON values as Python source literals for the bot's config modules

use serde_json::Value;
use std::fmt::Write;

pub fn render(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => render_str(text),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(render).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(fields) => {
            let entries: Vec<String> = fields
                .iter()
                .map(|(key, value)| format!("{}: {}", render_str(key), render(value)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Quote a string the way Python's `repr` does: single quotes unless the text
/// holds a single quote and no double quote.
pub fn render_str(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let code = c as u32;
                let _ = if code <= 0xff {
                    write!(out, "\\x{:02x}", code)
                } else if code <= 0xffff {
                    write!(out, "\\u{:04x}", code)
                } else {
                    write!(out, "\\U{:08x}", code)
                };
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// A numeric string typed into the form, as the text of a bare Python number.
/// Integers are normalized since Python rejects leading zeros such as `030`.
pub fn numeric_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        let digits = digits.trim_start_matches('0');
        return Some(if digits.is_empty() {
            "0".to_string()
        } else {
            format!("{}{}", sign, digits)
        });
    }

    match trimmed.parse::<f64>() {
        Ok(number) if number.is_finite() && trimmed.chars().any(|c| c.is_ascii_digit()) => {
            Some(trimmed.to_string())
        }
        _ => None,
    }
}
