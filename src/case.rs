// Key case conversion between the wire format (snake_case) and the shape the
// rest of the crate works with (camelCase). The conversions walk any JSON
// tree; only object keys change, scalar values are never touched.

use serde_json::{Map, Value};

/// `plugin_id` -> `pluginId`. A `-` or `_` followed by a letter collapses into
/// the uppercased letter; anything else is copied through.
pub fn to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' || c == '-' {
            if let Some(next) = chars.peek().copied().filter(|n| n.is_ascii_alphabetic()) {
                out.push(next.to_ascii_uppercase());
                chars.next();
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// `pluginId` -> `plugin_id`.
pub fn to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn convert_keys(value: Value, f: fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (f(&k), convert_keys(v, f)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| convert_keys(v, f)).collect()),
        other => other,
    }
}

pub fn to_camel_case(value: Value) -> Value {
    convert_keys(value, to_camel)
}

pub fn to_snake_case(value: Value) -> Value {
    convert_keys(value, to_snake)
}

/// `serverEndpoint` -> `Server Endpoint`.
pub fn camel_case_to_title(input: &str) -> String {
    let mut spaced = String::with_capacity(input.len() + 4);
    let mut prev: Option<char> = None;
    for c in input.chars() {
        if let Some(p) = prev {
            if p.is_ascii_lowercase() && c.is_ascii_uppercase() {
                spaced.push(' ');
            }
        }
        spaced.push(c);
        prev = Some(c);
    }
    capitalize_words(&spaced)
}

/// `per_tx_fee` -> `Per Tx Fee`.
pub fn snake_case_to_title(input: &str) -> String {
    input
        .split('_')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_words(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_boundary = true;
    for c in input.chars() {
        let is_word = c.is_alphanumeric() || c == '_';
        if at_boundary && is_word {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_boundary = !is_word;
    }
    out
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
