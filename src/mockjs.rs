//! Mockjs-style template expansion.
//!
//! Supports the directive subset documented for this engine: `key|n` and
//! `key|min-max` array repetition on object keys, `key|+step` passthrough
//! increments, and `@string`/`@integer(min,max)`/`@boolean`/`@word` leaf
//! placeholders recognized by value. Anything else is emitted unchanged
//! with a warning, rather than guessed at.

use rand::Rng;
use serde_json::Value;

/// Expand a mockjs-templated value into its concrete JSON form.
pub fn expand(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, v) in map {
                if let Some((name, directive)) = split_directive(key) {
                    apply_directive(&mut out, name, directive, v);
                } else {
                    out.insert(key.clone(), expand(v));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(expand).collect()),
        Value::String(s) => expand_placeholder(s).unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    }
}

fn split_directive(key: &str) -> Option<(&str, &str)> {
    key.split_once('|')
}

fn apply_directive(out: &mut serde_json::Map<String, Value>, name: &str, directive: &str, v: &Value) {
    if let Ok(count) = directive.parse::<usize>() {
        out.insert(name.to_string(), repeat_array(v, count));
        return;
    }
    if let Some((min, max)) = directive.split_once('-') {
        if let (Ok(min), Ok(max)) = (min.parse::<usize>(), max.parse::<usize>()) {
            let count = (min + max) / 2;
            out.insert(name.to_string(), repeat_array(v, count));
            return;
        }
    }
    if let Some(rest) = directive.strip_prefix('+') {
        if rest.parse::<i64>().is_ok() {
            out.insert(name.to_string(), expand(v));
            return;
        }
    }
    tracing::warn!(directive, key = name, "unsupported mockjs directive, passing through");
    out.insert(name.to_string(), expand(v));
}

/// `key|n`/`key|min-max` apply to an array holding a single template
/// element; the element (not the array) is what gets repeated.
fn repeat_array(v: &Value, count: usize) -> Value {
    let template = match v {
        Value::Array(items) => items.first().map(expand).unwrap_or(Value::Null),
        other => expand(other),
    };
    Value::Array(std::iter::repeat(template).take(count).collect())
}

fn expand_placeholder(s: &str) -> Option<Value> {
    if s == "@string" {
        return Some(Value::String("string".into()));
    }
    if s == "@boolean" {
        return Some(Value::Bool(rand::thread_rng().gen_bool(0.5)));
    }
    if s == "@word" {
        return Some(Value::String("word".into()));
    }
    if let Some(args) = s.strip_prefix("@integer(").and_then(|r| r.strip_suffix(')')) {
        let mut parts = args.split(',').map(|p| p.trim().parse::<i64>());
        if let (Some(Ok(min)), Some(Ok(max))) = (parts.next(), parts.next()) {
            if min <= max {
                return Some(Value::Number(rand::thread_rng().gen_range(min..=max).into()));
            }
        }
    }
    None
}
