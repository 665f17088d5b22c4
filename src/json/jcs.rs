//! JSON Canonicalization Scheme (RFC 8785) implementation.
//!
//! Two documents that carry the same data canonicalize to the same string,
//! which is how raw-text decodes are compared. Keys are sorted by UTF-16
//! code units and floats use ECMAScript `Number.prototype.toString` rules.

use std::cmp::Ordering;

use super::parser::{parse_with, Duplicates, ParseOptions};
use super::types::JsonValue;
use crate::error::JsonResult;

/// Compare two strings using UTF-16 code unit ordering.
///
/// This matches ECMAScript string comparison, which compares strings by
/// their UTF-16 code unit values, not Unicode code points.
pub fn compare_keys_utf16(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// Serialize an integer.
///
/// Integers are kept exact even outside the safe range, so ids above 2^53
/// still distinguish documents.
pub fn serialize_integer(value: i64) -> String {
    value.to_string()
}

/// Serialize a finite f64 using ECMAScript number serialization.
pub fn serialize_float(value: f64) -> String {
    if value == 0.0 {
        // Covers -0 as well
        return "0".to_string();
    }

    // `{:e}` yields the shortest round-tripping digits, e.g. "1.2345e-7".
    let sci = format!("{:e}", value.abs());
    let (mantissa, exponent) = match sci.split_once('e') {
        Some(parts) => parts,
        None => (sci.as_str(), "0"),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let k = digits.len() as i32;
    let n = exponent + 1;

    let mut out = String::new();
    if value < 0.0 {
        out.push('-');
    }

    if k <= n && n <= 21 {
        out.push_str(&digits);
        out.extend(std::iter::repeat('0').take((n - k) as usize));
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        out.push_str(int);
        out.push('.');
        out.push_str(frac);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take((-n) as usize));
        out.push_str(&digits);
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        out.push('e');
        out.push(if n - 1 < 0 { '-' } else { '+' });
        out.push_str(&(n - 1).abs().to_string());
    }
    out
}

/// Serialize a JsonValue to canonical JSON (RFC 8785).
pub fn canonicalize(value: &JsonValue) -> String {
    let mut output = String::new();
    serialize_value(value, &mut output);
    output
}

/// Parse a document and return its canonical form.
///
/// Repeated member names keep the last value, as serde_json does.
pub fn canonicalize_bytes(input: &[u8]) -> JsonResult<String> {
    let options = ParseOptions {
        duplicates: Duplicates::LastWins,
        ..ParseOptions::strict()
    };
    let value = parse_with(input, options).map_err(|i| i.error)?;
    Ok(canonicalize(&value))
}

fn serialize_value(value: &JsonValue, output: &mut String) {
    match value {
        JsonValue::Null => output.push_str("null"),
        JsonValue::Bool(true) => output.push_str("true"),
        JsonValue::Bool(false) => output.push_str("false"),
        JsonValue::Integer(n) => output.push_str(&serialize_integer(*n)),
        JsonValue::Float(f) => output.push_str(&serialize_float(*f)),
        JsonValue::String(s) => serialize_string(s, output),
        JsonValue::Array(arr) => serialize_array(arr, output),
        JsonValue::Object(_) => serialize_object(value, output),
    }
}

/// Serialize a string with proper JSON escaping.
pub(crate) fn serialize_string(s: &str, output: &mut String) {
    output.push('"');
    for ch in s.chars() {
        match ch {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\x08' => output.push_str("\\b"),
            '\x0C' => output.push_str("\\f"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c < '\x20' => {
                output.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => output.push(c),
        }
    }
    output.push('"');
}

fn serialize_array(arr: &[JsonValue], output: &mut String) {
    output.push('[');
    for (i, value) in arr.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        serialize_value(value, output);
    }
    output.push(']');
}

fn serialize_object(value: &JsonValue, output: &mut String) {
    let obj = match value {
        JsonValue::Object(o) => o,
        _ => return,
    };

    output.push('{');

    let mut members: Vec<(&String, &JsonValue)> = obj.iter().collect();
    members.sort_by(|a, b| compare_keys_utf16(a.0, b.0));

    for (i, (key, v)) in members.into_iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        serialize_string(key, output);
        output.push(':');
        serialize_value(v, output);
    }

    output.push('}');
}
