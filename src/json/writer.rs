//! Compact serialization of [`JsonValue`] trees.
//!
//! Members are written in map order and floats with Rust's shortest
//! round-trip formatting, so output is stable for a given tree.

use std::io::{self, Write};

use super::jcs::serialize_string;
use super::types::JsonValue;

/// Write `value` to `out` without insignificant whitespace.
pub fn write_value<W: Write + ?Sized>(value: &JsonValue, out: &mut W) -> io::Result<()> {
    match value {
        JsonValue::Null => out.write_all(b"null"),
        JsonValue::Bool(true) => out.write_all(b"true"),
        JsonValue::Bool(false) => out.write_all(b"false"),
        JsonValue::Integer(n) => write!(out, "{n}"),
        JsonValue::Float(f) => write!(out, "{f:?}"),
        JsonValue::String(s) => write_string(s, out),
        JsonValue::Array(arr) => {
            out.write_all(b"[")?;
            for (i, v) in arr.iter().enumerate() {
                if i > 0 {
                    out.write_all(b",")?;
                }
                write_value(v, out)?;
            }
            out.write_all(b"]")
        }
        JsonValue::Object(obj) => {
            out.write_all(b"{")?;
            for (i, (k, v)) in obj.iter().enumerate() {
                if i > 0 {
                    out.write_all(b",")?;
                }
                write_string(k, out)?;
                out.write_all(b":")?;
                write_value(v, out)?;
            }
            out.write_all(b"}")
        }
    }
}

/// Write a quoted, escaped string.
pub fn write_string<W: Write + ?Sized>(s: &str, out: &mut W) -> io::Result<()> {
    let mut buf = String::with_capacity(s.len() + 2);
    serialize_string(s, &mut buf);
    out.write_all(buf.as_bytes())
}

/// Serialize `value` into a fresh buffer.
pub fn to_vec(value: &JsonValue) -> Vec<u8> {
    let mut out = Vec::new();
    // Writing to a Vec cannot fail.
    let _ = write_value(value, &mut out);
    out
}
