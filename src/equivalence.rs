//! Semantic equality of decoded values.
//!
//! Both sides are lowered to a [`JsonValue`] tree and compared structurally.
//! Raw text is canonicalized first, so layout and number spelling never count
//! as a difference. A failed comparison yields the JSON Pointer of the first
//! divergent location.

use std::collections::BTreeSet;
use std::fmt;

use crate::corpus::Shape;
use crate::json::{canonicalize_bytes, parse_with, Duplicates, JsonValue, ParseOptions};
use crate::registry::Value;

/// How strictly two trees are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// `null` and an absent member match any empty container, but an empty
    /// array never matches an empty object
    EmptyEquivalent,
    /// Only numeric representation is ignored
    Exact,
}

/// The first location where two values disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    /// JSON Pointer (RFC 6901) to the location, empty for the root
    pub path: String,
    /// Expected value, abbreviated
    pub want: String,
    /// Actual value, abbreviated
    pub got: String,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "at {}: want {}, got {}", path, self.want, self.got)
    }
}

/// Empty-equivalent comparison of two values of the given shape.
///
/// A value of any other shape is never equal.
pub fn equal(want: &Value, got: &Value, shape: Shape) -> bool {
    want.shape() == Some(shape)
        && got.shape() == Some(shape)
        && diff(want, got, Strictness::EmptyEquivalent).is_none()
}

/// Compare two values and locate the first divergence.
pub fn diff(want: &Value, got: &Value, strictness: Strictness) -> Option<Divergence> {
    if let (Value::Raw(a), Value::Raw(b)) = (want, got) {
        return diff_raw(raw_text(a), raw_text(b));
    }

    let (want, got) = match (lower(want), lower(got)) {
        (Ok(want), Ok(got)) => (want, got),
        (Err(e), _) => return Some(root("a lowerable value", &format!("error: {e}"))),
        (_, Err(e)) => return Some(root("a lowerable value", &format!("error: {e}"))),
    };
    diff_trees(&want, &got, strictness)
}

/// Compare two trees directly.
pub fn diff_trees(want: &JsonValue, got: &JsonValue, strictness: Strictness) -> Option<Divergence> {
    let mut path = Vec::new();
    walk(want, got, strictness, &mut path)
}

/// Raw text keeps the last of repeated names, as serde_json does.
fn raw_options() -> ParseOptions {
    ParseOptions {
        duplicates: Duplicates::LastWins,
        ..ParseOptions::strict()
    }
}

fn raw_text(raw: &Option<Box<serde_json::value::RawValue>>) -> &str {
    raw.as_deref().map_or("null", |r| r.get())
}

/// Raw text is equal only if the canonical forms match byte for byte.
fn diff_raw(want: &str, got: &str) -> Option<Divergence> {
    let (a, b) = match (canonicalize_bytes(want.as_bytes()), canonicalize_bytes(got.as_bytes())) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) => return Some(root("canonicalizable text", &format!("error: {e}"))),
        (_, Err(e)) => return Some(root("canonicalizable text", &format!("error: {e}"))),
    };
    if a == b {
        return None;
    }
    // Re-parse only to locate the difference.
    let options = raw_options();
    match (parse_with(a.as_bytes(), options), parse_with(b.as_bytes(), options)) {
        (Ok(want), Ok(got)) => Some(
            diff_trees(&want, &got, Strictness::Exact)
                .unwrap_or_else(|| root(&abbreviate(&a), &abbreviate(&b))),
        ),
        _ => Some(root(&abbreviate(&a), &abbreviate(&b))),
    }
}

fn lower(value: &Value) -> Result<JsonValue, String> {
    let dynamic = match value {
        Value::Dynamic(v) => v.clone(),
        Value::Canada(v) => to_value(v)?,
        Value::Citm(v) => to_value(v)?,
        Value::Synthea(v) => to_value(v)?,
        Value::Twitter(v) => to_value(v)?,
        Value::Golang(v) => to_value(v)?,
        Value::Strings(v) => to_value(v)?,
        Value::Raw(v) => {
            return parse_with(raw_text(v).as_bytes(), raw_options()).map_err(|i| i.error.to_string())
        }
        Value::Text(v) => to_value(v)?,
        Value::Counts(v) => to_value(v)?,
        Value::Digits(v) => to_value(v)?,
        Value::Lists(v) => to_value(v)?,
        Value::Units(v) => to_value(v)?,
        Value::LooseText(_) | Value::Fragment(_) | Value::Names(_) => {
            return Err(format!("{} has no tree form", value.kind()))
        }
    };
    Ok(JsonValue::from(dynamic))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

fn root(want: &str, got: &str) -> Divergence {
    Divergence {
        path: String::new(),
        want: want.to_string(),
        got: got.to_string(),
    }
}

fn walk(
    want: &JsonValue,
    got: &JsonValue,
    strictness: Strictness,
    path: &mut Vec<String>,
) -> Option<Divergence> {
    if strictness == Strictness::EmptyEquivalent && both_empty(want, got) {
        return None;
    }

    match (want, got) {
        (JsonValue::Array(a), JsonValue::Array(b)) => {
            for (i, (x, y)) in a.iter().zip(b).enumerate() {
                path.push(i.to_string());
                let found = walk(x, y, strictness, path);
                path.pop();
                if found.is_some() {
                    return found;
                }
            }
            if a.len() != b.len() {
                return Some(here(
                    path,
                    format!("{} elements", a.len()),
                    format!("{} elements", b.len()),
                ));
            }
            None
        }
        (JsonValue::Object(a), JsonValue::Object(b)) => {
            let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
            for key in keys {
                let x = a.get(key);
                let y = b.get(key);
                path.push(escape_token(key));
                let found = match (x, y) {
                    (Some(x), Some(y)) => walk(x, y, strictness, path),
                    (Some(x), None) => absent(x, strictness, path, true),
                    (None, Some(y)) => absent(y, strictness, path, false),
                    (None, None) => None,
                };
                path.pop();
                if found.is_some() {
                    return found;
                }
            }
            None
        }
        _ if same_scalar(want, got) => None,
        _ => Some(here(path, abbreviate_value(want), abbreviate_value(got))),
    }
}

fn absent(
    present: &JsonValue,
    strictness: Strictness,
    path: &[String],
    want_side: bool,
) -> Option<Divergence> {
    if strictness == Strictness::EmptyEquivalent && present.is_empty() {
        return None;
    }
    let shown = abbreviate_value(present);
    let missing = "absent".to_string();
    Some(if want_side {
        here(path, shown, missing)
    } else {
        here(path, missing, shown)
    })
}

/// Empty values of the same kind, or null against an empty container.
fn both_empty(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Array(_), JsonValue::Object(_)) | (JsonValue::Object(_), JsonValue::Array(_)) => {
            false
        }
        _ => a.is_empty() && b.is_empty(),
    }
}

fn same_scalar(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Integer(x), JsonValue::Integer(y)) => x == y,
        (JsonValue::Float(x), JsonValue::Float(y)) => x == y,
        (JsonValue::Integer(i), JsonValue::Float(f)) | (JsonValue::Float(f), JsonValue::Integer(i)) => {
            float_is_integer(*f, *i)
        }
        _ => a == b,
    }
}

/// True if `f` holds exactly the integer `i`.
fn float_is_integer(f: f64, i: i64) -> bool {
    // 2^63 is exact as an f64; anything at or past it is out of i64 range.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) && f as i64 == i
}

fn here(path: &[String], want: String, got: String) -> Divergence {
    let path = path.iter().map(|t| format!("/{t}")).collect();
    Divergence { path, want, got }
}

/// RFC 6901 reference token escaping.
fn escape_token(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

fn abbreviate_value(value: &JsonValue) -> String {
    abbreviate(&crate::json::canonicalize(value))
}

fn abbreviate(text: &str) -> String {
    const MAX: usize = 64;
    match text.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serde_json::value::RawValue;

    fn dynamic(v: serde_json::Value) -> Value {
        Value::Dynamic(v)
    }

    fn raw(text: &str) -> Value {
        Value::Raw(Some(RawValue::from_string(text.to_string()).unwrap()))
    }

    #[test]
    fn test_identical_trees() {
        let a = dynamic(json!({"a": [1, 2], "b": "x"}));
        let b = dynamic(json!({"b": "x", "a": [1, 2]}));
        assert!(equal(&a, &b, Shape::Dynamic));
        assert_eq!(diff(&a, &b, Strictness::Exact), None);
    }

    #[test]
    fn test_empty_equivalence() {
        let a = dynamic(json!({"a": null, "b": [], "c": 1}));
        let b = dynamic(json!({"a": {}, "c": 1}));
        assert!(equal(&a, &b, Shape::Dynamic));

        let d = diff(&a, &b, Strictness::Exact).unwrap();
        assert_eq!(d.path, "/a");
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let a = dynamic(json!({"n": 1}));
        let b = dynamic(json!({"n": 1.0}));
        assert_eq!(diff(&a, &b, Strictness::Exact), None);
    }

    #[test]
    fn test_precision_loss_is_a_divergence() {
        let id: i64 = 505_874_924_095_815_681;
        let a = dynamic(json!({"id": id}));
        let b = dynamic(json!({"id": id as f64}));
        let d = diff(&a, &b, Strictness::Exact).unwrap();
        assert_eq!(d.path, "/id");
        assert_eq!(d.want, "505874924095815681");
        assert!(diff(&a, &b, Strictness::EmptyEquivalent).is_some());

        let exact = dynamic(json!({"id": 9_007_199_254_740_992.0}));
        let int = dynamic(json!({"id": 9_007_199_254_740_992_i64}));
        assert_eq!(diff(&int, &exact, Strictness::Exact), None);

        let big = dynamic(json!({"n": 9.3e18}));
        let max = dynamic(json!({"n": i64::MAX}));
        assert!(diff(&max, &big, Strictness::Exact).is_some());
    }

    #[test]
    fn test_empty_array_is_not_an_empty_object() {
        let list = dynamic(json!({"list": []}));
        let map = dynamic(json!({"list": {}}));
        let d = diff(&list, &map, Strictness::EmptyEquivalent).unwrap();
        assert_eq!(d.path, "/list");
        assert_eq!(d.to_string(), "at /list: want [], got {}");
        assert!(!equal(&list, &map, Shape::Dynamic));

        let null = dynamic(json!({"list": null}));
        assert_eq!(diff(&null, &list, Strictness::EmptyEquivalent), None);
        assert_eq!(diff(&map, &null, Strictness::EmptyEquivalent), None);
        assert!(diff(&null, &list, Strictness::Exact).is_some());
    }

    #[test]
    fn test_divergence_path() {
        let a = dynamic(json!({"list": [{"k": 1}, {"k": 2}], "a/b": 0}));
        let b = dynamic(json!({"list": [{"k": 1}, {"k": 3}], "a/b": 0}));
        let d = diff(&a, &b, Strictness::EmptyEquivalent).unwrap();
        assert_eq!(d.path, "/list/1/k");
        assert_eq!(d.want, "2");
        assert_eq!(d.got, "3");
        assert_eq!(d.to_string(), "at /list/1/k: want 2, got 3");

        let c = dynamic(json!({"list": [{"k": 1}, {"k": 2}], "a/b": 1}));
        assert_eq!(diff(&a, &c, Strictness::Exact).unwrap().path, "/a~1b");
    }

    #[test]
    fn test_length_mismatch() {
        let a = dynamic(json!([1, 2, 3]));
        let b = dynamic(json!([1, 2]));
        let d = diff(&a, &b, Strictness::Exact).unwrap();
        assert_eq!(d.path, "");
        assert_eq!(d.want, "3 elements");
    }

    #[test]
    fn test_raw_text_ignores_layout() {
        let a = raw(r#"{ "b" : 1.50, "a" : [ 1e2 ] }"#);
        let b = raw(r#"{"a":[100],"b":1.5}"#);
        assert!(equal(&a, &b, Shape::RawText));
    }

    #[test]
    fn test_raw_text_divergence() {
        let a = raw(r#"{"a":[1,2]}"#);
        let b = raw(r#"{"a":[1,3]}"#);
        let d = diff(&a, &b, Strictness::Exact).unwrap();
        assert_eq!(d.path, "/a/1");
    }

    #[test]
    fn test_concrete_against_dynamic() {
        use crate::registry::ListRecord;
        let a = Value::Lists(ListRecord {
            a: vec![1],
            ..ListRecord::default()
        });
        let b = dynamic(json!({"A": [1]}));
        assert!(diff(&a, &b, Strictness::EmptyEquivalent).is_none());
        assert!(diff(&a, &b, Strictness::Exact).is_some());
    }

    #[test]
    fn test_encode_only_values_never_equal() {
        let a = Value::Fragment("1".to_string());
        let b = dynamic(json!(1));
        assert!(!equal(&a, &b, Shape::Dynamic));
    }
}
