//! Codecs built on the in-crate JSON engine.
//!
//! All three run documents through a [`JsonValue`] tree and bind the tree to
//! the target type with serde. They differ only in [`Profile`]: parser
//! policies and how encoding treats text bytes, fragments and output layout.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::value::{Decoder, Encoder, Failure, Value};
use super::CodecDescriptor;
use crate::error::{CodecError, CodecResult};
use crate::json::jcs::{canonicalize, serialize_string};
use crate::json::writer::{self, write_value};
use crate::json::{parse_with, Duplicates, JsonValue, Limits, ParseOptions, Salvage, Utf8Mode};

/// Handling of string contents that are not UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextBytes {
    /// Fail
    Reject,
    /// Substitute U+FFFD, written as `\ufffd`
    Replace,
    /// Write the bytes unchanged
    Verbatim,
}

/// Handling of pre-serialized fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fragments {
    /// Parse with the profile's options and re-emit
    Validate,
    /// Write unchanged
    Trust,
}

/// Output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// RFC 8785 canonical text
    Canonical,
    /// Compact, members in map order
    Compact,
}

#[derive(Debug, Clone, Copy)]
struct Profile {
    parse: ParseOptions,
    text: TextBytes,
    fragments: Fragments,
    layout: Layout,
}

const IJSON_PROFILE: Profile = Profile {
    parse: ParseOptions::strict(),
    text: TextBytes::Reject,
    fragments: Fragments::Validate,
    layout: Layout::Canonical,
};

const LENIENT_PROFILE: Profile = Profile {
    parse: ParseOptions {
        limits: Limits::standard(),
        utf8: Utf8Mode::Replace,
        duplicates: Duplicates::LastWins,
        salvage: Salvage::Prefix,
    },
    text: TextBytes::Verbatim,
    fragments: Fragments::Trust,
    layout: Layout::Compact,
};

const SALVAGE_PROFILE: Profile = Profile {
    parse: ParseOptions {
        limits: Limits::standard(),
        utf8: Utf8Mode::Reject,
        duplicates: Duplicates::FirstWins,
        salvage: Salvage::Completed,
    },
    text: TextBytes::Replace,
    fragments: Fragments::Validate,
    layout: Layout::Compact,
};

pub(super) const IJSON: CodecDescriptor = CodecDescriptor {
    name: "IJson",
    label: "jsonbench::json (I-JSON, JCS output)",
    encode: Some(|value| encode(&IJSON_PROFILE, value)),
    decode: Some(|input, value| value.decode_with(&mut Engine::new(&IJSON_PROFILE, input))),
    encode_to: Some(|value, out| {
        value.encode_with(&mut EngineEncoder {
            profile: &IJSON_PROFILE,
            out,
        })
    }),
    decode_from: Some(|input, value| decode_from(&IJSON_PROFILE, input, value)),
};

pub(super) const LENIENT: CodecDescriptor = CodecDescriptor {
    name: "Lenient",
    label: "jsonbench::json (lossy, last-wins, keeps prefixes)",
    encode: Some(|value| encode(&LENIENT_PROFILE, value)),
    decode: Some(|input, value| value.decode_with(&mut Engine::new(&LENIENT_PROFILE, input))),
    encode_to: None,
    decode_from: None,
};

pub(super) const SALVAGE: CodecDescriptor = CodecDescriptor {
    name: "Salvage",
    label: "jsonbench::json (first-wins, keeps completed members)",
    encode: Some(|value| encode(&SALVAGE_PROFILE, value)),
    decode: Some(|input, value| value.decode_with(&mut Engine::new(&SALVAGE_PROFILE, input))),
    encode_to: None,
    decode_from: Some(|input, value| decode_from(&SALVAGE_PROFILE, input, value)),
};

fn encode(profile: &Profile, value: &Value) -> CodecResult<Vec<u8>> {
    let mut enc = EngineEncoder {
        profile,
        out: Vec::new(),
    };
    value.encode_with(&mut enc)?;
    Ok(enc.out)
}

/// The engine has no incremental parser: stream decode buffers the input.
fn decode_from(profile: &Profile, input: &mut dyn Read, value: &mut Value) -> CodecResult<()> {
    let mut buf = Vec::new();
    input.read_to_end(&mut buf)?;
    value.decode_with(&mut Engine::new(profile, &buf))
}

// ============================================================================
// Encoding
// ============================================================================

struct EngineEncoder<'p, W> {
    profile: &'p Profile,
    out: W,
}

impl<W: Write> EngineEncoder<'_, W> {
    fn emit(&mut self, tree: &JsonValue) -> CodecResult<()> {
        match self.profile.layout {
            Layout::Canonical => self.out.write_all(canonicalize(tree).as_bytes())?,
            Layout::Compact => write_value(tree, &mut self.out)?,
        }
        Ok(())
    }
}

impl<W: Write> Encoder for EngineEncoder<'_, W> {
    fn encode<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        let tree = match self.profile.layout {
            // Re-parse serde's output so that repeated names are caught.
            Layout::Canonical => {
                let bytes = serde_json::to_vec(value)?;
                parse_with(&bytes, self.profile.parse).map_err(|i| i.error)?
            }
            Layout::Compact => JsonValue::from(serde_json::to_value(value)?),
        };
        self.emit(&tree)
    }

    fn text_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        match self.profile.text {
            TextBytes::Reject => self.encode(std::str::from_utf8(bytes)?),
            TextBytes::Replace => {
                let mut literal = String::new();
                serialize_string(&String::from_utf8_lossy(bytes), &mut literal);
                self.out.write_all(literal.replace('\u{FFFD}', "\\ufffd").as_bytes())?;
                Ok(())
            }
            TextBytes::Verbatim => {
                self.out.write_all(b"\"")?;
                for chunk in bytes.utf8_chunks() {
                    let mut escaped = String::new();
                    serialize_string(chunk.valid(), &mut escaped);
                    let inner = escaped
                        .strip_prefix('"')
                        .and_then(|s| s.strip_suffix('"'))
                        .unwrap_or_default();
                    self.out.write_all(inner.as_bytes())?;
                    self.out.write_all(chunk.invalid())?;
                }
                self.out.write_all(b"\"")?;
                Ok(())
            }
        }
    }

    fn fragment(&mut self, text: &str) -> CodecResult<()> {
        match self.profile.fragments {
            Fragments::Trust => {
                self.out.write_all(text.as_bytes())?;
                Ok(())
            }
            Fragments::Validate => {
                let tree = parse_with(text.as_bytes(), self.profile.parse).map_err(|i| i.error)?;
                self.emit(&tree)
            }
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

struct Engine<'a> {
    profile: &'a Profile,
    input: &'a [u8],
}

impl<'a> Engine<'a> {
    fn new(profile: &'a Profile, input: &'a [u8]) -> Self {
        Self { profile, input }
    }
}

/// Bind a parsed tree to `T` by way of its compact serialization.
fn bind<T: DeserializeOwned>(tree: &JsonValue) -> serde_json::Result<T> {
    serde_json::from_slice(&writer::to_vec(tree))
}

impl Decoder for Engine<'_> {
    fn decode<T: DeserializeOwned>(&mut self) -> Result<T, Failure<T>> {
        match parse_with(self.input, self.profile.parse) {
            Ok(tree) => bind(&tree).map_err(Failure::bare),
            Err(interrupted) => Err(Failure {
                error: CodecError::Syntax(interrupted.error),
                partial: interrupted.partial.and_then(|tree| bind(&tree).ok()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ListRecord;
    use std::collections::BTreeMap;

    const TRUNCATED: &[u8] = br#"{"A":[1],"B":[2,invalid"#;

    fn partial(codec: &CodecDescriptor) -> ListRecord {
        let mut value = Value::Lists(ListRecord::default());
        assert!((codec.decode.unwrap())(TRUNCATED, &mut value).is_err());
        match value {
            Value::Lists(record) => record,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_partial_decodes() {
        assert!(partial(&IJSON).is_empty());
        assert_eq!(
            partial(&LENIENT),
            ListRecord {
                a: vec![1],
                b: vec![2],
                c: vec![],
            }
        );
        assert_eq!(
            partial(&SALVAGE),
            ListRecord {
                a: vec![1],
                ..ListRecord::default()
            }
        );
    }

    #[test]
    fn test_ijson_output_is_canonical() {
        let value = Value::Dynamic(serde_json::json!({"b": 1.0, "a": [true, null]}));
        let out = (IJSON.encode.unwrap())(&value).unwrap();
        assert_eq!(out, br#"{"a":[true,null],"b":1}"#);
    }

    #[test]
    fn test_ijson_rejects_duplicate_names() {
        let mut value = Value::Counts(BTreeMap::new());
        let err = (IJSON.decode.unwrap())(br#"{"a":1,"a":2}"#, &mut value).unwrap_err();
        assert!(matches!(err, CodecError::Syntax(ref e) if e.code() == 101));
    }

    #[test]
    fn test_duplicate_policies() {
        let input = br#"{"a":1,"a":2}"#;

        let mut value = Value::Counts(BTreeMap::new());
        (LENIENT.decode.unwrap())(input, &mut value).unwrap();
        assert!(matches!(value, Value::Counts(ref m) if m["a"] == 2));

        let mut value = Value::Counts(BTreeMap::new());
        (SALVAGE.decode.unwrap())(input, &mut value).unwrap();
        assert!(matches!(value, Value::Counts(ref m) if m["a"] == 1));
    }

    #[test]
    fn test_verbatim_text_bytes() {
        let value = Value::LooseText(b"a\"\xbe\xef\xff".to_vec());
        let out = (LENIENT.encode.unwrap())(&value).unwrap();
        assert_eq!(out, b"\"a\\\"\xbe\xef\xff\"");
    }

    #[test]
    fn test_replaced_text_is_escaped() {
        let value = Value::LooseText(b"\xbe\xef\xff".to_vec());
        let out = (SALVAGE.encode.unwrap())(&value).unwrap();
        assert_eq!(out, br#""\ufffd\ufffd\ufffd""#);
    }

    #[test]
    fn test_fragment_policies() {
        let junk = Value::Fragment("<junk>".to_string());
        assert_eq!((LENIENT.encode.unwrap())(&junk).unwrap(), b"<junk>");
        assert!((SALVAGE.encode.unwrap())(&junk).is_err());
        assert!((IJSON.encode.unwrap())(&junk).is_err());
    }

    #[test]
    fn test_stream_decode_buffers() {
        let mut value = Value::Text(String::new());
        let mut input: &[u8] = br#""x""#;
        (SALVAGE.decode_from.unwrap())(&mut input, &mut value).unwrap();
        assert!(matches!(value, Value::Text(ref s) if s == "x"));
    }
}
