//! A codec built on `simd-json`.
//!
//! `SimdJson` parses with simd-json's tape-based parser and serializes with
//! its own writer, so it shares no parsing or formatting code with the
//! reference. Both parser entry points need a mutable copy of the input, and
//! the writer output is collected before it reaches the sink.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::RawValue;

use super::value::{Decoder, Encoder, Failure, Value};
use super::CodecDescriptor;
use crate::error::CodecResult;

pub(super) const SIMD_JSON: CodecDescriptor = CodecDescriptor {
    name: "SimdJson",
    label: "simd-json",
    encode: Some(|value| {
        let mut enc = Simd { out: Vec::new() };
        value.encode_with(&mut enc)?;
        Ok(enc.out)
    }),
    decode: Some(|input, value| value.decode_with(&mut Tape(input))),
    encode_to: Some(|value, out| value.encode_with(&mut Simd { out })),
    decode_from: Some(|input, value| {
        let mut buf = Vec::new();
        input.read_to_end(&mut buf)?;
        value.decode_with(&mut Tape(&buf))
    }),
};

// ============================================================================
// Encoding
// ============================================================================

struct Simd<W> {
    out: W,
}

impl<W: Write> Encoder for Simd<W> {
    fn encode<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        let bytes = simd_json::serde::to_vec(&value)?;
        self.out.write_all(&bytes)?;
        Ok(())
    }

    fn text_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        let text = std::str::from_utf8(bytes)?;
        self.encode(text)
    }

    fn fragment(&mut self, text: &str) -> CodecResult<()> {
        let mut scratch = text.as_bytes().to_vec();
        simd_json::to_borrowed_value(&mut scratch)?;
        self.out.write_all(text.as_bytes())?;
        Ok(())
    }

    fn raw(&mut self, raw: Option<&RawValue>) -> CodecResult<()> {
        self.out.write_all(raw.map_or("null", RawValue::get).as_bytes())?;
        Ok(())
    }
}

// ============================================================================
// Decoding
// ============================================================================

struct Tape<'a>(&'a [u8]);

impl Decoder for Tape<'_> {
    fn decode<T: DeserializeOwned>(&mut self) -> Result<T, Failure<T>> {
        let mut scratch = self.0.to_vec();
        simd_json::serde::from_slice(&mut scratch).map_err(Failure::bare)
    }

    /// Validates with simd-json and re-emits the parsed tree as text.
    fn decode_raw(&mut self) -> Result<Option<Box<RawValue>>, Failure<Option<Box<RawValue>>>> {
        let mut scratch = self.0.to_vec();
        let tree = simd_json::to_borrowed_value(&mut scratch).map_err(Failure::bare)?;
        serde_json::value::to_raw_value(&tree)
            .map(Some)
            .map_err(Failure::bare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use crate::registry::ListRecord;
    use std::collections::BTreeMap;

    fn encode(value: &Value) -> CodecResult<Vec<u8>> {
        (SIMD_JSON.encode.unwrap())(value)
    }

    fn decode(input: &[u8], value: &mut Value) -> CodecResult<()> {
        (SIMD_JSON.decode.unwrap())(input, value)
    }

    #[test]
    fn test_typed_round_trip() {
        let record = ListRecord {
            a: vec![1, -2],
            b: vec![],
            c: vec![i64::MAX],
        };
        let out = encode(&Value::Lists(record.clone())).unwrap();
        let tree: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(tree, serde_json::json!({"A": [1, -2], "B": [], "C": [i64::MAX]}));

        let mut value = Value::Lists(ListRecord::default());
        decode(&out, &mut value).unwrap();
        assert!(matches!(value, Value::Lists(ref r) if *r == record));
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let mut value = Value::Text(String::new());
        let err = decode(b"\"\xbe\xef\xff\"", &mut value).unwrap_err();
        assert!(matches!(err, CodecError::Simd(_)), "{err}");

        let loose = Value::LooseText(b"\xbe\xef\xff".to_vec());
        assert!(matches!(encode(&loose), Err(CodecError::InvalidText(_))));
    }

    #[test]
    fn test_truncated_input_leaves_target() {
        let mut value = Value::Lists(ListRecord {
            c: vec![7],
            ..ListRecord::default()
        });
        assert!(decode(br#"{"A":[1],"B":[2,invalid"#, &mut value).is_err());
        assert!(matches!(value, Value::Lists(ref r) if r.c == [7] && r.a.is_empty()));
    }

    #[test]
    fn test_fragments_are_validated() {
        let good = Value::Fragment(r#"{"a": [1]}"#.to_string());
        assert_eq!(encode(&good).unwrap(), br#"{"a": [1]}"#);

        let junk = Value::Fragment("<junk>".to_string());
        assert!(matches!(encode(&junk), Err(CodecError::Simd(_))));
    }

    #[test]
    fn test_raw_text() {
        let mut value = Value::Raw(None);
        decode(br#" {"b": [1, 2.5], "a": null} "#, &mut value).unwrap();
        let Value::Raw(Some(raw)) = &value else {
            panic!("unexpected {:?}", value);
        };
        let tree: serde_json::Value = serde_json::from_str(raw.get()).unwrap();
        assert_eq!(tree, serde_json::json!({"a": null, "b": [1, 2.5]}));

        assert_eq!(encode(&value).unwrap(), raw.get().as_bytes());
        assert_eq!(encode(&Value::Raw(None)).unwrap(), b"null");

        let mut value = Value::Raw(None);
        assert!(decode(b"[1,]", &mut value).is_err());
    }

    #[test]
    fn test_duplicate_names_keep_the_last() {
        let mut value = Value::Counts(BTreeMap::new());
        decode(br#"{"a":1,"a":2}"#, &mut value).unwrap();
        assert!(matches!(value, Value::Counts(ref m) if m["a"] == 2));
    }

    #[test]
    fn test_stream_slots() {
        let mut value = Value::Text(String::new());
        let mut input: &[u8] = br#""streamed""#;
        (SIMD_JSON.decode_from.unwrap())(&mut input, &mut value).unwrap();
        assert!(matches!(value, Value::Text(ref s) if s == "streamed"));

        let mut out = Vec::new();
        (SIMD_JSON.encode_to.unwrap())(&value, &mut out).unwrap();
        assert_eq!(out, br#""streamed""#);
    }
}
