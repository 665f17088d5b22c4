//! Codecs built directly on `serde_json`.
//!
//! `SerdeJson` drives serde_json's serializer and deserializer against the
//! target type. `SerdeValue` detours through the `serde_json::Value`
//! document model in both directions, trading speed for a sorted,
//! materialized intermediate tree.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::RawValue;

use super::value::{Decoder, Encoder, Failure, Value};
use super::CodecDescriptor;
use crate::error::CodecResult;

pub(super) const SERDE_JSON: CodecDescriptor = CodecDescriptor {
    name: "SerdeJson",
    label: "serde_json",
    encode: Some(|value| {
        let mut enc = Direct { out: Vec::new() };
        value.encode_with(&mut enc)?;
        Ok(enc.out)
    }),
    decode: Some(|input, value| value.decode_with(&mut DirectSlice(input))),
    encode_to: Some(|value, out| value.encode_with(&mut Direct { out })),
    decode_from: Some(|input, value| value.decode_with(&mut DirectReader(input))),
};

pub(super) const SERDE_VALUE: CodecDescriptor = CodecDescriptor {
    name: "SerdeValue",
    label: "serde_json::Value",
    encode: Some(|value| {
        let mut enc = Tree { out: Vec::new() };
        value.encode_with(&mut enc)?;
        Ok(enc.out)
    }),
    decode: Some(|input, value| value.decode_with(&mut TreeSlice(input))),
    encode_to: Some(|value, out| value.encode_with(&mut Tree { out })),
    decode_from: Some(|input, value| value.decode_with(&mut TreeReader(input))),
};

// ============================================================================
// SerdeJson
// ============================================================================

struct Direct<W> {
    out: W,
}

impl<W: Write> Encoder for Direct<W> {
    fn encode<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        serde_json::to_writer(&mut self.out, value)?;
        Ok(())
    }

    fn text_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        let text = std::str::from_utf8(bytes)?;
        self.encode(text)
    }

    fn fragment(&mut self, text: &str) -> CodecResult<()> {
        let raw = RawValue::from_string(text.to_string())?;
        self.encode(&raw)
    }
}

struct DirectSlice<'a>(&'a [u8]);

impl Decoder for DirectSlice<'_> {
    fn decode<T: DeserializeOwned>(&mut self) -> Result<T, Failure<T>> {
        serde_json::from_slice(self.0).map_err(Failure::bare)
    }
}

struct DirectReader<R>(R);

impl<R: Read> Decoder for DirectReader<R> {
    fn decode<T: DeserializeOwned>(&mut self) -> Result<T, Failure<T>> {
        serde_json::from_reader(&mut self.0).map_err(Failure::bare)
    }
}

// ============================================================================
// SerdeValue
// ============================================================================

struct Tree<W> {
    out: W,
}

impl<W: Write> Encoder for Tree<W> {
    fn encode<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        let tree = serde_json::to_value(value)?;
        serde_json::to_writer(&mut self.out, &tree)?;
        Ok(())
    }

    fn text_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        let literal = serde_json::to_string(String::from_utf8_lossy(bytes).as_ref())?;
        // U+FFFD only occurs inside the literal, never within an escape.
        self.out.write_all(literal.replace('\u{FFFD}', "\\ufffd").as_bytes())?;
        Ok(())
    }

    fn fragment(&mut self, text: &str) -> CodecResult<()> {
        let tree: serde_json::Value = serde_json::from_str(text)?;
        self.encode(&tree)
    }
}

fn bind<T: DeserializeOwned>(
    tree: serde_json::Result<serde_json::Value>,
) -> Result<T, Failure<T>> {
    let tree = tree.map_err(Failure::bare)?;
    serde_json::from_value(tree).map_err(Failure::bare)
}

struct TreeSlice<'a>(&'a [u8]);

impl Decoder for TreeSlice<'_> {
    fn decode<T: DeserializeOwned>(&mut self) -> Result<T, Failure<T>> {
        bind(serde_json::from_slice(self.0))
    }
}

struct TreeReader<R>(R);

impl<R: Read> Decoder for TreeReader<R> {
    fn decode<T: DeserializeOwned>(&mut self) -> Result<T, Failure<T>> {
        bind(serde_json::from_reader(&mut self.0))
    }
}
