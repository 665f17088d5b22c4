//! The value model shared by every codec.
//!
//! [`Value`] is the closed set of things a codec can be asked to encode or
//! decode into. Codecs never match on it: they implement [`Encoder`] and
//! [`Decoder`] once, generically over serde types, and [`Value`] dispatches
//! to the right concrete type.

use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::corpus::fixtures::{
    CanadaRoot, CitmRoot, GolangRoot, StringRoot, SyntheaRoot, TwitterRoot,
};
use crate::corpus::Shape;
use crate::error::{CodecError, CodecResult};

/// A map key that always serializes as the member name `duplicate`.
///
/// Two distinct keys produce two members with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CollidingKey(pub u8);

impl Serialize for CollidingKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("duplicate")
    }
}

/// A record with three integer lists, used to observe partial decodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListRecord {
    /// First list
    #[serde(rename = "A")]
    pub a: Vec<i64>,
    /// Second list
    #[serde(rename = "B")]
    pub b: Vec<i64>,
    /// Third list
    #[serde(rename = "C")]
    pub c: Vec<i64>,
}

impl ListRecord {
    /// True if no list has elements.
    pub fn is_empty(&self) -> bool {
        self.a.is_empty() && self.b.is_empty() && self.c.is_empty()
    }
}

/// An empty record. Lists of these cost no heap memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {}

/// Anything a codec can encode or decode into.
#[derive(Debug)]
pub enum Value {
    /// `canada_geometry` typed schema
    Canada(Box<CanadaRoot>),
    /// `citm_catalog` typed schema
    Citm(Box<CitmRoot>),
    /// `synthea_fhir` typed schema
    Synthea(Box<SyntheaRoot>),
    /// `twitter_status` typed schema
    Twitter(Box<TwitterRoot>),
    /// `golang_source` typed schema
    Golang(Box<GolangRoot>),
    /// `string_unicode` typed schema
    Strings(Box<StringRoot>),
    /// Untyped document tree
    Dynamic(serde_json::Value),
    /// Verbatim document text; `None` until decoded into
    Raw(Option<Box<RawValue>>),
    /// A single string
    Text(String),
    /// String contents that may not be UTF-8. Encode only.
    LooseText(Vec<u8>),
    /// Pre-serialized JSON to embed as is. Encode only.
    Fragment(String),
    /// A map whose keys all serialize to the same name. Encode only.
    Names(BTreeMap<CollidingKey, i64>),
    /// Name to integer map
    Counts(BTreeMap<String, i64>),
    /// Hash map with per-instance random iteration order
    Digits(HashMap<u8, u8>),
    /// Three-list record
    Lists(ListRecord),
    /// List of empty records
    Units(Vec<Unit>),
}

impl Value {
    /// Shape of a corpus value, `None` for probe payloads.
    pub fn shape(&self) -> Option<Shape> {
        match self {
            Value::Canada(_)
            | Value::Citm(_)
            | Value::Synthea(_)
            | Value::Twitter(_)
            | Value::Golang(_)
            | Value::Strings(_) => Some(Shape::Concrete),
            Value::Dynamic(_) => Some(Shape::Dynamic),
            Value::Raw(_) => Some(Shape::RawText),
            _ => None,
        }
    }

    /// Variant name for messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Canada(_) => "Canada",
            Value::Citm(_) => "Citm",
            Value::Synthea(_) => "Synthea",
            Value::Twitter(_) => "Twitter",
            Value::Golang(_) => "Golang",
            Value::Strings(_) => "Strings",
            Value::Dynamic(_) => "Dynamic",
            Value::Raw(_) => "Raw",
            Value::Text(_) => "Text",
            Value::LooseText(_) => "LooseText",
            Value::Fragment(_) => "Fragment",
            Value::Names(_) => "Names",
            Value::Counts(_) => "Counts",
            Value::Digits(_) => "Digits",
            Value::Lists(_) => "Lists",
            Value::Units(_) => "Units",
        }
    }

    /// Hand this value to `enc`.
    pub fn encode_with<E: Encoder>(&self, enc: &mut E) -> CodecResult<()> {
        match self {
            Value::Canada(v) => enc.encode(v.as_ref()),
            Value::Citm(v) => enc.encode(v.as_ref()),
            Value::Synthea(v) => enc.encode(v.as_ref()),
            Value::Twitter(v) => enc.encode(v.as_ref()),
            Value::Golang(v) => enc.encode(v.as_ref()),
            Value::Strings(v) => enc.encode(v.as_ref()),
            Value::Dynamic(v) => enc.encode(v),
            Value::Raw(v) => enc.raw(v.as_deref()),
            Value::Text(v) => enc.encode(v),
            Value::LooseText(bytes) => enc.text_bytes(bytes),
            Value::Fragment(text) => enc.fragment(text),
            Value::Names(v) => enc.encode(v),
            Value::Counts(v) => enc.encode(v),
            Value::Digits(v) => enc.encode(v),
            Value::Lists(v) => enc.encode(v),
            Value::Units(v) => enc.encode(v),
        }
    }

    /// Decode into this value with `dec`.
    ///
    /// On failure the value keeps whatever partial result the decoder
    /// handed back, or stays untouched if there was none.
    pub fn decode_with<D: Decoder>(&mut self, dec: &mut D) -> CodecResult<()> {
        match self {
            Value::Canada(slot) => fill(slot.as_mut(), dec),
            Value::Citm(slot) => fill(slot.as_mut(), dec),
            Value::Synthea(slot) => fill(slot.as_mut(), dec),
            Value::Twitter(slot) => fill(slot.as_mut(), dec),
            Value::Golang(slot) => fill(slot.as_mut(), dec),
            Value::Strings(slot) => fill(slot.as_mut(), dec),
            Value::Dynamic(slot) => fill(slot, dec),
            Value::Raw(slot) => keep(slot, dec.decode_raw()),
            Value::Text(slot) => fill(slot, dec),
            Value::Counts(slot) => fill(slot, dec),
            Value::Digits(slot) => fill(slot, dec),
            Value::Lists(slot) => fill(slot, dec),
            Value::Units(slot) => fill(slot, dec),
            Value::LooseText(_) | Value::Fragment(_) | Value::Names(_) => {
                Err(CodecError::NotDecodable(self.kind()))
            }
        }
    }
}

fn fill<T: DeserializeOwned, D: Decoder>(slot: &mut T, dec: &mut D) -> CodecResult<()> {
    keep(slot, dec.decode::<T>())
}

/// Store a decode result, or whatever partial result came with the failure.
fn keep<T>(slot: &mut T, result: Result<T, Failure<T>>) -> CodecResult<()> {
    match result {
        Ok(value) => {
            *slot = value;
            Ok(())
        }
        Err(Failure { error, partial }) => {
            if let Some(partial) = partial {
                *slot = partial;
            }
            Err(error)
        }
    }
}

/// A failed decode, possibly with a partially populated result.
#[derive(Debug)]
pub struct Failure<T> {
    /// Why decoding failed
    pub error: CodecError,
    /// What the codec managed to bind before failing
    pub partial: Option<T>,
}

impl<T> Failure<T> {
    /// A failure that leaves the target untouched.
    pub fn bare(error: impl Into<CodecError>) -> Self {
        Self {
            error: error.into(),
            partial: None,
        }
    }
}

/// The encoding half of a codec.
pub trait Encoder {
    /// Serialize a value.
    fn encode<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()>;

    /// Write a string whose contents may not be valid UTF-8.
    fn text_bytes(&mut self, bytes: &[u8]) -> CodecResult<()>;

    /// Embed pre-serialized JSON.
    fn fragment(&mut self, text: &str) -> CodecResult<()>;

    /// Write verbatim document text, `null` when absent.
    fn raw(&mut self, raw: Option<&RawValue>) -> CodecResult<()> {
        self.encode(&raw)
    }
}

/// The decoding half of a codec.
pub trait Decoder {
    /// Deserialize one value from the input.
    fn decode<T: DeserializeOwned>(&mut self) -> Result<T, Failure<T>>;

    /// Capture the input as verbatim document text.
    ///
    /// Only `serde_json` deserializers can produce a [`RawValue`] through
    /// serde, so other engines override this.
    fn decode_raw(&mut self) -> Result<Option<Box<RawValue>>, Failure<Option<Box<RawValue>>>> {
        self.decode()
    }
}
