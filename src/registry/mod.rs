//! Codec registry.
//!
//! Each codec is a [`CodecDescriptor`]: a name plus up to four capability
//! slots. A codec that cannot do something leaves the slot empty, and the
//! runners report the combination as skipped. The set is fixed at compile
//! time; the first entry is the reference implementation.

mod engine_codecs;
mod serde_codecs;
mod simd_codecs;
pub mod value;

use std::fmt;
use std::io::{Read, Write};

pub use value::{CollidingKey, Decoder, Encoder, Failure, ListRecord, Unit, Value};

use crate::error::{CodecResult, HarnessError, HarnessResult};

/// Encode a value into a fresh buffer.
pub type EncodeFn = fn(&Value) -> CodecResult<Vec<u8>>;
/// Decode a buffer into an existing value.
pub type DecodeFn = fn(&[u8], &mut Value) -> CodecResult<()>;
/// Encode a value into a writer.
pub type EncodeToFn = fn(&Value, &mut dyn Write) -> CodecResult<()>;
/// Decode from a reader into an existing value.
pub type DecodeFromFn = fn(&mut dyn Read, &mut Value) -> CodecResult<()>;

/// One of the four capability slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Op {
    /// Buffer encode
    Encode,
    /// Stream encode
    EncodeTo,
    /// Buffer decode
    Decode,
    /// Stream decode
    DecodeFrom,
}

impl Op {
    /// Every slot, in unit order.
    pub const ALL: [Op; 4] = [Op::Encode, Op::EncodeTo, Op::Decode, Op::DecodeFrom];

    /// Name used in unit names.
    pub const fn name(self) -> &'static str {
        match self {
            Op::Encode => "Encode",
            Op::EncodeTo => "EncodeTo",
            Op::Decode => "Decode",
            Op::DecodeFrom => "DecodeFrom",
        }
    }

    /// True for the two encode slots.
    pub const fn is_encode(self) -> bool {
        matches!(self, Op::Encode | Op::EncodeTo)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A registered codec.
#[derive(Clone, Copy)]
pub struct CodecDescriptor {
    /// Unique name
    pub name: &'static str,
    /// What the codec is built on
    pub label: &'static str,
    /// Buffer encode
    pub encode: Option<EncodeFn>,
    /// Buffer decode
    pub decode: Option<DecodeFn>,
    /// Stream encode
    pub encode_to: Option<EncodeToFn>,
    /// Stream decode
    pub decode_from: Option<DecodeFromFn>,
}

impl CodecDescriptor {
    /// True if the slot for `op` is filled.
    pub fn supports(&self, op: Op) -> bool {
        match op {
            Op::Encode => self.encode.is_some(),
            Op::EncodeTo => self.encode_to.is_some(),
            Op::Decode => self.decode.is_some(),
            Op::DecodeFrom => self.decode_from.is_some(),
        }
    }

    /// Filled slots.
    pub fn ops(&self) -> Vec<Op> {
        Op::ALL.into_iter().filter(|&op| self.supports(op)).collect()
    }
}

impl fmt::Debug for CodecDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecDescriptor")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("ops", &self.ops())
            .finish()
    }
}

static REGISTRY: [CodecDescriptor; 6] = [
    serde_codecs::SERDE_JSON,
    serde_codecs::SERDE_VALUE,
    simd_codecs::SIMD_JSON,
    engine_codecs::IJSON,
    engine_codecs::LENIENT,
    engine_codecs::SALVAGE,
];

/// Every registered codec, reference first.
pub fn codecs() -> &'static [CodecDescriptor] {
    &REGISTRY
}

/// The reference implementation.
pub fn reference() -> &'static CodecDescriptor {
    &REGISTRY[0]
}

/// Look a codec up by name.
pub fn lookup(name: &str) -> HarnessResult<&'static CodecDescriptor> {
    REGISTRY
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| HarnessError::Unknown {
            kind: "codec",
            name: name.to_string(),
        })
}
