//! Error types for the harness.
//!
//! Three layers, from the bottom up:
//!
//! - [`ErrorCode`]: syntax and limit violations raised by the in-crate JSON engine
//! - [`CodecError`]: anything a codec entry point can return
//! - [`HarnessError`]: setup failures that abort a run before any unit executes

use std::path::PathBuf;

use thiserror::Error;

use crate::corpus::Shape;
use crate::registry::Op;

/// Error codes raised by the in-crate JSON engine.
///
/// Codes are stable so tests and reports can refer to them numerically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ErrorCode {
    /// Malformed JSON at the given byte offset
    #[error("invalid JSON at byte {0}")]
    InvalidJson(u64),
    /// An object member name appeared twice
    #[error("duplicate object member name {0:?}")]
    DuplicateKey(String),
    /// A number that cannot be represented
    #[error("number out of range at byte {0}")]
    NumberOutOfRange(u64),
    /// Input bytes are not valid UTF-8
    #[error("invalid UTF-8")]
    InvalidUtf8,
    /// Input exceeds the configured size
    #[error("input too large: {0} bytes exceeds {1}")]
    InputTooLarge(u64, u64),
    /// Arrays and objects nested too deeply
    #[error("nesting too deep: {0} exceeds {1}")]
    NestingTooDeep(u64, u64),
    /// A string exceeds the configured length
    #[error("string too long: {0} bytes exceeds {1}")]
    StringTooLong(u64, u64),
    /// An object has too many members
    #[error("too many object members: {0} exceeds {1}")]
    TooManyFields(u64, u64),
    /// An array has too many elements
    #[error("array too long: {0} elements exceeds {1}")]
    ArrayTooLong(u64, u64),
}

impl ErrorCode {
    /// Get the numeric code.
    pub const fn code(&self) -> u32 {
        match self {
            Self::InvalidJson(_) => 100,
            Self::DuplicateKey(_) => 101,
            Self::NumberOutOfRange(_) => 109,
            Self::InvalidUtf8 => 105,
            Self::InputTooLarge(..) => 110,
            Self::NestingTooDeep(..) => 111,
            Self::StringTooLong(..) => 112,
            Self::TooManyFields(..) => 113,
            Self::ArrayTooLong(..) => 114,
        }
    }
}

/// Result type for the in-crate JSON engine.
pub type JsonResult<T> = Result<T, ErrorCode>;

/// Errors returned by codec entry points.
///
/// These are expected outcomes: probes classify codecs by whether and how
/// they fail.
#[derive(Debug, Error)]
pub enum CodecError {
    /// `serde_json` rejected the input or the value
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    /// `simd-json` rejected the input or the value
    #[error(transparent)]
    Simd(#[from] simd_json::Error),
    /// The in-crate engine rejected the input
    #[error("{0} (code {})", .0.code())]
    Syntax(#[from] ErrorCode),
    /// Reading from or writing to a stream failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Text bytes handed to an encoder are not UTF-8
    #[error("text is not valid UTF-8: {0}")]
    InvalidText(#[from] std::str::Utf8Error),
    /// The value variant cannot travel in this direction
    #[error("{0} cannot be used as a decode target")]
    NotDecodable(&'static str),
}

/// Result type for codec entry points.
pub type CodecResult<T> = Result<T, CodecError>;

/// Setup failures. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A fixture, suite document or golden file could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// A fixture is not a valid gzip stream
    #[error("corrupt gzip stream in {path}: {source}")]
    CorruptFixture {
        /// Fixture file
        path: PathBuf,
        /// Decompression error
        #[source]
        source: std::io::Error,
    },
    /// The golden file does not have the expected layout
    #[error("malformed golden file {path}: {source}")]
    MalformedGolden {
        /// Golden file
        path: PathBuf,
        /// Parse error
        #[source]
        source: serde_json::Error,
    },
    /// The reference codec could not decode a fixture
    #[error("reference decode of {fixture}/{shape} failed: {source}")]
    Reference {
        /// Fixture name
        fixture: String,
        /// Decode target shape
        shape: Shape,
        /// Codec error
        #[source]
        source: CodecError,
    },
    /// A codec lacks a slot the harness needs
    #[error("codec {codec} has no {op} capability")]
    MissingCapability {
        /// Codec name
        codec: &'static str,
        /// Missing slot
        op: Op,
    },
    /// A name passed on the command line does not exist
    #[error("unknown {kind} {name:?}")]
    Unknown {
        /// What was looked up
        kind: &'static str,
        /// Name given
        name: String,
    },
}

impl HarnessError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for harness setup.
pub type HarnessResult<T> = Result<T, HarnessError>;
