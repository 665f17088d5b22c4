//! In-crate JSON engine.
//!
//! A tokenizer, a policy-driven recursive descent parser, a compact writer
//! and a JCS (RFC 8785) canonicalizer. The engine backs three registered
//! codecs and the raw-text comparison in the equivalence checker.
//!
//! # Architecture
//!
//! - [`types`] - Core JSON value types
//! - [`limits`] - Resource limits
//! - [`lexer`] - Tokenizer with UTF-8/escape handling
//! - [`parser`] - Recursive descent parser with UTF-8, duplicate-name and
//!   salvage policies
//! - [`writer`] - Compact serialization
//! - [`jcs`] - RFC 8785 canonicalization
//!
//! # Example
//!
//! ```
//! use jsonbench::json::{parse, canonicalize};
//!
//! let value = parse(b"{\"b\":2.0,\"a\":1}").unwrap();
//! assert_eq!(canonicalize(&value), "{\"a\":1,\"b\":2}");
//! ```

pub mod jcs;
pub mod lexer;
pub mod limits;
pub mod parser;
pub mod types;
pub mod writer;

pub use jcs::{canonicalize, canonicalize_bytes};
pub use limits::Limits;
pub use parser::{parse, parse_with, Duplicates, Interrupted, ParseOptions, Salvage, Utf8Mode};
pub use types::JsonValue;
