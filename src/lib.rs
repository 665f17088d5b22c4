//! jsonbench - differential testing and benchmarking for JSON codecs.
//!
//! Several interchangeable codecs are registered side by side. The harness
//! checks them against a reference codec on a fixture corpus, classifies
//! their edge-case behavior with targeted probes, pins their accept/reject
//! behavior on a conformance suite, and measures their speed and allocations.
//!
//! # Architecture
//!
//! - [`registry`] - the value model and the registered codecs
//! - [`json`] - the in-crate JSON engine behind three of the codecs
//! - [`corpus`] - gzip fixture loading and typed schemas
//! - [`equivalence`] - semantic comparison with divergence paths
//! - [`conformance`] - differential runner, probes and conformance suite
//! - [`bench`] - benchmark driver and results aggregator
//! - [`alloc`] - per-thread allocation accounting
//! - [`config`] - paths and modes
//! - [`error`] - error types

// Harness code reports failures instead of aborting on them.
// Tests are checked separately with `cargo test`.
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod alloc;
pub mod bench;
pub mod config;
pub mod conformance;
pub mod corpus;
pub mod equivalence;
pub mod error;
pub mod json;
pub mod registry;

// Re-export commonly used types
pub use config::{BenchConfig, GoldenMode, HarnessConfig};
pub use conformance::{BatchResult, DifferentialRunner, ProbeReport, SuiteRunner};
pub use corpus::{Corpus, Fixture, Shape};
pub use equivalence::{diff, equal, Divergence, Strictness};
pub use error::{CodecError, ErrorCode, HarnessError, HarnessResult};
pub use registry::{CodecDescriptor, Op, Value};
