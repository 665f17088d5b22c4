//! Correctness checks over the registered codecs.
//!
//! - [`DifferentialRunner`]: every codec against the reference decode of the
//!   fixture corpus, one independent unit per fixture, shape, codec and slot
//! - [`run_probes`]: targeted behavior scenarios, checked against the
//!   recorded [`expectations`]
//! - [`SuiteRunner`]: accept/reject outcomes on a directory of small
//!   documents, pinned in a golden file

pub mod expectations;
mod harness;
pub mod probes;
mod repro;
mod runner;
pub mod suite;

pub use harness::{BatchResult, ErrorDetail, FailureDetail, UnitOutcome};
pub use probes::{
    run_probes, Direction, Observation, Probe, ProbeReport, ProbeResult, Verdict,
};
pub use repro::ReproBundle;
pub use runner::{DifferentialRunner, Unit};
pub use suite::{Bucket, Category, GoldenDiff, ResultSet, SuiteCase, SuiteOutcome, SuiteRunner};
