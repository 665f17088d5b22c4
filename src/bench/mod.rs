//! Benchmarking.
//!
//! [`BenchDriver`] times every codec slot on every fixture and shape and
//! prints Go-style benchmark lines. [`Aggregator`] reads those lines back
//! and tabulates each codec relative to the first one.

pub mod aggregate;
pub mod driver;

pub use aggregate::{parse_line, Aggregator, BenchLine, Metric, MetricKind};
pub use driver::{predict_n, BenchDriver, BenchResult};
