//! Benchmark results aggregator.
//!
//! Reads benchmark lines of the form
//!
//! ```text
//! Benchmark/<Fixture>/<Shape>/<Codec>/<Op>-<procs>\t<N>\t<x> ns/op\t<y> B/op\t<z> allocs/op
//! ```
//!
//! and prints one table per metric, operation and shape: a row per fixture,
//! a column per codec, each cell the codec's mean relative to the first
//! codec's mean. Lines that do not fit the format are ignored.

use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::io::{self, BufRead};

/// Name prefix of benchmark lines.
pub const PREFIX: &str = "Benchmark/";

/// A measured quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// ns/op
    Runtimes,
    /// B/op
    AllocBytes,
    /// allocs/op
    NumAllocs,
}

impl MetricKind {
    /// Every metric, in table order.
    pub const ALL: [MetricKind; 3] = [
        MetricKind::Runtimes,
        MetricKind::AllocBytes,
        MetricKind::NumAllocs,
    ];

    /// Table name.
    pub const fn name(self) -> &'static str {
        match self {
            MetricKind::Runtimes => "Runtimes",
            MetricKind::AllocBytes => "AllocBytes",
            MetricKind::NumAllocs => "NumAllocs",
        }
    }

    /// Unit suffix in benchmark lines.
    pub const fn unit(self) -> &'static str {
        match self {
            MetricKind::Runtimes => "ns/op",
            MetricKind::AllocBytes => "B/op",
            MetricKind::NumAllocs => "allocs/op",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Samples of one metric, in the order they were read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metric(pub Vec<i64>);

impl Metric {
    /// Arithmetic mean, NaN without samples.
    pub fn mean(&self) -> f64 {
        if self.0.is_empty() {
            return f64::NAN;
        }
        self.0.iter().map(|&v| v as f64).sum::<f64>() / self.0.len() as f64
    }

    /// Median, NaN without samples.
    pub fn median(&self) -> f64 {
        let mut sorted = self.0.clone();
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        match (sorted.len() % 2, sorted.get(mid)) {
            (_, None) => f64::NAN,
            (1, Some(&v)) => v as f64,
            (_, Some(&hi)) => {
                let lo = sorted.get(mid.wrapping_sub(1)).copied().unwrap_or(hi);
                (lo as f64 + hi as f64) / 2.0
            }
        }
    }
}

/// One parsed benchmark line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchLine {
    /// Fixture
    pub test: String,
    /// Shape
    pub shape: String,
    /// Codec
    pub codec: String,
    /// Operation
    pub op: String,
    /// Values that parsed, by metric
    pub values: Vec<(MetricKind, i64)>,
}

/// Parse one benchmark line. `None` if it is not one.
pub fn parse_line(line: &str) -> Option<BenchLine> {
    let fields: Vec<&str> = line.split('\t').collect();
    let [name, _iterations, runtime, bytes, allocs] = fields.as_slice() else {
        return None;
    };
    let name = name.trim().strip_prefix(PREFIX)?;
    let name = match name.rsplit_once('-') {
        Some((base, procs)) if !procs.is_empty() && procs.bytes().all(|b| b.is_ascii_digit()) => {
            base
        }
        _ => name,
    };
    let parts: Vec<&str> = name.split('/').collect();
    let [test, shape, codec, op] = parts.as_slice() else {
        return None;
    };

    let values = MetricKind::ALL
        .into_iter()
        .zip([runtime, bytes, allocs])
        .filter_map(|(kind, field)| {
            let number = field.trim().strip_suffix(kind.unit())?.trim();
            number.parse::<i64>().ok().map(|v| (kind, v))
        })
        .collect();

    Some(BenchLine {
        test: test.to_string(),
        shape: shape.to_string(),
        codec: codec.to_string(),
        op: op.to_string(),
        values,
    })
}

type Key = (MetricKind, String, String, String, String);

/// Accumulates benchmark lines and renders the comparison tables.
#[derive(Debug, Default)]
pub struct Aggregator {
    tests: Vec<String>,
    shapes: Vec<String>,
    codecs: Vec<String>,
    ops: Vec<String>,
    samples: HashMap<Key, Metric>,
}

fn remember(axis: &mut Vec<String>, name: &str) {
    if !axis.iter().any(|n| n == name) {
        axis.push(name.to_string());
    }
}

impl Aggregator {
    /// An empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one line. Returns false if it was ignored.
    pub fn add_line(&mut self, line: &str) -> bool {
        let Some(parsed) = parse_line(line) else {
            return false;
        };
        remember(&mut self.tests, &parsed.test);
        remember(&mut self.shapes, &parsed.shape);
        remember(&mut self.codecs, &parsed.codec);
        remember(&mut self.ops, &parsed.op);
        for (kind, value) in parsed.values {
            let key = (
                kind,
                parsed.test.clone(),
                parsed.shape.clone(),
                parsed.codec.clone(),
                parsed.op.clone(),
            );
            self.samples.entry(key).or_default().0.push(value);
        }
        true
    }

    /// Add every line from `reader`.
    pub fn read<R: BufRead>(&mut self, reader: R) -> io::Result<usize> {
        let mut accepted = 0;
        for line in reader.lines() {
            if self.add_line(&line?) {
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    /// Codecs in first-seen order. The first one is the baseline.
    pub fn codecs(&self) -> &[String] {
        &self.codecs
    }

    /// Samples for one cell.
    pub fn metric(&self, kind: MetricKind, test: &str, shape: &str, codec: &str, op: &str) -> Option<&Metric> {
        self.samples.get(&(
            kind,
            test.to_string(),
            shape.to_string(),
            codec.to_string(),
            op.to_string(),
        ))
    }

    fn mean(&self, kind: MetricKind, test: &str, shape: &str, codec: &str, op: &str) -> f64 {
        self.metric(kind, test, shape, codec, op)
            .map_or(f64::NAN, Metric::mean)
    }

    /// Render every table.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let Some(baseline) = self.codecs.first() else {
            return out;
        };
        for kind in MetricKind::ALL {
            for op in &self.ops {
                for shape in &self.shapes {
                    let _ = write!(out, "{kind}/{op}/{shape}");
                    for codec in &self.codecs {
                        let _ = write!(out, "\t{codec}");
                    }
                    out.push('\n');

                    for test in &self.tests {
                        out.push_str(test);
                        let base = self.mean(kind, test, shape, baseline, op);
                        for (i, codec) in self.codecs.iter().enumerate() {
                            // The baseline column is 1 even when its mean is 0 or missing.
                            let ratio = if i == 0 {
                                1.0
                            } else {
                                self.mean(kind, test, shape, codec, op) / base
                            };
                            let _ = write!(out, "\t{ratio:.6}");
                        }
                        out.push('\n');
                    }
                    out.push('\n');
                }
            }
        }
        out
    }
}
