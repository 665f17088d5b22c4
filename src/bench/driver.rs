//! Benchmark driver.
//!
//! Each benchmark starts at one iteration and grows the count, predicting
//! from the last run, until a run takes at least the configured minimum
//! time. The final run's duration and allocations are reported per
//! operation. Measurements are numbers only; nothing here passes or fails.

use std::fmt;
use std::hint::black_box;
use std::io;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::alloc::{self, Snapshot};
use crate::config::BenchConfig;
use crate::corpus::{Corpus, CorpusEntry, Shape};
use crate::error::{CodecResult, HarnessError, HarnessResult};
use crate::registry::{self, CodecDescriptor, DecodeFn, Op, Value};

/// Upper bound on iterations per run.
pub const MAX_ITERATIONS: u64 = 1_000_000_000;

/// One measured benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchResult {
    /// `Benchmark/<Fixture>/<Shape>/<Codec>/<Op>-<procs>`
    pub name: String,
    /// Iterations in the final run
    pub iterations: u64,
    /// Nanoseconds per operation
    pub ns_per_op: u64,
    /// Bytes allocated per operation
    pub bytes_per_op: u64,
    /// Allocations per operation
    pub allocs_per_op: u64,
}

impl BenchResult {
    fn new(name: String, iterations: u64, elapsed: Duration, used: Snapshot) -> Self {
        let n = iterations.max(1);
        let ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        Self {
            name,
            iterations,
            ns_per_op: ns / n,
            bytes_per_op: used.bytes / n,
            allocs_per_op: used.count / n,
        }
    }
}

impl fmt::Display for BenchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{} ns/op\t{} B/op\t{} allocs/op",
            self.name, self.iterations, self.ns_per_op, self.bytes_per_op, self.allocs_per_op
        )
    }
}

/// Next iteration count, aiming for `goal` given that `last` iterations
/// took `elapsed`.
///
/// Overshoots by a fifth, grows at most a hundredfold, and always grows by
/// at least one.
pub fn predict_n(goal: Duration, last: u64, elapsed: Duration) -> u64 {
    let last = u128::from(last);
    let prev = elapsed.as_nanos().max(1);
    let mut n = goal.as_nanos().saturating_mul(last) / prev;
    n += n / 5;
    n = n.min(last.saturating_mul(100));
    n = n.max(last + 1);
    n = n.min(u128::from(MAX_ITERATIONS));
    u64::try_from(n).unwrap_or(MAX_ITERATIONS)
}

/// Runs benchmarks over a corpus.
pub struct BenchDriver<'c> {
    corpus: &'c Corpus,
    codecs: Vec<&'static CodecDescriptor>,
    config: BenchConfig,
    reference: DecodeFn,
}

impl<'c> BenchDriver<'c> {
    /// Benchmark every registered codec on `corpus`.
    pub fn new(corpus: &'c Corpus, config: BenchConfig) -> HarnessResult<Self> {
        let reference = registry::reference();
        let decode = reference.decode.ok_or(HarnessError::MissingCapability {
            codec: reference.name,
            op: Op::Decode,
        })?;
        Ok(Self {
            corpus,
            codecs: registry::codecs().iter().collect(),
            config,
            reference: decode,
        })
    }

    /// Restrict the run to the given codecs.
    pub fn with_codecs(mut self, codecs: Vec<&'static CodecDescriptor>) -> Self {
        self.codecs = codecs;
        self
    }

    /// Run every selected benchmark, handing each result to `emit` as soon
    /// as it is measured.
    pub fn run(&self, mut emit: impl FnMut(&BenchResult)) -> Vec<BenchResult> {
        let procs = rayon::current_num_threads();
        let mut results = Vec::new();

        for entry in self.corpus.entries() {
            for shape in Shape::ALL {
                for &codec in &self.codecs {
                    let value = match self.ready_value(entry, shape, codec) {
                        Ok(value) => value,
                        Err(e) => {
                            warn!(
                                fixture = entry.name(),
                                shape = shape.name(),
                                codec = codec.name,
                                error = %e,
                                "cannot prepare a value, skipping"
                            );
                            continue;
                        }
                    };
                    for op in codec.ops() {
                        let name = format!(
                            "Benchmark/{}/{}/{}/{}-{}",
                            entry.name(),
                            shape,
                            codec.name,
                            op,
                            procs
                        );
                        if !self.config.selects(&name) {
                            continue;
                        }
                        for _ in 0..self.config.count {
                            match self.measure(entry, shape, codec, op, &value) {
                                Some(Ok((iterations, elapsed, used))) => {
                                    let result =
                                        BenchResult::new(name.clone(), iterations, elapsed, used);
                                    emit(&result);
                                    results.push(result);
                                }
                                Some(Err(e)) => {
                                    warn!(benchmark = %name, error = %e, "benchmark failed");
                                    break;
                                }
                                None => break,
                            }
                        }
                    }
                }
            }
        }
        results
    }

    /// Decode the fixture once with `codec`, falling back to the reference.
    fn ready_value(
        &self,
        entry: &CorpusEntry,
        shape: Shape,
        codec: &CodecDescriptor,
    ) -> CodecResult<Value> {
        if let Some(decode) = codec.decode {
            let mut value = entry.empty(shape);
            if decode(&entry.bytes, &mut value).is_ok() {
                return Ok(value);
            }
        }
        let mut value = entry.empty(shape);
        (self.reference)(&entry.bytes, &mut value)?;
        Ok(value)
    }

    /// `None` if the codec lacks the slot for `op`.
    fn measure(
        &self,
        entry: &CorpusEntry,
        shape: Shape,
        codec: &CodecDescriptor,
        op: Op,
        value: &Value,
    ) -> Option<CodecResult<Sample>> {
        let bytes = entry.bytes.as_slice();
        Some(match op {
            Op::Encode => {
                let encode = codec.encode?;
                self.autoscale(|| encode(value).map(|out| drop(black_box(out))))
            }
            Op::EncodeTo => {
                let encode_to = codec.encode_to?;
                self.autoscale(|| encode_to(value, &mut io::sink()))
            }
            Op::Decode => {
                let decode = codec.decode?;
                self.autoscale(|| {
                    let mut target = entry.empty(shape);
                    decode(black_box(bytes), &mut target)?;
                    drop(black_box(target));
                    Ok(())
                })
            }
            Op::DecodeFrom => {
                let decode_from = codec.decode_from?;
                self.autoscale(|| {
                    let mut target = entry.empty(shape);
                    let mut input = black_box(bytes);
                    decode_from(&mut input, &mut target)?;
                    drop(black_box(target));
                    Ok(())
                })
            }
        })
    }

    fn autoscale(&self, mut op: impl FnMut() -> CodecResult<()>) -> CodecResult<Sample> {
        let goal = self.config.min_time;
        let mut n = 1;
        loop {
            let start = Instant::now();
            let (result, used) = alloc::measure(|| (0..n).try_for_each(|_| op()));
            let elapsed = start.elapsed();
            result?;
            if elapsed >= goal || n >= MAX_ITERATIONS {
                return Ok((n, elapsed, used));
            }
            debug!(n, elapsed_ns = elapsed.as_nanos() as u64, "scaling up");
            n = predict_n(goal, n, elapsed);
        }
    }
}

/// Iterations, total time and total allocations of one run.
type Sample = (u64, Duration, Snapshot);
