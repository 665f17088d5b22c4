//! Differential runner.
//!
//! Every (fixture, shape, codec, slot) combination is an independent unit.
//! Encode units encode the reference decode and decode the output with the
//! reference codec; decode units decode the fixture bytes directly. Either
//! way the result is compared against the reference decode. Units run in
//! parallel and never stop each other.

use rayon::prelude::*;
use tracing::{debug, info};

use super::harness::{BatchResult, UnitOutcome};
use super::repro::ReproBundle;
use crate::corpus::{Corpus, CorpusEntry, Shape};
use crate::equivalence::{diff, Strictness};
use crate::error::{CodecError, HarnessError, HarnessResult};
use crate::registry::{self, CodecDescriptor, DecodeFn, Op, Value};

/// One differential test unit.
#[derive(Debug, Clone, Copy)]
pub struct Unit<'c> {
    /// Corpus entry under test
    pub entry: &'c CorpusEntry,
    /// Decode target shape
    pub shape: Shape,
    /// Codec under test
    pub codec: &'static CodecDescriptor,
    /// Slot under test
    pub op: Op,
}

impl Unit<'_> {
    /// `Fixture/Shape/Codec/Op`.
    pub fn name(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.entry.name(),
            self.shape,
            self.codec.name,
            self.op
        )
    }
}

struct Oracle {
    entry: usize,
    shape: Shape,
    value: Value,
}

/// Runs differential units against reference decodes.
pub struct DifferentialRunner<'c> {
    corpus: &'c Corpus,
    codecs: Vec<&'static CodecDescriptor>,
    reference: DecodeFn,
    oracles: Vec<Oracle>,
}

impl<'c> DifferentialRunner<'c> {
    /// Decode every corpus entry into every shape with the reference codec.
    ///
    /// A reference decode failure is a setup error: nothing can be compared
    /// against a fixture the reference cannot read.
    pub fn new(corpus: &'c Corpus) -> HarnessResult<Self> {
        let reference = registry::reference();
        let decode = reference
            .decode
            .ok_or(HarnessError::MissingCapability {
                codec: reference.name,
                op: Op::Decode,
            })?;

        let mut oracles = Vec::new();
        for (index, entry) in corpus.entries().iter().enumerate() {
            for shape in Shape::ALL {
                let mut value = entry.empty(shape);
                decode(&entry.bytes, &mut value).map_err(|source| HarnessError::Reference {
                    fixture: entry.name().to_string(),
                    shape,
                    source,
                })?;
                oracles.push(Oracle {
                    entry: index,
                    shape,
                    value,
                });
            }
        }

        Ok(Self {
            corpus,
            codecs: registry::codecs().iter().collect(),
            reference: decode,
            oracles,
        })
    }

    /// Restrict the run to the given codecs.
    pub fn with_codecs(mut self, codecs: Vec<&'static CodecDescriptor>) -> Self {
        self.codecs = codecs;
        self
    }

    /// Every unit, in report order.
    pub fn units(&self) -> Vec<Unit<'c>> {
        let mut units = Vec::new();
        for oracle in &self.oracles {
            let entry = &self.corpus.entries()[oracle.entry];
            for &codec in &self.codecs {
                for op in Op::ALL {
                    units.push(Unit {
                        entry,
                        shape: oracle.shape,
                        codec,
                        op,
                    });
                }
            }
        }
        units
    }

    fn oracle(&self, unit: &Unit<'_>) -> Option<&Value> {
        self.oracles
            .iter()
            .find(|o| {
                std::ptr::eq(&self.corpus.entries()[o.entry], unit.entry) && o.shape == unit.shape
            })
            .map(|o| &o.value)
    }

    /// Run a single unit.
    pub fn run_unit(&self, unit: &Unit<'_>) -> UnitOutcome {
        let Some(want) = self.oracle(unit) else {
            return UnitOutcome::Error {
                message: "entry is not part of this corpus".to_string(),
            };
        };

        let got = match self.produce(unit, want) {
            Ok(Some(got)) => got,
            Ok(None) => {
                return UnitOutcome::Skip {
                    reason: format!("{} has no {} capability", unit.codec.name, unit.op),
                }
            }
            Err(message) => return UnitOutcome::Error { message },
        };

        let strictness = if unit.op.is_encode() {
            Strictness::EmptyEquivalent
        } else {
            Strictness::Exact
        };

        match diff(want, &got, strictness) {
            None => UnitOutcome::Pass,
            Some(divergence) => UnitOutcome::Fail {
                repro: Box::new(ReproBundle::new(
                    unit.entry.name(),
                    unit.shape.name(),
                    unit.codec.name,
                    unit.op.name(),
                    divergence,
                )),
            },
        }
    }

    /// The value to compare against the oracle, `None` if the slot is empty.
    fn produce(&self, unit: &Unit<'_>, want: &Value) -> Result<Option<Value>, String> {
        let codec = unit.codec;
        let mut got = unit.entry.empty(unit.shape);

        let encoded = match unit.op {
            Op::Encode => match codec.encode {
                Some(encode) => encode(want),
                None => return Ok(None),
            },
            Op::EncodeTo => match codec.encode_to {
                Some(encode_to) => {
                    let mut buf = Vec::new();
                    encode_to(want, &mut buf).map(|()| buf)
                }
                None => return Ok(None),
            },
            Op::Decode => {
                let Some(decode) = codec.decode else {
                    return Ok(None);
                };
                decode(&unit.entry.bytes, &mut got).map_err(|e| describe("decode", e))?;
                return Ok(Some(got));
            }
            Op::DecodeFrom => {
                let Some(decode_from) = codec.decode_from else {
                    return Ok(None);
                };
                let mut input = unit.entry.bytes.as_slice();
                decode_from(&mut input, &mut got).map_err(|e| describe("decode", e))?;
                return Ok(Some(got));
            }
        };

        let bytes = encoded.map_err(|e| describe("encode", e))?;
        (self.reference)(&bytes, &mut got).map_err(|e| describe("reference decode of output", e))?;
        Ok(Some(got))
    }

    /// Run every unit in parallel and collect the results in unit order.
    pub fn run_all(&self) -> BatchResult {
        let units = self.units();
        let outcomes: Vec<(String, UnitOutcome)> = units
            .par_iter()
            .map(|unit| {
                let name = unit.name();
                let outcome = self.run_unit(unit);
                debug!(unit = %name, pass = outcome.is_pass(), "unit finished");
                (name, outcome)
            })
            .collect();

        let mut results = BatchResult::new();
        for (name, outcome) in outcomes {
            results.record(&name, outcome);
        }
        info!(summary = %results.summary(), "differential run complete");
        results
    }
}

fn describe(step: &str, error: CodecError) -> String {
    format!("{step} failed: {error}")
}
