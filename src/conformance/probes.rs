//! Behavior probes.
//!
//! A probe is a fixed scenario plus a classification of what a codec did
//! with it. Probes never look at the corpus. Their verdicts are checked
//! against the tables in [`super::expectations`].
//!
//! Probes run sequentially on the calling thread. The streaming probe reads
//! the per-thread allocation counters, so its measurement only covers the
//! codec call it wraps.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read};

use tracing::{debug, info};

use super::expectations;
use crate::alloc::{self, Snapshot};
use crate::error::CodecResult;
use crate::registry::{CodecDescriptor, CollidingKey, ListRecord, Unit, Value};

/// Elements in the synthetic streaming document.
pub const STREAM_ELEMENTS: usize = 1_000_000;

/// Allocation ceiling, in bytes, for a streaming verdict.
pub const STREAM_CEILING: u64 = 1 << 16;

/// Bytes that are not valid UTF-8 in any position.
pub const INVALID_UTF8: &[u8] = b"\xbe\xef\xff";

/// Encoded form of [`INVALID_UTF8`] after replacement.
pub const ESCAPED_REPLACEMENT: &[u8] = br#""\ufffd\ufffd\ufffd""#;

/// Two lists complete, the third cut off mid-element.
pub const TRUNCATED: &[u8] = br#"{"A":[1],"B":[2,invalid"#;

/// Pre-serialized output that is not JSON.
pub const JUNK: &str = "<junk>";

/// Number of encodes compared by the determinism probe.
pub const DETERMINISM_RUNS: usize = 10;

/// A probed behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    /// Stream slots run in bounded memory
    Streaming,
    /// Handling of invalid UTF-8
    InvalidUtf8,
    /// Handling of repeated member names
    DuplicateNames,
    /// Validation of pre-serialized fragments
    OutputValidation,
    /// Byte-stable encoding of hash maps
    MapDeterminism,
    /// What a failed decode leaves behind
    PartialMutation,
}

impl Probe {
    /// Every probe, in report order.
    pub const ALL: [Probe; 6] = [
        Probe::Streaming,
        Probe::InvalidUtf8,
        Probe::DuplicateNames,
        Probe::OutputValidation,
        Probe::MapDeterminism,
        Probe::PartialMutation,
    ];

    /// Probe name.
    pub const fn name(self) -> &'static str {
        match self {
            Probe::Streaming => "Streaming",
            Probe::InvalidUtf8 => "InvalidUTF8",
            Probe::DuplicateNames => "DuplicateNames",
            Probe::OutputValidation => "OutputValidation",
            Probe::MapDeterminism => "MapDeterminism",
            Probe::PartialMutation => "PartialMutation",
        }
    }

    /// The directions this probe exercises. Results are keyed per direction
    /// when there is more than one.
    pub const fn directions(self) -> &'static [Direction] {
        match self {
            Probe::Streaming | Probe::InvalidUtf8 | Probe::DuplicateNames => {
                &[Direction::Encode, Direction::Decode]
            }
            Probe::OutputValidation | Probe::MapDeterminism => &[Direction::Encode],
            Probe::PartialMutation => &[Direction::Decode],
        }
    }

    /// Expectation key for `codec` probed in `direction`.
    pub fn key(self, codec: &str, direction: Direction) -> String {
        if self.directions().len() > 1 {
            format!("{codec}/{direction}")
        } else {
            codec.to_string()
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encode or decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Value to bytes
    Encode,
    /// Bytes to value
    Decode,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Encode => "Encode",
            Direction::Decode => "Decode",
        })
    }
}

/// A classified behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Memory stays bounded regardless of document size
    Streaming,
    /// The whole document is held in memory
    Buffered,
    /// Input passed through without checking
    Ignored,
    /// Invalid input replaced with U+FFFD
    Replaced,
    /// The operation failed
    Rejected,
    /// The operation succeeded
    Allowed,
    /// Repeated encodes are byte-identical
    Deterministic,
    /// Repeated encodes differ
    Nondeterministic,
    /// Nothing was written to the target
    NoneMutated,
    /// Some well-formed fields were written
    SomeMutated,
    /// Every well-formed prefix was written
    AllMutated,
}

impl Verdict {
    /// Lowercase verdict name.
    pub const fn name(self) -> &'static str {
        match self {
            Verdict::Streaming => "streaming",
            Verdict::Buffered => "buffered",
            Verdict::Ignored => "ignored",
            Verdict::Replaced => "replaced",
            Verdict::Rejected => "rejected",
            Verdict::Allowed => "allowed",
            Verdict::Deterministic => "deterministic",
            Verdict::Nondeterministic => "nondeterministic",
            Verdict::NoneMutated => "none",
            Verdict::SomeMutated => "some",
            Verdict::AllMutated => "all",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The behavior was classified
    Verdict(Verdict),
    /// The codec lacks the slot the probe needs
    Skipped(String),
    /// The behavior fits no verdict
    Unclassified(String),
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Verdict(v) => write!(f, "{v}"),
            Observation::Skipped(reason) => write!(f, "skipped ({reason})"),
            Observation::Unclassified(what) => write!(f, "unclassified ({what})"),
        }
    }
}

/// One probe run against one codec in one direction.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// Probe that ran
    pub probe: Probe,
    /// Expectation key, `Codec` or `Codec/Direction`
    pub key: String,
    /// What happened
    pub observed: Observation,
    /// What the expectation table records
    pub expected: Option<Verdict>,
}

impl ProbeResult {
    /// True if the observation disagrees with the expectation.
    ///
    /// A nondeterministic codec is allowed to come out deterministic in a
    /// given run, and a codec without the probed slot must have no entry.
    pub fn is_mismatch(&self) -> bool {
        match (&self.observed, self.expected) {
            (Observation::Verdict(got), Some(want)) => {
                *got != want
                    && !(want == Verdict::Nondeterministic && *got == Verdict::Deterministic)
            }
            (Observation::Verdict(_), None) => true,
            (Observation::Skipped(_), expected) => expected.is_some(),
            (Observation::Unclassified(_), _) => true,
        }
    }

    /// One report line.
    pub fn describe(&self) -> String {
        let expected = self.expected.map_or("no entry", Verdict::name);
        format!(
            "{}/{}: got {}, want {}",
            self.probe, self.key, self.observed, expected
        )
    }
}

/// Results of a probe run.
#[derive(Debug, Default)]
pub struct ProbeReport {
    /// Every result, in run order
    pub results: Vec<ProbeResult>,
}

impl ProbeReport {
    /// Results that disagree with the expectation tables.
    pub fn mismatches(&self) -> Vec<&ProbeResult> {
        self.results.iter().filter(|r| r.is_mismatch()).collect()
    }

    /// True if every result matches its expectation.
    pub fn all_matched(&self) -> bool {
        self.results.iter().all(|r| !r.is_mismatch())
    }

    /// Observation recorded for `probe` under `key`.
    pub fn observation(&self, probe: Probe, key: &str) -> Option<&Observation> {
        self.results
            .iter()
            .find(|r| r.probe == probe && r.key == key)
            .map(|r| &r.observed)
    }

    /// Format a summary string.
    pub fn summary(&self) -> String {
        format!(
            "{} probes, {} mismatches",
            self.results.len(),
            self.mismatches().len()
        )
    }
}

/// Run every probe against every codec.
pub fn run_probes(codecs: &[&'static CodecDescriptor]) -> ProbeReport {
    let mut report = ProbeReport::default();
    for codec in codecs {
        for probe in Probe::ALL {
            for &direction in probe.directions() {
                let observed = observe(probe, codec, direction);
                let key = probe.key(codec.name, direction);
                let expected = expectations::expected(probe, &key);
                if probe == Probe::MapDeterminism
                    && expected == Some(Verdict::Nondeterministic)
                    && observed == Observation::Verdict(Verdict::Deterministic)
                {
                    info!(codec = codec.name, "map encoding came out deterministic");
                }
                debug!(probe = probe.name(), key = %key, observed = %observed, "probe finished");
                report.results.push(ProbeResult {
                    probe,
                    key,
                    observed,
                    expected,
                });
            }
        }
    }
    info!(summary = %report.summary(), "probe run complete");
    report
}

/// Run one probe against one codec.
pub fn observe(probe: Probe, codec: &CodecDescriptor, direction: Direction) -> Observation {
    match (probe, direction) {
        (Probe::Streaming, _) => streaming(codec, direction),
        (Probe::InvalidUtf8, Direction::Encode) => invalid_utf8_encode(codec),
        (Probe::InvalidUtf8, Direction::Decode) => invalid_utf8_decode(codec),
        (Probe::DuplicateNames, Direction::Encode) => duplicate_names_encode(codec),
        (Probe::DuplicateNames, Direction::Decode) => duplicate_names_decode(codec),
        (Probe::OutputValidation, _) => output_validation(codec),
        (Probe::MapDeterminism, _) => map_determinism(codec),
        (Probe::PartialMutation, _) => partial_mutation(codec),
    }
}

fn missing(codec: &CodecDescriptor, slot: &str) -> Observation {
    Observation::Skipped(format!("{} has no {slot} slot", codec.name))
}

fn buffer_encode(codec: &CodecDescriptor, value: &Value) -> Option<CodecResult<Vec<u8>>> {
    codec.encode.map(|encode| encode(value))
}

fn buffer_decode(codec: &CodecDescriptor, input: &[u8], target: &mut Value) -> Option<CodecResult<()>> {
    codec.decode.map(|decode| decode(input, target))
}

// ============================================================================
// Streaming
// ============================================================================

/// `[{},{},...]` produced on the fly, so the input costs no memory.
#[derive(Debug)]
pub struct UnitArrayReader {
    pos: usize,
    len: usize,
}

impl UnitArrayReader {
    /// A reader yielding an array of `elements` empty objects.
    pub fn new(elements: usize) -> Self {
        let len = if elements == 0 { 2 } else { 3 * elements + 1 };
        Self { pos: 0, len }
    }

    fn byte_at(&self, pos: usize) -> u8 {
        if pos == 0 {
            b'['
        } else if pos + 1 == self.len {
            b']'
        } else {
            match (pos - 1) % 3 {
                0 => b'{',
                1 => b'}',
                _ => b',',
            }
        }
    }
}

impl Read for UnitArrayReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut n = 0;
        for slot in buf.iter_mut() {
            if self.pos >= self.len {
                break;
            }
            *slot = self.byte_at(self.pos);
            self.pos += 1;
            n += 1;
        }
        Ok(n)
    }
}

/// Allocations made by one stream encode or decode of `elements` records.
///
/// `None` if the codec lacks the stream slot for `direction`.
pub fn stream_footprint(
    codec: &CodecDescriptor,
    direction: Direction,
    elements: usize,
) -> Option<CodecResult<Snapshot>> {
    match direction {
        Direction::Encode => {
            let encode_to = codec.encode_to?;
            let value = Value::Units(vec![Unit {}; elements]);
            let mut sink = io::sink();
            let (result, used) = alloc::measure(|| encode_to(&value, &mut sink));
            Some(result.map(|()| used))
        }
        Direction::Decode => {
            let decode_from = codec.decode_from?;
            let mut target = Value::Units(Vec::new());
            let mut reader = UnitArrayReader::new(elements);
            let (result, used) = alloc::measure(|| decode_from(&mut reader, &mut target));
            Some(result.map(|()| used))
        }
    }
}

fn streaming(codec: &CodecDescriptor, direction: Direction) -> Observation {
    let slot = match direction {
        Direction::Encode => "stream encode",
        Direction::Decode => "stream decode",
    };
    match stream_footprint(codec, direction, STREAM_ELEMENTS) {
        None => missing(codec, slot),
        Some(Err(e)) => Observation::Unclassified(format!("{slot} failed: {e}")),
        Some(Ok(used)) if used.bytes < STREAM_CEILING => Observation::Verdict(Verdict::Streaming),
        Some(Ok(_)) => Observation::Verdict(Verdict::Buffered),
    }
}

// ============================================================================
// Invalid UTF-8
// ============================================================================

fn is_replacement(text: &str) -> bool {
    text == "\u{FFFD}".repeat(INVALID_UTF8.len())
}

fn invalid_utf8_encode(codec: &CodecDescriptor) -> Observation {
    let value = Value::LooseText(INVALID_UTF8.to_vec());
    let Some(result) = buffer_encode(codec, &value) else {
        return missing(codec, "encode");
    };
    let out = match result {
        Ok(out) => out,
        Err(_) => return Observation::Verdict(Verdict::Rejected),
    };

    let mut verbatim = Vec::with_capacity(INVALID_UTF8.len() + 2);
    verbatim.push(b'"');
    verbatim.extend_from_slice(INVALID_UTF8);
    verbatim.push(b'"');
    if out == verbatim {
        Observation::Verdict(Verdict::Ignored)
    } else if out == ESCAPED_REPLACEMENT {
        Observation::Verdict(Verdict::Replaced)
    } else {
        Observation::Unclassified(hex::encode(&out))
    }
}

fn invalid_utf8_decode(codec: &CodecDescriptor) -> Observation {
    let mut input = Vec::with_capacity(INVALID_UTF8.len() + 2);
    input.push(b'"');
    input.extend_from_slice(INVALID_UTF8);
    input.push(b'"');

    let mut target = Value::Text(String::new());
    match buffer_decode(codec, &input, &mut target) {
        None => missing(codec, "decode"),
        Some(Err(_)) => Observation::Verdict(Verdict::Rejected),
        Some(Ok(())) => match target {
            Value::Text(text) if is_replacement(&text) => Observation::Verdict(Verdict::Replaced),
            Value::Text(text) => Observation::Unclassified(hex::encode(text.as_bytes())),
            other => Observation::Unclassified(format!("decoded into {}", other.kind())),
        },
    }
}

// ============================================================================
// Duplicate names
// ============================================================================

fn allowed_if_ok<T>(result: Option<CodecResult<T>>, codec: &CodecDescriptor, slot: &str) -> Observation {
    match result {
        None => missing(codec, slot),
        Some(Ok(_)) => Observation::Verdict(Verdict::Allowed),
        Some(Err(_)) => Observation::Verdict(Verdict::Rejected),
    }
}

fn duplicate_names_encode(codec: &CodecDescriptor) -> Observation {
    let value = Value::Names([(CollidingKey(0), 0), (CollidingKey(1), 1)].into_iter().collect());
    allowed_if_ok(buffer_encode(codec, &value), codec, "encode")
}

fn duplicate_names_decode(codec: &CodecDescriptor) -> Observation {
    let mut target = Value::Counts(Default::default());
    let result = buffer_decode(codec, br#"{"duplicate":0,"duplicate":1}"#, &mut target);
    allowed_if_ok(result, codec, "decode")
}

// ============================================================================
// Output validation
// ============================================================================

fn output_validation(codec: &CodecDescriptor) -> Observation {
    let value = Value::Fragment(JUNK.to_string());
    match buffer_encode(codec, &value) {
        None => missing(codec, "encode"),
        Some(Ok(_)) => Observation::Verdict(Verdict::Ignored),
        Some(Err(_)) => Observation::Verdict(Verdict::Rejected),
    }
}

// ============================================================================
// Map determinism
// ============================================================================

fn map_determinism(codec: &CodecDescriptor) -> Observation {
    let Some(encode) = codec.encode else {
        return missing(codec, "encode");
    };

    let mut outputs = Vec::with_capacity(DETERMINISM_RUNS);
    for _ in 0..DETERMINISM_RUNS {
        // A fresh map each time, so each gets its own hash seed.
        let digits: HashMap<u8, u8> = (0..10).map(|d| (d, d)).collect();
        match encode(&Value::Digits(digits)) {
            Ok(out) => outputs.push(out),
            Err(e) => return Observation::Unclassified(format!("encode failed: {e}")),
        }
    }

    if outputs.windows(2).all(|pair| pair[0] == pair[1]) {
        Observation::Verdict(Verdict::Deterministic)
    } else {
        Observation::Verdict(Verdict::Nondeterministic)
    }
}

// ============================================================================
// Partial mutation
// ============================================================================

fn partial_mutation(codec: &CodecDescriptor) -> Observation {
    let mut target = Value::Lists(ListRecord::default());
    match buffer_decode(codec, TRUNCATED, &mut target) {
        None => missing(codec, "decode"),
        Some(Ok(())) => Observation::Unclassified("truncated input decoded".to_string()),
        Some(Err(_)) => match target {
            Value::Lists(record) => Observation::Verdict(classify_partial(&record)),
            other => Observation::Unclassified(format!("decoded into {}", other.kind())),
        },
    }
}

/// Classify what a failed decode of [`TRUNCATED`] left in the record.
pub fn classify_partial(record: &ListRecord) -> Verdict {
    if record.is_empty() {
        Verdict::NoneMutated
    } else if record.a == [1] && record.b == [2] && record.c.is_empty() {
        Verdict::AllMutated
    } else {
        Verdict::SomeMutated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{lookup, reference};

    #[test]
    fn test_unit_array_reader() {
        let mut out = String::new();
        UnitArrayReader::new(3).read_to_string(&mut out).unwrap();
        assert_eq!(out, "[{},{},{}]");

        let mut out = String::new();
        UnitArrayReader::new(0).read_to_string(&mut out).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_unit_array_reader_small_buffers() {
        let mut reader = UnitArrayReader::new(2);
        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"[{},");
        assert_eq!(reader.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"{}]");
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_keys() {
        assert_eq!(Probe::Streaming.key("IJson", Direction::Decode), "IJson/Decode");
        assert_eq!(Probe::MapDeterminism.key("IJson", Direction::Encode), "IJson");
    }

    #[test]
    fn test_classify_partial() {
        assert_eq!(classify_partial(&ListRecord::default()), Verdict::NoneMutated);
        let all = ListRecord {
            a: vec![1],
            b: vec![2],
            c: vec![],
        };
        assert_eq!(classify_partial(&all), Verdict::AllMutated);
        let some = ListRecord {
            a: vec![1],
            ..ListRecord::default()
        };
        assert_eq!(classify_partial(&some), Verdict::SomeMutated);
    }

    #[test]
    fn test_reference_observations() {
        let codec = reference();
        assert_eq!(
            observe(Probe::InvalidUtf8, codec, Direction::Decode),
            Observation::Verdict(Verdict::Rejected)
        );
        assert_eq!(
            observe(Probe::DuplicateNames, codec, Direction::Encode),
            Observation::Verdict(Verdict::Allowed)
        );
        assert_eq!(
            observe(Probe::PartialMutation, codec, Direction::Decode),
            Observation::Verdict(Verdict::NoneMutated)
        );
    }

    #[test]
    fn test_missing_slot_is_skipped() {
        let lenient = lookup("Lenient").unwrap();
        assert!(matches!(
            observe(Probe::Streaming, lenient, Direction::Encode),
            Observation::Skipped(_)
        ));
    }

    #[test]
    fn test_mismatch_rules() {
        let result = |observed, expected| ProbeResult {
            probe: Probe::MapDeterminism,
            key: "X".to_string(),
            observed,
            expected,
        };
        let det = Observation::Verdict(Verdict::Deterministic);
        let nondet = Observation::Verdict(Verdict::Nondeterministic);

        assert!(!result(det.clone(), Some(Verdict::Nondeterministic)).is_mismatch());
        assert!(result(nondet, Some(Verdict::Deterministic)).is_mismatch());
        assert!(result(det, None).is_mismatch());
        assert!(!result(Observation::Skipped("none".into()), None).is_mismatch());
        assert!(result(Observation::Unclassified("?".into()), Some(Verdict::Ignored)).is_mismatch());
    }
}
