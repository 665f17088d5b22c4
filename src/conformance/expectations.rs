//! Recorded probe verdicts.
//!
//! These tables pin the behavior each codec showed when last reviewed. They
//! are a regression oracle: when a codec's behavior changes on purpose, the
//! table changes with it. Directional probes are keyed `Codec/Encode` and
//! `Codec/Decode`; the rest are keyed by codec name. A codec without the
//! probed slot has no entry.

use super::probes::{Probe, Verdict};

use Verdict::*;

/// Expected verdict for `probe` under `key`.
pub fn expected(probe: Probe, key: &str) -> Option<Verdict> {
    table(probe)
        .iter()
        .find(|(k, _)| *k == key)
        .map(|&(_, verdict)| verdict)
}

/// The expectation table for `probe`.
pub fn table(probe: Probe) -> &'static [(&'static str, Verdict)] {
    match probe {
        Probe::Streaming => STREAMING,
        Probe::InvalidUtf8 => INVALID_UTF8,
        Probe::DuplicateNames => DUPLICATE_NAMES,
        Probe::OutputValidation => OUTPUT_VALIDATION,
        Probe::MapDeterminism => MAP_DETERMINISM,
        Probe::PartialMutation => PARTIAL_MUTATION,
    }
}

const STREAMING: &[(&str, Verdict)] = &[
    ("SerdeJson/Encode", Streaming),
    ("SerdeJson/Decode", Streaming),
    ("SerdeValue/Encode", Buffered),
    ("SerdeValue/Decode", Buffered),
    ("SimdJson/Encode", Buffered),
    ("SimdJson/Decode", Buffered),
    ("IJson/Encode", Buffered),
    ("IJson/Decode", Buffered),
    ("Salvage/Decode", Buffered),
];

const INVALID_UTF8: &[(&str, Verdict)] = &[
    ("SerdeJson/Encode", Rejected),
    ("SerdeJson/Decode", Rejected),
    ("SerdeValue/Encode", Replaced),
    ("SerdeValue/Decode", Rejected),
    ("SimdJson/Encode", Rejected),
    ("SimdJson/Decode", Rejected),
    ("IJson/Encode", Rejected),
    ("IJson/Decode", Rejected),
    ("Lenient/Encode", Ignored),
    ("Lenient/Decode", Replaced),
    ("Salvage/Encode", Replaced),
    ("Salvage/Decode", Rejected),
];

const DUPLICATE_NAMES: &[(&str, Verdict)] = &[
    ("SerdeJson/Encode", Allowed),
    ("SerdeJson/Decode", Allowed),
    ("SerdeValue/Encode", Allowed),
    ("SerdeValue/Decode", Allowed),
    ("SimdJson/Encode", Allowed),
    ("SimdJson/Decode", Allowed),
    ("IJson/Encode", Rejected),
    ("IJson/Decode", Rejected),
    ("Lenient/Encode", Allowed),
    ("Lenient/Decode", Allowed),
    ("Salvage/Encode", Allowed),
    ("Salvage/Decode", Allowed),
];

const OUTPUT_VALIDATION: &[(&str, Verdict)] = &[
    ("SerdeJson", Rejected),
    ("SerdeValue", Rejected),
    ("SimdJson", Rejected),
    ("IJson", Rejected),
    ("Lenient", Ignored),
    ("Salvage", Rejected),
];

const MAP_DETERMINISM: &[(&str, Verdict)] = &[
    ("SerdeJson", Nondeterministic),
    ("SerdeValue", Deterministic),
    ("SimdJson", Nondeterministic),
    ("IJson", Deterministic),
    ("Lenient", Deterministic),
    ("Salvage", Deterministic),
];

const PARTIAL_MUTATION: &[(&str, Verdict)] = &[
    ("SerdeJson", NoneMutated),
    ("SerdeValue", NoneMutated),
    ("SimdJson", NoneMutated),
    ("IJson", NoneMutated),
    ("Lenient", AllMutated),
    ("Salvage", SomeMutated),
];
