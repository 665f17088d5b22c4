//! Conformance suite runner.
//!
//! Runs a directory of small documents through every codec's decode slot and
//! buckets the surprising outcomes by test suffix. The bucketed result set is
//! pinned in a golden file: check mode fails on any drift, update mode
//! rewrites the file instead.
//!
//! File names follow `<category>_<suffix>.json`, where the category is
//!
//! - `y`: must be accepted
//! - `n`: must be rejected
//! - `i`: either outcome is acceptable

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GoldenMode;
use crate::error::{CodecResult, HarnessError, HarnessResult};
use crate::registry::{CodecDescriptor, Value};

/// What a suite document requires of a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// `y_`: must decode
    Accept,
    /// `n_`: must fail
    Reject,
    /// `i_`: may do either
    Either,
}

impl Category {
    /// Parse a file name prefix.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "y" => Some(Self::Accept),
            "n" => Some(Self::Reject),
            "i" => Some(Self::Either),
            _ => None,
        }
    }

    /// File name prefix.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Accept => "y",
            Self::Reject => "n",
            Self::Either => "i",
        }
    }
}

/// One suite document.
#[derive(Debug, Clone)]
pub struct SuiteCase {
    /// File name
    pub file: String,
    /// Required outcome
    pub category: Category,
    /// Name after the category prefix, without extension
    pub suffix: String,
    /// Document bytes
    pub bytes: Vec<u8>,
}

/// A result-set bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    /// Decoded a must-reject document
    GotPassingWantFailing,
    /// Failed a must-accept document
    GotFailingWantPassing,
    /// Decoded an either-way document
    GotPassingWantEither,
    /// Failed an either-way document
    GotFailingWantEither,
}

impl Bucket {
    /// Every bucket, in golden file order.
    pub const ALL: [Bucket; 4] = [
        Bucket::GotFailingWantEither,
        Bucket::GotFailingWantPassing,
        Bucket::GotPassingWantEither,
        Bucket::GotPassingWantFailing,
    ];

    /// Bucket a decode outcome, `None` if it is the required one.
    pub fn classify(category: Category, passed: bool) -> Option<Self> {
        match (category, passed) {
            (Category::Accept, true) | (Category::Reject, false) => None,
            (Category::Accept, false) => Some(Self::GotFailingWantPassing),
            (Category::Reject, true) => Some(Self::GotPassingWantFailing),
            (Category::Either, true) => Some(Self::GotPassingWantEither),
            (Category::Either, false) => Some(Self::GotFailingWantEither),
        }
    }

    /// Key in the golden file.
    pub const fn name(self) -> &'static str {
        match self {
            Self::GotPassingWantFailing => "GotPassingWantFailing",
            Self::GotFailingWantPassing => "GotFailingWantPassing",
            Self::GotPassingWantEither => "GotPassingWantEither",
            Self::GotFailingWantEither => "GotFailingWantEither",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Suffix to codec names, in registry order.
pub type BucketMap = BTreeMap<String, Vec<String>>;

/// Bucketed suite outcomes. Serialized as the golden file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResultSet {
    /// Must-reject documents that decoded
    #[serde(rename = "GotPassingWantFailing")]
    pub passing_want_failing: BucketMap,
    /// Must-accept documents that failed
    #[serde(rename = "GotFailingWantPassing")]
    pub failing_want_passing: BucketMap,
    /// Either-way documents that decoded
    #[serde(rename = "GotPassingWantEither")]
    pub passing_want_either: BucketMap,
    /// Either-way documents that failed
    #[serde(rename = "GotFailingWantEither")]
    pub failing_want_either: BucketMap,
}

impl ResultSet {
    /// The map for `bucket`.
    pub fn bucket(&self, bucket: Bucket) -> &BucketMap {
        match bucket {
            Bucket::GotPassingWantFailing => &self.passing_want_failing,
            Bucket::GotFailingWantPassing => &self.failing_want_passing,
            Bucket::GotPassingWantEither => &self.passing_want_either,
            Bucket::GotFailingWantEither => &self.failing_want_either,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut BucketMap {
        match bucket {
            Bucket::GotPassingWantFailing => &mut self.passing_want_failing,
            Bucket::GotFailingWantPassing => &mut self.failing_want_passing,
            Bucket::GotPassingWantEither => &mut self.passing_want_either,
            Bucket::GotFailingWantEither => &mut self.failing_want_either,
        }
    }

    /// Every (bucket, suffix) entry that differs from `got`.
    pub fn diff(&self, got: &ResultSet) -> Vec<GoldenDiff> {
        let mut diffs = Vec::new();
        for bucket in Bucket::ALL {
            let want = self.bucket(bucket);
            let have = got.bucket(bucket);
            let suffixes: BTreeSet<&String> = want.keys().chain(have.keys()).collect();
            for suffix in suffixes {
                let w = want.get(suffix).cloned().unwrap_or_default();
                let g = have.get(suffix).cloned().unwrap_or_default();
                if w != g {
                    diffs.push(GoldenDiff {
                        bucket,
                        suffix: suffix.clone(),
                        want: w,
                        got: g,
                    });
                }
            }
        }
        diffs
    }

    /// Pretty, key-sorted JSON with a trailing newline.
    pub fn to_golden_text(&self) -> serde_json::Result<String> {
        // Going through Value sorts every object by key.
        let tree = serde_json::to_value(self)?;
        let mut text = serde_json::to_string_pretty(&tree)?;
        text.push('\n');
        Ok(text)
    }
}

/// One (bucket, suffix) entry that drifted from the golden file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldenDiff {
    /// Bucket
    pub bucket: Bucket,
    /// Test suffix
    pub suffix: String,
    /// Codec names in the golden file
    pub want: Vec<String>,
    /// Codec names from this run
    pub got: Vec<String>,
}

impl fmt::Display for GoldenDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]: want {:?}, got {:?}",
            self.bucket, self.suffix, self.want, self.got
        )
    }
}

/// What a suite run did with the golden file.
#[derive(Debug)]
pub enum SuiteOutcome {
    /// Compared against the golden file
    Checked(Vec<GoldenDiff>),
    /// Rewrote the golden file
    Updated(PathBuf),
}

/// Loads suite documents and runs them.
#[derive(Debug)]
pub struct SuiteRunner {
    dir: PathBuf,
    golden: String,
    cases: Vec<SuiteCase>,
}

impl SuiteRunner {
    /// Load every `*.json` document from `dir` except the golden file.
    pub fn load<P: AsRef<Path>>(dir: P, golden: &str) -> HarnessResult<Self> {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| HarnessError::io(dir, e))? {
            let entry = entry.map_err(|e| HarnessError::io(dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(file) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if file == golden {
                continue;
            }
            files.push((file.to_string(), path));
        }
        files.sort();

        let mut cases = Vec::with_capacity(files.len());
        for (file, path) in files {
            let stem = file.trim_end_matches(".json");
            let Some((code, suffix)) = stem.split_once('_') else {
                debug!(file = %file, "no category prefix, skipping");
                continue;
            };
            let Some(category) = Category::from_code(code) else {
                debug!(file = %file, "unknown category, skipping");
                continue;
            };
            let bytes = fs::read(&path).map_err(|e| HarnessError::io(&path, e))?;
            cases.push(SuiteCase {
                file: file.clone(),
                category,
                suffix: suffix.to_string(),
                bytes,
            });
        }

        debug!(dir = %dir.display(), cases = cases.len(), "loaded suite");
        Ok(Self {
            dir: dir.to_path_buf(),
            golden: golden.to_string(),
            cases,
        })
    }

    /// Loaded documents, in file name order.
    pub fn cases(&self) -> &[SuiteCase] {
        &self.cases
    }

    /// Path of the golden file.
    pub fn golden_path(&self) -> PathBuf {
        self.dir.join(&self.golden)
    }

    /// Decode every document with every codec and bucket the outcomes.
    pub fn run_all(&self, codecs: &[&'static CodecDescriptor]) -> ResultSet {
        // Codec indices, so that names come out in registry order.
        let mut buckets: BTreeMap<(Bucket, String), BTreeSet<usize>> = BTreeMap::new();

        for (index, codec) in codecs.iter().enumerate() {
            if codec.decode.is_none() && codec.decode_from.is_none() {
                warn!(codec = codec.name, "no decode slot, skipping suite");
                continue;
            }
            for case in &self.cases {
                let passed = decode_raw(codec, &case.bytes).is_some_and(|r| r.is_ok());
                if let Some(bucket) = Bucket::classify(case.category, passed) {
                    buckets
                        .entry((bucket, case.suffix.clone()))
                        .or_default()
                        .insert(index);
                }
            }
        }

        let mut results = ResultSet::default();
        for ((bucket, suffix), members) in buckets {
            let names = members.into_iter().map(|i| codecs[i].name.to_string()).collect();
            results.bucket_mut(bucket).insert(suffix, names);
        }
        results
    }

    /// Read the golden file.
    pub fn load_golden(&self) -> HarnessResult<ResultSet> {
        let path = self.golden_path();
        let text = fs::read_to_string(&path).map_err(|e| HarnessError::io(&path, e))?;
        serde_json::from_str(&text).map_err(|source| HarnessError::MalformedGolden { path, source })
    }

    /// Compare `fresh` against the golden file.
    pub fn check_golden(&self, fresh: &ResultSet) -> HarnessResult<Vec<GoldenDiff>> {
        Ok(self.load_golden()?.diff(fresh))
    }

    /// Replace the golden file with `fresh`.
    pub fn write_golden(&self, fresh: &ResultSet) -> HarnessResult<PathBuf> {
        let path = self.golden_path();
        let text = fresh
            .to_golden_text()
            .map_err(|e| HarnessError::io(&path, e.into()))?;
        fs::write(&path, text).map_err(|e| HarnessError::io(&path, e))?;
        Ok(path)
    }

    /// Run the suite and either check or rewrite the golden file.
    pub fn execute(
        &self,
        codecs: &[&'static CodecDescriptor],
        mode: GoldenMode,
    ) -> HarnessResult<SuiteOutcome> {
        let fresh = self.run_all(codecs);
        match mode {
            GoldenMode::Check => {
                let diffs = self.check_golden(&fresh)?;
                info!(cases = self.cases.len(), drift = diffs.len(), "suite checked");
                Ok(SuiteOutcome::Checked(diffs))
            }
            GoldenMode::Update => {
                let path = self.write_golden(&fresh)?;
                info!(path = %path.display(), "golden file updated");
                Ok(SuiteOutcome::Updated(path))
            }
        }
    }
}

/// Decode into raw text with the buffer slot, else the stream slot.
fn decode_raw(codec: &CodecDescriptor, bytes: &[u8]) -> Option<CodecResult<()>> {
    let mut target = Value::Raw(None);
    if let Some(decode) = codec.decode {
        return Some(decode(bytes, &mut target));
    }
    let decode_from = codec.decode_from?;
    let mut input = bytes;
    Some(decode_from(&mut input, &mut target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{codecs, lookup};

    fn suite(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            fs::write(dir.path().join(name), body).unwrap();
        }
        dir
    }

    #[test]
    fn test_classify() {
        assert_eq!(Bucket::classify(Category::Accept, true), None);
        assert_eq!(Bucket::classify(Category::Reject, false), None);
        assert_eq!(
            Bucket::classify(Category::Reject, true),
            Some(Bucket::GotPassingWantFailing)
        );
        assert_eq!(
            Bucket::classify(Category::Either, false),
            Some(Bucket::GotFailingWantEither)
        );
    }

    #[test]
    fn test_load_filters_and_sorts() {
        let dir = suite(&[
            ("y_b.json", "[]"),
            ("n_a_trailing_comma.json", "[1,]"),
            ("x_unknown.json", "[]"),
            ("noprefix.json", "[]"),
            ("y_text.txt", "[]"),
            ("results.json", "{}"),
        ]);
        let runner = SuiteRunner::load(dir.path(), "results.json").unwrap();
        let files: Vec<_> = runner.cases().iter().map(|c| c.file.as_str()).collect();
        assert_eq!(files, vec!["n_a_trailing_comma.json", "y_b.json"]);
        assert_eq!(runner.cases()[0].suffix, "a_trailing_comma");
        assert_eq!(runner.cases()[0].category, Category::Reject);
    }

    #[test]
    fn test_duplicate_names_bucket() {
        let dir = suite(&[("i_object_same_key.json", r#"{"a":1,"a":2}"#)]);
        let runner = SuiteRunner::load(dir.path(), "results.json").unwrap();
        let all: Vec<_> = codecs().iter().collect();
        let results = runner.run_all(&all);

        assert_eq!(
            results.passing_want_either["object_same_key"],
            vec!["SerdeJson", "SerdeValue", "SimdJson", "Lenient", "Salvage"]
        );
        assert_eq!(results.failing_want_either["object_same_key"], vec!["IJson"]);
        assert!(results.passing_want_failing.is_empty());
    }

    #[test]
    fn test_lossy_codec_accepts_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("n_string_invalid_utf8.json"), b"[\"\xff\"]").unwrap();
        let runner = SuiteRunner::load(dir.path(), "results.json").unwrap();
        let results = runner.run_all(&[lookup("SerdeJson").unwrap(), lookup("Lenient").unwrap()]);
        assert_eq!(results.passing_want_failing["string_invalid_utf8"], vec!["Lenient"]);
    }

    #[test]
    fn test_golden_round_trip() {
        let dir = suite(&[("y_ok.json", "[1]"), ("n_bad.json", "[1,]")]);
        let runner = SuiteRunner::load(dir.path(), "results.json").unwrap();
        let all: Vec<_> = codecs().iter().collect();

        match runner.execute(&all, GoldenMode::Update).unwrap() {
            SuiteOutcome::Updated(path) => {
                let text = fs::read_to_string(path).unwrap();
                assert!(text.ends_with("}\n"));
            }
            other => panic!("unexpected {:?}", other),
        }
        match runner.execute(&all, GoldenMode::Check).unwrap() {
            SuiteOutcome::Checked(diffs) => assert!(diffs.is_empty(), "{:?}", diffs),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_drift_is_reported() {
        let dir = suite(&[
            ("y_ok.json", "[1]"),
            (
                "results.json",
                r#"{"GotFailingWantPassing": {"ok": ["IJson"]}}"#,
            ),
        ]);
        let runner = SuiteRunner::load(dir.path(), "results.json").unwrap();
        let all: Vec<_> = codecs().iter().collect();
        let fresh = runner.run_all(&all);
        let diffs = runner.check_golden(&fresh).unwrap();
        assert_eq!(
            diffs,
            vec![GoldenDiff {
                bucket: Bucket::GotFailingWantPassing,
                suffix: "ok".to_string(),
                want: vec!["IJson".to_string()],
                got: vec![],
            }]
        );
        assert_eq!(
            diffs[0].to_string(),
            r#"GotFailingWantPassing[ok]: want ["IJson"], got []"#
        );
    }

    #[test]
    fn test_malformed_golden() {
        let dir = suite(&[("results.json", r#"{"Unexpected": {}}"#)]);
        let runner = SuiteRunner::load(dir.path(), "results.json").unwrap();
        let err = runner.check_golden(&ResultSet::default()).unwrap_err();
        assert!(matches!(err, HarnessError::MalformedGolden { .. }));
    }

    #[test]
    fn test_missing_golden_is_fatal() {
        let dir = suite(&[]);
        let runner = SuiteRunner::load(dir.path(), "results.json").unwrap();
        let err = runner.check_golden(&ResultSet::default()).unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
    }
}
