//! Differential runner integration tests.
//!
//! Fixtures are written as gzip files to a temporary directory and loaded
//! the same way the CLI loads the real corpus.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use jsonbench::error::CodecResult;
use jsonbench::registry;
use jsonbench::{
    CodecDescriptor, CodecError, Corpus, DifferentialRunner, ErrorCode, Fixture, HarnessError, Op,
    Shape, Value,
};
use tempfile::TempDir;

const GOLANG: &str = r#"{
    "tree": {
        "name": "/",
        "kids": [
            {"name": "src", "kids": [], "cl_weight": 0.5, "touches": 3, "min_t": 1, "max_t": 9, "mean_t": 5},
            {"name": "doc", "kids": [], "cl_weight": 2.25, "touches": 1, "min_t": 4, "max_t": 4, "mean_t": 4}
        ],
        "cl_weight": 2.75,
        "touches": 4,
        "min_t": 1,
        "max_t": 9,
        "mean_t": 5
    },
    "username": "gopher",
    "mod_time": 1257894000
}"#;

const CANADA: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": {"name": "Canada"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-65.5, 43.25], [-66.125, 44.75], [-65.5, 43.25]]]
            }
        }
    ]
}"#;

/// Encodes every value as an empty object and fails every decode.
static BROKEN: CodecDescriptor = CodecDescriptor {
    name: "Broken",
    label: "always wrong",
    encode: Some(empty_object),
    decode: Some(reject),
    encode_to: None,
    decode_from: None,
};

fn empty_object(_: &Value) -> CodecResult<Vec<u8>> {
    Ok(b"{}".to_vec())
}

fn reject(_: &[u8], _: &mut Value) -> CodecResult<()> {
    Err(CodecError::Syntax(ErrorCode::InvalidJson(0)))
}

fn write_fixture(dir: &Path, fixture: Fixture, body: &str) {
    let file = File::create(dir.join(fixture.file_name())).unwrap();
    let mut gz = GzEncoder::new(file, Compression::default());
    gz.write_all(body.as_bytes()).unwrap();
    gz.finish().unwrap();
}

fn testdata() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), Fixture::GolangSource, GOLANG);
    write_fixture(dir.path(), Fixture::CanadaGeometry, CANADA);
    dir
}

// ============================================================================
// Corpus Loading
// ============================================================================

#[test]
fn load_selected_fixtures() {
    let dir = testdata();
    let corpus =
        Corpus::load_fixtures(dir.path(), &[Fixture::GolangSource, Fixture::CanadaGeometry])
            .unwrap();
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.entries()[0].bytes, GOLANG.as_bytes());
}

#[test]
fn missing_fixture_is_fatal() {
    let dir = testdata();
    let err = Corpus::load(dir.path()).unwrap_err();
    assert!(matches!(err, HarnessError::Io { .. }), "{err}");
}

#[test]
fn corrupt_fixture_is_fatal() {
    let dir = testdata();
    std::fs::write(dir.path().join(Fixture::TwitterStatus.file_name()), b"not gzip").unwrap();
    let err = Corpus::load_fixtures(dir.path(), &[Fixture::TwitterStatus]).unwrap_err();
    assert!(matches!(err, HarnessError::CorruptFixture { .. }), "{err}");
}

// ============================================================================
// Differential Run
// ============================================================================

#[test]
fn every_codec_agrees_with_the_reference() {
    let dir = testdata();
    let corpus =
        Corpus::load_fixtures(dir.path(), &[Fixture::GolangSource, Fixture::CanadaGeometry])
            .unwrap();
    let results = DifferentialRunner::new(&corpus).unwrap().run_all();

    let expected_units = corpus.len() * Shape::ALL.len() * registry::codecs().len() * Op::ALL.len();
    assert_eq!(results.total(), expected_units);
    assert!(results.all_passed(), "{:?}", results.problem_names());
    assert!(results.failures.is_empty());
    assert!(results.error_details.is_empty());
}

#[test]
fn run_is_repeatable() {
    let dir = testdata();
    let corpus = Corpus::load_fixtures(dir.path(), &[Fixture::GolangSource]).unwrap();
    let runner = DifferentialRunner::new(&corpus).unwrap();
    let first = runner.run_all();
    let second = runner.run_all();
    assert_eq!(first.summary(), second.summary());
}

#[test]
fn reference_rejecting_a_fixture_stops_the_run() {
    let dir = testdata();
    write_fixture(dir.path(), Fixture::SyntheaFHIR, r#"{"entry": [1, 2,"#);
    let corpus = Corpus::load_fixtures(dir.path(), &[Fixture::SyntheaFHIR]).unwrap();
    let err = DifferentialRunner::new(&corpus).err().unwrap();
    assert!(matches!(err, HarnessError::Reference { .. }), "{err}");
}

#[test]
fn broken_codec_is_reported_per_unit() {
    let dir = testdata();
    let corpus = Corpus::load_fixtures(dir.path(), &[Fixture::GolangSource]).unwrap();
    let results = DifferentialRunner::new(&corpus)
        .unwrap()
        .with_codecs(vec![&BROKEN, registry::reference()])
        .run_all();

    let shapes = Shape::ALL.len();
    assert_eq!(results.total(), shapes * 2 * Op::ALL.len());
    assert_eq!(results.failed, shapes, "{}", results.summary());
    assert_eq!(results.errors, shapes, "{}", results.summary());
    assert_eq!(results.skipped, shapes * 2);
    assert_eq!(results.passed, shapes * Op::ALL.len());
    assert!(!results.all_passed());

    for failure in &results.failures {
        assert!(failure.name.ends_with("/Broken/Encode"), "{}", failure.name);
        assert_eq!(failure.repro.codec, "Broken");
        assert!(failure.repro.path.starts_with('/'), "{:?}", failure.repro);
    }
    for error in &results.error_details {
        assert!(error.name.ends_with("/Broken/Decode"), "{}", error.name);
        assert!(error.message.starts_with("decode failed:"), "{}", error.message);
        assert!(error.message.contains("(code 100)"), "{}", error.message);
    }
    assert!(results
        .problem_names()
        .iter()
        .all(|name| name.contains("/Broken/")));
}

#[test]
fn divergences_save_as_repro_bundles() {
    let dir = testdata();
    let corpus = Corpus::load_fixtures(dir.path(), &[Fixture::CanadaGeometry]).unwrap();
    let results = DifferentialRunner::new(&corpus)
        .unwrap()
        .with_codecs(vec![&BROKEN])
        .run_all();

    let out = dir.path().join("repro");
    for failure in &results.failures {
        let path = failure.repro.save(&out).unwrap();
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(saved["unit"], failure.name.as_str());
        assert_eq!(saved["path"], "/features");
    }
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), Shape::ALL.len());
}
