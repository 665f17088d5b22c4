//! CLI integration tests.
//!
//! Tests the jsonbench commands by invoking the binary as a subprocess.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

fn jsonbench_path() -> &'static Path {
    Path::new(env!("CARGO_BIN_EXE_jsonbench"))
}

fn run_command(args: &[&str]) -> (i32, String, String) {
    let binary = jsonbench_path();
    let output = Command::new(binary)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to spawn jsonbench at {:?}: {}", binary, e));

    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

// ============================================================================
// Codecs Command Tests
// ============================================================================

#[test]
fn cli_codecs_lists_registry() {
    let (code, stdout, _stderr) = run_command(&["codecs"]);
    assert_eq!(code, 0, "Expected success exit code");

    let names: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split('\t').next())
        .collect();
    assert_eq!(
        names,
        vec!["SerdeJson", "SerdeValue", "SimdJson", "IJson", "Lenient", "Salvage"]
    );
    assert!(
        stdout.contains("Lenient\tEncode,Decode\t"),
        "Expected Lenient capability list: {}",
        stdout
    );
}

// ============================================================================
// Roundtrip Command Tests
// ============================================================================

#[test]
fn cli_roundtrip_missing_testdata_is_setup_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nowhere");
    let (code, _stdout, stderr) =
        run_command(&["--testdata", missing.to_str().unwrap(), "roundtrip"]);
    assert_eq!(code, 2, "Expected setup error exit code");
    assert!(stderr.contains("error:"), "Expected error on stderr: {}", stderr);
}

#[test]
fn cli_roundtrip_clean_run_saves_no_bundles() {
    let dir = TempDir::new().unwrap();
    let file = fs::File::create(dir.path().join("golang_source.json.gz")).unwrap();
    let mut gz = GzEncoder::new(file, Compression::default());
    gz.write_all(br#"{"username":"gopher","mod_time":7}"#).unwrap();
    gz.finish().unwrap();
    let repro = dir.path().join("repro");

    let (code, stdout, _stderr) = run_command(&[
        "--testdata",
        dir.path().to_str().unwrap(),
        "roundtrip",
        "--fixture",
        "GolangSource",
        "--repro-dir",
        repro.to_str().unwrap(),
    ]);
    assert_eq!(code, 0, "{}", stdout);
    assert!(
        stdout.contains("63 passed, 0 failed, 9 skipped, 0 errors (total: 72)"),
        "{}",
        stdout
    );
    assert!(!repro.exists());
}

#[test]
fn cli_roundtrip_unknown_fixture() {
    let (code, _stdout, stderr) = run_command(&["roundtrip", "--fixture", "Nope"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("Nope"), "Expected fixture name: {}", stderr);
}

#[test]
fn cli_probe_unknown_codec() {
    let dir = TempDir::new().unwrap();
    let (code, _stdout, stderr) = run_command(&[
        "--testdata",
        dir.path().to_str().unwrap(),
        "probe",
        "--codec",
        "NoSuchCodec",
    ]);
    assert_eq!(code, 2);
    assert!(stderr.contains("NoSuchCodec"), "Expected codec name: {}", stderr);
}

// ============================================================================
// Probe Command Tests
// ============================================================================

#[test]
fn cli_probe_single_codec() {
    let (code, stdout, _stderr) = run_command(&["probe", "--codec", "Lenient"]);
    assert_eq!(code, 0, "Expected every probe to match: {}", stdout);
    assert!(stdout.contains("ok\tPartialMutation/Lenient: got all, want all"));
    assert!(stdout.trim_end().ends_with("0 mismatches"), "{}", stdout);
}

// ============================================================================
// Suite Command Tests
// ============================================================================

#[test]
fn cli_suite_update_then_check() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("y_lonely_int.json"), "42").unwrap();
    fs::write(dir.path().join("n_trailing_comma.json"), "[1,]").unwrap();
    fs::write(dir.path().join("i_same_key.json"), r#"{"a":1,"a":2}"#).unwrap();
    let suite = dir.path().to_str().unwrap();

    let (code, stdout, _stderr) = run_command(&["suite", "--dir", suite, "--update"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("updated "), "{}", stdout);

    let golden = fs::read_to_string(dir.path().join("results.json")).unwrap();
    assert!(golden.contains("\"same_key\""), "{}", golden);

    let (code, stdout, _stderr) = run_command(&["suite", "--dir", suite]);
    assert_eq!(code, 0, "{}", stdout);
    assert!(stdout.contains("3 documents, 0 golden entries differ"), "{}", stdout);
}

#[test]
fn cli_suite_drift_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("y_lonely_int.json"), "42").unwrap();
    fs::write(dir.path().join("results.json"), "{}\n").unwrap();
    fs::write(dir.path().join("i_same_key.json"), r#"{"a":1,"a":2}"#).unwrap();

    let (code, stdout, _stderr) =
        run_command(&["suite", "--dir", dir.path().to_str().unwrap()]);
    assert_eq!(code, 1, "Expected check failure: {}", stdout);
    assert!(stdout.contains("GotFailingWantEither[same_key]"), "{}", stdout);
}

#[test]
fn cli_suite_malformed_golden() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("results.json"), "{\"Unknown\": {}}").unwrap();

    let (code, _stdout, stderr) =
        run_command(&["suite", "--dir", dir.path().to_str().unwrap()]);
    assert_eq!(code, 2);
    assert!(stderr.contains("error:"), "{}", stderr);
}

// ============================================================================
// Aggregate Command Tests
// ============================================================================

#[test]
fn cli_aggregate_log() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("results.log");
    fs::write(
        &log,
        "Benchmark/GolangSource/Dynamic/SerdeJson/Decode-4\t10\t400 ns/op\t80 B/op\t2 allocs/op\n\
         Benchmark/GolangSource/Dynamic/IJson/Decode-4\t10\t100 ns/op\t160 B/op\t2 allocs/op\n\
         PASS\n",
    )
    .unwrap();

    let (code, stdout, _stderr) = run_command(&["aggregate", log.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Runtimes/Decode/Dynamic\tSerdeJson\tIJson\n"), "{}", stdout);
    assert!(stdout.contains("GolangSource\t1.000000\t0.250000\n"), "{}", stdout);
    assert!(stdout.contains("AllocBytes/Decode/Dynamic\tSerdeJson\tIJson\nGolangSource\t1.000000\t2.000000\n"));
}

#[test]
fn cli_aggregate_missing_log() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.log");
    let (code, _stdout, stderr) = run_command(&["aggregate", missing.to_str().unwrap()]);
    assert_eq!(code, 2);
    assert!(stderr.contains("absent.log"), "{}", stderr);
}
