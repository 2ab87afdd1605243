// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI integration tests.
//!
//! These tests run the actual seedsplit binary against generated record files.

mod common;

use std::{
    path::PathBuf,
    process::{Command, Output},
};

use common::{channel_records, interleave, temp_dir, write_file, CleanupGuard, SECOND};
use seedsplit::io::formats::mseed::RecordBuilder;

/// Get the path to the built seedsplit binary
fn seedsplit_bin() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    // The test binary is in target/debug/deps/
    // The seedsplit binary is in target/debug/
    path.pop(); // deps
    path.pop(); // debug or release
    path.push("seedsplit");
    path
}

/// Two LHZ channels, the second with a gap from 300 s to 350 s.
fn fixture() -> (PathBuf, CleanupGuard) {
    let (dir, guard) = temp_dir("cli");
    let lhz10 = RecordBuilder::new("IU", "ANMO", "10", "LHZ");
    let mut second = channel_records(&lhz10, 0, 300, 0, 1);
    second.extend(channel_records(&lhz10, 350 * SECOND, 250, 350, 100));
    let bytes = interleave(vec![
        channel_records(&RecordBuilder::new("IU", "ANMO", "00", "LHZ"), 0, 600, 0, 1),
        second,
    ]);
    let path = write_file(&dir, "fixture.mseed", &bytes);
    (path, guard)
}

/// Run seedsplit with arguments
fn run(args: &[&str]) -> Output {
    let bin = seedsplit_bin();
    Command::new(&bin)
        .args(args)
        .output()
        .unwrap_or_else(|_| panic!("Failed to run {:?}", bin))
}

/// Run seedsplit and assert success
fn run_ok(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "Command failed: {:?}\nstdout: {}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run seedsplit and assert failure
fn run_err(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        !output.status.success(),
        "Command should have failed but succeeded: {:?}",
        args
    );
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let stdout = run_ok(args);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("invalid JSON ({e}): {stdout}"))
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    let output = run_ok(&["--help"]);
    assert!(output.contains("miniSEED"));
    assert!(output.contains("split"));
    assert!(output.contains("inspect"));
    assert!(output.contains("coverage"));
}

#[test]
fn test_cli_version() {
    let output = run_ok(&["--version"]);
    assert!(output.contains("seedsplit"));
}

#[test]
fn test_cli_invalid_subcommand() {
    let stderr = run_err(&["nonexistent"]);
    assert!(stderr.contains("unrecognized") || stderr.contains("unknown"));
}

// ============================================================================
// Split Tests
// ============================================================================

#[test]
fn test_split_text() {
    let (path, _guard) = fixture();
    let path_str = path.to_string_lossy().to_string();
    let output = run_ok(&["split", &path_str]);

    assert!(output.contains("IU_ANMO_00_LHZ"));
    assert!(output.contains("IU_ANMO_10_LHZ"));
    assert!(output.contains("Framing:"));
}

#[test]
fn test_split_json() {
    let (path, _guard) = fixture();
    let path_str = path.to_string_lossy().to_string();
    let report = run_json(&["split", "--json", &path_str]);

    let channels = report["channels"].as_array().unwrap();
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0]["name"], "IU_ANMO_00_LHZ");
    assert_eq!(channels[0]["segments"].as_array().unwrap().len(), 1);
    assert_eq!(channels[0]["segments"][0]["samples"], 600);

    let segments = channels[1]["segments"].as_array().unwrap();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0]["end_time"], 300 * SECOND);
    assert_eq!(segments[1]["start_time"], 350 * SECOND);

    assert_eq!(report["stats"]["sources"], 1);
    assert_eq!(report["stats"]["segments"], 3);
}

#[test]
fn test_split_channel_filter() {
    let (path, _guard) = fixture();
    let path_str = path.to_string_lossy().to_string();
    let report = run_json(&["split", "--json", "--exclude", "_10_", &path_str]);

    let channels = report["channels"].as_array().unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0]["name"], "IU_ANMO_00_LHZ");
}

#[test]
fn test_split_nonexistent_input() {
    let stderr = run_err(&["split", "/nonexistent/day1.mseed"]);
    assert!(stderr.contains("Error"));
}

#[test]
fn test_split_missing_input() {
    let stderr = run_err(&["split"]);
    assert!(stderr.contains("required") || stderr.contains("Usage"));
}

// ============================================================================
// Inspect Tests
// ============================================================================

#[test]
fn test_inspect_records_limit() {
    let (path, _guard) = fixture();
    let path_str = path.to_string_lossy().to_string();
    let headers = run_json(&["inspect", "records", &path_str, "--limit", "3", "--json"]);

    let headers = headers.as_array().unwrap();
    assert_eq!(headers.len(), 3);
    assert_eq!(headers[0]["station"], "ANMO");
    assert_eq!(headers[0]["location"], "00");
    assert_eq!(headers[1]["location"], "10");
    assert_eq!(headers[2]["location"], "00");
}

#[test]
fn test_inspect_stats() {
    let (path, _guard) = fixture();
    let path_str = path.to_string_lossy().to_string();
    let output = run_ok(&["inspect", "stats", &path_str]);

    assert!(output.contains("Records:"));
    assert!(output.contains("IU_ANMO_00_LHZ"));
    assert!(output.contains("IU_ANMO_10_LHZ"));
}

#[test]
fn test_inspect_bad_quality() {
    let (path, _guard) = fixture();
    let path_str = path.to_string_lossy().to_string();
    run_err(&["inspect", "stats", &path_str, "--quality", "7"]);
}

// ============================================================================
// Coverage Tests
// ============================================================================

#[test]
fn test_coverage_json() {
    let (path, _guard) = fixture();
    let path_str = path.to_string_lossy().to_string();
    let blocks = run_json(&[
        "coverage",
        &path_str,
        "--channels",
        "IU_ANMO_00_LHZ,IU_ANMO_10_LHZ",
        "--json",
    ]);

    let blocks = blocks.as_array().unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["start_time"], 0);
    assert_eq!(blocks[0]["end_time"], 300 * SECOND);
    assert_eq!(blocks[1]["start_time"], 350 * SECOND);
    assert_eq!(blocks[1]["end_time"], 600 * SECOND);
}

#[test]
fn test_coverage_unknown_channel() {
    let (path, _guard) = fixture();
    let path_str = path.to_string_lossy().to_string();
    let stderr = run_err(&["coverage", &path_str, "--channels", "XX_NONE_00_BHZ"]);
    assert!(stderr.contains("XX_NONE_00_BHZ"));
}
