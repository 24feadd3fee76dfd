// Integration tests for the reclink binary: exit codes, stdout/stderr
// contract, and the files each command writes.
//
// Run with: cargo test -p reclink-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn reclink() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_reclink"));
    cmd.env_remove("RECLINK_LOG");
    cmd
}

/// Fixtures shared with the reclink-output integration tests, copied into a
/// scratch directory.
fn scratch_fixtures() -> tempfile::TempDir {
    let src = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../output/tests/fixtures");
    let dir = tempfile::tempdir().unwrap();
    for entry in std::fs::read_dir(&src).unwrap() {
        let entry = entry.unwrap();
        std::fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
    dir
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    reclink().current_dir(dir).args(args).output().expect("spawn reclink")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path).unwrap().lines().map(String::from).collect()
}

// ===========================================================================
// reclink run
// ===========================================================================

#[test]
fn run_prints_histogram_and_writes_outputs() {
    let dir = scratch_fixtures();
    let out = run_in(dir.path(), &["run", "dedup.job.toml"]);

    assert!(out.status.success(), "exit: {:?}\nstderr: {}", out.status, stderr(&out));

    let text = stdout(&out);
    assert!(text.starts_with("Weight histogram:\n"), "stdout:\n{text}");
    assert!(text.contains("  Match   | Non-Match|Poss-Match| w_sum |"));

    let err = stderr(&out);
    assert!(err.contains("deduplication job 'Census deduplication'"), "stderr:\n{err}");
    assert!(err.contains("match status: 3 row(s)"), "stderr:\n{err}");

    assert_eq!(
        lines(&dir.path().join("dedup-status.csv")),
        vec![
            "rec-0,rec-1,2.750000,mid1",
            "rec-0,rec-2,2.000000,mid2",
            "rec-3,rec-4,2.250000,mid3",
        ]
    );
    assert!(dir.path().join("census-mid.csv").exists());
}

#[test]
fn run_json_stdout_is_single_report() {
    let dir = scratch_fixtures();
    let out = run_in(dir.path(), &["run", "linkage.job.toml", "--json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let val: serde_json::Value = serde_json::from_str(stdout(&out).trim())
        .unwrap_or_else(|e| panic!("stdout must be JSON: {e}\n{}", stdout(&out)));

    assert_eq!(val["meta"]["job_name"], "Clinic to registry");
    assert_eq!(val["meta"]["mode"], "linkage");
    assert_eq!(val["meta"]["engine_version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(val["summary"]["weight_vectors"], 5);
    assert_eq!(val["datasets"].as_array().map(Vec::len), Some(2));
    assert_eq!(val["datasets"][1]["added_rec_ident"], false);
}

#[test]
fn run_output_writes_report_file() {
    let dir = scratch_fixtures();
    let out = run_in(dir.path(), &["run", "dedup.job.toml", "--output", "report.json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let report = std::fs::read_to_string(dir.path().join("report.json")).unwrap();
    let val: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(val["summary"]["matches"], 3);
    assert_eq!(val["histogram"][0], "Weight histogram:");
}

#[test]
fn run_resolves_paths_against_job_directory() {
    let dir = scratch_fixtures();
    let job = dir.path().join("dedup.job.toml");
    let out = reclink()
        .current_dir(std::env::temp_dir())
        .args(["run", job.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(dir.path().join("dedup-histogram.txt").exists());
}

#[test]
fn run_missing_job_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_in(dir.path(), &["run", "nope.toml"]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("cannot read job file"));
}

#[test]
fn run_overlapping_classes_is_validation_error() {
    let dir = scratch_fixtures();
    // rec-0,rec-1 is already a match
    std::fs::write(dir.path().join("dedup-possible.csv"), "rec-0,rec-1\n").unwrap();

    let out = run_in(dir.path(), &["run", "dedup.job.toml"]);
    assert_eq!(out.status.code(), Some(5), "stderr: {}", stderr(&out));
    let err = stderr(&out);
    assert!(err.contains("in both"), "stderr:\n{err}");
    assert!(err.contains("hint:"), "stderr:\n{err}");
}

#[test]
fn run_bad_weight_is_parse_error() {
    let dir = scratch_fixtures();
    std::fs::write(dir.path().join("dedup-weights.csv"), "a,b,w\nrec-0,rec-1,x\n").unwrap();

    let out = run_in(dir.path(), &["run", "dedup.job.toml"]);
    assert_eq!(out.status.code(), Some(4), "stderr: {}", stderr(&out));
}

// ===========================================================================
// reclink validate
// ===========================================================================

#[test]
fn validate_accepts_fixture_jobs() {
    let dir = scratch_fixtures();
    let out = run_in(dir.path(), &["validate", "linkage.job.toml"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("valid: linkage job 'Clinic to registry' with 2 dataset(s)"));
    assert!(stdout(&out).is_empty());
}

#[test]
fn validate_rejects_dedup_with_second_dataset() {
    let dir = scratch_fixtures();
    let job = std::fs::read_to_string(dir.path().join("linkage.job.toml"))
        .unwrap()
        .replace("mode = \"linkage\"", "mode = \"deduplication\"");
    std::fs::write(dir.path().join("bad.job.toml"), job).unwrap();

    let out = run_in(dir.path(), &["validate", "bad.job.toml"]);
    assert_eq!(out.status.code(), Some(5));
    assert!(stderr(&out).contains("config validation error"), "stderr: {}", stderr(&out));
}

#[test]
fn validate_rejects_malformed_toml() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.toml"), "name = \n").unwrap();

    let out = run_in(dir.path(), &["validate", "broken.toml"]);
    assert_eq!(out.status.code(), Some(5));
    assert!(stderr(&out).contains("config parse error"));
}

// ===========================================================================
// reclink histogram
// ===========================================================================

#[test]
fn histogram_plain_layout() {
    let dir = scratch_fixtures();
    let out = run_in(dir.path(), &["histogram", "dedup-weights.csv", "--bin-width", "1"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let text = stdout(&out);
    let rows: Vec<&str> = text.lines().collect();
    assert_eq!(rows[2], "  Counts  | w_sum |");
    // 61 columns for the largest bin of 3
    assert_eq!(rows[4], format!("        2 | -1.00 |{}", "*".repeat(40)));
    assert_eq!(rows[5], format!("        1 |  1.00 |{}", "*".repeat(20)));
    assert_eq!(rows[6], format!("        3 |  2.00 |{}", "*".repeat(61)));
}

#[test]
fn histogram_with_classes_and_output_file() {
    let dir = scratch_fixtures();
    let out = run_in(
        dir.path(),
        &[
            "histogram",
            "link-weights.csv",
            "--bin-width",
            "1",
            "--matches",
            "link-matches.csv",
            "--non-matches",
            "link-non-matches.csv",
            "-o",
            "hist.txt",
        ],
    );
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let written = lines(&dir.path().join("hist.txt"));
    let printed: Vec<String> = stdout(&out).lines().map(String::from).collect();
    assert_eq!(written, printed);
    assert_eq!(written[3], "  Match   | Non-Match| w_sum |");
}

#[test]
fn histogram_matches_require_non_matches() {
    let dir = scratch_fixtures();
    let out = run_in(
        dir.path(),
        &["histogram", "dedup-weights.csv", "--bin-width", "1", "--matches", "dedup-matches.csv"],
    );
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn histogram_rejects_zero_bin_width() {
    let dir = scratch_fixtures();
    let out = run_in(dir.path(), &["histogram", "dedup-weights.csv", "--bin-width", "0"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("--bin-width"));
}

#[test]
fn histogram_missing_weights_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_in(dir.path(), &["histogram", "absent.csv", "--bin-width", "1"]);
    assert_eq!(out.status.code(), Some(3), "stderr: {}", stderr(&out));
}

// ===========================================================================
// reclink status
// ===========================================================================

#[test]
fn status_writes_rows() {
    let dir = scratch_fixtures();
    let out = run_in(
        dir.path(),
        &["status", "link-weights.csv", "--matches", "link-matches.csv", "--output", "s.csv"],
    );
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("wrote 2 match status row(s)"));
    assert_eq!(
        lines(&dir.path().join("s.csv")),
        vec!["a0,b0,1.750000,mid1", "a2,b1,1.500000,mid2"]
    );
}

#[test]
fn status_unknown_pair_leaves_no_file() {
    let dir = scratch_fixtures();
    std::fs::write(dir.path().join("extra.csv"), "a0,b0\nzz,yy\n").unwrap();

    let out = run_in(
        dir.path(),
        &["status", "link-weights.csv", "--matches", "extra.csv", "--output", "s.csv"],
    );
    assert_eq!(out.status.code(), Some(5));
    assert!(stderr(&out).contains("(zz, yy)"), "stderr: {}", stderr(&out));
    assert!(!dir.path().join("s.csv").exists());
}

// ===========================================================================
// logging
// ===========================================================================

#[test]
fn verbose_flag_emits_info_logs() {
    let dir = scratch_fixtures();
    let out = run_in(dir.path(), &["-v", "validate", "dedup.job.toml"]);
    assert!(out.status.success());

    let out = run_in(dir.path(), &["-v", "status", "dedup-weights.csv", "--matches", "dedup-matches.csv", "-o", "s.csv"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("INFO"), "stderr: {}", stderr(&out));
}
