//! CLI integration tests using assert_cmd.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn perceptest() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("perceptest").unwrap()
}

fn corpus(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../corpora")
        .join(name)
}

/// A `run` invocation isolated from any user or working-directory config.
fn run_in(dir: &TempDir) -> Command {
    let mut cmd = perceptest();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("run")
        .arg("--time-limit")
        .arg("1")
        .arg("--no-cue")
        .arg("--output")
        .arg(dir.path().join("out"));
    cmd
}

fn output_files(dir: &TempDir) -> Vec<PathBuf> {
    std::fs::read_dir(dir.path().join("out"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

#[test]
fn validate_json_corpus() {
    perceptest()
        .arg("validate")
        .arg("--corpus")
        .arg(corpus("sample.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("6 questions, 3 relational"))
        .stdout(predicate::str::contains("farthest"))
        .stdout(predicate::str::contains("Corpus valid"));
}

#[test]
fn validate_tsv_corpus() {
    perceptest()
        .arg("validate")
        .arg("--corpus")
        .arg(corpus("sample.tsv"))
        .assert()
        .success()
        .stdout(predicate::str::contains("4 questions, 2 relational"));
}

#[test]
fn validate_reports_skipped_entries() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mixed.tsv");
    std::fs::write(
        &path,
        "images/a.png\tWhat shape?\tsquare\t00000000001\n\
         images/b.png\tToo short\tsquare\t0001\n",
    )
    .unwrap();

    perceptest()
        .arg("validate")
        .arg("--corpus")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("WARNING"))
        .stdout(predicate::str::contains("1 entry(ies) skipped"));
}

#[test]
fn validate_fails_when_nothing_is_valid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.tsv");
    std::fs::write(&path, "only\ttwo fields\n").unwrap();

    perceptest()
        .arg("validate")
        .arg("--corpus")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_nonexistent_file() {
    perceptest()
        .arg("validate")
        .arg("--corpus")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_unknown_extension_needs_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("questions.dat");
    std::fs::write(&path, "images/a.png\tWhat shape?\tsquare\t00000000001\n").unwrap();

    perceptest()
        .arg("validate")
        .arg("--corpus")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--format"));

    perceptest()
        .arg("validate")
        .arg("--corpus")
        .arg(&path)
        .arg("--format")
        .arg("tsv")
        .assert()
        .success();
}

#[test]
fn run_all_correct_then_summarize_archive() {
    let dir = TempDir::new().unwrap();

    run_in(&dir)
        .arg("--corpus")
        .arg(corpus("sample.json"))
        .write_stdin("circle\nleft\nb\npink\nsquare\n3\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("6 questions, 1s per question"))
        .stdout(predicate::str::contains("Example image: images/scene_2.png"))
        .stdout(predicate::str::contains("Results saved to"));

    let files = output_files(&dir);
    assert_eq!(files.len(), 1);
    let archive = &files[0];
    assert!(archive
        .to_str()
        .unwrap()
        .ends_with("_results.zip"));

    perceptest()
        .arg("summary")
        .arg("--results")
        .arg(archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("Answered: 6/6"))
        .stdout(predicate::str::contains("overall"))
        .stdout(predicate::str::contains("1.0000"));
}

#[test]
fn closed_stdin_times_out_remaining_questions() {
    let dir = TempDir::new().unwrap();

    run_in(&dir)
        .arg("--corpus")
        .arg(corpus("sample.tsv"))
        .arg("--feedback")
        .write_stdin("a\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Correct ("))
        .stdout(predicate::str::contains("Time's up. Answer: bottom"))
        .stdout(predicate::str::contains("0.2500"));
}

#[test]
fn no_feedback_by_default() {
    let dir = TempDir::new().unwrap();

    run_in(&dir)
        .arg("--corpus")
        .arg(corpus("sample.tsv"))
        .write_stdin("a\nb\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Correct (").not())
        .stdout(predicate::str::contains("Wrong (").not())
        .stdout(predicate::str::contains("Answer: ").not())
        .stdout(predicate::str::contains("Time's up."));
}

#[test]
fn invalid_utf8_input_line_is_skipped() {
    let dir = TempDir::new().unwrap();

    run_in(&dir)
        .arg("--corpus")
        .arg(corpus("sample.tsv"))
        .write_stdin(b"\xff\xfe\na\na\n".to_vec())
        .assert()
        .success()
        .stderr(predicate::str::contains("is not one of the options"))
        .stdout(predicate::str::contains("0.5000"));
}

#[test]
fn run_without_corpus_fails() {
    let dir = TempDir::new().unwrap();

    run_in(&dir)
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no corpus given"));
}

#[test]
fn summary_of_missing_file_fails() {
    perceptest()
        .arg("summary")
        .arg("--results")
        .arg("no_such_results.zip")
        .assert()
        .failure();
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    perceptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created perceptest.toml"))
        .stdout(predicate::str::contains("Created corpus/example.json"));

    assert!(dir.path().join("perceptest.toml").exists());

    perceptest()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--corpus")
        .arg("corpus/example.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("6 questions"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    perceptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    perceptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    perceptest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("visual-perception"));
}

#[test]
fn version_output() {
    perceptest()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("perceptest"));
}
