//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLER: &str = "../../quizzes/sampler.toml";
const SAMPLER_ANSWERS: &str = "../../answers/sampler.json";
const PERFECT_ANSWERS: &str = "../../answers/sampler-perfect.json";

fn quizgrade() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quizgrade").unwrap();
    cmd.env_remove("QUIZGRADE_DATA_DIR");
    cmd
}

/// A data directory holding the sampler quiz, plus a config pointing at it.
fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let quizzes = dir.path().join("data").join("quizzes");
    std::fs::create_dir_all(&quizzes).unwrap();
    std::fs::copy(SAMPLER, quizzes.join("sampler.toml")).unwrap();
    std::fs::write(
        dir.path().join("quizgrade.toml"),
        format!(
            "[store]\ntype = \"directory\"\npath = \"{}\"\n",
            dir.path().join("data").display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();
    dir
}

fn submit(dir: &Path, quiz: &str, user: Option<u64>) -> Command {
    let mut cmd = quizgrade();
    cmd.arg("submit")
        .arg("--quiz")
        .arg(quiz)
        .arg("--answers")
        .arg(std::fs::canonicalize(SAMPLER_ANSWERS).unwrap())
        .arg("--config")
        .arg(dir.join("quizgrade.toml"));
    if let Some(user) = user {
        cmd.arg("--user").arg(user.to_string());
    }
    cmd
}

#[test]
fn validate_sampler() {
    quizgrade()
        .arg("validate")
        .arg("--quiz")
        .arg(SAMPLER)
        .assert()
        .success()
        .stdout(predicate::str::contains("11 questions"))
        .stdout(predicate::str::contains("All quizzes valid"));
}

#[test]
fn validate_directory() {
    quizgrade()
        .arg("validate")
        .arg("--quiz")
        .arg("../../quizzes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question type sampler"))
        .stdout(predicate::str::contains("European capitals"));
}

#[test]
fn validate_reports_lint_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("odd.toml");
    std::fs::write(
        &path,
        r#"
[quiz]
id = 9
title = "Odd"
pass_percentage = 120

[[questions]]
id = 1
type = "essay"
options = ["a", "b"]
correct_answer = "c"
"#,
    )
    .unwrap();

    quizgrade()
        .arg("validate")
        .arg("--quiz")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown question type 'essay'"))
        .stdout(predicate::str::contains("out of range"))
        .stdout(predicate::str::contains("'c' is not one of the options"))
        .stdout(predicate::str::contains("warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    quizgrade()
        .arg("validate")
        .arg("--quiz")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn grade_text_output() {
    quizgrade()
        .arg("grade")
        .arg("--quiz")
        .arg(SAMPLER)
        .arg("--answers")
        .arg(SAMPLER_ANSWERS)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 10 / 15 (66.67%)"))
        .stdout(predicate::str::contains("tier: medium"))
        .stdout(predicate::str::contains("passed"));
}

#[test]
fn grade_json_output() {
    let output = quizgrade()
        .arg("grade")
        .arg("--quiz")
        .arg(SAMPLER)
        .arg("--answers")
        .arg(PERFECT_ANSWERS)
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let attempt: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(attempt["obtained_marks"], 15.0);
    assert_eq!(attempt["total_marks"], 15.0);
    assert_eq!(attempt["result_tier"], "high");
    assert_eq!(attempt["passed"], true);
    assert_eq!(attempt["breakdown"].as_array().unwrap().len(), 11);
}

#[test]
fn grade_rejects_malformed_answers() {
    let dir = TempDir::new().unwrap();
    let answers = dir.path().join("answers.json");
    std::fs::write(&answers, "[1, 2, 3]").unwrap();

    quizgrade()
        .arg("grade")
        .arg("--quiz")
        .arg(SAMPLER)
        .arg("--answers")
        .arg(&answers)
        .assert()
        .failure()
        .stderr(predicate::str::contains("keyed by question id"));
}

#[test]
fn preview_with_seed_is_reproducible() {
    let run = || {
        quizgrade()
            .arg("preview")
            .arg("--quiz")
            .arg(SAMPLER)
            .arg("--seed")
            .arg("42")
            .output()
            .unwrap()
    };
    let first = run();
    let second = run();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    assert!(String::from_utf8_lossy(&first.stdout).contains("seed 42"));
}

#[test]
fn submit_records_and_enforces_user_limit() {
    let dir = data_dir();

    submit(dir.path(), "101", Some(7))
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded attempt 1"));

    submit(dir.path(), "3f2b8c1e-7d4a-4e9b-a6c5-1b2d3e4f5a6b", Some(7))
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded attempt 2"));

    submit(dir.path(), "101", Some(7))
        .assert()
        .failure()
        .stdout(predicate::str::contains("Maximum attempts reached"))
        .stderr(predicate::str::contains("not recorded"));

    assert!(dir.path().join("data/attempts/101/1.json").is_file());
    assert!(dir.path().join("data/attempts/101/2.json").is_file());
    assert!(!dir.path().join("data/attempts/101/3.json").exists());

    // anonymous learners are exempt from the per-user ceiling
    submit(dir.path(), "101", None).assert().success();
}

#[test]
fn submit_unknown_quiz_fails() {
    let dir = data_dir();
    submit(dir.path(), "999", Some(1))
        .assert()
        .failure()
        .stderr(predicate::str::contains("quiz not found"));
}

#[test]
fn submit_rejects_bad_quiz_reference() {
    let dir = data_dir();
    submit(dir.path(), "not-a-quiz", Some(1))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid quiz reference"));
}

#[test]
fn attempts_lists_recorded_attempts() {
    let dir = data_dir();
    submit(dir.path(), "101", Some(3)).assert().success();
    submit(dir.path(), "101", Some(4)).assert().success();

    quizgrade()
        .arg("attempts")
        .arg("--quiz")
        .arg("101")
        .arg("--config")
        .arg(dir.path().join("quizgrade.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("2 attempt(s), 2 learner(s)"))
        .stdout(predicate::str::contains("medium: 2"));

    let output = quizgrade()
        .arg("attempts")
        .arg("--quiz")
        .arg("101")
        .arg("--user")
        .arg("4")
        .arg("--format")
        .arg("json")
        .arg("--config")
        .arg(dir.path().join("quizgrade.toml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listing["attempts"].as_array().unwrap().len(), 1);
    assert_eq!(listing["attempts"][0]["user_id"], 4);
    assert_eq!(listing["stats"]["attempts"], 1);
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    quizgrade()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizgrade.toml"))
        .stdout(predicate::str::contains("Created quizzes/example.toml"));

    assert!(dir.path().join("quizgrade.toml").exists());
    assert!(dir.path().join("quizzes/example.toml").exists());
    assert!(dir.path().join("answers/example.json").exists());
}

#[test]
fn init_then_submit_uses_local_config() {
    let dir = TempDir::new().unwrap();
    quizgrade().current_dir(dir.path()).arg("init").assert().success();

    quizgrade()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--quiz")
        .arg("quizzes/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All quizzes valid"));

    quizgrade()
        .current_dir(dir.path())
        .arg("submit")
        .arg("--quiz")
        .arg("1")
        .arg("--answers")
        .arg("answers/example.json")
        .arg("--user")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 6 / 7"))
        .stdout(predicate::str::contains("tier: high"));

    assert!(dir.path().join("attempts/1/1.json").is_file());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    quizgrade()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    quizgrade()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    quizgrade()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Quiz scoring and attempt validation"));
}

#[test]
fn version_output() {
    quizgrade()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quizgrade"));
}
