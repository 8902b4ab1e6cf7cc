use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{tempdir, TempDir};

/// Command with preferences isolated inside `dir`
fn logcount(dir: &TempDir) -> Result<Command> {
    let mut cmd = Command::cargo_bin("logcount")?;
    cmd.current_dir(dir.path())
        .env("LOGCOUNT_PREFERENCES", dir.path().join("prefs.json"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn test_count_patterns() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("input.txt"), "foo bar foo\nbar foo bar bar\n")?;

    logcount(&dir)?
        .args(["count", "input.txt", "-p", "foo", "-p", "bar", "-p", "baz", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"foo\s+\S*3")?)
        .stdout(predicate::str::is_match(r"bar\s+\S*4")?)
        .stdout(predicate::str::contains("7 matches. Analysed 2 lines"));
    Ok(())
}

#[test]
fn test_count_json() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("input.txt"), "aaaa\n")?;

    let output = logcount(&dir)?
        .args(["count", "input.txt", "-p", "aa", "--json", "-b", "1", "-j", "2"])
        .output()?;
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["status"], "completed");
    assert_eq!(json["filters"][0]["pattern"], "aa");
    assert_eq!(json["filters"][0]["count"], 2);
    assert_eq!(json["total_matches"], 2);
    Ok(())
}

#[test]
fn test_missing_file_fails() -> Result<()> {
    let dir = tempdir()?;
    logcount(&dir)?
        .args(["count", "missing.log", "-p", "x", "--no-progress"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Selected file not found"));
    Ok(())
}

#[test]
fn test_no_filters_fails() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("input.txt"), "x\n")?;
    logcount(&dir)?
        .args(["count", "input.txt", "--no-progress"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Nothing to do"));
    Ok(())
}

#[test]
fn test_empty_pattern_rejected() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("input.txt"), "x\n")?;
    logcount(&dir)?
        .args(["count", "input.txt", "-p", "", "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid filter"));
    Ok(())
}

#[test]
fn test_filter_list_workflow() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("app.log"), "ERROR a\nWARN b\nERROR c\n")?;

    logcount(&dir)?
        .args(["filters", "add", "filters.json", "ERROR", "WARN", "INFO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 filters"));

    logcount(&dir)?
        .args(["filters", "remove", "filters.json", "2", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 1 filters (2 left)"));

    logcount(&dir)?
        .args(["filters", "list", "filters.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ERROR"))
        .stdout(predicate::str::contains("WARN"))
        .stdout(predicate::str::contains("INFO").not());

    let output = logcount(&dir)?
        .args(["count", "app.log", "-f", "filters.json", "--json"])
        .output()?;
    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["filters"][0]["count"], 2);
    assert_eq!(json["filters"][1]["count"], 1);

    let saved = fs::read_to_string(dir.path().join("filters.json"))?;
    assert!(saved.contains("\"format\": \"logcount-filters\""));
    Ok(())
}

#[test]
fn test_last_filter_list_is_remembered() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("app.log"), "ERROR ERROR\n")?;

    logcount(&dir)?
        .args(["filters", "add", "filters.json", "ERROR"])
        .assert()
        .success();

    logcount(&dir)?
        .args(["count", "app.log", "--no-progress"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Using last filter list"))
        .stdout(predicate::str::is_match(r"ERROR\s+\S*2")?);
    Ok(())
}

#[test]
fn test_relative_file_found_in_last_directory() -> Result<()> {
    let dir = tempdir()?;
    fs::create_dir(dir.path().join("logs"))?;
    fs::write(dir.path().join("logs/app.log"), "WARN WARN WARN\n")?;

    logcount(&dir)?
        .args(["count", "logs/app.log", "-p", "WARN", "--no-progress"])
        .assert()
        .success();

    logcount(&dir)?
        .args(["count", "app.log", "-p", "WARN", "--no-progress"])
        .assert()
        .success()
        .stderr(predicate::str::contains("from the last opened directory"))
        .stdout(predicate::str::is_match(r"WARN\s+\S*3")?);

    logcount(&dir)?
        .args(["count", "missing.log", "-p", "WARN", "--no-progress"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Selected file not found"));
    Ok(())
}

#[test]
fn test_invalid_encoding_flag() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("input.txt"), "x\n")?;
    logcount(&dir)?
        .args(["count", "input.txt", "-p", "x", "--encoding", "utf16"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown encoding mode"));
    Ok(())
}
