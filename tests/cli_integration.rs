//! Integration tests for the `clo` CLI.
//!
//! Each test runs `clo` as a subprocess against a temp data directory and
//! checks stdout, stderr and the files it leaves behind.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use tempfile::TempDir;

fn clo_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_clo"));
    cmd.arg("--data-dir").arg(dir).env_remove("RUST_LOG");
    cmd
}

fn clo(dir: &Path, args: &[&str]) -> Output {
    clo_cmd(dir).args(args).output().unwrap()
}

fn clo_stdin(dir: &Path, args: &[&str], input: &str) -> Output {
    let mut child = clo_cmd(dir)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn list_json(dir: &Path) -> Vec<Value> {
    let out = clo(dir, &["list", "--json"]);
    assert!(out.status.success(), "list failed: {}", stderr(&out));
    match serde_json::from_str(&stdout(&out)).unwrap() {
        Value::Array(tasks) => tasks,
        other => panic!("expected array, got {other}"),
    }
}

fn status_json(dir: &Path) -> Value {
    let out = clo(dir, &["status", "--json"]);
    assert!(out.status.success());
    serde_json::from_str(&stdout(&out)).unwrap()
}

fn pasted(text: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let out = clo_stdin(tmp.path(), &["paste"], text);
    assert!(out.status.success(), "paste failed: {}", stderr(&out));
    tmp
}

#[test]
fn paste_from_stdin_reports_counts() {
    let tmp = TempDir::new().unwrap();
    let out = clo_stdin(tmp.path(), &["paste"], "Buy milk. Go home.\nWalk the dog\n");
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "2 tasks (2 steps) loaded");
    assert!(tmp.path().join("tasks.json").exists());
}

#[test]
fn paste_from_file_replaces_previous_list() {
    let tmp = pasted("Old task");
    let file = tmp.path().join("input.txt");
    fs::write(&file, "New one\nNew two\n").unwrap();

    let out = clo(tmp.path(), &["paste", file.to_str().unwrap()]);
    assert!(out.status.success());

    let titles: Vec<String> = list_json(tmp.path())
        .iter()
        .map(|t| t["task_title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["New one", "New two"]);
}

#[test]
fn blank_paste_is_rejected() {
    let tmp = pasted("Keep me");
    let out = clo_stdin(tmp.path(), &["paste"], "  \n\n");
    assert!(!out.status.success());
    assert!(stderr(&out).contains("error: nothing to paste"));
    assert_eq!(list_json(tmp.path()).len(), 1);
}

#[test]
fn list_shows_checkboxes_and_steps() {
    let tmp = pasted("Open it. Close it.\nDone");
    let out = clo(tmp.path(), &["list"]);
    let text = stdout(&out);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("[ ] ") && lines[0].ends_with(" Open it."));
    assert!(lines[1].starts_with("    [ ] ") && lines[1].ends_with(" Open it."));
    assert!(lines[2].ends_with(" Close it."));
    assert!(lines[3].ends_with(" Done"));
}

#[test]
fn list_json_uses_document_fields() {
    let tmp = pasted("Open it. Close it.");
    let tasks = list_json(tmp.path());
    let task = &tasks[0];
    assert_eq!(task["task_title"], "Open it.");
    assert_eq!(task["original_text_block"], "Open it. Close it.");
    assert_eq!(task["completed"], false);
    assert!(task["completed_timestamp"].is_null());
    assert_eq!(task["steps"][1]["step_index"], 1);
    assert_eq!(task["steps"][1]["text"], "Close it.");
}

#[test]
fn empty_list() {
    let tmp = TempDir::new().unwrap();
    let out = clo(tmp.path(), &["list"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "No tasks.");
}

#[test]
fn check_and_uncheck_by_prefix() {
    let tmp = pasted("Walk the dog\nFeed the cat");
    let id = list_json(tmp.path())[1]["task_id"].as_str().unwrap().to_string();

    let out = clo(tmp.path(), &["check", &id[..8]]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).starts_with("[x] "));

    let tasks = list_json(tmp.path());
    assert_eq!(tasks[1]["completed"], true);
    assert!(tasks[1]["completed_timestamp"].is_string());
    assert_eq!(tasks[0]["completed"], false);

    let out = clo(tmp.path(), &["uncheck", &id]);
    assert!(out.status.success());
    let tasks = list_json(tmp.path());
    assert_eq!(tasks[1]["completed"], false);
    assert!(tasks[1]["completed_timestamp"].is_null());
}

#[test]
fn checking_steps_derives_task() {
    let tmp = pasted("Open it. Close it.");
    let task = &list_json(tmp.path())[0];
    let task_id = task["task_id"].as_str().unwrap().to_string();
    let first = task["steps"][0]["step_id"].as_str().unwrap().to_string();
    let second = task["steps"][1]["step_id"].as_str().unwrap().to_string();

    let out = clo(tmp.path(), &["check", &task_id, "--step", &first]);
    assert!(out.status.success());
    assert!(stdout(&out).starts_with("[~] "));
    assert_eq!(status_json(tmp.path())["partial"], 1);

    let out = clo(tmp.path(), &["check", &task_id, "--step", &second[..8]]);
    assert!(out.status.success());
    let status = status_json(tmp.path());
    assert_eq!(status["checked"], 1);
    assert_eq!(status["steps_completed"], 2);
    assert_eq!(status["durable"], true);
}

#[test]
fn checking_task_checks_all_steps() {
    let tmp = pasted("Pack the bag. Lock the door. Leave.");
    let task_id = list_json(tmp.path())[0]["task_id"]
        .as_str()
        .unwrap()
        .to_string();

    let out = clo(tmp.path(), &["check", &task_id]);
    assert!(out.status.success());
    let task = &list_json(tmp.path())[0];
    let stamp = &task["completed_timestamp"];
    for step in task["steps"].as_array().unwrap() {
        assert_eq!(step["completed"], true);
        assert_eq!(&step["completed_timestamp"], stamp);
    }
}

#[test]
fn unknown_ids_fail() {
    let tmp = pasted("Open it. Close it.");
    let out = clo(tmp.path(), &["check", "zzzz-not-an-id"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("task not found"));

    let task_id = list_json(tmp.path())[0]["task_id"]
        .as_str()
        .unwrap()
        .to_string();
    let out = clo(tmp.path(), &["check", &task_id, "--step", "zzzz"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("step not found"));

    assert_eq!(status_json(tmp.path())["checked"], 0);
}

#[test]
fn status_text() {
    let tmp = pasted("One\nTwo");
    let out = clo(tmp.path(), &["status"]);
    assert!(out.status.success());
    assert!(stdout(&out).starts_with("2 tasks: 0 done, 0 partial, 2 open"));
}

#[test]
fn config_set_get_and_path() {
    let tmp = TempDir::new().unwrap();

    let out = clo(tmp.path(), &["config", "get", "window.width"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "48");

    let out = clo(tmp.path(), &["config", "set", "window.anchor", "bottom_left"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let out = clo(tmp.path(), &["config", "get", "window.anchor"]);
    assert_eq!(stdout(&out).trim(), "bottom_left");

    let out = clo(tmp.path(), &["config", "set", "window.width", "wide"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("invalid config"));

    let out = clo(tmp.path(), &["config", "get", "window.nope"]);
    assert!(!out.status.success());

    let out = clo(tmp.path(), &["config", "path"]);
    assert_eq!(
        stdout(&out).trim(),
        tmp.path().join("config.json").display().to_string()
    );
}

#[test]
fn line_segmenter_from_config() {
    let tmp = TempDir::new().unwrap();
    let out = clo(tmp.path(), &["config", "set", "parser.segmenter", "line"]);
    assert!(out.status.success());

    let out = clo_stdin(tmp.path(), &["paste"], "Open it. Close it.");
    assert_eq!(stdout(&out).trim(), "1 task (0 steps) loaded");
}

#[test]
fn data_dir_from_env() {
    let tmp = TempDir::new().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_clo"))
        .arg("paste")
        .env("CLO_DATA_DIR", tmp.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"From env")
        .unwrap();
    assert!(child.wait_with_output().unwrap().status.success());
    assert!(tmp.path().join("tasks.json").exists());
}
