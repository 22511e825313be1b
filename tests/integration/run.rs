use std::time::{Duration, Instant};

use crate::common::{stderr, stdout, Workspace};

#[test]
fn run_all_succeed() {
    let workspace = Workspace::new("a\nb\nc\n");

    let started = Instant::now();
    let assert = workspace
        .run(["--delay", "2", "--", "echo", "payload", "{id}"])
        .assert()
        .success();
    assert!(stdout(&assert).contains("3 items: 3 succeeded, 0 failed, 0 skipped"));

    assert!(started.elapsed() >= Duration::from_secs(4));
    for id in ["a", "b", "c"] {
        assert!(workspace.read(format!("items/{id}.txt")).ends_with(&format!("payload {id}\n")));
    }
}

#[test]
fn run_continues_after_failure() {
    let workspace = Workspace::new("a\nb\nc\n");

    let assert = workspace
        .run(["--delay", "0", "--", "sh", "-c", "test \"$0\" != b && echo ok", "{id}"])
        .assert()
        .code(0);
    assert!(stdout(&assert).contains("3 items: 2 succeeded, 1 failed, 0 skipped"));

    assert!(workspace.output().join("items/a.txt").exists());
    assert!(workspace.output().join("items/c.txt").exists());
    assert!(!workspace.output().join("items/b.txt").exists());

    let report: serde_json::Value = serde_json::from_str(&workspace.read("report.json")).unwrap();
    assert_eq!(report["items"]["b"]["status"], "failed");
    assert_eq!(report["items"]["a"]["status"], "success");
    assert!(workspace.read("report.txt").contains("[failed] b"));
}

#[test]
fn run_skips_malformed_entries() {
    let workspace = Workspace::new("a\nb\nc\nd\nnot valid\ne\nf\ng\nh\ni\n");

    let assert = workspace
        .run(["--delay", "0", "--", "echo"])
        .assert()
        .success();
    assert!(stdout(&assert).contains("10 items: 9 succeeded, 0 failed, 1 skipped"));

    assert_eq!(std::fs::read_dir(workspace.output().join("items")).unwrap().count(), 9);
}

#[test]
fn run_limit() {
    let workspace = Workspace::new("a\nb\nc\nd\n");

    let assert = workspace
        .run(["--delay", "0", "--limit", "2", "--", "echo"])
        .assert()
        .success();
    assert!(stdout(&assert).contains("2 items: 2 succeeded"));

    assert!(workspace.output().join("items/b.txt").exists());
    assert!(!workspace.output().join("items/c.txt").exists());
}

#[test]
fn run_resume() {
    let workspace = Workspace::new("a\nb\n");
    workspace.run(["--delay", "0", "--limit", "1", "--", "echo"]).assert().success();

    let assert = workspace
        .run(["--delay", "0", "--resume", "--", "echo"])
        .assert()
        .success();
    assert!(stdout(&assert).contains("1 items: 1 succeeded, 0 failed, 0 skipped (1 already completed)"));
}

#[test]
fn run_prerequisite_missing() {
    let workspace = Workspace::new("a\nb\nc\n");

    let assert = workspace
        .run(["--delay", "0", "--", "command_not_found", "{id}"])
        .assert()
        .code(2);
    assert!(stderr(&assert).contains("command_not_found"));

    assert!(!workspace.output().exists());
}

#[test]
fn run_prerequisite_still_missing_after_install() {
    let workspace = Workspace::new("a\n");

    workspace
        .run(["--delay", "0", "--install", "--install-with", "true", "--", "command_not_found"])
        .assert()
        .code(2);

    assert!(!workspace.output().exists());
}

#[test]
fn run_source_unavailable() {
    let workspace = Workspace::new("");
    std::fs::remove_file(workspace.input()).unwrap();

    workspace.run(["--", "echo"]).assert().code(3);
}

#[test]
fn run_video_parser() {
    let workspace = Workspace::new("https://www.youtube.com/watch?v=abc123&ab_channel=x\nhttps://example.com\nhttps://youtu.be/abc123\n");

    let assert = workspace
        .run(["--delay", "0", "--parser", "video", "--", "echo", "{line}"])
        .assert()
        .success();
    assert!(stdout(&assert).contains("3 items: 1 succeeded, 0 failed, 2 skipped"));

    assert!(workspace.read("items/abc123.txt").contains("Source: https://www.youtube.com/watch?v=abc123&ab_channel=x"));
}

#[test]
fn run_rejects_invalid_delay() {
    let workspace = Workspace::new("a\n");

    workspace.run(["--delay=-2", "--", "echo"]).assert().code(1);
}
