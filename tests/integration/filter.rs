use assert_cmd::Command;
use crate::common::{stdout, Workspace};

#[test]
fn filter() {
    let workspace = Workspace::new("legs\nchest\ncooking\n");
    workspace
        .run(["--delay", "0", "--", "sh", "-c", "case \"$0\" in legs) echo squat squat lunge;; chest) echo bench press and push up;; *) echo pasta;; esac", "{id}"])
        .assert()
        .success();

    let assert = Command::cargo_bin("ratebatch")
        .unwrap()
        .arg("filter")
        .arg(workspace.output())
        .args(["-k", "squat", "-k", "lunge", "-k", "bench press", "--min-score", "2"])
        .assert()
        .success();
    assert!(stdout(&assert).contains("1 matching items"));

    let matches: serde_json::Value = serde_json::from_str(&workspace.read("filtered.json")).unwrap();
    assert_eq!(matches.as_array().unwrap().len(), 1);
    assert_eq!(matches[0]["id"], "legs");
    assert_eq!(matches[0]["score"], 3);
    assert!(workspace.read("filtered.txt").contains("Top Keywords: squat(2), lunge(1)"));
}

#[test]
fn filter_without_run() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("ratebatch")
        .unwrap()
        .arg("filter")
        .arg(dir.path())
        .args(["-k", "squat"])
        .assert()
        .code(3);
}
