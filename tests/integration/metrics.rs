use crate::common::Workspace;

#[test]
fn metrics() {
    let workspace = Workspace::new("a\nb\nb\nbad entry\nc\n");

    workspace
        .run(["--delay", "0", "--", "sh", "-c", "test \"$0\" != c", "{id}"])
        .assert()
        .success();

    let result = workspace.read("metrics.prom");
    let run_info = format!("ratebatch_run_info{{command=\"run\",input=\"{}\"}} 1", workspace.input().display());
    let mut lines = result
        .lines()
        .filter(|line| !line.starts_with("ratebatch_last_item") && !line.starts_with("ratebatch_run_info"))
        .collect::<Vec<_>>();
    lines.sort();

    assert_eq!(
        lines,
        [
            "# EOF",
            "# HELP ratebatch_entries_skipped Source entries passed over by reason.",
            "# HELP ratebatch_items Items processed by outcome.",
            "# HELP ratebatch_last_item_timestamp_seconds Unix time the last item finished processing.",
            "# HELP ratebatch_run Command and input of this run.",
            "# TYPE ratebatch_entries_skipped counter",
            "# TYPE ratebatch_items counter",
            "# TYPE ratebatch_last_item_timestamp_seconds gauge",
            "# TYPE ratebatch_run info",
            "ratebatch_entries_skipped_total{reason=\"duplicate\"} 1",
            "ratebatch_entries_skipped_total{reason=\"malformed\"} 1",
            "ratebatch_items_total{outcome=\"failed\"} 1",
            "ratebatch_items_total{outcome=\"succeeded\"} 2",
        ]
    );
    assert!(result.lines().any(|line| line == run_info));
}
