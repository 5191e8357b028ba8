//! The built-in suite against the in-memory TodoMVC model

use std::path::Path;
use std::time::Duration;

use todomvc_e2e::artifacts::ScreenshotRecord;
use todomvc_e2e::runner::{RunnerConfig, TestSuiteResult};
use todomvc_e2e::simulated::SimulatedBrowser;
use todomvc_e2e::suite::{self, GROUP_INTENTIONAL_FAILURES};
use todomvc_e2e::TestRunner;

fn runner(dir: &Path) -> TestRunner<SimulatedBrowser> {
    let config = RunnerConfig {
        base_url: "http://todomvc.test/".to_string(),
        screenshot_dir: dir.join("screenshots"),
        output_dir: dir.join("results"),
        expect_timeout: Duration::from_millis(5000),
        full_page: true,
    };
    TestRunner::new(SimulatedBrowser::new(), config).unwrap()
}

async fn run_suite(dir: &Path) -> TestSuiteResult {
    let runner = runner(dir);
    let results = runner.run_all(&suite::builtin()).await.unwrap();
    runner.write_results(&results).unwrap();
    results
}

#[tokio::test(start_paused = true)]
async fn builtin_suite_passes_except_intentional_failures() {
    let dir = tempfile::tempdir().unwrap();
    let results = run_suite(dir.path()).await;

    assert_eq!(results.total, 24);
    assert_eq!(results.passed, 22);
    assert_eq!(results.failed, 2);

    for result in &results.results {
        let intentional = result.group == GROUP_INTENTIONAL_FAILURES;
        assert_eq!(result.success, !intentional, "{}: {:?}", result.name, result.error);
        if intentional {
            assert!(result.assertion_failure, "{}", result.name);
            assert_eq!(result.steps_run, result.steps_total);
        } else {
            assert_eq!(result.steps_run, result.steps_total);
            assert!(result.failure_screenshot.is_none());
        }
    }
}

#[tokio::test(start_paused = true)]
async fn failures_report_last_checkpoint_and_screenshot() {
    let dir = tempfile::tempdir().unwrap();
    let results = run_suite(dir.path()).await;

    let failures: Vec<_> = results.failures().collect();
    assert_eq!(failures.len(), 2);

    assert_eq!(failures[0].last_checkpoint.as_deref(), Some("30-before-failing-check"));
    assert!(failures[0]
        .error
        .as_deref()
        .unwrap()
        .contains("non-existent todo item"));

    assert_eq!(failures[1].last_checkpoint.as_deref(), Some("31-before-wrong-count-check"));
    assert!(failures[1].error.as_deref().unwrap().contains("to have count 5"));

    for failure in failures {
        let path = failure.failure_screenshot.as_ref().unwrap();
        assert!(path.starts_with(dir.path().join("results/failures")));
        assert!(path.exists());
    }
}

#[tokio::test(start_paused = true)]
async fn checkpoints_are_written_in_order_with_manifest() {
    let dir = tempfile::tempdir().unwrap();
    run_suite(dir.path()).await;

    let shots = dir.path().join("screenshots");
    let mut names: Vec<String> = std::fs::read_dir(&shots)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".png"))
        .collect();
    names.sort();
    assert_eq!(names.len(), 31);
    assert_eq!(names[0], "01-first-todo-added.png");
    assert_eq!(names[30], "31-before-wrong-count-check.png");

    let manifest: Vec<ScreenshotRecord> =
        serde_json::from_str(&std::fs::read_to_string(shots.join("manifest.json")).unwrap()).unwrap();
    let manifest_names: Vec<String> = manifest.iter().map(|r| format!("{}.png", r.name)).collect();
    assert_eq!(manifest_names, names);
    assert!(manifest.iter().all(|r| r.bytes > 0 && r.sha256.len() == 64));

    let report = dir.path().join("results/test-results.json");
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap();
    assert_eq!(json["total"], 24);
    assert_eq!(json["failed"], 2);
}

#[tokio::test(start_paused = true)]
async fn rerun_replaces_previous_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let stale = dir.path().join("screenshots/99-stale.png");
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, b"old").unwrap();

    run_suite(dir.path()).await;
    assert!(!stale.exists());
}

#[tokio::test(start_paused = true)]
async fn identical_runs_produce_identical_screenshots() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    let digests = |results: &TestSuiteResult| -> Vec<(String, String)> {
        results
            .results
            .iter()
            .flat_map(|r| r.screenshots.iter().map(|s| (s.name.clone(), s.sha256.clone())))
            .collect()
    };

    let a = run_suite(first.path()).await;
    let b = run_suite(second.path()).await;
    assert_eq!(digests(&a), digests(&b));
}
