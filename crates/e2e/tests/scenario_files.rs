//! YAML scenarios and app properties against the in-memory TodoMVC model

use std::time::Duration;
use test_case::test_case;

use todomvc_e2e::runner::RunnerConfig;
use todomvc_e2e::simulated::SimulatedBrowser;
use todomvc_e2e::todo::{items_left_label, Filter};
use todomvc_e2e::{Scenario, Step, TestRunner};

const ACTIVE_VIEW: &str = r#"
name: completing the only item empties the active view
group: Routing
setup:
  items: [walk the dog]
steps:
  - action: set_completed
    index: 0
    completed: true
  - action: select_filter
    filter: active
  - action: expect_item_count
    count: 0
  - action: expect_filter_selected
    filter: active
  - action: expect_count_label
    text: 0 items left
  - action: screenshot
    name: 90-active-view-empty
"#;

const EDIT_THEN_RELOAD: &str = r#"
name: edits survive a reload
group: Persistence
setup:
  items: [milk, eggs]
steps:
  - action: start_edit
    index: 0
  - action: expect_edit_value
    index: 0
    text: milk
  - action: edit
    index: 0
    text: "  oat milk "
    finish: blur
  - action: reload
  - action: expect_titles
    texts: [oat milk, eggs]
"#;

const WRONG_EXPECTATION: &str = r#"
name: wrong label
steps:
  - action: add_todo
    text: one
  - action: expect_count_label
    text: 2 items left
  - action: screenshot
    name: 91-never-taken
"#;

fn runner(dir: &std::path::Path) -> TestRunner<SimulatedBrowser> {
    let config = RunnerConfig {
        base_url: "http://todomvc.test/".to_string(),
        screenshot_dir: dir.join("screenshots"),
        output_dir: dir.to_path_buf(),
        expect_timeout: Duration::from_millis(1000),
        full_page: true,
    };
    TestRunner::new(SimulatedBrowser::new(), config).unwrap()
}

#[tokio::test(start_paused = true)]
async fn yaml_scenarios_load_and_run() {
    let specs = tempfile::tempdir().unwrap();
    std::fs::write(specs.path().join("01-active.yaml"), ACTIVE_VIEW).unwrap();
    std::fs::write(specs.path().join("02-reload.yml"), EDIT_THEN_RELOAD).unwrap();
    std::fs::write(specs.path().join("03-wrong.yaml"), WRONG_EXPECTATION).unwrap();

    let scenarios = Scenario::load_all(specs.path()).unwrap();
    assert_eq!(scenarios.len(), 3);

    let out = tempfile::tempdir().unwrap();
    let results = runner(out.path()).run_all(&scenarios).await.unwrap();
    assert_eq!((results.passed, results.failed), (2, 1));

    assert!(results.results[0].success, "{:?}", results.results[0].error);
    assert_eq!(results.results[0].screenshots[0].name, "90-active-view-empty");
    assert!(results.results[1].success, "{:?}", results.results[1].error);

    let wrong = &results.results[2];
    assert!(wrong.assertion_failure);
    assert_eq!(wrong.last_checkpoint, None);
    assert!(wrong.screenshots.is_empty());
    assert!(!out.path().join("screenshots/91-never-taken.png").exists());
}

#[test_case(Filter::All, &["a", "b", "c", "d"]; "all shows every item")]
#[test_case(Filter::Active, &["a", "c"]; "active shows incomplete items")]
#[test_case(Filter::Completed, &["b", "d"]; "completed shows complete items")]
#[tokio::test(start_paused = true)]
async fn filters_show_matching_items(filter: Filter, expected: &[&str]) {
    let scenario = Scenario::new("Routing", format!("filter {:?}", filter))
        .with_items(&["a", "b", "c", "d"])
        .steps([
            Step::SetCompleted { index: 1, completed: true },
            Step::SetCompleted { index: 3, completed: true },
            Step::SelectFilter { filter },
            Step::ExpectFilterSelected { filter },
            Step::items(expected),
            Step::ExpectCountLabel { text: items_left_label(2) },
        ]);

    let out = tempfile::tempdir().unwrap();
    let result = runner(out.path()).run_scenario(&scenario).await.unwrap();
    assert!(result.success, "{:?}", result.error);
}

#[test_case(1, "1 item left"; "singular")]
#[test_case(4, "4 items left"; "plural")]
#[tokio::test]
async fn counter_tracks_added_items(n: usize, label: &str) {
    let items: Vec<String> = (0..n).map(|i| format!("item {}", i)).collect();
    let scenario = Scenario::new("Counter", format!("{} items", n))
        .steps(items.iter().map(|t| Step::add(t.as_str())))
        .steps([
            Step::ExpectCountLabel { text: label.to_string() },
            Step::titles(items.as_slice()),
            Step::ExpectEntryEmpty,
        ]);

    let out = tempfile::tempdir().unwrap();
    let result = runner(out.path()).run_scenario(&scenario).await.unwrap();
    assert!(result.success, "{:?}", result.error);
}

#[tokio::test]
async fn clear_completed_keeps_order_and_hides_button() {
    let scenario = Scenario::new("Clear completed button", "keeps order")
        .with_items(&["a", "b", "c", "d", "e"])
        .steps([
            Step::ExpectClearCompletedVisible { visible: false },
            Step::SetCompleted { index: 0, completed: true },
            Step::SetCompleted { index: 3, completed: true },
            Step::ExpectClearCompletedVisible { visible: true },
            Step::ClearCompleted,
            Step::items(&["b", "c", "e"]),
            Step::all_completed(false, 3),
            Step::ExpectClearCompletedVisible { visible: false },
        ]);

    let out = tempfile::tempdir().unwrap();
    let result = runner(out.path()).run_scenario(&scenario).await.unwrap();
    assert!(result.success, "{:?}", result.error);
}

#[tokio::test]
async fn pages_do_not_share_storage() {
    let out = tempfile::tempdir().unwrap();
    let runner = runner(out.path());

    let first = Scenario::new("Isolation", "writer").steps([Step::add("private"), Step::item_count(1)]);
    let second = Scenario::new("Isolation", "reader").steps([Step::Reload, Step::item_count(0)]);

    let results = runner.run_all(&[first, second]).await.unwrap();
    assert_eq!(results.passed, 2, "{:?}", results.results);
}
