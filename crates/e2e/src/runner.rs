//! Scenario runner
//!
//! Runs each scenario on its own page: navigate, enter the setup items, then
//! execute steps in order. The first failing step ends the scenario; its
//! error is reported together with the last checkpoint captured before it
//! and a full-page failure screenshot.

use std::path::PathBuf;
use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::artifacts::{ScreenshotRecord, ScreenshotStore};
use crate::error::{E2eError, E2eResult};
use crate::expect::{expect, ClassPattern, DEFAULT_TIMEOUT_MS};
use crate::page::{Browser, Page};
use crate::scenario::{Scenario, Step};
use crate::todo::{Filter, TodoPage, COMPLETED_CLASS, SELECTED_CLASS};

/// Result of executing one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub index: usize,
    pub step_name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub screenshot: Option<ScreenshotRecord>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub group: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps_run: usize,
    pub steps_total: usize,
    pub steps: Vec<StepResult>,
    pub screenshots: Vec<ScreenshotRecord>,
    /// Last checkpoint captured before a failure
    pub last_checkpoint: Option<String>,
    pub failure_screenshot: Option<PathBuf>,
    /// The failure was an expectation mismatch rather than a driver problem
    pub assertion_failure: bool,
    pub error: Option<String>,
}

/// Result of running a list of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

/// Configuration for the scenario runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// URL of the application under test
    pub base_url: String,

    /// Directory for checkpoint screenshots
    pub screenshot_dir: PathBuf,

    /// Directory for the report and failure captures
    pub output_dir: PathBuf,

    /// Wait window for expectations without their own bound
    pub expect_timeout: Duration,

    pub full_page: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5173".to_string(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            output_dir: PathBuf::from("test-results"),
            expect_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            full_page: true,
        }
    }
}

pub struct TestRunner<B: Browser> {
    browser: B,
    config: RunnerConfig,
    store: ScreenshotStore,
}

impl<B: Browser> TestRunner<B> {
    pub fn new(browser: B, config: RunnerConfig) -> E2eResult<Self> {
        let store = ScreenshotStore::new(&config.screenshot_dir, config.output_dir.join("failures"))?;
        Ok(Self { browser, config, store })
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run scenarios in order; infrastructure errors fail the scenario, not the run
    pub async fn run_all(&self, scenarios: &[Scenario]) -> E2eResult<TestSuiteResult> {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::with_capacity(scenarios.len());
        let mut passed = 0;
        let mut failed = 0;

        self.store.clean()?;
        info!("Running {} scenario(s) against {}", scenarios.len(), self.config.base_url);

        for scenario in scenarios {
            let result = match self.run_scenario(scenario).await {
                Ok(result) => result,
                Err(e) => TestResult {
                    name: scenario.name.clone(),
                    group: scenario.group.clone(),
                    success: false,
                    duration_ms: 0,
                    steps_run: 0,
                    steps_total: scenario.steps.len(),
                    steps: vec![],
                    screenshots: vec![],
                    last_checkpoint: None,
                    failure_screenshot: None,
                    assertion_failure: e.is_assertion(),
                    error: Some(e.to_string()),
                },
            };

            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", scenario.full_name(), result.duration_ms);
            } else {
                failed += 1;
                error!(
                    "✗ {} - {}",
                    scenario.full_name(),
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Scenario results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        Ok(TestSuiteResult {
            started_at,
            total: scenarios.len(),
            passed,
            failed,
            duration_ms,
            results,
        })
    }

    /// Run a single scenario on a fresh page
    pub async fn run_scenario(&self, scenario: &Scenario) -> E2eResult<TestResult> {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.full_name());

        let page = self.browser.new_page().await?;
        let todo = TodoPage::new(&page);

        let mut steps = Vec::new();
        let mut screenshots: Vec<ScreenshotRecord> = Vec::new();
        let mut failure: Option<E2eError> = None;

        if let Err(e) = self.setup(&todo, scenario).await {
            failure = Some(e);
        } else {
            for (index, step) in scenario.steps.iter().enumerate() {
                let step_start = Instant::now();
                let step_name = step.name();
                debug!("Step {}: {}", index + 1, step_name);

                let outcome = self.execute_step(&todo, step).await;
                let duration_ms = step_start.elapsed().as_millis() as u64;

                match outcome {
                    Ok(screenshot) => {
                        if let Some(record) = &screenshot {
                            screenshots.push(record.clone());
                        }
                        steps.push(StepResult {
                            index,
                            step_name,
                            success: true,
                            duration_ms,
                            error: None,
                            screenshot,
                        });
                    }
                    Err(e) => {
                        steps.push(StepResult {
                            index,
                            step_name,
                            success: false,
                            duration_ms,
                            error: Some(e.to_string()),
                            screenshot: None,
                        });
                        failure = Some(e);
                        break; // Stop on first failure
                    }
                }
            }
        }

        let failure_screenshot = match &failure {
            Some(_) => self.capture_failure(&page, scenario).await,
            None => None,
        };

        if let Err(e) = page.close().await {
            warn!("Failed to close page for '{}': {}", scenario.name, e);
        }

        let last_checkpoint = if failure.is_some() {
            screenshots.last().map(|s| s.name.clone())
        } else {
            None
        };

        Ok(TestResult {
            name: scenario.name.clone(),
            group: scenario.group.clone(),
            success: failure.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps_run: steps.len(),
            steps_total: scenario.steps.len(),
            steps,
            screenshots,
            last_checkpoint,
            failure_screenshot,
            assertion_failure: failure.as_ref().map(E2eError::is_assertion).unwrap_or(false),
            error: failure.map(|e| e.to_string()),
        })
    }

    async fn setup(&self, todo: &TodoPage<'_, B::Page>, scenario: &Scenario) -> E2eResult<()> {
        todo.page().goto(&self.config.base_url).await?;
        todo.add_todos(&scenario.setup.items).await
    }

    async fn capture_failure(&self, page: &B::Page, scenario: &Scenario) -> Option<PathBuf> {
        let path = self.store.failure_path(&scenario.full_name());
        match page.screenshot(&path, self.config.full_page).await {
            Ok(()) => {
                info!("Failure screenshot: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Could not capture failure screenshot for '{}': {}", scenario.name, e);
                None
            }
        }
    }

    fn timeout(&self, override_ms: Option<u64>) -> Duration {
        override_ms
            .map(Duration::from_millis)
            .unwrap_or(self.config.expect_timeout)
    }

    /// Execute a single step; checkpoints return their stored record
    async fn execute_step(
        &self,
        todo: &TodoPage<'_, B::Page>,
        step: &Step,
    ) -> E2eResult<Option<ScreenshotRecord>> {
        let page = todo.page();
        let default = self.config.expect_timeout;
        let completed = ClassPattern::matches(COMPLETED_CLASS);

        match step {
            Step::AddTodo { text } => todo.add_todo(text).await?,
            Step::SetCompleted { index, completed } => todo.set_completed(*index, *completed).await?,
            Step::SetAllCompleted { completed } => todo.set_all_completed(*completed).await?,
            Step::StartEdit { index } => todo.start_edit(*index).await?,
            Step::Edit { index, text, finish } => todo.finish_edit(*index, text, *finish).await?,
            Step::HoverItem { index } => todo.hover_item(*index).await?,
            Step::DeleteItem { index } => todo.delete_item(*index).await?,
            Step::ClearCompleted => todo.clear_completed_items().await?,
            Step::SelectFilter { filter } => todo.select_filter(*filter).await?,
            Step::Reload => todo.reload().await?,

            Step::ExpectTitles { texts, timeout_ms } => {
                expect(page, &todo.titles())
                    .with_timeout(self.timeout(*timeout_ms))
                    .to_have_text(texts.as_slice())
                    .await?
            }
            Step::ExpectItems { texts, timeout_ms } => {
                expect(page, &todo.items())
                    .with_timeout(self.timeout(*timeout_ms))
                    .to_have_text(texts.as_slice())
                    .await?
            }
            Step::ExpectItemCount { count, timeout_ms } => {
                expect(page, &todo.items())
                    .with_timeout(self.timeout(*timeout_ms))
                    .to_have_count(*count)
                    .await?
            }
            Step::ExpectCompleted { index, completed: true } => {
                expect(page, &todo.item(*index))
                    .with_timeout(default)
                    .to_have_class(&completed)
                    .await?
            }
            Step::ExpectCompleted { index, completed: false } => {
                expect(page, &todo.item(*index))
                    .not()
                    .with_timeout(default)
                    .to_have_class(&completed)
                    .await?
            }
            Step::ExpectAllCompleted { completed: all, rows } => {
                let check = expect(page, &todo.items()).with_timeout(default);
                if *all {
                    check.to_all_have_class(&completed, *rows).await?
                } else {
                    check.to_all_lack_class(&completed, *rows).await?
                }
            }
            Step::ExpectCountLabel { text } => {
                expect(page, &todo.count_label())
                    .with_timeout(default)
                    .to_have_text(&[text])
                    .await?
            }
            Step::ExpectCountContains { text } => {
                expect(page, &todo.count_label())
                    .with_timeout(default)
                    .to_contain_text(text)
                    .await?
            }
            Step::ExpectClearCompletedVisible { visible } => {
                let check = expect(page, &todo.clear_completed()).with_timeout(default);
                if *visible {
                    check.to_be_visible().await?
                } else {
                    check.to_be_hidden().await?
                }
            }
            Step::ExpectFilterSelected { filter } => {
                let selected = ClassPattern::exact(SELECTED_CLASS);
                for other in Filter::EVERY {
                    let check = expect(page, &todo.filter_link(other)).with_timeout(default);
                    if other == *filter {
                        check.to_have_class(&selected).await?;
                    } else {
                        check.not().to_have_class(&selected).await?;
                    }
                }
            }
            Step::ExpectEntryEmpty => {
                expect(page, &todo.new_todo())
                    .with_timeout(default)
                    .to_be_empty()
                    .await?
            }
            Step::ExpectEditValue { index, text } => {
                expect(page, &todo.edit_box(*index))
                    .with_timeout(default)
                    .to_have_value(text)
                    .await?
            }
            Step::Screenshot { name } => {
                let path = self.store.checkpoint_path(name)?;
                page.screenshot(&path, self.config.full_page).await?;
                return Ok(Some(self.store.record(name, &path)?));
            }
        }

        Ok(None)
    }

    /// Write the suite report and the checkpoint manifest
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        let records: Vec<ScreenshotRecord> = results
            .results
            .iter()
            .flat_map(|r| r.screenshots.iter().cloned())
            .collect();
        let manifest = self.store.write_manifest(&records)?;

        info!("Results written to: {}", path.display());
        debug!("Screenshot manifest: {}", manifest.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedBrowser;
    use crate::todo::EditFinish;
    use test_case::test_case;

    fn runner(dir: &std::path::Path) -> TestRunner<SimulatedBrowser> {
        let config = RunnerConfig {
            base_url: "http://todomvc.test/".to_string(),
            screenshot_dir: dir.join("screenshots"),
            output_dir: dir.to_path_buf(),
            expect_timeout: Duration::from_millis(500),
            full_page: true,
        };
        TestRunner::new(SimulatedBrowser::new(), config).unwrap()
    }

    #[tokio::test]
    async fn test_passing_scenario_records_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = Scenario::new("Editing", "trim")
            .with_items(&["a", "b"])
            .steps([
                Step::StartEdit { index: 0 },
                Step::Edit { index: 0, text: "  a2 ".to_string(), finish: EditFinish::Enter },
                Step::titles(&["a2", "b"]),
                Step::Screenshot { name: "01-trimmed".to_string() },
            ]);

        let result = runner(dir.path()).run_scenario(&scenario).await.unwrap();
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.steps_run, 4);
        assert_eq!(result.screenshots.len(), 1);
        assert!(dir.path().join("screenshots/01-trimmed.png").exists());
        assert_eq!(result.last_checkpoint, None);
        assert_eq!(result.failure_screenshot, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_stops_and_captures() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = Scenario::new("G", "broken").steps([
            Step::add("a"),
            Step::Screenshot { name: "01-before".to_string() },
            Step::item_count(3),
            Step::add("never reached"),
        ]);

        let result = runner(dir.path()).run_scenario(&scenario).await.unwrap();
        assert!(!result.success);
        assert!(result.assertion_failure);
        assert_eq!(result.steps_run, 3);
        assert_eq!(result.steps_total, 4);
        assert_eq!(result.last_checkpoint.as_deref(), Some("01-before"));
        assert!(result.failure_screenshot.unwrap().ends_with("failures/g-broken.png"));
        assert!(result.error.unwrap().contains("to have count 3"));
    }

    #[test_case(&["a", "b", "c"], vec![
        Step::SetCompleted { index: 0, completed: true },
        Step::SetCompleted { index: 2, completed: true },
        Step::all_completed(true, 3),
    ]; "one row still active")]
    #[test_case(&[], vec![Step::ExpectAllCompleted { completed: true, rows: None }]; "no rows at all")]
    #[test_case(&["a", "b", "c"], vec![
        Step::SelectFilter { filter: Filter::Completed },
        Step::ExpectAllCompleted { completed: true, rows: None },
    ]; "completed view is empty")]
    #[test_case(&["a", "b"], vec![Step::SetCompleted { index: 0, completed: true }, Step::all_completed(false, 2)]; "one row completed")]
    #[test_case(&["a", "b"], vec![Step::SetAllCompleted { completed: true }, Step::all_completed(true, 3)]; "row count differs")]
    #[test_case(&["a"], vec![Step::ExpectFilterSelected { filter: Filter::Active }]; "wrong filter selected")]
    #[tokio::test(start_paused = true)]
    async fn test_composite_checks_fail(items: &[&str], steps: Vec<Step>) {
        let dir = tempfile::tempdir().unwrap();
        let scenario = Scenario::new("G", "composite").with_items(items).steps(steps);

        let result = runner(dir.path()).run_scenario(&scenario).await.unwrap();
        assert!(!result.success);
        assert!(result.assertion_failure, "{:?}", result.error);
        assert!(result.failure_screenshot.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_screenshots_keep_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let first = Scenario::new("G", "a b").step(Step::item_count(1));
        let second = Scenario::new("G", "a-b").step(Step::item_count(1));

        let suite = runner.run_all(&[first, second]).await.unwrap();
        assert_eq!(suite.failed, 2);

        let paths: Vec<_> = suite.results.iter().map(|r| r.failure_screenshot.clone().unwrap()).collect();
        assert_ne!(paths[0], paths[1]);
        assert!(paths.iter().all(|p| p.exists()));
    }

    #[tokio::test]
    async fn test_driver_error_is_not_an_assertion() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = Scenario::new("G", "no such row").step(Step::StartEdit { index: 7 });

        let result = runner(dir.path()).run_scenario(&scenario).await.unwrap();
        assert!(!result.success);
        assert!(!result.assertion_failure);
    }

    #[tokio::test]
    async fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let scenario = Scenario::new("G", "one")
            .step(Step::add("a"))
            .step(Step::Screenshot { name: "01-one".to_string() });

        let suite = runner.run_all(&[scenario]).await.unwrap();
        assert_eq!((suite.total, suite.passed, suite.failed), (1, 1, 0));

        let path = runner.write_results(&suite).unwrap();
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["passed"], 1);
        assert_eq!(json["results"][0]["screenshots"][0]["name"], "01-one");
        assert!(dir.path().join("screenshots/manifest.json").exists());
    }
}
