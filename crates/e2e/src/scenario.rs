//! Declarative scenario description
//!
//! A scenario is a setup (items to enter after a fresh navigation) followed
//! by an ordered list of steps. Steps are either user actions, expectations
//! about the rendered page, or checkpoint screenshots. The built-in suite is
//! written in Rust, extra scenarios can be dropped in as YAML files:
//!
//! ```yaml
//! name: completing the only item empties the active view
//! group: Routing
//! setup:
//!   items: [walk the dog]
//! steps:
//!   - action: set_completed
//!     index: 0
//!     completed: true
//!   - action: select_filter
//!     filter: active
//!   - action: expect_item_count
//!     count: 0
//!   - action: screenshot
//!     name: 90-active-view-empty
//! ```

use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::artifacts::validate_artifact_name;
use crate::error::{E2eError, E2eResult};
use crate::todo::{EditFinish, Filter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,

    /// Block the scenario belongs to, used for filtering and reporting
    #[serde(default)]
    pub group: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub setup: Setup,

    pub steps: Vec<Step>,
}

/// Starting state: navigate, then enter these items in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setup {
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Type into the entry field and submit
    AddTodo { text: String },

    /// Check or uncheck one row's checkbox
    SetCompleted { index: usize, completed: bool },

    /// Check or uncheck "mark all as complete"
    SetAllCompleted { completed: bool },

    /// Double-click a row to open its editor
    StartEdit { index: usize },

    /// Replace the editor text and end the edit
    Edit {
        index: usize,
        text: String,
        finish: EditFinish,
    },

    HoverItem { index: usize },

    DeleteItem { index: usize },

    ClearCompleted,

    SelectFilter { filter: Filter },

    Reload,

    /// Exact ordered titles (`todo-title`)
    ExpectTitles {
        texts: Vec<String>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Exact ordered row texts (`todo-item`)
    ExpectItems {
        texts: Vec<String>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    ExpectItemCount {
        count: usize,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Presence or absence of the completed marker on one row
    ExpectCompleted { index: usize, completed: bool },

    /// Presence or absence of the completed marker on every row; there must
    /// be at least one row, and exactly `rows` when given
    ExpectAllCompleted {
        completed: bool,
        #[serde(default)]
        rows: Option<usize>,
    },

    /// Exact remaining-count label
    ExpectCountLabel { text: String },

    ExpectCountContains { text: String },

    ExpectClearCompletedVisible { visible: bool },

    /// The filter's link is selected and the others are not
    ExpectFilterSelected { filter: Filter },

    ExpectEntryEmpty,

    ExpectEditValue { index: usize, text: String },

    /// Full-page checkpoint screenshot, stored as `<name>.png`
    Screenshot { name: String },
}

impl Step {
    pub fn add(text: impl Into<String>) -> Self {
        Step::AddTodo { text: text.into() }
    }

    pub fn titles<S: AsRef<str>>(texts: &[S]) -> Self {
        Step::ExpectTitles {
            texts: to_strings(texts),
            timeout_ms: None,
        }
    }

    pub fn items<S: AsRef<str>>(texts: &[S]) -> Self {
        Step::ExpectItems {
            texts: to_strings(texts),
            timeout_ms: None,
        }
    }

    pub fn item_count(count: usize) -> Self {
        Step::ExpectItemCount { count, timeout_ms: None }
    }

    pub fn completed(index: usize, completed: bool) -> Self {
        Step::ExpectCompleted { index, completed }
    }

    pub fn all_completed(completed: bool, rows: usize) -> Self {
        Step::ExpectAllCompleted { completed, rows: Some(rows) }
    }

    /// Short label used in logs and reports
    pub fn name(&self) -> String {
        match self {
            Step::AddTodo { text } => format!("add_todo:{}", text),
            Step::SetCompleted { index, completed } => format!("set_completed:{}={}", index, completed),
            Step::SetAllCompleted { completed } => format!("set_all_completed:{}", completed),
            Step::StartEdit { index } => format!("start_edit:{}", index),
            Step::Edit { index, finish, .. } => format!("edit:{}:{:?}", index, finish),
            Step::HoverItem { index } => format!("hover_item:{}", index),
            Step::DeleteItem { index } => format!("delete_item:{}", index),
            Step::ClearCompleted => "clear_completed".to_string(),
            Step::SelectFilter { filter } => format!("select_filter:{}", filter.label()),
            Step::Reload => "reload".to_string(),
            Step::ExpectTitles { texts, .. } => format!("expect_titles:{}", texts.len()),
            Step::ExpectItems { texts, .. } => format!("expect_items:{}", texts.len()),
            Step::ExpectItemCount { count, .. } => format!("expect_item_count:{}", count),
            Step::ExpectCompleted { index, completed } => format!("expect_completed:{}={}", index, completed),
            Step::ExpectAllCompleted { completed, rows: Some(n) } => {
                format!("expect_all_completed:{}x{}", completed, n)
            }
            Step::ExpectAllCompleted { completed, rows: None } => format!("expect_all_completed:{}", completed),
            Step::ExpectCountLabel { text } => format!("expect_count_label:{}", text),
            Step::ExpectCountContains { text } => format!("expect_count_contains:{}", text),
            Step::ExpectClearCompletedVisible { visible } => {
                format!("expect_clear_completed_visible:{}", visible)
            }
            Step::ExpectFilterSelected { filter } => format!("expect_filter_selected:{}", filter.label()),
            Step::ExpectEntryEmpty => "expect_entry_empty".to_string(),
            Step::ExpectEditValue { index, .. } => format!("expect_edit_value:{}", index),
            Step::Screenshot { name } => format!("screenshot:{}", name),
        }
    }
}

fn to_strings<S: AsRef<str>>(texts: &[S]) -> Vec<String> {
    texts.iter().map(|s| s.as_ref().to_string()).collect()
}

impl Scenario {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            description: String::new(),
            setup: Setup::default(),
            steps: Vec::new(),
        }
    }

    /// Enter these items right after navigating
    pub fn with_items<S: AsRef<str>>(mut self, items: &[S]) -> Self {
        self.setup.items = to_strings(items);
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// `group > name`, or just the name for ungrouped scenarios
    pub fn full_name(&self) -> String {
        if self.group.is_empty() {
            self.name.clone()
        } else {
            format!("{} > {}", self.group, self.name)
        }
    }

    /// Names of the checkpoint screenshots in step order
    pub fn checkpoints(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                Step::Screenshot { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let scenario: Self = serde_yaml::from_str(yaml)?;
        if scenario.name.trim().is_empty() {
            return Err(E2eError::ScenarioParse("scenario name is empty".to_string()));
        }
        for name in scenario.checkpoints() {
            validate_artifact_name(name)?;
        }
        Ok(scenario)
    }

    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::ScenarioParse(format!("{}: {}", path.display(), e)))
    }

    /// Load every `.yaml`/`.yml` scenario under `dir`, in path order
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut scenarios = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_type().is_file()
                    && e.path()
                        .extension()
                        .map(|ext| ext == "yaml" || ext == "yml")
                        .unwrap_or(false)
            })
        {
            scenarios.push(Self::from_file(entry.path())?);
        }

        Ok(scenarios)
    }

    pub fn filter_by_group<'a>(scenarios: &'a [Self], group: &str) -> Vec<&'a Self> {
        scenarios.iter().filter(|s| s.group == group).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
name: editing keeps neighbours
group: Editing
setup:
  items: [a, b, c]
steps:
  - action: start_edit
    index: 1
  - action: edit
    index: 1
    text: "  b2  "
    finish: enter
  - action: expect_titles
    texts: [a, b2, c]
    timeout_ms: 1000
  - action: select_filter
    filter: completed
  - action: screenshot
    name: 90-after-edit
"#;

    #[test]
    fn test_parse_yaml_scenario() {
        let scenario = Scenario::from_yaml(YAML).unwrap();
        assert_eq!(scenario.full_name(), "Editing > editing keeps neighbours");
        assert_eq!(scenario.setup.items, vec!["a", "b", "c"]);
        assert_eq!(
            scenario.steps[1],
            Step::Edit {
                index: 1,
                text: "  b2  ".to_string(),
                finish: EditFinish::Enter,
            }
        );
        assert_eq!(
            scenario.steps[3],
            Step::SelectFilter { filter: Filter::Completed }
        );
        assert_eq!(scenario.checkpoints(), vec!["90-after-edit"]);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let yaml = "name: x\nsteps:\n  - action: teleport\n";
        assert!(Scenario::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let err = Scenario::from_yaml("name: ' '\nsteps: []\n").unwrap_err();
        assert!(matches!(err, E2eError::ScenarioParse(_)));
    }

    #[test]
    fn test_load_all_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.yaml"), "name: second\ngroup: G\nsteps: []\n").unwrap();
        std::fs::write(dir.path().join("a.yml"), "name: first\nsteps: []\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let all = Scenario::load_all(dir.path()).unwrap();
        let names: Vec<_> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);

        let grouped = Scenario::filter_by_group(&all, "G");
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].name, "second");
    }

    #[test]
    fn test_checkpoint_outside_output_is_rejected() {
        let yaml = "name: x\nsteps:\n  - action: screenshot\n    name: ../escape\n";
        let err = Scenario::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, E2eError::InvalidArtifactName(_)), "{}", err);
    }

    #[test]
    fn test_all_completed_row_count_is_optional() {
        let yaml = "name: x\nsteps:\n  - action: expect_all_completed\n    completed: true\n  - action: expect_all_completed\n    completed: false\n    rows: 3\n";
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.steps[0], Step::ExpectAllCompleted { completed: true, rows: None });
        assert_eq!(scenario.steps[1], Step::all_completed(false, 3));
    }

    #[test]
    fn test_step_names() {
        assert_eq!(Step::add("milk").name(), "add_todo:milk");
        assert_eq!(
            Step::SelectFilter { filter: Filter::Active }.name(),
            "select_filter:Active"
        );
    }
}
