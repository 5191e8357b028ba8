//! Built-in TodoMVC scenarios
//!
//! Checkpoint screenshots are numbered in suite order, `01` through `31`.
//! The last group holds two scenarios that always fail: they exist to
//! exercise failure reporting and failure screenshots, not the app.

use crate::artifacts::checkpoint_name;
use crate::scenario::{Scenario, Step};
use crate::todo::{items_left_label, EditFinish, Filter};

/// Labels entered by most scenarios
pub const TODO_ITEMS: [&str; 3] = ["buy some cheese", "feed the cat", "book a doctor's appointment"];

/// Bound for the intentionally failing expectations
pub const FAILING_TIMEOUT_MS: u64 = 2000;

pub const GROUP_NEW_TODO: &str = "New Todo";
pub const GROUP_MARK_ALL: &str = "Mark all as completed";
pub const GROUP_ITEM: &str = "Item";
pub const GROUP_EDITING: &str = "Editing";
pub const GROUP_COUNTER: &str = "Counter";
pub const GROUP_CLEAR_COMPLETED: &str = "Clear completed button";
pub const GROUP_PERSISTENCE: &str = "Persistence";
pub const GROUP_ROUTING: &str = "Routing";
pub const GROUP_DELETE: &str = "Delete Item";
pub const GROUP_INTENTIONAL_FAILURES: &str = "Failing Scenarios (Intentional)";

const EDITED: &str = "buy some sausages";

/// Hands out sequential checkpoint steps
struct Checkpoints {
    next: usize,
}

impl Checkpoints {
    fn new() -> Self {
        Self { next: 1 }
    }

    fn shot(&mut self, purpose: &str) -> Step {
        let name = checkpoint_name(self.next, purpose);
        self.next += 1;
        Step::Screenshot { name }
    }
}

fn without_middle() -> [&'static str; 2] {
    [TODO_ITEMS[0], TODO_ITEMS[2]]
}

fn middle_edited() -> [&'static str; 3] {
    [TODO_ITEMS[0], EDITED, TODO_ITEMS[2]]
}

/// Every built-in scenario in suite order
pub fn builtin() -> Vec<Scenario> {
    let mut cp = Checkpoints::new();
    let mut scenarios = Vec::new();

    // New Todo
    scenarios.push(
        Scenario::new(GROUP_NEW_TODO, "should allow me to add todo items").steps([
            Step::add(TODO_ITEMS[0]),
            Step::titles(&[TODO_ITEMS[0]]),
            cp.shot("first-todo-added"),
            Step::add(TODO_ITEMS[1]),
            Step::titles(&TODO_ITEMS[..2]),
            cp.shot("two-todos-added"),
        ]),
    );
    scenarios.push(
        Scenario::new(GROUP_NEW_TODO, "should clear text input field when an item is added").steps([
            Step::add(TODO_ITEMS[0]),
            Step::ExpectEntryEmpty,
            cp.shot("input-cleared-after-add"),
        ]),
    );
    scenarios.push(
        Scenario::new(GROUP_NEW_TODO, "should append new items to the bottom of the list")
            .steps(TODO_ITEMS.iter().map(|t| Step::add(*t)))
            .steps([
                Step::ExpectCountLabel { text: items_left_label(3) },
                Step::titles(&TODO_ITEMS),
                cp.shot("three-todos-in-order"),
            ]),
    );

    // Mark all as completed
    scenarios.push(
        Scenario::new(GROUP_MARK_ALL, "should allow me to mark all items as completed")
            .with_items(&TODO_ITEMS)
            .steps([
                Step::SetAllCompleted { completed: true },
                Step::all_completed(true, TODO_ITEMS.len()),
                cp.shot("all-marked-completed"),
            ]),
    );
    scenarios.push(
        Scenario::new(GROUP_MARK_ALL, "should allow me to clear the complete state of all items")
            .with_items(&TODO_ITEMS)
            .steps([
                Step::SetAllCompleted { completed: true },
                Step::SetAllCompleted { completed: false },
                Step::all_completed(false, TODO_ITEMS.len()),
                cp.shot("all-unmarked"),
            ]),
    );

    // Item
    scenarios.push(
        Scenario::new(GROUP_ITEM, "should allow me to mark items as complete").steps([
            Step::add(TODO_ITEMS[0]),
            Step::add(TODO_ITEMS[1]),
            Step::SetCompleted { index: 0, completed: true },
            Step::completed(0, true),
            Step::completed(1, false),
            cp.shot("first-item-completed"),
            Step::SetCompleted { index: 1, completed: true },
            Step::completed(1, true),
            cp.shot("both-items-completed"),
        ]),
    );
    scenarios.push(
        Scenario::new(GROUP_ITEM, "should allow me to un-mark items as complete").steps([
            Step::add(TODO_ITEMS[0]),
            Step::add(TODO_ITEMS[1]),
            Step::SetCompleted { index: 0, completed: true },
            Step::completed(0, true),
            Step::SetCompleted { index: 0, completed: false },
            Step::completed(0, false),
            cp.shot("item-uncompleted"),
        ]),
    );
    scenarios.push(
        Scenario::new(GROUP_ITEM, "should allow me to edit an item")
            .steps(TODO_ITEMS.iter().map(|t| Step::add(*t)))
            .steps([
                Step::StartEdit { index: 1 },
                Step::ExpectEditValue { index: 1, text: TODO_ITEMS[1].to_string() },
                cp.shot("editing-item"),
                Step::Edit { index: 1, text: EDITED.to_string(), finish: EditFinish::Enter },
                Step::items(&middle_edited()),
                cp.shot("item-edited"),
            ]),
    );

    // Editing
    scenarios.push(
        Scenario::new(GROUP_EDITING, "should save edits on blur")
            .with_items(&TODO_ITEMS)
            .steps([
                Step::StartEdit { index: 1 },
                Step::Edit { index: 1, text: EDITED.to_string(), finish: EditFinish::Blur },
                Step::items(&middle_edited()),
                cp.shot("edit-saved-on-blur"),
            ]),
    );
    scenarios.push(
        Scenario::new(GROUP_EDITING, "should trim entered text")
            .with_items(&TODO_ITEMS)
            .steps([
                Step::StartEdit { index: 1 },
                Step::Edit {
                    index: 1,
                    text: format!("    {}    ", EDITED),
                    finish: EditFinish::Enter,
                },
                Step::items(&middle_edited()),
                cp.shot("trimmed-text"),
            ]),
    );
    scenarios.push(
        Scenario::new(GROUP_EDITING, "should remove the item if an empty text string was entered")
            .with_items(&TODO_ITEMS)
            .steps([
                Step::StartEdit { index: 1 },
                Step::Edit { index: 1, text: String::new(), finish: EditFinish::Enter },
                Step::items(&without_middle()),
                cp.shot("item-removed-empty-text"),
            ]),
    );
    scenarios.push(
        Scenario::new(GROUP_EDITING, "should cancel edits on escape")
            .with_items(&TODO_ITEMS)
            .steps([
                Step::StartEdit { index: 1 },
                Step::Edit { index: 1, text: EDITED.to_string(), finish: EditFinish::Escape },
                Step::items(&TODO_ITEMS),
                cp.shot("edit-cancelled"),
            ]),
    );

    // Counter
    scenarios.push(
        Scenario::new(GROUP_COUNTER, "should display the current number of todo items").steps([
            Step::add(TODO_ITEMS[0]),
            Step::ExpectCountContains { text: "1".to_string() },
            cp.shot("counter-one-item"),
            Step::add(TODO_ITEMS[1]),
            Step::ExpectCountContains { text: "2".to_string() },
            cp.shot("counter-two-items"),
        ]),
    );

    // Clear completed button
    scenarios.push(
        Scenario::new(GROUP_CLEAR_COMPLETED, "should display the correct text")
            .with_items(&TODO_ITEMS)
            .steps([
                Step::SetCompleted { index: 0, completed: true },
                Step::ExpectClearCompletedVisible { visible: true },
                cp.shot("clear-completed-button-visible"),
            ]),
    );
    scenarios.push(
        Scenario::new(GROUP_CLEAR_COMPLETED, "should remove completed items when clicked")
            .with_items(&TODO_ITEMS)
            .steps([
                Step::SetCompleted { index: 1, completed: true },
                Step::ClearCompleted,
                Step::item_count(2),
                Step::items(&without_middle()),
                cp.shot("completed-cleared"),
            ]),
    );
    scenarios.push(
        Scenario::new(
            GROUP_CLEAR_COMPLETED,
            "should be hidden when there are no items that are completed",
        )
        .with_items(&TODO_ITEMS)
        .steps([
            Step::SetCompleted { index: 0, completed: true },
            Step::ClearCompleted,
            Step::ExpectClearCompletedVisible { visible: false },
            cp.shot("clear-button-hidden"),
        ]),
    );

    // Persistence
    let persisted_state = || {
        [
            Step::items(&TODO_ITEMS[..2]),
            Step::completed(0, true),
            Step::completed(1, false),
        ]
    };
    scenarios.push(
        Scenario::new(GROUP_PERSISTENCE, "should persist its data")
            .steps([
                Step::add(TODO_ITEMS[0]),
                Step::add(TODO_ITEMS[1]),
                Step::SetCompleted { index: 0, completed: true },
            ])
            .steps(persisted_state())
            .step(cp.shot("before-reload"))
            .step(Step::Reload)
            .steps(persisted_state())
            .step(cp.shot("after-reload-persisted")),
    );

    // Routing
    scenarios.push(
        Scenario::new(GROUP_ROUTING, "should allow me to display active items")
            .with_items(&TODO_ITEMS)
            .steps([
                Step::SetCompleted { index: 1, completed: true },
                Step::SelectFilter { filter: Filter::Active },
                Step::item_count(2),
                Step::items(&without_middle()),
                cp.shot("active-filter"),
            ]),
    );
    scenarios.push(
        Scenario::new(GROUP_ROUTING, "should allow me to display completed items")
            .with_items(&TODO_ITEMS)
            .steps([
                Step::SetCompleted { index: 1, completed: true },
                Step::SelectFilter { filter: Filter::Completed },
                Step::item_count(1),
                Step::items(&[TODO_ITEMS[1]]),
                cp.shot("completed-filter"),
            ]),
    );
    scenarios.push(
        Scenario::new(GROUP_ROUTING, "should allow me to display all items")
            .with_items(&TODO_ITEMS)
            .steps([
                Step::SetCompleted { index: 1, completed: true },
                Step::SelectFilter { filter: Filter::Active },
                Step::SelectFilter { filter: Filter::Completed },
                Step::SelectFilter { filter: Filter::All },
                Step::item_count(3),
                cp.shot("all-filter"),
            ]),
    );
    scenarios.push(
        Scenario::new(GROUP_ROUTING, "should highlight the currently applied filter")
            .with_items(&TODO_ITEMS)
            .steps([
                Step::ExpectFilterSelected { filter: Filter::All },
                Step::SelectFilter { filter: Filter::Active },
                Step::ExpectFilterSelected { filter: Filter::Active },
                cp.shot("active-filter-highlighted"),
                Step::SelectFilter { filter: Filter::Completed },
                Step::ExpectFilterSelected { filter: Filter::Completed },
                cp.shot("completed-filter-highlighted"),
            ]),
    );

    // Delete Item
    scenarios.push(
        Scenario::new(GROUP_DELETE, "should allow me to delete a todo item")
            .steps(TODO_ITEMS.iter().map(|t| Step::add(*t)))
            .steps([
                Step::HoverItem { index: 1 },
                cp.shot("hover-to-show-delete"),
                Step::DeleteItem { index: 1 },
                Step::item_count(2),
                Step::items(&without_middle()),
                cp.shot("item-deleted"),
            ]),
    );

    // Failing Scenarios (Intentional)
    scenarios.push(
        Scenario::new(
            GROUP_INTENTIONAL_FAILURES,
            "should fail - verify non-existent element exists",
        )
        .steps([
            Step::add(TODO_ITEMS[0]),
            cp.shot("before-failing-check"),
            Step::ExpectTitles {
                texts: vec!["non-existent todo item".to_string()],
                timeout_ms: Some(FAILING_TIMEOUT_MS),
            },
        ]),
    );
    scenarios.push(
        Scenario::new(GROUP_INTENTIONAL_FAILURES, "should fail - verify wrong item count").steps([
            Step::add(TODO_ITEMS[0]),
            cp.shot("before-wrong-count-check"),
            Step::ExpectItemCount {
                count: 5,
                timeout_ms: Some(FAILING_TIMEOUT_MS),
            },
        ]),
    );

    scenarios
}
