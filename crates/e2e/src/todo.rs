//! TodoMVC page object
//!
//! Knows where things are on a TodoMVC page and how a user drives them.
//! Every interaction goes through the [`Page`] it wraps, so the same object
//! works on a real browser and on the simulated app.

use serde::{Deserialize, Serialize};

use crate::error::E2eResult;
use crate::locator::Locator;
use crate::page::{Key, Page};

pub const NEW_TODO_PLACEHOLDER: &str = "What needs to be done?";
pub const TOGGLE_ALL_LABEL: &str = "Mark all as complete";
pub const CLEAR_COMPLETED_LABEL: &str = "Clear completed";
pub const EDIT_BOX_NAME: &str = "Edit";
pub const DELETE_BUTTON_NAME: &str = "Delete";

pub const TODO_ITEM_ID: &str = "todo-item";
pub const TODO_TITLE_ID: &str = "todo-title";
pub const TODO_COUNT_ID: &str = "todo-count";

/// Class carried by completed rows
pub const COMPLETED_CLASS: &str = "completed";
/// Class carried by the active filter link
pub const SELECTED_CLASS: &str = "selected";

/// View filter, selected through the footer links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const EVERY: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    /// Link text in the footer
    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Active => "Active",
            Filter::Completed => "Completed",
        }
    }

    /// Hash route the link points at
    pub fn route(&self) -> &'static str {
        match self {
            Filter::All => "#/",
            Filter::Active => "#/active",
            Filter::Completed => "#/completed",
        }
    }

    /// Filter for the fragment of a URL; unknown routes show everything
    pub fn from_url(url: &str) -> Self {
        match url.split_once('#').map(|(_, frag)| frag.trim_start_matches('/')) {
            Some("active") => Filter::Active,
            Some("completed") => Filter::Completed,
            _ => Filter::All,
        }
    }

    /// Whether an item with this completion state is listed under the filter
    pub fn shows(&self, completed: bool) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !completed,
            Filter::Completed => completed,
        }
    }
}

/// How an inline edit ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditFinish {
    /// Confirm with the Enter key
    Enter,
    /// Confirm by moving focus away
    Blur,
    /// Abort with the Escape key
    Escape,
}

/// Remaining-count label as TodoMVC renders it
pub fn items_left_label(active: usize) -> String {
    if active == 1 {
        "1 item left".to_string()
    } else {
        format!("{} items left", active)
    }
}

pub struct TodoPage<'a, P: Page + ?Sized> {
    page: &'a P,
}

impl<'a, P: Page + ?Sized> TodoPage<'a, P> {
    pub fn new(page: &'a P) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &'a P {
        self.page
    }

    // Locators

    pub fn new_todo(&self) -> Locator {
        Locator::placeholder(NEW_TODO_PLACEHOLDER)
    }

    pub fn items(&self) -> Locator {
        Locator::test_id(TODO_ITEM_ID)
    }

    pub fn item(&self, index: usize) -> Locator {
        self.items().nth(index)
    }

    pub fn titles(&self) -> Locator {
        Locator::test_id(TODO_TITLE_ID)
    }

    pub fn checkbox(&self, index: usize) -> Locator {
        self.item(index).get_by_role("checkbox", None)
    }

    pub fn edit_box(&self, index: usize) -> Locator {
        self.item(index).get_by_role("textbox", Some(EDIT_BOX_NAME))
    }

    pub fn delete_button(&self, index: usize) -> Locator {
        self.item(index).get_by_role("button", Some(DELETE_BUTTON_NAME))
    }

    pub fn count_label(&self) -> Locator {
        Locator::test_id(TODO_COUNT_ID)
    }

    pub fn toggle_all(&self) -> Locator {
        Locator::label(TOGGLE_ALL_LABEL)
    }

    pub fn clear_completed(&self) -> Locator {
        Locator::role("button", Some(CLEAR_COMPLETED_LABEL))
    }

    pub fn filter_link(&self, filter: Filter) -> Locator {
        Locator::role("link", Some(filter.label()))
    }

    // Actions

    /// Type `text` into the entry field and submit it
    pub async fn add_todo(&self, text: &str) -> E2eResult<()> {
        let input = self.new_todo();
        self.page.fill(&input, text).await?;
        self.page.press(&input, Key::Enter).await
    }

    pub async fn add_todos<S: AsRef<str>>(&self, texts: &[S]) -> E2eResult<()> {
        for text in texts {
            self.add_todo(text.as_ref()).await?;
        }
        Ok(())
    }

    pub async fn set_completed(&self, index: usize, completed: bool) -> E2eResult<()> {
        self.page.set_checked(&self.checkbox(index), completed).await
    }

    pub async fn set_all_completed(&self, completed: bool) -> E2eResult<()> {
        self.page.set_checked(&self.toggle_all(), completed).await
    }

    /// Open the inline editor on a row
    pub async fn start_edit(&self, index: usize) -> E2eResult<()> {
        self.page.dblclick(&self.item(index)).await
    }

    /// Replace the text in an open editor and end the edit
    pub async fn finish_edit(&self, index: usize, text: &str, finish: EditFinish) -> E2eResult<()> {
        let edit = self.edit_box(index);
        self.page.fill(&edit, text).await?;
        match finish {
            EditFinish::Enter => self.page.press(&edit, Key::Enter).await,
            EditFinish::Escape => self.page.press(&edit, Key::Escape).await,
            EditFinish::Blur => self.page.blur(&edit).await,
        }
    }

    pub async fn hover_item(&self, index: usize) -> E2eResult<()> {
        self.page.hover(&self.item(index)).await
    }

    /// The delete control only shows on hover, so hover first
    pub async fn delete_item(&self, index: usize) -> E2eResult<()> {
        self.hover_item(index).await?;
        self.page.click(&self.delete_button(index)).await
    }

    pub async fn clear_completed_items(&self) -> E2eResult<()> {
        self.page.click(&self.clear_completed()).await
    }

    pub async fn select_filter(&self, filter: Filter) -> E2eResult<()> {
        self.page.click(&self.filter_link(filter)).await
    }

    pub async fn reload(&self) -> E2eResult<()> {
        self.page.reload().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, "0 items left" ; "none")]
    #[test_case(1, "1 item left" ; "singular")]
    #[test_case(3, "3 items left" ; "plural")]
    fn test_items_left_label(active: usize, expected: &str) {
        assert_eq!(items_left_label(active), expected);
    }

    #[test_case("http://localhost:5173/", Filter::All)]
    #[test_case("http://localhost:5173/#/active", Filter::Active)]
    #[test_case("http://localhost:5173/#/completed", Filter::Completed)]
    #[test_case("http://localhost:5173/#/bogus", Filter::All)]
    fn test_filter_from_url(url: &str, expected: Filter) {
        assert_eq!(Filter::from_url(url), expected);
    }

    #[test]
    fn test_filter_visibility() {
        assert!(Filter::All.shows(true) && Filter::All.shows(false));
        assert!(Filter::Active.shows(false) && !Filter::Active.shows(true));
        assert!(Filter::Completed.shows(true) && !Filter::Completed.shows(false));
    }
}
