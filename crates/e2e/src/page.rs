//! Automation client interface
//!
//! Scenarios only ever talk to a [`Page`]. Drivers implement [`Browser`] to
//! hand out isolated pages: a real browser through Playwright, or the
//! in-memory TodoMVC model in [`crate::simulated`].
//!
//! Actions return once their direct effect has been applied. Queries return
//! the state at the moment of the call; waiting for a state is the job of
//! [`crate::expect`].

use std::path::Path;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::E2eResult;
use crate::locator::Locator;

/// Keys scenarios press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Enter,
    Escape,
}

impl Key {
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Enter => "Enter",
            Key::Escape => "Escape",
        }
    }
}

/// Source of isolated pages; each scenario gets its own
#[async_trait]
pub trait Browser: Send + Sync {
    type Page: Page;

    async fn new_page(&self) -> E2eResult<Self::Page>;
}

#[async_trait]
pub trait Page: Send + Sync {
    async fn goto(&self, url: &str) -> E2eResult<()>;
    async fn reload(&self) -> E2eResult<()>;

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()>;
    async fn press(&self, locator: &Locator, key: Key) -> E2eResult<()>;
    async fn click(&self, locator: &Locator) -> E2eResult<()>;
    async fn dblclick(&self, locator: &Locator) -> E2eResult<()>;
    async fn hover(&self, locator: &Locator) -> E2eResult<()>;
    async fn blur(&self, locator: &Locator) -> E2eResult<()>;

    /// Check or uncheck a checkbox; a no-op when it is already in that state
    async fn set_checked(&self, locator: &Locator, checked: bool) -> E2eResult<()>;

    /// Text content of every matched element, in document order
    async fn texts(&self, locator: &Locator) -> E2eResult<Vec<String>>;

    async fn count(&self, locator: &Locator) -> E2eResult<usize>;

    /// `class` attribute of every matched element, in document order
    async fn class_names(&self, locator: &Locator) -> E2eResult<Vec<String>>;

    /// Value of the matched input; more than one match is an error
    async fn input_value(&self, locator: &Locator) -> E2eResult<String>;

    /// Whether the matched element is visible; false when nothing matches,
    /// an error when more than one element does
    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool>;

    async fn screenshot(&self, path: &Path, full_page: bool) -> E2eResult<()>;

    async fn close(&self) -> E2eResult<()>;
}
