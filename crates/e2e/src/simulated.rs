//! In-memory TodoMVC application
//!
//! A driver that models the TodoMVC page instead of rendering it. Locators
//! are resolved against a small virtual element tree built from the model,
//! with the same matching rules a browser driver applies (test ids, roles
//! with case-insensitive name substrings, labels, placeholders, `nth`,
//! strict single-element actions).
//!
//! Each page owns its own storage, which survives `reload` and `goto` on
//! that page only. Screenshots are rendered as simple PNG wireframes.

use std::path::Path;
use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::locator::{Locator, Selector};
use crate::page::{Browser, Key, Page};
use crate::todo::{
    items_left_label, Filter, CLEAR_COMPLETED_LABEL, COMPLETED_CLASS, DELETE_BUTTON_NAME,
    EDIT_BOX_NAME, NEW_TODO_PLACEHOLDER, SELECTED_CLASS, TODO_COUNT_ID, TODO_ITEM_ID,
    TODO_TITLE_ID, TOGGLE_ALL_LABEL,
};

const TOGGLE_LABEL: &str = "Toggle Todo";

const ROW_HEIGHT: u32 = 40;
const CANVAS_WIDTH: u32 = 480;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Todo {
    title: String,
    completed: bool,
}

#[derive(Debug, Clone)]
struct Editing {
    index: usize,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    NewTodo,
    ToggleAll,
    Item(usize),
    Checkbox(usize),
    Title(usize),
    Destroy(usize),
    EditBox(usize),
    Count,
    FilterLink(Filter),
    ClearCompleted,
}

#[derive(Debug, Default)]
struct AppState {
    url: Option<String>,
    todos: Vec<Todo>,
    stored: Vec<Todo>,
    route: Filter,
    new_todo: String,
    editing: Option<Editing>,
    hovered: Option<usize>,
}

impl AppState {
    fn ensure_loaded(&self) -> E2eResult<()> {
        if self.url.is_none() {
            return Err(E2eError::Driver("page has not been navigated".to_string()));
        }
        Ok(())
    }

    fn persist(&mut self) {
        self.stored = self.todos.clone();
    }

    fn load(&mut self) {
        self.todos = self.stored.clone();
        self.new_todo.clear();
        self.editing = None;
        self.hovered = None;
    }

    fn active_count(&self) -> usize {
        self.todos.iter().filter(|t| !t.completed).count()
    }

    fn visible_indices(&self) -> Vec<usize> {
        self.todos
            .iter()
            .enumerate()
            .filter(|(_, t)| self.route.shows(t.completed))
            .map(|(i, _)| i)
            .collect()
    }

    fn row_children(&self, index: usize) -> Vec<Element> {
        let mut children = vec![Element::Checkbox(index), Element::Title(index), Element::Destroy(index)];
        if self.editing.as_ref().map(|e| e.index) == Some(index) {
            children.push(Element::EditBox(index));
        }
        children
    }

    /// Every element on the page in document order
    fn document(&self) -> Vec<Element> {
        let mut elements = vec![Element::NewTodo];
        if self.todos.is_empty() {
            return elements;
        }

        elements.push(Element::ToggleAll);
        for index in self.visible_indices() {
            elements.push(Element::Item(index));
            elements.extend(self.row_children(index));
        }
        elements.push(Element::Count);
        elements.extend(Filter::EVERY.iter().map(|f| Element::FilterLink(*f)));
        if self.todos.iter().any(|t| t.completed) {
            elements.push(Element::ClearCompleted);
        }
        elements
    }

    fn descendants(&self, scope: Option<Element>) -> Vec<Element> {
        match scope {
            None => self.document(),
            Some(Element::Item(index)) => self.row_children(index),
            Some(_) => Vec::new(),
        }
    }

    fn test_id(&self, element: Element) -> Option<&'static str> {
        match element {
            Element::Item(_) => Some(TODO_ITEM_ID),
            Element::Title(_) => Some(TODO_TITLE_ID),
            Element::Count => Some(TODO_COUNT_ID),
            _ => None,
        }
    }

    fn role(&self, element: Element) -> Option<&'static str> {
        match element {
            Element::NewTodo | Element::EditBox(_) => Some("textbox"),
            Element::ToggleAll | Element::Checkbox(_) => Some("checkbox"),
            Element::Item(_) => Some("listitem"),
            Element::Destroy(_) | Element::ClearCompleted => Some("button"),
            Element::FilterLink(_) => Some("link"),
            Element::Title(_) | Element::Count => None,
        }
    }

    fn accessible_name(&self, element: Element) -> String {
        match element {
            Element::NewTodo => NEW_TODO_PLACEHOLDER.to_string(),
            Element::ToggleAll => TOGGLE_ALL_LABEL.to_string(),
            Element::Checkbox(_) => TOGGLE_LABEL.to_string(),
            Element::EditBox(_) => EDIT_BOX_NAME.to_string(),
            Element::Destroy(_) => DELETE_BUTTON_NAME.to_string(),
            Element::ClearCompleted => CLEAR_COMPLETED_LABEL.to_string(),
            Element::FilterLink(f) => f.label().to_string(),
            _ => self.text(element),
        }
    }

    fn label(&self, element: Element) -> Option<&'static str> {
        match element {
            Element::ToggleAll => Some(TOGGLE_ALL_LABEL),
            Element::Checkbox(_) => Some(TOGGLE_LABEL),
            Element::EditBox(_) => Some(EDIT_BOX_NAME),
            _ => None,
        }
    }

    fn matches(&self, element: Element, selector: &Selector) -> E2eResult<bool> {
        Ok(match selector {
            Selector::Placeholder { text } => {
                element == Element::NewTodo && name_matches(NEW_TODO_PLACEHOLDER, text)
            }
            Selector::TestId { id } => self.test_id(element) == Some(id.as_str()),
            Selector::Role { role, name } => {
                self.role(element) == Some(role.as_str())
                    && name
                        .as_deref()
                        .map(|n| name_matches(&self.accessible_name(element), n))
                        .unwrap_or(true)
            }
            Selector::Label { text } => self
                .label(element)
                .map(|l| name_matches(l, text))
                .unwrap_or(false),
            Selector::Css { selector } => {
                return Err(E2eError::Driver(format!(
                    "css selector '{}' is not supported by the simulated page",
                    selector
                )))
            }
        })
    }

    fn resolve(&self, locator: &Locator) -> E2eResult<Vec<Element>> {
        let mut scopes: Vec<Option<Element>> = vec![None];
        for segment in locator.segments() {
            let mut found = Vec::new();
            for scope in &scopes {
                for element in self.descendants(*scope) {
                    if self.matches(element, &segment.selector)? && !found.contains(&element) {
                        found.push(element);
                    }
                }
            }
            if let Some(n) = segment.nth {
                found = found.get(n).copied().into_iter().collect();
            }
            scopes = found.into_iter().map(Some).collect();
        }
        Ok(scopes.into_iter().flatten().collect())
    }

    /// Actions need exactly one target
    fn single(&self, locator: &Locator) -> E2eResult<Element> {
        let elements = self.resolve(locator)?;
        match elements.as_slice() {
            [element] => Ok(*element),
            [] => Err(E2eError::Driver(format!("no element matches {}", locator))),
            many => Err(E2eError::Driver(format!(
                "strict mode violation: {} resolved to {} elements",
                locator,
                many.len()
            ))),
        }
    }

    fn text(&self, element: Element) -> String {
        match element {
            Element::Item(i) | Element::Title(i) => {
                self.todos.get(i).map(|t| t.title.clone()).unwrap_or_default()
            }
            Element::Count => items_left_label(self.active_count()),
            Element::FilterLink(f) => f.label().to_string(),
            Element::ClearCompleted => CLEAR_COMPLETED_LABEL.to_string(),
            _ => String::new(),
        }
    }

    fn class_name(&self, element: Element) -> String {
        match element {
            Element::Item(i) => {
                let mut classes = Vec::new();
                if self.todos.get(i).map(|t| t.completed).unwrap_or(false) {
                    classes.push(COMPLETED_CLASS);
                }
                if self.editing.as_ref().map(|e| e.index) == Some(i) {
                    classes.push("editing");
                }
                classes.join(" ")
            }
            Element::FilterLink(f) if f == self.route => SELECTED_CLASS.to_string(),
            Element::FilterLink(_) | Element::Title(_) => String::new(),
            Element::NewTodo => "new-todo".to_string(),
            Element::ToggleAll => "toggle-all".to_string(),
            Element::Checkbox(_) => "toggle".to_string(),
            Element::Destroy(_) => "destroy".to_string(),
            Element::EditBox(_) => "edit".to_string(),
            Element::Count => "todo-count".to_string(),
            Element::ClearCompleted => "clear-completed".to_string(),
        }
    }

    fn is_visible(&self, element: Element) -> bool {
        let editing = self.editing.as_ref().map(|e| e.index);
        match element {
            Element::Destroy(i) => self.hovered == Some(i) && editing != Some(i),
            Element::Title(i) | Element::Checkbox(i) => editing != Some(i),
            _ => true,
        }
    }

    fn commit_edit(&mut self) {
        let Some(edit) = self.editing.take() else {
            return;
        };
        let title = edit.value.trim();
        if title.is_empty() {
            self.remove(edit.index);
        } else if let Some(todo) = self.todos.get_mut(edit.index) {
            todo.title = title.to_string();
        }
        self.persist();
    }

    fn remove(&mut self, index: usize) {
        if index < self.todos.len() {
            self.todos.remove(index);
        }
        self.hovered = None;
        self.editing = None;
    }

    fn click(&mut self, element: Element) -> E2eResult<()> {
        if !self.is_visible(element) {
            return Err(E2eError::Driver(format!("element {:?} is not visible", element)));
        }
        if !matches!(element, Element::EditBox(_)) {
            self.commit_edit();
        }

        match element {
            Element::Checkbox(i) => {
                if let Some(todo) = self.todos.get_mut(i) {
                    todo.completed = !todo.completed;
                }
            }
            Element::ToggleAll => {
                let all = self.todos.iter().all(|t| t.completed);
                self.todos.iter_mut().for_each(|t| t.completed = !all);
            }
            Element::Destroy(i) => self.remove(i),
            Element::ClearCompleted => {
                self.todos.retain(|t| !t.completed);
                self.hovered = None;
            }
            Element::FilterLink(f) => {
                self.route = f;
                if let Some(url) = self.url.as_mut() {
                    let base = url.split('#').next().unwrap_or_default().to_string();
                    *url = format!("{}{}", base, f.route());
                }
            }
            _ => {}
        }
        self.persist();
        Ok(())
    }

    fn set_checked(&mut self, element: Element, checked: bool) -> E2eResult<()> {
        match element {
            Element::Checkbox(i) => {
                self.commit_edit();
                if let Some(todo) = self.todos.get_mut(i) {
                    todo.completed = checked;
                }
            }
            Element::ToggleAll => {
                self.commit_edit();
                self.todos.iter_mut().for_each(|t| t.completed = checked);
            }
            other => {
                return Err(E2eError::Driver(format!("element {:?} is not a checkbox", other)))
            }
        }
        self.persist();
        Ok(())
    }

    fn press(&mut self, element: Element, key: Key) -> E2eResult<()> {
        match (element, key) {
            (Element::NewTodo, Key::Enter) => {
                let title = self.new_todo.trim().to_string();
                if !title.is_empty() {
                    self.todos.push(Todo { title, completed: false });
                    self.new_todo.clear();
                    self.persist();
                }
            }
            (Element::EditBox(_), Key::Enter) => self.commit_edit(),
            (Element::EditBox(_), Key::Escape) => self.editing = None,
            _ => {}
        }
        Ok(())
    }

    fn fill(&mut self, element: Element, value: &str) -> E2eResult<()> {
        match element {
            Element::NewTodo => self.new_todo = value.to_string(),
            Element::EditBox(_) => {
                if let Some(edit) = self.editing.as_mut() {
                    edit.value = value.to_string();
                }
            }
            other => {
                return Err(E2eError::Driver(format!("element {:?} is not an input", other)))
            }
        }
        Ok(())
    }

    fn input_value(&self, element: Element) -> E2eResult<String> {
        match element {
            Element::NewTodo => Ok(self.new_todo.clone()),
            Element::EditBox(_) => Ok(self.editing.as_ref().map(|e| e.value.clone()).unwrap_or_default()),
            Element::Checkbox(_) | Element::ToggleAll => Ok("on".to_string()),
            other => Err(E2eError::Driver(format!("element {:?} is not an input", other))),
        }
    }

    fn render(&self) -> RgbaImage {
        let rows = 1 + self.visible_indices().len() as u32 + u32::from(!self.todos.is_empty());
        let mut img = RgbaImage::from_pixel(CANVAS_WIDTH, rows * ROW_HEIGHT, Rgba([245, 245, 245, 255]));

        fill_rect(&mut img, 0, 0, CANVAS_WIDTH, ROW_HEIGHT, Rgba([255, 255, 255, 255]));
        let typed = (self.new_todo.chars().count() as u32 * 8).min(CANVAS_WIDTH - 60);
        fill_rect(&mut img, 50, 16, typed, 8, Rgba([200, 200, 200, 255]));

        for (row, index) in self.visible_indices().into_iter().enumerate() {
            let y = (row as u32 + 1) * ROW_HEIGHT;
            let todo = &self.todos[index];
            let editing = self.editing.as_ref().map(|e| e.index) == Some(index);
            let background = if editing {
                Rgba([255, 250, 220, 255])
            } else if self.hovered == Some(index) {
                Rgba([250, 250, 250, 255])
            } else {
                Rgba([255, 255, 255, 255])
            };
            fill_rect(&mut img, 0, y + 1, CANVAS_WIDTH, ROW_HEIGHT - 1, background);

            let check = if todo.completed { Rgba([93, 194, 175, 255]) } else { Rgba([220, 220, 220, 255]) };
            fill_rect(&mut img, 12, y + 10, 20, 20, check);

            let width = (todo.title.chars().count() as u32 * 8).min(CANVAS_WIDTH - 100);
            let ink = if todo.completed { Rgba([205, 205, 205, 255]) } else { Rgba([72, 72, 72, 255]) };
            fill_rect(&mut img, 50, y + 16, width, 8, ink);

            if self.hovered == Some(index) {
                fill_rect(&mut img, CANVAS_WIDTH - 34, y + 12, 16, 16, Rgba([175, 91, 94, 255]));
            }
        }

        if !self.todos.is_empty() {
            let y = rows.saturating_sub(1) * ROW_HEIGHT;
            let counter = (self.active_count() as u32 * 6 + 20).min(80);
            fill_rect(&mut img, 12, y + 16, counter, 8, Rgba([119, 119, 119, 255]));
            for (i, filter) in Filter::EVERY.iter().enumerate() {
                let x = 150 + i as u32 * 70;
                let color = if *filter == self.route { Rgba([206, 70, 70, 255]) } else { Rgba([230, 230, 230, 255]) };
                fill_rect(&mut img, x, y + 10, 60, 20, color);
            }
            if self.todos.iter().any(|t| t.completed) {
                fill_rect(&mut img, CANVAS_WIDTH - 100, y + 16, 88, 8, Rgba([119, 119, 119, 255]));
            }
        }
        img
    }
}

fn name_matches(actual: &str, wanted: &str) -> bool {
    actual.to_lowercase().contains(&wanted.to_lowercase())
}

fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
    for py in y..(y + height).min(img.height()) {
        for px in x..(x + width).min(img.width()) {
            img.put_pixel(px, py, color);
        }
    }
}

/// Hands out independent simulated pages
#[derive(Debug, Default, Clone)]
pub struct SimulatedBrowser;

impl SimulatedBrowser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Browser for SimulatedBrowser {
    type Page = SimulatedPage;

    async fn new_page(&self) -> E2eResult<SimulatedPage> {
        Ok(SimulatedPage::default())
    }
}

#[derive(Debug, Default)]
pub struct SimulatedPage {
    state: Mutex<AppState>,
}

impl SimulatedPage {
    /// Current `(title, completed)` pairs regardless of filter
    pub fn todos(&self) -> Vec<(String, bool)> {
        self.state
            .lock()
            .todos
            .iter()
            .map(|t| (t.title.clone(), t.completed))
            .collect()
    }

    pub fn url(&self) -> Option<String> {
        self.state.lock().url.clone()
    }

    fn act<T>(
        &self,
        locator: &Locator,
        f: impl FnOnce(&mut AppState, Element) -> E2eResult<T>,
    ) -> E2eResult<T> {
        let mut state = self.state.lock();
        state.ensure_loaded()?;
        let element = state.single(locator)?;
        f(&mut *state, element)
    }

    fn query<T>(&self, locator: &Locator, f: impl FnOnce(&AppState, Vec<Element>) -> T) -> E2eResult<T> {
        let state = self.state.lock();
        state.ensure_loaded()?;
        let elements = state.resolve(locator)?;
        Ok(f(&*state, elements))
    }
}

#[async_trait]
impl Page for SimulatedPage {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        debug!("simulated goto {}", url);
        let mut state = self.state.lock();
        state.url = Some(url.to_string());
        state.route = Filter::from_url(url);
        state.load();
        Ok(())
    }

    async fn reload(&self) -> E2eResult<()> {
        let mut state = self.state.lock();
        state.ensure_loaded()?;
        state.load();
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.act(locator, |state, el| state.fill(el, value))
    }

    async fn press(&self, locator: &Locator, key: Key) -> E2eResult<()> {
        self.act(locator, |state, el| state.press(el, key))
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        self.act(locator, |state, el| state.click(el))
    }

    async fn dblclick(&self, locator: &Locator) -> E2eResult<()> {
        self.act(locator, |state, el| {
            if let Element::Item(i) | Element::Title(i) = el {
                state.commit_edit();
                if let Some(todo) = state.todos.get(i) {
                    state.editing = Some(Editing {
                        index: i,
                        value: todo.title.clone(),
                    });
                }
            }
            Ok(())
        })
    }

    async fn hover(&self, locator: &Locator) -> E2eResult<()> {
        self.act(locator, |state, el| {
            state.hovered = match el {
                Element::Item(i) | Element::Title(i) | Element::Checkbox(i) | Element::Destroy(i) => Some(i),
                _ => None,
            };
            Ok(())
        })
    }

    async fn blur(&self, locator: &Locator) -> E2eResult<()> {
        self.act(locator, |state, el| {
            if let Element::EditBox(_) = el {
                state.commit_edit();
            }
            Ok(())
        })
    }

    async fn set_checked(&self, locator: &Locator, checked: bool) -> E2eResult<()> {
        self.act(locator, |state, el| state.set_checked(el, checked))
    }

    async fn texts(&self, locator: &Locator) -> E2eResult<Vec<String>> {
        self.query(locator, |state, els| els.into_iter().map(|e| state.text(e)).collect())
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        self.query(locator, |_, els| els.len())
    }

    async fn class_names(&self, locator: &Locator) -> E2eResult<Vec<String>> {
        self.query(locator, |state, els| els.into_iter().map(|e| state.class_name(e)).collect())
    }

    async fn input_value(&self, locator: &Locator) -> E2eResult<String> {
        let state = self.state.lock();
        state.ensure_loaded()?;
        let element = state.single(locator)?;
        state.input_value(element)
    }

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        let state = self.state.lock();
        state.ensure_loaded()?;
        match state.resolve(locator)?.as_slice() {
            [] => Ok(false),
            [element] => Ok(state.is_visible(*element)),
            many => Err(E2eError::Driver(format!(
                "strict mode violation: {} resolved to {} elements",
                locator,
                many.len()
            ))),
        }
    }

    async fn screenshot(&self, path: &Path, _full_page: bool) -> E2eResult<()> {
        let img = {
            let state = self.state.lock();
            state.ensure_loaded()?;
            state.render()
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        img.save(path)?;
        Ok(())
    }

    async fn close(&self) -> E2eResult<()> {
        let mut state = self.state.lock();
        state.url = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::{EditFinish, TodoPage};
    use test_case::test_case;

    const URL: &str = "http://todomvc.test/";

    async fn loaded(items: &[&str]) -> SimulatedPage {
        let page = SimulatedBrowser::new().new_page().await.unwrap();
        page.goto(URL).await.unwrap();
        TodoPage::new(&page).add_todos(items).await.unwrap();
        page
    }

    fn titles(page: &SimulatedPage) -> Vec<String> {
        page.todos().into_iter().map(|(t, _)| t).collect()
    }

    #[tokio::test]
    async fn test_actions_require_navigation() {
        let page = SimulatedBrowser::new().new_page().await.unwrap();
        let err = page
            .fill(&Locator::placeholder(NEW_TODO_PLACEHOLDER), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, E2eError::Driver(_)));
    }

    #[tokio::test]
    async fn test_blank_entry_is_ignored() {
        let page = loaded(&["   "]).await;
        assert!(page.todos().is_empty());
    }

    #[test_case(EditFinish::Enter, "  buy some sausages  ", &["a", "buy some sausages", "c"] ; "enter trims")]
    #[test_case(EditFinish::Blur, "buy some sausages", &["a", "buy some sausages", "c"] ; "blur saves")]
    #[test_case(EditFinish::Escape, "buy some sausages", &["a", "b", "c"] ; "escape cancels")]
    #[test_case(EditFinish::Enter, "", &["a", "c"] ; "empty removes")]
    #[tokio::test]
    async fn test_edit_policies(finish: EditFinish, text: &str, expected: &[&str]) {
        let page = loaded(&["a", "b", "c"]).await;
        let todo = TodoPage::new(&page);
        todo.start_edit(1).await.unwrap();
        todo.finish_edit(1, text, finish).await.unwrap();
        assert_eq!(titles(&page), expected);
    }

    #[tokio::test]
    async fn test_reload_restores_completion() {
        let page = loaded(&["a", "b"]).await;
        let todo = TodoPage::new(&page);
        todo.set_completed(0, true).await.unwrap();
        page.fill(&todo.new_todo(), "unsaved").await.unwrap();
        todo.reload().await.unwrap();

        assert_eq!(page.todos(), vec![("a".to_string(), true), ("b".to_string(), false)]);
        assert_eq!(page.input_value(&todo.new_todo()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_pages_do_not_share_storage() {
        let browser = SimulatedBrowser::new();
        let first = browser.new_page().await.unwrap();
        first.goto(URL).await.unwrap();
        TodoPage::new(&first).add_todo("a").await.unwrap();

        let second = browser.new_page().await.unwrap();
        second.goto(URL).await.unwrap();
        assert!(second.todos().is_empty());
    }

    #[tokio::test]
    async fn test_delete_needs_hover() {
        let page = loaded(&["a", "b"]).await;
        let todo = TodoPage::new(&page);
        assert!(page.click(&todo.delete_button(0)).await.is_err());

        todo.delete_item(0).await.unwrap();
        assert_eq!(titles(&page), vec!["b"]);
    }

    #[tokio::test]
    async fn test_strict_mode_violation() {
        let page = loaded(&["a", "b"]).await;
        let err = page.click(&Locator::test_id(TODO_ITEM_ID)).await.unwrap_err();
        assert!(err.to_string().contains("strict mode violation"));
    }

    #[tokio::test]
    async fn test_reads_are_strict() {
        let page = loaded(&["a", "b"]).await;
        let rows = Locator::test_id(TODO_ITEM_ID);
        let toggles = rows.clone().get_by_role("checkbox", None);

        let err = page.input_value(&toggles).await.unwrap_err();
        assert!(err.to_string().contains("strict mode violation"));
        let err = page.is_visible(&rows).await.unwrap_err();
        assert!(err.to_string().contains("strict mode violation"));

        assert!(page.is_visible(&rows.clone().nth(1)).await.unwrap());
        assert_eq!(page.input_value(&Locator::placeholder(NEW_TODO_PLACEHOLDER)).await.unwrap(), "");
        assert!(!page.is_visible(&Locator::test_id("missing")).await.unwrap());
    }

    #[tokio::test]
    async fn test_filters_change_visible_rows_and_selection() {
        let page = loaded(&["a", "b", "c"]).await;
        let todo = TodoPage::new(&page);
        todo.set_completed(1, true).await.unwrap();

        todo.select_filter(Filter::Active).await.unwrap();
        assert_eq!(page.texts(&todo.items()).await.unwrap(), vec!["a", "c"]);
        assert_eq!(page.class_names(&todo.filter_link(Filter::Active)).await.unwrap(), vec!["selected"]);
        assert_eq!(page.class_names(&todo.filter_link(Filter::All)).await.unwrap(), vec![""]);
        assert!(page.url().unwrap().ends_with("#/active"));

        todo.select_filter(Filter::Completed).await.unwrap();
        assert_eq!(page.texts(&todo.items()).await.unwrap(), vec!["b"]);

        // nth is relative to the filtered list
        todo.set_completed(0, false).await.unwrap();
        assert_eq!(page.todos()[1], ("b".to_string(), false));
    }

    #[tokio::test]
    async fn test_toggle_all_click_flips_everything() {
        let page = loaded(&["a", "b"]).await;
        let todo = TodoPage::new(&page);
        todo.set_completed(0, true).await.unwrap();

        page.click(&todo.toggle_all()).await.unwrap();
        assert!(page.todos().iter().all(|(_, done)| *done));
        page.click(&todo.toggle_all()).await.unwrap();
        assert!(page.todos().iter().all(|(_, done)| !*done));
    }

    #[tokio::test]
    async fn test_screenshot_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let page = loaded(&["a"]).await;
        let path = dir.path().join("nested").join("shot.png");
        page.screenshot(&path, true).await.unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), CANVAS_WIDTH);
        assert_eq!(img.height(), 3 * ROW_HEIGHT);
    }
}
