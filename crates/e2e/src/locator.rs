//! Element locators
//!
//! A [`Locator`] describes how to find elements on a page, not the elements
//! themselves. It is resolved by the driver every time it is used, so a
//! locator built before an action still points at the right rows afterwards.
//!
//! Locators chain: each segment is resolved inside the elements matched by
//! the previous one, and may narrow the match to a single element with `nth`.

use std::fmt;
use serde::Serialize;

/// How a single segment selects elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Selector {
    /// Input or textarea by its placeholder attribute
    Placeholder { text: String },

    /// Element by its `data-testid` attribute
    TestId { id: String },

    /// Element by ARIA role, optionally filtered by accessible name
    Role {
        role: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Form control by its associated label text
    Label { text: String },

    /// Raw CSS selector
    Css { selector: String },
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Placeholder { text } => write!(f, "placeholder=\"{}\"", text),
            Selector::TestId { id } => write!(f, "test-id={}", id),
            Selector::Role { role, name: Some(name) } => write!(f, "role={}[name=\"{}\"]", role, name),
            Selector::Role { role, name: None } => write!(f, "role={}", role),
            Selector::Label { text } => write!(f, "label=\"{}\"", text),
            Selector::Css { selector } => write!(f, "css={}", selector),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    #[serde(flatten)]
    pub selector: Selector,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nth: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Locator {
    segments: Vec<Segment>,
}

impl Locator {
    fn root(selector: Selector) -> Self {
        Self {
            segments: vec![Segment { selector, nth: None }],
        }
    }

    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::root(Selector::Placeholder { text: text.into() })
    }

    pub fn test_id(id: impl Into<String>) -> Self {
        Self::root(Selector::TestId { id: id.into() })
    }

    pub fn role(role: impl Into<String>, name: Option<&str>) -> Self {
        Self::root(Selector::Role {
            role: role.into(),
            name: name.map(String::from),
        })
    }

    pub fn label(text: impl Into<String>) -> Self {
        Self::root(Selector::Label { text: text.into() })
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::root(Selector::Css { selector: selector.into() })
    }

    /// Narrow the last segment to its `index`-th match (zero based)
    pub fn nth(mut self, index: usize) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.nth = Some(index);
        }
        self
    }

    /// Resolve `selector` inside the elements this locator matches
    pub fn within(mut self, selector: Selector) -> Self {
        self.segments.push(Segment { selector, nth: None });
        self
    }

    pub fn get_by_role(self, role: impl Into<String>, name: Option<&str>) -> Self {
        self.within(Selector::Role {
            role: role.into(),
            name: name.map(String::from),
        })
    }

    pub fn get_by_test_id(self, id: impl Into<String>) -> Self {
        self.within(Selector::TestId { id: id.into() })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, " >> ")?;
            }
            write!(f, "{}", segment.selector)?;
            if let Some(n) = segment.nth {
                write!(f, " >> nth={}", n)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chained_display() {
        let loc = Locator::test_id("todo-item").nth(1).get_by_role("checkbox", None);
        assert_eq!(loc.to_string(), "test-id=todo-item >> nth=1 >> role=checkbox");
    }

    #[test]
    fn test_serializes_for_bridge() {
        let loc = Locator::role("link", Some("Active"));
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "segments": [{ "by": "role", "role": "link", "name": "Active" }] })
        );
    }

    #[test]
    fn test_nth_applies_to_last_segment() {
        let loc = Locator::test_id("todo-item").get_by_test_id("todo-title").nth(0);
        assert_eq!(loc.segments()[0].nth, None);
        assert_eq!(loc.segments()[1].nth, Some(0));
    }
}
