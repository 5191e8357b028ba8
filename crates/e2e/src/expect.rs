//! Auto-waiting assertions
//!
//! An expectation polls the observed UI state until it matches or the wait
//! window closes. A mismatch at the deadline is reported as
//! [`E2eError::AssertionMismatch`] carrying the last observed value. Driver
//! errors while observing count as "not yet" so that elements which appear
//! late do not fail the check early.

use std::fmt;
use std::time::Duration;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::page::Page;

/// Default wait window for expectations
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Interval between two observations
pub const POLL_INTERVAL_MS: u64 = 50;

/// Match against an element's `class` attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassPattern {
    /// The whole attribute equals this string
    Exact(String),
    /// The attribute matches this regular expression anywhere
    Matches(String),
}

impl ClassPattern {
    pub fn exact(class: impl Into<String>) -> Self {
        ClassPattern::Exact(class.into())
    }

    pub fn matches(pattern: impl Into<String>) -> Self {
        ClassPattern::Matches(pattern.into())
    }

    fn compile(&self) -> E2eResult<ClassMatcher> {
        match self {
            ClassPattern::Exact(s) => Ok(ClassMatcher::Exact(s.clone())),
            ClassPattern::Matches(p) => Regex::new(p)
                .map(ClassMatcher::Regex)
                .map_err(|e| E2eError::InvalidPattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                }),
        }
    }
}

#[derive(Debug, Clone)]
enum ClassMatcher {
    Exact(String),
    Regex(Regex),
}

impl ClassMatcher {
    fn is_match(&self, class_attr: &str) -> bool {
        match self {
            ClassMatcher::Exact(s) => class_attr.trim() == s,
            ClassMatcher::Regex(re) => re.is_match(class_attr),
        }
    }
}

impl fmt::Display for ClassMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassMatcher::Exact(s) => write!(f, "{:?}", s),
            ClassMatcher::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
enum Expectation {
    Texts(Vec<String>),
    ContainsText(String),
    Count(usize),
    Class(ClassMatcher),
    Classes(Vec<ClassMatcher>),
    /// Every element matches (or none does); the set must not be empty
    EachClass {
        matcher: ClassMatcher,
        present: bool,
        rows: Option<usize>,
    },
    Value(String),
    Visible(bool),
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Texts(t) => write!(f, "to have text {:?}", t),
            Expectation::ContainsText(t) => write!(f, "to contain text {:?}", t),
            Expectation::Count(n) => write!(f, "to have count {}", n),
            Expectation::Class(m) => write!(f, "to have class {}", m),
            Expectation::Classes(ms) => {
                let list: Vec<String> = ms.iter().map(|m| m.to_string()).collect();
                write!(f, "to have classes [{}]", list.join(", "))
            }
            Expectation::EachClass { matcher, present, rows } => {
                let verb = if *present { "have" } else { "lack" };
                match rows {
                    Some(n) => write!(f, "to be {} rows that all {} class {}", n, verb, matcher),
                    None => write!(f, "to be rows that all {} class {}", verb, matcher),
                }
            }
            Expectation::Value(v) => write!(f, "to have value {:?}", v),
            Expectation::Visible(true) => write!(f, "to be visible"),
            Expectation::Visible(false) => write!(f, "to be hidden"),
        }
    }
}

#[derive(Debug, Clone)]
enum Observed {
    Texts(Vec<String>),
    Count(usize),
    Classes(Vec<String>),
    Value(String),
    Visible(bool),
}

impl fmt::Display for Observed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observed::Texts(t) => write!(f, "{:?}", t),
            Observed::Count(n) => write!(f, "{}", n),
            Observed::Classes(c) => write!(f, "classes {:?}", c),
            Observed::Value(v) => write!(f, "value {:?}", v),
            Observed::Visible(true) => write!(f, "visible"),
            Observed::Visible(false) => write!(f, "hidden"),
        }
    }
}

/// Collapse runs of whitespace and trim, the way rendered text compares
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Expectation {
    async fn observe<P: Page + ?Sized>(&self, page: &P, locator: &Locator) -> E2eResult<Observed> {
        Ok(match self {
            Expectation::Texts(_) | Expectation::ContainsText(_) => Observed::Texts(
                page.texts(locator)
                    .await?
                    .iter()
                    .map(|t| normalize_whitespace(t))
                    .collect(),
            ),
            Expectation::Count(_) => Observed::Count(page.count(locator).await?),
            Expectation::Class(_) | Expectation::Classes(_) | Expectation::EachClass { .. } => {
                Observed::Classes(page.class_names(locator).await?)
            }
            Expectation::Value(_) => Observed::Value(page.input_value(locator).await?),
            Expectation::Visible(_) => Observed::Visible(page.is_visible(locator).await?),
        })
    }

    fn is_met(&self, observed: &Observed) -> bool {
        match (self, observed) {
            (Expectation::Texts(expected), Observed::Texts(actual)) => {
                expected.len() == actual.len()
                    && expected
                        .iter()
                        .zip(actual)
                        .all(|(e, a)| normalize_whitespace(e) == *a)
            }
            (Expectation::ContainsText(needle), Observed::Texts(actual)) => actual
                .first()
                .map(|t| t.contains(needle.as_str()))
                .unwrap_or(false),
            (Expectation::Count(n), Observed::Count(actual)) => n == actual,
            (Expectation::Class(m), Observed::Classes(actual)) => actual
                .first()
                .map(|c| m.is_match(c))
                .unwrap_or(false),
            (Expectation::Classes(ms), Observed::Classes(actual)) => {
                ms.len() == actual.len() && ms.iter().zip(actual).all(|(m, c)| m.is_match(c))
            }
            (Expectation::EachClass { matcher, present, rows }, Observed::Classes(actual)) => {
                !actual.is_empty()
                    && rows.map(|n| n == actual.len()).unwrap_or(true)
                    && actual.iter().all(|c| matcher.is_match(c) == *present)
            }
            (Expectation::Value(v), Observed::Value(actual)) => v == actual,
            (Expectation::Visible(v), Observed::Visible(actual)) => v == actual,
            _ => false,
        }
    }
}

/// Pending assertion about the elements a locator matches
pub struct Expect<'a, P: Page + ?Sized> {
    page: &'a P,
    locator: Locator,
    timeout: Duration,
    negated: bool,
}

/// Start an assertion on `locator` with the default wait window
pub fn expect<'a, P: Page + ?Sized>(page: &'a P, locator: &Locator) -> Expect<'a, P> {
    Expect {
        page,
        locator: locator.clone(),
        timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        negated: false,
    }
}

impl<'a, P: Page + ?Sized> Expect<'a, P> {
    /// Invert the assertion
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn to_have_text<S: AsRef<str>>(self, expected: &[S]) -> E2eResult<()> {
        let texts = expected.iter().map(|s| s.as_ref().to_string()).collect();
        self.satisfy(Expectation::Texts(texts)).await
    }

    pub async fn to_contain_text(self, needle: &str) -> E2eResult<()> {
        self.satisfy(Expectation::ContainsText(needle.to_string())).await
    }

    pub async fn to_have_count(self, count: usize) -> E2eResult<()> {
        self.satisfy(Expectation::Count(count)).await
    }

    /// The first matched element's class attribute satisfies `pattern`
    pub async fn to_have_class(self, pattern: &ClassPattern) -> E2eResult<()> {
        let matcher = pattern.compile()?;
        self.satisfy(Expectation::Class(matcher)).await
    }

    /// One pattern per matched element, in order; the counts must agree
    pub async fn to_have_classes(self, patterns: &[ClassPattern]) -> E2eResult<()> {
        let matchers = patterns
            .iter()
            .map(ClassPattern::compile)
            .collect::<E2eResult<Vec<_>>>()?;
        self.satisfy(Expectation::Classes(matchers)).await
    }

    /// At least one element matches and all of them carry `pattern`;
    /// with `rows`, exactly that many must match
    pub async fn to_all_have_class(self, pattern: &ClassPattern, rows: Option<usize>) -> E2eResult<()> {
        self.each_class(pattern, true, rows).await
    }

    /// At least one element matches and none of them carries `pattern`
    pub async fn to_all_lack_class(self, pattern: &ClassPattern, rows: Option<usize>) -> E2eResult<()> {
        self.each_class(pattern, false, rows).await
    }

    async fn each_class(self, pattern: &ClassPattern, present: bool, rows: Option<usize>) -> E2eResult<()> {
        let matcher = pattern.compile()?;
        self.satisfy(Expectation::EachClass { matcher, present, rows }).await
    }

    pub async fn to_have_value(self, value: &str) -> E2eResult<()> {
        self.satisfy(Expectation::Value(value.to_string())).await
    }

    pub async fn to_be_empty(self) -> E2eResult<()> {
        self.satisfy(Expectation::Value(String::new())).await
    }

    pub async fn to_be_visible(self) -> E2eResult<()> {
        self.satisfy(Expectation::Visible(true)).await
    }

    pub async fn to_be_hidden(self) -> E2eResult<()> {
        self.satisfy(Expectation::Visible(false)).await
    }

    async fn satisfy(self, expectation: Expectation) -> E2eResult<()> {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut polls = 0usize;

        loop {
            polls += 1;
            let (passed, actual) = match expectation.observe(self.page, &self.locator).await {
                Ok(observed) => (expectation.is_met(&observed) != self.negated, observed.to_string()),
                Err(e) => (false, format!("<{}>", e)),
            };

            if passed {
                debug!(
                    "expect {} {} passed after {} poll(s)",
                    self.locator, expectation, polls
                );
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                let expected = if self.negated {
                    format!("not {}", expectation)
                } else {
                    expectation.to_string()
                };
                return Err(E2eError::AssertionMismatch {
                    locator: self.locator.to_string(),
                    expected,
                    actual,
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }

            sleep(Duration::from_millis(POLL_INTERVAL_MS).min(deadline - now)).await;
        }
    }
}
