//! TodoMVC E2E scenario suite
//!
//! This crate drives a TodoMVC application through user-visible behaviour:
//! - Describes scenarios as steps (built-in suite, or YAML files)
//! - Resolves semantic locators (placeholder, test id, role, label)
//! - Waits for expectations to converge instead of sleeping
//! - Captures numbered checkpoint screenshots and failure screenshots
//! - Runs against a real browser through Playwright, or an in-memory model
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    todomvc-e2e (binary)                     │
//! │    ├── ServerHandle::spawn(cmd)   (optional app server)     │
//! │    └── TestRunner<B: Browser>                               │
//! │          ├── run_all(&[Scenario]) -> TestSuiteResult        │
//! │          └── write_results()      -> test-results.json      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario                                                   │
//! │    ├── setup: { items }                                     │
//! │    └── steps: [Step]                                        │
//! │          ├── actions       add_todo, edit, select_filter... │
//! │          ├── expectations  expect_titles, expect_count...   │
//! │          └── screenshot    NN-purpose.png                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TodoPage (locators + actions)  ──>  expect() (polling)     │
//! │                 │                                           │
//! │                 ▼                                           │
//! │            trait Page                                       │
//! │        ┌────────┴─────────┐                                 │
//! │  PlaywrightPage     SimulatedPage                           │
//! │  (node bridge)      (in-memory TodoMVC)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod artifacts;
pub mod error;
pub mod expect;
pub mod locator;
pub mod page;
pub mod playwright;
pub mod runner;
pub mod scenario;
pub mod server;
pub mod simulated;
pub mod suite;
pub mod todo;

pub use error::{E2eError, E2eResult};
pub use expect::expect;
pub use locator::Locator;
pub use page::{Browser, Page};
pub use runner::TestRunner;
pub use scenario::{Scenario, Step};
