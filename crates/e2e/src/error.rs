//! Error types for E2E scenarios

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    /// An observed UI state did not converge to the expected value in time.
    #[error("Assertion failed: expected {locator} {expected}, got {actual} (timeout: {timeout_ms} ms)")]
    AssertionMismatch {
        locator: String,
        expected: String,
        actual: String,
        timeout_ms: u64,
    },

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Playwright not found. Install with: npm i -D playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Server failed to start: {0}")]
    ServerStartup(String),

    #[error("Server health check failed after {0} attempts")]
    ServerHealthCheck(usize),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Invalid artifact name '{0}': use letters, digits, '-', '_' or '.'")]
    InvalidArtifactName(String),

    #[error("Invalid class pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl E2eError {
    /// Whether this error is a failed expectation rather than an infrastructure problem
    pub fn is_assertion(&self) -> bool {
        matches!(self, E2eError::AssertionMismatch { .. })
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
