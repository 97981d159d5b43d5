use std::path::PathBuf;

use thiserror::Error;

/// Failures the runner classifies. Everything else travels as `anyhow::Error`
/// with context attached at the call site.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Could not find Chrome or Chromium. Searched:\n{0}")]
    ChromeNotFound(String),

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("Expected {expected}, got {actual}")]
    AssertionFailed { expected: String, actual: String },

    #[error("Step {index} ({step}) failed: {source}")]
    StepFailed {
        index: usize,
        step: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Fragment '{name}' not found (looked in {dir})")]
    MissingFragment { name: String, dir: PathBuf },

    #[error("Include cycle: {0}")]
    IncludeCycle(String),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Unknown scenario '{0}'. Run `list` to see the built-in scenarios.")]
    UnknownScenario(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VerifyResult<T> = Result<T, VerifyError>;
