//! Declarative scenarios: one page load, a mocked bridge, and an ordered list
//! of actions and assertions.

pub mod builtin;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::bridge::MockBridge;
use crate::compose::Fragment;
use crate::error::{VerifyError, VerifyResult};
use crate::expect::Expectation;
use crate::interaction::{EventTarget, SelectBy, WaitState};
use crate::selectors::Locator;

/// A complete scenario, typically parsed from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Document to load
    pub target: Target,

    /// Canned bridge replies, installed before any page script runs
    #[serde(default)]
    pub bridge: MockBridge,

    /// Steps to execute in order
    pub steps: Vec<Step>,

    /// Where the final full-page screenshot is written
    pub screenshot: PathBuf,

    /// Overrides the runner's default timeout for this scenario
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// The document a scenario loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    /// A page on disk.
    File { path: PathBuf },
    /// A host template whose include directives are expanded first.
    Composite {
        host: PathBuf,
        #[serde(default)]
        fragments: Vec<Fragment>,
    },
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path } => write!(f, "{}", path.display()),
            Self::Composite { host, fragments } => {
                write!(f, "{} (composite, {} registered fragment(s))", host.display(), fragments.len())
            }
        }
    }
}

/// A single action or assertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Replace the value of an input
    Fill { target: Locator, value: String },

    Click { target: Locator },

    #[serde(rename = "dblclick")]
    DblClick { target: Locator },

    /// Select an option of a `<select>` by value or label
    Select { target: Locator, option: SelectBy },

    /// Press a key, focusing `target` first when given
    Press {
        #[serde(default)]
        target: Option<Locator>,
        key: String,
    },

    /// Fire a synthetic DOM event
    Dispatch {
        event: String,
        #[serde(default)]
        on: EventTarget,
    },

    WaitFor {
        target: Locator,
        #[serde(default)]
        state: WaitState,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Fixed delay (use sparingly)
    Sleep { ms: u64 },

    Expect {
        target: Locator,
        to: Expectation,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Assert the page called a bridge method
    ExpectCalled {
        method: String,
        #[serde(default)]
        times: Option<usize>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
}

impl Step {
    pub fn fill(target: Locator, value: &str) -> Self {
        Self::Fill {
            target,
            value: value.to_string(),
        }
    }

    pub fn click(target: Locator) -> Self {
        Self::Click { target }
    }

    pub fn dblclick(target: Locator) -> Self {
        Self::DblClick { target }
    }

    pub fn select(target: Locator, option: SelectBy) -> Self {
        Self::Select { target, option }
    }

    pub fn press(target: Locator, key: &str) -> Self {
        Self::Press {
            target: Some(target),
            key: key.to_string(),
        }
    }

    pub fn wait_for(target: Locator, state: WaitState) -> Self {
        Self::WaitFor {
            target,
            state,
            timeout_ms: None,
        }
    }

    pub fn expect(target: Locator, to: Expectation) -> Self {
        Self::Expect {
            target,
            to,
            timeout_ms: None,
        }
    }

    /// Same as [`Step::expect`] with its own timeout.
    pub fn expect_within(target: Locator, to: Expectation, timeout_ms: u64) -> Self {
        Self::Expect {
            target,
            to,
            timeout_ms: Some(timeout_ms),
        }
    }

    /// Assert `method` was called exactly `times` times.
    pub fn expect_called(method: &str, times: usize) -> Self {
        Self::ExpectCalled {
            method: method.to_string(),
            times: Some(times),
            timeout_ms: None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fill { target, value } => write!(f, "fill {} with {:?}", target, value),
            Self::Click { target } => write!(f, "click {}", target),
            Self::DblClick { target } => write!(f, "dblclick {}", target),
            Self::Select { target, option } => write!(f, "select {} in {}", option, target),
            Self::Press { target: Some(t), key } => write!(f, "press {} on {}", key, t),
            Self::Press { target: None, key } => write!(f, "press {}", key),
            Self::Dispatch { event, on } => write!(f, "dispatch {} on {}", event, on),
            Self::WaitFor { target, state, .. } => write!(f, "wait for {} to be {}", target, state),
            Self::Sleep { ms } => write!(f, "sleep {}ms", ms),
            Self::Expect { target, to, .. } => write!(f, "expect {} {}", target, to),
            Self::ExpectCalled { method, times: Some(n), .. } => {
                write!(f, "expect {} called {} time(s)", method, n)
            }
            Self::ExpectCalled { method, times: None, .. } => write!(f, "expect {} called", method),
        }
    }
}

impl Scenario {
    pub fn new(name: &str, target: Target, screenshot: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            target,
            bridge: MockBridge::default(),
            steps: Vec::new(),
            screenshot: screenshot.into(),
            timeout_ms: None,
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_bridge(mut self, bridge: MockBridge) -> Self {
        self.bridge = bridge;
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Parse a scenario from a YAML string
    pub fn from_yaml(yaml: &str) -> VerifyResult<Self> {
        let scenario: Self =
            serde_yaml::from_str(yaml).map_err(|e| VerifyError::ScenarioParse(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> VerifyResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            VerifyError::ScenarioParse(msg) => {
                VerifyError::ScenarioParse(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Reject scenarios that could never produce a meaningful run.
    pub fn validate(&self) -> VerifyResult<()> {
        if self.name.trim().is_empty() {
            return Err(VerifyError::ScenarioParse("scenario name is empty".into()));
        }
        if self.steps.is_empty() {
            return Err(VerifyError::ScenarioParse(format!(
                "scenario '{}' has no steps",
                self.name
            )));
        }
        if self.screenshot.as_os_str().is_empty() {
            return Err(VerifyError::ScenarioParse(format!(
                "scenario '{}' has no screenshot path",
                self.name
            )));
        }
        Ok(())
    }
}
