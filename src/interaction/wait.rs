use anyhow::Result;
use chromiumoxide::page::Page;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::config::POLL_INTERVAL_MS;
use crate::error::VerifyError;
use crate::selectors::{selector_to_js, Locator};

/// Element state a wait can target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    Attached,
    #[default]
    Visible,
    Hidden,
    Detached,
    /// Visible and not disabled; what every action waits for.
    Actionable,
}

impl fmt::Display for WaitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Attached => "attached",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Detached => "detached",
            Self::Actionable => "actionable",
        };
        f.write_str(s)
    }
}

/// JS predicate body deciding whether `el` (possibly null) is visible.
pub(crate) const IS_VISIBLE_JS: &str = r#"((el) => {
    if (!el) return false;
    const style = getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    return style.display !== 'none'
        && style.visibility !== 'hidden'
        && parseFloat(style.opacity) > 0
        && rect.width > 0
        && rect.height > 0;
})"#;

/// Result of one in-page check: whether it passed and what was observed.
#[derive(Debug, Clone, Deserialize)]
pub struct Probe {
    pub pass: bool,
    #[serde(default)]
    pub actual: serde_json::Value,
}

/// Evaluate `probe_js` (which must return `{ pass, actual }`) every
/// `POLL_INTERVAL_MS` until it passes or `timeout_ms` elapses.
///
/// Each evaluation is itself bounded, so a wedged page cannot stall the run
/// past the deadline. Returns whether it passed plus the last probe seen.
pub async fn poll_probe(page: &Page, probe_js: &str, timeout_ms: u64) -> (bool, Option<Probe>) {
    let timeout = Duration::from_millis(timeout_ms);
    let interval = Duration::from_millis(POLL_INTERVAL_MS);
    let start = Instant::now();
    let mut last = None;

    loop {
        let remaining = timeout.saturating_sub(start.elapsed()).max(interval);
        let evaluated = tokio::time::timeout(remaining, page.evaluate(probe_js)).await;
        if let Ok(Ok(result)) = evaluated {
            match result.into_value::<Probe>() {
                Ok(probe) if probe.pass => return (true, Some(probe)),
                Ok(probe) => last = Some(probe),
                Err(e) => tracing::debug!("Probe returned unexpected shape: {}", e),
            }
        }

        if start.elapsed() >= timeout {
            return (false, last);
        }
        tokio::time::sleep(interval).await;
    }
}

/// Wait up to `timeout_ms` for `locator` to reach `state`.
pub async fn wait_for(page: &Page, locator: &Locator, state: WaitState, timeout_ms: u64) -> Result<()> {
    let element_js = selector_to_js(locator)?;
    let check = match state {
        WaitState::Attached => "!!el",
        WaitState::Detached => "!el",
        WaitState::Visible => "isVisible(el)",
        WaitState::Hidden => "!isVisible(el)",
        WaitState::Actionable => "isVisible(el) && !el.disabled && !el.closest('fieldset[disabled]')",
    };
    let probe_js = format!(
        r#"(() => {{
            const isVisible = {visible};
            const el = {element_js};
            return {{ pass: {check}, actual: el ? el.tagName.toLowerCase() : null }};
        }})()"#,
        visible = IS_VISIBLE_JS,
        element_js = element_js,
        check = check
    );

    let (passed, _) = poll_probe(page, &probe_js, timeout_ms).await;
    if passed {
        Ok(())
    } else {
        Err(VerifyError::Timeout {
            what: format!("{} to be {}", locator, state),
            timeout_ms,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_state_deserializes_snake_case() {
        let state: WaitState = serde_yaml::from_str("attached").unwrap();
        assert_eq!(state, WaitState::Attached);
        assert_eq!(WaitState::default(), WaitState::Visible);
    }

    #[test]
    fn test_probe_defaults_actual_to_null() {
        let probe: Probe = serde_json::from_str(r#"{"pass": false}"#).unwrap();
        assert!(!probe.pass);
        assert!(probe.actual.is_null());
    }
}
