use anyhow::{Context, Result};
use chromiumoxide::page::Page;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::wait::{wait_for, WaitState};
use crate::selectors::{selector_to_js, Locator};

/// Where a synthetic DOM event is dispatched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTarget {
    #[default]
    Document,
    Window,
    Element(Locator),
}

impl fmt::Display for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => f.write_str("document"),
            Self::Window => f.write_str("window"),
            Self::Element(locator) => write!(f, "{}", locator),
        }
    }
}

/// Fire a bubbling, cancelable `Event` of type `event` at `target`.
/// Re-firing `DOMContentLoaded` on `document` re-runs page initialisers.
pub async fn dispatch_event(page: &Page, target: &EventTarget, event: &str, timeout_ms: u64) -> Result<()> {
    let target_js = match target {
        EventTarget::Document => "document".to_string(),
        EventTarget::Window => "window".to_string(),
        EventTarget::Element(locator) => {
            wait_for(page, locator, WaitState::Attached, timeout_ms).await?;
            selector_to_js(locator)?
        }
    };
    let js = format!(
        r#"(() => {{
            const target = {target_js};
            if (!target) throw new Error('Event target not found');
            target.dispatchEvent(new Event({event}, {{ bubbles: true, cancelable: true }}));
            return true;
        }})()"#,
        target_js = target_js,
        event = serde_json::to_string(event)?
    );
    page.evaluate(js.as_str())
        .await
        .with_context(|| format!("Failed to dispatch {} on {}", event, target))?;
    Ok(())
}
