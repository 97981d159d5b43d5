use anyhow::{Context, Result};
use chromiumoxide::page::Page;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::wait::{poll_probe, wait_for, WaitState};
use crate::error::VerifyError;
use crate::selectors::{selector_to_js, Locator};

/// Which attribute of an `<option>` to match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectBy {
    Value(String),
    Label(String),
}

impl fmt::Display for SelectBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "value={}", v),
            Self::Label(l) => write!(f, "label={}", l),
        }
    }
}

/// Select an option of a `<select>`, waiting for the option itself to be
/// populated (options often arrive from a mocked bridge call), then fire
/// `input` + `change`.
pub async fn select_option(page: &Page, locator: &Locator, by: &SelectBy, timeout_ms: u64) -> Result<()> {
    wait_for(page, locator, WaitState::Actionable, timeout_ms).await?;

    let (field, wanted) = match by {
        SelectBy::Value(v) => ("value", v),
        SelectBy::Label(l) => ("label", l),
    };
    let find_option = format!(
        r#"(el) => Array.from(el.options || []).find(o => {field} === 'value'
            ? o.value === {wanted}
            : (o.label || o.textContent).trim() === {wanted})"#,
        field = serde_json::to_string(field)?,
        wanted = serde_json::to_string(wanted)?
    );
    let selector_js = selector_to_js(locator)?;

    let probe_js = format!(
        r#"(() => {{
            const el = {selector_js};
            if (!el) return {{ pass: false, actual: null }};
            if (el.tagName !== 'SELECT') return {{ pass: false, actual: 'not a <select>: ' + el.tagName.toLowerCase() }};
            const option = ({find_option})(el);
            return {{ pass: !!option, actual: Array.from(el.options).map(o => o.value) }};
        }})()"#,
        selector_js = selector_js,
        find_option = find_option
    );
    let (found, last) = poll_probe(page, &probe_js, timeout_ms).await;
    if !found {
        let seen = last.map(|p| p.actual.to_string()).unwrap_or_else(|| "nothing".into());
        tracing::debug!("Options seen on {}: {}", locator, seen);
        return Err(VerifyError::Timeout {
            what: format!("option {} in {} (options: {})", by, locator, seen),
            timeout_ms,
        }
        .into());
    }

    let js = format!(
        r#"(() => {{
            const el = {selector_js};
            const option = ({find_option})(el);
            el.value = option.value;
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return el.value;
        }})()"#,
        selector_js = selector_js,
        find_option = find_option
    );

    page.evaluate(js.as_str())
        .await
        .with_context(|| format!("Failed to select {} in {}", by, locator))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_by_from_yaml() {
        let by: SelectBy =
            serde_yaml::with::singleton_map::deserialize(serde_yaml::Deserializer::from_str("label: CCT Teste"))
                .unwrap();
        assert_eq!(by, SelectBy::Label("CCT Teste".into()));
        assert_eq!(by.to_string(), "label=CCT Teste");
    }
}
