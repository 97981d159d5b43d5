//! Polling assertions on locators.
//!
//! Every assertion re-evaluates until it holds or the timeout elapses, so UI
//! updates driven by (mocked) asynchronous calls are tolerated. A failure
//! reports the last value observed.

use anyhow::Result;
use chromiumoxide::page::Page;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::VerifyError;
use crate::interaction::wait::{poll_probe, IS_VISIBLE_JS};
use crate::selectors::{selector_all_js, selector_to_js, Locator};

/// What to assert about a locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    Visible,
    Hidden,
    /// Whole text content equals, after whitespace normalization.
    Text(String),
    /// Text content contains the substring (case-sensitive).
    ContainsText(String),
    Checked(bool),
    Value(String),
    Count(usize),
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visible => f.write_str("to be visible"),
            Self::Hidden => f.write_str("to be hidden"),
            Self::Text(t) => write!(f, "to have text \"{}\"", t),
            Self::ContainsText(t) => write!(f, "to contain text \"{}\"", t),
            Self::Checked(true) => f.write_str("to be checked"),
            Self::Checked(false) => f.write_str("not to be checked"),
            Self::Value(v) => write!(f, "to have value \"{}\"", v),
            Self::Count(n) => write!(f, "to match {} element(s)", n),
        }
    }
}

fn probe_js(locator: &Locator, expectation: &Expectation) -> Result<String> {
    let check = match expectation {
        Expectation::Visible => {
            "{ pass: isVisible(el), actual: isVisible(el) ? 'visible' : 'hidden' }".to_string()
        }
        Expectation::Hidden => {
            "{ pass: !isVisible(el), actual: isVisible(el) ? 'visible' : 'hidden' }".to_string()
        }
        Expectation::Text(t) => format!(
            "{{ pass: norm(el.textContent) === norm({t}), actual: norm(el.textContent) }}",
            t = serde_json::to_string(t)?
        ),
        Expectation::ContainsText(t) => format!(
            "{{ pass: norm(el.textContent).includes(norm({t})), actual: norm(el.textContent) }}",
            t = serde_json::to_string(t)?
        ),
        Expectation::Checked(want) => format!(
            "{{ pass: el.checked === {want}, actual: el.checked ? 'checked' : 'unchecked' }}",
            want = want
        ),
        Expectation::Value(v) => format!(
            "{{ pass: el.value === {v}, actual: el.value === undefined ? 'no value' : el.value }}",
            v = serde_json::to_string(v)?
        ),
        Expectation::Count(n) => {
            return Ok(format!(
                r#"(() => {{
                    const els = {all};
                    return {{ pass: els.length === {n}, actual: els.length + ' element(s)' }};
                }})()"#,
                all = selector_all_js(locator)?,
                n = n
            ))
        }
    };
    // Hidden also holds when the element is gone.
    let missing_passes = matches!(expectation, Expectation::Hidden);

    Ok(format!(
        r#"(() => {{
            const isVisible = {visible};
            const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
            const el = {element};
            if (!el) return {{ pass: {missing_passes}, actual: 'element not found' }};
            return {check};
        }})()"#,
        visible = IS_VISIBLE_JS,
        element = selector_to_js(locator)?,
        missing_passes = missing_passes,
        check = check
    ))
}

/// Poll until `locator` satisfies `expectation` or fail with the last observation.
pub async fn expect(page: &Page, locator: &Locator, expectation: &Expectation, timeout_ms: u64) -> Result<()> {
    let js = probe_js(locator, expectation)?;
    let (passed, last) = poll_probe(page, &js, timeout_ms).await;
    if passed {
        tracing::debug!("{} {} ✓", locator, expectation);
        return Ok(());
    }

    let actual = match last.map(|p| p.actual) {
        Some(serde_json::Value::String(s)) => format!("\"{}\"", s),
        Some(serde_json::Value::Null) | None => "no observation".to_string(),
        Some(other) => other.to_string(),
    };
    Err(VerifyError::AssertionFailed {
        expected: format!("{} {} within {}ms", locator, expectation, timeout_ms),
        actual,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_reads_like_a_sentence() {
        let exp = Expectation::Text("Dados salvos com sucesso!".into());
        assert_eq!(
            format!("{} {}", Locator::css(".alert-success"), exp),
            r#"css=.alert-success to have text "Dados salvos com sucesso!""#
        );
        assert_eq!(Expectation::Checked(false).to_string(), "not to be checked");
    }

    #[test]
    fn test_hidden_passes_when_missing() {
        let js = probe_js(&Locator::css("#gone"), &Expectation::Hidden).unwrap();
        assert!(js.contains("pass: true, actual: 'element not found'"));
        let js = probe_js(&Locator::css("#gone"), &Expectation::Visible).unwrap();
        assert!(js.contains("pass: false, actual: 'element not found'"));
    }

    #[test]
    fn test_count_probe_uses_all_matches() {
        let js = probe_js(&Locator::css(".house-list-item"), &Expectation::Count(3)).unwrap();
        assert!(js.contains("els.length === 3"));
    }

    fn from_yaml(yaml: &str) -> Expectation {
        serde_yaml::with::singleton_map::deserialize(serde_yaml::Deserializer::from_str(yaml)).unwrap()
    }

    #[test]
    fn test_expectation_from_yaml() {
        assert_eq!(
            from_yaml("text: Este HOUSE já existe"),
            Expectation::Text("Este HOUSE já existe".into())
        );
        assert_eq!(from_yaml("visible"), Expectation::Visible);
        assert_eq!(from_yaml("checked: true"), Expectation::Checked(true));
        assert_eq!(from_yaml("value: HOUSE1-EDITADO"), Expectation::Value("HOUSE1-EDITADO".into()));
    }
}
