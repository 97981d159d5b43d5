use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::page::Page;

use super::wait::{wait_for, WaitState};
use crate::selectors::{selector_to_js, Locator};

/// Replace the value of an input, textarea or contenteditable element and
/// fire `input` + `change`, like a user pasting the text.
pub async fn fill(page: &Page, locator: &Locator, value: &str, timeout_ms: u64) -> Result<()> {
    wait_for(page, locator, WaitState::Actionable, timeout_ms).await?;

    let selector_js = selector_to_js(locator)?;
    let js = format!(
        r#"(() => {{
            const el = {selector_js};
            if (!el) throw new Error('Element not found: ' + {label});
            const text = {value};
            el.scrollIntoView({{ block: 'center', behavior: 'instant' }});
            el.focus();
            if (el.tagName === 'INPUT' || el.tagName === 'TEXTAREA') {{
                const proto = el.tagName === 'INPUT'
                    ? window.HTMLInputElement.prototype
                    : window.HTMLTextAreaElement.prototype;
                const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
                setter.call(el, text);
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            }} else if (el.isContentEditable) {{
                document.execCommand('selectAll', false, null);
                document.execCommand('insertText', false, text);
            }} else {{
                throw new Error('Element is not fillable: ' + el.tagName.toLowerCase());
            }}
            return true;
        }})()"#,
        selector_js = selector_js,
        label = serde_json::to_string(&locator.to_string())?,
        value = serde_json::to_string(value)?
    );

    page.evaluate(js.as_str())
        .await
        .with_context(|| format!("Failed to fill {}", locator))?;
    Ok(())
}

/// Press a key (Enter, Tab, a single character, ...), optionally focusing
/// `locator` first once it is actionable. Uses real CDP key events so
/// default actions happen: Tab moves focus and fires `blur`, Enter submits.
pub async fn press(page: &Page, locator: Option<&Locator>, key: &str, timeout_ms: u64) -> Result<()> {
    if let Some(locator) = locator {
        wait_for(page, locator, WaitState::Actionable, timeout_ms).await?;
        let js = format!(
            r#"(() => {{
                const el = {selector_js};
                if (!el) throw new Error('Element not found');
                el.focus();
                return true;
            }})()"#,
            selector_js = selector_to_js(locator)?
        );
        page.evaluate(js.as_str())
            .await
            .with_context(|| format!("Failed to focus {}", locator))?;
    }

    let def = key_definition(key);

    let mut down = DispatchKeyEventParams::builder()
        .key(def.key.clone())
        .code(def.code.clone())
        .windows_virtual_key_code(def.key_code)
        .native_virtual_key_code(def.key_code);
    down = match &def.text {
        Some(text) => down
            .r#type(DispatchKeyEventType::KeyDown)
            .text(text.clone())
            .unmodified_text(text.clone()),
        None => down.r#type(DispatchKeyEventType::RawKeyDown),
    };
    page.execute(down.build().map_err(anyhow::Error::msg)?)
        .await
        .context("Failed to press key")?;

    let up = DispatchKeyEventParams::builder()
        .r#type(DispatchKeyEventType::KeyUp)
        .key(def.key.clone())
        .code(def.code.clone())
        .windows_virtual_key_code(def.key_code)
        .native_virtual_key_code(def.key_code)
        .build()
        .map_err(anyhow::Error::msg)?;
    page.execute(up).await.context("Failed to release key")?;

    tracing::debug!("Pressed {} ({})", def.key, def.code);
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDefinition {
    pub key: String,
    pub code: String,
    pub key_code: i64,
    /// Text the key inserts, when it inserts any.
    pub text: Option<String>,
}

pub fn key_definition(key: &str) -> KeyDefinition {
    let named = |code: &str, key_code: i64, text: Option<&str>| KeyDefinition {
        key: key.to_string(),
        code: code.to_string(),
        key_code,
        text: text.map(str::to_string),
    };
    match key {
        "Enter" => named("Enter", 13, Some("\r")),
        "Tab" => named("Tab", 9, None),
        "Escape" => named("Escape", 27, None),
        "Backspace" => named("Backspace", 8, None),
        "Delete" => named("Delete", 46, None),
        "ArrowUp" => named("ArrowUp", 38, None),
        "ArrowDown" => named("ArrowDown", 40, None),
        "ArrowLeft" => named("ArrowLeft", 37, None),
        "ArrowRight" => named("ArrowRight", 39, None),
        "Home" => named("Home", 36, None),
        "End" => named("End", 35, None),
        "PageUp" => named("PageUp", 33, None),
        "PageDown" => named("PageDown", 34, None),
        "Space" | " " => KeyDefinition {
            key: " ".into(),
            code: "Space".into(),
            key_code: 32,
            text: Some(" ".into()),
        },
        _ => {
            let c = key.chars().next().unwrap_or('\0');
            let code = if c.is_ascii_alphabetic() {
                format!("Key{}", c.to_ascii_uppercase())
            } else if c.is_ascii_digit() {
                format!("Digit{}", c)
            } else {
                String::new()
            };
            KeyDefinition {
                key: key.to_string(),
                code,
                key_code: c.to_ascii_uppercase() as i64,
                text: Some(key.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_inserts_carriage_return() {
        let def = key_definition("Enter");
        assert_eq!(def.key_code, 13);
        assert_eq!(def.text.as_deref(), Some("\r"));
    }

    #[test]
    fn test_tab_is_raw_key() {
        let def = key_definition("Tab");
        assert_eq!(def.code, "Tab");
        assert_eq!(def.key_code, 9);
        assert!(def.text.is_none());
    }

    #[test]
    fn test_letter_and_digit_codes() {
        let a = key_definition("a");
        assert_eq!(a.code, "KeyA");
        assert_eq!(a.key_code, 65);
        assert_eq!(a.text.as_deref(), Some("a"));
        assert_eq!(key_definition("7").code, "Digit7");
    }
}
