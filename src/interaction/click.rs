use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::page::Page;

use super::wait::{wait_for, WaitState};
use crate::selectors::{selector_to_js, Locator};

/// Single or double click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickCount {
    Single,
    Double,
}

#[derive(Debug, Clone)]
pub struct ClickResult {
    pub method_used: &'static str,
}

/// Hybrid click strategy:
/// 1. Wait until the element is actionable
/// 2. Scroll into view and measure its centre
/// 3. If nothing covers the centre, send real CDP mouse events there
/// 4. Otherwise fall back to a JS click (and synthetic dblclick)
pub async fn click(
    page: &Page,
    locator: &Locator,
    count: ClickCount,
    timeout_ms: u64,
) -> Result<ClickResult> {
    wait_for(page, locator, WaitState::Actionable, timeout_ms).await?;

    let selector_js = selector_to_js(locator)?;
    let check_js = format!(
        r#"(() => {{
            const el = {selector_js};
            if (!el) return {{ error: 'Element not found: ' + {label} }};

            el.scrollIntoView({{ block: 'center', inline: 'center', behavior: 'instant' }});

            const rect = el.getBoundingClientRect();
            const x = rect.left + rect.width / 2;
            const y = rect.top + rect.height / 2;
            const topEl = document.elementFromPoint(x, y);
            const unobscured = !!topEl && (el === topEl || el.contains(topEl) || topEl.contains(el));

            return {{ unobscured, x, y }};
        }})()"#,
        selector_js = selector_js,
        label = serde_json::to_string(&locator.to_string())?
    );

    let check: serde_json::Value = page
        .evaluate(check_js.as_str())
        .await
        .context("Failed to evaluate click check")?
        .into_value()
        .context("Failed to parse click check result")?;

    if let Some(error) = check.get("error").and_then(|e| e.as_str()) {
        anyhow::bail!("{}", error);
    }

    let unobscured = check["unobscured"].as_bool().unwrap_or(false);
    let x = check["x"].as_f64().unwrap_or(0.0);
    let y = check["y"].as_f64().unwrap_or(0.0);

    if unobscured {
        mouse_click(page, x, y, 1).await?;
        if count == ClickCount::Double {
            mouse_click(page, x, y, 2).await?;
        }
        tracing::debug!("Clicked {} at ({:.0}, {:.0}) via mouse events", locator, x, y);
        return Ok(ClickResult {
            method_used: "mouse_event",
        });
    }

    let js_click = format!(
        r#"(() => {{
            const el = {selector_js};
            if (!el) throw new Error('Element not found');
            el.click();
            if ({double}) {{
                el.click();
                el.dispatchEvent(new MouseEvent('dblclick', {{ bubbles: true, cancelable: true, detail: 2 }}));
            }}
            return true;
        }})()"#,
        selector_js = selector_js,
        double = count == ClickCount::Double
    );

    page.evaluate(js_click.as_str())
        .await
        .context("Failed to JS click")?;

    tracing::debug!("Clicked {} via JS fallback (element obscured)", locator);
    Ok(ClickResult {
        method_used: "js_click",
    })
}

/// One press/release pair at viewport coordinates. `click_count` 2 on the
/// second pair makes Chrome fire `dblclick`.
async fn mouse_click(page: &Page, x: f64, y: f64, click_count: i64) -> Result<()> {
    let moved = DispatchMouseEventParams::builder()
        .r#type(DispatchMouseEventType::MouseMoved)
        .x(x)
        .y(y)
        .build()
        .map_err(anyhow::Error::msg)?;
    page.execute(moved).await.context("Failed to move mouse")?;

    for event_type in [
        DispatchMouseEventType::MousePressed,
        DispatchMouseEventType::MouseReleased,
    ] {
        let params = DispatchMouseEventParams::builder()
            .r#type(event_type)
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(click_count)
            .build()
            .map_err(anyhow::Error::msg)?;
        page.execute(params)
            .await
            .context("Failed to dispatch mouse event")?;
    }
    Ok(())
}
