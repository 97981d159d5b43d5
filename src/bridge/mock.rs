use anyhow::{bail, Context, Result};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::with::singleton_map_recursive;
use std::collections::BTreeMap;

use super::envelope::Envelope;
use crate::error::VerifyError;
use crate::interaction::wait::poll_probe;

/// Names the runner object reserves for handler registration.
const CHAIN_METHODS: &[&str] = &[
    "withSuccessHandler",
    "withFailureHandler",
    "withFinally",
    "withUserObject",
];

/// Canned reply for one bridge method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reply {
    /// The same envelope on every call (a fresh copy each time).
    Fixed(Envelope),
    /// JS expression evaluated in the page with the call's `args` array in
    /// scope; it must produce an envelope. Throwing routes to the failure handler.
    Expr(String),
}

/// A recorded call, as kept in `window.__bridgeCalls`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BridgeCall {
    pub method: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Substitute for `google.script.run`: an explicit method → reply map.
///
/// Methods without a reply are simply not defined on the runner, so a page
/// calling one fails the same way it would against a backend missing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockBridge {
    methods: BTreeMap<String, Reply>,
}

// Replies are written as `fixed: {...}` / `expr: "..."` maps rather than
// YAML tags, so the map goes through the singleton-map adapter both ways.
impl Serialize for MockBridge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        singleton_map_recursive::serialize(&self.methods, serializer)
    }
}

impl<'de> Deserialize<'de> for MockBridge {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        singleton_map_recursive::deserialize(deserializer).map(|methods| Self { methods })
    }
}

impl MockBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to `method` with a fixed envelope.
    pub fn respond(mut self, method: &str, envelope: Envelope) -> Self {
        self.methods.insert(method.to_string(), Reply::Fixed(envelope));
        self
    }

    /// Reply to `method` with a JS expression over `args`.
    pub fn respond_with(mut self, method: &str, expr: &str) -> Self {
        self.methods
            .insert(method.to_string(), Reply::Expr(expr.to_string()));
        self
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Render the init script that defines `window.google.script.run`.
    ///
    /// Every `with*` call returns a new runner carrying the accumulated
    /// handlers, so no handler state leaks between calls. Invoking a method
    /// records the call, hands the envelope to the success handler
    /// synchronously, then runs the completion handler.
    pub fn render_script(&self) -> Result<String> {
        let mut replies = String::new();
        for (name, reply) in &self.methods {
            if CHAIN_METHODS.contains(&name.as_str()) {
                bail!("'{}' is reserved by the bridge runner and cannot be mocked", name);
            }
            let body = match reply {
                Reply::Fixed(envelope) => format!(
                    "JSON.parse({})",
                    serde_json::to_string(&serde_json::to_string(envelope)?)?
                ),
                Reply::Expr(expr) => format!("({})", expr),
            };
            replies.push_str(&format!(
                "        {}: (args) => {},\n",
                serde_json::to_string(name)?,
                body
            ));
        }

        Ok(format!(
            r#"(() => {{
    const replies = {{
{replies}    }};
    const calls = [];
    Object.defineProperty(window, '__bridgeCalls', {{ value: calls, configurable: true }});

    const snapshot = (args) => {{
        try {{ return JSON.parse(JSON.stringify(args)); }} catch (_) {{ return []; }}
    }};

    const makeRunner = (handlers) => {{
        const runner = {{
            withSuccessHandler(fn) {{ return makeRunner({{ ...handlers, success: fn }}); }},
            withFailureHandler(fn) {{ return makeRunner({{ ...handlers, failure: fn }}); }},
            withFinally(fn) {{ return makeRunner({{ ...handlers, complete: fn }}); }},
            withUserObject(obj) {{ return makeRunner({{ ...handlers, userObject: obj }}); }},
        }};
        for (const name of Object.keys(replies)) {{
            runner[name] = (...args) => {{
                calls.push({{ method: name, args: snapshot(args) }});
                let envelope;
                try {{
                    envelope = replies[name](args);
                }} catch (err) {{
                    try {{
                        if (handlers.failure) handlers.failure(err, handlers.userObject);
                    }} finally {{
                        if (handlers.complete) handlers.complete();
                    }}
                    return;
                }}
                try {{
                    if (handlers.success) handlers.success(envelope, handlers.userObject);
                }} finally {{
                    if (handlers.complete) handlers.complete();
                }}
            }};
        }}
        return runner;
    }};

    window.google = window.google || {{}};
    window.google.script = window.google.script || {{}};
    window.google.script.run = makeRunner({{}});
}})();"#,
            replies = replies
        ))
    }

    /// Register the mock so it runs before any script of every new document.
    pub async fn install(&self, page: &Page) -> Result<()> {
        let script = self.render_script()?;
        tracing::debug!("Bridge init script:\n{}", script);
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(script))
            .await
            .context("Failed to install bridge mock")?;
        tracing::info!(
            "Installed bridge mock ({} method(s): {})",
            self.methods.len(),
            self.methods().collect::<Vec<_>>().join(", ")
        );
        Ok(())
    }
}

/// Calls the page has made through the mock so far.
pub async fn recorded_calls(page: &Page) -> Result<Vec<BridgeCall>> {
    let calls: Vec<BridgeCall> = page
        .evaluate("window.__bridgeCalls || []")
        .await
        .context("Failed to read bridge calls")?
        .into_value()
        .context("Failed to parse bridge calls")?;
    Ok(calls)
}

/// Poll until `method` has been called (exactly `times` times, when given).
pub async fn expect_called(page: &Page, method: &str, times: Option<usize>, timeout_ms: u64) -> Result<()> {
    let condition = match times {
        Some(n) => format!("n === {}", n),
        None => "n > 0".to_string(),
    };
    let probe_js = format!(
        r#"(() => {{
            const n = (window.__bridgeCalls || []).filter(c => c.method === {method}).length;
            return {{ pass: {condition}, actual: n }};
        }})()"#,
        method = serde_json::to_string(method)?,
        condition = condition
    );

    let (passed, last) = poll_probe(page, &probe_js, timeout_ms).await;
    if passed {
        return Ok(());
    }
    let seen = last.map(|p| p.actual.to_string()).unwrap_or_else(|| "0".into());
    let expected = match times {
        Some(n) => format!("{} to be called {} time(s)", method, n),
        None => format!("{} to be called", method),
    };
    Err(VerifyError::AssertionFailed {
        expected,
        actual: format!("{} call(s)", seen),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_script_defines_each_method() {
        let bridge = MockBridge::new()
            .respond("getSpreadsheets", Envelope::ok(json!([])))
            .respond_with("saveEntries", "({ ok: true, payload: { inserted: args[0].houses.length } })");
        let script = bridge.render_script().unwrap();
        assert!(script.contains(r#""getSpreadsheets": (args) => JSON.parse("#));
        assert!(script.contains(r#""saveEntries": (args) => (({ ok: true"#));
        assert!(script.contains("withFinally"));
        assert!(script.contains("window.google.script.run = makeRunner({});"));
    }

    #[test]
    fn test_fixed_reply_is_double_encoded() {
        let bridge = MockBridge::new().respond("checkHouseExists", Envelope::ok(json!({ "exists": true })));
        let script = bridge.render_script().unwrap();
        assert!(script.contains(r#"JSON.parse("{\"ok\":true,\"payload\":{\"exists\":true}}")"#));
    }

    #[test]
    fn test_reserved_names_rejected() {
        let bridge = MockBridge::new().respond("withSuccessHandler", Envelope::ok(json!(null)));
        assert!(bridge.render_script().is_err());
    }

    #[test]
    fn test_yaml_round_trip_shape() {
        let yaml = r#"
getSpreadsheets:
  fixed:
    ok: true
    payload: [{ id: "1", name: "CCT Teste" }]
getDataForHouse:
  expr: "({ ok: true, payload: { house: args[1] } })"
"#;
        let bridge: MockBridge = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            bridge.methods().collect::<Vec<_>>(),
            vec!["getDataForHouse", "getSpreadsheets"]
        );
        assert_eq!(
            bridge.methods.get("getSpreadsheets"),
            Some(&Reply::Fixed(Envelope::ok(json!([{ "id": "1", "name": "CCT Teste" }]))))
        );

        let dumped = serde_yaml::to_string(&bridge).unwrap();
        assert!(dumped.contains("fixed:"), "{}", dumped);
        assert!(!dumped.contains("!fixed"), "{}", dumped);
    }

    #[test]
    fn test_bridge_call_args_default() {
        let call: BridgeCall = serde_json::from_str(r#"{ "method": "getAllHouses" }"#).unwrap();
        assert_eq!(call.method, "getAllHouses");
        assert!(call.args.is_null());
    }
}
