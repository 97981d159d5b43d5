use serde::{Deserialize, Serialize};

/// The `{ ok, payload }` shape every bridge call resolves with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Envelope {
    pub fn ok(payload: serde_json::Value) -> Self {
        Self { ok: true, payload }
    }

    /// An application-level rejection (`ok: false`), still delivered to the
    /// success handler like the real backend does.
    pub fn rejected(payload: serde_json::Value) -> Self {
        Self { ok: false, payload }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_as_ok_payload() {
        let env = Envelope::ok(json!({ "exists": true }));
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({ "ok": true, "payload": { "exists": true } })
        );
    }

    #[test]
    fn test_missing_payload_defaults_to_null() {
        let env: Envelope = serde_json::from_str(r#"{ "ok": false }"#).unwrap();
        assert_eq!(env, Envelope::rejected(serde_json::Value::Null));
    }
}
