//! Push payload parsing and notification building.
//!
//! Both are pure: the same payload and config always yield the same
//! notification, and a missing or malformed payload falls back to defaults.

use pulse_core::AppConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_BODY: &str = "You have a new notification";
pub const ACTION_OPEN: &str = "open";
pub const ACTION_CLOSE: &str = "close";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushPayload {
    pub title: Option<String>,
    pub message: Option<String>,
    pub data: Value,
}

impl PushPayload {
    /// Fields are read independently, so a wrong-typed `title` still keeps
    /// a valid `message` and `data`. Empty strings count as absent.
    pub fn parse(bytes: Option<&[u8]>) -> Self {
        let Some(bytes) = bytes else {
            return Self::default();
        };

        let object = match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(object)) => object,
            Ok(other) => {
                tracing::debug!(kind = json_kind(&other), "push payload is not a JSON object; using defaults");
                return Self::default();
            }
            Err(e) => {
                tracing::debug!(error = %e, len = bytes.len(), "push payload is not JSON; using defaults");
                return Self::default();
            }
        };

        let text = |key: &str| {
            object.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()).map(str::to_string)
        };
        Self { title: text("title"), message: text("message"), data: object.get("data").cloned().unwrap_or(Value::Null) }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub data: Value,
    pub actions: Vec<NotificationAction>,
}

pub fn build_notification(payload: &PushPayload, config: &AppConfig) -> Notification {
    Notification {
        title: payload.title.clone().unwrap_or_else(|| config.app_name.clone()),
        body: payload.message.clone().unwrap_or_else(|| DEFAULT_BODY.to_string()),
        icon: config.notification_icon.clone(),
        badge: config.notification_badge.clone(),
        data: payload.data.clone(),
        actions: vec![
            NotificationAction { action: ACTION_OPEN.to_string(), title: "Open".to_string() },
            NotificationAction { action: ACTION_CLOSE.to_string(), title: "Close".to_string() },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_without_payload() {
        let notification = build_notification(&PushPayload::parse(None), &AppConfig::default());
        assert_eq!(notification.title, "TeamPulse");
        assert_eq!(notification.body, DEFAULT_BODY);
        assert_eq!(notification.icon, "/icons/icon-192x192.png");
        assert_eq!(notification.badge, "/icons/badge-72x72.png");
        assert_eq!(notification.data, serde_json::Value::Null);
        let actions: Vec<&str> = notification.actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(actions, vec!["open", "close"]);
    }

    #[test]
    fn test_payload_overrides() {
        let bytes = br#"{"title":"New client","message":"Acme signed","data":{"clientId":42}}"#;
        let notification = build_notification(&PushPayload::parse(Some(bytes)), &AppConfig::default());
        assert_eq!(notification.title, "New client");
        assert_eq!(notification.body, "Acme signed");
        assert_eq!(notification.data, json!({"clientId": 42}));
    }

    #[test]
    fn test_malformed_payload_uses_defaults() {
        for bytes in [&b"not json"[..], b"[1,2,3]", b"\"text\"", b""] {
            assert_eq!(PushPayload::parse(Some(bytes)), PushPayload::default());
        }
    }

    #[test]
    fn test_wrong_typed_field_keeps_the_rest() {
        let bytes = br#"{"title":42,"message":"Acme signed","data":{"clientId":7}}"#;
        let notification = build_notification(&PushPayload::parse(Some(bytes)), &AppConfig::default());
        assert_eq!(notification.title, "TeamPulse");
        assert_eq!(notification.body, "Acme signed");
        assert_eq!(notification.data, json!({"clientId": 7}));

        let bytes = br#"{"title":"","message":null}"#;
        let notification = build_notification(&PushPayload::parse(Some(bytes)), &AppConfig::default());
        assert_eq!(notification.title, "TeamPulse");
        assert_eq!(notification.body, DEFAULT_BODY);
    }

    #[test]
    fn test_is_deterministic() {
        let payload = PushPayload::parse(Some(br#"{"title":"x"}"#));
        let config = AppConfig::default();
        assert_eq!(build_notification(&payload, &config), build_notification(&payload, &config));
    }
}
