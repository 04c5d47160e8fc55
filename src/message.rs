//! Unload messages and the content script that sends them.
//!
//! When a tab finishes loading, the background injects [`content_script`]
//! into it. On `beforeunload` that script posts an [`UnloadMessage`] carrying
//! a snapshot of the tab taken at injection time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ExecutionError, TriggerResult, ValidationError};
use crate::tab::TabDescriptor;

/// Action tag identifying unload messages.
pub const INJECT_ACTION: &str = "page-reload-trigger-start-inject";

/// Message posted by the content script on page unload.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnloadMessage {
    pub action: String,
    pub tab: TabDescriptor,
}

impl UnloadMessage {
    /// Creates an unload message for a tab.
    #[must_use]
    pub fn new(tab: TabDescriptor) -> Self {
        Self {
            action: INJECT_ACTION.to_string(),
            tab,
        }
    }

    /// Encodes the message as it travels over the host transport.
    pub fn to_value(&self) -> TriggerResult<Value> {
        serde_json::to_value(self).map_err(|e| {
            ExecutionError::Serialization {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Decodes a transport message.
    ///
    /// Returns `Ok(None)` for messages carrying another action, which belong to
    /// other listeners. The tab may arrive as an object or as a JSON string.
    pub fn from_value(message: &Value) -> TriggerResult<Option<Self>> {
        let action = message.get("action").and_then(Value::as_str);
        if action != Some(INJECT_ACTION) {
            return Ok(None);
        }

        let invalid = |reason: String| ValidationError::InvalidMessage { reason };

        let raw_tab = message
            .get("tab")
            .ok_or_else(|| invalid("missing 'tab'".to_string()))?;

        let tab = match raw_tab {
            Value::String(json) => serde_json::from_str(json),
            other => TabDescriptor::deserialize(other),
        }
        .map_err(|e| invalid(e.to_string()))?;

        Ok(Some(Self::new(tab)))
    }
}

/// Builds the script injected into a loaded tab.
///
/// The tab snapshot is embedded as a JSON literal. U+2028 and U+2029 are
/// escaped since they are legal in JSON strings but terminate lines in older
/// JavaScript engines.
pub fn content_script(tab: &TabDescriptor) -> TriggerResult<String> {
    let snapshot = serde_json::to_string(tab).map_err(|e| ExecutionError::Serialization {
        message: e.to_string(),
    })?;
    let snapshot = snapshot.replace('\u{2028}', "\\u2028").replace('\u{2029}', "\\u2029");

    Ok(format!(
        "window.addEventListener(\"beforeunload\", function(event) {{\
         chrome.extension.sendMessage({{action: \"{INJECT_ACTION}\", tab: {snapshot}}});\
         }});"
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn foreign_actions_are_not_ours() {
        let msg = json!({"action": "something-else", "tab": {"url": "https://a.test"}});
        assert!(UnloadMessage::from_value(&msg).unwrap().is_none());

        let msg = json!({"tab": {"url": "https://a.test"}});
        assert!(UnloadMessage::from_value(&msg).unwrap().is_none());

        assert!(UnloadMessage::from_value(&json!("ping")).unwrap().is_none());
    }

    #[test]
    fn decodes_object_tab() {
        let msg = json!({"action": INJECT_ACTION, "tab": {"id": 3, "url": "https://a.test"}});
        let decoded = UnloadMessage::from_value(&msg).unwrap().unwrap();
        assert_eq!(decoded.tab.url(), Some("https://a.test"));
    }

    #[test]
    fn decodes_stringified_tab() {
        let msg = json!({"action": INJECT_ACTION, "tab": "{\"url\":\"https://a.test\"}"});
        let decoded = UnloadMessage::from_value(&msg).unwrap().unwrap();
        assert_eq!(decoded.tab.url(), Some("https://a.test"));
    }

    #[test]
    fn recognized_but_malformed_is_an_error() {
        let msg = json!({"action": INJECT_ACTION});
        assert!(UnloadMessage::from_value(&msg).unwrap_err().is_validation());

        let msg = json!({"action": INJECT_ACTION, "tab": 5});
        assert!(UnloadMessage::from_value(&msg).unwrap_err().is_validation());
    }

    #[test]
    fn encoded_message_decodes_back() {
        let tab = TabDescriptor::new("https://a.test").with_id(9);
        let value = UnloadMessage::new(tab.clone()).to_value().unwrap();
        assert_eq!(value["action"], json!(INJECT_ACTION));
        assert_eq!(UnloadMessage::from_value(&value).unwrap().unwrap().tab, tab);
    }

    #[test]
    fn content_script_embeds_action_and_snapshot() {
        let tab = TabDescriptor::new("https://a.test/\u{2028}").with_id(4);
        let script = content_script(&tab).unwrap();

        assert!(script.starts_with("window.addEventListener(\"beforeunload\""));
        assert!(script.contains(INJECT_ACTION));
        assert!(script.contains("\"url\":\"https://a.test/\\u2028\""));
        assert!(script.contains("\"id\":4"));
        assert!(!script.contains('\u{2028}'));
    }
}
