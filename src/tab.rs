//! Tab descriptors as delivered by the extension host.
//!
//! A `TabDescriptor` is a value snapshot of a browser tab. The core reads the
//! URL and the id; every other field the host sends is preserved verbatim so a
//! descriptor survives a round trip through the content script unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Host-assigned tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(i64);

impl TabId {
    /// Wraps a raw host tab id.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw host tab id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for TabId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of one browser tab at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabDescriptor {
    /// Host tab id, when the host provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TabId>,

    /// Tab URL. Hosts omit it for tabs the extension may not inspect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Remaining host fields (title, status, windowId, ...), kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TabDescriptor {
    /// Creates a descriptor carrying only a URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: None,
            url: Some(url.into()),
            extra: Map::new(),
        }
    }

    /// Sets the tab id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<TabId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds an extra host field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The tab URL, if known.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

/// Tab load status reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabStatus {
    /// Navigation started, document not finished.
    Loading,
    /// Document finished loading.
    Complete,
    /// Discarded or unloaded by the browser.
    Unloaded,
    /// Any status this crate does not know about.
    #[serde(other)]
    Other,
}

/// The delta part of a tab-updated event.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TabStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ChangeInfo {
    /// A change reporting only a status transition.
    #[must_use]
    pub const fn status(status: TabStatus) -> Self {
        Self {
            status: Some(status),
            url: None,
        }
    }

    /// Returns true if this change marks the end of a page load.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == Some(TabStatus::Complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_preserves_unknown_host_fields() {
        let raw = serde_json::json!({
            "id": 7,
            "url": "https://a.test/",
            "title": "A",
            "windowId": 3
        });

        let tab: TabDescriptor = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(tab.id, Some(TabId::new(7)));
        assert_eq!(tab.url(), Some("https://a.test/"));
        assert_eq!(tab.extra.get("title"), Some(&Value::from("A")));

        assert_eq!(serde_json::to_value(&tab).unwrap(), raw);
    }

    #[test]
    fn descriptor_without_url_deserializes() {
        let tab: TabDescriptor = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(tab.url(), None);
    }

    #[test]
    fn change_info_complete_detection() {
        let change: ChangeInfo = serde_json::from_str(r#"{"status":"complete"}"#).unwrap();
        assert!(change.is_complete());

        let change: ChangeInfo = serde_json::from_str(r#"{"status":"loading"}"#).unwrap();
        assert!(!change.is_complete());

        let change: ChangeInfo = serde_json::from_str(r#"{"status":"prerendering"}"#).unwrap();
        assert_eq!(change.status, Some(TabStatus::Other));

        assert!(!ChangeInfo::default().is_complete());
    }
}
