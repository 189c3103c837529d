//! Manifest data structures for loaded extensions
//!
//! Only the keys the platform inspects are typed; everything else is kept
//! verbatim in `extra` because extensions ship arbitrary vendor fields.
//! Every accessor is total: an absent field reads as `None` or empty.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub manifest_version: u8,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icons: Option<HashMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionBlock>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_action: Option<ActionBlock>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_action: Option<ActionBlock>,

    #[serde(default)]
    pub permissions: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_scripts: Vec<ContentScriptDecl>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Manifest {
    /// The toolbar action block, checked in the platform's priority order.
    pub fn action_block(&self) -> Option<&ActionBlock> {
        self.action
            .as_ref()
            .or(self.browser_action.as_ref())
            .or(self.page_action.as_ref())
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_popup: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_icon: Option<IconSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IconSet {
    Single(String),
    Multiple(HashMap<String, String>),
}

/// One `content_scripts` block as declared in the manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentScriptDecl {
    #[serde(default)]
    pub matches: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_matches: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub js: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub css: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_at: Option<String>,

    #[serde(default)]
    pub all_frames: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_block_priority() {
        let manifest: Manifest = serde_json::from_str(
            r#"{
                "browser_action": {"default_popup": "legacy.html"},
                "action": {"default_popup": "popup.html"}
            }"#,
        )
        .unwrap();

        let block = manifest.action_block().unwrap();
        assert_eq!(block.default_popup.as_deref(), Some("popup.html"));
    }

    #[test]
    fn vendor_fields_are_preserved() {
        let manifest: Manifest = serde_json::from_str(
            r#"{
                "name": "Test",
                "update_url": "https://example.com/updates.xml",
                "minimum_chrome_version": "96"
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.extra.len(), 2);
        assert!(manifest.extra.contains_key("update_url"));
    }

    #[test]
    fn absent_fields_read_as_empty() {
        let manifest: Manifest = serde_json::from_str("{}").unwrap();
        assert!(manifest.name.is_none());
        assert!(manifest.content_scripts.is_empty());
        assert!(manifest.action_block().is_none());
        assert!(!manifest.has_permission("notifications"));
    }
}
