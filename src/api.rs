//! Emulated-API request dispatch
//!
//! The popup shim forwards every call that escapes its window over the
//! shell's request/response channel as an operation name plus a JSON
//! payload. The shell resolves the calling window's extension identifier
//! from its own origin and passes both here; an identifier carried in the
//! payload is never honored, which keeps one extension's popup out of
//! another's storage.

use crate::bridge::BrowsingDataFlags;
use crate::platform::Platform;
use crate::storage::KeysSpec;
use serde_json::Value;
use tracing::debug;

/// Answer one request from a popup's scripting context. Unknown operations
/// resolve to null so an extension probing for newer APIs degrades instead
/// of hanging on an unanswered request.
pub fn dispatch(
    platform: &mut Platform,
    extension_id: &str,
    operation: &str,
    payload: &Value,
) -> Value {
    match operation {
        "tabs.create" => {
            let url = payload["url"].as_str().unwrap_or("about:blank");
            let tab = platform.create_tab(url);
            serde_json::to_value(tab).unwrap_or(Value::Null)
        }
        "tabs.update" => {
            // An absent id targets the active tab, as the platform API does
            let id = match payload["id"].as_str() {
                Some(id) => Some(id.to_string()),
                None => platform.tabs().active().map(|t| t.id.clone()),
            };
            let id = match id {
                Some(id) => id,
                None => return Value::Null,
            };
            let props = &payload["props"];
            if let Some(url) = props["url"].as_str() {
                platform.navigate_tab(&id, url);
            }
            if props["active"].as_bool() == Some(true) {
                platform.activate_tab(&id);
            }
            if let Some(pinned) = props["pinned"].as_bool() {
                platform.pin_tab(&id, pinned);
            }
            match platform.tabs().get(&id) {
                Some(tab) => serde_json::to_value(tab).unwrap_or(Value::Null),
                None => Value::Null,
            }
        }
        "tabs.remove" => {
            if let Some(id) = payload["id"].as_str() {
                platform.close_tab(id);
            }
            Value::Null
        }
        "tabs.sendMessage" | "tabs.executeScript" => {
            // Running script inside pages belongs to the host runtime
            debug!(operation, "delegated to the host runtime");
            Value::Null
        }
        "storage.get" => {
            let keys = KeysSpec::from_value(payload.get("keys").unwrap_or(&Value::Null));
            Value::Object(platform.storage_get(extension_id, &keys))
        }
        "storage.set" => {
            if let Some(items) = payload["items"].as_object() {
                platform.storage_set(extension_id, items.clone());
            }
            Value::Null
        }
        "storage.remove" => {
            let keys: Vec<String> = match &payload["keys"] {
                Value::String(key) => vec![key.clone()],
                Value::Array(keys) => keys
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            platform.storage_remove(extension_id, &keys);
            Value::Null
        }
        "storage.clear" => {
            platform.storage_clear(extension_id);
            Value::Null
        }
        "notifications.create" => {
            // The popup context could not show the notification itself;
            // relay it only when the manifest declares the permission,
            // silently dropping it otherwise
            let permitted = platform
                .list_extensions()
                .iter()
                .find(|e| e.id == extension_id)
                .map(|e| e.manifest.has_permission("notifications"))
                .unwrap_or(false);
            if permitted {
                let options = &payload["options"];
                platform.show_notification(
                    options["title"].as_str().unwrap_or_default(),
                    options["message"].as_str().unwrap_or_default(),
                    options["iconUrl"].as_str().map(str::to_string),
                );
            }
            payload["id"].clone()
        }
        "browsing-data.clear" => {
            let flags: BrowsingDataFlags =
                serde_json::from_value(payload["flags"].clone()).unwrap_or_default();
            platform.clear_browsing_data(flags);
            Value::Null
        }
        other => {
            debug!(operation = other, "unrecognized emulated-API operation");
            Value::Null
        }
    }
}
