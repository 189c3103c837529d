//! Cross-process tab mirror
//!
//! The registry answers the emulated tab query APIs. It is never the source
//! of navigation truth: the UI's rendering surface is, and this index is
//! kept consistent through explicit synchronization messages. Emulated
//! mutations are requests outward to the UI plus a provisional local update
//! so callers never observe a gap before the UI's confirmation echoes back.

use crate::bridge::{UiBridge, UiRequest};
use crate::matcher;
use crate::models::{Tab, TabPatch, TabStatus};
use serde::{Deserialize, Serialize};

const MAIN_WINDOW: &str = "main";

#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: Vec<Tab>,
    next_provisional: u64,
}

/// Filter accepted by the emulated query operation. The window filters are
/// accepted but have no effect: only one window exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TabQuery {
    pub active: Option<bool>,
    pub url: Option<Vec<String>>,
    pub title: Option<String>,
    pub current_window: Option<bool>,
    pub last_focused_window: Option<bool>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a partial record, creating it with defaults when unknown.
    /// An incoming active flag deactivates every other tab in the same
    /// operation; there is no intermediate state with two active tabs.
    pub fn upsert(&mut self, patch: TabPatch) {
        let activate = patch.active == Some(true);

        match self.tabs.iter_mut().find(|t| t.id == patch.id) {
            Some(tab) => {
                if let Some(url) = patch.url {
                    tab.url = url;
                }
                if let Some(title) = patch.title {
                    tab.title = title;
                }
                if let Some(active) = patch.active {
                    tab.active = active;
                }
                if let Some(window_id) = patch.window_id {
                    tab.window_id = window_id;
                }
                if let Some(favicon_url) = patch.favicon_url {
                    tab.favicon_url = Some(favicon_url);
                }
                if let Some(status) = patch.status {
                    tab.status = status;
                }
            }
            None => {
                let tab = Tab {
                    id: patch.id.clone(),
                    url: patch.url.unwrap_or_default(),
                    title: patch.title.unwrap_or_default(),
                    active: patch.active.unwrap_or(false),
                    window_id: patch.window_id.unwrap_or_else(|| MAIN_WINDOW.to_string()),
                    index: self.tabs.len(),
                    favicon_url: patch.favicon_url,
                    status: patch.status.unwrap_or(TabStatus::Complete),
                    incognito: false,
                };
                self.tabs.push(tab);
            }
        }

        if activate {
            self.deactivate_all_except(&patch.id);
        }
    }

    /// Remove a record and restore a dense 0..N-1 index ordering. If the
    /// removed tab was active, the last-indexed remaining tab takes over.
    pub fn remove(&mut self, id: &str) {
        let was_active = self
            .tabs
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.active)
            .unwrap_or(false);

        self.tabs.retain(|t| t.id != id);
        self.reindex();

        if was_active {
            if let Some(last) = self.tabs.last_mut() {
                last.active = true;
            }
        }
    }

    /// Activate a tab, deactivating all others atomically. Activation
    /// messages may race ahead of creation messages, so an unknown id gets
    /// a provisional record rather than being dropped.
    pub fn set_active(&mut self, id: &str) {
        if !self.tabs.iter().any(|t| t.id == id) {
            self.upsert(TabPatch::new(id));
        }
        for tab in &mut self.tabs {
            tab.active = tab.id == id;
        }
    }

    pub fn get(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn active(&self) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.active)
    }

    pub fn all(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn query(&self, filter: &TabQuery) -> Vec<Tab> {
        self.tabs
            .iter()
            .filter(|tab| {
                if let Some(active) = filter.active {
                    if tab.active != active {
                        return false;
                    }
                }
                if let Some(patterns) = &filter.url {
                    if !matcher::matches(&tab.url, patterns) {
                        return false;
                    }
                }
                if let Some(needle) = &filter.title {
                    if !tab.title.contains(needle.as_str()) {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect()
    }

    /// Emulated `tabs.create`: asks the UI to open the tab and records a
    /// provisional entry until the creation message echoes back.
    pub fn request_create(&mut self, url: &str, bridge: &dyn UiBridge) -> Tab {
        bridge.send(UiRequest::CreateTab {
            url: url.to_string(),
        });

        self.next_provisional += 1;
        let tab = Tab {
            id: format!("pending-{}", self.next_provisional),
            url: url.to_string(),
            title: String::new(),
            active: false,
            window_id: MAIN_WINDOW.to_string(),
            index: self.tabs.len(),
            favicon_url: None,
            status: TabStatus::Loading,
            incognito: false,
        };
        self.tabs.push(tab.clone());
        tab
    }

    /// Emulated `tabs.update` navigation.
    pub fn request_navigate(&mut self, id: &str, url: &str, bridge: &dyn UiBridge) {
        bridge.send(UiRequest::NavigateTab {
            id: id.to_string(),
            url: url.to_string(),
        });
        if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) {
            tab.url = url.to_string();
            tab.status = TabStatus::Loading;
        }
    }

    pub fn request_activate(&mut self, id: &str, bridge: &dyn UiBridge) {
        bridge.send(UiRequest::ActivateTab { id: id.to_string() });
        self.set_active(id);
    }

    /// Emulated `tabs.remove`.
    pub fn request_close(&mut self, id: &str, bridge: &dyn UiBridge) {
        bridge.send(UiRequest::CloseTab { id: id.to_string() });
        self.remove(id);
    }

    /// Pin state lives entirely in the UI; this is a pure pass-through.
    pub fn request_pin(&self, id: &str, pinned: bool, bridge: &dyn UiBridge) {
        bridge.send(UiRequest::PinTab {
            id: id.to_string(),
            pinned,
        });
    }

    fn deactivate_all_except(&mut self, id: &str) {
        for tab in &mut self.tabs {
            if tab.id != id {
                tab.active = false;
            }
        }
    }

    fn reindex(&mut self) {
        for (index, tab) in self.tabs.iter_mut().enumerate() {
            tab.index = index;
        }
    }
}
