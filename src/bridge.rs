//! Message passing between the platform core and browser chrome

use crate::models::TabPatch;
use serde::{Deserialize, Serialize};
use std::sync::mpsc;

/// Outbound requests asking the UI layer to act. Fire-and-forget: the UI
/// echoes tab changes back as [`UiEvent`]s to keep the registry consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiRequest {
    CreateTab { url: String },
    NavigateTab { id: String, url: String },
    ActivateTab { id: String },
    CloseTab { id: String },
    PinTab { id: String, pinned: bool },
    ClearBrowsingData { flags: BrowsingDataFlags },
    ExtensionInstalled { name: String },
    ShowNotification { title: String, body: String, icon: Option<String> },
}

/// Inbound tab lifecycle synchronization from the UI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiEvent {
    TabCreated(TabPatch),
    TabUpdated(TabPatch),
    TabRemoved { id: String },
    TabActivated { id: String },
}

/// Data categories the UI is asked to clear on the platform's behalf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrowsingDataFlags {
    pub cache: bool,
    pub cookies: bool,
    pub history: bool,
    pub local_storage: bool,
    pub downloads: bool,
}

pub trait UiBridge {
    fn send(&self, request: UiRequest);
}

/// Channel-backed bridge; the shell drains the receiver on its event loop.
pub struct ChannelBridge {
    tx: mpsc::Sender<UiRequest>,
}

impl ChannelBridge {
    pub fn new() -> (Self, mpsc::Receiver<UiRequest>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl UiBridge for ChannelBridge {
    fn send(&self, request: UiRequest) {
        // A disconnected receiver means the shell is shutting down
        let _ = self.tx.send(request);
    }
}
