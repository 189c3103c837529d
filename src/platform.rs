//! Platform facade
//!
//! Owns every component and the capability seams (host primitive, UI
//! bridge, popup surface). The embedding shell constructs one `Platform`
//! at startup, routes inbound messages to it on its event loop, and tears
//! it down at process exit; there is no ambient global state.

use crate::api;
use crate::bridge::{BrowsingDataFlags, UiBridge, UiEvent, UiRequest};
use crate::content::{self, ContentScriptBundle};
use crate::error::PlatformError;
use crate::host::ExtensionHost;
use crate::installer::{self, DownloadDisposition};
use crate::models::{ExtensionInfo, Tab};
use crate::popup::{ActiveTabHint, Point, PopupHost, PopupSurface, Rect};
use crate::registry::{self, UnpackedLoad};
use crate::shim;
use crate::storage::{Document, KeysSpec, StorageBridge};
use crate::tabs::{TabQuery, TabRegistry};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Directory holding one subdirectory per installed extension.
    pub extensions_root: PathBuf,
    /// URL scheme the shell serves extension resources under.
    pub extension_scheme: String,
    /// Filename extension identifying downloaded packages.
    pub package_extension: String,
}

impl PlatformConfig {
    pub fn new(extensions_root: impl Into<PathBuf>) -> Self {
        Self {
            extensions_root: extensions_root.into(),
            extension_scheme: "webext".to_string(),
            package_extension: "crx".to_string(),
        }
    }
}

pub struct Platform {
    config: PlatformConfig,
    host: Box<dyn ExtensionHost>,
    bridge: Box<dyn UiBridge>,
    surface: Box<dyn PopupSurface>,
    storage: StorageBridge,
    tabs: TabRegistry,
    popup: PopupHost,
}

impl Platform {
    pub fn new(
        config: PlatformConfig,
        host: Box<dyn ExtensionHost>,
        bridge: Box<dyn UiBridge>,
        surface: Box<dyn PopupSurface>,
    ) -> Self {
        let storage = StorageBridge::new(&config.extensions_root);
        let popup = PopupHost::new(config.extensions_root.join(shim::SHIM_FILE));
        Self {
            config,
            host,
            bridge,
            surface,
            storage,
            tabs: TabRegistry::new(),
            popup,
        }
    }

    /// Load everything installed on disk, then enumerate. Called once at
    /// startup; individual failures are logged and skipped.
    pub fn startup(&mut self) -> Vec<ExtensionInfo> {
        registry::load_installed(self.host.as_mut(), &self.config.extensions_root);
        self.list_extensions()
    }

    // --- extensions ---

    pub fn list_extensions(&self) -> Vec<ExtensionInfo> {
        registry::list_extensions(self.host.as_ref(), &self.config.extension_scheme)
    }

    pub fn load_unpacked(&mut self, dir: Option<PathBuf>) -> UnpackedLoad {
        registry::load_unpacked(self.host.as_mut(), dir, &self.config.extension_scheme)
    }

    pub fn remove_extension(&mut self, id: &str) -> Result<(), PlatformError> {
        registry::remove_extension(self.host.as_mut(), &mut self.storage, id)
    }

    pub fn install_from_archive(
        &mut self,
        archive: &Path,
        suggested_id: &str,
    ) -> Result<ExtensionInfo, PlatformError> {
        let ext = installer::install_from_archive(
            self.host.as_mut(),
            &self.config.extensions_root,
            archive,
            suggested_id,
        )?;
        let info = registry::derive_info(ext, &self.config.extension_scheme);
        self.bridge.send(UiRequest::ExtensionInstalled {
            name: info.name.clone(),
        });
        Ok(info)
    }

    /// Observe a completed download; installs it when it is a package,
    /// otherwise leaves it to default download handling.
    pub fn on_download_completed(
        &mut self,
        path: &Path,
    ) -> Result<Option<ExtensionInfo>, PlatformError> {
        let disposition = installer::handle_completed_download(
            self.host.as_mut(),
            &self.config.extensions_root,
            &self.config.package_extension,
            path,
        )?;
        match disposition {
            DownloadDisposition::Installed(ext) => {
                let info = registry::derive_info(ext, &self.config.extension_scheme);
                self.bridge.send(UiRequest::ExtensionInstalled {
                    name: info.name.clone(),
                });
                Ok(Some(info))
            }
            DownloadDisposition::Ignored => Ok(None),
        }
    }

    // --- navigation support ---

    pub fn content_scripts_for(&self, url: &str) -> Vec<ContentScriptBundle> {
        content::resolve_for_url(&self.list_extensions(), url)
    }

    // --- storage, keyed by extension identifier ---

    pub fn storage_get(&mut self, extension_id: &str, keys: &KeysSpec) -> Document {
        self.storage.get(extension_id, keys)
    }

    pub fn storage_set(&mut self, extension_id: &str, items: Document) {
        self.storage.set(extension_id, items);
    }

    pub fn storage_remove(&mut self, extension_id: &str, keys: &[String]) {
        self.storage.remove(extension_id, keys);
    }

    pub fn storage_clear(&mut self, extension_id: &str) {
        self.storage.clear(extension_id);
    }

    // --- tabs ---

    /// Apply one inbound synchronization message from the UI layer.
    pub fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::TabCreated(patch) | UiEvent::TabUpdated(patch) => self.tabs.upsert(patch),
            UiEvent::TabRemoved { id } => self.tabs.remove(&id),
            UiEvent::TabActivated { id } => self.tabs.set_active(&id),
        }
    }

    pub fn tabs(&self) -> &TabRegistry {
        &self.tabs
    }

    pub fn query_tabs(&self, filter: &TabQuery) -> Vec<Tab> {
        self.tabs.query(filter)
    }

    pub fn create_tab(&mut self, url: &str) -> Tab {
        self.tabs.request_create(url, self.bridge.as_ref())
    }

    pub fn navigate_tab(&mut self, id: &str, url: &str) {
        self.tabs.request_navigate(id, url, self.bridge.as_ref());
    }

    pub fn activate_tab(&mut self, id: &str) {
        self.tabs.request_activate(id, self.bridge.as_ref());
    }

    pub fn close_tab(&mut self, id: &str) {
        self.tabs.request_close(id, self.bridge.as_ref());
    }

    pub fn pin_tab(&mut self, id: &str, pinned: bool) {
        self.tabs.request_pin(id, pinned, self.bridge.as_ref());
    }

    // --- popup ---

    pub fn open_popup(
        &mut self,
        popup_url: &str,
        hint: &ActiveTabHint,
        anchor: Point,
        display: Rect,
    ) -> Result<(), PlatformError> {
        self.popup.open(
            self.surface.as_mut(),
            popup_url,
            hint,
            &self.tabs,
            anchor,
            display,
        )
    }

    pub fn close_popup(&mut self) {
        self.popup.close(self.surface.as_mut());
    }

    pub fn notify_popup_blur(&mut self) {
        self.popup.notify_blur(self.surface.as_mut());
    }

    // --- emulated-API requests from popup contexts ---

    /// Answer one request forwarded by the popup shim. `extension_id` is
    /// derived by the shell from the calling window's origin, never taken
    /// from the payload.
    pub fn handle_api_request(
        &mut self,
        extension_id: &str,
        operation: &str,
        payload: &Value,
    ) -> Value {
        api::dispatch(self, extension_id, operation, payload)
    }

    // --- delegation to browser chrome ---

    /// The core cannot clear browsing data itself; the UI owns it.
    pub fn clear_browsing_data(&mut self, flags: BrowsingDataFlags) {
        self.bridge.send(UiRequest::ClearBrowsingData { flags });
    }

    pub fn show_notification(&mut self, title: &str, body: &str, icon: Option<String>) {
        self.bridge.send(UiRequest::ShowNotification {
            title: title.to_string(),
            body: body.to_string(),
            icon,
        });
    }
}
