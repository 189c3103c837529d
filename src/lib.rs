//! Extension compatibility core for a Chromium-shell browser
//!
//! Loads packaged extensions, emulates a subset of the Chrome extension
//! platform (tabs, storage, notifications, browsingData, windows,
//! management, i18n), bridges extension actions to real browser tabs via
//! message passing, and persists per-extension key-value state.
//!
//! The shell provides the native capabilities at the seams: an
//! [`host::ExtensionHost`] that loads directories as extensions, a
//! [`popup::PopupSurface`] that materializes popup windows, and a
//! [`bridge::UiBridge`] that carries requests to browser chrome.

pub mod api;
pub mod bridge;
pub mod content;
pub mod error;
pub mod host;
pub mod installer;
pub mod matcher;
pub mod models;
pub mod parser;
pub mod platform;
pub mod popup;
pub mod registry;
pub mod shim;
pub mod storage;
pub mod tabs;
pub mod utils;

pub use bridge::{BrowsingDataFlags, ChannelBridge, UiBridge, UiEvent, UiRequest};
pub use content::{ContentScriptBundle, RunAt};
pub use error::PlatformError;
pub use host::{ExtensionHost, HostExtension};
pub use models::{ExtensionInfo, Manifest, Tab, TabPatch, TabStatus};
pub use platform::{Platform, PlatformConfig};
pub use popup::{ActiveTabHint, Point, PopupState, PopupSurface, Rect};
pub use registry::UnpackedLoad;
pub use storage::{KeysSpec, StorageBridge};
pub use tabs::{TabQuery, TabRegistry};
