//! Extension popup lifecycle
//!
//! At most one popup exists at a time: closed -> opening -> shown ->
//! closed. Opening regenerates the polyfill shim from the freshest tab
//! data so the popup's emulated `tabs` API reflects reality at open time,
//! not whatever was current when the toolbar button was rendered.

use crate::error::PlatformError;
use crate::models::{Tab, TabStatus};
use crate::shim;
use crate::tabs::TabRegistry;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

pub const POPUP_WIDTH: u32 = 380;
pub const POPUP_HEIGHT: u32 = 560;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupState {
    Closed,
    Opening,
    Shown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Native window surface provided by the shell. The window is frameless
/// and transient; closing releases all native resources.
pub trait PopupSurface {
    fn open(&mut self, url: &str, frame: Rect) -> anyhow::Result<()>;
    fn close(&mut self);
}

/// Active-tab data captured by the UI when the popup button was pressed.
/// May be stale by open time; the registry is consulted first.
#[derive(Debug, Clone, Default)]
pub struct ActiveTabHint {
    pub id: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
}

pub struct PopupHost {
    state: PopupState,
    shim_path: PathBuf,
}

impl PopupHost {
    pub fn new(shim_path: impl Into<PathBuf>) -> Self {
        Self {
            state: PopupState::Closed,
            shim_path: shim_path.into(),
        }
    }

    pub fn state(&self) -> PopupState {
        self.state
    }

    /// Open `popup_url` adjacent to `anchor`. An already-shown popup is
    /// closed first.
    pub fn open(
        &mut self,
        surface: &mut dyn PopupSurface,
        popup_url: &str,
        hint: &ActiveTabHint,
        tabs: &TabRegistry,
        anchor: Point,
        display: Rect,
    ) -> Result<(), PlatformError> {
        if self.state != PopupState::Closed {
            surface.close();
            self.state = PopupState::Closed;
        }
        self.state = PopupState::Opening;

        let snapshot = snapshot_with_hint(tabs, hint);
        let source = shim::generate(&snapshot);
        if let Some(parent) = self.shim_path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Err(e) = fs::write(&self.shim_path, source) {
            // The popup still opens; its emulated APIs just see no shim
            warn!(path = %self.shim_path.display(), error = %e, "failed to write popup shim");
        }

        let frame = position_popup(anchor, (POPUP_WIDTH, POPUP_HEIGHT), display);
        match surface.open(popup_url, frame) {
            Ok(()) => {
                self.state = PopupState::Shown;
                debug!(url = popup_url, "popup shown");
                Ok(())
            }
            Err(e) => {
                self.state = PopupState::Closed;
                warn!(url = popup_url, error = %e, "popup failed to load");
                Err(PlatformError::PopupLoadFailed(e.to_string()))
            }
        }
    }

    /// Focus loss closes the popup (click-away).
    pub fn notify_blur(&mut self, surface: &mut dyn PopupSurface) {
        if self.state == PopupState::Shown {
            self.close(surface);
        }
    }

    pub fn close(&mut self, surface: &mut dyn PopupSurface) {
        if self.state != PopupState::Closed {
            surface.close();
        }
        self.state = PopupState::Closed;
    }
}

/// Snapshot for the shim, with the active tab resolved from the freshest
/// source available: registry lookup by hint id, then the registry's
/// current active tab, then the hint's raw fields.
fn snapshot_with_hint(tabs: &TabRegistry, hint: &ActiveTabHint) -> Vec<Tab> {
    let mut snapshot: Vec<Tab> = tabs.all().to_vec();

    let resolved_id = hint
        .id
        .as_ref()
        .filter(|id| tabs.get(id).is_some())
        .cloned()
        .or_else(|| tabs.active().map(|t| t.id.clone()));

    match resolved_id {
        Some(id) => {
            for tab in &mut snapshot {
                tab.active = tab.id == id;
            }
        }
        None => {
            if hint.id.is_some() || hint.url.is_some() {
                snapshot.push(Tab {
                    id: hint.id.clone().unwrap_or_else(|| "hint".to_string()),
                    url: hint.url.clone().unwrap_or_default(),
                    title: hint.title.clone().unwrap_or_default(),
                    active: true,
                    window_id: "main".to_string(),
                    index: snapshot.len(),
                    favicon_url: None,
                    status: TabStatus::Complete,
                    incognito: false,
                });
            }
        }
    }

    snapshot
}

/// Place the popup adjacent to the cursor, clamped to the display. If it
/// would overflow the bottom edge it flips above the cursor instead.
pub fn position_popup(anchor: Point, size: (u32, u32), display: Rect) -> Rect {
    let width = size.0 as i32;
    let height = size.1 as i32;
    let right = display.x + display.width as i32;
    let bottom = display.y + display.height as i32;

    let mut x = anchor.x;
    if x + width > right {
        x = right - width;
    }
    if x < display.x {
        x = display.x;
    }

    let mut y = anchor.y;
    if y + height > bottom {
        y = anchor.y - height;
    }
    if y + height > bottom {
        y = bottom - height;
    }
    if y < display.y {
        y = display.y;
    }

    Rect {
        x,
        y,
        width: size.0,
        height: size.1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TabPatch;
    use anyhow::anyhow;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeSurface {
        open_windows: usize,
        opened: Vec<String>,
        fail_next: bool,
    }

    impl PopupSurface for FakeSurface {
        fn open(&mut self, url: &str, _frame: Rect) -> anyhow::Result<()> {
            if self.fail_next {
                return Err(anyhow!("renderer crashed"));
            }
            self.open_windows += 1;
            self.opened.push(url.to_string());
            Ok(())
        }

        fn close(&mut self) {
            self.open_windows = self.open_windows.saturating_sub(1);
        }
    }

    fn display() -> Rect {
        Rect {
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
        }
    }

    fn host_in(dir: &TempDir) -> PopupHost {
        PopupHost::new(dir.path().join(shim::SHIM_FILE))
    }

    #[test]
    fn second_open_leaves_exactly_one_window() {
        let dir = TempDir::new().unwrap();
        let mut host = host_in(&dir);
        let mut surface = FakeSurface::default();
        let tabs = TabRegistry::new();
        let hint = ActiveTabHint::default();
        let anchor = Point { x: 100, y: 100 };

        host.open(&mut surface, "webext://a/popup.html", &hint, &tabs, anchor, display())
            .unwrap();
        host.open(&mut surface, "webext://b/popup.html", &hint, &tabs, anchor, display())
            .unwrap();

        assert_eq!(surface.open_windows, 1);
        assert_eq!(host.state(), PopupState::Shown);
    }

    #[test]
    fn blur_closes_and_open_failure_resets() {
        let dir = TempDir::new().unwrap();
        let mut host = host_in(&dir);
        let mut surface = FakeSurface::default();
        let tabs = TabRegistry::new();
        let hint = ActiveTabHint::default();
        let anchor = Point { x: 0, y: 0 };

        host.open(&mut surface, "webext://a/popup.html", &hint, &tabs, anchor, display())
            .unwrap();
        host.notify_blur(&mut surface);
        assert_eq!(host.state(), PopupState::Closed);
        assert_eq!(surface.open_windows, 0);

        surface.fail_next = true;
        let err = host
            .open(&mut surface, "webext://a/popup.html", &hint, &tabs, anchor, display())
            .unwrap_err();
        assert!(matches!(err, PlatformError::PopupLoadFailed(_)));
        assert_eq!(host.state(), PopupState::Closed);
    }

    #[test]
    fn shim_is_regenerated_with_fresh_tab_data() {
        let dir = TempDir::new().unwrap();
        let mut host = host_in(&dir);
        let mut surface = FakeSurface::default();
        let mut tabs = TabRegistry::new();
        let anchor = Point { x: 10, y: 10 };

        tabs.upsert(TabPatch {
            id: "t1".into(),
            url: Some("https://first.example/".into()),
            active: Some(true),
            ..Default::default()
        });
        host.open(
            &mut surface,
            "webext://a/popup.html",
            &ActiveTabHint::default(),
            &tabs,
            anchor,
            display(),
        )
        .unwrap();
        let first = fs::read_to_string(dir.path().join(shim::SHIM_FILE)).unwrap();
        assert!(first.contains("https://first.example/"));

        tabs.upsert(TabPatch {
            id: "t2".into(),
            url: Some("https://second.example/".into()),
            active: Some(true),
            ..Default::default()
        });
        host.open(
            &mut surface,
            "webext://a/popup.html",
            &ActiveTabHint::default(),
            &tabs,
            anchor,
            display(),
        )
        .unwrap();
        let second = fs::read_to_string(dir.path().join(shim::SHIM_FILE)).unwrap();
        assert!(second.contains("https://second.example/"));
    }

    #[test]
    fn hint_resolution_prefers_registry_then_falls_back() {
        let mut tabs = TabRegistry::new();
        tabs.upsert(TabPatch {
            id: "known".into(),
            url: Some("https://known.example/".into()),
            active: Some(false),
            ..Default::default()
        });
        tabs.upsert(TabPatch {
            id: "current".into(),
            url: Some("https://current.example/".into()),
            active: Some(true),
            ..Default::default()
        });

        // Hint id found in the registry wins over the current active tab
        let hint = ActiveTabHint {
            id: Some("known".into()),
            url: Some("https://stale.example/".into()),
            title: None,
        };
        let snapshot = snapshot_with_hint(&tabs, &hint);
        let active: Vec<_> = snapshot.iter().filter(|t| t.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "known");
        assert_eq!(active[0].url, "https://known.example/");

        // Unknown hint id falls back to the registry's active tab
        let hint = ActiveTabHint {
            id: Some("gone".into()),
            url: None,
            title: None,
        };
        let snapshot = snapshot_with_hint(&tabs, &hint);
        assert_eq!(snapshot.iter().find(|t| t.active).unwrap().id, "current");

        // Empty registry falls back to the hint's raw fields
        let empty = TabRegistry::new();
        let hint = ActiveTabHint {
            id: Some("raw".into()),
            url: Some("https://raw.example/".into()),
            title: Some("Raw".into()),
        };
        let snapshot = snapshot_with_hint(&empty, &hint);
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].active);
        assert_eq!(snapshot[0].url, "https://raw.example/");
    }

    #[test]
    fn geometry_clamps_and_flips() {
        let d = display();
        let size = (POPUP_WIDTH, POPUP_HEIGHT);

        // Fits below the cursor
        let frame = position_popup(Point { x: 100, y: 100 }, size, d);
        assert_eq!((frame.x, frame.y), (100, 100));

        // Overflows the right edge: clamped
        let frame = position_popup(Point { x: 1900, y: 100 }, size, d);
        assert_eq!(frame.x, 1920 - POPUP_WIDTH as i32);

        // Overflows the bottom edge: flips above the cursor
        let frame = position_popup(Point { x: 100, y: 1000 }, size, d);
        assert_eq!(frame.y, 1000 - POPUP_HEIGHT as i32);

        // Never leaves the display even for out-of-range anchors
        let frame = position_popup(Point { x: -50, y: -50 }, size, d);
        assert!(frame.x >= d.x && frame.y >= d.y);
        let frame = position_popup(Point { x: 5000, y: 5000 }, size, d);
        assert!(frame.x + frame.width as i32 <= 1920);
        assert!(frame.y + frame.height as i32 <= 1080);
    }
}
