//! Read-only view of the host's windows, monitors and workspaces.
//!
//! The layout engine never owns any of these. It borrows a [`Desktop`] for
//! each call and reports what it wants changed through an
//! [`EventResponse`](crate::layout_engine::EventResponse).

use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

use crate::common::collections::BTreeMap;
use crate::common::geometry::{Insets, Rect, Size};

new_key_type! {
    pub struct WindowId;
    pub struct MonitorId;
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WorkspaceId(pub i64);

impl std::fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FullscreenMode {
    /// Covers the usable area of the monitor.
    Maximized,
    /// Covers the whole monitor.
    Fullscreen,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Window {
    pub workspace: WorkspaceId,
    pub floating: bool,
    pub mapped: bool,
    /// Set until the window has been tiled once.
    pub first_map: bool,
    pub fullscreen: Option<FullscreenMode>,
    pub min_size: Option<Size>,
    pub max_size: Option<Size>,
    pub frame: Rect,
}

impl Window {
    pub fn new(workspace: WorkspaceId) -> Self {
        Self {
            workspace,
            floating: false,
            mapped: true,
            first_map: true,
            fullscreen: None,
            min_size: None,
            max_size: None,
            frame: Rect::default(),
        }
    }

    pub fn is_fullscreen(&self) -> bool { self.fullscreen.is_some() }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Workspace {
    pub monitor: Option<MonitorId>,
    pub special: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Monitor {
    pub rect: Rect,
    pub reserved: Insets,
    pub active_workspace: Option<WorkspaceId>,
    pub active_special: Option<WorkspaceId>,
}

impl Monitor {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            reserved: Insets::default(),
            active_workspace: None,
            active_special: None,
        }
    }

    /// The monitor rect without reserved areas.
    pub fn usable(&self) -> Rect { self.rect.inset(&self.reserved) }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Desktop {
    pub windows: SlotMap<WindowId, Window>,
    pub monitors: SlotMap<MonitorId, Monitor>,
    pub workspaces: BTreeMap<WorkspaceId, Workspace>,
    pub focused: Option<WindowId>,
}

impl Desktop {
    /// A desktop with one monitor showing workspace `workspace`.
    pub fn single_monitor(rect: Rect, workspace: WorkspaceId) -> (Self, MonitorId) {
        let mut desktop = Desktop::default();
        let monitor = desktop.add_monitor(Monitor::new(rect));
        desktop.add_workspace(workspace, monitor, false);
        (desktop, monitor)
    }

    pub fn add_monitor(&mut self, monitor: Monitor) -> MonitorId { self.monitors.insert(monitor) }

    /// Attaches a workspace to `monitor`, making it the active (or active
    /// special) workspace there if none is set yet.
    pub fn add_workspace(&mut self, id: WorkspaceId, monitor: MonitorId, special: bool) {
        self.workspaces.insert(id, Workspace { monitor: Some(monitor), special });
        if let Some(mon) = self.monitors.get_mut(monitor) {
            let slot = if special {
                &mut mon.active_special
            } else {
                &mut mon.active_workspace
            };
            slot.get_or_insert(id);
        }
    }

    pub fn add_window(&mut self, window: Window) -> WindowId { self.windows.insert(window) }

    pub fn window(&self, id: WindowId) -> Option<&Window> { self.windows.get(id) }

    pub fn is_special(&self, workspace: WorkspaceId) -> bool {
        self.workspaces.get(&workspace).is_some_and(|ws| ws.special)
    }

    pub fn monitor_for_workspace(&self, workspace: WorkspaceId) -> Option<(MonitorId, &Monitor)> {
        let id = self.workspaces.get(&workspace)?.monitor?;
        Some((id, self.monitors.get(id)?))
    }

    pub fn monitor_for_window(&self, window: WindowId) -> Option<(MonitorId, &Monitor)> {
        self.monitor_for_workspace(self.window(window)?.workspace)
    }

    /// The fullscreen window of `workspace`, if any.
    pub fn fullscreen_window(&self, workspace: WorkspaceId) -> Option<(WindowId, FullscreenMode)> {
        self.windows
            .iter()
            .filter(|(_, w)| w.workspace == workspace && w.mapped)
            .find_map(|(id, w)| w.fullscreen.map(|mode| (id, mode)))
    }
}
