use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::command::{FocusHint, LayoutCommand};
use super::placement::{arrange, usable_area};
use super::resize::{ResizeDelta, adjust_ratios};
use super::utils::{ApplyContext, WindowPlacement, apply_node_rect, place_single_rect};
use super::workspaces::{Overrides, WorkspaceLayouts, WorkspaceSettings};
use super::{LayoutError, ORDER_CYCLE, ORIENTATION_CYCLE, Orientation, advance};
use crate::common::config::Config;
use crate::common::geometry::{Insets, Round, Size};
use crate::model::nodes::{MASTER_FRACTION_MAX, MASTER_FRACTION_MIN};
use crate::model::{
    Desktop, FullscreenMode, Monitor, MonitorId, Node, NodeRegistry, Window, WindowId, WorkspaceId,
};

/// Floating windows never shrink below this on either axis.
const MIN_FLOATING_SIZE: f64 = 20.0;

/// Everything the host should change after an engine call.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct EventResponse {
    pub placements: Vec<WindowPlacement>,
    pub focus_window: Option<WindowId>,
    /// Fullscreen transitions to apply. The host reports each one back
    /// through [`LayoutEngine::fullscreen_changed`].
    pub fullscreen_changes: Vec<(WindowId, Option<FullscreenMode>)>,
    /// Windows that moved to another workspace in a cross-workspace swap.
    pub workspace_changes: Vec<(WindowId, WorkspaceId)>,
    /// Windows whose frames the host should re-apply, in order.
    pub refresh_windows: Vec<WindowId>,
    pub floating_resize: Option<(WindowId, Size)>,
}

impl EventResponse {
    pub fn is_empty(&self) -> bool { self == &EventResponse::default() }

    /// Folds a later response into this one. Later placements and focus win.
    pub fn merge(&mut self, other: EventResponse) {
        for placement in other.placements {
            self.placements.retain(|p| p.window != placement.window);
            self.placements.push(placement);
        }
        if other.focus_window.is_some() {
            self.focus_window = other.focus_window;
        }
        self.fullscreen_changes.extend(other.fullscreen_changes);
        self.workspace_changes.extend(other.workspace_changes);
        self.refresh_windows.extend(other.refresh_windows);
        if other.floating_resize.is_some() {
            self.floating_resize = other.floating_resize;
        }
    }

    /// Writes the response into `desktop` the way a host would.
    pub fn apply_to(&self, desktop: &mut Desktop) {
        for placement in &self.placements {
            if let Some(window) = desktop.windows.get_mut(placement.window) {
                window.frame = placement.frame;
            }
        }
        for &(wid, mode) in &self.fullscreen_changes {
            if let Some(window) = desktop.windows.get_mut(wid) {
                window.fullscreen = mode;
            }
        }
        for &(wid, workspace) in &self.workspace_changes {
            if let Some(window) = desktop.windows.get_mut(wid) {
                window.workspace = workspace;
            }
        }
        if let Some((wid, size)) = self.floating_resize {
            if let Some(window) = desktop.windows.get_mut(wid) {
                window.frame.size = size;
            }
        }
        if self.focus_window.is_some() {
            desktop.focused = self.focus_window;
        }
    }
}

/// How a window joins a workspace, decided before anything is mutated.
struct Insertion {
    workspace: WorkspaceId,
    at_front: bool,
    is_master: bool,
    promoted: bool,
    previous_master: Option<WindowId>,
    master_fraction: f64,
    master_adjusted: bool,
}

#[derive(Debug)]
pub struct LayoutEngine {
    config: Config,
    nodes: NodeRegistry,
    workspaces: WorkspaceLayouts,
}

impl LayoutEngine {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            nodes: NodeRegistry::default(),
            workspaces: WorkspaceLayouts::default(),
        }
    }

    pub fn config(&self) -> &Config { &self.config }

    /// Swaps in a new configuration. Options overridden by commands are kept.
    pub fn set_config(&mut self, config: Config) { self.config = config; }

    pub fn node(&self, window: WindowId) -> Option<&Node> { self.nodes.find(window) }

    pub fn nodes(&self) -> &NodeRegistry { &self.nodes }

    pub fn is_tiled(&self, window: WindowId) -> bool { self.nodes.contains(window) }

    /// Current settings of `workspace`, if the engine has seen it.
    pub fn settings(&self, workspace: WorkspaceId) -> Option<&WorkspaceSettings> {
        self.workspaces.get(workspace)
    }

    /// Tiles `window`. Floating and already tiled windows are left alone.
    ///
    /// Fails with [`LayoutError::CannotTile`] when the window's size limits
    /// do not fit its slot. Nothing changes in that case and the host should
    /// float the window.
    pub fn add_window(
        &mut self,
        desktop: &Desktop,
        window: WindowId,
    ) -> Result<EventResponse, LayoutError> {
        let win = desktop.window(window).ok_or(LayoutError::UnknownWindow(window))?;
        if win.floating || self.nodes.contains(window) {
            return Ok(EventResponse::default());
        }
        let plan = self.plan_insertion(desktop, window, win)?;
        Ok(self.insert(desktop, window, plan))
    }

    fn plan_insertion(
        &mut self,
        desktop: &Desktop,
        window: WindowId,
        win: &Window,
    ) -> Result<Insertion, LayoutError> {
        let workspace = win.workspace;
        let settings = self.workspaces.resolve(&self.config, workspace);
        let (at_front, new_is_master, auto_promote) =
            (settings.new_on_top, settings.new_is_master, settings.auto_promote);

        let count = self.nodes.on_workspace(workspace).filter(|n| n.window != window).count() + 1;
        let opening_on = desktop
            .focused
            .filter(|&f| f != window)
            .and_then(|f| self.nodes.find(f))
            .filter(|n| n.workspace == workspace)
            .or_else(|| self.nodes.first_master(workspace));

        let promoted = auto_promote > 1 && count == auto_promote;
        let is_master = new_is_master
            || count == 1
            || (!win.first_map && opening_on.is_some_and(|n| n.is_master))
            || promoted;

        let previous = self.nodes.first_master(workspace).filter(|n| n.window != window);
        let (master_fraction, master_adjusted) =
            previous.map_or((0.5, false), |n| (n.master_fraction, n.master_adjusted));

        if let Some((_, monitor)) = desktop.monitor_for_workspace(workspace) {
            let screen = monitor.rect.size;
            let fits_max = win.max_size.is_none_or(|max| {
                if is_master {
                    max.width >= screen.width * master_fraction && max.height >= screen.height
                } else {
                    max.width >= screen.width * (1.0 - master_fraction)
                        && max.height >= screen.height / (count - 1).max(1) as f64
                }
            });
            let usable = monitor.usable().size;
            let fits_min = win
                .min_size
                .is_none_or(|min| min.width <= usable.width && min.height <= usable.height);
            if !fits_max || !fits_min {
                debug!(?window, %workspace, is_master, "window does not fit, refusing to tile");
                return Err(LayoutError::CannotTile(window));
            }
        }

        Ok(Insertion {
            workspace,
            at_front,
            is_master,
            promoted,
            previous_master: previous.map(|n| n.window),
            master_fraction,
            master_adjusted,
        })
    }

    fn insert(&mut self, desktop: &Desktop, window: WindowId, plan: Insertion) -> EventResponse {
        let mut node = Node::new(window, plan.workspace);
        if plan.is_master {
            if let Some(previous) = plan.previous_master.and_then(|w| self.nodes.find_mut(w)) {
                previous.is_master = plan.promoted;
            }
            node.is_master = true;
            node.master_fraction = plan.master_fraction;
            node.master_adjusted = plan.master_adjusted;
        }
        debug!(?window, workspace = %plan.workspace, master = plan.is_master, "tiling window");
        self.nodes.insert(node, plan.at_front);
        self.recalculate_workspace_monitor(desktop, plan.workspace, false, None)
    }

    /// Stops tiling `window`.
    pub fn remove_window(&mut self, desktop: &Desktop, window: WindowId) -> EventResponse {
        let Some(node) = self.nodes.find(window).cloned() else {
            return EventResponse::default();
        };
        let workspace = node.workspace;
        let auto_demote = self.workspaces.resolve(&self.config, workspace).auto_demote;

        let mut response = EventResponse::default();
        if desktop.window(window).is_some_and(Window::is_fullscreen) {
            response.fullscreen_changes.push((window, None));
        }

        let masters_before = self.nodes.master_count(workspace);
        if node.is_master && masters_before < 2 {
            if let Some(next) = self.nodes.on_workspace_mut(workspace).find(|n| !n.is_master) {
                next.is_master = true;
                next.master_fraction = node.master_fraction;
                next.master_adjusted = node.master_adjusted;
            }
        }
        self.nodes.remove(window);

        let count = self.nodes.count(workspace);
        let masters = self.nodes.master_count(workspace);
        if (masters == count || count < auto_demote) && masters_before > 1 && masters > 1 {
            if let Some(last) = self.nodes.on_workspace_mut(workspace).next_back() {
                if last.is_master {
                    last.is_master = false;
                }
            }
        }
        debug!(?window, %workspace, "untiled window");

        response.merge(self.recalculate_workspace_monitor(desktop, workspace, false, Some(window)));
        response
    }

    /// Moves the node of `window` to the workspace the desktop now reports
    /// for it. Untiled windows are tiled there.
    ///
    /// On [`LayoutError::CannotTile`] the window is still tiled on its old
    /// workspace; the host floats it and calls [`Self::remove_window`].
    pub fn window_workspace_changed(
        &mut self,
        desktop: &Desktop,
        window: WindowId,
    ) -> Result<EventResponse, LayoutError> {
        let win = desktop.window(window).ok_or(LayoutError::UnknownWindow(window))?;
        let Some(node) = self.nodes.find(window) else {
            return self.add_window(desktop, window);
        };
        if node.workspace == win.workspace {
            return Ok(EventResponse::default());
        }
        let plan = self.plan_insertion(desktop, window, win)?;
        let mut response = self.remove_window(desktop, window);
        response.merge(self.insert(desktop, window, plan));
        Ok(response)
    }

    /// Re-points the node of `from` at `to`.
    pub fn replace_window(&mut self, desktop: &Desktop, from: WindowId, to: WindowId) -> EventResponse {
        if self.nodes.contains(to) {
            return EventResponse::default();
        }
        let Some(node) = self.nodes.find_mut(from) else {
            return EventResponse::default();
        };
        node.window = to;
        let rect = node.rect;
        let workspace = node.workspace;

        let Some(window) = desktop.window(to) else {
            return EventResponse::default();
        };
        let Some((_, monitor)) = desktop.monitor_for_workspace(workspace) else {
            return EventResponse::default();
        };
        let node_count = self.nodes.count(workspace);
        let settings = self.workspaces.resolve(&self.config, workspace);
        let ctx = ApplyContext {
            settings: &*settings,
            rule: self.config.rule_for(workspace),
            gaps: &self.config.settings.gaps,
            monitor,
            special: desktop.is_special(workspace),
            node_count,
            instant: false,
        };
        EventResponse {
            placements: apply_node_rect(to, window, rect, &ctx, false).into_iter().collect(),
            ..Default::default()
        }
    }

    /// Tiles every mapped, non-floating window of the desktop.
    pub fn enable(&mut self, desktop: &Desktop) -> EventResponse {
        let mut response = EventResponse::default();
        for (wid, window) in &desktop.windows {
            if window.floating || !window.mapped {
                continue;
            }
            match self.add_window(desktop, wid) {
                Ok(r) => response.merge(r),
                Err(err) => warn!(?wid, %err, "leaving window untiled"),
            }
        }
        response
    }

    /// Forgets every node. Workspace settings survive.
    pub fn disable(&mut self) { self.nodes.clear(); }

    pub fn recalculate_monitor(&mut self, desktop: &Desktop, monitor: MonitorId) -> EventResponse {
        EventResponse {
            placements: self.monitor_placements(desktop, monitor, false, None),
            ..Default::default()
        }
    }

    /// Lays out `workspace` alone, if it is on a monitor.
    pub fn recalculate_workspace(&mut self, desktop: &Desktop, workspace: WorkspaceId) -> EventResponse {
        let Some((_, monitor)) = desktop.monitor_for_workspace(workspace) else {
            return EventResponse::default();
        };
        let mut placements = Vec::new();
        self.layout_workspace(desktop, workspace, monitor, false, None, &mut placements);
        EventResponse { placements, ..Default::default() }
    }

    pub fn recalculate_window(&mut self, desktop: &Desktop, window: WindowId) -> EventResponse {
        let Some(workspace) = self.nodes.find(window).map(|n| n.workspace) else {
            return EventResponse::default();
        };
        self.recalculate_workspace_monitor(desktop, workspace, false, None)
    }

    /// Called after the host changed the fullscreen mode of `window`.
    pub fn fullscreen_changed(&mut self, desktop: &Desktop, window: WindowId) -> EventResponse {
        let Some(workspace) = desktop.window(window).map(|w| w.workspace) else {
            return EventResponse::default();
        };
        self.recalculate_workspace_monitor(desktop, workspace, false, None)
    }

    fn recalculate_workspace_monitor(
        &mut self,
        desktop: &Desktop,
        workspace: WorkspaceId,
        instant: bool,
        leaving: Option<WindowId>,
    ) -> EventResponse {
        let placements = match desktop.monitor_for_workspace(workspace) {
            Some((id, _)) => self.monitor_placements(desktop, id, instant, leaving),
            None => Vec::new(),
        };
        EventResponse { placements, ..Default::default() }
    }

    /// Special workspace first, then the regular one.
    fn monitor_placements(
        &mut self,
        desktop: &Desktop,
        monitor: MonitorId,
        instant: bool,
        leaving: Option<WindowId>,
    ) -> Vec<WindowPlacement> {
        let mut out = Vec::new();
        let Some(mon) = desktop.monitors.get(monitor) else {
            return out;
        };
        for workspace in [mon.active_special, mon.active_workspace].into_iter().flatten() {
            self.layout_workspace(desktop, workspace, mon, instant, leaving, &mut out);
        }
        out
    }

    /// `leaving` is a window on its way out whose fullscreen state is ignored.
    fn layout_workspace(
        &mut self,
        desktop: &Desktop,
        workspace: WorkspaceId,
        monitor: &Monitor,
        instant: bool,
        leaving: Option<WindowId>,
        out: &mut Vec<WindowPlacement>,
    ) {
        let settings = self.workspaces.resolve(&self.config, workspace);
        let rule = self.config.rule_for(workspace);
        let gaps = &self.config.settings.gaps;
        let special = desktop.is_special(workspace);

        let fullscreen = desktop.fullscreen_window(workspace).filter(|&(id, _)| Some(id) != leaving);
        if let Some((id, mode)) = fullscreen {
            let Some(window) = desktop.window(id) else {
                return;
            };
            match mode {
                FullscreenMode::Fullscreen => out.push(WindowPlacement {
                    window: id,
                    node_rect: monitor.rect,
                    frame: monitor.rect.round(),
                    decorations: None,
                    instant,
                }),
                FullscreenMode::Maximized => {
                    let ctx = ApplyContext {
                        settings: &*settings,
                        rule,
                        gaps,
                        monitor,
                        special,
                        node_count: self.nodes.count(workspace),
                        instant,
                    };
                    let rect = place_single_rect(monitor, Insets::default());
                    out.extend(apply_node_rect(id, window, rect, &ctx, true));
                }
            }
            return;
        }

        let mut nodes: Vec<&mut Node> = self
            .nodes
            .on_workspace_mut(workspace)
            .filter(|n| {
                let present = desktop.window(n.window).is_some();
                if !present {
                    warn!(window = ?n.window, %workspace, "node without a window, skipping");
                }
                present
            })
            .collect();
        if nodes.is_empty() {
            return;
        }

        let area = usable_area(monitor, settings);
        arrange(&mut nodes, settings, area);
        debug!(%workspace, nodes = nodes.len(), orientation = %settings.orientation, "laid out workspace");

        let ctx = ApplyContext {
            settings: &*settings,
            rule,
            gaps,
            monitor,
            special,
            node_count: nodes.len(),
            instant,
        };
        for node in &nodes {
            let Some(window) = desktop.window(node.window) else {
                continue;
            };
            out.extend(apply_node_rect(node.window, window, node.rect, &ctx, false));
        }
    }

    /// Resizes `window` (or the focused window) by a pixel delta.
    ///
    /// Tiled windows fold the delta into their workspace ratios; other
    /// windows get a floating resize.
    pub fn resize_window(
        &mut self,
        desktop: &Desktop,
        window: Option<WindowId>,
        delta: (f64, f64),
    ) -> EventResponse {
        if !(delta.0.is_finite() && delta.1.is_finite()) {
            return EventResponse::default();
        }
        let Some(wid) = window.or(desktop.focused) else {
            return EventResponse::default();
        };
        let Some(win) = desktop.window(wid) else {
            return EventResponse::default();
        };
        let Some(workspace) = self.nodes.find(wid).map(|n| n.workspace) else {
            let size = Size::new(
                (win.frame.size.width + delta.0).max(MIN_FLOATING_SIZE),
                (win.frame.size.height + delta.1).max(MIN_FLOATING_SIZE),
            );
            return EventResponse {
                floating_resize: Some((wid, size)),
                ..Default::default()
            };
        };
        let Some((monitor_id, monitor)) = desktop.monitor_for_workspace(workspace) else {
            return EventResponse::default();
        };

        let adjusted = {
            let settings = self.workspaces.resolve(&self.config, workspace);
            let mut nodes: Vec<&mut Node> = self.nodes.on_workspace_mut(workspace).collect();
            adjust_ratios(&mut nodes, settings, monitor, wid, delta)
        };
        if !adjusted {
            return EventResponse::default();
        }
        debug!(?wid, ?delta, "resized tiled window");

        let instant = !self.config.settings.animate_manual_resizes;
        EventResponse {
            placements: self.monitor_placements(desktop, monitor_id, instant, None),
            ..Default::default()
        }
    }

    /// Like [`Self::resize_window`], with the delta given in pixels or
    /// percent of the monitor.
    pub fn resize_window_by(
        &mut self,
        desktop: &Desktop,
        window: Option<WindowId>,
        delta: ResizeDelta,
    ) -> EventResponse {
        let Some(wid) = window.or(desktop.focused) else {
            return EventResponse::default();
        };
        let (Some(win), Some((_, monitor))) = (desktop.window(wid), desktop.monitor_for_window(wid))
        else {
            return EventResponse::default();
        };
        let pixels = delta.to_pixel_delta(win.frame.size, monitor.rect.size);
        self.resize_window(desktop, Some(wid), pixels)
    }

    /// Sets (`exact`) or shifts the master fraction of the workspace of
    /// `window`.
    pub fn alter_split_ratio(
        &mut self,
        desktop: &Desktop,
        window: Option<WindowId>,
        ratio: f64,
        exact: bool,
    ) -> EventResponse {
        if !ratio.is_finite() {
            return EventResponse::default();
        }
        let Some(workspace) = window.or(desktop.focused).and_then(|w| self.nodes.find(w)).map(|n| n.workspace)
        else {
            return EventResponse::default();
        };
        let Some(master) = self.nodes.first_master_mut(workspace) else {
            return EventResponse::default();
        };
        let fraction = if exact { ratio } else { master.master_fraction + ratio };
        master.master_fraction = fraction.clamp(MASTER_FRACTION_MIN, MASTER_FRACTION_MAX);
        master.master_adjusted = true;
        self.recalculate_workspace_monitor(desktop, workspace, false, None)
    }

    /// Exchanges the layout slots of two tiled windows, across workspaces if
    /// needed.
    pub fn swap_windows(&mut self, desktop: &Desktop, a: WindowId, b: WindowId) -> EventResponse {
        let (Some(ws_a), Some(ws_b)) =
            (self.nodes.find(a).map(|n| n.workspace), self.nodes.find(b).map(|n| n.workspace))
        else {
            return EventResponse::default();
        };
        if !self.nodes.swap_windows(a, b) {
            return EventResponse::default();
        }
        debug!(?a, ?b, "swapped windows");

        let mut response = self.recalculate_workspace_monitor(desktop, ws_a, false, None);
        if ws_a != ws_b {
            response.workspace_changes.push((a, ws_b));
            response.workspace_changes.push((b, ws_a));
            let same_monitor = desktop.monitor_for_workspace(ws_a).map(|(id, _)| id)
                == desktop.monitor_for_workspace(ws_b).map(|(id, _)| id);
            if !same_monitor {
                response.merge(self.recalculate_workspace_monitor(desktop, ws_b, false, None));
            }
        }
        response
    }

    /// The next node of the same kind (master or stack) after `window`, or
    /// the first node of the other kind. `forward = false` walks backwards.
    pub fn next_window(&self, window: WindowId, forward: bool) -> Option<WindowId> {
        let node = self.nodes.find(window)?;
        let is_master = node.is_master;
        let mut order: Vec<&Node> = self.nodes.on_workspace(node.workspace).collect();
        if !forward {
            order.reverse();
        }
        let pos = order.iter().position(|n| n.window == window)?;
        order[pos + 1..]
            .iter()
            .find(|n| n.is_master == is_master)
            .or_else(|| order.iter().find(|n| n.is_master != is_master))
            .map(|n| n.window)
    }

    /// Parses and runs a layout message. Unknown messages do nothing.
    pub fn handle_message(
        &mut self,
        desktop: &Desktop,
        window: Option<WindowId>,
        message: &str,
    ) -> EventResponse {
        match LayoutCommand::parse(message) {
            Some(cmd) => self.handle_command(desktop, window, &cmd),
            None => EventResponse::default(),
        }
    }

    /// Runs `cmd` against `window`, or the focused window.
    pub fn handle_command(
        &mut self,
        desktop: &Desktop,
        window: Option<WindowId>,
        cmd: &LayoutCommand,
    ) -> EventResponse {
        let Some(wid) = window.or(desktop.focused) else {
            return EventResponse::default();
        };
        let Some(win) = desktop.window(wid) else {
            return EventResponse::default();
        };
        let workspace = self.nodes.find(wid).map_or(win.workspace, |n| n.workspace);
        debug!(?cmd, window = ?wid, %workspace, "layout command");

        match cmd {
            LayoutCommand::SwapWithMaster(hint) => {
                if !self.nodes.contains(wid) {
                    return EventResponse::default();
                }
                let Some(master) = self.nodes.first_master(workspace).map(|n| n.window) else {
                    return EventResponse::default();
                };
                if master != wid {
                    let mut response = self.swap_windows(desktop, wid, master);
                    let focus = if *hint == FocusHint::Child { master } else { wid };
                    self.switch_focus(desktop, wid, focus, &mut response);
                    response
                } else {
                    let Some(child) = self.nodes.first_stack_node(workspace).map(|n| n.window)
                    else {
                        return EventResponse::default();
                    };
                    let mut response = self.swap_windows(desktop, child, master);
                    let focus = if *hint == FocusHint::Master { child } else { master };
                    self.switch_focus(desktop, wid, focus, &mut response);
                    response
                }
            }
            LayoutCommand::FocusMaster(hint) => {
                let Some(master) = self.nodes.first_master(workspace).map(|n| n.window) else {
                    return EventResponse::default();
                };
                let target = if master != wid {
                    Some(master)
                } else if *hint == FocusHint::Master {
                    None
                } else {
                    self.nodes.first_stack_node(workspace).map(|n| n.window)
                };
                let mut response = EventResponse::default();
                if let Some(target) = target {
                    self.switch_focus(desktop, wid, target, &mut response);
                }
                response
            }
            LayoutCommand::CycleNext | LayoutCommand::CyclePrev => {
                let forward = matches!(cmd, LayoutCommand::CycleNext);
                let mut response = EventResponse::default();
                if let Some(target) = self.next_window(wid, forward) {
                    self.switch_focus(desktop, wid, target, &mut response);
                }
                response
            }
            LayoutCommand::SwapNext | LayoutCommand::SwapPrev => {
                if !win.mapped || win.floating {
                    return EventResponse::default();
                }
                let forward = matches!(cmd, LayoutCommand::SwapNext);
                let Some(other) = self.next_window(wid, forward) else {
                    return EventResponse::default();
                };
                let mut response = self.swap_windows(desktop, wid, other);
                response.focus_window = Some(wid);
                response
            }
            LayoutCommand::AddMaster => {
                if !win.mapped || win.floating {
                    return EventResponse::default();
                }
                let promote = match self.nodes.find(wid) {
                    Some(node) if !node.is_master => Some(wid),
                    _ => self.nodes.first_stack_node(workspace).map(|n| n.window),
                };
                if let Some(node) = promote.and_then(|w| self.nodes.find_mut(w)) {
                    node.is_master = true;
                }
                self.recalculate_workspace_monitor(desktop, workspace, false, None)
            }
            LayoutCommand::RemoveMaster => {
                if !win.mapped || win.floating {
                    return EventResponse::default();
                }
                if self.nodes.count(workspace) < 2 || self.nodes.master_count(workspace) < 2 {
                    return EventResponse::default();
                }
                let demote = if self.nodes.find(wid).is_some_and(|n| n.is_master) {
                    Some(wid)
                } else {
                    self.nodes.on_workspace(workspace).rev().find(|n| n.is_master).map(|n| n.window)
                };
                if let Some(node) = demote.and_then(|w| self.nodes.find_mut(w)) {
                    node.is_master = false;
                }
                self.recalculate_workspace_monitor(desktop, workspace, false, None)
            }
            LayoutCommand::ToggleMaster => {
                if !win.mapped || win.floating {
                    return EventResponse::default();
                }
                let masters = self.nodes.master_count(workspace);
                if let Some(node) = self.nodes.find_mut(wid) {
                    if !node.is_master || masters > 1 {
                        node.is_master = !node.is_master;
                    }
                }
                self.recalculate_workspace_monitor(desktop, workspace, false, None)
            }
            LayoutCommand::SetOrientation(orientation) => {
                let settings = self.workspaces.resolve(&self.config, workspace);
                settings.orientation = *orientation;
                settings.overrides.insert(Overrides::ORIENTATION);
                self.recalculate_workspace_monitor(desktop, workspace, false, None)
            }
            LayoutCommand::OrientationNext => self.cycle_orientation(desktop, workspace, &[], 1),
            LayoutCommand::OrientationPrev => self.cycle_orientation(desktop, workspace, &[], -1),
            LayoutCommand::OrientationCycle(cycle) => {
                self.cycle_orientation(desktop, workspace, cycle, 1)
            }
            LayoutCommand::ResetSplits => {
                self.workspaces.remove(workspace);
                for node in self.nodes.on_workspace_mut(workspace) {
                    node.master_adjusted = false;
                    node.size_fraction = 1.0;
                }
                self.recalculate_workspace_monitor(desktop, workspace, false, None)
            }
            LayoutCommand::ResetOverrides => {
                self.workspaces.resolve(&self.config, workspace).overrides = Overrides::empty();
                self.recalculate_workspace_monitor(desktop, workspace, false, None)
            }
            LayoutCommand::SetStackCount(count) => {
                let settings = self.workspaces.resolve(&self.config, workspace);
                let stacks = count.resolve(settings.stacks);
                if stacks == 0 {
                    return EventResponse::default();
                }
                settings.stacks = stacks.max(2) as usize;
                settings.overrides.insert(Overrides::STACKS);
                self.relayout_and_refresh(desktop, workspace, wid)
            }
            LayoutCommand::SetOrder(_) | LayoutCommand::OrderNext | LayoutCommand::OrderPrev => {
                let settings = self.workspaces.resolve(&self.config, workspace);
                settings.order = match cmd {
                    LayoutCommand::SetOrder(order) => *order,
                    _ => {
                        let delta = if matches!(cmd, LayoutCommand::OrderNext) { 1 } else { -1 };
                        let idx = ORDER_CYCLE.iter().position(|&o| o == settings.order).unwrap_or(0);
                        ORDER_CYCLE[advance(idx, delta, ORDER_CYCLE.len())]
                    }
                };
                settings.overrides.insert(Overrides::ORDER);
                self.relayout_and_refresh(desktop, workspace, wid)
            }
            LayoutCommand::SplitRatio { ratio, exact } => {
                self.alter_split_ratio(desktop, Some(wid), *ratio, *exact)
            }
            LayoutCommand::ResizeActive(delta) => self.resize_window_by(desktop, Some(wid), *delta),
        }
    }

    fn cycle_orientation(
        &mut self,
        desktop: &Desktop,
        workspace: WorkspaceId,
        cycle: &[Orientation],
        delta: isize,
    ) -> EventResponse {
        let default_cycle = ORIENTATION_CYCLE;
        let cycle = if cycle.is_empty() { &default_cycle[..] } else { cycle };
        let settings = self.workspaces.resolve(&self.config, workspace);
        let next = match cycle.iter().position(|&o| o == settings.orientation) {
            Some(idx) => advance(idx, delta, cycle.len()),
            None => 0,
        };
        settings.orientation = cycle[next];
        settings.overrides.insert(Overrides::ORIENTATION);
        self.recalculate_workspace_monitor(desktop, workspace, false, None)
    }

    /// Recomputes the monitor and asks the host to re-apply every stack
    /// window, then `origin`.
    fn relayout_and_refresh(
        &mut self,
        desktop: &Desktop,
        workspace: WorkspaceId,
        origin: WindowId,
    ) -> EventResponse {
        let mut response = self.recalculate_workspace_monitor(desktop, workspace, false, None);
        response.refresh_windows = self
            .nodes
            .on_workspace(workspace)
            .filter(|n| !n.is_master)
            .filter(|n| desktop.window(n.window).is_some_and(|w| !w.floating))
            .map(|n| n.window)
            .chain(std::iter::once(origin))
            .collect();
        response
    }

    /// Moves focus from `from` to `to`, carrying fullscreen over when the
    /// workspace inherits it.
    fn switch_focus(
        &mut self,
        desktop: &Desktop,
        from: WindowId,
        to: WindowId,
        response: &mut EventResponse,
    ) {
        if !desktop.window(to).is_some_and(|w| w.mapped) {
            return;
        }
        if let Some(current) = desktop.window(from) {
            if let Some(mode) = current.fullscreen {
                response.fullscreen_changes.push((from, None));
                let inherit =
                    self.workspaces.resolve(&self.config, current.workspace).inherit_fullscreen;
                if inherit {
                    response.fullscreen_changes.push((to, Some(mode)));
                }
            }
        }
        response.focus_window = Some(to);
    }

    /// Dumps the nodes of `workspace` grouped by master area and stack.
    pub fn draw_tree(&self, workspace: WorkspaceId) -> String {
        use ascii_tree::Tree;

        let nodes: Vec<&Node> = self.nodes.on_workspace(workspace).collect();
        let describe = |n: &Node| {
            let r = n.rect;
            format!(
                "{:?} {}x{} at ({}, {}) size {:.2}",
                n.window, r.size.width, r.size.height, r.origin.x, r.origin.y, n.size_fraction
            )
        };

        let mut groups = Vec::new();
        let masters: Vec<String> =
            nodes.iter().filter(|n| n.is_master).map(|&n| describe(n)).collect();
        if let Some(anchor) = nodes.iter().find(|n| n.is_master) {
            groups.push(Tree::Node(
                format!("master {:.2}", anchor.master_fraction),
                vec![Tree::Leaf(masters)],
            ));
        }
        let last_stack = nodes.iter().map(|n| n.stack_index).max().unwrap_or(0);
        for stack in 1..=last_stack {
            let members: Vec<String> = nodes
                .iter()
                .filter(|n| !n.is_master && n.stack_index == stack)
                .map(|&n| describe(n))
                .collect();
            if !members.is_empty() {
                groups.push(Tree::Node(format!("stack {stack}"), vec![Tree::Leaf(members)]));
            }
        }

        let title = match self.workspaces.get(workspace) {
            Some(s) => format!(
                "workspace {workspace} ({}, {}, {} stacks)",
                s.orientation, s.order, s.stacks
            ),
            None => format!("workspace {workspace}"),
        };
        let tree = if groups.is_empty() {
            Tree::Leaf(vec![title])
        } else {
            Tree::Node(title, groups)
        };
        let mut out = String::new();
        let _ = ascii_tree::write_tree(&mut out, &tree);
        out
    }
}
