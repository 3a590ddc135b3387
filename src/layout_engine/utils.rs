use serde::{Deserialize, Serialize};

use super::workspaces::WorkspaceSettings;
use crate::common::config::{GapSettings, NoGapsWhenOnly, OuterGaps, WorkspaceRule};
use crate::common::geometry::{Insets, IsWithin, Rect, Round};
use crate::model::{FullscreenMode, Monitor, Window, WindowId};

/// Edges closer than this to the usable monitor edge get the outer gap.
const STICK_DISTANCE: f64 = 2.0;

/// Decoration changes requested while a window is shown without gaps.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecorationOverrides {
    pub no_border: bool,
    pub decorate: bool,
    pub no_rounding: bool,
    pub no_shadow: bool,
}

/// Target geometry for one window.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct WindowPlacement {
    pub window: WindowId,
    /// Rect computed by the layout, before gaps.
    pub node_rect: Rect,
    pub frame: Rect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decorations: Option<DecorationOverrides>,
    /// Apply without animating.
    pub instant: bool,
}

/// Everything besides the window itself that decides its final frame.
pub struct ApplyContext<'a> {
    pub settings: &'a WorkspaceSettings,
    pub rule: Option<&'a WorkspaceRule>,
    pub gaps: &'a GapSettings,
    pub monitor: &'a Monitor,
    pub special: bool,
    /// Tiled windows on the workspace.
    pub node_count: usize,
    pub instant: bool,
}

/// Rect covering the usable area of `monitor`, shrunk by `margin`.
pub fn place_single_rect(monitor: &Monitor, margin: Insets) -> Rect {
    monitor.usable().inset(&margin)
}

/// Turns a layout rect into the frame the host should apply.
///
/// Returns `None` for fullscreen windows unless `ignore_fullscreen` is set.
pub fn apply_node_rect(
    window_id: WindowId,
    window: &Window,
    node_rect: Rect,
    ctx: &ApplyContext<'_>,
    ignore_fullscreen: bool,
) -> Option<WindowPlacement> {
    if window.is_fullscreen() && !ignore_fullscreen {
        return None;
    }

    let ngwo = ctx.settings.no_gaps_when_only;
    let maximized = window.fullscreen == Some(FullscreenMode::Maximized);
    if ngwo != NoGapsWhenOnly::Off && !ctx.special && (ctx.node_count == 1 || maximized) {
        let rule = ctx.rule;
        return Some(WindowPlacement {
            window: window_id,
            node_rect,
            frame: node_rect.round(),
            decorations: Some(DecorationOverrides {
                no_border: rule
                    .and_then(|r| r.no_border)
                    .unwrap_or(ngwo != NoGapsWhenOnly::KeepBorder),
                decorate: rule.and_then(|r| r.decorate).unwrap_or(true),
                no_rounding: true,
                no_shadow: true,
            }),
            instant: ctx.instant,
        });
    }

    let inner = ctx.rule.and_then(|r| r.gaps_in).unwrap_or(ctx.gaps.inner);
    let outer = match ctx.rule.and_then(|r| r.gaps_out) {
        Some(gap) => OuterGaps::uniform(gap),
        None => ctx.gaps.outer.clone(),
    };

    let usable = ctx.monitor.usable();
    let sticks = |a: f64, b: f64| a.is_within(STICK_DISTANCE, b);
    let left = if sticks(node_rect.min_x(), usable.min_x()) { outer.left } else { inner };
    let right = if sticks(node_rect.max_x(), usable.max_x()) { outer.right } else { inner };
    let top = if sticks(node_rect.min_y(), usable.min_y()) { outer.top } else { inner };
    let bottom = if sticks(node_rect.max_y(), usable.max_y()) { outer.bottom } else { inner };

    let mut frame = node_rect.inset(&Insets { top, right, bottom, left });
    if ctx.special {
        frame = frame.scale_about_center(ctx.settings.special_scale_factor);
    }

    Some(WindowPlacement {
        window: window_id,
        node_rect,
        frame: frame.round(),
        decorations: None,
        instant: ctx.instant,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use slotmap::KeyData;

    use super::*;
    use crate::common::config::Config;
    use crate::layout_engine::workspaces::WorkspaceLayouts;
    use crate::model::WorkspaceId;

    fn w(idx: u64) -> WindowId { WindowId::from(KeyData::from_ffi(idx)) }

    fn gaps() -> GapSettings {
        GapSettings {
            inner: 5.0,
            outer: OuterGaps::uniform(10.0),
        }
    }

    fn monitor() -> Monitor {
        let mut monitor = Monitor::new(Rect::new(0.0, 0.0, 1000.0, 800.0));
        monitor.reserved.top = 30.0;
        monitor
    }

    fn apply(
        settings: &WorkspaceSettings,
        rule: Option<&WorkspaceRule>,
        special: bool,
        node_count: usize,
        window: &Window,
        rect: Rect,
    ) -> Option<WindowPlacement> {
        let gaps = gaps();
        let monitor = monitor();
        let ctx = ApplyContext {
            settings,
            rule,
            gaps: &gaps,
            monitor: &monitor,
            special,
            node_count,
            instant: false,
        };
        apply_node_rect(w(1), window, rect, &ctx, false)
    }

    fn settings() -> WorkspaceSettings {
        WorkspaceLayouts::default().resolve(&Config::default(), WorkspaceId(1)).clone()
    }

    #[test]
    fn outer_gaps_on_screen_edges_inner_elsewhere() {
        let window = Window::new(WorkspaceId(1));
        let placement =
            apply(&settings(), None, false, 2, &window, Rect::new(0.0, 30.0, 500.0, 770.0))
                .unwrap();
        assert_eq!(placement.frame, Rect::new(10.0, 40.0, 485.0, 750.0));
        assert_eq!(placement.decorations, None);

        let placement =
            apply(&settings(), None, false, 2, &window, Rect::new(500.0, 30.0, 500.0, 770.0))
                .unwrap();
        assert_eq!(placement.frame, Rect::new(505.0, 40.0, 485.0, 750.0));
    }

    #[test]
    fn rule_gaps_replace_globals() {
        let mut rule = WorkspaceRule::new(WorkspaceId(1));
        rule.gaps_in = Some(0.0);
        rule.gaps_out = Some(0.0);
        let window = Window::new(WorkspaceId(1));
        let rect = Rect::new(0.0, 30.0, 500.0, 770.0);
        let placement = apply(&settings(), Some(&rule), false, 2, &window, rect).unwrap();
        assert_eq!(placement.frame, rect);
    }

    #[test]
    fn no_gaps_when_only_single_window() {
        let mut s = settings();
        s.no_gaps_when_only = NoGapsWhenOnly::KeepBorder;
        let window = Window::new(WorkspaceId(1));
        let rect = Rect::new(0.0, 30.0, 1000.0, 770.0);

        let placement = apply(&s, None, false, 1, &window, rect).unwrap();
        assert_eq!(placement.frame, rect);
        assert_eq!(
            placement.decorations,
            Some(DecorationOverrides {
                no_border: false,
                decorate: true,
                no_rounding: true,
                no_shadow: true,
            })
        );

        // two windows get their gaps back
        let placement = apply(&s, None, false, 2, &window, rect).unwrap();
        assert_eq!(placement.frame, Rect::new(10.0, 40.0, 980.0, 750.0));

        // special workspaces never drop gaps
        s.no_gaps_when_only = NoGapsWhenOnly::On;
        let placement = apply(&s, None, true, 1, &window, rect).unwrap();
        assert_eq!(placement.decorations, None);
    }

    #[test]
    fn special_workspace_is_scaled() {
        let mut s = settings();
        s.special_scale_factor = 0.5;
        let window = Window::new(WorkspaceId(1));
        let placement =
            apply(&s, None, true, 2, &window, Rect::new(0.0, 30.0, 1000.0, 770.0)).unwrap();
        assert_eq!(placement.frame, Rect::new(255.0, 228.0, 490.0, 375.0));
    }

    #[test]
    fn fullscreen_windows_are_skipped() {
        let mut window = Window::new(WorkspaceId(1));
        window.fullscreen = Some(FullscreenMode::Fullscreen);
        assert!(apply(&settings(), None, false, 2, &window, Rect::default()).is_none());
    }

    #[test]
    fn single_rect_respects_reserved_and_margin() {
        let margin = Insets { top: 0.0, right: 100.0, bottom: 0.0, left: 100.0 };
        assert_eq!(place_single_rect(&monitor(), margin), Rect::new(100.0, 30.0, 800.0, 770.0));
    }
}
