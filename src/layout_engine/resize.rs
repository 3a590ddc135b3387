use serde::{Deserialize, Serialize};

use super::Axis;
use super::workspaces::WorkspaceSettings;
use crate::common::geometry::Size;
use crate::model::nodes::{
    MASTER_FRACTION_MAX, MASTER_FRACTION_MIN, SIZE_FRACTION_MAX, SIZE_FRACTION_MIN,
};
use crate::model::{Monitor, Node, WindowId};

/// How far to resize along one axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ResizeAmount {
    Pixels(f64),
    /// Share of the window's size, or of the monitor's for exact resizes.
    Percent(f64),
}

impl ResizeAmount {
    /// `"40"`, `"-40"` or `"25%"`. Non-finite numbers are rejected.
    fn parse(raw: &str) -> Option<Self> {
        let (num, percent) = match raw.strip_suffix('%') {
            Some(num) => (num, true),
            None => (raw, false),
        };
        let value: f64 = num.parse().ok().filter(|v: &f64| v.is_finite())?;
        Some(if percent { Self::Percent(value / 100.0) } else { Self::Pixels(value) })
    }

    /// Pixel change that takes a window of `current` extent to the requested
    /// size on a monitor of `monitor` extent.
    fn change(self, exact: bool, current: f64, monitor: f64) -> f64 {
        match (self, exact) {
            (Self::Pixels(px), false) => px,
            (Self::Percent(share), false) => current * share,
            (Self::Pixels(px), true) => px - current,
            (Self::Percent(share), true) => monitor * share - current,
        }
    }
}

/// Resize request carried by the `resizeactive [exact] <x> <y>` message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ResizeDelta {
    pub x: ResizeAmount,
    pub y: ResizeAmount,
    /// Target size instead of a change.
    #[serde(default)]
    pub exact: bool,
}

impl ResizeDelta {
    pub fn pixels(dx: f64, dy: f64) -> Self {
        Self {
            x: ResizeAmount::Pixels(dx),
            y: ResizeAmount::Pixels(dy),
            exact: false,
        }
    }

    /// Parses the arguments of `resizeactive`.
    pub fn parse<'a>(mut args: impl Iterator<Item = &'a str>) -> Option<Self> {
        let mut first = args.next()?;
        let exact = first == "exact";
        if exact {
            first = args.next()?;
        }
        let x = ResizeAmount::parse(first)?;
        let y = ResizeAmount::parse(args.next()?)?;
        if args.next().is_some() {
            return None;
        }
        Some(Self { x, y, exact })
    }

    /// Pixel delta for a window of size `current` on a monitor of size
    /// `monitor`.
    pub fn to_pixel_delta(&self, current: Size, monitor: Size) -> (f64, f64) {
        (
            self.x.change(self.exact, current.width, monitor.width),
            self.y.change(self.exact, current.height, monitor.height),
        )
    }
}

fn along(axis: Axis, (dx, dy): (f64, f64)) -> f64 {
    match axis {
        Axis::Horizontal => dx,
        Axis::Vertical => dy,
    }
}

/// Folds a pixel resize of `target` into the persistent ratios of its
/// workspace. `nodes` are the workspace's nodes in registry order.
///
/// Returns false when `target` is not among `nodes` or the delta is not
/// finite.
pub fn adjust_ratios(
    nodes: &mut [&mut Node],
    settings: &mut WorkspaceSettings,
    monitor: &Monitor,
    target: WindowId,
    delta: (f64, f64),
) -> bool {
    if !(delta.0.is_finite() && delta.1.is_finite()) {
        return false;
    }
    let Some(idx) = nodes.iter().position(|n| n.window == target) else {
        return false;
    };
    let orientation = settings.orientation;
    let primary = orientation.primary_axis();
    let masters = nodes.iter().filter(|n| n.is_master).count();
    let slaves = nodes.len() - masters;
    let is_master = nodes[idx].is_master;

    if is_master {
        let mut change = along(primary, delta) / monitor.rect.extent(primary);
        if orientation.master_at_end() {
            change = -change;
        }
        for node in nodes.iter_mut().filter(|n| n.is_master) {
            node.master_fraction =
                (node.master_fraction + change).clamp(MASTER_FRACTION_MIN, MASTER_FRACTION_MAX);
            node.master_adjusted = true;
        }
    }

    let master_len = nodes.iter().find(|n| n.is_master).map_or(0.0, |n| n.rect.extent(primary));

    for axis in [Axis::Horizontal, Axis::Vertical] {
        let d = along(axis, delta);
        if d == 0.0 || (is_master && axis == primary) {
            continue;
        }
        let usable = monitor.usable().extent(axis);
        let in_stack = axis == orientation.stacking_axis();
        let node = &mut *nodes[idx];

        if is_master {
            if masters > 1 && in_stack {
                let size = usable / masters as f64;
                node.size_fraction = clamp_size(node.size_fraction + d / size);
            }
        } else if slaves > 1 && node.stack_index > 0 {
            if in_stack {
                let Some(&count) = settings.stack_node_counts.get(node.stack_index) else {
                    continue;
                };
                if count == 0 {
                    continue;
                }
                let size = usable / count as f64;
                node.size_fraction = clamp_size(node.size_fraction + d / size);
            } else {
                let stacks = settings.stack_node_counts.len().saturating_sub(1).max(1);
                let size = (usable - master_len) / stacks as f64;
                if size <= 0.0 {
                    continue;
                }
                if let Some(frac) = settings.stack_fractions.get_mut(node.stack_index) {
                    *frac = clamp_size(*frac + d / size);
                }
            }
        }
    }
    true
}

fn clamp_size(value: f64) -> f64 { value.clamp(SIZE_FRACTION_MIN, SIZE_FRACTION_MAX) }

#[cfg(test)]
mod tests {
    use slotmap::KeyData;

    use super::*;
    use crate::common::config::Config;
    use crate::common::geometry::Rect;
    use crate::layout_engine::placement::arrange;
    use crate::layout_engine::workspaces::WorkspaceLayouts;
    use crate::layout_engine::{Order, Orientation};
    use crate::model::WorkspaceId;

    fn w(idx: u64) -> WindowId { WindowId::from(KeyData::from_ffi(idx)) }

    struct Fixture {
        nodes: Vec<Node>,
        settings: WorkspaceSettings,
        monitor: Monitor,
    }

    impl Fixture {
        fn new(count: u64, masters: u64, orientation: Orientation, stacks: usize) -> Self {
            let nodes = (1..=count)
                .map(|i| {
                    let mut node = Node::new(w(i), WorkspaceId(1));
                    node.is_master = i <= masters;
                    node
                })
                .collect();
            let mut layouts = WorkspaceLayouts::default();
            let settings = layouts.resolve(&Config::default(), WorkspaceId(1));
            settings.orientation = orientation;
            settings.order = Order::Row;
            settings.stacks = stacks;
            let mut fixture = Self {
                nodes,
                settings: settings.clone(),
                monitor: Monitor::new(Rect::new(0.0, 0.0, 1000.0, 800.0)),
            };
            fixture.arrange();
            fixture
        }

        fn arrange(&mut self) {
            let mut refs: Vec<&mut Node> = self.nodes.iter_mut().collect();
            arrange(&mut refs, &mut self.settings, self.monitor.usable());
        }

        fn resize(&mut self, window: u64, delta: (f64, f64)) -> bool {
            let mut refs: Vec<&mut Node> = self.nodes.iter_mut().collect();
            adjust_ratios(&mut refs, &mut self.settings, &self.monitor, w(window), delta)
        }
    }

    #[test]
    fn parses_resize_requests() {
        let parse = |raw: &str| ResizeDelta::parse(raw.split_whitespace());
        assert_eq!(
            parse("exact 50% 300"),
            Some(ResizeDelta {
                x: ResizeAmount::Percent(0.5),
                y: ResizeAmount::Pixels(300.0),
                exact: true,
            })
        );
        assert_eq!(parse("-40 10%").map(|d| d.exact), Some(false));
        assert_eq!(parse("10"), None);
        assert_eq!(parse("10 10 10"), None);
        assert_eq!(parse("ten 10"), None);
        assert_eq!(parse("inf 10"), None);
        assert_eq!(parse("10 nan%"), None);
    }

    #[test]
    fn pixel_delta_conversion() {
        let current = Size::new(400.0, 300.0);
        let monitor = Size::new(1000.0, 800.0);
        let rel = ResizeDelta {
            x: ResizeAmount::Pixels(50.0),
            y: ResizeAmount::Percent(-0.5),
            exact: false,
        };
        assert_eq!(rel.to_pixel_delta(current, monitor), (50.0, -150.0));
        let exact = ResizeDelta {
            x: ResizeAmount::Percent(0.5),
            y: ResizeAmount::Pixels(300.0),
            exact: true,
        };
        assert_eq!(exact.to_pixel_delta(current, monitor), (100.0, 0.0));
        assert_eq!(ResizeDelta::pixels(-20.0, 5.0).to_pixel_delta(current, monitor), (-20.0, 5.0));
    }

    #[test]
    fn master_resize_moves_fraction() {
        let mut f = Fixture::new(2, 1, Orientation::Left, 2);
        assert_eq!(f.nodes[0].master_fraction, 0.5);
        assert!(f.resize(1, (50.0, 0.0)));
        assert!((f.nodes[0].master_fraction - 0.55).abs() < 1e-9);
        assert!(f.nodes[0].master_adjusted);

        f.arrange();
        assert!((f.nodes[0].master_fraction - 0.55).abs() < 1e-9);
    }

    #[test]
    fn right_orientation_inverts_delta() {
        let mut f = Fixture::new(2, 1, Orientation::Right, 2);
        f.resize(1, (100.0, 0.0));
        assert!((f.nodes[0].master_fraction - 0.4).abs() < 1e-9);
    }

    #[test]
    fn master_fraction_is_clamped() {
        let mut f = Fixture::new(2, 1, Orientation::Top, 2);
        f.resize(1, (0.0, 5000.0));
        assert_eq!(f.nodes[0].master_fraction, MASTER_FRACTION_MAX);
        f.resize(1, (0.0, -5000.0));
        assert_eq!(f.nodes[0].master_fraction, MASTER_FRACTION_MIN);
    }

    #[test]
    fn stack_node_resize_within_stack() {
        let mut f = Fixture::new(3, 1, Orientation::Left, 2);
        // both stack windows share one stack of 800px
        f.resize(2, (0.0, 80.0));
        assert!((f.nodes[1].size_fraction - 1.2).abs() < 1e-9);
        f.resize(2, (0.0, 10_000.0));
        assert_eq!(f.nodes[1].size_fraction, SIZE_FRACTION_MAX);
    }

    #[test]
    fn stack_node_resize_across_stacks() {
        let mut f = Fixture::new(3, 1, Orientation::Left, 3);
        let master_width = f.nodes[0].rect.size.width;
        f.resize(2, (100.0, 0.0));
        let expected = 1.0 + 100.0 / ((1000.0 - master_width) / 2.0);
        assert!((f.settings.stack_fractions[1] - expected).abs() < 1e-9);
        assert_eq!(f.nodes[0].master_adjusted, false);
    }

    #[test]
    fn lone_stack_window_ignores_resize() {
        let mut f = Fixture::new(2, 1, Orientation::Left, 2);
        f.resize(2, (40.0, 40.0));
        assert_eq!(f.nodes[1].size_fraction, 1.0);
        assert_eq!(f.settings.stack_fractions, vec![1.0, 1.0]);
    }

    #[test]
    fn masters_share_cross_axis() {
        let mut f = Fixture::new(3, 2, Orientation::Left, 2);
        f.resize(1, (0.0, 200.0));
        assert!((f.nodes[0].size_fraction - 1.5).abs() < 1e-9);
    }

    #[test]
    fn non_finite_delta_changes_nothing() {
        let mut f = Fixture::new(3, 1, Orientation::Left, 2);
        assert!(!f.resize(1, (f64::NAN, 0.0)));
        assert!(!f.resize(2, (0.0, f64::INFINITY)));
        assert_eq!(f.nodes[0].master_fraction, 0.5);
        assert!(!f.nodes[0].master_adjusted);
        assert_eq!(f.nodes[1].size_fraction, 1.0);
    }

    #[test]
    fn unknown_window_is_rejected() {
        let mut f = Fixture::new(2, 1, Orientation::Left, 2);
        assert!(!f.resize(9, (10.0, 0.0)));
    }
}
