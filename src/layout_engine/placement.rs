//! Master/stack geometry for one workspace.
//!
//! Everything here is pure: it reads nodes and settings, writes node rects
//! and the per-pass stack bookkeeping, and never touches windows.

use tracing::trace;

use super::utils::place_single_rect;
use super::workspaces::WorkspaceSettings;
use super::{Axis, Orientation};
use crate::common::geometry::{Insets, Rect};
use crate::model::{Monitor, Node};

/// Share of the remaining space a non-final window may take at most.
const MAX_SHARE: f64 = 0.9;

/// Margin the x-factor takes off both ends of the primary axis.
pub fn xfact_margin(monitor: &Monitor, settings: &WorkspaceSettings) -> Insets {
    let xf = settings.xfact;
    if !(xf > 0.0 && xf < 1.0) {
        return Insets::default();
    }
    let margin = (1.0 - xf) * monitor.rect.extent(settings.orientation.primary_axis()) / 2.0;
    match settings.orientation.primary_axis() {
        Axis::Horizontal => Insets { left: margin, right: margin, ..Insets::default() },
        Axis::Vertical => Insets { top: margin, bottom: margin, ..Insets::default() },
    }
}

/// Usable area of `monitor` for `settings`: reserved insets removed, then the
/// x-factor margin applied along the primary axis. This is also the whole
/// master container when a workspace has only masters and no centring.
pub fn usable_area(monitor: &Monitor, settings: &WorkspaceSettings) -> Rect {
    place_single_rect(monitor, xfact_margin(monitor, settings))
}

/// Computes the pre-gap rect of every node on one workspace within `area`,
/// normally [`usable_area`].
///
/// `nodes` must be the workspace's nodes in registry order. Nothing is placed
/// when none of them is a master.
pub fn arrange(nodes: &mut [&mut Node], settings: &mut WorkspaceSettings, area: Rect) {
    let Some(anchor) = nodes.iter().position(|n| n.is_master) else {
        return;
    };
    let total = nodes.len();
    let masters = nodes.iter().filter(|n| n.is_master).count();
    let slaves = total - masters;
    let stacks = settings.effective_stacks();

    if !nodes[anchor].master_adjusted {
        nodes[anchor].master_fraction = if settings.mfact != 0.0 {
            settings.mfact
        } else if total < stacks {
            1.0 / total as f64
        } else {
            1.0 / stacks as f64
        };
    }

    let mut orientation = settings.orientation;
    if slaves == 1 {
        orientation = orientation.without_center();
    }
    let axis = orientation.primary_axis();
    let (p_min, p_len) = (area.start(axis), area.extent(axis));
    let (s_min, s_len) = (area.start(axis.other()), area.extent(axis.other()));

    trace!(workspace = %settings.workspace, total, masters, %orientation, "arrange");

    if slaves == 0 {
        settings.stack_node_counts.clear();
        let (start, len) = if settings.center_single_master {
            let anchor = &mut nodes[anchor];
            if !anchor.master_adjusted {
                anchor.master_fraction =
                    if settings.single_mfact != 0.0 { settings.single_mfact } else { 0.5 };
            }
            let len = p_len * anchor.master_fraction;
            (p_min + (p_len - len) / 2.0, len)
        } else {
            (p_min, p_len)
        };
        place_masters(nodes, axis, start, len, s_min, s_len);
        return;
    }

    let master_len = p_len * nodes[anchor].master_fraction;
    let master_start = if orientation.is_center() {
        p_min + (p_len - master_len) / 2.0
    } else if orientation.master_at_end() {
        p_min + p_len - master_len
    } else {
        p_min
    };
    place_masters(nodes, axis, master_start, master_len, s_min, s_len);

    let coords = stack_spans(
        settings,
        orientation,
        slaves,
        (p_min, p_min + p_len),
        (master_start, master_start + master_len),
    );
    place_stack_nodes(nodes, settings, axis, &coords, slaves, (s_min, s_len));
}

fn place_masters(
    nodes: &mut [&mut Node],
    axis: Axis,
    p_start: f64,
    p_len: f64,
    s_min: f64,
    s_len: f64,
) {
    let mut left = nodes.iter().filter(|n| n.is_master).count();
    let mut space_left = s_len;
    let mut next = s_min;
    for node in nodes.iter_mut().filter(|n| n.is_master) {
        let size = if left > 1 {
            (space_left / left as f64 * node.size_fraction).min(space_left * MAX_SHARE)
        } else {
            space_left
        };
        node.rect = Rect::from_spans(axis, p_start, p_len, next, size);
        node.stack_index = 0;
        left -= 1;
        space_left -= size;
        next += size;
    }
}

/// Start and end of every stack along the primary axis.
fn stack_spans(
    settings: &mut WorkspaceSettings,
    orientation: Orientation,
    slaves: usize,
    (mon_min, mon_max): (f64, f64),
    (master_near, master_far): (f64, f64),
) -> Vec<(f64, f64)> {
    let num_stacks = (settings.effective_stacks() - 1).min(slaves);
    let center = orientation.is_center();

    settings.stack_node_counts = vec![0; num_stacks + 1];
    if settings.stack_fractions.len() < num_stacks + 1 {
        settings.stack_fractions.resize(num_stacks + 1, 1.0);
    }

    let stack_size = ((mon_max - mon_min) - (master_far - master_near)) / num_stacks as f64;
    let (before, after) = if center {
        (num_stacks.div_ceil(2), num_stacks / 2)
    } else if orientation.master_at_end() {
        (num_stacks, 0)
    } else {
        (0, num_stacks)
    };
    let half = stack_size * num_stacks as f64 / 2.0;
    let size_before = if before > 0 { half / before as f64 } else { 0.0 };
    let size_after = if after > 0 { half / after as f64 } else { 0.0 };

    let mut spans: Vec<(f64, f64)> = Vec::with_capacity(num_stacks);
    for i in 0..num_stacks {
        let base = match (center, i < before) {
            (false, _) => stack_size,
            (true, true) => size_before,
            (true, false) => size_after,
        };
        let start = if i == before && after > 0 {
            master_far
        } else if let Some(&(_, prev_end)) = spans.last() {
            prev_end
        } else {
            mon_min
        };

        // The last stack closes the gap to its edge, the last one before the
        // master is pinned to the master.
        let end = if i + 1 == num_stacks {
            if after > 0 { mon_max } else { master_near }
        } else if center && i + 1 == before {
            master_near
        } else {
            start + base * settings.stack_fractions[i + 1]
        };
        spans.push((start, end));
    }

    if settings.order.is_reversed() {
        spans.reverse();
    }
    spans
}

fn place_stack_nodes(
    nodes: &mut [&mut Node],
    settings: &mut WorkspaceSettings,
    axis: Axis,
    spans: &[(f64, f64)],
    slaves: usize,
    (s_min, s_len): (f64, f64),
) {
    let num_stacks = spans.len();
    let fill = settings.order.fills_stacks();
    let mut space_left = vec![s_len; num_stacks];
    let mut next = vec![s_min; num_stacks];
    let mut stack = 0;
    let mut left = slaves;

    for node in nodes.iter_mut().filter(|n| !n.is_master) {
        let quota = slaves / num_stacks + usize::from(stack < slaves % num_stacks);
        let full = s_len / quota as f64 * node.size_fraction;

        let mut size = if left > num_stacks {
            full.min(space_left[stack] * MAX_SHARE)
        } else {
            space_left[stack]
        };
        // Fill orders look at how many nodes already landed in the stack this
        // node occupied last pass.
        if fill {
            if let Some(&placed) = settings.stack_node_counts.get(node.stack_index) {
                size = if placed + 1 < quota {
                    full.min(space_left[stack] * MAX_SHARE)
                } else {
                    space_left[stack]
                };
            }
        }

        let (start, end) = spans[stack];
        node.rect = Rect::from_spans(axis, start, end - start, next[stack], size);
        node.stack_index = stack + 1;
        settings.stack_node_counts[stack + 1] += 1;

        left -= 1;
        space_left[stack] -= size;
        next[stack] += size;

        if !fill {
            stack = (slaves - left) % num_stacks;
        } else if left < num_stacks - stack {
            stack = num_stacks - left;
        } else if space_left[stack] < 1.0 && stack < num_stacks - 1 {
            stack += 1;
        }
    }
}
