use serde::{Deserialize, Serialize};

use crate::common::collections::VecDeque;
use crate::common::geometry::Rect;
use crate::model::{WindowId, WorkspaceId};

pub const MASTER_FRACTION_MIN: f64 = 0.05;
pub const MASTER_FRACTION_MAX: f64 = 0.95;
pub const SIZE_FRACTION_MIN: f64 = 0.05;
pub const SIZE_FRACTION_MAX: f64 = 1.95;

/// Layout state of one tiled window.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Node {
    pub window: WindowId,
    pub workspace: WorkspaceId,
    pub is_master: bool,
    /// Share of the primary axis given to the master area. Only read from
    /// the first master of a workspace.
    pub master_fraction: f64,
    /// Once set, `master_fraction` is no longer derived from the window count.
    pub master_adjusted: bool,
    /// Share of the space within the node's own stack or master row.
    pub size_fraction: f64,
    /// 1-based stack the node landed in during the last pass, 0 for masters.
    pub stack_index: usize,
    /// Last computed rect, before gaps.
    pub rect: Rect,
}

impl Node {
    pub fn new(window: WindowId, workspace: WorkspaceId) -> Self {
        Self {
            window,
            workspace,
            is_master: false,
            master_fraction: 0.0,
            master_adjusted: false,
            size_fraction: 1.0,
            stack_index: 0,
            rect: Rect::default(),
        }
    }
}

/// Insertion-ordered collection of nodes across all workspaces.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct NodeRegistry {
    nodes: VecDeque<Node>,
}

impl NodeRegistry {
    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    pub fn clear(&mut self) { self.nodes.clear(); }

    pub fn contains(&self, window: WindowId) -> bool { self.find(window).is_some() }

    pub fn find(&self, window: WindowId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.window == window)
    }

    pub fn find_mut(&mut self, window: WindowId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.window == window)
    }

    pub fn insert(&mut self, node: Node, at_front: bool) {
        if at_front {
            self.nodes.push_front(node);
        } else {
            self.nodes.push_back(node);
        }
    }

    pub fn remove(&mut self, window: WindowId) -> Option<Node> {
        let idx = self.nodes.iter().position(|n| n.window == window)?;
        self.nodes.remove(idx)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Node> { self.nodes.iter() }

    pub fn on_workspace(&self, workspace: WorkspaceId) -> impl DoubleEndedIterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.workspace == workspace)
    }

    pub fn on_workspace_mut(
        &mut self,
        workspace: WorkspaceId,
    ) -> impl DoubleEndedIterator<Item = &mut Node> {
        self.nodes.iter_mut().filter(move |n| n.workspace == workspace)
    }

    pub fn windows_on(&self, workspace: WorkspaceId) -> Vec<WindowId> {
        self.on_workspace(workspace).map(|n| n.window).collect()
    }

    pub fn count(&self, workspace: WorkspaceId) -> usize { self.on_workspace(workspace).count() }

    pub fn master_count(&self, workspace: WorkspaceId) -> usize {
        self.on_workspace(workspace).filter(|n| n.is_master).count()
    }

    pub fn first_master(&self, workspace: WorkspaceId) -> Option<&Node> {
        self.on_workspace(workspace).find(|n| n.is_master)
    }

    pub fn first_master_mut(&mut self, workspace: WorkspaceId) -> Option<&mut Node> {
        self.on_workspace_mut(workspace).find(|n| n.is_master)
    }

    pub fn first_stack_node(&self, workspace: WorkspaceId) -> Option<&Node> {
        self.on_workspace(workspace).find(|n| !n.is_master)
    }

    /// Exchanges the windows held by two nodes. Everything else stays with
    /// the node, so the windows trade places in the layout.
    pub fn swap_windows(&mut self, a: WindowId, b: WindowId) -> bool {
        let (Some(ia), Some(ib)) = (
            self.nodes.iter().position(|n| n.window == a),
            self.nodes.iter().position(|n| n.window == b),
        ) else {
            return false;
        };
        if ia == ib {
            return false;
        }
        self.nodes[ia].window = b;
        self.nodes[ib].window = a;
        true
    }
}
