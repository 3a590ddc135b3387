use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn other(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

/// Where the master area sits on the monitor.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Orientation {
    Top,
    Right,
    Bottom,
    #[default]
    Left,
    #[serde(alias = "center")]
    #[strum(to_string = "hcenter", serialize = "center")]
    HCenter,
    VCenter,
}

/// Orientation order walked by `orientationnext` and `orientationprev`.
pub const ORIENTATION_CYCLE: [Orientation; 6] = [
    Orientation::Top,
    Orientation::Right,
    Orientation::Bottom,
    Orientation::Left,
    Orientation::HCenter,
    Orientation::VCenter,
];

impl Orientation {
    pub fn is_center(self) -> bool { matches!(self, Orientation::HCenter | Orientation::VCenter) }

    /// The edge orientation used when a centered layout has too few stack windows.
    pub fn without_center(self) -> Orientation {
        match self {
            Orientation::HCenter => Orientation::Left,
            Orientation::VCenter => Orientation::Top,
            other => other,
        }
    }

    /// Axis along which master and stacks are laid side by side.
    pub fn primary_axis(self) -> Axis {
        match self {
            Orientation::Left | Orientation::Right | Orientation::HCenter => Axis::Horizontal,
            Orientation::Top | Orientation::Bottom | Orientation::VCenter => Axis::Vertical,
        }
    }

    /// Axis along which windows inside one stack are stacked.
    pub fn stacking_axis(self) -> Axis { self.primary_axis().other() }

    /// Master pinned to the far edge of the primary axis.
    pub fn master_at_end(self) -> bool { matches!(self, Orientation::Right | Orientation::Bottom) }
}

/// How stack windows are spread over the stacks.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
pub enum Order {
    /// Round-robin over the stacks.
    #[default]
    #[serde(rename = "row")]
    #[strum(serialize = "row")]
    Row,
    /// Fill each stack to its quota before moving on.
    #[serde(rename = "column")]
    #[strum(serialize = "column")]
    Column,
    #[serde(rename = "rrow")]
    #[strum(serialize = "rrow")]
    ReversedRow,
    #[serde(rename = "rcolumn")]
    #[strum(serialize = "rcolumn")]
    ReversedColumn,
}

pub const ORDER_CYCLE: [Order; 4] =
    [Order::Row, Order::Column, Order::ReversedRow, Order::ReversedColumn];

impl Order {
    /// Prefix match used for workspace rule values.
    pub fn from_prefix(raw: &str) -> Order {
        let raw = raw.trim();
        if raw.starts_with("rr") {
            Order::ReversedRow
        } else if raw.starts_with("rc") {
            Order::ReversedColumn
        } else if raw.starts_with('c') {
            Order::Column
        } else {
            Order::Row
        }
    }

    pub fn is_reversed(self) -> bool { matches!(self, Order::ReversedRow | Order::ReversedColumn) }

    pub fn fills_stacks(self) -> bool { matches!(self, Order::Column | Order::ReversedColumn) }
}

/// Steps `delta` places from `index` in a cycle of `len`, wrapping both ways.
pub fn advance(index: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (index as isize + delta).rem_euclid(len as isize) as usize
}
