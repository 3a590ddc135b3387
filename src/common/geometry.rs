use serde::{Deserialize, Serialize};

use crate::layout_engine::Axis;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

/// Space carved out of a monitor edge by bars and panels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self { Self { x, y } }

    pub fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self { Self { width, height } }

    pub fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn min_x(&self) -> f64 { self.origin.x }

    pub fn min_y(&self) -> f64 { self.origin.y }

    pub fn max_x(&self) -> f64 { self.origin.x + self.size.width }

    pub fn max_y(&self) -> f64 { self.origin.y + self.size.height }

    pub fn mid(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// Start coordinate along `axis`.
    pub fn start(&self, axis: Axis) -> f64 { self.origin.along(axis) }

    /// End coordinate along `axis`.
    pub fn end(&self, axis: Axis) -> f64 { self.origin.along(axis) + self.size.along(axis) }

    pub fn extent(&self, axis: Axis) -> f64 { self.size.along(axis) }

    /// Builds a rect from a span on `primary` and a span on the other axis.
    pub fn from_spans(primary: Axis, p_start: f64, p_len: f64, s_start: f64, s_len: f64) -> Self {
        match primary {
            Axis::Horizontal => Rect::new(p_start, s_start, p_len, s_len),
            Axis::Vertical => Rect::new(s_start, p_start, s_len, p_len),
        }
    }

    pub fn inset(&self, insets: &Insets) -> Rect {
        Rect::new(
            self.origin.x + insets.left,
            self.origin.y + insets.top,
            (self.size.width - insets.left - insets.right).max(0.0),
            (self.size.height - insets.top - insets.bottom).max(0.0),
        )
    }

    /// Scales the rect by `factor` keeping its center in place.
    pub fn scale_about_center(&self, factor: f64) -> Rect {
        let mid = self.mid();
        let width = self.size.width * factor;
        let height = self.size.height * factor;
        Rect::new(mid.x - width / 2.0, mid.y - height / 2.0, width, height)
    }
}

pub trait Round {
    fn round(&self) -> Self;
}

impl Round for Rect {
    fn round(&self) -> Self {
        let min_x = self.min_x().round();
        let min_y = self.min_y().round();
        let max_x = self.max_x().round();
        let max_y = self.max_y().round();
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

pub trait IsWithin {
    fn is_within(&self, how_much: f64, other: Self) -> bool;
}

impl IsWithin for f64 {
    fn is_within(&self, how_much: f64, other: Self) -> bool { (self - other).abs() < how_much }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_keeps_edges_aligned() {
        let r = Rect::new(10.4, 0.6, 99.3, 50.2).round();
        assert_eq!(r, Rect::new(10.0, 1.0, 100.0, 50.0));
    }

    #[test]
    fn spans_follow_axis() {
        assert_eq!(
            Rect::from_spans(Axis::Horizontal, 1.0, 2.0, 3.0, 4.0),
            Rect::new(1.0, 3.0, 2.0, 4.0)
        );
        assert_eq!(
            Rect::from_spans(Axis::Vertical, 1.0, 2.0, 3.0, 4.0),
            Rect::new(3.0, 1.0, 4.0, 2.0)
        );
    }

    #[test]
    fn inset_and_scale() {
        let r = Rect::new(0.0, 0.0, 100.0, 100.0);
        let insets = Insets { top: 10.0, right: 0.0, bottom: 0.0, left: 20.0 };
        assert_eq!(r.inset(&insets), Rect::new(20.0, 10.0, 80.0, 90.0));
        assert_eq!(r.scale_about_center(0.5), Rect::new(25.0, 25.0, 50.0, 50.0));
    }
}
