//! Collision geometry for axis-aligned boxes on a tile grid
//!
//! Everything here is total: degenerate inputs fall back to a defined value
//! instead of failing.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Side of a box, named from the box's own point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// In tie-break priority order
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    /// Tie-break weight (top > bottom > left > right)
    pub fn weight(self) -> u32 {
        match self {
            Side::Top => 8,
            Side::Bottom => 4,
            Side::Left => 2,
            Side::Right => 1,
        }
    }

    /// Unit vector pointing out of the box through this side (y down)
    pub fn outward(self) -> Vec2 {
        match self {
            Side::Top => Vec2::new(0.0, -1.0),
            Side::Bottom => Vec2::new(0.0, 1.0),
            Side::Left => Vec2::new(-1.0, 0.0),
            Side::Right => Vec2::new(1.0, 0.0),
        }
    }

    /// Grid step (dx, dy) across this side
    pub fn step(self) -> (i64, i64) {
        match self {
            Side::Top => (0, -1),
            Side::Bottom => (0, 1),
            Side::Left => (-1, 0),
            Side::Right => (1, 0),
        }
    }
}

/// Motion axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    #[inline]
    pub fn of(self, v: Vec2) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    #[inline]
    pub fn set(self, v: &mut Vec2, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
        }
    }

    #[inline]
    pub fn perpendicular(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// Axis-aligned bounding box in pixels (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap (touching edges do not count)
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Overlap that also counts shared edges
    #[inline]
    pub fn touches(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Sides of `tile` that this box touches within `margin`
    ///
    /// A box resting on a tile touches its `Top`, one pressing in from the
    /// left touches its `Left`, and so on.
    pub fn touching_sides(&self, tile: &Aabb, margin: f32) -> Vec<Side> {
        let mut sides = Vec::with_capacity(2);
        if self.max.y >= tile.min.y && self.max.y <= tile.min.y + margin {
            sides.push(Side::Top);
        }
        if self.min.y <= tile.max.y && self.min.y >= tile.max.y - margin {
            sides.push(Side::Bottom);
        }
        if self.max.x >= tile.min.x && self.max.x <= tile.min.x + margin {
            sides.push(Side::Left);
        }
        if self.min.x <= tile.max.x && self.min.x >= tile.max.x - margin {
            sides.push(Side::Right);
        }
        sides
    }

    /// Side of `tile` with the smallest penetration depth
    pub fn shallowest_side(&self, tile: &Aabb) -> Side {
        let depths = [
            (Side::Top, self.max.y - tile.min.y),
            (Side::Bottom, tile.max.y - self.min.y),
            (Side::Left, self.max.x - tile.min.x),
            (Side::Right, tile.max.x - self.min.x),
        ];
        depths
            .iter()
            .copied()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(side, _)| side)
            .unwrap_or(Side::Top)
    }
}

/// Position that puts a box of half-extent `half` flush against the grid face
/// it crossed while moving along an axis
///
/// `leading` is the leading-edge coordinate that entered the solid cell.
pub fn snap_to_face(leading: f32, moving_positive: bool, half: f32, tile_size: f32, epsilon: f32) -> f32 {
    if tile_size <= 0.0 {
        return leading;
    }
    let cell = (leading / tile_size).floor();
    if moving_positive {
        cell * tile_size - half - epsilon
    } else {
        (cell + 1.0) * tile_size + half + epsilon
    }
}
