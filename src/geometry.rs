//! Geometry calculator: bounds, grid indexes, and the virtual/visible mapping.
//!
//! Everything here is a pure function over `Copy` values. The canvas owns the
//! only mutable view state and calls into this module whenever spacing or the
//! virtual origin changes. Positions are device pixels; indexes are effective
//! grid coordinates (holes plus interpolated midpoints).
//!
//! Naming follows the two spaces the canvas juggles:
//! - *virtual* bounds span the whole grid, wherever it currently sits;
//! - *visible* bounds are the on-screen viewport;
//! - *drawing* bounds are their intersection, the region actually rendered.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

/// A point in device-pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between two positions (pinch focal point).
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self { x: (self.x + other.x) * 0.5, y: (self.y + other.y) * 0.5 }
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// An integer (column, row) coordinate on the effective dot grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DotIndex {
    pub x: i32,
    pub y: i32,
}

impl DotIndex {
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether this index addresses a dot of a `count_x` by `count_y` grid.
    #[must_use]
    pub fn is_within(self, count_x: usize, count_y: usize) -> bool {
        let inside = |v: i32, count: usize| usize::try_from(v).is_ok_and(|v| v < count);
        inside(self.x, count_x) && inside(self.y, count_y)
    }

    /// Even indexes on both axes are fabric holes; anything else is a midpoint.
    #[must_use]
    pub fn is_hole(self) -> bool {
        self.x % 2 == 0 && self.y % 2 == 0
    }
}

/// An axis-aligned rectangle in device pixels.
///
/// The same shape serves as virtual, visible, drawing and moving bounds; the
/// aliases below document which role a value plays.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Logical rectangle spanning the whole grid.
pub type VirtualBounds = Bounds;
/// Viewport rectangle supplied by the input surface.
pub type VisibleBounds = Bounds;
/// Intersection of virtual and visible bounds.
pub type DrawingBounds = Bounds;

impl Bounds {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[must_use]
    pub fn origin(&self) -> Position {
        Position::new(self.left, self.top)
    }

    /// Whether the point lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains(&self, p: Position) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }

    /// Whether `other` lies entirely inside `self`, edges included.
    #[must_use]
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// The same rectangle shifted by `(dx, dy)`.
    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self { left: self.left + dx, top: self.top + dy, ..*self }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

// =============================================================
// Index <-> position
// =============================================================

/// Map a pixel position to the nearest grid index.
///
/// Exact inverse of [`position_from_index`] for on-grid positions.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn index_from_position(virtual_bounds: &VirtualBounds, position: Position, spacing: f64) -> DotIndex {
    DotIndex {
        x: ((position.x - virtual_bounds.left) / spacing).round() as i32,
        y: ((position.y - virtual_bounds.top) / spacing).round() as i32,
    }
}

/// Map a grid index to its pixel position: `origin + index * spacing`.
#[must_use]
pub fn position_from_index(virtual_bounds: &VirtualBounds, index: DotIndex, spacing: f64) -> Position {
    Position {
        x: virtual_bounds.left + f64::from(index.x) * spacing,
        y: virtual_bounds.top + f64::from(index.y) * spacing,
    }
}

/// Nearest dot to `position`, or `None` when it rounds to an index off the grid.
#[must_use]
pub fn nearest_dot(
    virtual_bounds: &VirtualBounds,
    position: Position,
    spacing: f64,
    count_x: usize,
    count_y: usize,
) -> Option<DotIndex> {
    let index = index_from_position(virtual_bounds, position, spacing);
    index.is_within(count_x, count_y).then_some(index)
}

// =============================================================
// Virtual bounds
// =============================================================

/// Translate the virtual origin by `(dx, dy)` and derive its size from the
/// dot counts and spacing.
///
/// Size never depends on the previous width/height, so a zero-delta call is
/// idempotent.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn recompute_virtual_bounds(
    current: &VirtualBounds,
    dot_count_x: usize,
    dot_count_y: usize,
    spacing: f64,
    dx: f64,
    dy: f64,
) -> VirtualBounds {
    VirtualBounds {
        left: current.left + dx,
        top: current.top + dy,
        width: dot_count_x.saturating_sub(1) as f64 * spacing,
        height: dot_count_y.saturating_sub(1) as f64 * spacing,
    }
}

// =============================================================
// Drawing bounds
// =============================================================

/// Top-left corner of the drawing bounds.
#[must_use]
pub fn drawing_left_top(virtual_bounds: &VirtualBounds, visible: &VisibleBounds) -> Position {
    Position {
        x: drawing_start(virtual_bounds.left, visible.left, visible.width),
        y: drawing_start(virtual_bounds.top, visible.top, visible.height),
    }
}

/// Width of the drawing bounds; never negative.
#[must_use]
pub fn drawing_width(virtual_bounds: &VirtualBounds, visible: &VisibleBounds) -> f64 {
    drawing_extent(virtual_bounds.left, virtual_bounds.width, visible.left, visible.width)
}

/// Height of the drawing bounds; never negative.
#[must_use]
pub fn drawing_height(virtual_bounds: &VirtualBounds, visible: &VisibleBounds) -> f64 {
    drawing_extent(virtual_bounds.top, virtual_bounds.height, visible.top, visible.height)
}

/// The intersection of virtual and visible bounds. Always inside `visible`.
#[must_use]
pub fn drawing_bounds(virtual_bounds: &VirtualBounds, visible: &VisibleBounds) -> DrawingBounds {
    let corner = drawing_left_top(virtual_bounds, visible);
    DrawingBounds {
        left: corner.x,
        top: corner.y,
        width: drawing_width(virtual_bounds, visible),
        height: drawing_height(virtual_bounds, visible),
    }
}

fn drawing_start(virtual_origin: f64, visible_origin: f64, visible_size: f64) -> f64 {
    if virtual_origin < visible_origin {
        visible_origin
    } else {
        virtual_origin.min(visible_origin + visible_size)
    }
}

fn drawing_extent(virtual_origin: f64, virtual_size: f64, visible_origin: f64, visible_size: f64) -> f64 {
    let visible_end = visible_origin + visible_size;
    let extent = if virtual_origin < visible_origin {
        // Virtual content starts before the viewport; drop the part scrolled off.
        let hidden = visible_origin - virtual_origin;
        (virtual_size - hidden).min(visible_size)
    } else if virtual_origin > visible_origin {
        if virtual_origin + virtual_size <= visible_end {
            virtual_size
        } else {
            visible_end - virtual_origin
        }
    } else {
        virtual_size.min(visible_size)
    };
    extent.max(0.0)
}

// =============================================================
// Moving bounds
// =============================================================

/// Drawing-bounds override used while a drag is in progress.
///
/// While the pointer is inside the viewport the override is the virtual
/// bounds clamped to the viewport: the leading edge is the later of the two
/// origins and the extent is capped by both the viewport end and what remains
/// of the virtual size. A pointer that has left the viewport keeps `drawing`
/// as-is, so callers pass the live bounds translated by the drag.
#[must_use]
pub fn moving_bounds(
    pointer: Position,
    drawing: &DrawingBounds,
    visible: &VisibleBounds,
    virtual_bounds: &VirtualBounds,
) -> DrawingBounds {
    if !visible.contains(pointer) {
        return *drawing;
    }
    let (left, width) = moving_axis(visible.left, visible.width, virtual_bounds.left, virtual_bounds.width);
    let (top, height) = moving_axis(visible.top, visible.height, virtual_bounds.top, virtual_bounds.height);
    DrawingBounds { left, top, width, height }
}

fn moving_axis(visible_origin: f64, visible_size: f64, virtual_origin: f64, virtual_size: f64) -> (f64, f64) {
    let visible_end = visible_origin + visible_size;
    let start = visible_origin.max(virtual_origin).min(visible_end);
    let consumed = start - virtual_origin;
    let extent = (visible_end - start).min(virtual_size - consumed).max(0.0);
    (start, extent)
}
