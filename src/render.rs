//! Rendering: turns view state into draw batches for a [`RenderSurface`].
//!
//! This module never touches a real graphics API. Each frame it hands the
//! surface a handful of batches whose slices borrow straight from columnar
//! stores, so nothing is allocated per dot or per stitch once the stores have
//! grown to the working-set size.
//!
//! Layers, bottom first:
//!
//! | Layer | Draws |
//! |-------|-------|
//! | [`FabricLayer`] | holes inside the drawing bounds, weave lines at midpoints |
//! | [`StitchLayer`] | one path batch per thread |
//! | [`CueLayer`] | the highlighted dot under the pointer |
//!
//! The surface is clipped to the drawing bounds before any layer runs.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::config::CanvasConfig;
use crate::geometry::{DotIndex, DrawingBounds, VirtualBounds, position_from_index};
use crate::pattern::Pattern;
use crate::store::{Dot, DotArray, GridThread, GridThreadArray, StoreError};
use crate::zoom::ZoomLevels;

/// Cue dots are drawn this many times larger than fabric holes.
const CUE_RADIUS_SCALE: f64 = 2.0;

// =============================================================
// Surface contract
// =============================================================

/// A batch of filled circles sharing one color.
#[derive(Debug, Clone, Copy)]
pub struct DotBatch<'a> {
    pub color: &'a str,
    pub xs: &'a [i16],
    pub ys: &'a [i16],
    pub radius: &'a [f32],
}

impl DotBatch<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

/// Stroke style shared by every line in a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke<'a> {
    pub color: &'a str,
    pub width: f64,
}

/// A batch of lines sharing one stroke.
#[derive(Debug, Clone, Copy)]
pub enum LineBatch<'a> {
    /// Independent segments.
    Segments {
        stroke: Stroke<'a>,
        from_x: &'a [i32],
        from_y: &'a [i32],
        to_x: &'a [i32],
        to_y: &'a [i32],
    },
    /// A polyline. The segment from point `i` to `i + 1` is on the front of
    /// the fabric when `visible[i]` is set.
    Path {
        stroke: Stroke<'a>,
        xs: &'a [i32],
        ys: &'a [i32],
        visible: &'a [bool],
    },
}

impl<'a> LineBatch<'a> {
    #[must_use]
    pub fn stroke(&self) -> Stroke<'a> {
        match self {
            Self::Segments { stroke, .. } | Self::Path { stroke, .. } => *stroke,
        }
    }

    /// Front-facing segments as `((x0, y0), (x1, y1))` pairs.
    pub fn front_segments(&self) -> Box<dyn Iterator<Item = ((i32, i32), (i32, i32))> + 'a> {
        match *self {
            Self::Segments { from_x, from_y, to_x, to_y, .. } => Box::new(
                from_x
                    .iter()
                    .zip(from_y)
                    .zip(to_x.iter().zip(to_y))
                    .map(|((&fx, &fy), (&tx, &ty))| ((fx, fy), (tx, ty))),
            ),
            Self::Path { xs, ys, visible, .. } => Box::new(
                xs.windows(2)
                    .zip(ys.windows(2))
                    .zip(visible)
                    .filter(|(_, front)| **front)
                    .map(|((x, y), _)| ((x[0], y[0]), (x[1], y[1]))),
            ),
        }
    }
}

/// The drawing backend. Implementations own all pixels.
pub trait RenderSurface {
    fn clear(&mut self);
    /// Clip subsequent draws to `bounds`.
    fn set_bounds(&mut self, bounds: DrawingBounds);
    fn draw_dots(&mut self, batch: &DotBatch<'_>);
    fn draw_lines(&mut self, batch: &LineBatch<'_>);
}

// =============================================================
// Scene
// =============================================================

/// Read-only view state handed to every layer for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub drawing: DrawingBounds,
    pub virtual_bounds: VirtualBounds,
    pub levels: ZoomLevels,
    pub dot_count_x: usize,
    pub dot_count_y: usize,
    pub pattern: &'a Pattern,
    pub cue: Option<DotIndex>,
}

/// Something that can paint itself for a [`Scene`].
pub trait Drawable {
    fn draw(&mut self, scene: &Scene<'_>, surface: &mut dyn RenderSurface);
}

/// Inclusive range of grid indexes along one axis whose positions fall
/// inside `[start, start + size]`, or `None` if there are none.
#[allow(clippy::cast_possible_truncation)]
fn visible_index_range(start: f64, size: f64, origin: f64, spacing: f64, count: usize) -> Option<(i32, i32)> {
    let last = i32::try_from(count).unwrap_or(i32::MAX) - 1;
    let lo = (((start - origin) / spacing).ceil() as i32).max(0);
    let hi = (((start + size - origin) / spacing).floor() as i32).min(last);
    (lo <= hi).then_some((lo, hi))
}

/// Saturates outside the `i16` range. Drawn dots lie inside the viewport,
/// which the canvas keeps within that range.
#[allow(clippy::cast_possible_truncation)]
fn to_i16(v: f64) -> i16 {
    v.round().clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

#[allow(clippy::cast_possible_truncation)]
fn to_i32(v: f64) -> i32 {
    v.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

// =============================================================
// Fabric
// =============================================================

/// Fabric holes and weave lines, regenerated each frame into reused stores.
#[derive(Debug, Clone)]
pub struct FabricLayer {
    dot_color: String,
    grid_color: String,
    holes: DotArray,
    weave: GridThreadArray,
}

impl FabricLayer {
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidGrowthFactor`] for bad store sizing.
    pub fn from_config(config: &CanvasConfig) -> Result<Self, StoreError> {
        Ok(Self {
            dot_color: config.dot_color.clone(),
            grid_color: config.grid_color.clone(),
            holes: DotArray::with_capacity(config.store_capacity, config.store_growth_factor)?,
            weave: GridThreadArray::with_capacity(config.store_capacity, config.store_growth_factor)?,
        })
    }

    /// Holes generated by the last frame.
    #[must_use]
    pub fn holes(&self) -> &DotArray {
        &self.holes
    }

    /// Weave lines generated by the last frame.
    #[must_use]
    pub fn weave(&self) -> &GridThreadArray {
        &self.weave
    }

    #[allow(clippy::cast_possible_truncation)]
    fn rebuild(&mut self, scene: &Scene<'_>) {
        self.holes.clear();
        self.weave.clear();
        let vb = &scene.virtual_bounds;
        let d = &scene.drawing;
        let spacing = scene.levels.spacing;
        let Some((x_lo, x_hi)) = visible_index_range(d.left, d.width, vb.left, spacing, scene.dot_count_x) else {
            return;
        };
        let Some((y_lo, y_hi)) = visible_index_range(d.top, d.height, vb.top, spacing, scene.dot_count_y) else {
            return;
        };
        let radius = scene.levels.dot_radius as f32;

        for iy in (y_lo..=y_hi).filter(|i| i % 2 == 0) {
            for ix in (x_lo..=x_hi).filter(|i| i % 2 == 0) {
                let p = position_from_index(vb, DotIndex::new(ix, iy), spacing);
                self.holes.push(Dot { x: to_i16(p.x), y: to_i16(p.y), radius });
            }
        }

        let (top, bottom) = (to_i32(d.top), to_i32(d.bottom()));
        for ix in (x_lo..=x_hi).filter(|i| i % 2 != 0) {
            let x = to_i32(vb.left + f64::from(ix) * spacing);
            self.weave.push(GridThread { from_x: x, from_y: top, to_x: x, to_y: bottom });
        }
        let (left, right) = (to_i32(d.left), to_i32(d.right()));
        for iy in (y_lo..=y_hi).filter(|i| i % 2 != 0) {
            let y = to_i32(vb.top + f64::from(iy) * spacing);
            self.weave.push(GridThread { from_x: left, from_y: y, to_x: right, to_y: y });
        }
    }
}

impl Drawable for FabricLayer {
    fn draw(&mut self, scene: &Scene<'_>, surface: &mut dyn RenderSurface) {
        self.rebuild(scene);
        if !self.weave.is_empty() {
            let weave = &self.weave;
            surface.draw_lines(&LineBatch::Segments {
                stroke: Stroke { color: &self.grid_color, width: 1.0 },
                from_x: weave.from_x(),
                from_y: weave.from_y(),
                to_x: weave.to_x(),
                to_y: weave.to_y(),
            });
        }
        if !self.holes.is_empty() {
            surface.draw_dots(&DotBatch {
                color: &self.dot_color,
                xs: self.holes.positions_x(),
                ys: self.holes.positions_y(),
                radius: self.holes.radius(),
            });
        }
        tracing::trace!(holes = self.holes.len(), weave = self.weave.len(), "fabric drawn");
    }
}

// =============================================================
// Stitches
// =============================================================

/// Draws every thread path of the scene's pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct StitchLayer;

impl Drawable for StitchLayer {
    fn draw(&mut self, scene: &Scene<'_>, surface: &mut dyn RenderSurface) {
        for thread in scene.pattern.threads().iter().filter(|t| !t.is_empty()) {
            let points = thread.points();
            surface.draw_lines(&LineBatch::Path {
                stroke: Stroke { color: &thread.color, width: thread.width * scene.levels.thread_width },
                xs: points.positions_x(),
                ys: points.positions_y(),
                visible: points.visibility(),
            });
        }
    }
}

// =============================================================
// Cue
// =============================================================

/// Highlights the dot under the pointer.
#[derive(Debug, Clone)]
pub struct CueLayer {
    color: String,
    dots: DotArray,
}

impl CueLayer {
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidGrowthFactor`] for bad store sizing.
    pub fn from_config(config: &CanvasConfig) -> Result<Self, StoreError> {
        Ok(Self { color: config.cue_color.clone(), dots: DotArray::with_capacity(1, config.store_growth_factor)? })
    }
}

impl Drawable for CueLayer {
    #[allow(clippy::cast_possible_truncation)]
    fn draw(&mut self, scene: &Scene<'_>, surface: &mut dyn RenderSurface) {
        self.dots.clear();
        let Some(index) = scene.cue else {
            return;
        };
        let p = position_from_index(&scene.virtual_bounds, index, scene.levels.spacing);
        if !scene.drawing.contains(p) {
            return;
        }
        let radius = (scene.levels.dot_radius * CUE_RADIUS_SCALE) as f32;
        self.dots.push(Dot { x: to_i16(p.x), y: to_i16(p.y), radius });
        surface.draw_dots(&DotBatch {
            color: &self.color,
            xs: self.dots.positions_x(),
            ys: self.dots.positions_y(),
            radius: self.dots.radius(),
        });
    }
}

// =============================================================
// Layer stack
// =============================================================

/// The three layers in paint order.
#[derive(Debug, Clone)]
pub struct Layers {
    pub fabric: FabricLayer,
    pub stitches: StitchLayer,
    pub cue: CueLayer,
}

impl Layers {
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidGrowthFactor`] for bad store sizing.
    pub fn from_config(config: &CanvasConfig) -> Result<Self, StoreError> {
        Ok(Self {
            fabric: FabricLayer::from_config(config)?,
            stitches: StitchLayer,
            cue: CueLayer::from_config(config)?,
        })
    }

    /// Clear the surface, clip it to the drawing bounds, and paint every layer.
    pub fn draw(&mut self, scene: &Scene<'_>, surface: &mut dyn RenderSurface) {
        surface.clear();
        surface.set_bounds(scene.drawing);
        self.fabric.draw(scene, surface);
        self.stitches.draw(scene, surface);
        self.cue.draw(scene, surface);
    }
}

// =============================================================
// Tally surface
// =============================================================

/// Surface that only counts what it is asked to draw.
///
/// Useful headless: the demo binary logs these totals per frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TallySurface {
    pub frames: usize,
    pub dots: usize,
    pub segments: usize,
    pub front_segments: usize,
    pub bounds: Option<DrawingBounds>,
}

impl RenderSurface for TallySurface {
    fn clear(&mut self) {
        self.frames += 1;
        self.dots = 0;
        self.segments = 0;
        self.front_segments = 0;
        self.bounds = None;
    }

    fn set_bounds(&mut self, bounds: DrawingBounds) {
        self.bounds = Some(bounds);
    }

    fn draw_dots(&mut self, batch: &DotBatch<'_>) {
        self.dots += batch.len();
    }

    fn draw_lines(&mut self, batch: &LineBatch<'_>) {
        self.segments += match batch {
            LineBatch::Segments { from_x, .. } => from_x.len(),
            LineBatch::Path { xs, .. } => xs.len().saturating_sub(1),
        };
        self.front_segments += batch.front_segments().count();
    }
}
