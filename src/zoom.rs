//! Zoom controller: steps spacing, dot radius and thread width together.
//!
//! Each value has a configured baseline and two step sizes. Below the
//! baseline the value moves by `zoom_out_step`; at or above it, by
//! `zoom_in_step`. Zooming in from far out therefore climbs in small steps
//! until it reaches the baseline and then speeds up, and zooming out mirrors
//! that on the way down.
//!
//! Rejections (focal point off the drawing, spacing below the floor, radius
//! or width collapsing to zero) return `None` and are only traced.

#[cfg(test)]
#[path = "zoom_test.rs"]
mod zoom_test;

use crate::config::{CanvasConfig, StepConfig};
use crate::geometry::{DrawingBounds, Position};

/// Which way a zoom gesture goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    /// Larger spacing; the grid appears closer.
    In,
    /// Smaller spacing; more of the grid fits.
    Out,
}

/// The three values a zoom step moves together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLevels {
    pub spacing: f64,
    pub dot_radius: f64,
    pub thread_width: f64,
}

/// Apply one zoom step to `value` around the baseline in `step`.
#[must_use]
pub fn step_value(value: f64, step: &StepConfig, direction: ZoomDirection) -> f64 {
    match direction {
        ZoomDirection::In if value < step.value => value + step.zoom_out_step,
        ZoomDirection::In => value + step.zoom_in_step,
        ZoomDirection::Out if value > step.value => value - step.zoom_in_step,
        ZoomDirection::Out => value - step.zoom_out_step,
    }
}

/// Stateless zoom policy built from the canvas configuration.
#[derive(Debug, Clone, Copy)]
pub struct ZoomController {
    spacing: StepConfig,
    dot_radius: StepConfig,
    thread_width: StepConfig,
    min_spacing: f64,
}

impl ZoomController {
    #[must_use]
    pub fn from_config(config: &CanvasConfig) -> Self {
        Self {
            spacing: config.dot_spacing,
            dot_radius: config.dot_radius,
            thread_width: config.thread_width,
            min_spacing: config.min_spacing,
        }
    }

    /// The configured baseline levels.
    #[must_use]
    pub fn baseline(&self) -> ZoomLevels {
        ZoomLevels {
            spacing: self.spacing.value,
            dot_radius: self.dot_radius.value,
            thread_width: self.thread_width.value,
        }
    }

    #[must_use]
    pub fn min_spacing(&self) -> f64 {
        self.min_spacing
    }

    /// Compute the next levels, or `None` if the gesture is rejected.
    #[must_use]
    pub fn zoom(
        &self,
        current: ZoomLevels,
        direction: ZoomDirection,
        focal: Position,
        drawing: &DrawingBounds,
    ) -> Option<ZoomLevels> {
        if !drawing.contains(focal) {
            tracing::trace!(?focal, ?drawing, "zoom rejected: focal point outside drawing bounds");
            return None;
        }
        let next = ZoomLevels {
            spacing: step_value(current.spacing, &self.spacing, direction),
            dot_radius: step_value(current.dot_radius, &self.dot_radius, direction),
            thread_width: step_value(current.thread_width, &self.thread_width, direction),
        };
        if direction == ZoomDirection::Out {
            if next.spacing < self.min_spacing {
                tracing::trace!(spacing = next.spacing, min = self.min_spacing, "zoom rejected: below min spacing");
                return None;
            }
            if next.dot_radius <= 0.0 || next.thread_width <= 0.0 {
                tracing::trace!(?next, "zoom rejected: radius or width would collapse");
                return None;
            }
        }
        Some(next)
    }
}

/// Origin delta that keeps the grid point under `focal` fixed across a
/// spacing change from `old_spacing` to `new_spacing`.
#[must_use]
pub fn anchor_delta(origin: Position, focal: Position, old_spacing: f64, new_spacing: f64) -> (f64, f64) {
    let ratio = new_spacing / old_spacing;
    let shift = |o: f64, f: f64| (f - o) * (1.0 - ratio);
    (shift(origin.x, focal.x), shift(origin.y, focal.y))
}
