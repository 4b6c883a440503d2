//! Pattern model: ordered thread paths over the columnar store.
//!
//! A pattern is a list of [`ThreadPath`]s. Each path keeps its stitches in a
//! [`ThreadPathArray`]; grid indexes are authoritative and pixel positions are
//! derived from the current [`Layout`]. Pan and zoom call
//! [`Pattern::relayout`], which rewrites positions in place without touching
//! the index or visibility columns.
//!
//! Stitches alternate between the front and back of the fabric: the first
//! point of a path and every second point after it are visible.
//!
//! Undo pops the newest stitch (dropping its thread once empty) onto a redo
//! stack. Any new edit clears the redo stack.

#[cfg(test)]
#[path = "pattern_test.rs"]
mod pattern_test;

use serde::{Deserialize, Serialize};

use crate::config::CanvasConfig;
use crate::geometry::{DotIndex, VirtualBounds};
use crate::store::{PathPoint, StoreError, ThreadPathArray};

/// Error returned by pattern edits and snapshot loading.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatternError {
    #[error("stitch ({x}, {y}) is outside the {count_x}x{count_y} grid")]
    IndexOutOfGrid { x: i32, y: i32, count_x: usize, count_y: usize },
    #[error("thread width must be positive, got {0}")]
    InvalidWidth(f64),
    #[error("no thread is open")]
    NoThread,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Grid-to-pixel mapping the pattern's positions are derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub left: f64,
    pub top: f64,
    pub spacing: f64,
}

impl Layout {
    #[must_use]
    pub fn from_virtual(virtual_bounds: &VirtualBounds, spacing: f64) -> Self {
        Self { left: virtual_bounds.left, top: virtual_bounds.top, spacing }
    }

    /// Pixel position of a grid index, rounded to whole pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn place(&self, index_x: i16, index_y: i16) -> (i32, i32) {
        (
            (self.left + f64::from(index_x) * self.spacing).round() as i32,
            (self.top + f64::from(index_y) * self.spacing).round() as i32,
        )
    }
}

/// One continuous thread: shared style plus its stitches.
#[derive(Debug, Clone)]
pub struct ThreadPath {
    pub color: String,
    /// Multiplier on the zoomed thread width; `1.0` draws at the configured width.
    pub width: f64,
    points: ThreadPathArray,
}

impl ThreadPath {
    #[must_use]
    pub fn points(&self) -> &ThreadPathArray {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Undo record: the stitch index, and the thread style if undo dropped it.
#[derive(Debug, Clone)]
struct RedoEntry {
    index: DotIndex,
    thread: Option<(String, f64)>,
}

// =============================================================
// Snapshot
// =============================================================

/// Serializable hand-off format for persistence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternSnapshot {
    pub threads: Vec<ThreadSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSnapshot {
    pub color: String,
    pub width: f64,
    pub stitches: Vec<DotIndex>,
}

// =============================================================
// Pattern
// =============================================================

/// Thread paths plus undo/redo history, bounded by a fixed grid.
#[derive(Debug, Clone)]
pub struct Pattern {
    threads: Vec<ThreadPath>,
    redo: Vec<RedoEntry>,
    layout: Layout,
    count_x: usize,
    count_y: usize,
    store_capacity: usize,
    growth_factor: usize,
    default_color: String,
}

impl Pattern {
    /// Empty pattern for the grid described by `config`, laid out at the
    /// origin with the baseline spacing.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::Store`] if the store sizing is invalid.
    pub fn new(config: &CanvasConfig) -> Result<Self, PatternError> {
        // Validate sizing once so later thread creation cannot fail on it.
        ThreadPathArray::with_capacity(0, config.store_growth_factor)?;
        Ok(Self {
            threads: Vec::new(),
            redo: Vec::new(),
            layout: Layout { left: 0.0, top: 0.0, spacing: config.dot_spacing.value },
            count_x: config.dot_count_x(),
            count_y: config.dot_count_y(),
            store_capacity: config.store_capacity,
            growth_factor: config.store_growth_factor,
            default_color: config.thread_color.clone(),
        })
    }

    /// Build a pattern from a snapshot.
    ///
    /// # Errors
    ///
    /// Fails if any stitch lies outside the grid or any width is not positive.
    pub fn from_snapshot(config: &CanvasConfig, snapshot: &PatternSnapshot) -> Result<Self, PatternError> {
        let mut pattern = Self::new(config)?;
        pattern.load(snapshot)?;
        Ok(pattern)
    }

    #[must_use]
    pub fn threads(&self) -> &[ThreadPath] {
        &self.threads
    }

    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Total stitches across all threads.
    #[must_use]
    pub fn stitch_count(&self) -> usize {
        self.threads.iter().map(ThreadPath::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stitch_count() == 0
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Open a new thread; later stitches append to it.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidWidth`] for a non-positive width.
    pub fn begin_thread(&mut self, color: impl Into<String>, width: f64) -> Result<(), PatternError> {
        if !(width > 0.0 && width.is_finite()) {
            return Err(PatternError::InvalidWidth(width));
        }
        self.redo.clear();
        self.push_thread(color.into(), width)
    }

    /// Append a stitch to the active thread, opening a default thread first
    /// if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::IndexOutOfGrid`] if `index` is off the grid.
    pub fn add_stitch(&mut self, index: DotIndex) -> Result<PathPoint, PatternError> {
        self.check_index(index)?;
        self.redo.clear();
        if self.threads.is_empty() {
            self.push_thread(self.default_color.clone(), 1.0)?;
        }
        self.append(index)
    }

    /// Remove the newest stitch. Returns it, or `None` if the pattern is empty.
    pub fn undo(&mut self) -> Option<PathPoint> {
        while self.threads.last().is_some_and(ThreadPath::is_empty) {
            self.threads.pop();
        }
        let thread = self.threads.last_mut()?;
        let point = thread.points.pop()?;
        let dropped = if thread.points.is_empty() {
            self.threads.pop().map(|t| (t.color, t.width))
        } else {
            None
        };
        self.redo.push(RedoEntry {
            index: DotIndex::new(i32::from(point.index_x), i32::from(point.index_y)),
            thread: dropped,
        });
        Some(point)
    }

    /// Re-apply the most recently undone stitch.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::Store`] only if the store sizing became invalid.
    pub fn redo(&mut self) -> Result<Option<PathPoint>, PatternError> {
        let Some(entry) = self.redo.pop() else {
            return Ok(None);
        };
        if let Some((color, width)) = entry.thread {
            self.push_thread(color, width)?;
        } else if self.threads.is_empty() {
            self.push_thread(self.default_color.clone(), 1.0)?;
        }
        self.append(entry.index).map(Some)
    }

    /// Drop every thread and the redo history.
    pub fn reset(&mut self) {
        self.threads.clear();
        self.redo.clear();
    }

    /// Recompute every pixel position for a new origin or spacing.
    pub fn relayout(&mut self, virtual_bounds: &VirtualBounds, spacing: f64) {
        self.layout = Layout::from_virtual(virtual_bounds, spacing);
        let layout = self.layout;
        for thread in &mut self.threads {
            thread.points.relayout(|ix, iy| layout.place(ix, iy));
        }
    }

    /// Capture threads and stitch indexes. Redo history is not included.
    #[must_use]
    pub fn snapshot(&self) -> PatternSnapshot {
        PatternSnapshot {
            threads: self
                .threads
                .iter()
                .map(|t| ThreadSnapshot {
                    color: t.color.clone(),
                    width: t.width,
                    stitches: t
                        .points
                        .iter()
                        .map(|p| DotIndex::new(i32::from(p.index_x), i32::from(p.index_y)))
                        .collect(),
                })
                .collect(),
        }
    }

    /// Replace the contents with `snapshot`, keeping the current layout.
    /// Nothing changes if validation fails.
    ///
    /// # Errors
    ///
    /// Fails if any stitch lies outside the grid or any width is not positive.
    pub fn load(&mut self, snapshot: &PatternSnapshot) -> Result<(), PatternError> {
        for thread in &snapshot.threads {
            if !(thread.width > 0.0 && thread.width.is_finite()) {
                return Err(PatternError::InvalidWidth(thread.width));
            }
            for &index in &thread.stitches {
                self.check_index(index)?;
            }
        }
        self.reset();
        for thread in &snapshot.threads {
            self.push_thread(thread.color.clone(), thread.width)?;
            for &index in &thread.stitches {
                self.append(index)?;
            }
        }
        tracing::info!(threads = self.thread_count(), stitches = self.stitch_count(), "pattern loaded");
        Ok(())
    }

    fn check_index(&self, index: DotIndex) -> Result<(), PatternError> {
        if index.is_within(self.count_x, self.count_y) {
            Ok(())
        } else {
            Err(PatternError::IndexOutOfGrid { x: index.x, y: index.y, count_x: self.count_x, count_y: self.count_y })
        }
    }

    fn push_thread(&mut self, color: String, width: f64) -> Result<(), PatternError> {
        let points = ThreadPathArray::with_capacity(self.store_capacity, self.growth_factor)?;
        self.threads.push(ThreadPath { color, width, points });
        Ok(())
    }

    /// Append to the last thread.
    fn append(&mut self, index: DotIndex) -> Result<PathPoint, PatternError> {
        let out_of_grid =
            || PatternError::IndexOutOfGrid { x: index.x, y: index.y, count_x: self.count_x, count_y: self.count_y };
        let index_x = i16::try_from(index.x).map_err(|_| out_of_grid())?;
        let index_y = i16::try_from(index.y).map_err(|_| out_of_grid())?;
        let (x, y) = self.layout.place(index_x, index_y);
        let thread = self.threads.last_mut().ok_or(PatternError::NoThread)?;
        let point = PathPoint { x, y, index_x, index_y, visible: thread.points.len() % 2 == 0 };
        thread.points.push(point);
        Ok(point)
    }
}
