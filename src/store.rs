//! Dense columnar store: growable struct-of-arrays buffers.
//!
//! A pattern with tens of thousands of stitches would cost one allocation per
//! record as a `Vec` of structs with owned data. Instead every field lives in
//! its own fixed-length typed buffer ([`Column`]). A [`ColumnarStore`] tracks
//! the logical length and swaps in bigger buffers when it runs out of room.
//!
//! The store is generic over a [`Columns`] field set. This module provides
//! the three sets the canvas needs:
//!
//! | Alias | Record | Used by |
//! |-------|--------|---------|
//! | [`DotArray`] | [`Dot`] | fabric holes and the cue overlay |
//! | [`GridThreadArray`] | [`GridThread`] | fabric weave lines |
//! | [`ThreadPathArray`] | [`PathPoint`] | stitched thread paths |
//!
//! Invariants:
//! - `len <= capacity` at all times.
//! - Buffers are never resized in place; growth allocates new buffers
//!   `growth_factor` times larger and copies the live prefix.
//! - `pop` and `clear` never shrink, so undo/redo cycles do not reallocate.
//! - Slices handed to callers are truncated to `len`.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use crate::consts::{DEFAULT_GROWTH_FACTOR, DEFAULT_STORE_CAPACITY, MIN_GROWTH_FACTOR};

/// Error returned by [`ColumnarStore`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A record was requested past the logical length.
    #[error("record {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },
    /// The growth factor is too small to amortize reallocation.
    #[error("growth factor {0} is below the minimum of {min}", min = MIN_GROWTH_FACTOR)]
    InvalidGrowthFactor(usize),
}

// =============================================================
// Column
// =============================================================

/// One fixed-length typed buffer.
#[derive(Debug, Clone)]
pub struct Column<T> {
    buf: Box<[T]>,
}

impl<T: Copy + Default> Column<T> {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: vec![T::default(); capacity].into_boxed_slice() }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// A new buffer of `capacity` holding a copy of the first `len` values.
    #[must_use]
    pub fn grown(&self, len: usize, capacity: usize) -> Self {
        let mut next = Self::with_capacity(capacity);
        next.buf[..len].copy_from_slice(&self.buf[..len]);
        next
    }

    pub fn set(&mut self, index: usize, value: T) {
        self.buf[index] = value;
    }

    #[must_use]
    pub fn get(&self, index: usize) -> T {
        self.buf[index]
    }

    #[must_use]
    pub fn as_slice(&self, len: usize) -> &[T] {
        &self.buf[..len]
    }

    pub fn as_mut_slice(&mut self, len: usize) -> &mut [T] {
        &mut self.buf[..len]
    }
}

// =============================================================
// Field sets
// =============================================================

/// A set of parallel columns that together store one record per index.
///
/// Implementations only move values in and out of their buffers. Capacity
/// bookkeeping and growth live in [`ColumnarStore`].
pub trait Columns {
    /// One logical row across all columns.
    type Record: Copy;

    fn with_capacity(capacity: usize) -> Self;

    /// Physical length shared by every column.
    fn capacity(&self) -> usize;

    /// Fresh buffers of `capacity` with the first `len` records copied over.
    fn grown(&self, len: usize, capacity: usize) -> Self;

    fn write(&mut self, index: usize, record: Self::Record);

    fn read(&self, index: usize) -> Self::Record;
}

/// A fabric hole or cue marker in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dot {
    pub x: i16,
    pub y: i16,
    pub radius: f32,
}

#[derive(Debug, Clone)]
pub struct DotColumns {
    positions_x: Column<i16>,
    positions_y: Column<i16>,
    radius: Column<f32>,
}

impl Columns for DotColumns {
    type Record = Dot;

    fn with_capacity(capacity: usize) -> Self {
        Self {
            positions_x: Column::with_capacity(capacity),
            positions_y: Column::with_capacity(capacity),
            radius: Column::with_capacity(capacity),
        }
    }

    fn capacity(&self) -> usize {
        self.positions_x.capacity()
    }

    fn grown(&self, len: usize, capacity: usize) -> Self {
        Self {
            positions_x: self.positions_x.grown(len, capacity),
            positions_y: self.positions_y.grown(len, capacity),
            radius: self.radius.grown(len, capacity),
        }
    }

    fn write(&mut self, index: usize, record: Dot) {
        self.positions_x.set(index, record.x);
        self.positions_y.set(index, record.y);
        self.radius.set(index, record.radius);
    }

    fn read(&self, index: usize) -> Dot {
        Dot {
            x: self.positions_x.get(index),
            y: self.positions_y.get(index),
            radius: self.radius.get(index),
        }
    }
}

/// A straight fabric weave line in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridThread {
    pub from_x: i32,
    pub from_y: i32,
    pub to_x: i32,
    pub to_y: i32,
}

#[derive(Debug, Clone)]
pub struct GridThreadColumns {
    from_x: Column<i32>,
    from_y: Column<i32>,
    to_x: Column<i32>,
    to_y: Column<i32>,
}

impl Columns for GridThreadColumns {
    type Record = GridThread;

    fn with_capacity(capacity: usize) -> Self {
        Self {
            from_x: Column::with_capacity(capacity),
            from_y: Column::with_capacity(capacity),
            to_x: Column::with_capacity(capacity),
            to_y: Column::with_capacity(capacity),
        }
    }

    fn capacity(&self) -> usize {
        self.from_x.capacity()
    }

    fn grown(&self, len: usize, capacity: usize) -> Self {
        Self {
            from_x: self.from_x.grown(len, capacity),
            from_y: self.from_y.grown(len, capacity),
            to_x: self.to_x.grown(len, capacity),
            to_y: self.to_y.grown(len, capacity),
        }
    }

    fn write(&mut self, index: usize, record: GridThread) {
        self.from_x.set(index, record.from_x);
        self.from_y.set(index, record.from_y);
        self.to_x.set(index, record.to_x);
        self.to_y.set(index, record.to_y);
    }

    fn read(&self, index: usize) -> GridThread {
        GridThread {
            from_x: self.from_x.get(index),
            from_y: self.from_y.get(index),
            to_x: self.to_x.get(index),
            to_y: self.to_y.get(index),
        }
    }
}

/// One point of a stitched thread path.
///
/// `index_x`/`index_y` are the source of truth; `x`/`y` are the derived pixel
/// position for the current pan and zoom. `visible` is false for segments
/// that run along the back of the fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathPoint {
    pub x: i32,
    pub y: i32,
    pub index_x: i16,
    pub index_y: i16,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct ThreadPathColumns {
    positions_x: Column<i32>,
    positions_y: Column<i32>,
    indexes_x: Column<i16>,
    indexes_y: Column<i16>,
    visibility: Column<bool>,
}

impl Columns for ThreadPathColumns {
    type Record = PathPoint;

    fn with_capacity(capacity: usize) -> Self {
        Self {
            positions_x: Column::with_capacity(capacity),
            positions_y: Column::with_capacity(capacity),
            indexes_x: Column::with_capacity(capacity),
            indexes_y: Column::with_capacity(capacity),
            visibility: Column::with_capacity(capacity),
        }
    }

    fn capacity(&self) -> usize {
        self.positions_x.capacity()
    }

    fn grown(&self, len: usize, capacity: usize) -> Self {
        Self {
            positions_x: self.positions_x.grown(len, capacity),
            positions_y: self.positions_y.grown(len, capacity),
            indexes_x: self.indexes_x.grown(len, capacity),
            indexes_y: self.indexes_y.grown(len, capacity),
            visibility: self.visibility.grown(len, capacity),
        }
    }

    fn write(&mut self, index: usize, record: PathPoint) {
        self.positions_x.set(index, record.x);
        self.positions_y.set(index, record.y);
        self.indexes_x.set(index, record.index_x);
        self.indexes_y.set(index, record.index_y);
        self.visibility.set(index, record.visible);
    }

    fn read(&self, index: usize) -> PathPoint {
        PathPoint {
            x: self.positions_x.get(index),
            y: self.positions_y.get(index),
            index_x: self.indexes_x.get(index),
            index_y: self.indexes_y.get(index),
            visible: self.visibility.get(index),
        }
    }
}

// =============================================================
// Store
// =============================================================

/// Growable columnar store over the field set `C`.
#[derive(Debug, Clone)]
pub struct ColumnarStore<C: Columns> {
    columns: C,
    len: usize,
    growth_factor: usize,
}

/// Dot positions are whole pixels in `i16`. Writers round and saturate, so a
/// dot past +/-32 767 px would pile up on the edge; the canvas rejects
/// viewports outside that range so every drawn dot fits.
pub type DotArray = ColumnarStore<DotColumns>;
pub type GridThreadArray = ColumnarStore<GridThreadColumns>;
pub type ThreadPathArray = ColumnarStore<ThreadPathColumns>;

impl<C: Columns> ColumnarStore<C> {
    /// Create an empty store with the default capacity and growth factor.
    #[must_use]
    pub fn new() -> Self {
        Self { columns: C::with_capacity(DEFAULT_STORE_CAPACITY), len: 0, growth_factor: DEFAULT_GROWTH_FACTOR }
    }

    /// Create an empty store with explicit sizing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidGrowthFactor`] if `growth_factor` is below
    /// [`MIN_GROWTH_FACTOR`].
    pub fn with_capacity(capacity: usize, growth_factor: usize) -> Result<Self, StoreError> {
        if growth_factor < MIN_GROWTH_FACTOR {
            return Err(StoreError::InvalidGrowthFactor(growth_factor));
        }
        Ok(Self { columns: C::with_capacity(capacity), len: 0, growth_factor })
    }

    /// Append one record, growing the buffers first if they are full.
    pub fn push(&mut self, record: C::Record) {
        if self.len == self.columns.capacity() {
            let next = (self.len * self.growth_factor).max(self.growth_factor);
            tracing::trace!(from = self.len, to = next, "columnar store grow");
            self.columns = self.columns.grown(self.len, next);
        }
        self.columns.write(self.len, record);
        self.len += 1;
    }

    /// Remove and return the last record. Capacity is kept.
    pub fn pop(&mut self) -> Option<C::Record> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.columns.read(self.len))
    }

    /// Return the record at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IndexOutOfBounds`] if `index >= len`.
    pub fn get(&self, index: usize) -> Result<C::Record, StoreError> {
        if index >= self.len {
            return Err(StoreError::IndexOutOfBounds { index, len: self.len });
        }
        Ok(self.columns.read(index))
    }

    #[must_use]
    pub fn last(&self) -> Option<C::Record> {
        self.len.checked_sub(1).map(|i| self.columns.read(i))
    }

    /// Iterate records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = C::Record> + '_ {
        (0..self.len).map(|i| self.columns.read(i))
    }

    /// Drop all records. Capacity is kept.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.columns.capacity()
    }

    #[must_use]
    pub fn growth_factor(&self) -> usize {
        self.growth_factor
    }
}

impl<C: Columns> Default for ColumnarStore<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl DotArray {
    #[must_use]
    pub fn positions_x(&self) -> &[i16] {
        self.columns.positions_x.as_slice(self.len)
    }

    #[must_use]
    pub fn positions_y(&self) -> &[i16] {
        self.columns.positions_y.as_slice(self.len)
    }

    #[must_use]
    pub fn radius(&self) -> &[f32] {
        self.columns.radius.as_slice(self.len)
    }
}

impl GridThreadArray {
    #[must_use]
    pub fn from_x(&self) -> &[i32] {
        self.columns.from_x.as_slice(self.len)
    }

    #[must_use]
    pub fn from_y(&self) -> &[i32] {
        self.columns.from_y.as_slice(self.len)
    }

    #[must_use]
    pub fn to_x(&self) -> &[i32] {
        self.columns.to_x.as_slice(self.len)
    }

    #[must_use]
    pub fn to_y(&self) -> &[i32] {
        self.columns.to_y.as_slice(self.len)
    }
}

impl ThreadPathArray {
    #[must_use]
    pub fn positions_x(&self) -> &[i32] {
        self.columns.positions_x.as_slice(self.len)
    }

    #[must_use]
    pub fn positions_y(&self) -> &[i32] {
        self.columns.positions_y.as_slice(self.len)
    }

    #[must_use]
    pub fn indexes_x(&self) -> &[i16] {
        self.columns.indexes_x.as_slice(self.len)
    }

    #[must_use]
    pub fn indexes_y(&self) -> &[i16] {
        self.columns.indexes_y.as_slice(self.len)
    }

    #[must_use]
    pub fn visibility(&self) -> &[bool] {
        self.columns.visibility.as_slice(self.len)
    }

    /// Rewrite every pixel position from its grid index.
    ///
    /// `place` maps `(index_x, index_y)` to pixels; it runs over the index
    /// columns in one pass without touching visibility.
    pub fn relayout(&mut self, mut place: impl FnMut(i16, i16) -> (i32, i32)) {
        let len = self.len;
        let cols = &mut self.columns;
        let xs = cols.positions_x.as_mut_slice(len);
        let ys = cols.positions_y.as_mut_slice(len);
        let ixs = cols.indexes_x.as_slice(len);
        let iys = cols.indexes_y.as_slice(len);
        for (((x, y), &ix), &iy) in xs.iter_mut().zip(ys.iter_mut()).zip(ixs).zip(iys) {
            (*x, *y) = place(ix, iy);
        }
    }
}
