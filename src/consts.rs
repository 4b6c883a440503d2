//! Shared numeric constants for the stitching canvas.

// ── Columnar store ──────────────────────────────────────────────

/// Initial record capacity of a freshly created columnar store.
pub const DEFAULT_STORE_CAPACITY: usize = 10;

/// Multiplier applied to a full store's capacity when it grows.
pub const DEFAULT_GROWTH_FACTOR: usize = 4;

/// Smallest accepted growth factor.
pub const MIN_GROWTH_FACTOR: usize = 4;

// ── Input ───────────────────────────────────────────────────────

/// Coalescing interval for move and wheel bursts, in milliseconds.
pub const DEFAULT_THROTTLE_MS: u64 = 50;

/// Per-axis pointer displacement (px) tolerated before a press becomes a pan.
pub const DEFAULT_IGNORE_MOVE_UNTIL_PX: f64 = 5.0;

/// Change in finger distance (px) that counts as one pinch zoom step.
pub const PINCH_THRESHOLD_PX: f64 = 12.0;

// ── Grid ────────────────────────────────────────────────────────

/// Largest effective dot count per axis; grid indexes are packed as `i16`.
pub const MAX_DOT_COUNT: usize = 32_767;

// ── Colors ──────────────────────────────────────────────────────

/// Fabric hole fill.
pub const DEFAULT_DOT_COLOR: &str = "#B8B2A7";

/// Fabric weave line stroke.
pub const DEFAULT_GRID_COLOR: &str = "#E4DED3";

/// Hover cue fill.
pub const DEFAULT_CUE_COLOR: &str = "#D94B4B";

/// Thread color used when stitching starts without an explicit thread.
pub const DEFAULT_THREAD_COLOR: &str = "#1F1A17";
