//! Canvas configuration: grid size, zoom steps, and input tuning.
//!
//! `CanvasConfig` deserializes from the camelCase JSON the host application
//! stores (`dotSpacing.zoomInStep`, `minSpacing`, ...). Every field has a
//! default, so a partial document is fine. Validation is strict: a
//! non-positive spacing, radius, width or step is a construction-time
//! error, never silently replaced.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_CUE_COLOR, DEFAULT_DOT_COLOR, DEFAULT_GRID_COLOR, DEFAULT_GROWTH_FACTOR, DEFAULT_IGNORE_MOVE_UNTIL_PX,
    DEFAULT_STORE_CAPACITY, DEFAULT_THREAD_COLOR, DEFAULT_THROTTLE_MS, MAX_DOT_COUNT, MIN_GROWTH_FACTOR,
};

/// Error returned when a configuration is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be positive and finite (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("grid needs at least one row and one column (got {rows}x{columns})")]
    EmptyGrid { rows: usize, columns: usize },
    #[error("grid of {rows}x{columns} exceeds {max} effective dots per axis")]
    GridTooLarge { rows: usize, columns: usize, max: usize },
    #[error("minSpacing {min} is above the dotSpacing baseline {baseline}")]
    MinSpacingAboveBaseline { min: f64, baseline: f64 },
    #[error("ignoreMoveUntil must be zero or more (got {0})")]
    NegativeDeadzone(f64),
    #[error("storeGrowthFactor {0} is below the minimum of {min}", min = MIN_GROWTH_FACTOR)]
    GrowthFactor(usize),
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read config file {path}: {source}")]
    Io { path: String, source: std::io::Error },
}

/// A zoomable value: its baseline and the two step sizes around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepConfig {
    /// Baseline the value converges toward.
    pub value: f64,
    /// Step used at or above the baseline.
    pub zoom_in_step: f64,
    /// Step used below the baseline.
    pub zoom_out_step: f64,
}

impl StepConfig {
    #[must_use]
    pub fn new(value: f64, zoom_in_step: f64, zoom_out_step: f64) -> Self {
        Self { value, zoom_in_step, zoom_out_step }
    }

    fn validate(&self, name: &'static str, in_name: &'static str, out_name: &'static str) -> Result<(), ConfigError> {
        positive(name, self.value)?;
        positive(in_name, self.zoom_in_step)?;
        positive(out_name, self.zoom_out_step)
    }
}

/// Full canvas configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Fabric hole rows.
    pub rows: usize,
    /// Fabric hole columns.
    pub columns: usize,
    pub dot_spacing: StepConfig,
    pub dot_radius: StepConfig,
    pub thread_width: StepConfig,
    /// Zoom-out floor for spacing.
    pub min_spacing: f64,
    /// Pan deadzone in pixels, per axis.
    pub ignore_move_until: f64,
    /// Input coalescing interval; zero disables throttling.
    pub throttle_ms: u64,
    pub store_capacity: usize,
    pub store_growth_factor: usize,
    /// Keep the grid point under the zoom focal point fixed.
    pub anchor_zoom_at_focal: bool,
    pub dot_color: String,
    pub grid_color: String,
    pub cue_color: String,
    pub thread_color: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            rows: 30,
            columns: 30,
            dot_spacing: StepConfig::new(25.0, 5.0, 2.0),
            dot_radius: StepConfig::new(2.0, 0.4, 0.15),
            thread_width: StepConfig::new(2.0, 0.4, 0.15),
            min_spacing: 5.0,
            ignore_move_until: DEFAULT_IGNORE_MOVE_UNTIL_PX,
            throttle_ms: DEFAULT_THROTTLE_MS,
            store_capacity: DEFAULT_STORE_CAPACITY,
            store_growth_factor: DEFAULT_GROWTH_FACTOR,
            anchor_zoom_at_focal: false,
            dot_color: DEFAULT_DOT_COLOR.to_owned(),
            grid_color: DEFAULT_GRID_COLOR.to_owned(),
            cue_color: DEFAULT_CUE_COLOR.to_owned(),
            thread_color: DEFAULT_THREAD_COLOR.to_owned(),
        }
    }
}

impl CanvasConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any validation
    /// error from [`CanvasConfig::validate`].
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a config from the environment.
    ///
    /// - `STITCH_CONFIG`: path to a JSON config file (defaults when absent)
    /// - `STITCH_ROWS`, `STITCH_COLUMNS`: grid size overrides
    /// - `STITCH_MIN_SPACING`: zoom-out floor override
    /// - `STITCH_THROTTLE_MS`: input coalescing interval override
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, and any parse
    /// or validation error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env_var("STITCH_CONFIG") {
            Some(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io { path, source })?;
                serde_json::from_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_overrides(env_var);
        config.validate()?;
        Ok(config)
    }

    /// Apply `STITCH_*` overrides from `lookup`. Unparsable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.rows = env_parse(&lookup, "STITCH_ROWS", self.rows);
        self.columns = env_parse(&lookup, "STITCH_COLUMNS", self.columns);
        self.min_spacing = env_parse(&lookup, "STITCH_MIN_SPACING", self.min_spacing);
        self.throttle_ms = env_parse(&lookup, "STITCH_THROTTLE_MS", self.throttle_ms);
    }

    /// Check every precondition the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated precondition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(ConfigError::EmptyGrid { rows: self.rows, columns: self.columns });
        }
        if self.dot_count_x() > MAX_DOT_COUNT || self.dot_count_y() > MAX_DOT_COUNT {
            return Err(ConfigError::GridTooLarge { rows: self.rows, columns: self.columns, max: MAX_DOT_COUNT });
        }
        self.dot_spacing
            .validate("dotSpacing.value", "dotSpacing.zoomInStep", "dotSpacing.zoomOutStep")?;
        self.dot_radius
            .validate("dotRadius.value", "dotRadius.zoomInStep", "dotRadius.zoomOutStep")?;
        self.thread_width
            .validate("threadWidth.value", "threadWidth.zoomInStep", "threadWidth.zoomOutStep")?;
        positive("minSpacing", self.min_spacing)?;
        if self.min_spacing > self.dot_spacing.value {
            return Err(ConfigError::MinSpacingAboveBaseline { min: self.min_spacing, baseline: self.dot_spacing.value });
        }
        if self.ignore_move_until < 0.0 || !self.ignore_move_until.is_finite() {
            return Err(ConfigError::NegativeDeadzone(self.ignore_move_until));
        }
        if self.store_growth_factor < MIN_GROWTH_FACTOR {
            return Err(ConfigError::GrowthFactor(self.store_growth_factor));
        }
        Ok(())
    }

    /// Effective dots per row: holes plus the midpoints between them.
    #[must_use]
    pub fn dot_count_x(&self) -> usize {
        self.columns.saturating_mul(2).saturating_sub(1)
    }

    /// Effective dots per column.
    #[must_use]
    pub fn dot_count_y(&self) -> usize {
        self.rows.saturating_mul(2).saturating_sub(1)
    }

    #[must_use]
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

/// Read `key` from the process environment. A value that is not valid UTF-8
/// is logged and treated as unset.
fn env_var(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) => Some(value),
        Err(std::env::VarError::NotPresent) => None,
        Err(err @ std::env::VarError::NotUnicode(_)) => {
            tracing::warn!(key, %err, "ignoring environment variable");
            None
        }
    }
}

fn env_parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().unwrap_or(default),
        None => default,
    }
}
