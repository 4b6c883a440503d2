#![allow(clippy::float_cmp)]

use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| map.get(key).cloned()
}

// --- defaults ---

#[test]
fn default_config_is_valid() {
    assert!(CanvasConfig::default().validate().is_ok());
}

#[test]
fn dot_counts_include_midpoints() {
    let config = CanvasConfig { rows: 6, columns: 4, ..CanvasConfig::default() };
    assert_eq!(config.dot_count_x(), 7);
    assert_eq!(config.dot_count_y(), 11);
}

#[test]
fn throttle_interval_is_milliseconds() {
    let config = CanvasConfig { throttle_ms: 50, ..CanvasConfig::default() };
    assert_eq!(config.throttle_interval(), Duration::from_millis(50));
}

// --- JSON ---

#[test]
fn from_json_reads_camel_case_fields() {
    let config = CanvasConfig::from_json(
        r#"{
            "rows": 6,
            "columns": 6,
            "dotSpacing": { "value": 25, "zoomInStep": 3, "zoomOutStep": 2 },
            "dotRadius": { "value": 3, "zoomInStep": 0.5, "zoomOutStep": 0.25 },
            "threadWidth": { "value": 4, "zoomInStep": 1, "zoomOutStep": 0.5 },
            "minSpacing": 10
        }"#,
    )
    .expect("config should parse");
    assert_eq!(config.rows, 6);
    assert_eq!(config.dot_spacing, StepConfig::new(25.0, 3.0, 2.0));
    assert_eq!(config.dot_radius.zoom_out_step, 0.25);
    assert_eq!(config.thread_width.value, 4.0);
    assert_eq!(config.min_spacing, 10.0);
}

#[test]
fn from_json_fills_missing_fields_with_defaults() {
    let config = CanvasConfig::from_json(r#"{ "rows": 3 }"#).expect("config should parse");
    assert_eq!(config.rows, 3);
    assert_eq!(config.columns, CanvasConfig::default().columns);
    assert_eq!(config.throttle_ms, DEFAULT_THROTTLE_MS);
}

#[test]
fn from_json_rejects_malformed_input() {
    let err = CanvasConfig::from_json("{ rows: ").expect_err("should fail");
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn from_json_validates_after_parsing() {
    let err = CanvasConfig::from_json(r#"{ "columns": 0 }"#).expect_err("should fail");
    assert!(matches!(err, ConfigError::EmptyGrid { rows: 30, columns: 0 }));
}

// --- validation ---

#[test]
fn zero_spacing_is_a_precondition_violation() {
    let config = CanvasConfig { dot_spacing: StepConfig::new(0.0, 1.0, 1.0), ..CanvasConfig::default() };
    let err = config.validate().expect_err("should fail");
    assert!(matches!(err, ConfigError::NonPositive { field: "dotSpacing.value", .. }));
}

#[test]
fn negative_step_is_a_precondition_violation() {
    let config = CanvasConfig { dot_radius: StepConfig::new(2.0, -0.5, 0.1), ..CanvasConfig::default() };
    let err = config.validate().expect_err("should fail");
    assert!(matches!(err, ConfigError::NonPositive { field: "dotRadius.zoomInStep", .. }));
}

#[test]
fn nan_width_is_rejected() {
    let config = CanvasConfig { thread_width: StepConfig::new(f64::NAN, 0.5, 0.1), ..CanvasConfig::default() };
    assert!(matches!(config.validate(), Err(ConfigError::NonPositive { field: "threadWidth.value", .. })));
}

#[test]
fn non_positive_min_spacing_is_rejected() {
    let config = CanvasConfig { min_spacing: 0.0, ..CanvasConfig::default() };
    assert!(matches!(config.validate(), Err(ConfigError::NonPositive { field: "minSpacing", .. })));
}

#[test]
fn min_spacing_above_baseline_is_rejected() {
    let config = CanvasConfig { min_spacing: 30.0, ..CanvasConfig::default() };
    assert!(matches!(config.validate(), Err(ConfigError::MinSpacingAboveBaseline { .. })));
}

#[test]
fn oversized_grid_is_rejected() {
    let config = CanvasConfig { columns: 20_000, ..CanvasConfig::default() };
    assert!(matches!(config.validate(), Err(ConfigError::GridTooLarge { .. })));
}

#[test]
fn negative_deadzone_is_rejected() {
    let config = CanvasConfig { ignore_move_until: -1.0, ..CanvasConfig::default() };
    assert!(matches!(config.validate(), Err(ConfigError::NegativeDeadzone(_))));
}

#[test]
fn small_growth_factor_is_rejected() {
    let config = CanvasConfig { store_growth_factor: 2, ..CanvasConfig::default() };
    assert!(matches!(config.validate(), Err(ConfigError::GrowthFactor(2))));
}

#[test]
fn error_messages_name_the_field() {
    let err = ConfigError::NonPositive { field: "dotSpacing.value", value: 0.0 };
    assert_eq!(err.to_string(), "dotSpacing.value must be positive and finite (got 0)");
}

// --- overrides ---

#[test]
fn overrides_replace_grid_and_throttle() {
    let mut config = CanvasConfig::default();
    config.apply_overrides(lookup_from(&[
        ("STITCH_ROWS", "12"),
        ("STITCH_COLUMNS", " 8 "),
        ("STITCH_THROTTLE_MS", "16"),
        ("STITCH_MIN_SPACING", "7.5"),
    ]));
    assert_eq!(config.rows, 12);
    assert_eq!(config.columns, 8);
    assert_eq!(config.throttle_ms, 16);
    assert_eq!(config.min_spacing, 7.5);
}

#[test]
fn unparsable_override_keeps_current_value() {
    let mut config = CanvasConfig::default();
    config.apply_overrides(lookup_from(&[("STITCH_ROWS", "many")]));
    assert_eq!(config.rows, CanvasConfig::default().rows);
}

#[test]
fn unset_environment_variable_reads_as_none() {
    assert_eq!(env_var("STITCH_NOT_A_REAL_SETTING_7F3A"), None);
}

#[test]
fn unset_environment_leaves_overrides_untouched() {
    let mut config = CanvasConfig::default();
    config.apply_overrides(|key: &str| env_var(&format!("{key}_NOT_A_REAL_SETTING_7F3A")));
    assert_eq!(config.rows, CanvasConfig::default().rows);
    assert_eq!(config.throttle_ms, CanvasConfig::default().throttle_ms);
}
