use plot_rs::PlotError;
use plot_rs::api::PlotConfig;
use plot_rs::core::WidthType;

#[test]
fn empty_json_yields_defaults() {
    let config = PlotConfig::from_json_str("{}").expect("config");
    assert_eq!(config, PlotConfig::default());
    assert!(config.adaptive_sampling);
    assert!(!config.adaptive_sampling_scatter);
    assert_eq!(config.financial_width_type, WidthType::Absolute);
    assert_eq!(config.gradient_level_count, 350);
    assert!((config.selection_tolerance().pixels - 8.0).abs() <= 1e-12);
}

#[test]
fn partial_json_overrides_only_named_fields() {
    let config = PlotConfig::from_json_str(
        r#"{ "two_colored": true, "financial_width": 0.6, "financial_width_type": "PlotCoords" }"#,
    )
    .expect("config");
    assert!(config.two_colored);
    assert_eq!(config.financial_width_type, WidthType::PlotCoords);
    assert!((config.financial_width - 0.6).abs() <= 1e-12);
    assert!(config.antialiased);
}

#[test]
fn invalid_values_are_rejected() {
    let negative = PlotConfig::from_json_str(r#"{ "selection_tolerance_px": -1.0 }"#);
    assert!(matches!(negative, Err(PlotError::InvalidData(_))));
    assert!(PlotConfig::from_json_str(r#"{ "gradient_level_count": 1 }"#).is_err());
    assert!(PlotConfig::from_json_str(r#"{ "adaptive_sampling": "yes" }"#).is_err());
    assert!(PlotConfig::from_json_str("not json").is_err());

    let config = PlotConfig {
        color_scale_bar_width: f64::NAN,
        ..PlotConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn pretty_json_restores_the_same_config() {
    let config = PlotConfig {
        adaptive_sampling_scatter: true,
        financial_width_type: WidthType::AxisRectRatio,
        financial_width: 0.05,
        gradient_level_count: 64,
        ..PlotConfig::default()
    };
    let json = config.to_json_pretty().expect("serialize");
    assert!(json.contains("\"gradient_level_count\": 64"));
    assert_eq!(PlotConfig::from_json_str(&json).expect("parse"), config);
}
