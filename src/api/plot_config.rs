use serde::{Deserialize, Serialize};

use crate::core::{DEFAULT_LEVEL_COUNT, WidthType};
use crate::error::{PlotError, PlotResult};
use crate::interaction::SelectionTolerance;

/// Shared defaults applied by the `with_config` constructors.
///
/// The type is serializable so hosts can persist plot setup as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default = "default_true")]
    pub adaptive_sampling: bool,
    #[serde(default)]
    pub adaptive_sampling_scatter: bool,
    #[serde(default = "default_selection_tolerance_px")]
    pub selection_tolerance_px: f64,
    #[serde(default = "default_financial_width")]
    pub financial_width: f64,
    #[serde(default)]
    pub financial_width_type: WidthType,
    #[serde(default)]
    pub two_colored: bool,
    #[serde(default = "default_bars_width")]
    pub bars_width: f64,
    #[serde(default = "default_bars_width_type")]
    pub bars_width_type: WidthType,
    #[serde(default = "default_gradient_level_count")]
    pub gradient_level_count: usize,
    #[serde(default = "default_color_scale_bar_width")]
    pub color_scale_bar_width: f64,
    #[serde(default = "default_true")]
    pub antialiased: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            adaptive_sampling: true,
            adaptive_sampling_scatter: false,
            selection_tolerance_px: default_selection_tolerance_px(),
            financial_width: default_financial_width(),
            financial_width_type: WidthType::Absolute,
            two_colored: false,
            bars_width: default_bars_width(),
            bars_width_type: default_bars_width_type(),
            gradient_level_count: default_gradient_level_count(),
            color_scale_bar_width: default_color_scale_bar_width(),
            antialiased: true,
        }
    }
}

impl PlotConfig {
    /// Parses and validates a JSON config; missing fields take their defaults.
    pub fn from_json_str(input: &str) -> PlotResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| PlotError::InvalidData(format!("failed to parse plot config json: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> PlotResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PlotError::InvalidData(format!("failed to serialize plot config: {e}")))
    }

    pub fn validate(&self) -> PlotResult<()> {
        if !self.selection_tolerance_px.is_finite() || self.selection_tolerance_px < 0.0 {
            return Err(PlotError::InvalidData(
                "selection tolerance must be finite and >= 0".to_owned(),
            ));
        }
        if !self.financial_width.is_finite() || self.financial_width < 0.0 {
            return Err(PlotError::InvalidData(
                "financial width must be finite and >= 0".to_owned(),
            ));
        }
        if !self.bars_width.is_finite() || self.bars_width < 0.0 {
            return Err(PlotError::InvalidData(
                "bars width must be finite and >= 0".to_owned(),
            ));
        }
        if self.gradient_level_count < 2 {
            return Err(PlotError::InvalidData(
                "gradient level count must be >= 2".to_owned(),
            ));
        }
        if !self.color_scale_bar_width.is_finite() || self.color_scale_bar_width < 0.0 {
            return Err(PlotError::InvalidData(
                "color scale bar width must be finite and >= 0".to_owned(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn selection_tolerance(&self) -> SelectionTolerance {
        SelectionTolerance::new(self.selection_tolerance_px)
    }
}

fn default_true() -> bool {
    true
}

fn default_selection_tolerance_px() -> f64 {
    8.0
}

fn default_financial_width() -> f64 {
    8.0
}

fn default_bars_width() -> f64 {
    0.75
}

fn default_bars_width_type() -> WidthType {
    WidthType::PlotCoords
}

fn default_gradient_level_count() -> usize {
    DEFAULT_LEVEL_COUNT
}

fn default_color_scale_bar_width() -> f64 {
    20.0
}
