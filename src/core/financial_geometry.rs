use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel-projection")]
use rayon::prelude::*;

use crate::core::axis::PlotAxes;
use crate::core::financial_data::FinancialData;
use crate::core::types::{PixelPoint, PixelRect, PlotRange};
use crate::error::{PlotError, PlotResult};

/// Visual representation of financial samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FinancialChartStyle {
    /// Backbone from low to high with open/close ticks.
    Ohlc,
    #[default]
    Candlestick,
}

/// Unit of the financial bar width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WidthType {
    /// Width in pixels.
    #[default]
    Absolute,
    /// Width as a fraction of the key axis pixel length.
    AxisRectRatio,
    /// Width in key coordinates; scales with the key range.
    PlotCoords,
}

/// Resolves the bar width in pixels for a sample at `key`.
#[must_use]
pub fn resolve_bar_width_px(key: f64, width: f64, width_type: WidthType, axes: &PlotAxes<'_>) -> f64 {
    match width_type {
        WidthType::Absolute => width,
        WidthType::AxisRectRatio => width * axes.key_pixel_length(),
        WidthType::PlotCoords => {
            let half = width * 0.5;
            (axes.pixel_for_key(key + half) - axes.pixel_for_key(key - half)).abs()
        }
    }
}

/// Visible key range widened so bars straddling the edges are still drawn.
#[must_use]
pub fn visible_key_range_for_bars(width: f64, width_type: WidthType, axes: &PlotAxes<'_>) -> PlotRange {
    let range = axes.visible_key_range();
    match width_type {
        WidthType::PlotCoords => PlotRange::new(range.lower - width * 0.5, range.upper + width * 0.5),
        WidthType::Absolute | WidthType::AxisRectRatio => {
            let half_px = resolve_bar_width_px(range.lower, width, width_type, axes) * 0.5;
            let lower_px = axes.pixel_for_key(range.lower);
            let upper_px = axes.pixel_for_key(range.upper);
            let candidates = [
                axes.key_for_pixel(lower_px - half_px),
                axes.key_for_pixel(lower_px + half_px),
                axes.key_for_pixel(upper_px - half_px),
                axes.key_for_pixel(upper_px + half_px),
            ];
            let lower = candidates.iter().copied().fold(range.lower, f64::min);
            let upper = candidates.iter().copied().fold(range.upper, f64::max);
            PlotRange::new(lower, upper)
        }
    }
}

/// Projected financial sample in key/value pixel space.
///
/// Pixel values are along the key axis (`key_*`) or the value axis
/// (`open`, `high`, `low`, `close`); use the accessors to obtain screen
/// geometry for either axis orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialGeometry {
    /// Index of the sample inside the slice that was projected.
    pub index: usize,
    pub key_center: f64,
    pub half_width: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub is_bullish: bool,
}

impl FinancialGeometry {
    /// Whether every projected coordinate is drawable.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        [
            self.key_center,
            self.half_width,
            self.open,
            self.high,
            self.low,
            self.close,
        ]
        .iter()
        .all(|value| value.is_finite())
    }

    /// Key pixel of the bar edge on the lower-key side.
    ///
    /// Follows key order rather than screen order, so on a reversed key
    /// axis this edge sits right of the center.
    #[must_use]
    pub fn key_lower_edge(&self, axes: &PlotAxes<'_>) -> f64 {
        self.key_center - self.half_width * axes.key_pixel_direction()
    }

    /// Key pixel of the bar edge on the higher-key side.
    #[must_use]
    pub fn key_upper_edge(&self, axes: &PlotAxes<'_>) -> f64 {
        self.key_center + self.half_width * axes.key_pixel_direction()
    }

    /// Full low-to-high stroke.
    #[must_use]
    pub fn backbone(&self, axes: &PlotAxes<'_>) -> [PixelPoint; 2] {
        [
            axes.to_screen(self.key_center, self.low),
            axes.to_screen(self.key_center, self.high),
        ]
    }

    /// Open tick, on the lower-key side of the backbone.
    #[must_use]
    pub fn open_tick(&self, axes: &PlotAxes<'_>) -> [PixelPoint; 2] {
        [
            axes.to_screen(self.key_lower_edge(axes), self.open),
            axes.to_screen(self.key_center, self.open),
        ]
    }

    /// Close tick, on the higher-key side of the backbone.
    #[must_use]
    pub fn close_tick(&self, axes: &PlotAxes<'_>) -> [PixelPoint; 2] {
        [
            axes.to_screen(self.key_center, self.close),
            axes.to_screen(self.key_upper_edge(axes), self.close),
        ]
    }

    /// Wick from the high to the body edge nearest to it.
    #[must_use]
    pub fn upper_wick(&self, axes: &PlotAxes<'_>) -> [PixelPoint; 2] {
        let body_edge = if self.is_bullish { self.close } else { self.open };
        [
            axes.to_screen(self.key_center, self.high),
            axes.to_screen(self.key_center, body_edge),
        ]
    }

    /// Wick from the body edge nearest to the low down to the low.
    #[must_use]
    pub fn lower_wick(&self, axes: &PlotAxes<'_>) -> [PixelPoint; 2] {
        let body_edge = if self.is_bullish { self.open } else { self.close };
        [
            axes.to_screen(self.key_center, body_edge),
            axes.to_screen(self.key_center, self.low),
        ]
    }

    /// Candle body spanning open to close at full bar width.
    #[must_use]
    pub fn body_rect(&self, axes: &PlotAxes<'_>) -> PixelRect {
        PixelRect::from_corners(
            axes.to_screen(self.key_center - self.half_width, self.open),
            axes.to_screen(self.key_center + self.half_width, self.close),
        )
    }
}

/// Projects financial samples into deterministic geometry.
///
/// The function is pure so rendering and hit-testing share the exact same
/// output.
pub fn project_financial(
    points: &[FinancialData],
    width: f64,
    width_type: WidthType,
    axes: &PlotAxes<'_>,
) -> PlotResult<Vec<FinancialGeometry>> {
    if !width.is_finite() || width < 0.0 {
        return Err(PlotError::InvalidData(
            "financial bar width must be finite and >= 0".to_owned(),
        ));
    }

    #[cfg(feature = "parallel-projection")]
    {
        Ok(points
            .par_iter()
            .enumerate()
            .map(|(index, point)| project_single(index, *point, width, width_type, axes))
            .collect())
    }

    #[cfg(not(feature = "parallel-projection"))]
    {
        Ok(points
            .iter()
            .enumerate()
            .map(|(index, point)| project_single(index, *point, width, width_type, axes))
            .collect())
    }
}

fn project_single(
    index: usize,
    point: FinancialData,
    width: f64,
    width_type: WidthType,
    axes: &PlotAxes<'_>,
) -> FinancialGeometry {
    FinancialGeometry {
        index,
        key_center: axes.pixel_for_key(point.key),
        half_width: resolve_bar_width_px(point.key, width, width_type, axes) * 0.5,
        open: axes.pixel_for_value(point.open),
        high: axes.pixel_for_value(point.high),
        low: axes.pixel_for_value(point.low),
        close: axes.pixel_for_value(point.close),
        is_bullish: point.is_bullish(),
    }
}
