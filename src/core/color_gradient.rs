use std::cell::OnceCell;
use std::collections::BTreeMap;

use image::Rgba;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::types::PlotRange;
use crate::error::{PlotError, PlotResult};
use crate::render::Color;

pub const DEFAULT_LEVEL_COUNT: usize = 350;

/// Color space used between two gradient stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColorInterpolation {
    #[default]
    Rgb,
    /// Hue takes the shorter way around the color wheel.
    Hsv,
}

/// Built-in gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradientPreset {
    Grayscale,
    Hot,
    Cold,
    Night,
    Candy,
    Geography,
    Ion,
    Thermal,
    Polar,
    Spectrum,
    Jet,
    Hues,
}

/// Maps scalar positions to colors through ordered stops on `[0, 1]`.
///
/// The stops are discretized into `level_count` colors on first use; any
/// mutation drops that table.
#[derive(Debug, Clone)]
pub struct ColorGradient {
    stops: BTreeMap<OrderedFloat<f64>, Color>,
    level_count: usize,
    interpolation: ColorInterpolation,
    periodic: bool,
    table: OnceCell<Vec<Rgba<u8>>>,
}

impl Default for ColorGradient {
    fn default() -> Self {
        Self::from_preset(GradientPreset::Cold)
    }
}

impl PartialEq for ColorGradient {
    fn eq(&self, other: &Self) -> bool {
        self.stops == other.stops
            && self.level_count == other.level_count
            && self.interpolation == other.interpolation
            && self.periodic == other.periodic
    }
}

impl ColorGradient {
    /// Empty gradient; every lookup yields black until stops are added.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stops: BTreeMap::new(),
            level_count: DEFAULT_LEVEL_COUNT,
            interpolation: ColorInterpolation::Rgb,
            periodic: false,
            table: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn from_preset(preset: GradientPreset) -> Self {
        let (interpolation, stops): (ColorInterpolation, &[(f64, [u8; 3])]) = match preset {
            GradientPreset::Grayscale => (
                ColorInterpolation::Rgb,
                &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])],
            ),
            GradientPreset::Hot => (
                ColorInterpolation::Rgb,
                &[
                    (0.0, [50, 0, 0]),
                    (0.2, [180, 10, 0]),
                    (0.4, [245, 50, 0]),
                    (0.6, [255, 150, 10]),
                    (0.8, [255, 255, 50]),
                    (1.0, [255, 255, 255]),
                ],
            ),
            GradientPreset::Cold => (
                ColorInterpolation::Rgb,
                &[
                    (0.0, [0, 0, 50]),
                    (0.2, [0, 10, 180]),
                    (0.4, [0, 50, 245]),
                    (0.6, [10, 150, 255]),
                    (0.8, [50, 255, 255]),
                    (1.0, [255, 255, 255]),
                ],
            ),
            GradientPreset::Night => (
                ColorInterpolation::Hsv,
                &[(0.0, [10, 20, 30]), (1.0, [250, 255, 250])],
            ),
            GradientPreset::Candy => (
                ColorInterpolation::Hsv,
                &[(0.0, [0, 0, 255]), (1.0, [255, 250, 250])],
            ),
            GradientPreset::Geography => (
                ColorInterpolation::Rgb,
                &[
                    (0.0, [70, 170, 210]),
                    (0.2, [90, 160, 180]),
                    (0.25, [45, 130, 175]),
                    (0.3, [100, 140, 125]),
                    (0.5, [100, 140, 100]),
                    (0.6, [130, 145, 120]),
                    (0.7, [140, 130, 120]),
                    (0.9, [180, 190, 190]),
                    (1.0, [210, 210, 230]),
                ],
            ),
            GradientPreset::Ion => (
                ColorInterpolation::Hsv,
                &[
                    (0.0, [50, 10, 10]),
                    (0.45, [0, 0, 255]),
                    (0.8, [0, 255, 255]),
                    (1.0, [0, 255, 0]),
                ],
            ),
            GradientPreset::Thermal => (
                ColorInterpolation::Rgb,
                &[
                    (0.0, [0, 0, 50]),
                    (0.15, [20, 0, 120]),
                    (0.33, [200, 30, 140]),
                    (0.6, [255, 100, 0]),
                    (0.85, [255, 255, 40]),
                    (1.0, [255, 255, 255]),
                ],
            ),
            GradientPreset::Polar => (
                ColorInterpolation::Rgb,
                &[
                    (0.0, [50, 255, 255]),
                    (0.18, [10, 70, 255]),
                    (0.28, [10, 10, 190]),
                    (0.5, [0, 0, 0]),
                    (0.72, [190, 10, 10]),
                    (0.82, [255, 70, 10]),
                    (1.0, [255, 255, 50]),
                ],
            ),
            GradientPreset::Spectrum => (
                ColorInterpolation::Hsv,
                &[
                    (0.0, [50, 0, 50]),
                    (0.15, [0, 0, 255]),
                    (0.35, [0, 255, 255]),
                    (0.6, [255, 255, 0]),
                    (0.75, [255, 30, 0]),
                    (1.0, [50, 0, 0]),
                ],
            ),
            GradientPreset::Jet => (
                ColorInterpolation::Rgb,
                &[
                    (0.0, [0, 0, 100]),
                    (0.15, [0, 50, 255]),
                    (0.35, [0, 255, 255]),
                    (0.65, [255, 255, 0]),
                    (0.85, [255, 30, 0]),
                    (1.0, [100, 0, 0]),
                ],
            ),
            GradientPreset::Hues => (
                ColorInterpolation::Hsv,
                &[
                    (0.0, [255, 0, 0]),
                    (1.0 / 3.0, [0, 0, 255]),
                    (2.0 / 3.0, [0, 255, 0]),
                    (1.0, [255, 0, 0]),
                ],
            ),
        };

        let mut gradient = Self::new();
        gradient.interpolation = interpolation;
        for &(position, [red, green, blue]) in stops {
            gradient
                .stops
                .insert(OrderedFloat(position), Color::rgb8(red, green, blue));
        }
        gradient
    }

    #[must_use]
    pub fn level_count(&self) -> usize {
        self.level_count
    }

    /// Sets the number of discrete colors; at least two are required.
    pub fn set_level_count(&mut self, level_count: usize) -> PlotResult<()> {
        if level_count < 2 {
            return Err(PlotError::InvalidData(
                "gradient level count must be >= 2".to_owned(),
            ));
        }
        if level_count != self.level_count {
            self.level_count = level_count;
            self.table = OnceCell::new();
        }
        Ok(())
    }

    #[must_use]
    pub fn interpolation(&self) -> ColorInterpolation {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, interpolation: ColorInterpolation) {
        if interpolation != self.interpolation {
            self.interpolation = interpolation;
            self.table = OnceCell::new();
        }
    }

    #[must_use]
    pub fn periodic(&self) -> bool {
        self.periodic
    }

    /// Periodic gradients wrap positions outside the range instead of clamping.
    pub fn set_periodic(&mut self, periodic: bool) {
        if periodic != self.periodic {
            self.periodic = periodic;
            self.table = OnceCell::new();
        }
    }

    /// Stops ordered by position.
    pub fn stops(&self) -> impl Iterator<Item = (f64, Color)> + '_ {
        self.stops.iter().map(|(position, color)| (position.0, *color))
    }

    /// Adds or replaces the stop at `position` (clamped to `[0, 1]`).
    pub fn set_color_stop_at(&mut self, position: f64, color: Color) -> PlotResult<()> {
        if !position.is_finite() {
            return Err(PlotError::InvalidData(
                "gradient stop position must be finite".to_owned(),
            ));
        }
        color.validate()?;
        self.stops
            .insert(OrderedFloat(position.clamp(0.0, 1.0)), color);
        self.table = OnceCell::new();
        Ok(())
    }

    pub fn clear_color_stops(&mut self) {
        self.stops.clear();
        self.table = OnceCell::new();
    }

    /// Returns a copy with the stop positions mirrored.
    #[must_use]
    pub fn inverted(&self) -> Self {
        let mut inverted = self.clone();
        inverted.stops = self
            .stops
            .iter()
            .map(|(position, color)| (OrderedFloat(1.0 - position.0), *color))
            .collect();
        inverted.table = OnceCell::new();
        inverted
    }

    /// Whether any stop is not fully opaque.
    #[must_use]
    pub fn stops_use_alpha(&self) -> bool {
        self.stops.values().any(|color| color.alpha < 1.0)
    }

    /// Discretized color table, built on first access.
    pub fn levels(&self) -> &[Rgba<u8>] {
        self.table.get_or_init(|| self.build_table())
    }

    /// Color for `value` inside `range`.
    ///
    /// Non-periodic gradients clamp values outside `range`; periodic ones
    /// wrap. Non-finite values map to transparent.
    #[must_use]
    pub fn color_rgba8(&self, value: f64, range: PlotRange, logarithmic: bool) -> Rgba<u8> {
        match self.level_index(value, range, logarithmic) {
            Some(index) => self.levels()[index],
            None => Color::TRANSPARENT.to_rgba8(),
        }
    }

    #[must_use]
    pub fn color(&self, value: f64, range: PlotRange, logarithmic: bool) -> Color {
        Color::from_rgba8(self.color_rgba8(value, range, logarithmic))
    }

    /// Colors every value of `data` into `out` (zipped, shortest wins).
    pub fn colorize(&self, data: &[f64], range: PlotRange, logarithmic: bool, out: &mut [Rgba<u8>]) {
        let levels = self.levels();
        for (value, pixel) in data.iter().zip(out.iter_mut()) {
            *pixel = match self.level_index(*value, range, logarithmic) {
                Some(index) => levels[index],
                None => Color::TRANSPARENT.to_rgba8(),
            };
        }
    }

    fn level_index(&self, value: f64, range: PlotRange, logarithmic: bool) -> Option<usize> {
        let factor = if self.periodic {
            self.level_count as f64
        } else {
            (self.level_count - 1) as f64
        };
        let fraction = if logarithmic {
            (value / range.lower).ln() / (range.upper / range.lower).ln()
        } else {
            (value - range.lower) / range.size()
        };
        let position = (fraction * factor).floor();
        if !position.is_finite() {
            return None;
        }

        let count = self.level_count as i64;
        // saturating float-to-int cast keeps huge positions in range
        let position = position as i64;
        let index = if self.periodic {
            position.rem_euclid(count)
        } else {
            position.clamp(0, count - 1)
        };
        Some(index as usize)
    }

    fn build_table(&self) -> Vec<Rgba<u8>> {
        let step = if self.periodic {
            1.0 / self.level_count as f64
        } else {
            1.0 / (self.level_count - 1) as f64
        };
        (0..self.level_count)
            .map(|level| self.interpolate_at(level as f64 * step).to_rgba8())
            .collect()
    }

    fn interpolate_at(&self, position: f64) -> Color {
        let key = OrderedFloat(position);
        let above = self.stops.range(key..).next();
        let below = self.stops.range(..key).next_back();
        match (below, above) {
            (None, None) => Color::BLACK,
            (Some((_, color)), None) | (None, Some((_, color))) => *color,
            (Some((low_position, low)), Some((high_position, high))) => {
                if high_position.0 == position {
                    return *high;
                }
                let t = (position - low_position.0) / (high_position.0 - low_position.0);
                match self.interpolation {
                    ColorInterpolation::Rgb => lerp_rgb(*low, *high, t),
                    ColorInterpolation::Hsv => lerp_hsv(*low, *high, t),
                }
            }
        }
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

fn lerp_rgb(low: Color, high: Color, t: f64) -> Color {
    Color::rgba(
        lerp(low.red, high.red, t),
        lerp(low.green, high.green, t),
        lerp(low.blue, high.blue, t),
        lerp(low.alpha, high.alpha, t),
    )
}

fn lerp_hsv(low: Color, high: Color, t: f64) -> Color {
    let (low_hue, low_saturation, low_value) = to_hsv(low);
    let (high_hue, high_saturation, high_value) = to_hsv(high);
    let hue_diff = high_hue - low_hue;
    let mut hue = if hue_diff > 0.5 {
        low_hue - t * (1.0 - hue_diff)
    } else if hue_diff < -0.5 {
        low_hue + t * (1.0 + hue_diff)
    } else {
        low_hue + t * hue_diff
    };
    if hue < 0.0 {
        hue += 1.0;
    } else if hue >= 1.0 {
        hue -= 1.0;
    }
    let (red, green, blue) = from_hsv(
        hue,
        lerp(low_saturation, high_saturation, t),
        lerp(low_value, high_value, t),
    );
    Color::rgba(red, green, blue, lerp(low.alpha, high.alpha, t))
}

/// RGB to HSV with all components in `[0, 1]`; achromatic colors get hue 0.
fn to_hsv(color: Color) -> (f64, f64, f64) {
    let max = color.red.max(color.green).max(color.blue);
    let min = color.red.min(color.green).min(color.blue);
    let delta = max - min;
    let saturation = if max > 0.0 { delta / max } else { 0.0 };
    if delta <= 0.0 {
        return (0.0, saturation, max);
    }
    let sector = if max == color.red {
        ((color.green - color.blue) / delta).rem_euclid(6.0)
    } else if max == color.green {
        (color.blue - color.red) / delta + 2.0
    } else {
        (color.red - color.green) / delta + 4.0
    };
    (sector / 6.0, saturation, max)
}

fn from_hsv(hue: f64, saturation: f64, value: f64) -> (f64, f64, f64) {
    let sector = (hue * 6.0).rem_euclid(6.0);
    let chroma = value * saturation;
    let x = chroma * (1.0 - ((sector % 2.0) - 1.0).abs());
    let m = value - chroma;
    let (red, green, blue) = match sector as u8 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    (red + m, green + m, blue + m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsv_round_trip_of_primary_colors() {
        for color in [
            Color::rgb(1.0, 0.0, 0.0),
            Color::rgb(0.0, 1.0, 0.0),
            Color::rgb(0.0, 0.0, 1.0),
        ] {
            let (h, s, v) = to_hsv(color);
            let (r, g, b) = from_hsv(h, s, v);
            assert!((r - color.red).abs() <= 1e-9);
            assert!((g - color.green).abs() <= 1e-9);
            assert!((b - color.blue).abs() <= 1e-9);
        }
    }

    #[test]
    fn hsv_hue_takes_short_way() {
        // red (0.0) to magenta (5/6) should pass through 11/12, not green
        let mid = lerp_hsv(Color::rgb(1.0, 0.0, 0.0), Color::rgb(1.0, 0.0, 1.0), 0.5);
        assert!(mid.green.abs() <= 1e-9);
        assert!(mid.red >= mid.blue);
    }
}
