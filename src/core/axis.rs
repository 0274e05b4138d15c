use serde::{Deserialize, Serialize};

use crate::core::types::{PixelPoint, PixelRect, PlotRange};
use crate::error::{PlotError, PlotResult};

/// Mapping mode between data coordinates and pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScaleType {
    /// Uniform spacing in raw units.
    #[default]
    Linear,
    /// Uniform spacing in log units; ranges must not cross zero.
    Logarithmic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisOrientation {
    Horizontal,
    Vertical,
}

/// Converts one data dimension to pixels and back.
///
/// Renderers only talk to axes through this trait; hosts may plug in their own
/// axis objects as long as the mapping is monotonic over the visible range.
/// Mappers must be `Sync` so projection can fan out across threads.
pub trait CoordinateMapper: Sync {
    fn coord_to_pixel(&self, value: f64) -> f64;
    fn pixel_to_coord(&self, pixel: f64) -> f64;
    /// Currently visible data range.
    fn range(&self) -> PlotRange;
    fn scale_type(&self) -> ScaleType;
    fn range_reversed(&self) -> bool;
    fn orientation(&self) -> AxisOrientation;
    /// Pixel offset and length of the axis along its orientation.
    fn pixel_extent(&self) -> (f64, f64);
}

/// Concrete linear/logarithmic axis.
///
/// Horizontal axes grow to the right, vertical axes grow upward; a reversed
/// range flips that direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    orientation: AxisOrientation,
    range: PlotRange,
    scale_type: ScaleType,
    #[serde(default)]
    reversed: bool,
    pixel_offset: f64,
    pixel_length: f64,
}

impl Axis {
    pub fn new(
        orientation: AxisOrientation,
        range: PlotRange,
        pixel_offset: f64,
        pixel_length: f64,
    ) -> PlotResult<Self> {
        validate_pixel_span(pixel_offset, pixel_length)?;
        let range = range.normalized();
        if !range.is_finite() || range.lower == range.upper {
            return Err(PlotError::InvalidData(
                "axis range must be finite and non-zero".to_owned(),
            ));
        }
        Ok(Self {
            orientation,
            range,
            scale_type: ScaleType::Linear,
            reversed: false,
            pixel_offset,
            pixel_length,
        })
    }

    /// Axis with a zero-length pixel span; `range` must already be finite and non-degenerate.
    pub(crate) const fn unplaced(orientation: AxisOrientation, range: PlotRange) -> Self {
        Self {
            orientation,
            range,
            scale_type: ScaleType::Linear,
            reversed: false,
            pixel_offset: 0.0,
            pixel_length: 0.0,
        }
    }

    pub fn horizontal(range: PlotRange, left: f64, width: f64) -> PlotResult<Self> {
        Self::new(AxisOrientation::Horizontal, range, left, width)
    }

    pub fn vertical(range: PlotRange, top: f64, height: f64) -> PlotResult<Self> {
        Self::new(AxisOrientation::Vertical, range, top, height)
    }

    #[must_use]
    pub fn with_scale_type(mut self, scale_type: ScaleType) -> Self {
        self.set_scale_type(scale_type);
        self
    }

    #[must_use]
    pub fn with_range_reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    /// Applies a new range; invalid ranges for the active scale type are sanitized.
    ///
    /// Returns `true` when the stored range changed.
    pub fn set_range(&mut self, range: PlotRange) -> bool {
        let sanitized = match self.scale_type {
            ScaleType::Linear => range.sanitized_for_linear_scale(),
            ScaleType::Logarithmic => range.sanitized_for_log_scale(),
        };
        if !sanitized.is_finite() || sanitized.lower == sanitized.upper {
            return false;
        }
        if sanitized == self.range {
            return false;
        }
        self.range = sanitized;
        true
    }

    /// Returns `true` when the scale type changed.
    pub fn set_scale_type(&mut self, scale_type: ScaleType) -> bool {
        if self.scale_type == scale_type {
            return false;
        }
        self.scale_type = scale_type;
        if scale_type == ScaleType::Logarithmic {
            self.range = self.range.sanitized_for_log_scale();
        }
        true
    }

    pub fn set_range_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }

    pub fn set_pixel_span(&mut self, pixel_offset: f64, pixel_length: f64) -> PlotResult<()> {
        validate_pixel_span(pixel_offset, pixel_length)?;
        self.pixel_offset = pixel_offset;
        self.pixel_length = pixel_length;
        Ok(())
    }

    pub fn set_orientation(&mut self, orientation: AxisOrientation) {
        self.orientation = orientation;
    }

    /// Shifts the range by `diff` (additive for linear, multiplicative for log scales).
    pub fn move_range(&mut self, diff: f64) -> bool {
        let moved = match self.scale_type {
            ScaleType::Linear => PlotRange::new(self.range.lower + diff, self.range.upper + diff),
            ScaleType::Logarithmic => {
                PlotRange::new(self.range.lower * diff, self.range.upper * diff)
            }
        };
        self.set_range(moved)
    }

    /// Scales the range around `center` by `factor` (`< 1` zooms in).
    pub fn scale_range(&mut self, factor: f64, center: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 || !center.is_finite() {
            return false;
        }
        let scaled = match self.scale_type {
            ScaleType::Linear => PlotRange::new(
                (self.range.lower - center) * factor + center,
                (self.range.upper - center) * factor + center,
            ),
            ScaleType::Logarithmic => {
                if center * self.range.lower <= 0.0 {
                    return false;
                }
                PlotRange::new(
                    (self.range.lower / center).powf(factor) * center,
                    (self.range.upper / center).powf(factor) * center,
                )
            }
        };
        self.set_range(scaled)
    }

    fn normalized_position(&self, value: f64) -> f64 {
        match self.scale_type {
            ScaleType::Linear => (value - self.range.lower) / self.range.size(),
            ScaleType::Logarithmic => {
                if value * self.range.lower <= 0.0 {
                    // outside the log domain: push far beyond the near edge
                    if self.range.upper > 0.0 { -200.0 } else { 200.0 }
                } else {
                    (value / self.range.lower).ln() / (self.range.upper / self.range.lower).ln()
                }
            }
        }
    }

    fn value_at(&self, normalized: f64) -> f64 {
        match self.scale_type {
            ScaleType::Linear => self.range.lower + normalized * self.range.size(),
            ScaleType::Logarithmic => {
                self.range.lower * (self.range.upper / self.range.lower).powf(normalized)
            }
        }
    }

    fn grows_toward_higher_pixels(&self) -> bool {
        match self.orientation {
            AxisOrientation::Horizontal => !self.reversed,
            AxisOrientation::Vertical => self.reversed,
        }
    }
}

impl CoordinateMapper for Axis {
    fn coord_to_pixel(&self, value: f64) -> f64 {
        let t = self.normalized_position(value);
        if self.grows_toward_higher_pixels() {
            self.pixel_offset + t * self.pixel_length
        } else {
            self.pixel_offset + self.pixel_length - t * self.pixel_length
        }
    }

    fn pixel_to_coord(&self, pixel: f64) -> f64 {
        let t = if self.grows_toward_higher_pixels() {
            (pixel - self.pixel_offset) / self.pixel_length
        } else {
            (self.pixel_offset + self.pixel_length - pixel) / self.pixel_length
        };
        self.value_at(t)
    }

    fn range(&self) -> PlotRange {
        self.range
    }

    fn scale_type(&self) -> ScaleType {
        self.scale_type
    }

    fn range_reversed(&self) -> bool {
        self.reversed
    }

    fn orientation(&self) -> AxisOrientation {
        self.orientation
    }

    fn pixel_extent(&self) -> (f64, f64) {
        (self.pixel_offset, self.pixel_length)
    }
}

fn validate_pixel_span(pixel_offset: f64, pixel_length: f64) -> PlotResult<()> {
    if !pixel_offset.is_finite() || !pixel_length.is_finite() || pixel_length < 0.0 {
        return Err(PlotError::InvalidData(
            "axis pixel span must be finite with length >= 0".to_owned(),
        ));
    }
    Ok(())
}

/// Key/value axis pair a plottable is drawn against.
///
/// The key axis may be horizontal (the usual case) or vertical; every
/// geometry builder works in key/value pixel space and converts to screen
/// `x/y` through this type.
#[derive(Clone, Copy)]
pub struct PlotAxes<'a> {
    key: &'a dyn CoordinateMapper,
    value: &'a dyn CoordinateMapper,
}

impl<'a> PlotAxes<'a> {
    pub fn new(key: &'a dyn CoordinateMapper, value: &'a dyn CoordinateMapper) -> PlotResult<Self> {
        if key.orientation() == value.orientation() {
            return Err(PlotError::InvalidData(
                "key and value axes must be perpendicular".to_owned(),
            ));
        }
        Ok(Self { key, value })
    }

    #[must_use]
    pub fn key_axis(&self) -> &'a dyn CoordinateMapper {
        self.key
    }

    #[must_use]
    pub fn value_axis(&self) -> &'a dyn CoordinateMapper {
        self.value
    }

    #[must_use]
    pub fn key_is_horizontal(&self) -> bool {
        self.key.orientation() == AxisOrientation::Horizontal
    }

    #[must_use]
    pub fn pixel_for_key(&self, key: f64) -> f64 {
        self.key.coord_to_pixel(key)
    }

    #[must_use]
    pub fn pixel_for_value(&self, value: f64) -> f64 {
        self.value.coord_to_pixel(value)
    }

    #[must_use]
    pub fn key_for_pixel(&self, pixel: f64) -> f64 {
        self.key.pixel_to_coord(pixel)
    }

    #[must_use]
    pub fn value_for_pixel(&self, pixel: f64) -> f64 {
        self.value.pixel_to_coord(pixel)
    }

    #[must_use]
    pub fn visible_key_range(&self) -> PlotRange {
        self.key.range()
    }

    /// Converts a key/value pixel pair into screen coordinates.
    #[must_use]
    pub fn to_screen(&self, key_pixel: f64, value_pixel: f64) -> PixelPoint {
        if self.key_is_horizontal() {
            PixelPoint::new(key_pixel, value_pixel)
        } else {
            PixelPoint::new(value_pixel, key_pixel)
        }
    }

    /// Splits a screen point into its key pixel and value pixel.
    #[must_use]
    pub fn from_screen(&self, point: PixelPoint) -> (f64, f64) {
        if self.key_is_horizontal() {
            (point.x, point.y)
        } else {
            (point.y, point.x)
        }
    }

    #[must_use]
    pub fn coords_to_pixels(&self, key: f64, value: f64) -> PixelPoint {
        self.to_screen(self.pixel_for_key(key), self.pixel_for_value(value))
    }

    #[must_use]
    pub fn pixels_to_coords(&self, point: PixelPoint) -> (f64, f64) {
        let (key_pixel, value_pixel) = self.from_screen(point);
        (self.key_for_pixel(key_pixel), self.value_for_pixel(value_pixel))
    }

    /// `1.0` when key pixels grow with the key, `-1.0` otherwise.
    #[must_use]
    pub fn key_pixel_direction(&self) -> f64 {
        let grows = match self.key.orientation() {
            AxisOrientation::Horizontal => !self.key.range_reversed(),
            AxisOrientation::Vertical => self.key.range_reversed(),
        };
        if grows { 1.0 } else { -1.0 }
    }

    /// Pixel extent of the key axis (never negative).
    #[must_use]
    pub fn key_pixel_length(&self) -> f64 {
        self.key.pixel_extent().1.max(0.0)
    }

    /// Rectangle spanned by both axes.
    #[must_use]
    pub fn axis_rect(&self) -> PixelRect {
        let (key_offset, key_length) = self.key.pixel_extent();
        let (value_offset, value_length) = self.value.pixel_extent();
        if self.key_is_horizontal() {
            PixelRect::new(key_offset, value_offset, key_length, value_length)
        } else {
            PixelRect::new(value_offset, key_offset, value_length, key_length)
        }
    }
}

impl std::fmt::Debug for PlotAxes<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotAxes")
            .field("key_range", &self.key.range())
            .field("value_range", &self.value.range())
            .field("key_horizontal", &self.key_is_horizontal())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_axis_grows_upward() {
        let axis = Axis::vertical(PlotRange::new(0.0, 100.0), 0.0, 500.0).expect("axis");
        assert!((axis.coord_to_pixel(0.0) - 500.0).abs() <= 1e-9);
        assert!((axis.coord_to_pixel(100.0) - 0.0).abs() <= 1e-9);
    }

    #[test]
    fn log_axis_places_decades_evenly() {
        let axis = Axis::horizontal(PlotRange::new(1.0, 1000.0), 0.0, 300.0)
            .expect("axis")
            .with_scale_type(ScaleType::Logarithmic);
        assert!((axis.coord_to_pixel(10.0) - 100.0).abs() <= 1e-9);
        assert!((axis.pixel_to_coord(200.0) - 100.0).abs() <= 1e-9);
    }
}
