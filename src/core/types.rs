use serde::{Deserialize, Serialize};

use crate::core::axis::ScaleType;

/// Smallest bound magnitude a logarithmic range may carry.
pub const LOG_RANGE_MIN: f64 = 1e-280;
/// Largest bound magnitude any range may carry.
pub const RANGE_MAX: f64 = 1e250;
/// Factor used to derive a positive lower bound when sanitizing for log scales.
pub const LOG_RANGE_FACTOR: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Restricts range computations to values of one sign.
///
/// Logarithmic axes can only show one sign domain, so autoscaling asks the
/// data for the range of positive or negative values only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SignDomain {
    #[default]
    Both,
    Negative,
    Positive,
}

impl SignDomain {
    #[must_use]
    pub fn admits(self, value: f64) -> bool {
        match self {
            Self::Both => true,
            Self::Negative => value < 0.0,
            Self::Positive => value > 0.0,
        }
    }
}

/// Closed interval in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotRange {
    pub lower: f64,
    pub upper: f64,
}

impl Default for PlotRange {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl PlotRange {
    #[must_use]
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    #[must_use]
    pub fn size(self) -> f64 {
        self.upper - self.lower
    }

    #[must_use]
    pub fn center(self) -> f64 {
        (self.upper + self.lower) * 0.5
    }

    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Returns a copy with `lower <= upper`.
    #[must_use]
    pub fn normalized(self) -> Self {
        if self.lower > self.upper {
            Self::new(self.upper, self.lower)
        } else {
            self
        }
    }

    /// Returns the smallest range covering both `self` and `other`.
    #[must_use]
    pub fn expanded(self, other: PlotRange) -> Self {
        Self::new(self.lower.min(other.lower), self.upper.max(other.upper))
    }

    /// Returns a copy clamped into `[lower_bound, upper_bound]`, keeping the size when possible.
    #[must_use]
    pub fn bounded(self, lower_bound: f64, upper_bound: f64) -> Self {
        let bounds = PlotRange::new(lower_bound, upper_bound).normalized();
        let mut result = self.normalized();
        if result.size() > bounds.size() {
            return bounds;
        }
        if result.lower < bounds.lower {
            let shift = bounds.lower - result.lower;
            result = Self::new(result.lower + shift, result.upper + shift);
        } else if result.upper > bounds.upper {
            let shift = result.upper - bounds.upper;
            result = Self::new(result.lower - shift, result.upper - shift);
        }
        result
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.lower.is_finite() && self.upper.is_finite()
    }

    /// Whether an axis of `scale_type` can display this range without degenerating.
    #[must_use]
    pub fn is_valid_for(self, scale_type: ScaleType) -> bool {
        if !self.is_finite() || self.lower >= self.upper {
            return false;
        }
        match scale_type {
            ScaleType::Linear => self.lower > -RANGE_MAX && self.upper < RANGE_MAX,
            ScaleType::Logarithmic => {
                (self.lower > LOG_RANGE_MIN && self.upper < RANGE_MAX)
                    || (self.lower > -RANGE_MAX && self.upper < -LOG_RANGE_MIN)
            }
        }
    }

    /// Returns a strictly positive range usable by a logarithmic mapping.
    ///
    /// A non-positive lower bound is replaced with `min(1e-3, upper * 1e-3)`
    /// while the upper bound is kept. A range without positive values falls
    /// back to `(1e-3, 1)`. Degenerate results widen the upper bound.
    #[must_use]
    pub fn sanitized_for_log_scale(self) -> Self {
        let mut range = self.normalized();
        if !range.is_finite() || range.upper <= 0.0 {
            return Self::new(LOG_RANGE_FACTOR, 1.0);
        }
        if range.lower <= 0.0 {
            range.lower = LOG_RANGE_FACTOR.min(range.upper * LOG_RANGE_FACTOR);
        }
        if range.lower < LOG_RANGE_MIN {
            range.lower = LOG_RANGE_MIN;
        }
        if range.lower >= range.upper {
            range.upper = range.lower * 10.0;
        }
        range
    }

    /// Returns a normalized copy; linear axes accept any finite range.
    #[must_use]
    pub fn sanitized_for_linear_scale(self) -> Self {
        self.normalized()
    }
}

/// Point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rectangle spanning two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: PixelPoint, b: PixelPoint) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self::new(left, top, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    #[must_use]
    pub fn left(self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn right(self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn top(self) -> f64 {
        self.y
    }

    #[must_use]
    pub fn bottom(self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    #[must_use]
    pub fn contains(self, point: PixelPoint) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_sanitization_keeps_positive_ranges() {
        let range = PlotRange::new(2.0, 50.0).sanitized_for_log_scale();
        assert_eq!(range, PlotRange::new(2.0, 50.0));
    }

    #[test]
    fn log_sanitization_replaces_zero_lower_bound() {
        let range = PlotRange::new(0.0, 0.5).sanitized_for_log_scale();
        assert!((range.lower - 0.0005).abs() <= 1e-12);
        assert_eq!(range.upper, 0.5);
    }

    #[test]
    fn log_sanitization_of_negative_only_range_falls_back() {
        let range = PlotRange::new(-8.0, -2.0).sanitized_for_log_scale();
        assert_eq!(range, PlotRange::new(LOG_RANGE_FACTOR, 1.0));
    }

    #[test]
    fn bounded_shifts_range_inside_bounds() {
        let range = PlotRange::new(-2.0, 3.0).bounded(0.0, 10.0);
        assert_eq!(range, PlotRange::new(0.0, 5.0));
    }
}
