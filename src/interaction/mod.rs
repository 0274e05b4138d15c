use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::{PixelPoint, PixelRect};

/// Outcome of a successful hit-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectTestResult {
    /// Pixel distance from the query position to the nearest drawn primitive.
    pub distance: f64,
    /// Container index of the data point owning that primitive.
    pub data_index: usize,
}

impl SelectTestResult {
    #[must_use]
    pub const fn new(distance: f64, data_index: usize) -> Self {
        Self {
            distance,
            data_index,
        }
    }
}

/// Maximum distance at which a hit still counts as a selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionTolerance {
    pub pixels: f64,
}

impl Default for SelectionTolerance {
    fn default() -> Self {
        Self { pixels: 8.0 }
    }
}

impl SelectionTolerance {
    #[must_use]
    pub const fn new(pixels: f64) -> Self {
        Self { pixels }
    }

    #[must_use]
    pub fn accepts(self, result: Option<SelectTestResult>) -> bool {
        result.is_some_and(|hit| hit.distance <= self.pixels)
    }
}

#[must_use]
pub fn point_distance(a: PixelPoint, b: PixelPoint) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Distance from `point` to the closed segment `from..to`.
#[must_use]
pub fn segment_distance(point: PixelPoint, from: PixelPoint, to: PixelPoint) -> f64 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length_squared = dx * dx + dy * dy;
    if length_squared <= 0.0 {
        return point_distance(point, from);
    }
    let t = (((point.x - from.x) * dx + (point.y - from.y) * dy) / length_squared).clamp(0.0, 1.0);
    point_distance(point, PixelPoint::new(from.x + t * dx, from.y + t * dy))
}

/// Distance from `point` to a rectangle; zero anywhere inside when `filled`.
#[must_use]
pub fn rect_distance(point: PixelPoint, rect: PixelRect, filled: bool) -> f64 {
    if filled && rect.contains(point) {
        return 0.0;
    }
    let corners = [
        PixelPoint::new(rect.left(), rect.top()),
        PixelPoint::new(rect.right(), rect.top()),
        PixelPoint::new(rect.right(), rect.bottom()),
        PixelPoint::new(rect.left(), rect.bottom()),
    ];
    (0..4)
        .map(|edge| segment_distance(point, corners[edge], corners[(edge + 1) % 4]))
        .fold(f64::INFINITY, f64::min)
}

/// Minimum distance from `point` to any edge of the polyline.
#[must_use]
pub fn polyline_distance(point: PixelPoint, vertices: &[PixelPoint]) -> f64 {
    match vertices {
        [] => f64::INFINITY,
        [single] => point_distance(point, *single),
        _ => vertices
            .windows(2)
            .filter(|pair| pair[0].is_finite() && pair[1].is_finite())
            .map(|pair| segment_distance(point, pair[0], pair[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Picks the candidate with the smallest finite distance.
pub fn closest<I>(candidates: I) -> Option<SelectTestResult>
where
    I: IntoIterator<Item = SelectTestResult>,
{
    candidates
        .into_iter()
        .filter(|candidate| candidate.distance.is_finite())
        .min_by_key(|candidate| OrderedFloat(candidate.distance))
}
