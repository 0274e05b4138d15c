use serde::{Deserialize, Serialize};

use crate::core::axis::{PlotAxes, ScaleType};
use crate::core::graph_data::GraphData;
use crate::core::types::PixelPoint;

/// How consecutive graph points are connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LineStyle {
    /// Markers only.
    None,
    #[default]
    Line,
    /// Holds the left point's value until the next key.
    StepLeft,
    /// Jumps to the right point's value at the left key.
    StepRight,
    /// Changes value halfway between two keys.
    StepCenter,
    /// One isolated segment from the value baseline per point.
    Impulse,
}

impl LineStyle {
    /// Whether the style draws one connected path (and may therefore be filled).
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            Self::Line | Self::StepLeft | Self::StepRight | Self::StepCenter
        )
    }
}

/// Screen-space line geometry produced for one draw pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LineGeometry {
    #[default]
    Empty,
    /// Connected path; non-finite vertices mark gaps.
    Polyline(Vec<PixelPoint>),
    /// Unconnected segments.
    Segments(Vec<[PixelPoint; 2]>),
}

impl LineGeometry {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Polyline(points) => points.len(),
            Self::Segments(segments) => segments.len() * 2,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0
    }

    /// Connected vertices, empty for segment geometry.
    #[must_use]
    pub fn polyline(&self) -> &[PixelPoint] {
        match self {
            Self::Polyline(points) => points,
            _ => &[],
        }
    }
}

/// Builds the line geometry of `points` for `style`.
///
/// `points` must be key-ordered; they are usually the sampled visible slice.
#[must_use]
pub fn build_line_geometry(style: LineStyle, points: &[GraphData], axes: &PlotAxes<'_>) -> LineGeometry {
    if points.is_empty() {
        return LineGeometry::Empty;
    }
    match style {
        LineStyle::None => LineGeometry::Empty,
        LineStyle::Line => LineGeometry::Polyline(line_vertices(points, axes)),
        LineStyle::StepLeft => LineGeometry::Polyline(step_left_vertices(points, axes)),
        LineStyle::StepRight => LineGeometry::Polyline(step_right_vertices(points, axes)),
        LineStyle::StepCenter => LineGeometry::Polyline(step_center_vertices(points, axes)),
        LineStyle::Impulse => LineGeometry::Segments(impulse_segments(points, axes)),
    }
}

#[must_use]
pub fn line_vertices(points: &[GraphData], axes: &PlotAxes<'_>) -> Vec<PixelPoint> {
    points
        .iter()
        .map(|point| axes.coords_to_pixels(point.key, point.value))
        .collect()
}

#[must_use]
pub fn step_left_vertices(points: &[GraphData], axes: &PlotAxes<'_>) -> Vec<PixelPoint> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let mut vertices = Vec::with_capacity(points.len() * 2);
    let mut last_value = axes.pixel_for_value(first.value);
    for point in points {
        let key = axes.pixel_for_key(point.key);
        vertices.push(axes.to_screen(key, last_value));
        last_value = axes.pixel_for_value(point.value);
        vertices.push(axes.to_screen(key, last_value));
    }
    vertices
}

#[must_use]
pub fn step_right_vertices(points: &[GraphData], axes: &PlotAxes<'_>) -> Vec<PixelPoint> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let mut vertices = Vec::with_capacity(points.len() * 2);
    let mut last_key = axes.pixel_for_key(first.key);
    for point in points {
        let value = axes.pixel_for_value(point.value);
        vertices.push(axes.to_screen(last_key, value));
        last_key = axes.pixel_for_key(point.key);
        vertices.push(axes.to_screen(last_key, value));
    }
    vertices
}

#[must_use]
pub fn step_center_vertices(points: &[GraphData], axes: &PlotAxes<'_>) -> Vec<PixelPoint> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let mut vertices = Vec::with_capacity(points.len() * 2);
    let mut last_value = axes.pixel_for_value(first.value);
    vertices.push(axes.to_screen(axes.pixel_for_key(first.key), last_value));
    for pair in points.windows(2) {
        let middle = axes.pixel_for_key((pair[0].key + pair[1].key) * 0.5);
        vertices.push(axes.to_screen(middle, last_value));
        last_value = axes.pixel_for_value(pair[1].value);
        vertices.push(axes.to_screen(middle, last_value));
    }
    if let Some(last) = points.last().filter(|_| points.len() > 1) {
        vertices.push(axes.to_screen(axes.pixel_for_key(last.key), last_value));
    }
    vertices
}

#[must_use]
pub fn impulse_segments(points: &[GraphData], axes: &PlotAxes<'_>) -> Vec<[PixelPoint; 2]> {
    let baseline = value_baseline_pixel(axes);
    points
        .iter()
        .map(|point| {
            let key = axes.pixel_for_key(point.key);
            [
                axes.to_screen(key, baseline),
                axes.to_screen(key, axes.pixel_for_value(point.value)),
            ]
        })
        .collect()
}

/// Value pixel that fills and impulses grow from.
///
/// Zero on linear value axes. Logarithmic axes cannot show zero, so the
/// visible bound nearest to zero is used instead.
#[must_use]
pub fn value_baseline_pixel(axes: &PlotAxes<'_>) -> f64 {
    let value_axis = axes.value_axis();
    match value_axis.scale_type() {
        ScaleType::Linear => axes.pixel_for_value(0.0),
        ScaleType::Logarithmic => {
            let range = value_axis.range();
            if range.upper < 0.0 {
                axes.pixel_for_value(range.upper)
            } else {
                axes.pixel_for_value(range.lower)
            }
        }
    }
}

/// Splits a polyline at non-finite vertices into drawable runs of two or more points.
pub fn finite_runs(vertices: &[PixelPoint]) -> impl Iterator<Item = &[PixelPoint]> {
    vertices
        .split(|vertex| !vertex.is_finite())
        .filter(|run| run.len() >= 2)
}

/// Closes one finite run against the value baseline.
///
/// Returns `None` for runs shorter than two vertices.
#[must_use]
pub fn baseline_fill_polygon(run: &[PixelPoint], axes: &PlotAxes<'_>) -> Option<Vec<PixelPoint>> {
    let (first, last) = match run {
        [first, .., last] => (*first, *last),
        _ => return None,
    };
    let baseline = value_baseline_pixel(axes);
    let (first_key, _) = axes.from_screen(first);
    let (last_key, _) = axes.from_screen(last);

    let mut polygon = Vec::with_capacity(run.len() + 2);
    polygon.push(axes.to_screen(first_key, baseline));
    polygon.extend_from_slice(run);
    polygon.push(axes.to_screen(last_key, baseline));
    Some(polygon)
}

/// Builds the polygon between a line and its companion line.
///
/// Both vertex lists are ordered by key pixel, cropped to the key interval
/// they share (boundary points are linearly interpolated) and joined with the
/// companion reversed. Returns `None` when either side has fewer than two
/// finite vertices or the key intervals do not overlap.
#[must_use]
pub fn channel_fill_polygon(
    line: &[PixelPoint],
    companion: &[PixelPoint],
    axes: &PlotAxes<'_>,
) -> Option<Vec<PixelPoint>> {
    let mut this = to_key_value_pixels(line, axes);
    let mut other = to_key_value_pixels(companion, axes);
    if this.len() < 2 || other.len() < 2 {
        return None;
    }

    let (this_first, this_last) = (this[0].0, this[this.len() - 1].0);
    let (other_first, other_last) = (other[0].0, other[other.len() - 1].0);
    if this_last < other_first || other_last < this_first {
        return None;
    }

    if this_first < other_first {
        crop_front(&mut this, other_first)?;
    } else if other_first < this_first {
        crop_front(&mut other, this_first)?;
    }
    if this_last > other_last {
        crop_back(&mut this, other_last)?;
    } else if other_last > this_last {
        crop_back(&mut other, this_last)?;
    }

    let mut polygon = Vec::with_capacity(this.len() + other.len());
    polygon.extend(this.iter().map(|&(key, value)| axes.to_screen(key, value)));
    polygon.extend(other.iter().rev().map(|&(key, value)| axes.to_screen(key, value)));
    Some(polygon)
}

fn to_key_value_pixels(vertices: &[PixelPoint], axes: &PlotAxes<'_>) -> Vec<(f64, f64)> {
    let mut pixels: Vec<(f64, f64)> = vertices
        .iter()
        .filter(|vertex| vertex.is_finite())
        .map(|vertex| axes.from_screen(*vertex))
        .collect();
    pixels.sort_by(|left, right| left.0.total_cmp(&right.0));
    pixels
}

fn interpolate(from: (f64, f64), to: (f64, f64), key: f64) -> (f64, f64) {
    let span = to.0 - from.0;
    if span == 0.0 {
        return (key, from.1);
    }
    (key, from.1 + (key - from.0) * (to.1 - from.1) / span)
}

/// Drops vertices before `boundary`, replacing the last dropped one with an
/// interpolated vertex exactly at `boundary`.
fn crop_front(data: &mut Vec<(f64, f64)>, boundary: f64) -> Option<()> {
    let below = data.partition_point(|vertex| vertex.0 < boundary);
    if below == 0 {
        return Some(());
    }
    if below == data.len() {
        return None;
    }
    let index = below - 1;
    data[index] = interpolate(data[index], data[index + 1], boundary);
    data.drain(..index);
    Some(())
}

/// Drops vertices after `boundary`, replacing the first dropped one with an
/// interpolated vertex exactly at `boundary`.
fn crop_back(data: &mut Vec<(f64, f64)>, boundary: f64) -> Option<()> {
    let index = data.partition_point(|vertex| vertex.0 <= boundary);
    if index == data.len() {
        return Some(());
    }
    if index == 0 {
        return None;
    }
    data[index] = interpolate(data[index - 1], data[index], boundary);
    data.truncate(index + 1);
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::axis::Axis;
    use crate::core::types::PlotRange;

    #[test]
    fn step_builders_accept_empty_input() {
        let key = Axis::horizontal(PlotRange::new(0.0, 10.0), 0.0, 100.0).expect("key axis");
        let value = Axis::vertical(PlotRange::new(0.0, 10.0), 0.0, 100.0).expect("value axis");
        let axes = PlotAxes::new(&key, &value).expect("axes");

        assert!(step_left_vertices(&[], &axes).is_empty());
        assert!(step_right_vertices(&[], &axes).is_empty());
        assert!(step_center_vertices(&[], &axes).is_empty());
        assert!(line_vertices(&[], &axes).is_empty());
        assert!(impulse_segments(&[], &axes).is_empty());
    }

    #[test]
    fn crop_front_interpolates_boundary_vertex() {
        let mut data = vec![(0.0, 0.0), (10.0, 100.0), (20.0, 0.0)];
        crop_front(&mut data, 5.0).expect("overlap");
        assert_eq!(data.len(), 3);
        assert!((data[0].0 - 5.0).abs() <= 1e-9);
        assert!((data[0].1 - 50.0).abs() <= 1e-9);
    }

    #[test]
    fn crop_back_interpolates_boundary_vertex() {
        let mut data = vec![(0.0, 0.0), (10.0, 100.0), (20.0, 0.0)];
        crop_back(&mut data, 15.0).expect("overlap");
        assert_eq!(data, vec![(0.0, 0.0), (10.0, 100.0), (15.0, 50.0)]);
    }

    #[test]
    fn crop_without_overlap_fails() {
        let mut data = vec![(0.0, 0.0), (1.0, 1.0)];
        assert!(crop_front(&mut data, 5.0).is_none());
    }
}
