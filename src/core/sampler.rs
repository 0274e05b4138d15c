use std::borrow::Cow;
use std::ops::Range;

use smallvec::SmallVec;
use tracing::trace;

use crate::core::axis::PlotAxes;
use crate::core::data_container::SortedData;

/// Returns `true` when `point_count` points are denser than the key axis pixels.
#[must_use]
pub fn exceeds_pixel_density(point_count: usize, key_pixel_length: f64) -> bool {
    point_count as f64 > key_pixel_length
}

/// Reduces `points` to at most four samples per key-pixel column.
///
/// Points must be key-ordered. Each run of consecutive points falling into
/// the same integer key-pixel column contributes its first, minimum-value,
/// maximum-value and last point, in original order and without repeating an
/// index. The output never exceeds `4 * ceil(key_pixel_length)` points.
///
/// Passes the input through when `enabled` is false or the points are not
/// denser than the pixels. A zero-length key axis yields no samples.
pub fn sample_visible<'a, T: SortedData>(
    points: &'a [T],
    axes: &PlotAxes<'_>,
    enabled: bool,
) -> Cow<'a, [T]> {
    let key_pixel_length = axes.key_pixel_length();
    if key_pixel_length <= 0.0 {
        return Cow::Owned(Vec::new());
    }
    if !enabled || !exceeds_pixel_density(points.len(), key_pixel_length) {
        return Cow::Borrowed(points);
    }

    let (key_pixel_offset, _) = axes.key_axis().pixel_extent();
    let last_column = (key_pixel_length - 1.0).max(0.0);
    // points outside the axis join the edge columns
    let column = |point: &T| {
        (axes.pixel_for_key(point.sort_key()) - key_pixel_offset)
            .clamp(0.0, last_column)
            .floor()
    };
    let mut sampled = Vec::with_capacity((key_pixel_length.ceil() as usize + 1) * 4);
    let mut bucket_start = 0;
    let mut bucket_column = column(&points[0]);
    for (index, point) in points.iter().enumerate().skip(1) {
        let point_column = column(point);
        if point_column != bucket_column {
            push_bucket(points, bucket_start..index, &mut sampled);
            bucket_start = index;
            bucket_column = point_column;
        }
    }
    push_bucket(points, bucket_start..points.len(), &mut sampled);

    trace!(
        input = points.len(),
        output = sampled.len(),
        key_pixel_length,
        "adaptive sampling"
    );
    Cow::Owned(sampled)
}

fn push_bucket<T: SortedData>(points: &[T], bucket: Range<usize>, out: &mut Vec<T>) {
    if bucket.is_empty() {
        return;
    }
    let first = bucket.start;
    let last = bucket.end - 1;
    let mut min_index = first;
    let mut max_index = first;
    for index in bucket {
        let value = points[index].main_value();
        if value.is_nan() {
            continue;
        }
        if points[min_index].main_value().is_nan() || value < points[min_index].main_value() {
            min_index = index;
        }
        if points[max_index].main_value().is_nan() || value > points[max_index].main_value() {
            max_index = index;
        }
    }

    let mut indices: SmallVec<[usize; 4]> = SmallVec::from_buf([first, min_index, max_index, last]);
    indices.sort_unstable();
    indices.dedup();
    out.extend(indices.into_iter().map(|index| points[index]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Axis, GraphData, PlotRange};

    #[test]
    fn bucket_keeps_first_min_max_last_in_order() {
        let points = [
            GraphData::new(0.0, 5.0),
            GraphData::new(0.1, 9.0),
            GraphData::new(0.2, 1.0),
            GraphData::new(0.3, 4.0),
            GraphData::new(0.4, 6.0),
        ];
        let mut out = Vec::new();
        push_bucket(&points, 0..points.len(), &mut out);
        let keys: Vec<f64> = out.iter().map(|p| p.key).collect();
        assert_eq!(keys, vec![0.0, 0.1, 0.2, 0.4]);
    }

    #[test]
    fn zero_width_axis_yields_no_samples() {
        let key = Axis::horizontal(PlotRange::new(0.0, 10.0), 0.0, 0.0).expect("key axis");
        let value = Axis::vertical(PlotRange::new(0.0, 10.0), 0.0, 100.0).expect("value axis");
        let axes = PlotAxes::new(&key, &value).expect("axes");
        let points = [GraphData::new(1.0, 1.0), GraphData::new(2.0, 2.0)];
        assert!(sample_visible(&points, &axes, true).is_empty());
    }
}
