use crate::core::axis::PlotAxes;
use crate::core::data_container::DataContainer;
use crate::core::financial_geometry::{WidthType, resolve_bar_width_px};
use crate::core::graph_data::GraphData;
use crate::core::types::PixelRect;

/// Relative tolerance for matching keys of stacked bars.
const STACK_KEY_EPSILON: f64 = 1e-14;

/// Key-pixel offsets `(lower, upper)` of a bar's edges relative to its key pixel.
///
/// `lower` belongs to the lower-key side, so for reversed or vertical key
/// axes it is the positive offset.
#[must_use]
pub fn bar_pixel_offsets(key: f64, width: f64, width_type: WidthType, axes: &PlotAxes<'_>) -> (f64, f64) {
    match width_type {
        WidthType::Absolute | WidthType::AxisRectRatio => {
            let half = resolve_bar_width_px(key, width, width_type, axes) * 0.5 * axes.key_pixel_direction();
            (-half, half)
        }
        WidthType::PlotCoords => {
            let key_pixel = axes.pixel_for_key(key);
            (
                axes.pixel_for_key(key - width * 0.5) - key_pixel,
                axes.pixel_for_key(key + width * 0.5) - key_pixel,
            )
        }
    }
}

/// Gap between neighbouring bars of a group, in pixels.
#[must_use]
pub fn group_spacing_px(key: f64, spacing: f64, spacing_type: WidthType, axes: &PlotAxes<'_>) -> f64 {
    match spacing_type {
        WidthType::Absolute => spacing,
        WidthType::AxisRectRatio => spacing * axes.key_pixel_length(),
        WidthType::PlotCoords => (axes.pixel_for_key(key + spacing) - axes.pixel_for_key(key)).abs(),
    }
}

/// Key-pixel shift of one bar stack inside a group of side-by-side stacks.
///
/// `widths` holds the pixel width of every stack in group order. The stacks
/// are centered on the key: with an odd count the middle stack stays put,
/// with an even count the gap between the two middle stacks sits on the key.
/// `key_direction` is [`PlotAxes::key_pixel_direction`].
#[must_use]
pub fn group_key_offset(widths: &[f64], spacing: f64, index: usize, key_direction: f64) -> f64 {
    let count = widths.len();
    if index >= count {
        return 0.0;
    }
    let center = (count - 1) / 2;
    if count % 2 == 1 && index == center {
        return 0.0;
    }

    let toward_lower = index <= center;
    let (start, mut offset) = if count % 2 == 0 {
        let start = if toward_lower { count / 2 - 1 } else { count / 2 };
        (start, spacing * 0.5)
    } else {
        let start = if toward_lower { center - 1 } else { center + 1 };
        (start, widths[center] * 0.5 + spacing)
    };

    let between = if toward_lower { index + 1..start + 1 } else { start..index };
    for width in &widths[between] {
        offset += width + spacing;
    }
    offset += widths[index] * 0.5;

    let direction = if toward_lower { -1.0 } else { 1.0 };
    offset * direction * key_direction
}

/// Most extreme value stored at `key` in one stack layer.
///
/// Only values on the requested side of zero count; `0.0` when there is none.
#[must_use]
pub fn stack_layer_extreme(data: &DataContainer<GraphData>, key: f64, positive: bool) -> f64 {
    let epsilon = if key == 0.0 {
        STACK_KEY_EPSILON
    } else {
        key.abs() * STACK_KEY_EPSILON
    };
    let range = data.find_begin(key - epsilon, false)..data.find_end(key + epsilon, false);
    data.as_slice()[range]
        .iter()
        .filter(|point| point.key > key - epsilon && point.key < key + epsilon)
        .fold(0.0, |extreme: f64, point| {
            if (positive && point.value > extreme) || (!positive && point.value < extreme) {
                point.value
            } else {
                extreme
            }
        })
}

/// Screen rect of one bar spanning `base..base + value` along the value axis.
///
/// `key_pixel` already includes any group offset.
#[must_use]
pub fn bar_rect(
    key_pixel: f64,
    (lower, upper): (f64, f64),
    base: f64,
    value: f64,
    axes: &PlotAxes<'_>,
) -> PixelRect {
    PixelRect::from_corners(
        axes.to_screen(key_pixel + lower, axes.pixel_for_value(base)),
        axes.to_screen(key_pixel + upper, axes.pixel_for_value(base + value)),
    )
}
