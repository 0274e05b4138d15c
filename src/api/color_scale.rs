use std::cell::RefCell;
use std::rc::{Rc, Weak};

use image::{Rgba, RgbaImage, imageops};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{
    Axis, AxisOrientation, ColorGradient, CoordinateMapper, PixelRect, PlotRange, ScaleType,
};
use crate::error::{PlotError, PlotResult};
use crate::render::Painter;

use super::PlotConfig;

/// Space between the outer rect and the gradient bar, per side.
pub const COLOR_SCALE_MARGIN_PX: f64 = 5.0;

const DEFAULT_DATA_RANGE: PlotRange = PlotRange::new(0.0, 6.0);

/// Upper bound for the cross-axis size of the cached gradient image. The
/// image is stretched into the bar rect, so wider bars lose nothing.
pub const MAX_GRADIENT_IMAGE_THICKNESS: u32 = 1024;

/// Edge of the plot a color scale is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColorScaleSide {
    Left,
    #[default]
    Right,
    Top,
    Bottom,
}

impl ColorScaleSide {
    /// Left/right scales run their color axis vertically.
    #[must_use]
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    fn axis_orientation(self) -> AxisOrientation {
        if self.is_vertical() {
            AxisOrientation::Vertical
        } else {
            AxisOrientation::Horizontal
        }
    }
}

/// Handle identifying one subscription on a [`ColorScale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerId(u64);

/// Plottable kept in sync with a [`ColorScale`].
///
/// Callbacks must only update local state; pushing changes back into the
/// scale from a callback is not supported.
pub trait ColorScaleConsumer {
    fn color_scale_data_range_changed(&mut self, range: PlotRange);

    fn color_scale_data_scale_type_changed(&mut self, scale_type: ScaleType);

    fn color_scale_gradient_changed(&mut self, gradient: &ColorGradient);

    /// Data bounds used by [`ColorScale::rescale_data_range`].
    fn data_bounds(&self) -> Option<PlotRange> {
        None
    }
}

/// Interactive viewport of a color scale: the bar geometry, its color axis
/// and the cached gradient image.
#[derive(Debug, Clone)]
pub struct ColorScaleAxisRect {
    outer_rect: PixelRect,
    color_axis: Axis,
    range_drag: bool,
    range_zoom: bool,
    gradient_image: Option<RgbaImage>,
    image_invalidated: bool,
    image_generation: u64,
}

impl ColorScaleAxisRect {
    fn new(side: ColorScaleSide) -> Self {
        Self {
            outer_rect: PixelRect::default(),
            color_axis: Axis::unplaced(side.axis_orientation(), DEFAULT_DATA_RANGE),
            range_drag: true,
            range_zoom: true,
            gradient_image: None,
            image_invalidated: true,
            image_generation: 0,
        }
    }

    #[must_use]
    pub fn outer_rect(&self) -> PixelRect {
        self.outer_rect
    }

    /// Axis mapping data values along the bar.
    #[must_use]
    pub fn color_axis(&self) -> &Axis {
        &self.color_axis
    }

    #[must_use]
    pub fn range_drag(&self) -> bool {
        self.range_drag
    }

    #[must_use]
    pub fn range_zoom(&self) -> bool {
        self.range_zoom
    }

    /// Number of times the gradient image has been rebuilt.
    #[must_use]
    pub fn image_generation(&self) -> u64 {
        self.image_generation
    }

    #[must_use]
    pub fn gradient_image(&self) -> Option<&RgbaImage> {
        self.gradient_image.as_ref()
    }

    #[must_use]
    pub fn is_image_invalidated(&self) -> bool {
        self.image_invalidated
    }

    fn invalidate_image(&mut self) {
        self.image_invalidated = true;
    }
}

/// Gradient bar mapping data values to colors, shared by color maps.
///
/// Changing a property here updates every subscribed consumer; a consumer
/// changing its own property pushes it here, which forwards it to the other
/// consumers. Values are only propagated when they differ.
#[derive(Debug)]
pub struct ColorScale {
    data_range: PlotRange,
    data_scale_type: ScaleType,
    gradient: ColorGradient,
    bar_width: f64,
    side: ColorScaleSide,
    axis_rect: ColorScaleAxisRect,
    consumers: IndexMap<ConsumerId, Weak<RefCell<dyn ColorScaleConsumer>>>,
    next_consumer_id: u64,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorScale {
    #[must_use]
    pub fn new() -> Self {
        let side = ColorScaleSide::Right;
        Self {
            data_range: DEFAULT_DATA_RANGE,
            data_scale_type: ScaleType::Linear,
            gradient: ColorGradient::default(),
            bar_width: 20.0,
            side,
            axis_rect: ColorScaleAxisRect::new(side),
            consumers: IndexMap::new(),
            next_consumer_id: 0,
        }
    }

    pub fn with_config(config: &PlotConfig) -> PlotResult<Self> {
        config.validate()?;
        let mut scale = Self::new();
        scale.gradient.set_level_count(config.gradient_level_count)?;
        scale.bar_width = config.color_scale_bar_width;
        Ok(scale)
    }

    #[must_use]
    pub fn into_shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    #[must_use]
    pub fn data_range(&self) -> PlotRange {
        self.data_range
    }

    /// Returns `true` when the stored range changed.
    pub fn set_data_range(&mut self, range: PlotRange) -> bool {
        self.set_data_range_from(None, range)
    }

    /// Applies a range pushed by consumer `origin`, which is not notified back.
    pub fn set_data_range_from(&mut self, origin: Option<ConsumerId>, range: PlotRange) -> bool {
        let Some(range) = sanitize_data_range(range, self.data_scale_type) else {
            return false;
        };
        if range == self.data_range {
            return false;
        }
        self.data_range = range;
        self.sync_color_axis_range();
        self.axis_rect.invalidate_image();
        debug!(lower = range.lower, upper = range.upper, "color scale data range changed");

        self.prune_consumers();
        self.notify(origin, |consumer| consumer.color_scale_data_range_changed(range));
        true
    }

    #[must_use]
    pub fn data_scale_type(&self) -> ScaleType {
        self.data_scale_type
    }

    pub fn set_data_scale_type(&mut self, scale_type: ScaleType) -> bool {
        self.set_data_scale_type_from(None, scale_type)
    }

    /// Switching to a logarithmic scale also sanitizes the data range; the
    /// range is propagated before the scale type.
    pub fn set_data_scale_type_from(&mut self, origin: Option<ConsumerId>, scale_type: ScaleType) -> bool {
        if scale_type == self.data_scale_type {
            return false;
        }
        self.data_scale_type = scale_type;
        self.axis_rect.color_axis.set_scale_type(scale_type);
        self.axis_rect.invalidate_image();
        debug!(?scale_type, "color scale data scale type changed");

        // consumers must never see a log scale paired with a non-positive range
        if scale_type == ScaleType::Logarithmic {
            let sanitized = self.data_range.sanitized_for_log_scale();
            self.set_data_range_from(origin, sanitized);
        }
        self.prune_consumers();
        self.notify(origin, |consumer| {
            consumer.color_scale_data_scale_type_changed(scale_type);
        });
        true
    }

    #[must_use]
    pub fn gradient(&self) -> &ColorGradient {
        &self.gradient
    }

    pub fn set_gradient(&mut self, gradient: ColorGradient) -> bool {
        self.set_gradient_from(None, gradient)
    }

    pub fn set_gradient_from(&mut self, origin: Option<ConsumerId>, gradient: ColorGradient) -> bool {
        if gradient == self.gradient {
            return false;
        }
        self.gradient = gradient;
        self.axis_rect.invalidate_image();
        debug!(levels = self.gradient.level_count(), "color scale gradient changed");

        self.prune_consumers();
        self.notify(origin, |consumer| consumer.color_scale_gradient_changed(&self.gradient));
        true
    }

    #[must_use]
    pub fn bar_width(&self) -> f64 {
        self.bar_width
    }

    /// Thickness of the gradient bar in pixels.
    pub fn set_bar_width(&mut self, bar_width: f64) -> PlotResult<()> {
        if !bar_width.is_finite() || bar_width < 0.0 {
            return Err(PlotError::InvalidData(
                "color scale bar width must be finite and >= 0".to_owned(),
            ));
        }
        if bar_width != self.bar_width {
            self.bar_width = bar_width;
            self.relayout();
        }
        Ok(())
    }

    #[must_use]
    pub fn side(&self) -> ColorScaleSide {
        self.side
    }

    pub fn set_side(&mut self, side: ColorScaleSide) {
        if side == self.side {
            return;
        }
        self.side = side;
        self.axis_rect.color_axis.set_orientation(side.axis_orientation());
        self.relayout();
    }

    #[must_use]
    pub fn range_reversed(&self) -> bool {
        self.axis_rect.color_axis.range_reversed()
    }

    /// Reverses the color axis; the gradient is drawn mirrored.
    pub fn set_range_reversed(&mut self, reversed: bool) {
        self.axis_rect.color_axis.set_range_reversed(reversed);
    }

    #[must_use]
    pub fn range_drag(&self) -> bool {
        self.axis_rect.range_drag
    }

    pub fn set_range_drag(&mut self, enabled: bool) {
        self.axis_rect.range_drag = enabled;
    }

    #[must_use]
    pub fn range_zoom(&self) -> bool {
        self.axis_rect.range_zoom
    }

    pub fn set_range_zoom(&mut self, enabled: bool) {
        self.axis_rect.range_zoom = enabled;
    }

    #[must_use]
    pub fn axis_rect(&self) -> &ColorScaleAxisRect {
        &self.axis_rect
    }

    #[must_use]
    pub fn outer_rect(&self) -> PixelRect {
        self.axis_rect.outer_rect
    }

    /// Assigns the rectangle the host layout reserved for this scale.
    pub fn set_outer_rect(&mut self, rect: PixelRect) -> PlotResult<()> {
        if !rect.x.is_finite()
            || !rect.y.is_finite()
            || !rect.width.is_finite()
            || !rect.height.is_finite()
            || rect.width < 0.0
            || rect.height < 0.0
        {
            return Err(PlotError::InvalidData(
                "color scale rect must be finite with non-negative size".to_owned(),
            ));
        }
        if rect != self.axis_rect.outer_rect {
            self.axis_rect.outer_rect = rect;
            self.relayout();
        }
        Ok(())
    }

    /// Smallest extent across the bar the host layout should reserve.
    #[must_use]
    pub fn minimum_outer_extent(&self) -> f64 {
        self.bar_width + 2.0 * COLOR_SCALE_MARGIN_PX
    }

    /// Rectangle the gradient is drawn into, hugging the plot-facing edge.
    #[must_use]
    pub fn bar_rect(&self) -> PixelRect {
        let outer = self.axis_rect.outer_rect;
        let inner = PixelRect::new(
            outer.x + COLOR_SCALE_MARGIN_PX,
            outer.y + COLOR_SCALE_MARGIN_PX,
            (outer.width - 2.0 * COLOR_SCALE_MARGIN_PX).max(0.0),
            (outer.height - 2.0 * COLOR_SCALE_MARGIN_PX).max(0.0),
        );
        match self.side {
            ColorScaleSide::Right => {
                PixelRect::new(inner.x, inner.y, self.bar_width.min(inner.width), inner.height)
            }
            ColorScaleSide::Left => {
                let width = self.bar_width.min(inner.width);
                PixelRect::new(inner.right() - width, inner.y, width, inner.height)
            }
            ColorScaleSide::Bottom => {
                PixelRect::new(inner.x, inner.y, inner.width, self.bar_width.min(inner.height))
            }
            ColorScaleSide::Top => {
                let height = self.bar_width.min(inner.height);
                PixelRect::new(inner.x, inner.bottom() - height, inner.width, height)
            }
        }
    }

    /// Registers a consumer; it is held weakly and dropped once it dies.
    pub fn subscribe(&mut self, consumer: Weak<RefCell<dyn ColorScaleConsumer>>) -> ConsumerId {
        let id = ConsumerId(self.next_consumer_id);
        self.next_consumer_id += 1;
        self.consumers.insert(id, consumer);
        debug!(consumer = id.0, "color scale consumer subscribed");
        id
    }

    pub fn unsubscribe(&mut self, id: ConsumerId) -> bool {
        self.consumers.shift_remove(&id).is_some()
    }

    /// Number of subscribed consumers that are still alive.
    #[must_use]
    pub fn consumer_count(&self) -> usize {
        self.consumers
            .values()
            .filter(|consumer| consumer.strong_count() > 0)
            .count()
    }

    /// Fits the data range to the union of the consumers' data bounds.
    pub fn rescale_data_range(&mut self) -> bool {
        let mut bounds: Option<PlotRange> = None;
        for consumer in self.consumers.values().filter_map(Weak::upgrade) {
            let Ok(consumer) = consumer.try_borrow() else {
                continue;
            };
            if let Some(consumer_bounds) = consumer.data_bounds() {
                bounds = Some(bounds.map_or(consumer_bounds, |current| current.expanded(consumer_bounds)));
            }
        }
        match bounds {
            Some(bounds) => self.set_data_range(bounds),
            None => false,
        }
    }

    /// Drags the range by `delta_px` pixels along the bar.
    ///
    /// The data value under the pointer follows the pointer. Returns `true`
    /// when the range changed.
    pub fn drag(&mut self, start_px: f64, delta_px: f64) -> bool {
        if !self.axis_rect.range_drag || !delta_px.is_finite() || !start_px.is_finite() {
            return false;
        }
        let axis = &self.axis_rect.color_axis;
        let from = axis.pixel_to_coord(start_px);
        let to = axis.pixel_to_coord(start_px + delta_px);
        let mut moved = *axis;
        let changed = match self.data_scale_type {
            ScaleType::Linear => moved.move_range(from - to),
            ScaleType::Logarithmic => moved.move_range(from / to),
        };
        changed && self.set_data_range(moved.range())
    }

    /// Scales the range by `factor` around the value at `center_px` (`< 1` zooms in).
    pub fn zoom(&mut self, factor: f64, center_px: f64) -> bool {
        if !self.axis_rect.range_zoom || !center_px.is_finite() {
            return false;
        }
        let axis = &self.axis_rect.color_axis;
        let center = axis.pixel_to_coord(center_px);
        let mut scaled = *axis;
        scaled.scale_range(factor, center) && self.set_data_range(scaled.range())
    }

    /// Draws the gradient bar, rebuilding the cached image if needed.
    pub fn draw(&mut self, painter: &mut dyn Painter) -> PlotResult<()> {
        let bar = self.bar_rect();
        if bar.is_empty() {
            return Ok(());
        }
        if self.axis_rect.image_invalidated || self.axis_rect.gradient_image.is_none() {
            self.regenerate_image(bar);
        }
        let Some(image) = self.axis_rect.gradient_image.as_ref() else {
            return Ok(());
        };

        if self.range_reversed() {
            let mirrored = if self.side.is_vertical() {
                imageops::flip_vertical(image)
            } else {
                imageops::flip_horizontal(image)
            };
            painter.draw_image(bar, &mirrored)
        } else {
            painter.draw_image(bar, image)
        }
    }

    fn regenerate_image(&mut self, bar: PixelRect) {
        let levels = self.gradient.levels();
        let count = u32::try_from(levels.len()).unwrap_or(u32::MAX);
        let image = if self.side.is_vertical() {
            let thickness = gradient_image_thickness(bar.width);
            // highest level on the top row
            RgbaImage::from_fn(thickness, count, |_, y| levels[(count - 1 - y) as usize])
        } else {
            let thickness = gradient_image_thickness(bar.height);
            RgbaImage::from_fn(count, thickness, |x, _| levels[x as usize])
        };
        self.axis_rect.gradient_image = Some(image);
        self.axis_rect.image_invalidated = false;
        self.axis_rect.image_generation += 1;
        trace!(
            generation = self.axis_rect.image_generation,
            levels = count,
            "color scale gradient image rebuilt"
        );
    }

    /// Color for `value` under the current range, scale type and gradient.
    #[must_use]
    pub fn color_for(&self, value: f64) -> Rgba<u8> {
        self.gradient.color_rgba8(
            value,
            self.data_range,
            self.data_scale_type == ScaleType::Logarithmic,
        )
    }

    fn relayout(&mut self) {
        let bar = self.bar_rect();
        let (offset, length) = if self.side.is_vertical() {
            (bar.y, bar.height)
        } else {
            (bar.x, bar.width)
        };
        if let Err(err) = self.axis_rect.color_axis.set_pixel_span(offset, length) {
            debug!(error = %err, "color axis span rejected");
        }
        self.axis_rect.invalidate_image();
    }

    fn sync_color_axis_range(&mut self) {
        if !self.axis_rect.color_axis.set_range(self.data_range) {
            trace!("color axis kept its range");
        }
    }

    fn prune_consumers(&mut self) {
        self.consumers.retain(|_, consumer| consumer.strong_count() > 0);
    }

    fn notify(&self, origin: Option<ConsumerId>, mut apply: impl FnMut(&mut dyn ColorScaleConsumer)) {
        for (id, consumer) in &self.consumers {
            if Some(*id) == origin {
                continue;
            }
            let Some(consumer) = consumer.upgrade() else {
                continue;
            };
            let Ok(mut consumer) = consumer.try_borrow_mut() else {
                debug!(consumer = id.0, "color scale consumer busy, skipping update");
                continue;
            };
            apply(&mut *consumer);
        }
    }
}

/// Normalizes a data range and applies the log-scale sanitization policy.
///
/// Returns `None` for non-finite or empty ranges.
pub(crate) fn sanitize_data_range(range: PlotRange, scale_type: ScaleType) -> Option<PlotRange> {
    if !range.is_finite() {
        return None;
    }
    let range = match scale_type {
        ScaleType::Linear => range.sanitized_for_linear_scale(),
        ScaleType::Logarithmic => range.sanitized_for_log_scale(),
    };
    (range.lower < range.upper).then_some(range)
}

/// Image rows (or columns) across the bar for a bar `extent` pixels thick.
fn gradient_image_thickness(extent: f64) -> u32 {
    let rounded = extent.round();
    if rounded.is_nan() || rounded < 1.0 {
        1
    } else if rounded >= f64::from(MAX_GRADIENT_IMAGE_THICKNESS) {
        MAX_GRADIENT_IMAGE_THICKNESS
    } else {
        rounded as u32
    }
}
