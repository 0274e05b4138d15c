use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use image::{Rgba, RgbaImage};
use tracing::{debug, trace, warn};

use crate::core::{
    AxisOrientation, ColorGradient, CoordinateMapper, PixelPoint, PixelRect, PlotAxes, PlotRange,
    ScaleType, SignDomain,
};
use crate::error::{PlotError, PlotResult};
use crate::interaction::SelectTestResult;
use crate::render::{Color, Painter};

use super::color_scale::sanitize_data_range;
use super::{ColorScale, ColorScaleConsumer, ConsumerId, PlotConfig, Plottable, PlottableStyle};

/// Regular grid of cell values spanning a key range and a value range.
///
/// Cell centers sit on the range bounds: cell `0` is centered on `lower`,
/// cell `size - 1` on `upper`. A single-cell dimension covers its whole range.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMapData {
    key_size: usize,
    value_size: usize,
    key_range: PlotRange,
    value_range: PlotRange,
    cells: Vec<f64>,
    data_bounds: Option<PlotRange>,
}

impl ColorMapData {
    pub fn new(
        key_size: usize,
        value_size: usize,
        key_range: PlotRange,
        value_range: PlotRange,
    ) -> PlotResult<Self> {
        if key_size == 0 || value_size == 0 {
            return Err(PlotError::InvalidData(
                "color map grid needs at least one cell per dimension".to_owned(),
            ));
        }
        validate_cell_range(key_range, key_size, "key")?;
        validate_cell_range(value_range, value_size, "value")?;
        Ok(Self {
            key_size,
            value_size,
            key_range,
            value_range,
            cells: vec![0.0; key_size * value_size],
            data_bounds: Some(PlotRange::new(0.0, 0.0)),
        })
    }

    #[must_use]
    pub fn key_size(&self) -> usize {
        self.key_size
    }

    #[must_use]
    pub fn value_size(&self) -> usize {
        self.value_size
    }

    #[must_use]
    pub fn key_range(&self) -> PlotRange {
        self.key_range
    }

    #[must_use]
    pub fn value_range(&self) -> PlotRange {
        self.value_range
    }

    /// Moves the grid to new coordinate ranges; cell values are kept.
    pub fn set_ranges(&mut self, key_range: PlotRange, value_range: PlotRange) -> PlotResult<()> {
        validate_cell_range(key_range, self.key_size, "key")?;
        validate_cell_range(value_range, self.value_size, "value")?;
        self.key_range = key_range;
        self.value_range = value_range;
        Ok(())
    }

    /// Cell values, row by row: `value_index * key_size + key_index`.
    #[must_use]
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    #[must_use]
    pub fn cell(&self, key_index: usize, value_index: usize) -> Option<f64> {
        self.cell_offset(key_index, value_index)
            .map(|offset| self.cells[offset])
    }

    /// Returns `false` when the indices are outside the grid.
    pub fn set_cell(&mut self, key_index: usize, value_index: usize, z: f64) -> bool {
        let Some(offset) = self.cell_offset(key_index, value_index) else {
            return false;
        };
        self.cells[offset] = z;
        if z.is_finite() {
            let point = PlotRange::new(z, z);
            self.data_bounds = Some(self.data_bounds.map_or(point, |bounds| bounds.expanded(point)));
        }
        true
    }

    /// Value of the cell covering `(key, value)`.
    #[must_use]
    pub fn data(&self, key: f64, value: f64) -> Option<f64> {
        let (key_index, value_index) = self.coord_to_cell(key, value)?;
        self.cell(key_index, value_index)
    }

    /// Writes into the cell covering `(key, value)`; `false` when outside the grid.
    pub fn set_data(&mut self, key: f64, value: f64, z: f64) -> bool {
        match self.coord_to_cell(key, value) {
            Some((key_index, value_index)) => self.set_cell(key_index, value_index, z),
            None => false,
        }
    }

    /// Cell covering a coordinate, rounding to the nearest cell center.
    #[must_use]
    pub fn coord_to_cell(&self, key: f64, value: f64) -> Option<(usize, usize)> {
        Some((
            coord_to_index(key, self.key_range, self.key_size)?,
            coord_to_index(value, self.value_range, self.value_size)?,
        ))
    }

    /// Coordinate of a cell center.
    #[must_use]
    pub fn cell_to_coord(&self, key_index: usize, value_index: usize) -> (f64, f64) {
        (
            index_to_coord(key_index, self.key_range, self.key_size),
            index_to_coord(value_index, self.value_range, self.value_size),
        )
    }

    /// Key range covered by the cells, including half a cell past each center.
    #[must_use]
    pub fn key_extent(&self) -> PlotRange {
        cell_extent(self.key_range, self.key_size)
    }

    /// Value range covered by the cells, including half a cell past each center.
    #[must_use]
    pub fn value_extent(&self) -> PlotRange {
        cell_extent(self.value_range, self.value_size)
    }

    pub fn fill(&mut self, z: f64) {
        self.cells.fill(z);
        self.data_bounds = z.is_finite().then_some(PlotRange::new(z, z));
    }

    /// Smallest and largest finite cell value, if any.
    #[must_use]
    pub fn data_bounds(&self) -> Option<PlotRange> {
        self.data_bounds
    }

    /// Recomputes the bounds from scratch.
    ///
    /// [`set_cell`](Self::set_cell) only ever widens the bounds, so call this
    /// after overwriting extreme values.
    pub fn recalculate_data_bounds(&mut self) {
        self.data_bounds = self
            .cells
            .iter()
            .copied()
            .filter(|z| z.is_finite())
            .fold(None, |bounds: Option<PlotRange>, z| {
                let point = PlotRange::new(z, z);
                Some(bounds.map_or(point, |bounds| bounds.expanded(point)))
            });
    }

    fn cell_offset(&self, key_index: usize, value_index: usize) -> Option<usize> {
        (key_index < self.key_size && value_index < self.value_size)
            .then(|| value_index * self.key_size + key_index)
    }
}

fn validate_cell_range(range: PlotRange, size: usize, dimension: &str) -> PlotResult<()> {
    if !range.is_finite() || (size > 1 && range.lower == range.upper) {
        return Err(PlotError::InvalidData(format!(
            "color map {dimension} range must be finite and non-empty"
        )));
    }
    Ok(())
}

fn half_cell(range: PlotRange, size: usize) -> f64 {
    if size > 1 {
        0.5 * range.size().abs() / (size - 1) as f64
    } else {
        0.5 * range.size().abs()
    }
}

fn index_to_coord(index: usize, range: PlotRange, size: usize) -> f64 {
    if size > 1 {
        range.lower + index as f64 / (size - 1) as f64 * range.size()
    } else {
        range.center()
    }
}

fn cell_extent(range: PlotRange, size: usize) -> PlotRange {
    let half = half_cell(range, size);
    let first = index_to_coord(0, range, size);
    let last = index_to_coord(size - 1, range, size);
    PlotRange::new(first.min(last) - half, first.max(last) + half)
}

fn coord_to_index(coord: f64, range: PlotRange, size: usize) -> Option<usize> {
    if !coord.is_finite() || !cell_extent(range, size).contains(coord) {
        return None;
    }
    if size == 1 {
        return Some(0);
    }
    let position = ((coord - range.lower) / range.size() * (size - 1) as f64 + 0.5).floor();
    // the far edge of the last cell rounds one past it
    Some((position.max(0.0) as usize).min(size - 1))
}

/// Screen arrangement the cached image was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ImageLayout {
    key_horizontal: bool,
    key_ascending: bool,
    value_ascending: bool,
}

impl ImageLayout {
    fn for_axes(axes: &PlotAxes<'_>) -> Self {
        Self {
            key_horizontal: axes.key_is_horizontal(),
            key_ascending: grows_toward_higher_pixels(axes.key_axis()),
            value_ascending: grows_toward_higher_pixels(axes.value_axis()),
        }
    }
}

fn grows_toward_higher_pixels(axis: &dyn CoordinateMapper) -> bool {
    match axis.orientation() {
        AxisOrientation::Horizontal => !axis.range_reversed(),
        AxisOrientation::Vertical => axis.range_reversed(),
    }
}

#[derive(Debug)]
struct ColorScaleBinding {
    scale: Weak<RefCell<ColorScale>>,
    id: ConsumerId,
}

/// Raster plottable coloring a [`ColorMapData`] grid through a gradient.
///
/// When bound to a [`ColorScale`], data range, scale type and gradient stay
/// in sync with the scale and every other map bound to it.
#[derive(Debug)]
pub struct ColorMap {
    name: String,
    style: PlottableStyle,
    data: ColorMapData,
    data_range: PlotRange,
    data_scale_type: ScaleType,
    gradient: ColorGradient,
    image: RefCell<Option<RgbaImage>>,
    image_dirty: Cell<bool>,
    image_layout: Cell<Option<ImageLayout>>,
    image_generation: Cell<u64>,
    binding: Option<ColorScaleBinding>,
}

impl ColorMap {
    #[must_use]
    pub fn new(name: impl Into<String>, data: ColorMapData) -> Self {
        Self {
            name: name.into(),
            style: PlottableStyle::default(),
            data,
            data_range: PlotRange::new(0.0, 1.0),
            data_scale_type: ScaleType::Linear,
            gradient: ColorGradient::default(),
            image: RefCell::new(None),
            image_dirty: Cell::new(true),
            image_layout: Cell::new(None),
            image_generation: Cell::new(0),
            binding: None,
        }
    }

    pub fn with_config(name: impl Into<String>, data: ColorMapData, config: &PlotConfig) -> PlotResult<Self> {
        config.validate()?;
        let mut map = Self::new(name, data);
        map.style = map.style.with_antialiasing(config.antialiased);
        map.gradient.set_level_count(config.gradient_level_count)?;
        Ok(map)
    }

    #[must_use]
    pub fn into_shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn data(&self) -> &ColorMapData {
        &self.data
    }

    /// Mutable grid access; the cached image is rebuilt on the next draw.
    pub fn data_mut(&mut self) -> &mut ColorMapData {
        self.invalidate_image();
        &mut self.data
    }

    pub fn set_data(&mut self, data: ColorMapData) {
        debug!(
            color_map = %self.name,
            key_size = data.key_size(),
            value_size = data.value_size(),
            "color map data replaced"
        );
        self.data = data;
        self.invalidate_image();
    }

    #[must_use]
    pub fn data_range(&self) -> PlotRange {
        self.data_range
    }

    /// Returns `true` when the range changed; a bound color scale follows.
    pub fn set_data_range(&mut self, range: PlotRange) -> bool {
        if !self.apply_data_range(range) {
            return false;
        }
        let range = self.data_range;
        self.push_to_scale(|scale, id| {
            scale.set_data_range_from(Some(id), range);
        });
        true
    }

    #[must_use]
    pub fn data_scale_type(&self) -> ScaleType {
        self.data_scale_type
    }

    pub fn set_data_scale_type(&mut self, scale_type: ScaleType) -> bool {
        if !self.apply_data_scale_type(scale_type) {
            return false;
        }
        self.push_to_scale(|scale, id| {
            scale.set_data_scale_type_from(Some(id), scale_type);
        });
        let range = self.data_range;
        self.push_to_scale(|scale, id| {
            scale.set_data_range_from(Some(id), range);
        });
        true
    }

    #[must_use]
    pub fn gradient(&self) -> &ColorGradient {
        &self.gradient
    }

    pub fn set_gradient(&mut self, gradient: ColorGradient) -> bool {
        if !self.apply_gradient(&gradient) {
            return false;
        }
        self.push_to_scale(|scale, id| {
            scale.set_gradient_from(Some(id), gradient);
        });
        true
    }

    /// Fits the data range to the grid's data bounds.
    ///
    /// With `recalculate_bounds` the bounds are recomputed from the cells
    /// first. A flat grid gets a unit-wide range around its value.
    pub fn rescale_data_range(&mut self, recalculate_bounds: bool) -> bool {
        if recalculate_bounds {
            self.data.recalculate_data_bounds();
        }
        let Some(bounds) = self.data.data_bounds() else {
            return false;
        };
        let range = if bounds.lower < bounds.upper {
            bounds
        } else {
            PlotRange::new(bounds.lower - 0.5, bounds.upper + 0.5)
        };
        self.set_data_range(range)
    }

    /// Subscribes `map` to `scale` and adopts the scale's gradient, scale type and range.
    ///
    /// Any previous binding is released first.
    pub fn bind_color_scale(map: &Rc<RefCell<Self>>, scale: &Rc<RefCell<ColorScale>>) -> PlotResult<()> {
        map.try_borrow_mut()
            .map_err(|_| PlotError::InvalidData("color map is borrowed".to_owned()))?
            .unbind_color_scale();

        let consumer: Rc<RefCell<dyn ColorScaleConsumer>> = Rc::<RefCell<ColorMap>>::clone(map);
        let mut scale_ref = scale
            .try_borrow_mut()
            .map_err(|_| PlotError::InvalidData("color scale is borrowed".to_owned()))?;
        let id = scale_ref.subscribe(Rc::downgrade(&consumer));

        let mut map_ref = map
            .try_borrow_mut()
            .map_err(|_| PlotError::InvalidData("color map is borrowed".to_owned()))?;
        map_ref.apply_gradient(scale_ref.gradient());
        map_ref.apply_data_scale_type(scale_ref.data_scale_type());
        map_ref.apply_data_range(scale_ref.data_range());
        map_ref.binding = Some(ColorScaleBinding {
            scale: Rc::downgrade(scale),
            id,
        });
        debug!(color_map = %map_ref.name, "color map bound to color scale");
        Ok(())
    }

    /// Releases the color scale binding; returns `false` when there was none.
    pub fn unbind_color_scale(&mut self) -> bool {
        let Some(binding) = self.binding.take() else {
            return false;
        };
        if let Some(scale) = binding.scale.upgrade() {
            match scale.try_borrow_mut() {
                Ok(mut scale) => {
                    scale.unsubscribe(binding.id);
                }
                Err(_) => warn!(color_map = %self.name, "color scale busy, leaving stale subscription"),
            }
        }
        true
    }

    /// The bound color scale, if set and still alive.
    #[must_use]
    pub fn color_scale(&self) -> Option<Rc<RefCell<ColorScale>>> {
        self.binding.as_ref().and_then(|binding| binding.scale.upgrade())
    }

    /// Number of times the cached image has been rebuilt.
    #[must_use]
    pub fn image_generation(&self) -> u64 {
        self.image_generation.get()
    }

    #[must_use]
    pub fn is_image_dirty(&self) -> bool {
        self.image_dirty.get()
    }

    /// Pixel rect covering all cells, half a cell past the outer centers.
    #[must_use]
    pub fn image_rect(&self, axes: &PlotAxes<'_>) -> PixelRect {
        let key = self.data.key_extent();
        let value = self.data.value_extent();
        PixelRect::from_corners(
            axes.coords_to_pixels(key.lower, value.lower),
            axes.coords_to_pixels(key.upper, value.upper),
        )
    }

    fn apply_data_range(&mut self, range: PlotRange) -> bool {
        let Some(range) = sanitize_data_range(range, self.data_scale_type) else {
            return false;
        };
        if range == self.data_range {
            return false;
        }
        self.data_range = range;
        self.invalidate_image();
        debug!(color_map = %self.name, lower = range.lower, upper = range.upper, "color map data range changed");
        true
    }

    fn apply_data_scale_type(&mut self, scale_type: ScaleType) -> bool {
        if scale_type == self.data_scale_type {
            return false;
        }
        self.data_scale_type = scale_type;
        if scale_type == ScaleType::Logarithmic {
            self.data_range = self.data_range.sanitized_for_log_scale();
        }
        self.invalidate_image();
        debug!(color_map = %self.name, ?scale_type, "color map data scale type changed");
        true
    }

    fn apply_gradient(&mut self, gradient: &ColorGradient) -> bool {
        if *gradient == self.gradient {
            return false;
        }
        self.gradient = gradient.clone();
        self.invalidate_image();
        true
    }

    fn invalidate_image(&self) {
        self.image_dirty.set(true);
    }

    fn push_to_scale(&self, apply: impl FnOnce(&mut ColorScale, ConsumerId)) {
        let Some(binding) = &self.binding else {
            return;
        };
        let Some(scale) = binding.scale.upgrade() else {
            debug!(color_map = %self.name, "bound color scale dropped");
            return;
        };
        let Ok(mut scale) = scale.try_borrow_mut() else {
            debug!(color_map = %self.name, "color scale busy, skipping update");
            return;
        };
        apply(&mut scale, binding.id);
    }

    fn refresh_image(&self, layout: ImageLayout) {
        if !self.image_dirty.get() && self.image_layout.get() == Some(layout) {
            return;
        }
        let key_size = self.data.key_size();
        let value_size = self.data.value_size();
        let mut colors = vec![Color::TRANSPARENT.to_rgba8(); self.data.cells().len()];
        self.gradient.colorize(
            self.data.cells(),
            self.data_range,
            self.data_scale_type == ScaleType::Logarithmic,
            &mut colors,
        );

        let cell_color = |key_index: usize, value_index: usize| -> Rgba<u8> {
            colors[value_index * key_size + key_index]
        };
        let pick = |pixel: u32, size: usize, ascending: bool| -> usize {
            if ascending {
                pixel as usize
            } else {
                size - 1 - pixel as usize
            }
        };
        let image = if layout.key_horizontal {
            RgbaImage::from_fn(key_size as u32, value_size as u32, |x, y| {
                cell_color(
                    pick(x, key_size, layout.key_ascending),
                    pick(y, value_size, layout.value_ascending),
                )
            })
        } else {
            RgbaImage::from_fn(value_size as u32, key_size as u32, |x, y| {
                cell_color(
                    pick(y, key_size, layout.key_ascending),
                    pick(x, value_size, layout.value_ascending),
                )
            })
        };

        *self.image.borrow_mut() = Some(image);
        self.image_dirty.set(false);
        self.image_layout.set(Some(layout));
        self.image_generation.set(self.image_generation.get() + 1);
        trace!(
            color_map = %self.name,
            generation = self.image_generation.get(),
            key_size,
            value_size,
            "color map image rebuilt"
        );
    }
}

impl ColorScaleConsumer for ColorMap {
    fn color_scale_data_range_changed(&mut self, range: PlotRange) {
        self.apply_data_range(range);
    }

    fn color_scale_data_scale_type_changed(&mut self, scale_type: ScaleType) {
        self.apply_data_scale_type(scale_type);
    }

    fn color_scale_gradient_changed(&mut self, gradient: &ColorGradient) {
        self.apply_gradient(gradient);
    }

    fn data_bounds(&self) -> Option<PlotRange> {
        self.data.data_bounds()
    }
}

impl Plottable for ColorMap {
    fn name(&self) -> &str {
        &self.name
    }

    fn style(&self) -> &PlottableStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut PlottableStyle {
        &mut self.style
    }

    fn draw(&self, axes: &PlotAxes<'_>, painter: &mut dyn Painter) -> PlotResult<()> {
        if !self.style.visible {
            return Ok(());
        }
        let target = self.image_rect(axes);
        if target.is_empty() || !target.x.is_finite() || !target.y.is_finite() {
            trace!(color_map = %self.name, "color map covers no pixels");
            return Ok(());
        }

        self.refresh_image(ImageLayout::for_axes(axes));
        let image = self.image.borrow();
        let Some(image) = image.as_ref() else {
            return Ok(());
        };
        painter.set_antialiasing(self.style.antialiased);
        painter.draw_image(target, image)
    }

    fn select_test(
        &self,
        pos: PixelPoint,
        only_selectable: bool,
        axes: &PlotAxes<'_>,
    ) -> Option<SelectTestResult> {
        if !self.style.accepts_select_query(pos, only_selectable, axes) {
            return None;
        }
        let (key, value) = axes.pixels_to_coords(pos);
        let (key_index, value_index) = self.data.coord_to_cell(key, value)?;
        Some(SelectTestResult::new(
            0.0,
            value_index * self.data.key_size() + key_index,
        ))
    }

    fn key_range(&self, sign_domain: SignDomain) -> Option<PlotRange> {
        restrict_to_sign_domain(self.data.key_extent(), sign_domain)
    }

    fn value_range(
        &self,
        sign_domain: SignDomain,
        _in_key_range: Option<PlotRange>,
    ) -> Option<PlotRange> {
        restrict_to_sign_domain(self.data.value_extent(), sign_domain)
    }
}

/// Clips `range` to one sign, pulling a crossing bound to `1e-3` of the other.
fn restrict_to_sign_domain(range: PlotRange, sign_domain: SignDomain) -> Option<PlotRange> {
    let range = range.normalized();
    match sign_domain {
        SignDomain::Both => Some(range),
        SignDomain::Positive => {
            if range.upper <= 0.0 {
                None
            } else if range.lower <= 0.0 {
                Some(PlotRange::new(range.upper * 1e-3, range.upper))
            } else {
                Some(range)
            }
        }
        SignDomain::Negative => {
            if range.lower >= 0.0 {
                None
            } else if range.upper >= 0.0 {
                Some(PlotRange::new(range.lower, range.lower * 1e-3))
            } else {
                Some(range)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_to_cell_rounds_to_nearest_center() {
        let data = ColorMapData::new(5, 3, PlotRange::new(0.0, 4.0), PlotRange::new(0.0, 2.0))
            .expect("grid");
        assert_eq!(data.coord_to_cell(1.4, 0.6), Some((1, 1)));
        assert_eq!(data.coord_to_cell(1.6, 0.4), Some((2, 0)));
        assert_eq!(data.coord_to_cell(4.5, 2.5), Some((4, 2)));
        assert_eq!(data.coord_to_cell(4.6, 1.0), None);
        assert_eq!(data.coord_to_cell(-0.6, 1.0), None);
    }

    #[test]
    fn single_cell_dimension_covers_whole_range() {
        let data = ColorMapData::new(1, 2, PlotRange::new(10.0, 20.0), PlotRange::new(0.0, 1.0))
            .expect("grid");
        assert_eq!(data.key_extent(), PlotRange::new(10.0, 20.0));
        assert_eq!(data.cell_to_coord(0, 1), (15.0, 1.0));
        assert_eq!(data.coord_to_cell(19.0, 0.2), Some((0, 0)));
    }

    #[test]
    fn positive_sign_domain_pulls_lower_bound_above_zero() {
        let range = restrict_to_sign_domain(PlotRange::new(-2.0, 8.0), SignDomain::Positive)
            .expect("range");
        assert!((range.lower - 0.008).abs() <= 1e-12);
        assert_eq!(range.upper, 8.0);
        assert!(restrict_to_sign_domain(PlotRange::new(-2.0, 0.0), SignDomain::Positive).is_none());
    }
}
