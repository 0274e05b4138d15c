use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::core::bars_geometry::{
    bar_pixel_offsets, bar_rect, group_key_offset, group_spacing_px, stack_layer_extreme,
};
use crate::core::financial_geometry::visible_key_range_for_bars;
use crate::core::{
    DataContainer, GraphData, PixelPoint, PixelRect, PlotAxes, PlotRange, SharedDataContainer,
    SignDomain, WidthType,
};
use crate::error::{PlotError, PlotResult};
use crate::interaction::{SelectTestResult, closest, rect_distance};
use crate::render::{Brush, Color, Painter, Pen};

use super::graph::zip_points;
use super::{PlotConfig, Plottable, PlottableStyle};

pub type SharedBars = Rc<RefCell<Bars>>;
pub type SharedBarsGroup = Rc<RefCell<BarsGroup>>;

const DEFAULT_GROUP_SPACING_PX: f64 = 4.0;

/// Bar stacks drawn side by side at every key instead of on top of each other.
///
/// A group holds its members weakly; dropped bars leave the group on their own.
/// Stacks are identified by their bottom bar, so adding any bar of a stack
/// places the whole stack.
#[derive(Debug)]
pub struct BarsGroup {
    spacing_type: WidthType,
    spacing: f64,
    members: Vec<Weak<RefCell<Bars>>>,
}

impl Default for BarsGroup {
    fn default() -> Self {
        Self {
            spacing_type: WidthType::Absolute,
            spacing: DEFAULT_GROUP_SPACING_PX,
            members: Vec::new(),
        }
    }
}

impl BarsGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn into_shared(self) -> SharedBarsGroup {
        Rc::new(RefCell::new(self))
    }

    #[must_use]
    pub fn spacing_type(&self) -> WidthType {
        self.spacing_type
    }

    pub fn set_spacing_type(&mut self, spacing_type: WidthType) {
        self.spacing_type = spacing_type;
    }

    #[must_use]
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Gap between neighbouring stacks, in units of [`spacing_type`](Self::spacing_type).
    pub fn set_spacing(&mut self, spacing: f64) -> PlotResult<()> {
        if !spacing.is_finite() || spacing < 0.0 {
            return Err(PlotError::InvalidData(
                "bars group spacing must be finite and >= 0".to_owned(),
            ));
        }
        self.spacing = spacing;
        Ok(())
    }

    /// Live members in group order.
    #[must_use]
    pub fn bars(&self) -> Vec<SharedBars> {
        self.members.iter().filter_map(Weak::upgrade).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members
            .iter()
            .filter(|member| member.strong_count() > 0)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn contains(&self, bars: &SharedBars) -> bool {
        self.position(bars).is_some()
    }

    fn position(&self, bars: &SharedBars) -> Option<usize> {
        self.members
            .iter()
            .position(|member| std::ptr::eq(member.as_ptr(), Rc::as_ptr(bars)))
    }

    /// Adds `bars` at the end, taking it out of any other group.
    pub fn append(group: &SharedBarsGroup, bars: &SharedBars) {
        if group.borrow().contains(bars) {
            warn!("bars already in this group");
            return;
        }
        Bars::set_bars_group(bars, Some(group));
    }

    /// Adds or moves `bars` to `index`, clamped to the group size.
    pub fn insert(group: &SharedBarsGroup, index: usize, bars: &SharedBars) {
        if !group.borrow().contains(bars) {
            Bars::set_bars_group(bars, Some(group));
        }
        let mut group = group.borrow_mut();
        if let Some(current) = group.position(bars) {
            let member = group.members.remove(current);
            let index = index.min(group.members.len());
            group.members.insert(index, member);
        }
    }

    pub fn remove(group: &SharedBarsGroup, bars: &SharedBars) {
        if group.borrow().contains(bars) {
            Bars::set_bars_group(bars, None);
        } else {
            warn!("bars not in this group");
        }
    }

    /// Removes every member.
    pub fn clear(group: &SharedBarsGroup) {
        let members = std::mem::take(&mut group.borrow_mut().members);
        for bars in members.iter().filter_map(Weak::upgrade) {
            match bars.try_borrow_mut() {
                Ok(mut bars) => bars.group = None,
                Err(_) => warn!("bars busy while clearing its group"),
            }
        }
    }

    fn register(&mut self, bars: &SharedBars) {
        self.members.retain(|member| member.strong_count() > 0);
        if !self.contains(bars) {
            self.members.push(Rc::downgrade(bars));
        }
    }

    fn unregister(&mut self, bars: &SharedBars) {
        self.members.retain(|member| {
            member.strong_count() > 0 && !std::ptr::eq(member.as_ptr(), Rc::as_ptr(bars))
        });
    }
}

/// Bar chart series.
///
/// Bars grow from [`base_value`](Self::base_value), or from the top of the
/// bar below when stacked with [`move_below`](Self::move_below) /
/// [`move_above`](Self::move_above). Positive and negative values stack
/// separately.
#[derive(Debug)]
pub struct Bars {
    name: String,
    style: PlottableStyle,
    width: f64,
    width_type: WidthType,
    base_value: f64,
    data: SharedDataContainer<GraphData>,
    group: Option<Weak<RefCell<BarsGroup>>>,
    below: Option<Weak<RefCell<Bars>>>,
    above: Option<Weak<RefCell<Bars>>>,
}

impl Bars {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, &PlotConfig::default())
    }

    #[must_use]
    pub fn with_config(name: impl Into<String>, config: &PlotConfig) -> Self {
        let mut style = PlottableStyle::default().with_antialiasing(config.antialiased);
        style.pen = Pen::new(Color::rgb8(40, 50, 255), 1.0);
        style.brush = Brush::solid(Color::rgba(40.0 / 255.0, 50.0 / 255.0, 1.0, 0.2));
        style.selected_brush = Brush::solid(Color::rgba(80.0 / 255.0, 80.0 / 255.0, 1.0, 0.4));
        Self {
            name: name.into(),
            style,
            width: config.bars_width,
            width_type: config.bars_width_type,
            base_value: 0.0,
            data: DataContainer::new().into_shared(),
            group: None,
            below: None,
            above: None,
        }
    }

    #[must_use]
    pub fn into_shared(self) -> SharedBars {
        Rc::new(RefCell::new(self))
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Bar width, interpreted according to [`WidthType`].
    pub fn set_width(&mut self, width: f64) -> PlotResult<()> {
        if !width.is_finite() || width < 0.0 {
            return Err(PlotError::InvalidData(
                "bars width must be finite and >= 0".to_owned(),
            ));
        }
        self.width = width;
        Ok(())
    }

    #[must_use]
    pub fn width_type(&self) -> WidthType {
        self.width_type
    }

    pub fn set_width_type(&mut self, width_type: WidthType) {
        self.width_type = width_type;
    }

    #[must_use]
    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    /// Value the bars grow from. Ignored for bars stacked on another bar.
    pub fn set_base_value(&mut self, base_value: f64) -> PlotResult<()> {
        if !base_value.is_finite() {
            return Err(PlotError::InvalidData(
                "bars base value must be finite".to_owned(),
            ));
        }
        self.base_value = base_value;
        Ok(())
    }

    #[must_use]
    pub fn data(&self) -> SharedDataContainer<GraphData> {
        Rc::clone(&self.data)
    }

    pub fn set_data_container(&mut self, data: SharedDataContainer<GraphData>) {
        debug!(bars = %self.name, count = data.borrow().len(), "bars data container replaced");
        self.data = data;
    }

    /// Replaces the data with `keys`/`values`, truncating to the shorter slice.
    pub fn set_data(&mut self, keys: &[f64], values: &[f64], already_sorted: bool) {
        let points = zip_points(keys, values);
        debug!(bars = %self.name, count = points.len(), already_sorted, "bars set data");
        self.data.borrow_mut().set(points, already_sorted);
    }

    pub fn add_data(&mut self, keys: &[f64], values: &[f64], already_sorted: bool) {
        let points = zip_points(keys, values);
        debug!(bars = %self.name, count = points.len(), already_sorted, "bars add data");
        self.data.borrow_mut().add_bulk(points, already_sorted);
    }

    pub fn add_point(&mut self, key: f64, value: f64) {
        let mut data = self.data.borrow_mut();
        data.add(GraphData::new(key, value));
        trace!(bars = %self.name, count = data.len(), "bars add point");
    }

    #[must_use]
    pub fn bar_below(&self) -> Option<SharedBars> {
        self.below.as_ref().and_then(Weak::upgrade)
    }

    #[must_use]
    pub fn bar_above(&self) -> Option<SharedBars> {
        self.above.as_ref().and_then(Weak::upgrade)
    }

    #[must_use]
    pub fn bars_group(&self) -> Option<SharedBarsGroup> {
        self.group.as_ref().and_then(Weak::upgrade)
    }

    /// Moves `this` into `group`, or out of its group with `None`.
    pub fn set_bars_group(this: &SharedBars, group: Option<&SharedBarsGroup>) {
        let previous = this.borrow_mut().group.take();
        if let Some(previous) = previous.as_ref().and_then(Weak::upgrade) {
            previous.borrow_mut().unregister(this);
        }
        if let Some(group) = group {
            group.borrow_mut().register(this);
            this.borrow_mut().group = Some(Rc::downgrade(group));
        }
        debug!(bars = %this.borrow().name, grouped = group.is_some(), "bars group changed");
    }

    /// Takes `this` out of its current stack and places it directly below
    /// `target`; `None` only unstacks it.
    pub fn move_below(this: &SharedBars, target: Option<&SharedBars>) {
        if target.is_some_and(|target| Rc::ptr_eq(target, this)) {
            return;
        }
        Self::unstack(this);
        if let Some(target) = target {
            let target_below = target.borrow().bar_below();
            if let Some(target_below) = target_below {
                connect(Some(&target_below), Some(this));
            }
            connect(Some(this), Some(target));
        }
    }

    /// Takes `this` out of its current stack and places it directly on top of
    /// `target`; `None` only unstacks it.
    pub fn move_above(this: &SharedBars, target: Option<&SharedBars>) {
        if target.is_some_and(|target| Rc::ptr_eq(target, this)) {
            return;
        }
        Self::unstack(this);
        if let Some(target) = target {
            let target_above = target.borrow().bar_above();
            if let Some(target_above) = target_above {
                connect(Some(this), Some(&target_above));
            }
            connect(Some(target), Some(this));
        }
    }

    fn unstack(this: &SharedBars) {
        let (below, above) = {
            let bars = this.borrow();
            (bars.bar_below(), bars.bar_above())
        };
        connect(below.as_ref(), above.as_ref());
    }

    fn below_is(&self, bars: &SharedBars) -> bool {
        self.below
            .as_ref()
            .is_some_and(|below| std::ptr::eq(below.as_ptr(), Rc::as_ptr(bars)))
    }

    fn above_is(&self, bars: &SharedBars) -> bool {
        self.above
            .as_ref()
            .is_some_and(|above| std::ptr::eq(above.as_ptr(), Rc::as_ptr(bars)))
    }

    /// Value a bar at `key` starts from: the base value, or the summed
    /// extremes of the bars below on the same side of zero.
    #[must_use]
    pub fn stacked_base_value(&self, key: f64, positive: bool) -> f64 {
        let Some(below) = self.bar_below() else {
            return self.base_value;
        };
        let Ok(below) = below.try_borrow() else {
            warn!(bars = %self.name, "bar below is busy, stacking on the base value");
            return self.base_value;
        };
        let layer = below
            .data
            .try_borrow()
            .map(|data| stack_layer_extreme(&data, key, positive))
            .unwrap_or(0.0);
        layer + below.stacked_base_value(key, positive)
    }

    fn pixel_offsets(&self, key: f64, axes: &PlotAxes<'_>) -> (f64, f64) {
        bar_pixel_offsets(key, self.width, self.width_type, axes)
    }

    fn stack_base(&self) -> *const Bars {
        match self.bar_below() {
            Some(below) => stack_base_of(&below).as_ptr().cast_const(),
            None => std::ptr::from_ref(self),
        }
    }

    /// Key-pixel shift applied by the bars group at `key`.
    #[must_use]
    pub fn group_offset(&self, key: f64, axes: &PlotAxes<'_>) -> f64 {
        let Some(group) = self.bars_group() else {
            return 0.0;
        };
        let Ok(group) = group.try_borrow() else {
            return 0.0;
        };

        let mut bases: Vec<SharedBars> = Vec::new();
        for member in group.bars() {
            let base = stack_base_of(&member);
            if !bases.iter().any(|known| Rc::ptr_eq(known, &base)) {
                bases.push(base);
            }
        }
        let this_base = self.stack_base();
        let Some(index) = bases
            .iter()
            .position(|base| std::ptr::eq(base.as_ptr(), this_base))
        else {
            return 0.0;
        };

        let widths: Vec<f64> = bases
            .iter()
            .map(|base| {
                base.try_borrow()
                    .map(|base| {
                        let (lower, upper) = base.pixel_offsets(key, axes);
                        (upper - lower).abs()
                    })
                    .unwrap_or(0.0)
            })
            .collect();
        let spacing = group_spacing_px(key, group.spacing, group.spacing_type, axes);
        group_key_offset(&widths, spacing, index, axes.key_pixel_direction())
    }

    /// Screen rects of the visible bars with their container indices.
    #[must_use]
    pub fn bar_rects(&self, axes: &PlotAxes<'_>) -> Vec<(usize, PixelRect)> {
        let Ok(data) = self.data.try_borrow() else {
            return Vec::new();
        };
        let key_range = visible_key_range_for_bars(self.width, self.width_type, axes);
        let range = data.visible_range(key_range.lower, key_range.upper);
        let offset = range.start;
        data.as_slice()[range]
            .iter()
            .enumerate()
            .filter(|(_, point)| point.key.is_finite() && point.value.is_finite())
            .filter_map(|(index, point)| {
                let base = self.stacked_base_value(point.key, point.value >= 0.0);
                let key_pixel = axes.pixel_for_key(point.key) + self.group_offset(point.key, axes);
                let rect = bar_rect(key_pixel, self.pixel_offsets(point.key, axes), base, point.value, axes);
                let finite = [rect.x, rect.y, rect.width, rect.height]
                    .iter()
                    .all(|value| value.is_finite());
                finite.then_some((offset + index, rect))
            })
            .collect()
    }
}

impl Drop for Bars {
    fn drop(&mut self) {
        let below = self.bar_below();
        let above = self.bar_above();
        if below.is_some() || above.is_some() {
            connect(below.as_ref(), above.as_ref());
        }
    }
}

impl Plottable for Bars {
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
        if self.data.try_borrow().is_err() {
            warn!(bars = %self.name, "bars data is mutably borrowed, skipping draw");
            return Ok(());
        }
        let rects = self.bar_rects(axes);
        if rects.is_empty() {
            return Ok(());
        }

        let pen = self.style.active_pen();
        let outline = pen.is_visible().then_some(pen);
        let brush = self.style.active_brush();
        painter.set_antialiasing(self.style.antialiased_fill);
        for (_, rect) in &rects {
            painter.draw_rect(*rect, outline, brush)?;
        }

        trace!(
            bars = %self.name,
            drawn = rects.len(),
            stacked = self.below.is_some(),
            "bars drawn"
        );
        Ok(())
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
        closest(
            self.bar_rects(axes)
                .into_iter()
                .map(|(index, rect)| SelectTestResult::new(rect_distance(pos, rect, true), index)),
        )
    }

    fn key_range(&self, sign_domain: SignDomain) -> Option<PlotRange> {
        let range = self.data.try_borrow().ok()?.key_range(sign_domain)?;
        if self.width_type != WidthType::PlotCoords {
            return Some(range);
        }
        let half = self.width * 0.5;
        let widened = PlotRange::new(range.lower - half, range.upper + half);
        Some(PlotRange::new(
            if sign_domain.admits(widened.lower) { widened.lower } else { range.lower },
            if sign_domain.admits(widened.upper) { widened.upper } else { range.upper },
        ))
    }

    /// Span of the stacked bar tops, always including the base value.
    fn value_range(
        &self,
        sign_domain: SignDomain,
        in_key_range: Option<PlotRange>,
    ) -> Option<PlotRange> {
        let data = self.data.try_borrow().ok()?;
        let points = match in_key_range {
            Some(range) => &data.as_slice()[data.find_range(range.lower, range.upper)],
            None => data.as_slice(),
        };

        let mut range = PlotRange::new(self.base_value, self.base_value);
        for point in points {
            let top = point.value + self.stacked_base_value(point.key, point.value >= 0.0);
            if top.is_nan() || !sign_domain.admits(top) {
                continue;
            }
            range.lower = range.lower.min(top);
            range.upper = range.upper.max(top);
        }
        Some(range)
    }
}

/// Bottom bar of the stack containing `bars`.
fn stack_base_of(bars: &SharedBars) -> SharedBars {
    let mut current = Rc::clone(bars);
    loop {
        let below = current.try_borrow().ok().and_then(|bars| bars.bar_below());
        match below {
            Some(below) => current = below,
            None => return current,
        }
    }
}

/// Links `lower` directly under `upper`, detaching their previous
/// neighbours on the linked side. Either side may be `None` to cut a link.
fn connect(lower: Option<&SharedBars>, upper: Option<&SharedBars>) {
    if let Some(lower) = lower {
        let old_above = lower.try_borrow().ok().and_then(|bars| bars.bar_above());
        if let Some(old_above) = old_above {
            if let Ok(mut old_above) = old_above.try_borrow_mut() {
                if old_above.below_is(lower) {
                    old_above.below = None;
                }
            }
        }
    }
    if let Some(upper) = upper {
        let old_below = upper.try_borrow().ok().and_then(|bars| bars.bar_below());
        if let Some(old_below) = old_below {
            if let Ok(mut old_below) = old_below.try_borrow_mut() {
                if old_below.above_is(upper) {
                    old_below.above = None;
                }
            }
        }
    }

    if let Some(lower) = lower {
        match lower.try_borrow_mut() {
            Ok(mut bars) => bars.above = upper.map(Rc::downgrade),
            Err(_) => warn!("bars busy while restacking"),
        }
    }
    if let Some(upper) = upper {
        match upper.try_borrow_mut() {
            Ok(mut bars) => bars.below = lower.map(Rc::downgrade),
            Err(_) => warn!("bars busy while restacking"),
        }
    }
}
