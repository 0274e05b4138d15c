use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::core::line_geometry::{baseline_fill_polygon, channel_fill_polygon, finite_runs};
use crate::core::{
    DataContainer, GraphData, LineGeometry, LineStyle, PixelPoint, PlotAxes, PlotRange,
    SharedDataContainer, SignDomain, build_line_geometry, sample_visible,
};
use crate::error::PlotResult;
use crate::interaction::{SelectTestResult, closest, point_distance, polyline_distance, segment_distance};
use crate::render::Painter;

use super::{PlotConfig, Plottable, PlottableStyle, ScatterStyle};

/// Key/value series drawn as a line, steps, impulses and/or scatter markers.
#[derive(Debug)]
pub struct Graph {
    name: String,
    style: PlottableStyle,
    line_style: LineStyle,
    scatter_style: ScatterStyle,
    adaptive_sampling: bool,
    adaptive_sampling_scatter: bool,
    data: SharedDataContainer<GraphData>,
    channel_fill: Option<Weak<RefCell<Graph>>>,
}

impl Graph {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, &PlotConfig::default())
    }

    #[must_use]
    pub fn with_config(name: impl Into<String>, config: &PlotConfig) -> Self {
        Self {
            name: name.into(),
            style: PlottableStyle::default().with_antialiasing(config.antialiased),
            line_style: LineStyle::Line,
            scatter_style: ScatterStyle::default(),
            adaptive_sampling: config.adaptive_sampling,
            adaptive_sampling_scatter: config.adaptive_sampling_scatter,
            data: DataContainer::new().into_shared(),
            channel_fill: None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn line_style(&self) -> LineStyle {
        self.line_style
    }

    pub fn set_line_style(&mut self, line_style: LineStyle) {
        self.line_style = line_style;
    }

    #[must_use]
    pub fn scatter_style(&self) -> ScatterStyle {
        self.scatter_style
    }

    pub fn set_scatter_style(&mut self, scatter_style: ScatterStyle) {
        self.scatter_style = scatter_style;
    }

    #[must_use]
    pub fn adaptive_sampling(&self) -> bool {
        self.adaptive_sampling
    }

    pub fn set_adaptive_sampling(&mut self, enabled: bool) {
        self.adaptive_sampling = enabled;
    }

    #[must_use]
    pub fn adaptive_sampling_scatter(&self) -> bool {
        self.adaptive_sampling_scatter
    }

    /// Also samples scatter markers and impulses when adaptive sampling is on.
    pub fn set_adaptive_sampling_scatter(&mut self, enabled: bool) {
        self.adaptive_sampling_scatter = enabled;
    }

    /// Shared handle to the data container.
    #[must_use]
    pub fn data(&self) -> SharedDataContainer<GraphData> {
        Rc::clone(&self.data)
    }

    /// Shares `data` with this graph; other holders see every later mutation.
    pub fn set_data_container(&mut self, data: SharedDataContainer<GraphData>) {
        debug!(graph = %self.name, count = data.borrow().len(), "graph data container replaced");
        self.data = data;
    }

    /// Replaces the data with `keys`/`values`, truncating to the shorter slice.
    pub fn set_data(&mut self, keys: &[f64], values: &[f64], already_sorted: bool) {
        let points = zip_points(keys, values);
        debug!(graph = %self.name, count = points.len(), already_sorted, "graph set data");
        self.data.borrow_mut().set(points, already_sorted);
    }

    /// Merges `keys`/`values` into the existing data.
    pub fn add_data(&mut self, keys: &[f64], values: &[f64], already_sorted: bool) {
        let points = zip_points(keys, values);
        debug!(graph = %self.name, count = points.len(), already_sorted, "graph add data");
        self.data.borrow_mut().add_bulk(points, already_sorted);
    }

    pub fn add_point(&mut self, key: f64, value: f64) {
        let mut data = self.data.borrow_mut();
        data.add(GraphData::new(key, value));
        trace!(graph = %self.name, count = data.len(), "graph add point");
    }

    /// Companion graph the fill closes against, if set and still alive.
    #[must_use]
    pub fn channel_fill_graph(&self) -> Option<Rc<RefCell<Graph>>> {
        self.channel_fill.as_ref().and_then(Weak::upgrade)
    }

    /// Fills towards `companion` instead of the value baseline.
    ///
    /// A graph cannot be its own companion; such a request clears the link.
    pub fn set_channel_fill_graph(&mut self, companion: Weak<RefCell<Graph>>) {
        if let Some(target) = companion.upgrade() {
            if std::ptr::eq(target.as_ptr(), self) {
                warn!(graph = %self.name, "graph cannot fill towards itself");
                self.channel_fill = None;
                return;
            }
        }
        self.channel_fill = Some(companion);
    }

    pub fn clear_channel_fill_graph(&mut self) {
        self.channel_fill = None;
    }

    /// Line geometry for the current visible range, after adaptive sampling.
    #[must_use]
    pub fn line_geometry(&self, axes: &PlotAxes<'_>) -> LineGeometry {
        let Ok(data) = self.data.try_borrow() else {
            return LineGeometry::Empty;
        };
        let visible = visible_slice(&data, axes);
        let sampled = sample_visible(visible, axes, self.samples_lines());
        build_line_geometry(self.line_style, &sampled, axes)
    }

    fn samples_lines(&self) -> bool {
        self.adaptive_sampling
            && (self.line_style.is_connected()
                || (self.line_style == LineStyle::Impulse && self.adaptive_sampling_scatter))
    }

    /// Connected vertices used as the far side of a channel fill.
    fn companion_vertices(&self, axes: &PlotAxes<'_>) -> Vec<PixelPoint> {
        match self.line_geometry(axes) {
            LineGeometry::Polyline(vertices) => vertices,
            LineGeometry::Empty | LineGeometry::Segments(_) => {
                let Ok(data) = self.data.try_borrow() else {
                    return Vec::new();
                };
                let visible = visible_slice(&data, axes);
                sample_visible(visible, axes, self.adaptive_sampling)
                    .iter()
                    .map(|point| axes.coords_to_pixels(point.key, point.value))
                    .collect()
            }
        }
    }

    fn draw_fill(
        &self,
        vertices: &[PixelPoint],
        axes: &PlotAxes<'_>,
        painter: &mut dyn Painter,
    ) -> PlotResult<()> {
        let brush = self.style.active_brush();
        painter.set_antialiasing(self.style.antialiased_fill);

        if let Some(link) = &self.channel_fill {
            let Some(companion) = link.upgrade() else {
                debug!(graph = %self.name, "channel fill companion dropped, skipping fill");
                return Ok(());
            };
            if std::ptr::eq(companion.as_ptr(), self) {
                return Ok(());
            }
            let Ok(companion) = companion.try_borrow() else {
                debug!(graph = %self.name, "channel fill companion busy, skipping fill");
                return Ok(());
            };
            let companion_vertices = companion.companion_vertices(axes);
            match channel_fill_polygon(vertices, &companion_vertices, axes) {
                Some(polygon) => painter.draw_polygon(&polygon, None, brush)?,
                None => debug!(graph = %self.name, "channel fill has no overlap, skipping fill"),
            }
            return Ok(());
        }

        for run in finite_runs(vertices) {
            if let Some(polygon) = baseline_fill_polygon(run, axes) {
                painter.draw_polygon(&polygon, None, brush)?;
            }
        }
        Ok(())
    }
}

impl Plottable for Graph {
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
        let Ok(data) = self.data.try_borrow() else {
            warn!(graph = %self.name, "graph data is mutably borrowed, skipping draw");
            return Ok(());
        };
        let visible = visible_slice(&data, axes);
        if visible.is_empty() {
            return Ok(());
        }

        let sampled = sample_visible(visible, axes, self.samples_lines());
        let geometry = build_line_geometry(self.line_style, &sampled, axes);
        let pen = self.style.active_pen();

        if self.line_style.is_connected() && self.style.active_brush().is_visible() {
            self.draw_fill(geometry.polyline(), axes, painter)?;
        }

        if pen.is_visible() {
            painter.set_antialiasing(self.style.antialiased);
            match &geometry {
                LineGeometry::Empty => {}
                LineGeometry::Polyline(vertices) => {
                    for run in finite_runs(vertices) {
                        painter.draw_polyline(run, pen)?;
                    }
                }
                LineGeometry::Segments(segments) => {
                    for [from, to] in segments {
                        if from.is_finite() && to.is_finite() {
                            painter.draw_line(*from, *to, pen)?;
                        }
                    }
                }
            }
        }

        let mut markers = 0_usize;
        if !self.scatter_style.is_none() {
            painter.set_antialiasing(self.style.antialiased_scatters);
            let scatter_points: Cow<'_, [GraphData]> =
                sample_visible(visible, axes, self.adaptive_sampling && self.adaptive_sampling_scatter);
            for point in scatter_points.iter() {
                let center = axes.coords_to_pixels(point.key, point.value);
                if center.is_finite() {
                    self.scatter_style.draw(painter, center, pen)?;
                    markers += 1;
                }
            }
        }

        trace!(
            graph = %self.name,
            visible = visible.len(),
            vertices = geometry.vertex_count(),
            markers,
            "graph drawn"
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
        let data = self.data.try_borrow().ok()?;
        let range = data.visible_range(axes.visible_key_range().lower, axes.visible_key_range().upper);
        let offset = range.start;
        let visible = &data.as_slice()[range];

        let nearest_point = closest(visible.iter().enumerate().map(|(index, point)| {
            SelectTestResult::new(
                point_distance(pos, axes.coords_to_pixels(point.key, point.value)),
                offset + index,
            )
        }))?;

        let sampled = sample_visible(visible, axes, self.samples_lines());
        let line_distance = match build_line_geometry(self.line_style, &sampled, axes) {
            LineGeometry::Empty => f64::INFINITY,
            LineGeometry::Polyline(vertices) => polyline_distance(pos, &vertices),
            LineGeometry::Segments(segments) => segments
                .iter()
                .map(|[from, to]| segment_distance(pos, *from, *to))
                .fold(f64::INFINITY, f64::min),
        };

        Some(SelectTestResult::new(
            nearest_point.distance.min(line_distance),
            nearest_point.data_index,
        ))
    }

    fn key_range(&self, sign_domain: SignDomain) -> Option<PlotRange> {
        self.data.try_borrow().ok()?.key_range(sign_domain)
    }

    fn value_range(
        &self,
        sign_domain: SignDomain,
        in_key_range: Option<PlotRange>,
    ) -> Option<PlotRange> {
        self.data
            .try_borrow()
            .ok()?
            .value_range(sign_domain, in_key_range)
    }
}

fn visible_slice<'a>(data: &'a DataContainer<GraphData>, axes: &PlotAxes<'_>) -> &'a [GraphData] {
    let key_range = axes.visible_key_range();
    &data.as_slice()[data.visible_range(key_range.lower, key_range.upper)]
}

pub(super) fn zip_points(keys: &[f64], values: &[f64]) -> Vec<GraphData> {
    if keys.len() != values.len() {
        warn!(
            keys_len = keys.len(),
            values_len = values.len(),
            "key and value lengths differ, truncating to shortest"
        );
    }
    keys.iter()
        .zip(values)
        .map(|(&key, &value)| GraphData::new(key, value))
        .collect()
}
