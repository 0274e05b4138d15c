use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::core::financial_geometry::visible_key_range_for_bars;
use crate::core::{
    DataContainer, FinancialChartStyle, FinancialData, FinancialGeometry, PixelPoint, PlotAxes,
    PlotRange, SharedDataContainer, SignDomain, WidthType, project_financial,
};
use crate::error::{PlotError, PlotResult};
use crate::interaction::{SelectTestResult, closest, rect_distance, segment_distance};
use crate::render::{Brush, Color, Painter, Pen};

use super::{PlotConfig, Plottable, PlottableStyle};

/// OHLC / candlestick series.
#[derive(Debug)]
pub struct Financial {
    name: String,
    style: PlottableStyle,
    chart_style: FinancialChartStyle,
    width: f64,
    width_type: WidthType,
    two_colored: bool,
    pen_positive: Pen,
    pen_negative: Pen,
    brush_positive: Brush,
    brush_negative: Brush,
    data: SharedDataContainer<FinancialData>,
}

impl Financial {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, &PlotConfig::default())
    }

    #[must_use]
    pub fn with_config(name: impl Into<String>, config: &PlotConfig) -> Self {
        let mut style = PlottableStyle::default().with_antialiasing(config.antialiased);
        style.pen = Pen::new(Color::BLACK, 1.0);
        style.brush = Brush::solid(Color::rgb8(240, 240, 240));
        Self {
            name: name.into(),
            style,
            chart_style: FinancialChartStyle::Candlestick,
            width: config.financial_width,
            width_type: config.financial_width_type,
            two_colored: config.two_colored,
            pen_positive: Pen::new(Color::rgb8(40, 150, 0), 1.0),
            pen_negative: Pen::new(Color::rgb8(170, 5, 5), 1.0),
            brush_positive: Brush::solid(Color::rgb8(50, 160, 0)),
            brush_negative: Brush::solid(Color::rgb8(180, 0, 15)),
            data: DataContainer::new().into_shared(),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn chart_style(&self) -> FinancialChartStyle {
        self.chart_style
    }

    pub fn set_chart_style(&mut self, chart_style: FinancialChartStyle) {
        self.chart_style = chart_style;
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Bar width, interpreted according to [`WidthType`].
    pub fn set_width(&mut self, width: f64) -> PlotResult<()> {
        if !width.is_finite() || width < 0.0 {
            return Err(PlotError::InvalidData(
                "financial bar width must be finite and >= 0".to_owned(),
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
    pub fn two_colored(&self) -> bool {
        self.two_colored
    }

    /// Colors rising and falling samples with the positive/negative pens and brushes.
    pub fn set_two_colored(&mut self, two_colored: bool) {
        self.two_colored = two_colored;
    }

    #[must_use]
    pub fn pen_positive(&self) -> Pen {
        self.pen_positive
    }

    pub fn set_pen_positive(&mut self, pen: Pen) {
        self.pen_positive = pen;
    }

    #[must_use]
    pub fn pen_negative(&self) -> Pen {
        self.pen_negative
    }

    pub fn set_pen_negative(&mut self, pen: Pen) {
        self.pen_negative = pen;
    }

    #[must_use]
    pub fn brush_positive(&self) -> Brush {
        self.brush_positive
    }

    pub fn set_brush_positive(&mut self, brush: Brush) {
        self.brush_positive = brush;
    }

    #[must_use]
    pub fn brush_negative(&self) -> Brush {
        self.brush_negative
    }

    pub fn set_brush_negative(&mut self, brush: Brush) {
        self.brush_negative = brush;
    }

    #[must_use]
    pub fn data(&self) -> SharedDataContainer<FinancialData> {
        Rc::clone(&self.data)
    }

    pub fn set_data_container(&mut self, data: SharedDataContainer<FinancialData>) {
        debug!(financial = %self.name, count = data.borrow().len(), "financial data container replaced");
        self.data = data;
    }

    /// Replaces the data, truncating to the shortest input slice.
    pub fn set_data(
        &mut self,
        keys: &[f64],
        open: &[f64],
        high: &[f64],
        low: &[f64],
        close: &[f64],
        already_sorted: bool,
    ) {
        let points = zip_ohlc(keys, open, high, low, close);
        debug!(financial = %self.name, count = points.len(), already_sorted, "financial set data");
        self.data.borrow_mut().set(points, already_sorted);
    }

    pub fn add_data(
        &mut self,
        keys: &[f64],
        open: &[f64],
        high: &[f64],
        low: &[f64],
        close: &[f64],
        already_sorted: bool,
    ) {
        let points = zip_ohlc(keys, open, high, low, close);
        debug!(financial = %self.name, count = points.len(), already_sorted, "financial add data");
        self.data.borrow_mut().add_bulk(points, already_sorted);
    }

    pub fn add_point(&mut self, key: f64, open: f64, high: f64, low: f64, close: f64) {
        let mut data = self.data.borrow_mut();
        data.add(FinancialData::new(key, open, high, low, close));
        trace!(financial = %self.name, count = data.len(), "financial add point");
    }

    /// Projected geometry of the visible samples; indices refer to the container.
    pub fn geometry(&self, axes: &PlotAxes<'_>) -> PlotResult<Vec<FinancialGeometry>> {
        let Ok(data) = self.data.try_borrow() else {
            return Ok(Vec::new());
        };
        let key_range = visible_key_range_for_bars(self.width, self.width_type, axes);
        let range = data.visible_range(key_range.lower, key_range.upper);
        let offset = range.start;
        let mut geometry = project_financial(&data.as_slice()[range], self.width, self.width_type, axes)?;
        for item in &mut geometry {
            item.index += offset;
        }
        Ok(geometry)
    }

    /// Pen and brush for one sample.
    #[must_use]
    pub fn colors_for(&self, is_bullish: bool) -> (Pen, Brush) {
        if self.style.selected {
            (self.style.selected_pen, self.style.selected_brush)
        } else if self.two_colored {
            if is_bullish {
                (self.pen_positive, self.brush_positive)
            } else {
                (self.pen_negative, self.brush_negative)
            }
        } else {
            (self.style.pen, self.style.brush)
        }
    }

    fn distance_to(&self, pos: PixelPoint, item: &FinancialGeometry, axes: &PlotAxes<'_>) -> f64 {
        let to_segment = |[from, to]: [PixelPoint; 2]| segment_distance(pos, from, to);
        match self.chart_style {
            FinancialChartStyle::Ohlc => to_segment(item.backbone(axes))
                .min(to_segment(item.open_tick(axes)))
                .min(to_segment(item.close_tick(axes))),
            FinancialChartStyle::Candlestick => to_segment(item.upper_wick(axes))
                .min(to_segment(item.lower_wick(axes)))
                .min(rect_distance(pos, item.body_rect(axes), true)),
        }
    }
}

impl Plottable for Financial {
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
            warn!(financial = %self.name, "financial data is mutably borrowed, skipping draw");
            return Ok(());
        }
        let geometry = self.geometry(axes)?;
        if geometry.is_empty() {
            return Ok(());
        }

        painter.set_antialiasing(self.style.antialiased);
        for item in geometry.iter().filter(|item| item.is_finite()) {
            let (pen, brush) = self.colors_for(item.is_bullish);
            match self.chart_style {
                FinancialChartStyle::Ohlc => {
                    for [from, to] in [item.backbone(axes), item.open_tick(axes), item.close_tick(axes)] {
                        painter.draw_line(from, to, pen)?;
                    }
                }
                FinancialChartStyle::Candlestick => {
                    for [from, to] in [item.upper_wick(axes), item.lower_wick(axes)] {
                        painter.draw_line(from, to, pen)?;
                    }
                    painter.draw_rect(item.body_rect(axes), Some(pen), brush)?;
                }
            }
        }

        trace!(
            financial = %self.name,
            samples = geometry.len(),
            chart_style = ?self.chart_style,
            "financial drawn"
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
        let geometry = self.geometry(axes).ok()?;
        closest(
            geometry
                .iter()
                .filter(|item| item.is_finite())
                .map(|item| SelectTestResult::new(self.distance_to(pos, item, axes), item.index)),
        )
    }

    fn key_range(&self, sign_domain: SignDomain) -> Option<PlotRange> {
        let range = self.data.try_borrow().ok()?.key_range(sign_domain)?;
        if self.width_type != WidthType::PlotCoords {
            return Some(range);
        }
        let half = self.width * 0.5;
        let widened = PlotRange::new(range.lower - half, range.upper + half);
        // widening must not push a bound out of its sign domain
        Some(PlotRange::new(
            if sign_domain.admits(widened.lower) { widened.lower } else { range.lower },
            if sign_domain.admits(widened.upper) { widened.upper } else { range.upper },
        ))
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

fn zip_ohlc(keys: &[f64], open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<FinancialData> {
    let count = keys
        .len()
        .min(open.len())
        .min(high.len())
        .min(low.len())
        .min(close.len());
    if [open.len(), high.len(), low.len(), close.len()]
        .iter()
        .any(|len| *len != keys.len())
    {
        warn!(
            keys_len = keys.len(),
            open_len = open.len(),
            high_len = high.len(),
            low_len = low.len(),
            close_len = close.len(),
            "financial data lengths differ, truncating to shortest"
        );
    }
    (0..count)
        .map(|index| FinancialData::new(keys[index], open[index], high[index], low[index], close[index]))
        .collect()
}
