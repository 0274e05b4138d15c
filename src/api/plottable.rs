use serde::{Deserialize, Serialize};

use crate::core::{PixelPoint, PlotAxes, PlotRange, SignDomain};
use crate::error::PlotResult;
use crate::interaction::SelectTestResult;
use crate::render::{Brush, Color, Painter, Pen};

/// Appearance and interaction flags shared by all plottables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlottableStyle {
    pub pen: Pen,
    pub selected_pen: Pen,
    pub brush: Brush,
    pub selected_brush: Brush,
    pub antialiased: bool,
    pub antialiased_fill: bool,
    pub antialiased_scatters: bool,
    pub visible: bool,
    pub selectable: bool,
    pub selected: bool,
}

impl Default for PlottableStyle {
    fn default() -> Self {
        Self {
            pen: Pen::new(Color::rgb8(0, 0, 255), 1.0),
            selected_pen: Pen::new(Color::rgb8(80, 80, 255), 2.5),
            brush: Brush::none(),
            selected_brush: Brush::none(),
            antialiased: true,
            antialiased_fill: true,
            antialiased_scatters: true,
            visible: true,
            selectable: true,
            selected: false,
        }
    }
}

impl PlottableStyle {
    /// Pen for the current selection state.
    #[must_use]
    pub fn active_pen(&self) -> Pen {
        if self.selected {
            self.selected_pen
        } else {
            self.pen
        }
    }

    /// Brush for the current selection state.
    #[must_use]
    pub fn active_brush(&self) -> Brush {
        if self.selected {
            self.selected_brush
        } else {
            self.brush
        }
    }

    pub(crate) fn with_antialiasing(mut self, antialiased: bool) -> Self {
        self.antialiased = antialiased;
        self.antialiased_fill = antialiased;
        self.antialiased_scatters = antialiased;
        self
    }

    /// Common hit-test gate: selectability and axis-rect containment.
    pub(crate) fn accepts_select_query(
        &self,
        pos: PixelPoint,
        only_selectable: bool,
        axes: &PlotAxes<'_>,
    ) -> bool {
        if only_selectable && !self.selectable {
            return false;
        }
        pos.is_finite() && axes.axis_rect().contains(pos)
    }
}

/// Data series that can be drawn against a key/value axis pair.
pub trait Plottable {
    fn name(&self) -> &str;

    fn style(&self) -> &PlottableStyle;

    fn style_mut(&mut self) -> &mut PlottableStyle;

    /// Draws the visible part of the series.
    fn draw(&self, axes: &PlotAxes<'_>, painter: &mut dyn Painter) -> PlotResult<()>;

    /// Pixel distance from `pos` to the nearest drawn primitive.
    ///
    /// `None` when the plottable is not selectable and `only_selectable` is
    /// set, when `pos` lies outside the axis rect, or when nothing is drawn.
    fn select_test(
        &self,
        pos: PixelPoint,
        only_selectable: bool,
        axes: &PlotAxes<'_>,
    ) -> Option<SelectTestResult>;

    fn key_range(&self, sign_domain: SignDomain) -> Option<PlotRange>;

    fn value_range(
        &self,
        sign_domain: SignDomain,
        in_key_range: Option<PlotRange>,
    ) -> Option<PlotRange>;
}
