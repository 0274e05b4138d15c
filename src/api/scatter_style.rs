use serde::{Deserialize, Serialize};

use crate::core::{PixelPoint, PixelRect};
use crate::error::PlotResult;
use crate::render::{Brush, Painter, Pen};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScatterShape {
    /// No markers.
    #[default]
    None,
    Dot,
    Cross,
    Plus,
    Circle,
    Disc,
    Square,
    Diamond,
}

/// Marker drawn at every data point of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterStyle {
    pub shape: ScatterShape,
    pub size: f64,
    /// Outline pen; the graph pen is used when unset.
    pub pen: Option<Pen>,
    pub brush: Brush,
}

impl Default for ScatterStyle {
    fn default() -> Self {
        Self::new(ScatterShape::None, 6.0)
    }
}

impl ScatterStyle {
    #[must_use]
    pub const fn new(shape: ScatterShape, size: f64) -> Self {
        Self {
            shape,
            size,
            pen: None,
            brush: Brush::none(),
        }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        self.shape == ScatterShape::None
    }

    pub fn draw(&self, painter: &mut dyn Painter, center: PixelPoint, fallback_pen: Pen) -> PlotResult<()> {
        let pen = self.pen.unwrap_or(fallback_pen);
        let half = self.size * 0.5;
        let at = |dx: f64, dy: f64| PixelPoint::new(center.x + dx, center.y + dy);
        match self.shape {
            ScatterShape::None => Ok(()),
            ScatterShape::Dot => {
                painter.draw_ellipse(center, 0.5, 0.5, None, Brush::solid(pen.color))
            }
            ScatterShape::Cross => {
                painter.draw_line(at(-half, -half), at(half, half), pen)?;
                painter.draw_line(at(-half, half), at(half, -half), pen)
            }
            ScatterShape::Plus => {
                painter.draw_line(at(-half, 0.0), at(half, 0.0), pen)?;
                painter.draw_line(at(0.0, -half), at(0.0, half), pen)
            }
            ScatterShape::Circle => painter.draw_ellipse(center, half, half, Some(pen), self.brush),
            ScatterShape::Disc => {
                painter.draw_ellipse(center, half, half, Some(pen), Brush::solid(pen.color))
            }
            ScatterShape::Square => painter.draw_rect(
                PixelRect::new(center.x - half, center.y - half, self.size, self.size),
                Some(pen),
                self.brush,
            ),
            ScatterShape::Diamond => painter.draw_polygon(
                &[at(-half, 0.0), at(0.0, -half), at(half, 0.0), at(0.0, half)],
                Some(pen),
                self.brush,
            ),
        }
    }
}
