mod frame;
mod primitives;

pub use frame::{FramePainter, RenderFrame};
pub use primitives::{
    Brush, Color, EllipsePrimitive, ImagePrimitive, LinePrimitive, LineStrokeStyle, Pen,
    PolygonPrimitive, PolylinePrimitive, RectPrimitive,
};

use image::RgbaImage;

use crate::core::{PixelPoint, PixelRect};
use crate::error::PlotResult;

/// Drawing surface contract used by every plottable.
///
/// Plottables hand over finished pixel-space geometry; a backend only has to
/// rasterize it. Failures surface as `PlotError::Backend`.
pub trait Painter {
    fn set_antialiasing(&mut self, enabled: bool);

    fn draw_line(&mut self, from: PixelPoint, to: PixelPoint, pen: Pen) -> PlotResult<()>;

    /// Strokes a connected path through `points`.
    fn draw_polyline(&mut self, points: &[PixelPoint], pen: Pen) -> PlotResult<()>;

    /// Fills and/or strokes a closed polygon.
    fn draw_polygon(
        &mut self,
        points: &[PixelPoint],
        pen: Option<Pen>,
        brush: Brush,
    ) -> PlotResult<()>;

    fn draw_rect(&mut self, rect: PixelRect, pen: Option<Pen>, brush: Brush) -> PlotResult<()>;

    fn draw_ellipse(
        &mut self,
        center: PixelPoint,
        radius_x: f64,
        radius_y: f64,
        pen: Option<Pen>,
        brush: Brush,
    ) -> PlotResult<()>;

    /// Draws `image` stretched over `target`.
    fn draw_image(&mut self, target: PixelRect, image: &RgbaImage) -> PlotResult<()>;
}

#[cfg(feature = "cairo-backend")]
mod cairo_backend;
#[cfg(feature = "cairo-backend")]
pub use cairo_backend::{CairoPainter, CairoPaintStats};
