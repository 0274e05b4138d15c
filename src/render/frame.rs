use image::RgbaImage;

use crate::core::{PixelPoint, PixelRect};
use crate::error::PlotResult;
use crate::render::{
    Brush, EllipsePrimitive, ImagePrimitive, LinePrimitive, Painter, Pen, PolygonPrimitive,
    PolylinePrimitive, RectPrimitive,
};

/// Backend-agnostic record of one draw pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderFrame {
    pub lines: Vec<LinePrimitive>,
    pub polylines: Vec<PolylinePrimitive>,
    pub polygons: Vec<PolygonPrimitive>,
    pub rects: Vec<RectPrimitive>,
    pub ellipses: Vec<EllipsePrimitive>,
    pub images: Vec<ImagePrimitive>,
}

impl RenderFrame {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> PlotResult<()> {
        for line in &self.lines {
            line.validate()?;
        }
        for polyline in &self.polylines {
            polyline.validate()?;
        }
        for polygon in &self.polygons {
            polygon.validate()?;
        }
        for rect in &self.rects {
            rect.validate()?;
        }
        for ellipse in &self.ellipses {
            ellipse.validate()?;
        }
        for image in &self.images {
            image.validate()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
            && self.polylines.is_empty()
            && self.polygons.is_empty()
            && self.rects.is_empty()
            && self.ellipses.is_empty()
            && self.images.is_empty()
    }

    /// Total number of vertices submitted through polylines.
    #[must_use]
    pub fn polyline_vertex_count(&self) -> usize {
        self.polylines.iter().map(|polyline| polyline.points.len()).sum()
    }
}

/// Painter that records every command into a [`RenderFrame`].
///
/// Used by tests and headless hosts; commands are validated as they arrive
/// so invalid geometry is caught before a real backend sees it.
#[derive(Debug, Default)]
pub struct FramePainter {
    frame: RenderFrame,
    antialiasing: bool,
}

impl FramePainter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn frame(&self) -> &RenderFrame {
        &self.frame
    }

    #[must_use]
    pub fn into_frame(self) -> RenderFrame {
        self.frame
    }

    /// Clears the recorded frame for the next pass.
    pub fn reset(&mut self) {
        self.frame = RenderFrame::new();
    }

    #[must_use]
    pub fn antialiasing(&self) -> bool {
        self.antialiasing
    }
}

impl Painter for FramePainter {
    fn set_antialiasing(&mut self, enabled: bool) {
        self.antialiasing = enabled;
    }

    fn draw_line(&mut self, from: PixelPoint, to: PixelPoint, pen: Pen) -> PlotResult<()> {
        let line = LinePrimitive::new(from, to, pen);
        line.validate()?;
        self.frame.lines.push(line);
        Ok(())
    }

    fn draw_polyline(&mut self, points: &[PixelPoint], pen: Pen) -> PlotResult<()> {
        let polyline = PolylinePrimitive {
            points: points.to_vec(),
            pen,
        };
        polyline.validate()?;
        self.frame.polylines.push(polyline);
        Ok(())
    }

    fn draw_polygon(
        &mut self,
        points: &[PixelPoint],
        pen: Option<Pen>,
        brush: Brush,
    ) -> PlotResult<()> {
        let polygon = PolygonPrimitive {
            points: points.to_vec(),
            pen,
            brush,
        };
        polygon.validate()?;
        self.frame.polygons.push(polygon);
        Ok(())
    }

    fn draw_rect(&mut self, rect: PixelRect, pen: Option<Pen>, brush: Brush) -> PlotResult<()> {
        let rect = RectPrimitive { rect, pen, brush };
        rect.validate()?;
        self.frame.rects.push(rect);
        Ok(())
    }

    fn draw_ellipse(
        &mut self,
        center: PixelPoint,
        radius_x: f64,
        radius_y: f64,
        pen: Option<Pen>,
        brush: Brush,
    ) -> PlotResult<()> {
        let ellipse = EllipsePrimitive {
            center,
            radius_x,
            radius_y,
            pen,
            brush,
        };
        ellipse.validate()?;
        self.frame.ellipses.push(ellipse);
        Ok(())
    }

    fn draw_image(&mut self, target: PixelRect, image: &RgbaImage) -> PlotResult<()> {
        let image = ImagePrimitive {
            target,
            image: image.clone(),
        };
        image.validate()?;
        self.frame.images.push(image);
        Ok(())
    }
}
