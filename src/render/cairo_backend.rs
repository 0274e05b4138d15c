use cairo::{Antialias, Context, Format, ImageSurface};
use image::RgbaImage;
use std::f64::consts::TAU;

use crate::core::{PixelPoint, PixelRect, Viewport};
use crate::error::{PlotError, PlotResult};
use crate::render::{Brush, Color, LineStrokeStyle, Painter, Pen};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CairoPaintStats {
    pub lines_drawn: usize,
    pub polylines_drawn: usize,
    pub polygons_drawn: usize,
    pub rects_drawn: usize,
    pub ellipses_drawn: usize,
    pub images_drawn: usize,
}

/// Cairo painter backend.
///
/// Either owns an offscreen image surface (`new`) or draws in place on an
/// external context such as a GTK draw callback (`for_context`).
#[derive(Debug)]
pub struct CairoPainter {
    context: Context,
    surface: Option<ImageSurface>,
    stats: CairoPaintStats,
}

impl CairoPainter {
    pub fn new(viewport: Viewport) -> PlotResult<Self> {
        let (width, height) = match (
            i32::try_from(viewport.width),
            i32::try_from(viewport.height),
        ) {
            (Ok(width), Ok(height)) if viewport.is_valid() => (width, height),
            _ => {
                return Err(PlotError::InvalidViewport {
                    width: viewport.width,
                    height: viewport.height,
                });
            }
        };

        let surface = ImageSurface::create(Format::ARgb32, width, height)
            .map_err(|err| map_backend_error("failed to create cairo surface", err))?;
        let context = Context::new(&surface)
            .map_err(|err| map_backend_error("failed to create cairo context", err))?;
        Ok(Self {
            context,
            surface: Some(surface),
            stats: CairoPaintStats::default(),
        })
    }

    #[must_use]
    pub fn for_context(context: Context) -> Self {
        Self {
            context,
            surface: None,
            stats: CairoPaintStats::default(),
        }
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        "cairo"
    }

    /// Offscreen surface, `None` when painting on an external context.
    #[must_use]
    pub fn surface(&self) -> Option<&ImageSurface> {
        self.surface.as_ref()
    }

    #[must_use]
    pub fn stats(&self) -> CairoPaintStats {
        self.stats
    }

    /// Paints the whole target with `color`.
    pub fn clear(&mut self, color: Color) -> PlotResult<()> {
        color.validate()?;
        apply_color(&self.context, color);
        self.context
            .paint()
            .map_err(|err| map_backend_error("failed to clear surface", err))
    }

    fn finish_shape(&self, pen: Option<Pen>, brush: Brush, what: &str) -> PlotResult<()> {
        if let Some(fill) = brush.color.filter(|_| brush.is_visible()) {
            apply_color(&self.context, fill);
            self.context
                .fill_preserve()
                .map_err(|err| map_backend_error(&format!("failed to fill {what}"), err))?;
        }
        match pen.filter(|pen| pen.is_visible()) {
            Some(pen) => {
                apply_pen(&self.context, pen);
                self.context
                    .stroke()
                    .map_err(|err| map_backend_error(&format!("failed to stroke {what}"), err))
            }
            None => {
                self.context.new_path();
                Ok(())
            }
        }
    }
}

impl Painter for CairoPainter {
    fn set_antialiasing(&mut self, enabled: bool) {
        self.context.set_antialias(if enabled {
            Antialias::Default
        } else {
            Antialias::None
        });
    }

    fn draw_line(&mut self, from: PixelPoint, to: PixelPoint, pen: Pen) -> PlotResult<()> {
        pen.validate()?;
        apply_pen(&self.context, pen);
        self.context.move_to(from.x, from.y);
        self.context.line_to(to.x, to.y);
        self.context
            .stroke()
            .map_err(|err| map_backend_error("failed to stroke line", err))?;
        self.stats.lines_drawn += 1;
        Ok(())
    }

    fn draw_polyline(&mut self, points: &[PixelPoint], pen: Pen) -> PlotResult<()> {
        pen.validate()?;
        let Some((first, rest)) = points.split_first() else {
            return Ok(());
        };
        apply_pen(&self.context, pen);
        self.context.move_to(first.x, first.y);
        for point in rest {
            self.context.line_to(point.x, point.y);
        }
        self.context
            .stroke()
            .map_err(|err| map_backend_error("failed to stroke polyline", err))?;
        self.stats.polylines_drawn += 1;
        Ok(())
    }

    fn draw_polygon(
        &mut self,
        points: &[PixelPoint],
        pen: Option<Pen>,
        brush: Brush,
    ) -> PlotResult<()> {
        let Some((first, rest)) = points.split_first() else {
            return Ok(());
        };
        self.context.move_to(first.x, first.y);
        for point in rest {
            self.context.line_to(point.x, point.y);
        }
        self.context.close_path();
        self.finish_shape(pen, brush, "polygon")?;
        self.stats.polygons_drawn += 1;
        Ok(())
    }

    fn draw_rect(&mut self, rect: PixelRect, pen: Option<Pen>, brush: Brush) -> PlotResult<()> {
        self.context
            .rectangle(rect.x, rect.y, rect.width, rect.height);
        self.finish_shape(pen, brush, "rectangle")?;
        self.stats.rects_drawn += 1;
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
        if radius_x <= 0.0 || radius_y <= 0.0 {
            return Ok(());
        }
        self.context.save().map_err(|err| map_backend_error("failed to save state", err))?;
        self.context.translate(center.x, center.y);
        self.context.scale(radius_x, radius_y);
        self.context.new_sub_path();
        self.context.arc(0.0, 0.0, 1.0, 0.0, TAU);
        self.context
            .restore()
            .map_err(|err| map_backend_error("failed to restore state", err))?;
        self.finish_shape(pen, brush, "ellipse")?;
        self.stats.ellipses_drawn += 1;
        Ok(())
    }

    fn draw_image(&mut self, target: PixelRect, image: &RgbaImage) -> PlotResult<()> {
        if image.width() == 0 || image.height() == 0 || target.is_empty() {
            return Ok(());
        }
        let source = image_to_surface(image)?;
        let context = &self.context;
        context.save().map_err(|err| map_backend_error("failed to save state", err))?;
        context.translate(target.x, target.y);
        context.scale(
            target.width / f64::from(image.width()),
            target.height / f64::from(image.height()),
        );
        context
            .set_source_surface(&source, 0.0, 0.0)
            .map_err(|err| map_backend_error("failed to set image source", err))?;
        let painted = context.paint();
        context
            .restore()
            .map_err(|err| map_backend_error("failed to restore state", err))?;
        painted.map_err(|err| map_backend_error("failed to paint image", err))?;
        self.stats.images_drawn += 1;
        Ok(())
    }
}

fn image_to_surface(image: &RgbaImage) -> PlotResult<ImageSurface> {
    let width = image.width() as i32;
    let height = image.height() as i32;
    let stride = Format::ARgb32
        .stride_for_width(image.width())
        .map_err(|err| map_backend_error("invalid image stride", err))?;
    let mut data = vec![0_u8; stride as usize * image.height() as usize];
    for (x, y, pixel) in image.enumerate_pixels() {
        let [red, green, blue, alpha] = pixel.0;
        let premultiply = |channel: u8| ((u16::from(channel) * u16::from(alpha)) / 255) as u8;
        // cairo ARGB32 is a native-endian u32
        let packed = (u32::from(alpha) << 24)
            | (u32::from(premultiply(red)) << 16)
            | (u32::from(premultiply(green)) << 8)
            | u32::from(premultiply(blue));
        let offset = y as usize * stride as usize + x as usize * 4;
        data[offset..offset + 4].copy_from_slice(&packed.to_ne_bytes());
    }
    ImageSurface::create_for_data(data, Format::ARgb32, width, height, stride)
        .map_err(|err| map_backend_error("failed to create image surface", err))
}

fn apply_color(context: &Context, color: Color) {
    context.set_source_rgba(color.red, color.green, color.blue, color.alpha);
}

fn apply_pen(context: &Context, pen: Pen) {
    apply_color(context, pen.color);
    context.set_line_width(pen.width.max(1.0));
    match pen.style {
        LineStrokeStyle::Solid => context.set_dash(&[], 0.0),
        LineStrokeStyle::Dashed => context.set_dash(&[6.0, 4.0], 0.0),
        LineStrokeStyle::Dotted => context.set_dash(&[1.0, 3.0], 0.0),
    }
}

fn map_backend_error(prefix: &str, err: cairo::Error) -> PlotError {
    PlotError::Backend(format!("{prefix}: {err}"))
}
