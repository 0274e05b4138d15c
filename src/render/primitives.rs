use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::core::{PixelPoint, PixelRect};
use crate::error::{PlotError, PlotResult};

/// RGBA color in normalized 0..=1 channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    #[must_use]
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    /// Builds an opaque color from 8-bit channels.
    #[must_use]
    pub fn rgb8(red: u8, green: u8, blue: u8) -> Self {
        Self::rgb(
            f64::from(red) / 255.0,
            f64::from(green) / 255.0,
            f64::from(blue) / 255.0,
        )
    }

    #[must_use]
    pub fn to_rgba8(self) -> Rgba<u8> {
        let channel = |value: f64| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([
            channel(self.red),
            channel(self.green),
            channel(self.blue),
            channel(self.alpha),
        ])
    }

    #[must_use]
    pub fn from_rgba8(pixel: Rgba<u8>) -> Self {
        let [red, green, blue, alpha] = pixel.0;
        Self::rgba(
            f64::from(red) / 255.0,
            f64::from(green) / 255.0,
            f64::from(blue) / 255.0,
            f64::from(alpha) / 255.0,
        )
    }

    #[must_use]
    pub fn is_transparent(self) -> bool {
        self.alpha <= 0.0
    }

    pub fn validate(self) -> PlotResult<()> {
        for (channel, value) in [
            ("red", self.red),
            ("green", self.green),
            ("blue", self.blue),
            ("alpha", self.alpha),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(PlotError::InvalidData(format!(
                    "color channel `{channel}` must be finite and in [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LineStrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Stroke settings for outlines and lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pen {
    pub color: Color,
    pub width: f64,
    #[serde(default)]
    pub style: LineStrokeStyle,
}

impl Default for Pen {
    fn default() -> Self {
        Self::new(Color::BLACK, 1.0)
    }
}

impl Pen {
    #[must_use]
    pub const fn new(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            style: LineStrokeStyle::Solid,
        }
    }

    #[must_use]
    pub const fn with_style(mut self, style: LineStrokeStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn is_visible(self) -> bool {
        !self.color.is_transparent() && self.width > 0.0
    }

    pub fn validate(self) -> PlotResult<()> {
        if !self.width.is_finite() || self.width < 0.0 {
            return Err(PlotError::InvalidData(
                "pen width must be finite and >= 0".to_owned(),
            ));
        }
        self.color.validate()
    }
}

/// Fill settings; `color == None` means no fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Brush {
    pub color: Option<Color>,
}

impl Brush {
    #[must_use]
    pub const fn none() -> Self {
        Self { color: None }
    }

    #[must_use]
    pub const fn solid(color: Color) -> Self {
        Self { color: Some(color) }
    }

    #[must_use]
    pub fn is_visible(self) -> bool {
        self.color.is_some_and(|color| !color.is_transparent())
    }

    pub fn validate(self) -> PlotResult<()> {
        match self.color {
            Some(color) => color.validate(),
            None => Ok(()),
        }
    }
}

fn validate_points(points: &[PixelPoint], what: &str) -> PlotResult<()> {
    if points.iter().all(|point| point.is_finite()) {
        Ok(())
    } else {
        Err(PlotError::InvalidData(format!(
            "{what} coordinates must be finite"
        )))
    }
}

fn validate_rect(rect: PixelRect, what: &str) -> PlotResult<()> {
    if !rect.x.is_finite()
        || !rect.y.is_finite()
        || !rect.width.is_finite()
        || !rect.height.is_finite()
        || rect.width < 0.0
        || rect.height < 0.0
    {
        return Err(PlotError::InvalidData(format!(
            "{what} must be finite with non-negative size"
        )));
    }
    Ok(())
}

/// Draw command for one line segment in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePrimitive {
    pub from: PixelPoint,
    pub to: PixelPoint,
    pub pen: Pen,
}

impl LinePrimitive {
    #[must_use]
    pub const fn new(from: PixelPoint, to: PixelPoint, pen: Pen) -> Self {
        Self { from, to, pen }
    }

    pub fn validate(self) -> PlotResult<()> {
        validate_points(&[self.from, self.to], "line")?;
        self.pen.validate()
    }
}

/// Draw command for a connected open path.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylinePrimitive {
    pub points: Vec<PixelPoint>,
    pub pen: Pen,
}

impl PolylinePrimitive {
    pub fn validate(&self) -> PlotResult<()> {
        validate_points(&self.points, "polyline")?;
        self.pen.validate()
    }
}

/// Draw command for a closed polygon; the closing edge is implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonPrimitive {
    pub points: Vec<PixelPoint>,
    pub pen: Option<Pen>,
    pub brush: Brush,
}

impl PolygonPrimitive {
    pub fn validate(&self) -> PlotResult<()> {
        if self.points.len() < 3 {
            return Err(PlotError::InvalidData(
                "polygon needs at least three vertices".to_owned(),
            ));
        }
        validate_points(&self.points, "polygon")?;
        if let Some(pen) = self.pen {
            pen.validate()?;
        }
        self.brush.validate()
    }
}

/// Draw command for one rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectPrimitive {
    pub rect: PixelRect,
    pub pen: Option<Pen>,
    pub brush: Brush,
}

impl RectPrimitive {
    pub fn validate(self) -> PlotResult<()> {
        validate_rect(self.rect, "rectangle")?;
        if let Some(pen) = self.pen {
            pen.validate()?;
        }
        self.brush.validate()
    }
}

/// Draw command for an axis-aligned ellipse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipsePrimitive {
    pub center: PixelPoint,
    pub radius_x: f64,
    pub radius_y: f64,
    pub pen: Option<Pen>,
    pub brush: Brush,
}

impl EllipsePrimitive {
    pub fn validate(self) -> PlotResult<()> {
        validate_points(&[self.center], "ellipse")?;
        if !self.radius_x.is_finite()
            || !self.radius_y.is_finite()
            || self.radius_x < 0.0
            || self.radius_y < 0.0
        {
            return Err(PlotError::InvalidData(
                "ellipse radii must be finite and >= 0".to_owned(),
            ));
        }
        if let Some(pen) = self.pen {
            pen.validate()?;
        }
        self.brush.validate()
    }
}

/// Draw command stretching a bitmap over a target rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePrimitive {
    pub target: PixelRect,
    pub image: RgbaImage,
}

impl ImagePrimitive {
    pub fn validate(&self) -> PlotResult<()> {
        validate_rect(self.target, "image target")?;
        if self.image.width() == 0 || self.image.height() == 0 {
            return Err(PlotError::InvalidData(
                "image must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}
