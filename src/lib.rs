//! plot-rs: 2D plotting core.
//!
//! Sorted series storage, adaptive sampling, graph and financial renderers,
//! hit-testing, and color maps kept in sync through a shared color scale.
//! Drawing goes through the [`render::Painter`] trait; the crate ships a
//! recording painter and an optional cairo backend.

pub mod api;
pub mod core;
pub mod error;
pub mod interaction;
pub mod render;
pub mod telemetry;

pub use api::{
    ColorMap, ColorMapData, ColorScale, ColorScaleConsumer, ColorScaleSide, Financial, Graph,
    PlotConfig, Plottable, PlottableStyle,
};
pub use error::{PlotError, PlotResult};
