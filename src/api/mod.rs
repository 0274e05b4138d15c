//! Plottables and their configuration.
//!
//! [`Graph`], [`Financial`], [`Bars`] and [`ColorMap`] implement
//! [`Plottable`]; the [`ColorScale`] keeps color maps that share it in sync.

mod bars;
mod color_map;
mod color_scale;
mod financial;
mod graph;
mod plot_config;
mod plottable;
mod scatter_style;

pub use bars::{Bars, BarsGroup, SharedBars, SharedBarsGroup};
pub use color_map::{ColorMap, ColorMapData};
pub use color_scale::{
    COLOR_SCALE_MARGIN_PX, ColorScale, ColorScaleAxisRect, ColorScaleConsumer, ColorScaleSide,
    ConsumerId, MAX_GRADIENT_IMAGE_THICKNESS,
};
pub use financial::Financial;
pub use graph::Graph;
pub use plot_config::PlotConfig;
pub use plottable::{Plottable, PlottableStyle};
pub use scatter_style::{ScatterShape, ScatterStyle};

pub use crate::core::time_series_to_ohlc;
