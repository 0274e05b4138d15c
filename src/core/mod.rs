pub mod axis;
pub mod bars_geometry;
pub mod color_gradient;
pub mod data_container;
pub mod financial_data;
pub mod financial_geometry;
pub mod graph_data;
pub mod line_geometry;
pub mod primitives;
pub mod sampler;
pub mod types;

pub use axis::{Axis, AxisOrientation, CoordinateMapper, PlotAxes, ScaleType};
pub use bars_geometry::{bar_pixel_offsets, group_key_offset};
pub use color_gradient::{ColorGradient, ColorInterpolation, DEFAULT_LEVEL_COUNT, GradientPreset};
pub use data_container::{DataContainer, SharedDataContainer, SortedData};
pub use financial_data::{FinancialData, FinancialDataContainer, time_series_to_ohlc};
pub use financial_geometry::{
    FinancialChartStyle, FinancialGeometry, WidthType, project_financial, resolve_bar_width_px,
};
pub use graph_data::{GraphData, GraphDataContainer};
pub use line_geometry::{LineGeometry, LineStyle, build_line_geometry};
pub use sampler::sample_visible;
pub use types::{PixelPoint, PixelRect, PlotRange, SignDomain, Viewport};
