use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::data_container::{DataContainer, SortedData};
use crate::core::primitives::{datetime_to_unix_seconds, decimal_to_f64};
use crate::core::types::PlotRange;
use crate::error::PlotResult;

/// One sample of a graph series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub key: f64,
    pub value: f64,
}

impl GraphData {
    #[must_use]
    pub const fn new(key: f64, value: f64) -> Self {
        Self { key, value }
    }

    /// Builds a sample keyed by unix seconds from strongly-typed input.
    pub fn from_decimal_time(time: DateTime<Utc>, value: Decimal) -> PlotResult<Self> {
        Ok(Self {
            key: datetime_to_unix_seconds(time),
            value: decimal_to_f64(value, "value")?,
        })
    }
}

impl SortedData for GraphData {
    fn sort_key(&self) -> f64 {
        self.key
    }

    fn main_value(&self) -> f64 {
        self.value
    }

    fn value_range(&self) -> PlotRange {
        PlotRange::new(self.value, self.value)
    }
}

pub type GraphDataContainer = DataContainer<GraphData>;
