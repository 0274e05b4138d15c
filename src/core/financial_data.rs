use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::data_container::{DataContainer, SortedData};
use crate::core::primitives::{datetime_to_unix_seconds, decimal_to_f64};
use crate::core::types::PlotRange;
use crate::error::{PlotError, PlotResult};

/// One open/high/low/close sample.
///
/// Storage assumes `low <= open, close <= high` without enforcing it; use
/// [`FinancialData::checked`] when the input is untrusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialData {
    pub key: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl FinancialData {
    #[must_use]
    pub const fn new(key: f64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            key,
            open,
            high,
            low,
            close,
        }
    }

    /// Builds a sample after checking that every field is finite and that
    /// `open` and `close` lie inside `[low, high]`.
    ///
    /// The error names the first offending field.
    pub fn checked(key: f64, open: f64, high: f64, low: f64, close: f64) -> PlotResult<Self> {
        let fields = [("key", key), ("open", open), ("high", high), ("low", low), ("close", close)];
        if let Some((name, value)) = fields.iter().find(|(_, value)| !value.is_finite()) {
            return Err(PlotError::InvalidData(format!(
                "financial sample {name} is not finite ({value})"
            )));
        }

        let span = PlotRange::new(low, high);
        if span.size() < 0.0 {
            return Err(PlotError::InvalidData(format!(
                "financial sample at key {key}: low {low} exceeds high {high}"
            )));
        }
        for (name, value) in [("open", open), ("close", close)] {
            if !span.contains(value) {
                return Err(PlotError::InvalidData(format!(
                    "financial sample at key {key}: {name} {value} outside low/high {low}..{high}"
                )));
            }
        }

        Ok(Self::new(key, open, high, low, close))
    }

    /// Converts strongly-typed temporal/decimal input into a validated sample.
    pub fn from_decimal_time(
        time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> PlotResult<Self> {
        Self::checked(
            datetime_to_unix_seconds(time),
            decimal_to_f64(open, "open")?,
            decimal_to_f64(high, "high")?,
            decimal_to_f64(low, "low")?,
            decimal_to_f64(close, "close")?,
        )
    }

    /// Returns `true` when close is greater than or equal to open.
    ///
    /// An unchanged sample (`close == open`) counts as bullish.
    #[must_use]
    pub fn is_bullish(self) -> bool {
        self.close >= self.open
    }
}

impl SortedData for FinancialData {
    fn sort_key(&self) -> f64 {
        self.key
    }

    fn main_value(&self) -> f64 {
        self.open
    }

    fn value_range(&self) -> PlotRange {
        PlotRange::new(self.low, self.high)
    }
}

pub type FinancialDataContainer = DataContainer<FinancialData>;

/// Bins a raw time series into OHLC samples.
///
/// A sample at time `t` belongs to bin `round((t - bin_offset) / bin_size)`;
/// each bin is keyed at its center `bin_offset + index * bin_size`. Input is
/// processed in the given order and a bin closes as soon as a sample from a
/// different bin arrives. Mismatched lengths are truncated to the shortest.
pub fn time_series_to_ohlc(
    time: &[f64],
    value: &[f64],
    bin_size: f64,
    bin_offset: f64,
) -> PlotResult<FinancialDataContainer> {
    if !bin_size.is_finite() || bin_size <= 0.0 || !bin_offset.is_finite() {
        return Err(PlotError::InvalidData(
            "ohlc bin size must be finite and > 0".to_owned(),
        ));
    }
    if time.len() != value.len() {
        warn!(
            time_len = time.len(),
            value_len = value.len(),
            "time series lengths differ, truncating to shortest"
        );
    }

    let bin_index = |t: f64| ((t - bin_offset) / bin_size + 0.5).floor();
    let mut bins: Vec<FinancialData> = Vec::new();
    let mut current: Option<(f64, FinancialData)> = None;

    for (&t, &v) in time.iter().zip(value) {
        if !t.is_finite() || !v.is_finite() {
            continue;
        }
        let index = bin_index(t);
        match current.as_mut() {
            Some((current_index, bin)) if *current_index == index => {
                bin.high = bin.high.max(v);
                bin.low = bin.low.min(v);
                bin.close = v;
            }
            _ => {
                if let Some((_, finished)) = current.take() {
                    bins.push(finished);
                }
                current = Some((
                    index,
                    FinancialData::new(bin_offset + index * bin_size, v, v, v, v),
                ));
            }
        }
    }
    if let Some((_, finished)) = current {
        bins.push(finished);
    }

    debug!(bins = bins.len(), bin_size, "binned time series into ohlc");
    Ok(FinancialDataContainer::from_points(bins, false))
}
