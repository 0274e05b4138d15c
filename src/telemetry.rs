//! Log output for hosts embedding `plot-rs`.
//!
//! Renderers emit `tracing` events (`debug!` on data and scale changes,
//! `trace!` per draw pass, `warn!` on skipped input). Nothing is printed
//! until a subscriber is installed, either by the host or through the
//! helpers below when the `telemetry` feature is on.

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "plot_rs=warn";

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`, or by
/// [`DEFAULT_FILTER`] when the variable is missing or unparsable.
///
/// Returns `false` when the `telemetry` feature is disabled or a global
/// subscriber is already installed.
#[must_use]
pub fn init_default_tracing() -> bool {
    init_tracing(DEFAULT_FILTER)
}

/// Same as [`init_default_tracing`] with a caller-chosen fallback filter.
#[must_use]
pub fn init_tracing(fallback_filter: &str) -> bool {
    #[cfg(feature = "telemetry")]
    {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(fallback_filter))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
            .is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = fallback_filter;
        false
    }
}
