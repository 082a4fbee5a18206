use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{config::LogFormat, DashboardError, Result};

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter() -> String {
    format!(
        "{}={},tower_http={}",
        env!("CARGO_CRATE_NAME"),
        Level::INFO,
        Level::INFO
    )
}

/// Sets up the global tracing subscriber.
///
/// # Arguments
/// * `format` - Compact human-readable lines or one JSON object per event
pub fn init_logger(format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter()));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_names(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_level(true)
                    .with_ansi(true)
                    .compact(),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
    };

    result.map_err(|e| DashboardError::Config(format!("Failed to initialize logger: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_names_crate() {
        assert_eq!(default_filter(), "cluster_dashboard=INFO,tower_http=INFO");
    }
}
