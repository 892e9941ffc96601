//! Logging initialization.
//!
//! Logs always go to stderr so reports written to stdout stay parseable.

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level`.
///
/// # Formats
///
/// * `"pretty"` - multi-line human-readable output
/// * `"compact"` - one line per event
/// * `"json"` - JSON lines for log collectors
pub fn init_tracing(level: &str, format: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match format {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.json())
            .try_init(),
        "pretty" => tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.pretty())
            .try_init(),
        "compact" => tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.compact())
            .try_init(),
        _ => {
            return Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'pretty', 'compact' or 'json'",
                format
            ));
        }
    };

    result.map_err(|e| anyhow::anyhow!("failed to initialize {} tracing subscriber: {}", format, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_format_is_rejected() {
        let err = init_tracing("info", "xml").unwrap_err();
        assert!(err.to_string().contains("unknown log format"));
    }
}
