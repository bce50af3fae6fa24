//! Demo configuration loaded from environment variables.

use std::time::Duration;

/// Demo configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `CART_DEMO_LATENCY_MS`: simulated catalog latency (default: `50`)
/// - `CART_DEMO_PRINT_METRICS`: print Prometheus output at exit (default: `false`)
/// - `CART_DEMO_QUEUE_NAME`: queue name used in logs and metrics (default: `"cart"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub catalog_latency: Duration,
    pub print_metrics: bool,
    pub queue_name: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            catalog_latency: lookup("CART_DEMO_LATENCY_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.catalog_latency),
            print_metrics: lookup("CART_DEMO_PRINT_METRICS")
                .map(|flag| parse_flag(&flag))
                .unwrap_or(defaults.print_metrics),
            queue_name: lookup("CART_DEMO_QUEUE_NAME").unwrap_or(defaults.queue_name),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            catalog_latency: Duration::from_millis(50),
            print_metrics: false,
            queue_name: cart::CART_QUEUE_NAME.to_string(),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
