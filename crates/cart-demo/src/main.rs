//! Demo entry point.

use cart_demo::Config;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Run the session
    tracing::info!(?config, "starting cart session");
    let report = cart_demo::run(&config).await;

    match serde_json::to_string_pretty(&report.cart) {
        Ok(json) => tracing::info!(
            updates = report.updates,
            errors = report.errors.len(),
            "final cart:\n{json}"
        ),
        Err(e) => tracing::error!(error = %e, "failed to serialize final cart"),
    }

    // 4. Optionally dump metrics
    if config.print_metrics {
        println!("{}", metrics_handle.render());
    }
}
