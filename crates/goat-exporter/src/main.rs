use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use goat_exporter::{server, Collector, ExporterConfig, ExporterError, RpcNodeClient};

#[actix_web::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ExporterError> {
    let config = ExporterConfig::from_env()?;
    let port = config.port;
    let endpoint = config.redacted_rpc_node();

    tracing::info!(
        port,
        rpc_node = %endpoint,
        scrape_timeout = ?config.scrape_timeout,
        "starting goat-exporter"
    );

    let client = RpcNodeClient::connect(&config.rpc_node).await?;
    let collector = Arc::new(Collector::new(client, endpoint).with_timeout(config.scrape_timeout));

    tracing::info!("  GET  http://localhost:{port}/metrics");
    tracing::info!("  GET  http://localhost:{port}/health");

    server::serve(collector, ("0.0.0.0", port)).await
}
