use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use pets_rs::{
    create_app, init_observability, repositories::JsonFilePetRepository,
    services::PetService, shutdown_observability, Config, Metrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first (basic logging only)
    let config = Config::from_environment()?;
    println!("Configuration loaded successfully");

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        config.observability.otlp_endpoint.as_deref(),
        &config.observability.log_level,
        config.observability.enable_json_logging,
    )?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Data file: {}", config.storage.data_file);

    let metrics = Arc::new(Metrics::new()?);
    info!("Metrics initialized successfully");

    let repository = JsonFilePetRepository::load(config.storage.data_path())
        .await
        .with_metrics(metrics.clone());

    let pet_service = Arc::new(PetService::new_with_metrics(
        Arc::new(repository),
        metrics.clone(),
    ));
    info!("Services initialized successfully");

    let app = create_app(pet_service, metrics, &config.server);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
    shutdown_observability().await;
}
