use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use petlisting_rs::{
    create_app, init_observability,
    observability::Metrics,
    repositories::{InMemoryPetRepository, UploadStore},
    services::{PetService, UploadService},
    shutdown_observability, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first (basic logging only)
    let config = Config::from_environment().context("Failed to load configuration")?;

    init_observability(&config.observability).context("Failed to initialize observability")?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );

    let metrics = Arc::new(Metrics::new().context("Failed to register metrics")?);

    let repository = InMemoryPetRepository::from_seed_file(&config.storage.seed_file)
        .await
        .with_context(|| {
            format!(
                "Failed to load seed pets from {}",
                config.storage.seed_file.display()
            )
        })?;
    info!("Pet store seeded from {}", repository.source());

    let upload_store = UploadStore::new(&config.storage.upload_dir);
    upload_store
        .ensure_dir()
        .await
        .context("Failed to prepare upload directory")?;

    let pet_service = Arc::new(PetService::new(Arc::new(repository), metrics.clone()));
    pet_service.refresh_store_size().await?;
    let upload_service = Arc::new(UploadService::new(upload_store, metrics.clone()));
    info!("Services initialized successfully");

    let app = create_app(
        &config.server,
        &config.observability,
        metrics,
        pet_service,
        upload_service,
    );

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid bind host {}", config.server.host))?,
        config.server.port,
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
        shutdown_observability().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}
