use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use petlisting_rs::{
    config::{ObservabilityConfig, ServerConfig},
    create_app,
    observability::Metrics,
    repositories::{InMemoryPetRepository, UploadStore},
    services::{PetService, UploadService},
};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub upload_dir: PathBuf,
    // Keeps the seed file and upload directory alive for the test
    _workspace: TempDir,
}

/// Seed used by most tests
pub fn default_seed() -> Value {
    json!([
        { "id": 1, "name": "A", "breed": "Beagle", "age": 2 },
        { "id": 2, "name": "Whiskers", "imageUrl": "uploads/whiskers.jpg", "color": "grey" }
    ])
}

impl TestEnvironment {
    pub async fn new() -> Self {
        Self::with_seed(default_seed()).await
    }

    pub async fn with_seed(seed: Value) -> Self {
        Self::with_limits(seed, 10 * 1024 * 1024).await
    }

    pub async fn with_limits(seed: Value, max_request_size: usize) -> Self {
        Self::start(seed, max_request_size, "petlisting-rs").await
    }

    pub async fn with_service_name(service_name: &str) -> Self {
        Self::start(default_seed(), 10 * 1024 * 1024, service_name).await
    }

    async fn start(seed: Value, max_request_size: usize, service_name: &str) -> Self {
        let workspace = tempfile::tempdir().expect("Failed to create temp dir");

        let seed_file = workspace.path().join("pets.json");
        std::fs::write(&seed_file, seed.to_string()).expect("Failed to write seed file");

        let upload_dir = workspace.path().join("uploads");

        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));

        let repository = InMemoryPetRepository::from_seed_file(&seed_file)
            .await
            .expect("Failed to load seed file");
        let pet_service = Arc::new(PetService::new(Arc::new(repository), metrics.clone()));
        pet_service
            .refresh_store_size()
            .await
            .expect("Failed to count seed pets");

        let upload_store = UploadStore::new(&upload_dir);
        upload_store
            .ensure_dir()
            .await
            .expect("Failed to create upload dir");
        let upload_service = Arc::new(UploadService::new(upload_store, metrics.clone()));

        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            request_timeout_seconds: 30,
            max_request_size,
        };
        let observability = ObservabilityConfig {
            service_name: service_name.to_string(),
            service_version: "1.2.3".to_string(),
            otlp_endpoint: None,
            log_level: "info".to_string(),
            enable_json_logging: false,
        };
        let app = create_app(&server, &observability, metrics, pet_service, upload_service);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        Self {
            client: Client::new(),
            base_url,
            upload_dir,
            _workspace: workspace,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list_pets(&self) -> Value {
        let response = self
            .client
            .get(self.url("/api/pets"))
            .send()
            .await
            .expect("Failed to list pets");

        assert_eq!(response.status().as_u16(), 200);
        response.json().await.expect("Failed to parse pet list")
    }
}
