#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pets_rs::{
    config::ServerConfig, create_app, repositories::JsonFilePetRepository, services::PetService,
    Metrics,
};
use reqwest::Client;
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub data_file: PathBuf,
    _data_dir: TempDir,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create data dir");
        Self::start(data_dir).await
    }

    /// Start a server whose backing file already holds `contents`
    pub async fn with_file_contents(contents: &str) -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create data dir");
        std::fs::write(data_dir.path().join("pets.json"), contents)
            .expect("Failed to write backing file");
        Self::start(data_dir).await
    }

    async fn start(data_dir: TempDir) -> Self {
        let data_file = data_dir.path().join("pets.json");

        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));
        let repository = JsonFilePetRepository::load(data_file.clone())
            .await
            .with_metrics(metrics.clone());
        let pet_service = Arc::new(PetService::new_with_metrics(
            Arc::new(repository),
            metrics.clone(),
        ));
        let app = create_app(pet_service, metrics, &ServerConfig::default());

        // Start server
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
            data_file,
            _data_dir: data_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Parsed contents of the backing file
    pub fn persisted(&self) -> Value {
        let contents = std::fs::read_to_string(&self.data_file).expect("Failed to read data file");
        serde_json::from_str(&contents).expect("Backing file is not valid JSON")
    }

    pub async fn create_pet(&self, body: Value) -> Value {
        let response = self
            .client
            .post(self.url("/api/pets"))
            .json(&body)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse response")
    }
}
