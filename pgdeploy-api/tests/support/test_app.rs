use std::net::TcpListener;
use std::sync::Arc;

use base64::{Engine, prelude::BASE64_STANDARD};
use pgdeploy_api::config::{ApiConfig, ApplicationSettings};
use pgdeploy_api::k8s::K8sClient;
use pgdeploy_api::metrics::MetricsSink;
use pgdeploy_api::routes::postgres::{CreatePostgresRequest, UpdatePostgresRequest};
use pgdeploy_api::startup::run;
use pgdeploy_config::shared::RetryConfig;
use pgdeploy_telemetry::tracing::init_test_tracing;
use rand::Rng;

pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub api_key: String,
    server_handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

impl TestApp {
    pub async fn create_postgres(&self, request: &CreatePostgresRequest) -> reqwest::Response {
        self.api_client
            .post(format!("{}/v1/postgres", &self.address))
            .bearer_auth(self.api_key.clone())
            .json(request)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn update_postgres(
        &self,
        id: &str,
        request: &UpdatePostgresRequest,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/v1/postgres/{id}", &self.address))
            .bearer_auth(self.api_key.clone())
            .json(request)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete_postgres(&self, id: &str) -> reqwest::Response {
        self.api_client
            .delete(format!("{}/v1/postgres/{id}", &self.address))
            .bearer_auth(self.api_key.clone())
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn create_postgres_unauthenticated(
        &self,
        request: &CreatePostgresRequest,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/v1/postgres", &self.address))
            .json(request)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn health_check(&self) -> reqwest::Response {
        self.api_client
            .get(format!("{}/health_check", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn metrics(&self) -> reqwest::Response {
        self.api_client
            .get(format!("{}/metrics", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// Generates a random base64-encoded 32-byte API key.
pub fn generate_api_key() -> String {
    let mut key = [0u8; 32];
    rand::rng().fill(&mut key[..]);
    BASE64_STANDARD.encode(key)
}

/// Retry policy without delays so conflict tests finish quickly.
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_delay_ms: 0,
        max_delay_ms: 0,
        backoff_factor: 1.0,
    }
}

/// Spawns the full application on an ephemeral port against the given
/// collaborators.
pub async fn spawn_test_app(
    k8s_client: Option<Arc<dyn K8sClient>>,
    metrics_sink: Arc<dyn MetricsSink>,
) -> TestApp {
    init_test_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener
        .local_addr()
        .expect("Failed to read local address")
        .port();
    let address = format!("http://127.0.0.1:{port}");

    let api_key = generate_api_key();
    let config = ApiConfig {
        application: ApplicationSettings {
            host: "127.0.0.1".to_owned(),
            port,
        },
        api_key: api_key.clone(),
        retry: fast_retry(),
        sentry: None,
    };

    let server = run(config, listener, k8s_client, metrics_sink)
        .await
        .expect("Failed to build application");
    let server_handle = tokio::spawn(server);

    TestApp {
        address,
        api_client: reqwest::Client::new(),
        api_key,
        server_handle,
    }
}
