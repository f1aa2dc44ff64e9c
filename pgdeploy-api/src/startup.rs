use std::{net::TcpListener, sync::Arc};

use actix_web::{App, HttpServer, dev::Server, web, web::Data};
use actix_web_httpauth::middleware::HttpAuthentication;
use pgdeploy_telemetry::metrics::init_metrics_handle;
use tracing::warn;
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    authentication::auth_validator,
    config::ApiConfig,
    k8s::{K8sClient, http::HttpK8sClient},
    metrics::{MetricsSink, PrometheusSink},
    postgres::{
        DefaultPostgresService, PostgresProvisioner, PostgresService, ValidatedPostgresService,
    },
    routes::{
        ErrorMessage,
        health_check::health_check,
        metrics::metrics,
        postgres::{
            CreatePostgresRequest, CreatePostgresResponse, UpdatePostgresRequest, create_postgres,
            delete_postgres, update_postgres,
        },
    },
};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(config: ApiConfig) -> Result<Self, anyhow::Error> {
        let address = format!("{}:{}", config.application.host, config.application.port);
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let k8s_client = match HttpK8sClient::new().await {
            Ok(client) => Some(Arc::new(client) as Arc<dyn K8sClient>),
            Err(e) => {
                warn!(
                    "Failed to create Kubernetes client: {}. Running without Kubernetes support.",
                    e
                );
                None
            }
        };

        let metrics_sink = Arc::new(PrometheusSink::new());

        let server = run(config, listener, k8s_client, metrics_sink).await?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

// The Kubernetes client is passed in as an option so tests can run the full
// application against a mock without any ambient cluster configuration; when
// it is absent, requests are validated and accepted without touching a
// cluster.
pub async fn run(
    config: ApiConfig,
    listener: TcpListener,
    k8s_client: Option<Arc<dyn K8sClient>>,
    metrics_sink: Arc<dyn MetricsSink>,
) -> Result<Server, anyhow::Error> {
    let prometheus_handle = init_metrics_handle()?;

    // The validating decorator is composed here, at construction time: it
    // wraps the real provisioner when a cluster is reachable and the
    // pass-through service otherwise.
    let service: Arc<dyn PostgresService> = match k8s_client {
        Some(k8s) => Arc::new(ValidatedPostgresService::new(PostgresProvisioner::new(
            k8s,
            metrics_sink,
            config.retry.clone(),
        ))),
        None => Arc::new(ValidatedPostgresService::new(DefaultPostgresService)),
    };

    let config = Data::new(config);
    let service: Data<dyn PostgresService> = Data::from(service);

    #[derive(OpenApi)]
    #[openapi(
        paths(
            crate::routes::health_check::health_check,
            crate::routes::metrics::metrics,
            crate::routes::postgres::create_postgres,
            crate::routes::postgres::update_postgres,
            crate::routes::postgres::delete_postgres,
        ),
        components(schemas(
            ErrorMessage,
            CreatePostgresRequest,
            CreatePostgresResponse,
            UpdatePostgresRequest,
        ))
    )]
    struct ApiDoc;

    let server = HttpServer::new(move || {
        let auth = HttpAuthentication::bearer(auth_validator);

        App::new()
            .wrap(TracingLogger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
            .service(health_check)
            .service(metrics)
            .service(
                web::scope("/v1")
                    .wrap(auth)
                    .service(create_postgres)
                    .service(update_postgres)
                    .service(delete_postgres),
            )
            .app_data(config.clone())
            .app_data(service.clone())
            .app_data(web::ThinData(prometheus_handle.clone()))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
