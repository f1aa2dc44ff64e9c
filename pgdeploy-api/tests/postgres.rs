use std::sync::Arc;

use pgdeploy_api::routes::postgres::{
    CreatePostgresRequest, CreatePostgresResponse, UpdatePostgresRequest,
};
use reqwest::StatusCode;
use uuid::Uuid;

use crate::support::k8s::MockK8sClient;
use crate::support::metrics::RecordingMetricsSink;
use crate::support::test_app::spawn_test_app;

mod support;

fn create_request() -> CreatePostgresRequest {
    CreatePostgresRequest {
        db_name: "mottoDB".to_owned(),
        user_name: "omotto".to_owned(),
        user_pass: "123456a!".to_owned(),
        port_num: 5432,
        replicas: 2,
        capacity: "10Mi".to_owned(),
        access_mode: "ReadWriteMany".to_owned(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn create_returns_a_generated_identifier() {
    let k8s = Arc::new(MockK8sClient::default());
    let app = spawn_test_app(Some(k8s.clone()), Arc::new(RecordingMetricsSink::default())).await;

    let response = app.create_postgres(&create_request()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let response: CreatePostgresResponse = response.json().await.expect("invalid response body");
    assert!(Uuid::parse_str(&response.id).is_ok());
    assert_eq!(k8s.calls().len(), 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn create_with_a_short_password_is_rejected() {
    let k8s = Arc::new(MockK8sClient::default());
    let app = spawn_test_app(Some(k8s.clone()), Arc::new(RecordingMetricsSink::default())).await;

    // One char below the minimum password length of 8.
    let request = CreatePostgresRequest {
        user_pass: "123456a".to_owned(),
        ..create_request()
    };
    let response = app.create_postgres(&request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.text().await.expect("invalid response body");
    assert!(body.contains("invalid user_pass length of 7 chars"));
    assert!(k8s.calls().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn update_with_out_of_range_replicas_is_rejected() {
    let k8s = Arc::new(MockK8sClient::default());
    let app = spawn_test_app(Some(k8s.clone()), Arc::new(RecordingMetricsSink::default())).await;

    let response = app
        .update_postgres(
            &Uuid::new_v4().to_string(),
            &UpdatePostgresRequest { replicas: 11 },
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.text().await.expect("invalid response body");
    assert!(body.contains("invalid replicas value of 11"));
    assert!(k8s.calls().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn update_scales_an_existing_deployment() {
    let k8s = Arc::new(MockK8sClient::default());
    let app = spawn_test_app(Some(k8s.clone()), Arc::new(RecordingMetricsSink::default())).await;

    let response = app
        .update_postgres(
            &Uuid::new_v4().to_string(),
            &UpdatePostgresRequest { replicas: 4 },
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(k8s.calls().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_with_a_malformed_identifier_is_rejected() {
    let k8s = Arc::new(MockK8sClient::default());
    let app = spawn_test_app(Some(k8s.clone()), Arc::new(RecordingMetricsSink::default())).await;

    let response = app.delete_postgres("not-a-uuid").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.text().await.expect("invalid response body");
    assert!(body.contains("invalid not-a-uuid UUID format"));
    assert!(k8s.calls().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn create_then_delete_round_trip() {
    let k8s = Arc::new(MockK8sClient::default());
    let app = spawn_test_app(Some(k8s.clone()), Arc::new(RecordingMetricsSink::default())).await;

    let response = app.create_postgres(&create_request()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response: CreatePostgresResponse = response.json().await.expect("invalid response body");

    let response = app.delete_postgres(&response.id).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(k8s.calls().len(), 10);
}

#[tokio::test(flavor = "multi_thread")]
async fn requests_without_a_bearer_token_are_rejected() {
    let app = spawn_test_app(
        Some(Arc::new(MockK8sClient::default())),
        Arc::new(RecordingMetricsSink::default()),
    )
    .await;

    let response = app.create_postgres_unauthenticated(&create_request()).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread")]
async fn health_check_works() {
    let app = spawn_test_app(
        Some(Arc::new(MockK8sClient::default())),
        Arc::new(RecordingMetricsSink::default()),
    )
    .await;

    let response = app.health_check().await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.expect("invalid response body"), "ok");
}

#[tokio::test(flavor = "multi_thread")]
async fn metrics_endpoint_is_exposed_without_authentication() {
    let app = spawn_test_app(
        Some(Arc::new(MockK8sClient::default())),
        Arc::new(RecordingMetricsSink::default()),
    )
    .await;

    let response = app.metrics().await;

    assert_eq!(response.status(), StatusCode::OK);
}
