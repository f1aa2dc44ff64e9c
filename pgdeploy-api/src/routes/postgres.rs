use actix_web::{
    HttpResponse, Responder, ResponseError, delete,
    http::{StatusCode, header::ContentType},
    post,
    web::{Data, Json, Path},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::k8s::K8sError;
use crate::postgres::{
    CreateRequest, DeleteRequest, PostgresService, PostgresServiceError, UpdateRequest,
};
use crate::routes::ErrorMessage;

#[derive(Debug, Error)]
pub enum PostgresError {
    #[error(transparent)]
    Service(#[from] PostgresServiceError),
}

impl PostgresError {
    pub fn to_message(&self) -> String {
        match self {
            // Do not expose transport-level cluster details in error messages
            PostgresError::Service(PostgresServiceError::Cluster(K8sError::Kube(_)))
            | PostgresError::Service(PostgresServiceError::PartiallyCreated {
                source: K8sError::Kube(_),
                ..
            }) => "internal server error".to_string(),
            // Every other message is ok, as they do not divulge sensitive information
            e => e.to_string(),
        }
    }
}

impl ResponseError for PostgresError {
    fn status_code(&self) -> StatusCode {
        match self {
            PostgresError::Service(PostgresServiceError::Validation(_)) => StatusCode::BAD_REQUEST,
            PostgresError::Service(PostgresServiceError::Cluster(K8sError::NotFound { .. })) => {
                StatusCode::NOT_FOUND
            }
            PostgresError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_message = ErrorMessage {
            error: self.to_message(),
        };
        let body =
            serde_json::to_string(&error_message).expect("failed to serialize error message");
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(body)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePostgresRequest {
    #[schema(example = "inventory", required = true)]
    pub db_name: String,
    #[schema(example = "owner", required = true)]
    pub user_name: String,
    #[schema(example = "a-strong-password", required = true)]
    pub user_pass: String,
    #[schema(example = 5432, required = true)]
    pub port_num: i32,
    #[schema(example = 2, required = true)]
    pub replicas: i32,
    #[schema(example = "10Mi", required = true)]
    pub capacity: String,
    #[schema(example = "ReadWriteOnce", required = true)]
    pub access_mode: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePostgresResponse {
    #[schema(example = "8cbd2976-01c9-4a26-8503-cd4e9d53e2a6")]
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdatePostgresRequest {
    #[schema(example = 3, required = true)]
    pub replicas: i32,
}

#[utoipa::path(
    request_body = CreatePostgresRequest,
    responses(
        (status = 200, description = "Provision a new postgres deployment", body = CreatePostgresResponse),
        (status = 400, description = "Bad request", body = ErrorMessage),
        (status = 500, description = "Internal server error", body = ErrorMessage),
    ),
    tag = "Postgres"
)]
#[post("/postgres")]
pub async fn create_postgres(
    service: Data<dyn PostgresService>,
    request: Json<CreatePostgresRequest>,
) -> Result<impl Responder, PostgresError> {
    let request = request.into_inner();

    let response = service
        .create(CreateRequest {
            db_name: request.db_name,
            user_name: request.user_name,
            user_pass: request.user_pass,
            port_num: request.port_num,
            replicas: request.replicas,
            capacity: request.capacity,
            access_mode: request.access_mode,
        })
        .await?;

    let response = CreatePostgresResponse { id: response.id };

    Ok(Json(response))
}

#[utoipa::path(
    request_body = UpdatePostgresRequest,
    params(
        ("id" = String, Path, description = "Identifier of the postgres deployment"),
    ),
    responses(
        (status = 200, description = "Scale an existing postgres deployment"),
        (status = 400, description = "Bad request", body = ErrorMessage),
        (status = 404, description = "Deployment not found", body = ErrorMessage),
        (status = 500, description = "Internal server error", body = ErrorMessage),
    ),
    tag = "Postgres"
)]
#[post("/postgres/{id}")]
pub async fn update_postgres(
    service: Data<dyn PostgresService>,
    id: Path<String>,
    request: Json<UpdatePostgresRequest>,
) -> Result<impl Responder, PostgresError> {
    let id = id.into_inner();
    let request = request.into_inner();

    service
        .update(UpdateRequest {
            id,
            replicas: request.replicas,
        })
        .await?;

    Ok(HttpResponse::Ok().finish())
}

#[utoipa::path(
    params(
        ("id" = String, Path, description = "Identifier of the postgres deployment"),
    ),
    responses(
        (status = 200, description = "Tear down an existing postgres deployment"),
        (status = 400, description = "Bad request", body = ErrorMessage),
        (status = 404, description = "Deployment not found", body = ErrorMessage),
        (status = 500, description = "Internal server error", body = ErrorMessage),
    ),
    tag = "Postgres"
)]
#[delete("/postgres/{id}")]
pub async fn delete_postgres(
    service: Data<dyn PostgresService>,
    id: Path<String>,
) -> Result<impl Responder, PostgresError> {
    let id = id.into_inner();

    service.delete(DeleteRequest { id }).await?;

    Ok(HttpResponse::Ok().finish())
}
