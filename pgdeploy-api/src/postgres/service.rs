use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::k8s::K8sError;
use crate::postgres::validator::ValidationError;

/// Request to provision a new Postgres deployment.
///
/// All fields must pass validation before the request reaches the cluster;
/// the request is immutable once validated.
#[derive(Clone)]
pub struct CreateRequest {
    /// Name of the database to create.
    pub db_name: String,
    /// Name of the owning user.
    pub user_name: String,
    /// Password of the owning user.
    pub user_pass: String,
    /// Port to expose on the pod's IP address.
    pub port_num: i32,
    /// Number of desired pods.
    pub replicas: i32,
    /// Storage capacity as a Kubernetes quantity string, e.g. "10Mi".
    pub capacity: String,
    /// Volume access mode, e.g. "ReadWriteOnce".
    pub access_mode: String,
}

/// Response to a successful create, carrying the generated identifier.
///
/// The identifier is a fresh UUID per call; creating the same database twice
/// yields two independent deployments.
#[derive(Debug, Clone)]
pub struct CreateResponse {
    pub id: String,
}

/// Request to scale a previously created deployment.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub id: String,
    /// Number of desired pods.
    pub replicas: i32,
}

/// Request to tear down a previously created deployment.
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub id: String,
}

/// The cluster resource kinds making up one provisioned deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    ConfigMap,
    PersistentVolume,
    PersistentVolumeClaim,
    Deployment,
    Service,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::ConfigMap => write!(f, "config map"),
            ResourceKind::PersistentVolume => write!(f, "persistent volume"),
            ResourceKind::PersistentVolumeClaim => write!(f, "persistent volume claim"),
            ResourceKind::Deployment => write!(f, "deployment"),
            ResourceKind::Service => write!(f, "service"),
        }
    }
}

/// Errors returned by [`PostgresService`] implementations.
#[derive(Debug, Error)]
pub enum PostgresServiceError {
    /// The request violated a domain constraint; nothing reached the cluster.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Creation failed after earlier resources were already submitted.
    ///
    /// The resources created before `step` are left in place and are not
    /// rolled back; issuing a delete for the identifier is the supported
    /// cleanup path.
    #[error("provisioning {id} failed while creating the {step}: {source}")]
    PartiallyCreated {
        id: String,
        step: ResourceKind,
        source: K8sError,
    },

    /// A cluster call failed before any resource was created, or outside of
    /// the create path.
    #[error(transparent)]
    Cluster(#[from] K8sError),
}

/// Capability set exposed to the remote API surface.
#[async_trait]
pub trait PostgresService: Send + Sync {
    /// Provisions a new deployment and returns its generated identifier.
    async fn create(
        &self,
        request: CreateRequest,
    ) -> Result<CreateResponse, PostgresServiceError>;

    /// Scales the deployment addressed by the request identifier.
    async fn update(&self, request: UpdateRequest) -> Result<(), PostgresServiceError>;

    /// Tears down the deployment addressed by the request identifier.
    async fn delete(&self, request: DeleteRequest) -> Result<(), PostgresServiceError>;
}

/// Pass-through implementation that accepts every request without touching a
/// cluster.
///
/// Used as the inner service when no Kubernetes client is available, and as a
/// terminal for exercising decorators in tests.
pub struct DefaultPostgresService;

#[async_trait]
impl PostgresService for DefaultPostgresService {
    async fn create(
        &self,
        _request: CreateRequest,
    ) -> Result<CreateResponse, PostgresServiceError> {
        Ok(CreateResponse { id: String::new() })
    }

    async fn update(&self, _request: UpdateRequest) -> Result<(), PostgresServiceError> {
        Ok(())
    }

    async fn delete(&self, _request: DeleteRequest) -> Result<(), PostgresServiceError> {
        Ok(())
    }
}
