use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolume, PersistentVolumeClaim, Service};
use thiserror::Error;

/// Errors emitted by the Kubernetes integration.
///
/// The first two variants carry the cluster failure modes the provisioning
/// logic reacts to; every other error is wrapped unmodified.
#[derive(Debug, Error)]
pub enum K8sError {
    /// The addressed object does not exist in the cluster.
    #[error("the {kind} named {name} was not found in the cluster")]
    NotFound { kind: &'static str, name: String },

    /// A write was rejected because the object's version changed since it was
    /// last read.
    #[error("the write to the {kind} named {name} conflicted with a concurrent update")]
    Conflict { kind: &'static str, name: String },

    /// An error returned by the [`kube`] client when talking to the API
    /// server.
    #[error("an error occurred with kube when dealing with K8s: {0}")]
    Kube(#[from] kube::Error),
}

impl K8sError {
    /// Returns whether this error signals a missing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, K8sError::NotFound { .. })
    }

    /// Returns whether this error signals a stale-version write rejection.
    pub fn is_conflict(&self) -> bool {
        matches!(self, K8sError::Conflict { .. })
    }
}

/// Client interface describing the Kubernetes operations used by the
/// provisioning service.
///
/// One method per resource kind and verb, so callers state exactly which
/// object they touch. Implementations map the cluster's native not-found and
/// version-conflict signals onto [`K8sError::NotFound`] and
/// [`K8sError::Conflict`].
#[async_trait]
pub trait K8sClient: Send + Sync {
    /// Creates the config map carrying the database credentials.
    async fn create_config_map(&self, config_map: ConfigMap) -> Result<(), K8sError>;

    /// Creates the persistent volume backing the database storage.
    async fn create_persistent_volume(&self, volume: PersistentVolume) -> Result<(), K8sError>;

    /// Creates the claim binding a deployment to its persistent volume.
    async fn create_persistent_volume_claim(
        &self,
        claim: PersistentVolumeClaim,
    ) -> Result<(), K8sError>;

    /// Creates the [`Deployment`] running the database pods.
    async fn create_deployment(&self, deployment: Deployment) -> Result<(), K8sError>;

    /// Creates the [`Service`] exposing the database port.
    async fn create_service(&self, service: Service) -> Result<(), K8sError>;

    /// Retrieves the named [`Deployment`], including its current resource
    /// version.
    async fn get_deployment(&self, name: &str) -> Result<Deployment, K8sError>;

    /// Replaces the [`Deployment`] on the cluster.
    ///
    /// Fails with [`K8sError::Conflict`] when the resource version carried by
    /// `deployment` is stale.
    async fn update_deployment(&self, deployment: Deployment) -> Result<(), K8sError>;

    /// Deletes the named [`Deployment`] with foreground cascading, so
    /// dependent pods are removed before the deletion completes.
    async fn delete_deployment(&self, name: &str) -> Result<(), K8sError>;

    /// Deletes the named [`Service`].
    async fn delete_service(&self, name: &str) -> Result<(), K8sError>;

    /// Deletes the named [`PersistentVolumeClaim`].
    async fn delete_persistent_volume_claim(&self, name: &str) -> Result<(), K8sError>;

    /// Deletes the named [`PersistentVolume`].
    async fn delete_persistent_volume(&self, name: &str) -> Result<(), K8sError>;

    /// Deletes the named [`ConfigMap`].
    async fn delete_config_map(&self, name: &str) -> Result<(), K8sError>;
}
