use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use pgdeploy_config::shared::RetryConfig;
use tracing::{info, warn};
use uuid::Uuid;

use crate::k8s::{K8sClient, K8sError};
use crate::metrics::{
    DEPLOYMENT_ACCESS_FAILED_TOTAL, DEPLOYMENT_ACCESS_TOTAL, LABEL_ID, LABEL_OPERATION,
    MetricsSink, OPERATION_CREATE, OPERATION_DELETE, OPERATION_READ, OPERATION_UPDATE,
};
use crate::postgres::resources::{
    config_map_name, deployment_name, resource_set, service_name, volume_claim_name, volume_name,
};
use crate::postgres::retry::{ConflictRetryError, retry_on_conflict};
use crate::postgres::service::{
    CreateRequest, CreateResponse, DeleteRequest, PostgresService, PostgresServiceError,
    ResourceKind, UpdateRequest,
};

/// Sequences the cluster calls that provision, scale, and tear down one
/// Postgres deployment.
///
/// The provisioner owns the identifier lifecycle: a fresh UUID is generated
/// inside every create and becomes the addressing key for later update and
/// delete calls. It holds no in-process view of live state; every operation
/// re-reads or blind-writes against the cluster, so concurrent calls for
/// different identifiers are always safe and calls for the same identifier
/// resolve through the cluster's own version checks.
///
/// Failures mid-sequence are not rolled back. A create that dies after some
/// resources were submitted returns
/// [`PostgresServiceError::PartiallyCreated`]; re-issuing a delete for the
/// identifier removes whatever was left behind, since deletes tolerate
/// already-absent objects.
pub struct PostgresProvisioner {
    k8s: Arc<dyn K8sClient>,
    metrics: Arc<dyn MetricsSink>,
    retry: RetryConfig,
}

impl PostgresProvisioner {
    pub fn new(k8s: Arc<dyn K8sClient>, metrics: Arc<dyn MetricsSink>, retry: RetryConfig) -> Self {
        Self { k8s, metrics, retry }
    }

    fn record_attempt(&self, id: &str, operation: &'static str) {
        let _ = self.metrics.increase_counter(
            DEPLOYMENT_ACCESS_TOTAL,
            1,
            &[
                (LABEL_ID, id.to_owned()),
                (LABEL_OPERATION, operation.to_owned()),
            ],
        );
    }

    fn record_failure(&self, id: &str, operation: &'static str) {
        let _ = self.metrics.increase_counter(
            DEPLOYMENT_ACCESS_FAILED_TOTAL,
            1,
            &[
                (LABEL_ID, id.to_owned()),
                (LABEL_OPERATION, operation.to_owned()),
            ],
        );
    }
}

fn partial_failure(id: String, step: ResourceKind, source: K8sError) -> PostgresServiceError {
    warn!(
        id = %id,
        step = %step,
        "provisioning halted, resources created by earlier steps are left in place",
    );

    PostgresServiceError::PartiallyCreated { id, step, source }
}

/// Treats deletion of an already-absent object as success, so repeated
/// delete calls for the same identifier converge instead of failing.
fn tolerate_missing(result: Result<(), K8sError>) -> Result<(), K8sError> {
    match result {
        Err(error) if error.is_not_found() => Ok(()),
        other => other,
    }
}

#[async_trait]
impl PostgresService for PostgresProvisioner {
    async fn create(
        &self,
        request: CreateRequest,
    ) -> Result<CreateResponse, PostgresServiceError> {
        let id = Uuid::new_v4().to_string();
        self.record_attempt(&id, OPERATION_CREATE);

        let resources = resource_set(&request, &id);

        // The config map must exist before the deployment referencing it, and
        // the claim before the pods mounting it, hence the fixed order.
        self.k8s.create_config_map(resources.config_map).await?;

        if let Err(source) = self.k8s.create_persistent_volume(resources.volume).await {
            return Err(partial_failure(id, ResourceKind::PersistentVolume, source));
        }
        if let Err(source) = self
            .k8s
            .create_persistent_volume_claim(resources.volume_claim)
            .await
        {
            return Err(partial_failure(
                id,
                ResourceKind::PersistentVolumeClaim,
                source,
            ));
        }
        if let Err(source) = self.k8s.create_deployment(resources.deployment).await {
            self.record_failure(&id, OPERATION_CREATE);
            return Err(partial_failure(id, ResourceKind::Deployment, source));
        }
        if let Err(source) = self.k8s.create_service(resources.service).await {
            return Err(partial_failure(id, ResourceKind::Service, source));
        }

        info!(id = %id, "postgres deployment provisioned");

        Ok(CreateResponse { id })
    }

    async fn update(&self, request: UpdateRequest) -> Result<(), PostgresServiceError> {
        self.record_attempt(&request.id, OPERATION_UPDATE);

        let k8s = &self.k8s;
        let name = deployment_name(&request.id);
        let replicas = request.replicas;

        // Re-fetch the latest deployment on every attempt so a conflicted
        // write is reapplied against the current resource version.
        let result = retry_on_conflict(
            &self.retry,
            || k8s.get_deployment(&name),
            |deployment: &mut Deployment| {
                deployment.spec.get_or_insert_default().replicas = Some(replicas);
            },
            |deployment| k8s.update_deployment(deployment),
            K8sError::is_conflict,
        )
        .await;

        match result {
            Ok(()) => {
                info!(id = %request.id, replicas, "postgres deployment scaled");
                Ok(())
            }
            Err(ConflictRetryError::Fetch(error)) => {
                self.record_failure(&request.id, OPERATION_READ);
                Err(error.into())
            }
            Err(ConflictRetryError::Write(error)) => {
                self.record_failure(&request.id, OPERATION_UPDATE);
                Err(error.into())
            }
        }
    }

    async fn delete(&self, request: DeleteRequest) -> Result<(), PostgresServiceError> {
        self.record_attempt(&request.id, OPERATION_DELETE);

        let id = &request.id;

        // The deployment goes first so no pod outlives its backing claim;
        // later steps stop at the first failure and leave the rest in place.
        if let Err(error) = tolerate_missing(self.k8s.delete_deployment(&deployment_name(id)).await)
        {
            self.record_failure(id, OPERATION_DELETE);
            return Err(error.into());
        }
        tolerate_missing(self.k8s.delete_service(&service_name(id)).await)?;
        tolerate_missing(
            self.k8s
                .delete_persistent_volume_claim(&volume_claim_name(id))
                .await,
        )?;
        tolerate_missing(self.k8s.delete_persistent_volume(&volume_name(id)).await)?;
        tolerate_missing(self.k8s.delete_config_map(&config_map_name(id)).await)?;

        info!(id = %id, "postgres deployment deleted");

        Ok(())
    }
}
