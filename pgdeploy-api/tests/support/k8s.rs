use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolume, PersistentVolumeClaim, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::ErrorResponse;
use pgdeploy_api::k8s::{K8sClient, K8sError};

/// Scriptable [`K8sClient`] that records every call it receives.
///
/// Failures are injected per method name; `conflicts` makes that many
/// `update_deployment` calls fail with a version conflict before one
/// succeeds.
#[derive(Default)]
pub struct MockK8sClient {
    calls: Mutex<Vec<String>>,
    fail_on: Option<&'static str>,
    not_found_on: Option<&'static str>,
    conflicts: AtomicU32,
}

impl MockK8sClient {
    /// Client that fails the named method with a generic cluster error.
    pub fn failing_on(method: &'static str) -> Self {
        Self {
            fail_on: Some(method),
            ..Self::default()
        }
    }

    /// Client that fails the named method with a not-found error.
    pub fn not_found_on(method: &'static str) -> Self {
        Self {
            not_found_on: Some(method),
            ..Self::default()
        }
    }

    /// Client whose next `count` deployment updates are rejected with a
    /// version conflict.
    pub fn with_conflicts(count: u32) -> Self {
        Self {
            conflicts: AtomicU32::new(count),
            ..Self::default()
        }
    }

    /// Every call received so far, as `method:name` entries in arrival order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, method: &str, name: &str) {
        self.calls.lock().unwrap().push(format!("{method}:{name}"));
    }

    fn check(&self, method: &'static str, name: &str) -> Result<(), K8sError> {
        if self.fail_on == Some(method) {
            return Err(generic_error());
        }
        if self.not_found_on == Some(method) {
            return Err(K8sError::NotFound {
                kind: "deployment",
                name: name.to_owned(),
            });
        }

        Ok(())
    }
}

fn generic_error() -> K8sError {
    K8sError::Kube(kube::Error::Api(ErrorResponse {
        status: "Failure".to_owned(),
        message: "the cluster is unhappy".to_owned(),
        reason: "InternalError".to_owned(),
        code: 500,
    }))
}

fn object_name(metadata: &ObjectMeta) -> String {
    metadata.name.clone().unwrap_or_default()
}

#[async_trait]
impl K8sClient for MockK8sClient {
    async fn create_config_map(&self, config_map: ConfigMap) -> Result<(), K8sError> {
        let name = object_name(&config_map.metadata);
        self.record("create_config_map", &name);
        self.check("create_config_map", &name)
    }

    async fn create_persistent_volume(&self, volume: PersistentVolume) -> Result<(), K8sError> {
        let name = object_name(&volume.metadata);
        self.record("create_persistent_volume", &name);
        self.check("create_persistent_volume", &name)
    }

    async fn create_persistent_volume_claim(
        &self,
        claim: PersistentVolumeClaim,
    ) -> Result<(), K8sError> {
        let name = object_name(&claim.metadata);
        self.record("create_persistent_volume_claim", &name);
        self.check("create_persistent_volume_claim", &name)
    }

    async fn create_deployment(&self, deployment: Deployment) -> Result<(), K8sError> {
        let name = object_name(&deployment.metadata);
        self.record("create_deployment", &name);
        self.check("create_deployment", &name)
    }

    async fn create_service(&self, service: Service) -> Result<(), K8sError> {
        let name = object_name(&service.metadata);
        self.record("create_service", &name);
        self.check("create_service", &name)
    }

    async fn get_deployment(&self, name: &str) -> Result<Deployment, K8sError> {
        self.record("get_deployment", name);
        self.check("get_deployment", name)?;

        Ok(Deployment {
            metadata: ObjectMeta {
                name: Some(name.to_owned()),
                resource_version: Some("1".to_owned()),
                ..ObjectMeta::default()
            },
            ..Deployment::default()
        })
    }

    async fn update_deployment(&self, deployment: Deployment) -> Result<(), K8sError> {
        let name = object_name(&deployment.metadata);
        self.record("update_deployment", &name);
        self.check("update_deployment", &name)?;

        let remaining = self.conflicts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.conflicts.store(remaining - 1, Ordering::SeqCst);
            return Err(K8sError::Conflict {
                kind: "deployment",
                name,
            });
        }

        Ok(())
    }

    async fn delete_deployment(&self, name: &str) -> Result<(), K8sError> {
        self.record("delete_deployment", name);
        self.check("delete_deployment", name)
    }

    async fn delete_service(&self, name: &str) -> Result<(), K8sError> {
        self.record("delete_service", name);
        self.check("delete_service", name)
    }

    async fn delete_persistent_volume_claim(&self, name: &str) -> Result<(), K8sError> {
        self.record("delete_persistent_volume_claim", name);
        self.check("delete_persistent_volume_claim", name)
    }

    async fn delete_persistent_volume(&self, name: &str) -> Result<(), K8sError> {
        self.record("delete_persistent_volume", name);
        self.check("delete_persistent_volume", name)
    }

    async fn delete_config_map(&self, name: &str) -> Result<(), K8sError> {
        self.record("delete_config_map", name);
        self.check("delete_config_map", name)
    }
}
