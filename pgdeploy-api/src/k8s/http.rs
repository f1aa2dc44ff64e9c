use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolume, PersistentVolumeClaim, Service};
use kube::Client;
use kube::api::{Api, DeleteParams, PostParams};
use tracing::info;

use crate::k8s::base::{K8sClient, K8sError};

const CONFIG_MAP_KIND: &str = "config map";
const VOLUME_KIND: &str = "persistent volume";
const VOLUME_CLAIM_KIND: &str = "persistent volume claim";
const DEPLOYMENT_KIND: &str = "deployment";
const SERVICE_KIND: &str = "service";

/// [`K8sClient`] backed by the [`kube`] crate.
///
/// Talks to the cluster using the ambient configuration (in-cluster or local
/// `~/.kube/config`). Namespaced resources live in the default namespace;
/// persistent volumes are cluster scoped.
pub struct HttpK8sClient {
    config_maps_api: Api<ConfigMap>,
    volumes_api: Api<PersistentVolume>,
    volume_claims_api: Api<PersistentVolumeClaim>,
    deployments_api: Api<Deployment>,
    services_api: Api<Service>,
}

impl HttpK8sClient {
    /// Creates a client from the ambient Kubernetes configuration.
    pub async fn new() -> Result<HttpK8sClient, K8sError> {
        let client = Client::try_default().await?;

        let config_maps_api = Api::default_namespaced(client.clone());
        let volumes_api = Api::all(client.clone());
        let volume_claims_api = Api::default_namespaced(client.clone());
        let deployments_api = Api::default_namespaced(client.clone());
        let services_api = Api::default_namespaced(client);

        Ok(HttpK8sClient {
            config_maps_api,
            volumes_api,
            volume_claims_api,
            deployments_api,
            services_api,
        })
    }
}

/// Maps a [`kube::Error`] onto the domain failure modes.
///
/// The API server signals a missing object with 404 and a stale resource
/// version with 409; everything else passes through unmodified.
fn classify(kind: &'static str, name: &str, error: kube::Error) -> K8sError {
    match error {
        kube::Error::Api(ref response) if response.code == 404 => K8sError::NotFound {
            kind,
            name: name.to_owned(),
        },
        kube::Error::Api(ref response) if response.code == 409 => K8sError::Conflict {
            kind,
            name: name.to_owned(),
        },
        error => K8sError::Kube(error),
    }
}

fn object_name(metadata_name: &Option<String>) -> String {
    metadata_name.clone().unwrap_or_default()
}

#[async_trait]
impl K8sClient for HttpK8sClient {
    async fn create_config_map(&self, config_map: ConfigMap) -> Result<(), K8sError> {
        let name = object_name(&config_map.metadata.name);
        info!(%name, "creating config map");

        self.config_maps_api
            .create(&PostParams::default(), &config_map)
            .await
            .map_err(|e| classify(CONFIG_MAP_KIND, &name, e))?;

        Ok(())
    }

    async fn create_persistent_volume(&self, volume: PersistentVolume) -> Result<(), K8sError> {
        let name = object_name(&volume.metadata.name);
        info!(%name, "creating persistent volume");

        self.volumes_api
            .create(&PostParams::default(), &volume)
            .await
            .map_err(|e| classify(VOLUME_KIND, &name, e))?;

        Ok(())
    }

    async fn create_persistent_volume_claim(
        &self,
        claim: PersistentVolumeClaim,
    ) -> Result<(), K8sError> {
        let name = object_name(&claim.metadata.name);
        info!(%name, "creating persistent volume claim");

        self.volume_claims_api
            .create(&PostParams::default(), &claim)
            .await
            .map_err(|e| classify(VOLUME_CLAIM_KIND, &name, e))?;

        Ok(())
    }

    async fn create_deployment(&self, deployment: Deployment) -> Result<(), K8sError> {
        let name = object_name(&deployment.metadata.name);
        info!(%name, "creating deployment");

        self.deployments_api
            .create(&PostParams::default(), &deployment)
            .await
            .map_err(|e| classify(DEPLOYMENT_KIND, &name, e))?;

        Ok(())
    }

    async fn create_service(&self, service: Service) -> Result<(), K8sError> {
        let name = object_name(&service.metadata.name);
        info!(%name, "creating service");

        self.services_api
            .create(&PostParams::default(), &service)
            .await
            .map_err(|e| classify(SERVICE_KIND, &name, e))?;

        Ok(())
    }

    async fn get_deployment(&self, name: &str) -> Result<Deployment, K8sError> {
        let deployment = self
            .deployments_api
            .get(name)
            .await
            .map_err(|e| classify(DEPLOYMENT_KIND, name, e))?;

        Ok(deployment)
    }

    async fn update_deployment(&self, deployment: Deployment) -> Result<(), K8sError> {
        let name = object_name(&deployment.metadata.name);
        info!(%name, "updating deployment");

        self.deployments_api
            .replace(&name, &PostParams::default(), &deployment)
            .await
            .map_err(|e| classify(DEPLOYMENT_KIND, &name, e))?;

        Ok(())
    }

    async fn delete_deployment(&self, name: &str) -> Result<(), K8sError> {
        info!(%name, "deleting deployment");

        // Foreground propagation so dependent pods are gone before the
        // deletion is reported complete.
        self.deployments_api
            .delete(name, &DeleteParams::foreground())
            .await
            .map_err(|e| classify(DEPLOYMENT_KIND, name, e))?;

        Ok(())
    }

    async fn delete_service(&self, name: &str) -> Result<(), K8sError> {
        info!(%name, "deleting service");

        self.services_api
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| classify(SERVICE_KIND, name, e))?;

        Ok(())
    }

    async fn delete_persistent_volume_claim(&self, name: &str) -> Result<(), K8sError> {
        info!(%name, "deleting persistent volume claim");

        self.volume_claims_api
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| classify(VOLUME_CLAIM_KIND, name, e))?;

        Ok(())
    }

    async fn delete_persistent_volume(&self, name: &str) -> Result<(), K8sError> {
        info!(%name, "deleting persistent volume");

        self.volumes_api
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| classify(VOLUME_KIND, name, e))?;

        Ok(())
    }

    async fn delete_config_map(&self, name: &str) -> Result<(), K8sError> {
        info!(%name, "deleting config map");

        self.config_maps_api
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| classify(CONFIG_MAP_KIND, name, e))?;

        Ok(())
    }
}
