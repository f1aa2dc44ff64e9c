use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapEnvSource, Container, ContainerPort, EnvFromSource, HostPathVolumeSource,
    PersistentVolume, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PersistentVolumeClaimVolumeSource, PersistentVolumeSpec, PodSpec, PodTemplateSpec, Service,
    ServicePort, ServiceSpec, Volume, VolumeMount, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

use crate::postgres::service::CreateRequest;

/// Name prefix of the config map carrying the database credentials.
pub const CONFIG_MAP_PREFIX: &str = "postgres-secret-";
/// Name prefix of the backing persistent volume.
pub const VOLUME_PREFIX: &str = "postgres-volume-";
/// Name prefix of the persistent volume claim.
pub const VOLUME_CLAIM_PREFIX: &str = "postgres-volume-claim-";
/// Name prefix of the service exposing the deployment.
pub const SERVICE_PREFIX: &str = "postgres-";

const APP_LABEL: &str = "app";
const APP_LABEL_VALUE: &str = "postgres";
/// Label scoping every resource to its deployment identifier, so concurrent
/// deployments never share a selector.
const INSTANCE_LABEL: &str = "instance";

const STORAGE_CLASS_NAME: &str = "manual";
/// Host-local backing path. Ties the volume to a single node, which is
/// acceptable for the targeted single-tenant topology.
const VOLUME_HOST_PATH: &str = "/data/postgresql";
const STORAGE_RESOURCE: &str = "storage";

const POSTGRES_IMAGE: &str = "postgres:14";
const IMAGE_PULL_POLICY: &str = "IfNotPresent";
const DATA_VOLUME_NAME: &str = "postgresdata";
const DATA_MOUNT_PATH: &str = "/var/lib/postgresql/data";

const SERVICE_TYPE: &str = "NodePort";

pub fn config_map_name(id: &str) -> String {
    format!("{CONFIG_MAP_PREFIX}{id}")
}

pub fn volume_name(id: &str) -> String {
    format!("{VOLUME_PREFIX}{id}")
}

pub fn volume_claim_name(id: &str) -> String {
    format!("{VOLUME_CLAIM_PREFIX}{id}")
}

pub fn service_name(id: &str) -> String {
    format!("{SERVICE_PREFIX}{id}")
}

/// The deployment is named by the bare identifier.
pub fn deployment_name(id: &str) -> String {
    id.to_owned()
}

/// The five cluster objects representing one provisioned deployment.
pub struct ResourceSet {
    pub config_map: ConfigMap,
    pub volume: PersistentVolume,
    pub volume_claim: PersistentVolumeClaim,
    pub deployment: Deployment,
    pub service: Service,
}

/// Deterministically maps a validated create request and a freshly generated
/// identifier onto the cluster objects to submit.
///
/// Pure construction, no I/O: the same request and identifier always produce
/// the same set.
pub fn resource_set(request: &CreateRequest, id: &str) -> ResourceSet {
    ResourceSet {
        config_map: config_map(request, id),
        volume: persistent_volume(request, id),
        volume_claim: persistent_volume_claim(request, id),
        deployment: deployment(request, id),
        service: service(request, id),
    }
}

fn instance_labels(id: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (APP_LABEL.to_owned(), APP_LABEL_VALUE.to_owned()),
        (INSTANCE_LABEL.to_owned(), id.to_owned()),
    ])
}

fn storage_capacity(request: &CreateRequest) -> BTreeMap<String, Quantity> {
    BTreeMap::from([(
        STORAGE_RESOURCE.to_owned(),
        Quantity(request.capacity.clone()),
    )])
}

fn config_map(request: &CreateRequest, id: &str) -> ConfigMap {
    let data = BTreeMap::from([
        ("POSTGRES_DB".to_owned(), request.db_name.clone()),
        ("POSTGRES_USER".to_owned(), request.user_name.clone()),
        ("POSTGRES_PASSWORD".to_owned(), request.user_pass.clone()),
    ]);

    ConfigMap {
        metadata: ObjectMeta {
            name: Some(config_map_name(id)),
            labels: Some(instance_labels(id)),
            ..ObjectMeta::default()
        },
        data: Some(data),
        ..ConfigMap::default()
    }
}

fn persistent_volume(request: &CreateRequest, id: &str) -> PersistentVolume {
    let mut labels = instance_labels(id);
    labels.insert("type".to_owned(), "local".to_owned());

    PersistentVolume {
        metadata: ObjectMeta {
            name: Some(volume_name(id)),
            labels: Some(labels),
            ..ObjectMeta::default()
        },
        spec: Some(PersistentVolumeSpec {
            storage_class_name: Some(STORAGE_CLASS_NAME.to_owned()),
            access_modes: Some(vec![request.access_mode.clone()]),
            capacity: Some(storage_capacity(request)),
            host_path: Some(HostPathVolumeSource {
                path: VOLUME_HOST_PATH.to_owned(),
                ..HostPathVolumeSource::default()
            }),
            ..PersistentVolumeSpec::default()
        }),
        ..PersistentVolume::default()
    }
}

fn persistent_volume_claim(request: &CreateRequest, id: &str) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(volume_claim_name(id)),
            labels: Some(instance_labels(id)),
            ..ObjectMeta::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec![request.access_mode.clone()]),
            storage_class_name: Some(STORAGE_CLASS_NAME.to_owned()),
            resources: Some(VolumeResourceRequirements {
                requests: Some(storage_capacity(request)),
                ..VolumeResourceRequirements::default()
            }),
            ..PersistentVolumeClaimSpec::default()
        }),
        ..PersistentVolumeClaim::default()
    }
}

fn deployment(request: &CreateRequest, id: &str) -> Deployment {
    let labels = instance_labels(id);

    Deployment {
        metadata: ObjectMeta {
            name: Some(deployment_name(id)),
            labels: Some(labels.clone()),
            ..ObjectMeta::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(request.replicas),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..LabelSelector::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..ObjectMeta::default()
                }),
                spec: Some(PodSpec {
                    volumes: Some(vec![Volume {
                        name: DATA_VOLUME_NAME.to_owned(),
                        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                            claim_name: volume_claim_name(id),
                            ..PersistentVolumeClaimVolumeSource::default()
                        }),
                        ..Volume::default()
                    }]),
                    containers: vec![Container {
                        name: APP_LABEL_VALUE.to_owned(),
                        image: Some(POSTGRES_IMAGE.to_owned()),
                        image_pull_policy: Some(IMAGE_PULL_POLICY.to_owned()),
                        ports: Some(vec![ContainerPort {
                            container_port: request.port_num,
                            ..ContainerPort::default()
                        }]),
                        env_from: Some(vec![EnvFromSource {
                            config_map_ref: Some(ConfigMapEnvSource {
                                name: config_map_name(id),
                                ..ConfigMapEnvSource::default()
                            }),
                            ..EnvFromSource::default()
                        }]),
                        volume_mounts: Some(vec![VolumeMount {
                            name: DATA_VOLUME_NAME.to_owned(),
                            mount_path: DATA_MOUNT_PATH.to_owned(),
                            ..VolumeMount::default()
                        }]),
                        ..Container::default()
                    }],
                    ..PodSpec::default()
                }),
            },
            ..DeploymentSpec::default()
        }),
        ..Deployment::default()
    }
}

fn service(request: &CreateRequest, id: &str) -> Service {
    let labels = instance_labels(id);

    Service {
        metadata: ObjectMeta {
            name: Some(service_name(id)),
            labels: Some(labels.clone()),
            ..ObjectMeta::default()
        },
        spec: Some(ServiceSpec {
            ports: Some(vec![ServicePort {
                port: request.port_num,
                ..ServicePort::default()
            }]),
            selector: Some(labels),
            type_: Some(SERVICE_TYPE.to_owned()),
            ..ServiceSpec::default()
        }),
        ..Service::default()
    }
}
