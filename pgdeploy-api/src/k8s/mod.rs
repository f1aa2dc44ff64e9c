//! Kubernetes integration for the provisioning API.
//!
//! This module contains the abstractions and implementations used by the HTTP
//! API to manage the Kubernetes resources backing a provisioned Postgres
//! deployment (config maps, persistent volumes, persistent volume claims,
//! deployments, and services). Consumers should depend on the trait
//! [`K8sClient`] and avoid relying on a specific transport.
//!
//! The default client, [`http::HttpK8sClient`], is backed by the [`kube`]
//! crate and talks to the cluster using the ambient configuration (in-cluster
//! or local `~/.kube/config`). Keeping the abstraction in [`base`] lets us
//! swap implementations in tests and non-Kubernetes environments.

mod base;
pub mod http;

pub use base::*;
