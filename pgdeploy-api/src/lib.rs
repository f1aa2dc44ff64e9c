//! Postgres provisioning API service.
//!
//! Exposes a REST API that provisions, scales, and tears down single-tenant
//! Postgres deployments on a Kubernetes cluster. Each logical database is
//! translated into a set of cluster resources (config map, persistent volume,
//! persistent volume claim, deployment, service) addressed by a generated
//! identifier. Includes authentication, operation metrics, Kubernetes
//! integration, and OpenAPI documentation.

pub mod authentication;
pub mod config;
pub mod k8s;
pub mod metrics;
pub mod postgres;
pub mod routes;
pub mod startup;
