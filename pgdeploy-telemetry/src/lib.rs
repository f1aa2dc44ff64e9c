//! Telemetry for the pgdeploy services.
//!
//! Provides tracing initialization with environment-aware output (JSON files
//! in production, pretty terminal output in development) and installation of
//! the global prometheus metrics recorder.

pub mod metrics;
pub mod tracing;
