//! Configuration management for the pgdeploy services.
//!
//! Provides environment detection, configuration loading from YAML files
//! with environment variable overrides, and shared configuration types used
//! across the workspace.

mod environment;
mod load;
pub mod shared;

pub use environment::*;
pub use load::*;
