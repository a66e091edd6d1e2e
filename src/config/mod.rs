//! Configuration loading and management for the Attendance Derivation Engine.
//!
//! This module provides functionality to load engine settings, the
//! early-out deduction policy and a seed shift catalog from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use attendance_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/default").unwrap();
//! println!("Early-out rules enabled: {}", loader.config().early_out.enabled);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    CatalogConfig, DeductionRange, EarlyOutPolicy, EngineConfig, EngineSettings, MatchingConfig,
    MetricsConfig, PairingConfig,
};
