//! Configuration module for fintrack
//!
//! This module provides configuration management including:
//! - Path resolution (with a `FINTRACK_DATA_DIR` override)
//! - Persisted settings: store backend, text-generation service, currency

pub mod paths;
pub mod settings;

pub use paths::FinancePaths;
pub use settings::{AiProvider, AiSettings, Settings, StoreBackend};
