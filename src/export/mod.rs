//! Export module for fintrack
//!
//! Full data export for one user:
//! - JSON: machine-readable, can be read back and validated
//! - YAML: the same content for people to read

pub mod json;
pub mod yaml;

pub use json::{export_full_json, import_from_json, FullExport, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_full_yaml, import_from_yaml};
