//! Audit logging for fintrack
//!
//! Every create, update and delete made through the services is appended to
//! `audit.log` as one JSON line, with before/after snapshots of the record.
//!
//! - `AuditEntry`: timestamp, operation, entity, snapshots, change summary
//! - `AuditLogger`: JSONL writer and reader
//! - `generate_diff`: field-level change summary used by update entries

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
