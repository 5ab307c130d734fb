//! Reports module for fintrack
//!
//! The comprehensive financial report: period summary, budget analysis
//! and optional AI insights.

pub mod financial;

pub use financial::{FinancialReport, ReportFormat};
