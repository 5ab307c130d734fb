//! fintrack - personal finance tracking from the terminal
//!
//! This library provides the core functionality for the fintrack
//! application: recording expenses and income, monthly category budgets,
//! savings goals, and the summaries, dashboard views and reports built on
//! top of them.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (expenses, income, budgets, goals, users)
//! - `storage`: Record stores (JSON files or SQLite) behind one trait
//! - `audit`: Audit logging system
//! - `services`: Business logic layer
//! - `ai`: Text-generation client used for insights and extraction
//! - `display`: Terminal formatting
//! - `reports`: The comprehensive financial report
//! - `export`: Full data export to JSON and YAML
//! - `cli`: Command handlers for the binary
//!
//! # Example
//!
//! ```rust,ignore
//! use fintrack::config::{FinancePaths, Settings};
//! use fintrack::services::SummaryService;
//! use fintrack::storage::Storage;
//!
//! let paths = FinancePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(paths, settings.store_backend)?;
//! let summary = SummaryService::new(&storage)
//!     .financial_summary(settings.user_id, Default::default())?;
//! ```

pub mod ai;
pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

pub use error::{FinanceError, FinanceResult};
