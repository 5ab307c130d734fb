//! Display formatting for terminal output
//!
//! Tables for record lists, bar rows for breakdowns and the text views
//! behind `summary` and `dashboard`.

pub mod budget;
pub mod report;
pub mod summary;
pub mod transaction;

pub use budget::{format_budget_list, format_budget_progress, format_goal_table, format_goal_totals};
pub use summary::{format_conclusion, format_flow, format_health, format_metrics, format_summary};
pub use transaction::{
    format_expense_details, format_expense_table, format_income_details, format_income_table,
};
