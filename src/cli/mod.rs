//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod budget;
pub mod export;
pub mod goal;
pub mod import;
pub mod income;
pub mod insight;
pub mod report;
pub mod transaction;
pub mod user;

pub use budget::{handle_budget_command, BudgetCommands};
pub use export::{handle_export_command, ExportFormat};
pub use goal::{handle_goal_command, GoalCommands};
pub use import::handle_import_command;
pub use income::{handle_income_command, IncomeCommands};
pub use insight::{handle_extract_command, handle_insights_command};
pub use report::{handle_dashboard_command, handle_report_command, handle_summary_command};
pub use transaction::{handle_expense_command, handle_quick_add_command, ExpenseCommands};
pub use user::{handle_user_command, UserCommands};

use chrono::{Local, NaiveDate};

use crate::error::{FinanceError, FinanceResult};
use crate::models::{DateWindow, ExpenseCategory, IncomeSource, Money, PaymentMethod, SummaryPeriod};

/// The local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn parse_amount(s: &str) -> FinanceResult<Money> {
    Money::parse(s).map_err(|e| FinanceError::Validation(format!("Invalid amount: {}", e)))
}

/// Parse a YYYY-MM-DD argument, defaulting to `default` when absent
pub(crate) fn parse_date_or(s: Option<&str>, default: NaiveDate) -> FinanceResult<NaiveDate> {
    match s {
        None => Ok(default),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            FinanceError::Validation(format!("Invalid date '{}'; use YYYY-MM-DD", s))
        }),
    }
}

pub(crate) fn parse_category(s: &str) -> FinanceResult<ExpenseCategory> {
    s.parse().map_err(|_| {
        FinanceError::Validation(format!(
            "Unknown category '{}'. Valid categories: {}",
            s,
            labels(ExpenseCategory::all().iter().map(|c| c.label()))
        ))
    })
}

pub(crate) fn parse_source(s: &str) -> FinanceResult<IncomeSource> {
    s.parse().map_err(|_| {
        FinanceError::Validation(format!(
            "Unknown income source '{}'. Valid sources: {}",
            s,
            labels(IncomeSource::all().iter().map(|c| c.label()))
        ))
    })
}

pub(crate) fn parse_payment_method(s: &str) -> FinanceResult<PaymentMethod> {
    s.parse().map_err(|_| {
        FinanceError::Validation(format!(
            "Unknown payment method '{}'. Valid methods: {}",
            s,
            labels(PaymentMethod::all().iter().map(|c| c.label()))
        ))
    })
}

fn labels<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// Window for list commands: explicit bounds win over a named period
pub(crate) fn list_window(
    period: Option<SummaryPeriod>,
    from: Option<&str>,
    to: Option<&str>,
    today: NaiveDate,
) -> FinanceResult<Option<DateWindow>> {
    if from.is_some() || to.is_some() {
        let start = parse_date_or(from, NaiveDate::MIN)?;
        let end = parse_date_or(to, today)?;
        return Ok(Some(DateWindow::new(start, end)));
    }
    Ok(period.map(|p| p.window_ending(today)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_amount("$12.50").unwrap(), Money::from_cents(1250));
        assert!(parse_amount("twelve").unwrap_err().is_validation());
        assert_eq!(parse_date_or(None, day(3)).unwrap(), day(3));
        assert_eq!(parse_date_or(Some("2025-04-09"), day(3)).unwrap(), day(9));
        assert!(parse_date_or(Some("09/04/2025"), day(3)).is_err());
    }

    #[test]
    fn test_unknown_category_lists_choices() {
        let err = parse_category("Snacks").unwrap_err().to_string();
        assert!(err.contains("Housing"));
        assert_eq!(parse_category("debt payments").unwrap(), ExpenseCategory::DebtPayments);
    }

    #[test]
    fn test_list_window() {
        assert_eq!(list_window(None, None, None, day(15)).unwrap(), None);

        let week = list_window(Some(SummaryPeriod::Week), None, None, day(15))
            .unwrap()
            .unwrap();
        assert_eq!(week.start, day(8));

        let explicit = list_window(Some(SummaryPeriod::Week), Some("2025-04-01"), None, day(15))
            .unwrap()
            .unwrap();
        assert_eq!(explicit, DateWindow::new(day(1), day(15)));
    }
}
