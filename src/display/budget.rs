//! Budget and savings goal display formatting

use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::models::{Budget, SavingsGoal};
use crate::services::{BudgetProgress, GoalTotals};

use super::report::{format_bar, format_percentage};

const BAR_WIDTH: usize = 20;

#[derive(Tabled)]
struct BudgetRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Monthly Limit")]
    limit: String,
    #[tabled(rename = "Period")]
    period: String,
}

#[derive(Tabled)]
struct GoalRow {
    #[tabled(rename = "Pri")]
    priority: u8,
    #[tabled(rename = "Goal")]
    name: String,
    #[tabled(rename = "Saved")]
    saved: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Progress")]
    progress: String,
}

pub fn format_budget_list(budgets: &[Budget], symbol: &str) -> String {
    if budgets.is_empty() {
        return "No budgets set.".to_string();
    }

    let rows = budgets.iter().map(|b| BudgetRow {
        category: b.category.to_string(),
        limit: b.limit.format_with_symbol(symbol),
        period: b.period.to_string(),
    });

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(1)).with(Alignment::right()))
        .to_string()
}

/// Budget vs actual, one bar per category
pub fn format_budget_progress(progress: &[BudgetProgress], symbol: &str) -> String {
    if progress.is_empty() {
        return "No budgets set.".to_string();
    }

    let name_width = progress
        .iter()
        .map(|p| p.category.to_string().len())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    for p in progress {
        let over = if p.is_over() { "  OVER" } else { "" };
        output.push_str(&format!(
            "{:<name_width$}  {} {:>5}  {:>12} of {:>12}{}\n",
            p.category.to_string(),
            format_bar(p.progress, 100.0, BAR_WIDTH),
            format_percentage(p.progress),
            p.spent.format_with_symbol(symbol),
            p.limit.format_with_symbol(symbol),
            over,
            name_width = name_width,
        ));
    }
    output
}

pub fn format_goal_table(goals: &[SavingsGoal], symbol: &str) -> String {
    if goals.is_empty() {
        return "No savings goals.".to_string();
    }

    let rows = goals.iter().map(|g| GoalRow {
        priority: g.priority,
        name: g.name.clone(),
        saved: g.current_amount.format_with_symbol(symbol),
        target: g.target_amount.format_with_symbol(symbol),
        due: g.target_date.to_string(),
        progress: format!(
            "{} {}",
            format_bar(g.progress(), 100.0, 10),
            format_percentage(g.progress())
        ),
    });

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..4)).with(Alignment::right()))
        .to_string()
}

pub fn format_goal_totals(totals: &GoalTotals, symbol: &str) -> String {
    format!(
        "Total saved: {} of {} ({})",
        totals.saved.format_with_symbol(symbol),
        totals.target.format_with_symbol(symbol),
        format_percentage(totals.progress)
    )
}
