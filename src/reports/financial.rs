//! Comprehensive financial report
//!
//! Summary totals, budget analysis and optional AI insights for one
//! period, rendered for the terminal or exported as CSV or JSON.

use std::io::Write;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{FinanceError, FinanceResult};
use crate::models::{Money, SummaryPeriod, UserId};
use crate::services::{BudgetUsage, FinancialSummary, GoalService, GoalTotals, SummaryService};
use crate::storage::Storage;

use crate::display::report::{double_separator, format_percentage, separator, status_colored};

const WIDTH: usize = 80;

/// Output format for `report`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Csv,
    Json,
}

/// Financial report for one period
#[derive(Debug, Clone, Serialize)]
pub struct FinancialReport {
    pub generated_at: DateTime<Utc>,
    pub period: SummaryPeriod,
    pub summary: FinancialSummary,
    pub goals: GoalTotals,
    /// Text from the insight generator, when one was asked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<String>,
}

impl FinancialReport {
    /// Build the report from the user's current data
    pub fn generate(
        storage: &Storage,
        user: UserId,
        period: SummaryPeriod,
        today: NaiveDate,
    ) -> FinanceResult<Self> {
        let summary = SummaryService::new(storage).financial_summary_at(user, period, today)?;
        let goals = GoalService::new(storage, user).totals()?;

        Ok(Self {
            generated_at: Utc::now(),
            period,
            summary,
            goals,
            insights: None,
        })
    }

    pub fn with_insights(mut self, insights: impl Into<String>) -> Self {
        self.insights = Some(insights.into());
        self
    }

    /// Budgets ordered from most to least used
    pub fn budget_analysis(&self) -> Vec<&BudgetUsage> {
        let mut usage: Vec<&BudgetUsage> = self.summary.budget_usage.values().collect();
        usage.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
        usage
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self, symbol: &str) -> String {
        let s = &self.summary;
        let mut output = String::new();

        output.push_str("Comprehensive Financial Report\n");
        output.push_str(&double_separator(WIDTH));
        output.push('\n');
        output.push_str(&format!(
            "Generated on: {}\n",
            self.generated_at.format("%Y-%m-%d")
        ));
        output.push_str(&format!("Period: {} ({})\n\n", self.period, s.window));

        output.push_str("1. Financial Summary\n");
        output.push_str(&separator(WIDTH));
        output.push('\n');
        output.push_str(&format!(
            "{:<20} {:>15}\n",
            "Total Income",
            s.total_income.format_with_symbol(symbol)
        ));
        output.push_str(&format!(
            "{:<20} {:>15}\n",
            "Total Expenses",
            s.total_expenses.format_with_symbol(symbol)
        ));
        output.push_str(&format!(
            "{:<20} {:>15}\n",
            "Net Balance",
            s.net_balance.format_with_symbol(symbol)
        ));
        output.push_str(&format!(
            "{:<20} {:>15}\n\n",
            "Savings Goals",
            format!(
                "{} / {}",
                self.goals.saved.format_with_symbol(symbol),
                self.goals.target.format_with_symbol(symbol)
            )
        ));

        output.push_str("2. Budget Analysis\n");
        output.push_str(&separator(WIDTH));
        output.push('\n');
        let analysis = self.budget_analysis();
        if analysis.is_empty() {
            output.push_str("No budget data available\n");
        } else {
            output.push_str(&format!(
                "{:<16} {:>12} {:>12} {:>12} {:>8}  {}\n",
                "Category", "Budget", "Spent", "Remaining", "Usage", "Status"
            ));
            for usage in analysis {
                output.push_str(&format!(
                    "{:<16} {:>12} {:>12} {:>12} {:>8}  {}\n",
                    usage.category.to_string(),
                    usage.limit.format_with_symbol(symbol),
                    usage.spent.format_with_symbol(symbol),
                    usage.remaining.format_with_symbol(symbol),
                    format_percentage(usage.percentage),
                    status_colored(usage.status())
                ));
            }
        }

        if let Some(insights) = &self.insights {
            output.push_str("\n3. AI-Powered Financial Insights\n");
            output.push_str(&separator(WIDTH));
            output.push('\n');
            output.push_str(insights.trim_end());
            output.push('\n');
        }

        output
    }

    /// Export the report to CSV
    ///
    /// One row per figure, grouped by section, so it opens cleanly in a
    /// spreadsheet.
    pub fn export_csv<W: Write>(&self, writer: W) -> FinanceResult<()> {
        let s = &self.summary;
        let mut csv = csv::Writer::from_writer(writer);

        write_row(
            &mut csv,
            ["section", "item", "limit", "amount", "remaining", "percentage", "status"],
        )?;

        let totals = [
            ("Total Income", s.total_income),
            ("Total Expenses", s.total_expenses),
            ("Net Balance", s.net_balance),
        ];
        for (item, amount) in totals {
            write_row(
                &mut csv,
                ["summary", item, "", &amount_field(amount), "", "", ""],
            )?;
        }

        for (category, amount) in &s.expenses_by_category {
            write_row(
                &mut csv,
                [
                    "expenses_by_category",
                    &category.to_string(),
                    "",
                    &amount_field(*amount),
                    "",
                    "",
                    "",
                ],
            )?;
        }

        for (source, amount) in &s.income_by_source {
            write_row(
                &mut csv,
                [
                    "income_by_source",
                    &source.to_string(),
                    "",
                    &amount_field(*amount),
                    "",
                    "",
                    "",
                ],
            )?;
        }

        for usage in self.budget_analysis() {
            write_row(
                &mut csv,
                [
                    "budget",
                    &usage.category.to_string(),
                    &amount_field(usage.limit),
                    &amount_field(usage.spent),
                    &amount_field(usage.remaining),
                    &format!("{:.1}", usage.percentage),
                    &usage.status().to_string(),
                ],
            )?;
        }

        csv.flush()
            .map_err(|e| FinanceError::Export(e.to_string()))?;
        Ok(())
    }

    /// Export the report to pretty JSON
    pub fn export_json<W: Write>(&self, writer: W) -> FinanceResult<()> {
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| FinanceError::Export(e.to_string()))
    }

    /// Write the report in the given format
    pub fn write<W: Write>(
        &self,
        format: ReportFormat,
        mut writer: W,
        symbol: &str,
    ) -> FinanceResult<()> {
        match format {
            ReportFormat::Text => writer
                .write_all(self.format_terminal(symbol).as_bytes())
                .map_err(|e| FinanceError::Export(e.to_string())),
            ReportFormat::Csv => self.export_csv(writer),
            ReportFormat::Json => self.export_json(writer),
        }
    }
}

fn write_row<W: Write>(csv: &mut csv::Writer<W>, fields: [&str; 7]) -> FinanceResult<()> {
    csv.write_record(fields)
        .map_err(|e| FinanceError::Export(e.to_string()))
}

/// Plain decimal without symbol or grouping
fn amount_field(amount: Money) -> String {
    format!("{:.2}", amount.as_f64())
}
