//! Summary and dashboard formatting

use crate::models::FlowRange;
use crate::services::{
    Advice, Conclusion, FinancialSummary, HealthIndicators, MonthlyFlow, MonthlyMetrics,
};

use super::report::{
    double_separator, format_bar, format_change, format_header, format_money_colored,
    format_percentage, separator, status_colored,
};

const WIDTH: usize = 60;
const BAR_WIDTH: usize = 24;

/// Totals, category breakdown and budget usage for one window
pub fn format_summary(summary: &FinancialSummary, symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format_header(
        &format!("Financial Summary: {}", summary.window),
        WIDTH,
    ));
    output.push('\n');
    output.push_str(&double_separator(WIDTH));
    output.push('\n');
    output.push_str(&format!(
        "Total Income:    {:>16}\n",
        summary.total_income.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "Total Expenses:  {:>16}\n",
        summary.total_expenses.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "Net Balance:     {:>16}\n",
        format_money_colored(summary.net_balance, symbol)
    ));
    output.push_str(&format!(
        "Savings Rate:    {:>16}\n",
        format_percentage(summary.savings_rate())
    ));

    if !summary.expenses_by_category.is_empty() {
        output.push_str("\nSpending by Category\n");
        output.push_str(&separator(WIDTH));
        output.push('\n');
        let max = summary
            .expenses_by_category
            .values()
            .map(|m| m.cents())
            .max()
            .unwrap_or(0) as f64;
        for (category, amount) in &summary.expenses_by_category {
            output.push_str(&format!(
                "{:<16} {} {:>14}\n",
                category.to_string(),
                format_bar(amount.cents() as f64, max, BAR_WIDTH),
                amount.format_with_symbol(symbol)
            ));
        }
    }

    if !summary.income_by_source.is_empty() {
        output.push_str("\nIncome by Source\n");
        output.push_str(&separator(WIDTH));
        output.push('\n');
        for (source, amount) in &summary.income_by_source {
            output.push_str(&format!(
                "{:<16} {:>14}\n",
                source.to_string(),
                amount.format_with_symbol(symbol)
            ));
        }
    }

    if !summary.budget_usage.is_empty() {
        output.push_str("\nBudget Usage\n");
        output.push_str(&separator(WIDTH));
        output.push('\n');
        for usage in summary.budget_usage.values() {
            output.push_str(&format!(
                "{:<16} {:>12} of {:>12} {:>6}  {}\n",
                usage.category.to_string(),
                usage.spent.format_with_symbol(symbol),
                usage.limit.format_with_symbol(symbol),
                format_percentage(usage.percentage),
                status_colored(usage.status())
            ));
        }
    }

    if summary.is_empty() {
        output.push_str("\nNo expenses or income recorded in this period.\n");
    }

    output
}

/// Current month against the previous one
pub fn format_metrics(metrics: &MonthlyMetrics, symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("This Month ({})\n", metrics.month));
    output.push_str(&separator(WIDTH));
    output.push('\n');
    output.push_str(&format!(
        "Spending:       {:>14}  {} vs last month\n",
        metrics.spending.format_with_symbol(symbol),
        format_change(metrics.spending_change)
    ));
    output.push_str(&format!(
        "Income:         {:>14}  {} vs last month\n",
        metrics.income.format_with_symbol(symbol),
        format_change(metrics.income_change)
    ));
    output.push_str(&format!(
        "Savings:        {:>14}  {} of goals\n",
        metrics.savings.saved.format_with_symbol(symbol),
        format_percentage(metrics.savings.progress)
    ));
    output.push_str(&format!(
        "Net Cash Flow:  {:>14}\n",
        format_money_colored(metrics.net_cash_flow, symbol)
    ));

    output
}

/// Monthly income and spending as paired bar rows
pub fn format_flow(flows: &[MonthlyFlow], range: FlowRange, symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Income vs Expenses: {}\n", range));
    output.push_str(&separator(WIDTH));
    output.push('\n');

    if flows.is_empty() {
        output.push_str("No transactions in this range.\n");
        return output;
    }

    let max = flows
        .iter()
        .flat_map(|f| [f.income.cents(), f.spending.cents()])
        .max()
        .unwrap_or(0) as f64;

    for flow in flows {
        output.push_str(&format!(
            "{}  in  {} {:>12}\n",
            flow.month,
            format_bar(flow.income.cents() as f64, max, BAR_WIDTH),
            flow.income.format_with_symbol(symbol)
        ));
        output.push_str(&format!(
            "         out {} {:>12}  net {}\n",
            format_bar(flow.spending.cents() as f64, max, BAR_WIDTH),
            flow.spending.format_with_symbol(symbol),
            format_money_colored(flow.savings, symbol)
        ));
    }

    output
}

pub fn format_health(health: &HealthIndicators) -> String {
    format!(
        "Average Savings Rate: {}\nExpense-to-Income Ratio: {}\n",
        format_percentage(health.average_savings_rate),
        format_percentage(health.expense_to_income_ratio)
    )
}

/// One line of month-end feedback
pub fn format_advice(advice: &Advice, symbol: &str) -> String {
    match advice {
        Advice::Saving(amount) => format!(
            "Great job! You're saving {} this month.",
            amount.format_with_symbol(symbol)
        ),
        Advice::Overspending(amount) => format!(
            "Caution: your spending exceeds your income by {} this month.",
            amount.format_with_symbol(symbol)
        ),
        Advice::GoalsAbove75 => {
            "Excellent progress! You're 75%+ towards your savings goals.".into()
        }
        Advice::GoalsAbove50 => "Good progress! You're halfway to your savings goals.".into(),
        Advice::GoalsBelow50 => {
            "Savings are below 50% of your goals. Consider increasing contributions.".into()
        }
        Advice::ReduceDiscretionary => "Reduce discretionary spending: your expenses are high \
             relative to income. Cut back on categories like Entertainment or Personal."
            .into(),
        Advice::MaintainDiscipline => "Maintain spending discipline: no reduction from last \
             month. Review high-cost categories such as Housing."
            .into(),
        Advice::BoostSavings(amount) => format!(
            "Boost savings: put an extra {} a month towards your goals.",
            amount.format_with_symbol(symbol)
        ),
    }
}

/// Month-end conclusion and recommendations
pub fn format_conclusion(conclusion: &Conclusion, symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Conclusion for {}\n", conclusion.month));
    output.push_str(&separator(WIDTH));
    output.push('\n');
    output.push_str(&format!(
        "Income this month:        {}\n",
        conclusion.income.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "Spending this month:      {}\n",
        conclusion.spending.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "Net this month:           {}\n",
        format_money_colored(conclusion.net, symbol)
    ));
    output.push_str(&format!(
        "Savings accumulated:      {} of {}\n",
        conclusion.savings.saved.format_with_symbol(symbol),
        conclusion.savings.target.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "Reduction vs last month:  {}\n\n",
        conclusion.spending_reduction.format_with_symbol(symbol)
    ));

    for advice in &conclusion.assessment {
        output.push_str(&format_advice(advice, symbol));
        output.push('\n');
    }

    if !conclusion.recommendations.is_empty() {
        output.push_str("\nRecommendations\n");
        for advice in &conclusion.recommendations {
            output.push_str(&format!("- {}\n", format_advice(advice, symbol)));
        }
    }

    output
}
