//! Expense and income display formatting

use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::models::{Expense, Income};

use super::report::truncate;

const DESCRIPTION_WIDTH: usize = 30;

#[derive(Tabled)]
struct ExpenseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Payment")]
    payment: String,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Tabled)]
struct IncomeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// Expenses as a table, amount column right-aligned
pub fn format_expense_table(expenses: &[Expense], symbol: &str) -> String {
    if expenses.is_empty() {
        return "No expenses found.".to_string();
    }

    let rows = expenses.iter().map(|e| {
        let category = match &e.subcategory {
            Some(sub) => format!("{} / {}", e.category, sub),
            None => e.category.to_string(),
        };
        ExpenseRow {
            id: e.id.to_string(),
            date: e.date.to_string(),
            category,
            amount: e.amount.format_with_symbol(symbol),
            payment: e.payment_method.to_string(),
            description: truncate(&e.description, DESCRIPTION_WIDTH),
        }
    });

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(3)).with(Alignment::right()))
        .to_string()
}

/// Income records as a table
pub fn format_income_table(income: &[Income], symbol: &str) -> String {
    if income.is_empty() {
        return "No income found.".to_string();
    }

    let rows = income.iter().map(|i| IncomeRow {
        id: i.id.to_string(),
        date: i.date.to_string(),
        source: i.source.to_string(),
        amount: i.amount.format_with_symbol(symbol),
        description: truncate(&i.description, DESCRIPTION_WIDTH),
    });

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(3)).with(Alignment::right()))
        .to_string()
}

/// One expense, one field per line
pub fn format_expense_details(expense: &Expense, symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Expense:     {}\n", expense.id));
    output.push_str(&format!("Date:        {}\n", expense.date));
    output.push_str(&format!(
        "Amount:      {}\n",
        expense.amount.format_with_symbol(symbol)
    ));
    output.push_str(&format!("Category:    {}\n", expense.category));
    if let Some(sub) = &expense.subcategory {
        output.push_str(&format!("Subcategory: {}\n", sub));
    }
    output.push_str(&format!("Payment:     {}\n", expense.payment_method));
    if !expense.description.is_empty() {
        output.push_str(&format!("Description: {}\n", expense.description));
    }

    output
}

/// One income record, one field per line
pub fn format_income_details(income: &Income, symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Income:      {}\n", income.id));
    output.push_str(&format!("Date:        {}\n", income.date));
    output.push_str(&format!(
        "Amount:      {}\n",
        income.amount.format_with_symbol(symbol)
    ));
    output.push_str(&format!("Source:      {}\n", income.source));
    if !income.description.is_empty() {
        output.push_str(&format!("Description: {}\n", income.description));
    }

    output
}
