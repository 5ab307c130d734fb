//! Expense CLI commands
//!
//! Implements recording, listing, analyzing and editing expenses, plus
//! the one-step `quick-add`.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::report::{format_percentage, status_colored};
use crate::display::{format_expense_details, format_expense_table};
use crate::error::FinanceResult;
use crate::models::{Money, SummaryPeriod};
use crate::services::{
    BudgetUsage, ExpenseUpdate, NewExpense, QuickAddKind, QuickAdded, TransactionService,
};
use crate::storage::Storage;

use super::{list_window, parse_amount, parse_category, parse_date_or, parse_payment_method, today};

/// Expense subcommands
#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense
    Add {
        /// Amount (e.g., "42.50")
        amount: String,

        /// Category (e.g., "Food", "Housing", "Debt Payments")
        category: String,

        /// Description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Payment method (e.g., "Cash", "Credit Card")
        #[arg(short, long)]
        method: Option<String>,

        /// Optional subcategory
        #[arg(short, long)]
        subcategory: Option<String>,
    },

    /// List expenses
    List {
        /// Only the last week, month or year
        #[arg(short, long)]
        period: Option<SummaryPeriod>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Only this category
        #[arg(short, long)]
        category: Option<String>,

        /// Show totals and breakdowns instead of the list
        #[arg(short, long)]
        analyze: bool,
    },

    /// Show one expense
    Show {
        /// Expense ID or prefix
        id: String,
    },

    /// Edit an expense
    Edit {
        /// Expense ID or prefix
        id: String,

        /// New amount
        #[arg(short, long)]
        amount: Option<String>,

        /// New category
        #[arg(short, long)]
        category: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// New payment method
        #[arg(short, long)]
        method: Option<String>,

        /// New subcategory
        #[arg(short, long)]
        subcategory: Option<String>,
    },
}

/// Handle an expense command
pub fn handle_expense_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ExpenseCommands,
) -> FinanceResult<()> {
    let service = TransactionService::new(storage, settings.user_id);
    let symbol = settings.currency_symbol();

    match cmd {
        ExpenseCommands::Add {
            amount,
            category,
            description,
            date,
            method,
            subcategory,
        } => {
            let payment_method = match method {
                Some(m) => parse_payment_method(&m)?,
                None => Default::default(),
            };
            let today = today();
            let recorded = service.add_expense(
                NewExpense {
                    amount: parse_amount(&amount)?,
                    category: parse_category(&category)?,
                    date: parse_date_or(date.as_deref(), today)?,
                    description,
                    payment_method,
                    subcategory,
                },
                today,
            )?;

            let expense = &recorded.expense;
            println!(
                "Recorded {} for {} on {}",
                expense.amount.format_with_symbol(symbol),
                expense.category,
                expense.date
            );
            println!("  ID: {}", expense.id);

            if let Some(usage) = &recorded.budget_usage {
                print_budget_line(usage, symbol);
            }
        }

        ExpenseCommands::List {
            period,
            from,
            to,
            category,
            analyze,
        } => {
            let today = today();
            let window = list_window(period, from.as_deref(), to.as_deref(), today)?;

            if analyze {
                let window = window.unwrap_or_else(|| SummaryPeriod::Month.window_ending(today));
                let analysis = service.analyze_expenses(window)?;

                println!("Expense Analysis: {}", analysis.window);
                println!("{}", "-".repeat(50));
                println!("Transactions:   {}", analysis.count);
                println!(
                    "Total:          {}",
                    analysis.total.format_with_symbol(symbol)
                );
                println!(
                    "Daily Average:  {}",
                    analysis.average_daily.format_with_symbol(symbol)
                );

                if !analysis.by_category.is_empty() {
                    println!();
                    println!("By Category:");
                    for (category, amount) in &analysis.by_category {
                        println!(
                            "  {:<16} {:>14} {:>6}",
                            category.to_string(),
                            amount.format_with_symbol(symbol),
                            format_percentage(amount.percent_of(analysis.total))
                        );
                    }
                }
                if !analysis.by_payment_method.is_empty() {
                    println!();
                    println!("By Payment Method:");
                    for (method, amount) in &analysis.by_payment_method {
                        println!(
                            "  {:<16} {:>14}",
                            method.to_string(),
                            amount.format_with_symbol(symbol)
                        );
                    }
                }
                return Ok(());
            }

            let mut expenses = service.list_expenses(window)?;
            if let Some(category) = category {
                let category = parse_category(&category)?;
                expenses.retain(|e| e.category == category);
            }

            println!("{}", format_expense_table(&expenses, symbol));
            if !expenses.is_empty() {
                let total: Money = expenses.iter().map(|e| e.amount).sum();
                println!(
                    "{} expense(s), total {}",
                    expenses.len(),
                    total.format_with_symbol(symbol)
                );
            }
        }

        ExpenseCommands::Show { id } => {
            let expense = service.find_expense(&id)?;
            println!("{}", format_expense_details(&expense, symbol));
        }

        ExpenseCommands::Edit {
            id,
            amount,
            category,
            description,
            date,
            method,
            subcategory,
        } => {
            let update = ExpenseUpdate {
                amount: amount.as_deref().map(parse_amount).transpose()?,
                category: category.as_deref().map(parse_category).transpose()?,
                date: date
                    .as_deref()
                    .map(|d| parse_date_or(Some(d), today()))
                    .transpose()?,
                description,
                payment_method: method.as_deref().map(parse_payment_method).transpose()?,
                subcategory,
            };
            let expense = service.update_expense(&id, update)?;
            println!("Updated expense {}", expense.id);
            println!("{}", format_expense_details(&expense, symbol));
        }
    }

    Ok(())
}

/// Handle `quick-add`
pub fn handle_quick_add_command(
    storage: &Storage,
    settings: &Settings,
    kind: QuickAddKind,
    amount: &str,
    label: &str,
) -> FinanceResult<()> {
    let service = TransactionService::new(storage, settings.user_id);
    let symbol = settings.currency_symbol();
    let amount = parse_amount(amount)?;

    match service.quick_add(kind, amount, label, today())? {
        QuickAdded::Expense(recorded) => {
            println!(
                "Added expense: {} ({})",
                recorded.expense.amount.format_with_symbol(symbol),
                recorded.expense.category
            );
            if let Some(usage) = &recorded.budget_usage {
                print_budget_line(usage, symbol);
            }
        }
        QuickAdded::Income(income) => {
            println!(
                "Added income: {} ({})",
                income.amount.format_with_symbol(symbol),
                income.source
            );
        }
    }

    Ok(())
}

fn print_budget_line(usage: &BudgetUsage, symbol: &str) {
    println!(
        "  Budget: {} of {} used ({}) {}",
        usage.spent.format_with_symbol(symbol),
        usage.limit.format_with_symbol(symbol),
        format_percentage(usage.percentage),
        status_colored(usage.status())
    );
    if usage.is_over() {
        println!(
            "  Warning: {} budget exceeded by {}",
            usage.category,
            (usage.spent - usage.limit).format_with_symbol(symbol)
        );
    }
}
