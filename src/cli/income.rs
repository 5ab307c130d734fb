//! Income CLI commands
//!
//! Implements CLI commands for recording and reviewing income.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::report::format_percentage;
use crate::display::{format_income_details, format_income_table};
use crate::error::FinanceResult;
use crate::models::{Money, SummaryPeriod};
use crate::services::{IncomeUpdate, NewIncome, TransactionService};
use crate::storage::Storage;

use super::{list_window, parse_amount, parse_date_or, parse_source, today};

/// Income subcommands
#[derive(Subcommand)]
pub enum IncomeCommands {
    /// Record income
    Add {
        /// Amount (e.g., "3000" or "3000.00")
        amount: String,

        /// Source (e.g., "Salary", "Freelance")
        source: String,

        /// Description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List income
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

        /// Show totals by source instead of the list
        #[arg(short, long)]
        analyze: bool,
    },

    /// Show one income record
    Show {
        /// Income ID or prefix
        id: String,
    },

    /// Edit an income record
    Edit {
        /// Income ID or prefix
        id: String,

        /// New amount
        #[arg(short, long)]
        amount: Option<String>,

        /// New source
        #[arg(short, long)]
        source: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
}

/// Handle an income command
pub fn handle_income_command(
    storage: &Storage,
    settings: &Settings,
    cmd: IncomeCommands,
) -> FinanceResult<()> {
    let service = TransactionService::new(storage, settings.user_id);
    let symbol = settings.currency_symbol();

    match cmd {
        IncomeCommands::Add {
            amount,
            source,
            description,
            date,
        } => {
            let income = service.add_income(NewIncome {
                amount: parse_amount(&amount)?,
                source: parse_source(&source)?,
                date: parse_date_or(date.as_deref(), today())?,
                description,
            })?;

            println!(
                "Recorded {} from {} on {}",
                income.amount.format_with_symbol(symbol),
                income.source,
                income.date
            );
            println!("  ID: {}", income.id);
        }

        IncomeCommands::List {
            period,
            from,
            to,
            analyze,
        } => {
            let today = today();
            let window = list_window(period, from.as_deref(), to.as_deref(), today)?;

            if analyze {
                let window = window.unwrap_or_else(|| SummaryPeriod::Month.window_ending(today));
                let analysis = service.analyze_income(window)?;

                println!("Income Analysis: {}", analysis.window);
                println!("{}", "-".repeat(50));
                println!("Records:        {}", analysis.count);
                println!(
                    "Total:          {}",
                    analysis.total.format_with_symbol(symbol)
                );
                println!(
                    "Daily Average:  {}",
                    analysis.average_daily.format_with_symbol(symbol)
                );
                if !analysis.by_source.is_empty() {
                    println!();
                    println!("By Source:");
                    for (source, amount) in &analysis.by_source {
                        println!(
                            "  {:<16} {:>14} {:>6}",
                            source.to_string(),
                            amount.format_with_symbol(symbol),
                            format_percentage(amount.percent_of(analysis.total))
                        );
                    }
                }
                return Ok(());
            }

            let income = service.list_incomes(window)?;
            println!("{}", format_income_table(&income, symbol));
            if !income.is_empty() {
                let total: Money = income.iter().map(|i| i.amount).sum();
                println!(
                    "{} record(s), total {}",
                    income.len(),
                    total.format_with_symbol(symbol)
                );
            }
        }

        IncomeCommands::Show { id } => {
            let income = service.find_income(&id)?;
            println!("{}", format_income_details(&income, symbol));
        }

        IncomeCommands::Edit {
            id,
            amount,
            source,
            description,
            date,
        } => {
            let update = IncomeUpdate {
                amount: amount.as_deref().map(parse_amount).transpose()?,
                source: source.as_deref().map(parse_source).transpose()?,
                date: date
                    .as_deref()
                    .map(|d| parse_date_or(Some(d), today()))
                    .transpose()?,
                description,
            };
            let income = service.update_income(&id, update)?;
            println!("Updated income {}", income.id);
            println!("{}", format_income_details(&income, symbol));
        }
    }

    Ok(())
}
