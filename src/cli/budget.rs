//! Budget CLI commands
//!
//! Implements CLI commands for monthly category budgets.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::{format_budget_list, format_budget_progress};
use crate::error::{FinanceError, FinanceResult};
use crate::models::{Money, Month};
use crate::services::BudgetService;
use crate::storage::Storage;

use super::{parse_amount, parse_category, today};

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set the monthly limit for a category (replaces any existing limit)
    Set {
        /// Category name
        category: String,

        /// Monthly limit (e.g., "300" or "300.00")
        limit: String,
    },

    /// List budgets
    List,

    /// Show spending against each budget for a month
    Status {
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Remove the budget for a category
    Remove {
        /// Category name
        category: String,
    },
}

/// Handle a budget command
pub fn handle_budget_command(
    storage: &Storage,
    settings: &Settings,
    cmd: BudgetCommands,
) -> FinanceResult<()> {
    let service = BudgetService::new(storage, settings.user_id);
    let symbol = settings.currency_symbol();

    match cmd {
        BudgetCommands::Set { category, limit } => {
            let category = parse_category(&category)?;
            let limit = parse_amount(&limit)?;
            let budget = service.set_budget(category, limit)?;
            println!(
                "Budget for {} set to {} per month",
                budget.category,
                budget.limit.format_with_symbol(symbol)
            );
        }

        BudgetCommands::List => {
            let budgets = service.list_budgets()?;
            println!("{}", format_budget_list(&budgets, symbol));
            if !budgets.is_empty() {
                let total: Money = budgets.iter().map(|b| b.limit).sum();
                println!("Total monthly budget: {}", total.format_with_symbol(symbol));
            }
        }

        BudgetCommands::Status { month } => {
            let month = match month {
                Some(m) => Month::parse(&m).map_err(FinanceError::Validation)?,
                None => Month::containing(today()),
            };
            let progress = service.budget_status(month)?;

            println!("Budget vs Actual: {}", month);
            println!("{}", "-".repeat(60));
            print!("{}", format_budget_progress(&progress, symbol));

            let over: Vec<_> = progress.iter().filter(|p| p.is_over()).collect();
            if !over.is_empty() {
                println!();
                for p in over {
                    println!(
                        "Over budget: {} by {}",
                        p.category,
                        (p.spent - p.limit).format_with_symbol(symbol)
                    );
                }
            }
        }

        BudgetCommands::Remove { category } => {
            let category = parse_category(&category)?;
            let removed = service.remove_budget(category)?;
            println!("Removed budget for {}", removed.category);
        }
    }

    Ok(())
}
