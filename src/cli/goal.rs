//! Savings goal CLI commands

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::{format_goal_table, format_goal_totals};
use crate::error::FinanceResult;
use crate::models::Money;
use crate::services::{GoalService, NewGoal};
use crate::storage::Storage;

use super::{parse_amount, parse_date_or, today};

/// Savings goal subcommands
#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a savings goal
    Add {
        /// Goal name
        name: String,

        /// Target amount
        target: String,

        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        by: String,

        /// Amount already saved
        #[arg(short, long)]
        current: Option<String>,

        /// Priority from 1 (highest) to 5
        #[arg(short, long, default_value_t = 1)]
        priority: u8,

        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List savings goals
    List,

    /// Set how much has been saved towards a goal
    Update {
        /// Goal name or ID prefix
        goal: String,

        /// Amount saved so far
        current: String,
    },

    /// Remove a savings goal
    Remove {
        /// Goal name or ID prefix
        goal: String,
    },
}

/// Handle a savings goal command
pub fn handle_goal_command(
    storage: &Storage,
    settings: &Settings,
    cmd: GoalCommands,
) -> FinanceResult<()> {
    let service = GoalService::new(storage, settings.user_id);
    let symbol = settings.currency_symbol();

    match cmd {
        GoalCommands::Add {
            name,
            target,
            by,
            current,
            priority,
            description,
        } => {
            let goal = service.add_goal(NewGoal {
                name,
                target_amount: parse_amount(&target)?,
                current_amount: match current {
                    Some(c) => parse_amount(&c)?,
                    None => Money::zero(),
                },
                target_date: parse_date_or(Some(by.as_str()), today())?,
                priority,
                description,
            })?;

            println!(
                "Created goal '{}': {} by {}",
                goal.name,
                goal.target_amount.format_with_symbol(symbol),
                goal.target_date
            );
            println!("  ID: {}", goal.id);
        }

        GoalCommands::List => {
            let goals = service.list_goals()?;
            println!("{}", format_goal_table(&goals, symbol));
            if !goals.is_empty() {
                println!("{}", format_goal_totals(&service.totals()?, symbol));
            }
        }

        GoalCommands::Update { goal, current } => {
            let goal = service.update_progress(&goal, parse_amount(&current)?)?;
            println!(
                "'{}': {} of {} saved",
                goal.name,
                goal.current_amount.format_with_symbol(symbol),
                goal.target_amount.format_with_symbol(symbol)
            );
            if goal.is_complete() {
                println!("Goal reached!");
            } else {
                println!("  Remaining: {}", goal.remaining().format_with_symbol(symbol));
            }
        }

        GoalCommands::Remove { goal } => {
            let removed = service.remove_goal(&goal)?;
            println!("Removed goal '{}'", removed.name);
        }
    }

    Ok(())
}
