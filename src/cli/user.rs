//! User profile CLI commands

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::error::{FinanceError, FinanceResult};
use crate::models::Currency;
use crate::services::UserService;
use crate::storage::Storage;

/// User subcommands
#[derive(Subcommand)]
pub enum UserCommands {
    /// Show the profile
    Show,

    /// Change username or currency
    Update {
        /// New username
        #[arg(short, long)]
        name: Option<String>,

        /// New currency code (e.g., "EUR")
        #[arg(short, long)]
        currency: Option<String>,
    },

    /// Delete every record and the profile itself
    Delete {
        /// Required to actually delete
        #[arg(long)]
        confirm: bool,
    },
}

/// Handle a user command
pub fn handle_user_command(
    storage: &Storage,
    settings: &Settings,
    cmd: UserCommands,
) -> FinanceResult<()> {
    let service = UserService::new(storage, settings.user_id);

    match cmd {
        UserCommands::Show => {
            let user = service.current()?;
            println!("User:      {}", user.username);
            println!("ID:        {}", user.id);
            println!("Currency:  {} ({})", user.currency.code(), user.currency.symbol());
            println!("Created:   {}", user.created_at.format("%Y-%m-%d %H:%M"));
            println!("Updated:   {}", user.updated_at.format("%Y-%m-%d %H:%M"));
        }

        UserCommands::Update { name, currency } => {
            if name.is_none() && currency.is_none() {
                return Err(FinanceError::Validation(
                    "Nothing to update; pass --name or --currency".into(),
                ));
            }
            let currency = currency
                .map(|c| {
                    Currency::parse(&c).ok_or_else(|| {
                        FinanceError::Validation(format!("Unknown currency '{}'", c))
                    })
                })
                .transpose()?;

            let user = service.update_user(name, currency)?;
            println!("Updated user: {} ({})", user.username, user.currency.code());
        }

        UserCommands::Delete { confirm } => {
            if !confirm {
                println!(
                    "This permanently deletes all of your expenses, income, budgets and goals."
                );
                println!("Run 'fintrack user delete --confirm' to proceed.");
                return Ok(());
            }

            let deletion = service.delete_account()?;
            println!("Account deleted.");
            println!(
                "  Removed {} expenses, {} income records, {} budgets, {} savings goals",
                deletion.expenses, deletion.income, deletion.budgets, deletion.goals
            );
        }
    }

    Ok(())
}
