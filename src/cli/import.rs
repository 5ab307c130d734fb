//! CLI command handler for CSV import
//!
//! The user's expenses, income, savings goals and budgets are replaced
//! wholesale by the file; malformed rows are reported and skipped.

use std::path::Path;

use crate::config::settings::Settings;
use crate::error::{FinanceError, FinanceResult};
use crate::services::ImportService;
use crate::storage::Storage;

use super::today;

/// Handle the import command
pub fn handle_import_command(
    storage: &Storage,
    settings: &Settings,
    file: &str,
) -> FinanceResult<()> {
    let path = Path::new(file);
    if !path.exists() {
        return Err(FinanceError::Import(format!("File not found: {}", file)));
    }

    let service = ImportService::new(storage, settings.user_id);
    let result = service.import_file(path, today())?;

    if result.total() == 0 {
        println!("No records found in CSV file.");
        if result.replaced > 0 {
            println!("Removed {} previous records", result.replaced);
        }
    } else {
        println!("Import Complete");
        println!("{}", "=".repeat(40));
        println!("  Expenses:        {}", result.expenses);
        println!("  Income:          {}", result.income);
        println!("  Savings goals:   {}", result.goals);
        println!("  Budgets:         {}", result.budgets);
        println!("  Replaced:        {} previous records", result.replaced);
    }

    if !result.warnings.is_empty() {
        println!();
        println!("Skipped or adjusted rows:");
        for warning in &result.warnings {
            println!("  {}", warning);
        }
    }

    Ok(())
}
