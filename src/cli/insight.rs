//! CLI commands backed by the text generator

use std::path::Path;

use crate::ai::HttpTextGenerator;
use crate::config::settings::Settings;
use crate::error::{FinanceError, FinanceResult};
use crate::services::InsightService;
use crate::storage::Storage;

use super::today;

/// Handle `insights`
pub fn handle_insights_command(storage: &Storage, settings: &Settings) -> FinanceResult<()> {
    let generator = HttpTextGenerator::from_settings(settings)?;
    let insights = InsightService::new(storage, &generator).spending_insights(settings.user_id)?;

    println!("Spending Insights");
    println!("{}", "=".repeat(40));
    println!("{}", insights.trim_end());
    Ok(())
}

/// Handle `extract`
///
/// Reads a text document (statement export, receipt dump), asks the
/// generator for its transactions and optionally saves them as expenses.
pub fn handle_extract_command(
    storage: &Storage,
    settings: &Settings,
    file: &str,
    save: bool,
) -> FinanceResult<()> {
    let path = Path::new(file);
    let document = std::fs::read_to_string(path)
        .map_err(|e| FinanceError::Io(format!("Failed to read {}: {}", file, e)))?;

    let generator = HttpTextGenerator::from_settings(settings)?;
    let service = InsightService::new(storage, &generator);
    let items = service.extract_transactions(&document, document_kind(path))?;

    if items.is_empty() {
        println!("No transactions found in {}", file);
        return Ok(());
    }

    let symbol = settings.currency_symbol();
    println!("Found {} transaction(s):", items.len());
    for item in &items {
        println!(
            "  {}  {:<30} {:>12}  {}",
            item.date,
            item.description,
            item.money().format_with_symbol(symbol),
            item.category
        );
    }

    if save {
        let saved = service.save_extracted(settings.user_id, &items, today())?;
        println!("Saved {} expense(s).", saved);
        if saved < items.len() {
            println!(
                "Skipped {} with a zero amount or an over-long description.",
                items.len() - saved
            );
        }
    } else {
        println!("Run again with --save to record them as expenses.");
    }

    Ok(())
}

fn document_kind(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("csv") => "CSV",
        Some("json") => "JSON",
        Some("md") | Some("markdown") => "markdown",
        _ => "text",
    }
}
