//! CLI command for data export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::config::settings::Settings;
use crate::error::{FinanceError, FinanceResult};
use crate::export::{export_full_json, export_full_yaml, import_from_json, import_from_yaml};
use crate::storage::Storage;

/// Export format options
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ExportFormat {
    /// JSON format
    #[default]
    Json,
    /// YAML format (human-readable)
    Yaml,
}

/// Handle `export`
///
/// Writes every record of the configured user, then reads the file back
/// to confirm it parses.
pub fn handle_export_command(
    storage: &Storage,
    settings: &Settings,
    output: PathBuf,
    format: ExportFormat,
    pretty: bool,
) -> FinanceResult<()> {
    let file = File::create(&output).map_err(|e| {
        FinanceError::Export(format!(
            "Failed to create file {}: {}",
            output.display(),
            e
        ))
    })?;
    let mut writer = BufWriter::new(file);

    match format {
        ExportFormat::Json => export_full_json(storage, settings.user_id, &mut writer, pretty)?,
        ExportFormat::Yaml => export_full_yaml(storage, settings.user_id, &mut writer)?,
    }
    writer
        .flush()
        .map_err(|e| FinanceError::Export(e.to_string()))?;
    drop(writer);

    let export = read_back(&output, format)?;
    let meta = &export.metadata;
    println!("Exported to: {}", output.display());
    println!(
        "  {} expenses, {} income, {} budgets, {} savings goals",
        meta.expense_count, meta.income_count, meta.budget_count, meta.goal_count
    );

    Ok(())
}

fn read_back(path: &Path, format: ExportFormat) -> FinanceResult<crate::export::FullExport> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| FinanceError::Export(format!("Failed to read back export: {}", e)))?;
    match format {
        ExportFormat::Json => import_from_json(&contents),
        ExportFormat::Yaml => import_from_yaml(&contents),
    }
}
