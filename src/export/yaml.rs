//! YAML Export functionality
//!
//! Same content as the JSON export, in a form meant for people to read.

use std::io::Write;

use crate::error::{FinanceError, FinanceResult};
use crate::export::json::FullExport;
use crate::models::UserId;
use crate::storage::Storage;

/// Export a user's data to YAML
pub fn export_full_yaml<W: Write>(
    storage: &Storage,
    user: UserId,
    writer: &mut W,
) -> FinanceResult<()> {
    let export = FullExport::from_storage(storage, user)?;
    let io_err = |e: std::io::Error| FinanceError::Export(e.to_string());

    writeln!(writer, "# fintrack data export").map_err(io_err)?;
    writeln!(writer, "# Generated: {}", export.exported_at).map_err(io_err)?;
    writeln!(writer, "# App Version: {}", export.app_version).map_err(io_err)?;
    writeln!(writer, "#").map_err(io_err)?;
    writeln!(writer, "# Keep it secure - it contains all your financial data.").map_err(io_err)?;
    writeln!(writer).map_err(io_err)?;

    serde_yaml::to_writer(writer, &export).map_err(|e| FinanceError::Export(e.to_string()))?;

    Ok(())
}

/// Read back a YAML export
pub fn import_from_yaml(yaml_str: &str) -> FinanceResult<FullExport> {
    let export: FullExport =
        serde_yaml::from_str(yaml_str).map_err(|e| FinanceError::Import(e.to_string()))?;

    export.validate().map_err(FinanceError::Import)?;

    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExpenseCategory, Money};
    use crate::services::BudgetService;
    use crate::storage::testing::json_storage;

    #[test]
    fn test_yaml_export() {
        let (storage, _temp) = json_storage();
        BudgetService::new(&storage, UserId::default())
            .set_budget(ExpenseCategory::Entertainment, Money::from_dollars(80))
            .unwrap();

        let mut output = Vec::new();
        export_full_yaml(&storage, UserId::default(), &mut output).unwrap();
        let yaml = String::from_utf8(output).unwrap();

        assert!(yaml.starts_with("# fintrack data export"));
        assert!(yaml.contains("Entertainment"));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let (storage, _temp) = json_storage();
        BudgetService::new(&storage, UserId::default())
            .set_budget(ExpenseCategory::Food, Money::from_dollars(300))
            .unwrap();

        let mut output = Vec::new();
        export_full_yaml(&storage, UserId::default(), &mut output).unwrap();
        let yaml = String::from_utf8(output).unwrap();

        // Comment lines are valid YAML, but strip them to mirror a hand edit
        let content: String = yaml
            .lines()
            .filter(|line| !line.starts_with('#'))
            .collect::<Vec<_>>()
            .join("\n");

        let imported = import_from_yaml(&content).unwrap();
        assert_eq!(imported.budgets.len(), 1);
        assert_eq!(imported.budgets[0].limit, Money::from_dollars(300));
    }
}
