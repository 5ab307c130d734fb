//! JSON Export functionality
//!
//! Exports everything one user owns to JSON with schema versioning.

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FinanceError, FinanceResult};
use crate::models::{Budget, Expense, Income, SavingsGoal, User, UserId};
use crate::storage::Storage;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full export of one user's data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    /// The user row, if one has been created
    pub user: Option<User>,

    pub expenses: Vec<Expense>,

    pub income: Vec<Income>,

    pub budgets: Vec<Budget>,

    pub savings_goals: Vec<SavingsGoal>,

    /// Export metadata
    pub metadata: ExportMetadata,
}

/// Export metadata for reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub user_id: UserId,
    pub expense_count: usize,
    pub income_count: usize,
    pub budget_count: usize,
    pub goal_count: usize,

    /// Earliest expense or income date
    pub earliest_record: Option<String>,

    /// Latest expense or income date
    pub latest_record: Option<String>,
}

impl FullExport {
    /// Collect a user's data from storage
    pub fn from_storage(storage: &Storage, user_id: UserId) -> FinanceResult<Self> {
        let store = storage.store();
        let user = store.get_user(user_id)?;
        let expenses = store.list_expenses(user_id, None)?;
        let income = store.list_income(user_id, None)?;
        let budgets = store.list_budgets(user_id)?;
        let savings_goals = store.list_goals(user_id)?;

        let dates = || {
            expenses
                .iter()
                .map(|e| e.date)
                .chain(income.iter().map(|i| i.date))
        };

        let metadata = ExportMetadata {
            user_id,
            expense_count: expenses.len(),
            income_count: income.len(),
            budget_count: budgets.len(),
            goal_count: savings_goals.len(),
            earliest_record: dates().min().map(|d| d.to_string()),
            latest_record: dates().max().map(|d| d.to_string()),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            user,
            expenses,
            income,
            budgets,
            savings_goals,
            metadata,
        })
    }

    /// Validate the export structure
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let owner = self.metadata.user_id;
        if let Some(user) = &self.user {
            if user.id != owner {
                return Err(format!("User row {} does not match export owner {}", user.id, owner));
            }
        }

        let foreign = self
            .expenses
            .iter()
            .map(|e| e.user_id)
            .chain(self.income.iter().map(|i| i.user_id))
            .chain(self.budgets.iter().map(|b| b.user_id))
            .chain(self.savings_goals.iter().map(|g| g.user_id))
            .find(|id| *id != owner);
        if let Some(id) = foreign {
            return Err(format!("Record belongs to user {}, expected {}", id, owner));
        }

        let mut seen = HashSet::new();
        for budget in &self.budgets {
            if !seen.insert(budget.category) {
                return Err(format!("Duplicate budget for category {}", budget.category));
            }
        }

        Ok(())
    }
}

/// Export a user's data to JSON
pub fn export_full_json<W: Write>(
    storage: &Storage,
    user: UserId,
    writer: &mut W,
    pretty: bool,
) -> FinanceResult<()> {
    let export = FullExport::from_storage(storage, user)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| FinanceError::Export(e.to_string()))?;

    Ok(())
}

/// Read back a JSON export (for verification)
pub fn import_from_json(json_str: &str) -> FinanceResult<FullExport> {
    let export: FullExport =
        serde_json::from_str(json_str).map_err(|e| FinanceError::Import(e.to_string()))?;

    export.validate().map_err(FinanceError::Import)?;

    Ok(export)
}
