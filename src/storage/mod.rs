//! Storage layer for fintrack
//!
//! `RecordStore` is the seam; `JsonStore` (one JSON file per table, atomic
//! writes) and `SqliteStore` (embedded database) implement it. `Storage`
//! picks the backend from settings and carries the audit logger so
//! services can record what they change.

pub mod file_io;
pub mod json;
pub mod seed;
pub mod sqlite;
pub mod store;

pub use json::JsonStore;
pub use seed::{seed_demo, SeedSummary};
pub use sqlite::SqliteStore;
pub use store::{RecordStore, UserRecords};

use serde::Serialize;
use tracing::{debug, info};

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::{FinancePaths, StoreBackend};
use crate::error::FinanceResult;
use crate::models::UserId;

/// Main storage coordinator: the open record store plus the audit log
pub struct Storage {
    paths: FinancePaths,
    store: Box<dyn RecordStore>,
    audit: AuditLogger,
}

impl Storage {
    /// Open the configured backend under `paths`
    pub fn open(paths: FinancePaths, backend: StoreBackend) -> FinanceResult<Self> {
        paths.ensure_directories()?;

        let store: Box<dyn RecordStore> = match backend {
            StoreBackend::Json => Box::new(JsonStore::open(&paths)?),
            StoreBackend::Sqlite => Box::new(SqliteStore::open(&paths.database_file())?),
        };
        debug!(%backend, base_dir = %paths.base_dir().display(), "opened record store");

        Ok(Self::with_store(paths, store))
    }

    /// Wrap an already-open store
    pub fn with_store(paths: FinancePaths, store: Box<dyn RecordStore>) -> Self {
        let audit = AuditLogger::new(paths.audit_log());
        Self {
            paths,
            store,
            audit,
        }
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn backend(&self) -> StoreBackend {
        self.store.backend()
    }

    pub fn paths(&self) -> &FinancePaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Check if fintrack has been initialized (settings saved)
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> FinanceResult<()> {
        let entry = AuditEntry::create(entity_type, entity_id, entity_name, entity);
        info!(entity = %entity_type, id = %entry.entity_id, "created");
        self.audit.log(&entry)
    }

    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> FinanceResult<()> {
        let entry = AuditEntry::update(entity_type, entity_id, entity_name, before, after);
        info!(entity = %entity_type, id = %entry.entity_id, "updated");
        self.audit.log(&entry)
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> FinanceResult<()> {
        let entry = AuditEntry::delete(entity_type, entity_id, entity_name, entity);
        info!(entity = %entity_type, id = %entry.entity_id, "deleted");
        self.audit.log(&entry)
    }
    /// Replace all of the user's expenses, income, budgets and goals at once
    ///
    /// Returns the rows that were replaced. The audit log records each old
    /// row as a delete and each new row as a create, only after the store
    /// has committed the swap.
    pub fn replace_user_records(
        &self,
        user: UserId,
        records: &UserRecords,
    ) -> FinanceResult<UserRecords> {
        let store = self.store();
        let previous = UserRecords {
            expenses: store.list_expenses(user, None)?,
            income: store.list_income(user, None)?,
            budgets: store.list_budgets(user)?,
            goals: store.list_goals(user)?,
        };

        store.replace_user_records(user, records)?;

        for old in &previous.expenses {
            self.log_delete(EntityType::Expense, old.id.to_string(), None, old)?;
        }
        for old in &previous.income {
            self.log_delete(EntityType::Income, old.id.to_string(), None, old)?;
        }
        for old in &previous.budgets {
            let name = Some(old.category.to_string());
            self.log_delete(EntityType::Budget, old.id.to_string(), name, old)?;
        }
        for old in &previous.goals {
            let name = Some(old.name.clone());
            self.log_delete(EntityType::SavingsGoal, old.id.to_string(), name, old)?;
        }

        for new in &records.expenses {
            self.log_create(EntityType::Expense, new.id.to_string(), None, new)?;
        }
        for new in &records.income {
            self.log_create(EntityType::Income, new.id.to_string(), None, new)?;
        }
        for new in &records.budgets {
            let name = Some(new.category.to_string());
            self.log_create(EntityType::Budget, new.id.to_string(), name, new)?;
        }
        for new in &records.goals {
            let name = Some(new.name.clone());
            self.log_create(EntityType::SavingsGoal, new.id.to_string(), name, new)?;
        }

        Ok(previous)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_open_json_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FinancePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths, StoreBackend::Json).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert_eq!(storage.backend(), StoreBackend::Json);
        assert!(!storage.is_initialized());
    }

    #[test]
    fn test_open_sqlite_creates_database() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FinancePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths, StoreBackend::Sqlite).unwrap();

        assert_eq!(storage.backend(), StoreBackend::Sqlite);
        assert!(temp_dir.path().join("data").join("finance.db").exists());
    }

    #[test]
    fn test_log_helpers_append_to_audit_log() {
        let (storage, _temp) = testing::json_storage();
        storage
            .log_create(EntityType::Budget, "bud-1", None, &json!({"limit": 1}))
            .unwrap();
        storage
            .log_delete(EntityType::Budget, "bud-1", None, &json!({"limit": 1}))
            .unwrap();

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].operation, Operation::Delete);
    }

    #[test]
    fn test_replace_user_records_audits_after_swap() {
        use crate::models::{Budget, ExpenseCategory, Money};

        let (storage, _temp) = testing::sqlite_storage();
        let user = UserId::default();
        let old = Budget::new(user, ExpenseCategory::Food, Money::from_dollars(300));
        storage.store().upsert_budget(&old).unwrap();

        let records = UserRecords {
            budgets: vec![Budget::new(user, ExpenseCategory::Housing, Money::from_dollars(900))],
            ..Default::default()
        };
        let previous = storage.replace_user_records(user, &records).unwrap();
        assert_eq!(previous.budgets, vec![old.clone()]);

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation, Operation::Delete);
        assert_eq!(entries[0].entity_id, old.id.to_string());
        assert_eq!(entries[1].operation, Operation::Create);
    }
}
