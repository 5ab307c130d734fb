//! JSON file backend
//!
//! One file per table under the data directory. Each table is loaded the
//! first time it is used, kept behind an `RwLock`, and written back
//! atomically after every change. A damaged file only fails the commands
//! that touch its table.

use std::ops::Deref;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::config::{FinancePaths, StoreBackend};
use crate::error::{FinanceError, FinanceResult};
use crate::models::{
    Budget, DateWindow, Expense, ExpenseCategory, GoalId, Income, SavingsGoal, User, UserId,
};

use super::file_io::{read_json, write_json_atomic, StagedWrites};
use super::store::{RecordStore, UserRecords};

#[derive(Debug, Serialize, Deserialize)]
struct TableFile<T> {
    #[serde(default = "Vec::new")]
    records: Vec<T>,
}

impl<T> Default for TableFile<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

#[derive(Serialize)]
struct TableFileRef<'a, T> {
    records: &'a [T],
}

/// A single table persisted to one JSON file
struct JsonTable<T> {
    name: &'static str,
    path: PathBuf,
    /// `None` until first use
    rows: RwLock<Option<Vec<T>>>,
}

/// Read access to a loaded table
struct TableRows<'a, T>(RwLockReadGuard<'a, Option<Vec<T>>>);

impl<T> Deref for TableRows<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.0.as_deref().unwrap_or_default()
    }
}

impl<T> JsonTable<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    fn new(name: &'static str, path: PathBuf) -> Self {
        Self {
            name,
            path,
            rows: RwLock::new(None),
        }
    }

    fn load(&self) -> FinanceResult<Vec<T>> {
        let file: TableFile<T> = read_json(&self.path)?;
        debug!(table = self.name, rows = file.records.len(), "loaded table");
        Ok(file.records)
    }

    fn write(&self) -> FinanceResult<RwLockWriteGuard<'_, Option<Vec<T>>>> {
        self.rows
            .write()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// The rows in `slot`, reading the file first if it has not been read yet
    fn loaded<'g>(&self, slot: &'g mut Option<Vec<T>>) -> FinanceResult<&'g mut Vec<T>> {
        let rows = match slot.take() {
            Some(rows) => rows,
            None => self.load()?,
        };
        Ok(slot.insert(rows))
    }

    fn read(&self) -> FinanceResult<TableRows<'_, T>> {
        {
            let mut slot = self.write()?;
            self.loaded(&mut slot)?;
        }
        let guard = self
            .rows
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(TableRows(guard))
    }

    /// Apply a change to the rows and write the table back to disk
    fn mutate<R>(&self, change: impl FnOnce(&mut Vec<T>) -> R) -> FinanceResult<R> {
        let mut slot = self.write()?;
        let rows = self.loaded(&mut slot)?;

        let result = change(&mut *rows);
        write_json_atomic(&self.path, &TableFileRef { records: rows.as_slice() })?;
        debug!(table = self.name, rows = rows.len(), "saved table");
        Ok(result)
    }

    /// Stage `rows` as this table's next file contents
    fn stage(&self, staged: &mut StagedWrites, rows: &[T]) -> FinanceResult<()> {
        staged.stage(&self.path, &TableFileRef { records: rows })
    }

    /// Remove every row matching `pred`, returning the removed rows
    fn remove_where(&self, pred: impl Fn(&T) -> bool) -> FinanceResult<Vec<T>> {
        self.mutate(|rows| {
            let (removed, kept): (Vec<T>, Vec<T>) = rows.drain(..).partition(|r| pred(r));
            *rows = kept;
            removed
        })
    }
}

/// Record store backed by JSON files
pub struct JsonStore {
    users: JsonTable<User>,
    expenses: JsonTable<Expense>,
    income: JsonTable<Income>,
    budgets: JsonTable<Budget>,
    goals: JsonTable<SavingsGoal>,
}

impl JsonStore {
    /// Open the JSON tables under the data directory
    ///
    /// Files are not read until a table is first used; missing files are
    /// empty tables.
    pub fn open(paths: &FinancePaths) -> FinanceResult<Self> {
        Ok(Self {
            users: JsonTable::new("users", paths.users_file()),
            expenses: JsonTable::new("expenses", paths.expenses_file()),
            income: JsonTable::new("income", paths.income_file()),
            budgets: JsonTable::new("budgets", paths.budgets_file()),
            goals: JsonTable::new("savings_goals", paths.goals_file()),
        })
    }
}

fn newest_first<T>(
    rows: &mut [T],
    key: impl Fn(&T) -> (chrono::NaiveDate, chrono::DateTime<chrono::Utc>),
) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

/// Rows not owned by the user, followed by `replacement`
fn swap_owned<T: Clone>(rows: &[T], replacement: &[T], owned: impl Fn(&T) -> bool) -> Vec<T> {
    rows.iter()
        .filter(|r| !owned(r))
        .chain(replacement)
        .cloned()
        .collect()
}

impl RecordStore for JsonStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Json
    }

    fn get_user(&self, id: UserId) -> FinanceResult<Option<User>> {
        Ok(self.users.read()?.iter().find(|u| u.id == id).cloned())
    }

    fn save_user(&self, user: &User) -> FinanceResult<()> {
        self.users.mutate(|rows| {
            match rows.iter_mut().find(|u| u.id == user.id) {
                Some(existing) => *existing = user.clone(),
                None => rows.push(user.clone()),
            }
        })
    }

    fn delete_user(&self, id: UserId) -> FinanceResult<bool> {
        Ok(!self.users.remove_where(|u| u.id == id)?.is_empty())
    }

    fn insert_expense(&self, expense: &Expense) -> FinanceResult<()> {
        self.expenses.mutate(|rows| rows.push(expense.clone()))
    }

    fn update_expense(&self, expense: &Expense) -> FinanceResult<()> {
        let found = self.expenses.mutate(|rows| {
            rows.iter_mut()
                .find(|e| e.id == expense.id)
                .map(|existing| *existing = expense.clone())
                .is_some()
        })?;
        if found {
            Ok(())
        } else {
            Err(FinanceError::expense_not_found(expense.id.to_string()))
        }
    }

    fn list_expenses(
        &self,
        user: UserId,
        window: Option<DateWindow>,
    ) -> FinanceResult<Vec<Expense>> {
        let mut list: Vec<Expense> = self
            .expenses
            .read()?
            .iter()
            .filter(|e| e.user_id == user)
            .filter(|e| window.map_or(true, |w| w.contains(e.date)))
            .cloned()
            .collect();
        newest_first(&mut list, |e| (e.date, e.created_at));
        Ok(list)
    }

    fn insert_income(&self, income: &Income) -> FinanceResult<()> {
        self.income.mutate(|rows| rows.push(income.clone()))
    }

    fn update_income(&self, income: &Income) -> FinanceResult<()> {
        let found = self.income.mutate(|rows| {
            rows.iter_mut()
                .find(|i| i.id == income.id)
                .map(|existing| *existing = income.clone())
                .is_some()
        })?;
        if found {
            Ok(())
        } else {
            Err(FinanceError::income_not_found(income.id.to_string()))
        }
    }

    fn list_income(&self, user: UserId, window: Option<DateWindow>) -> FinanceResult<Vec<Income>> {
        let mut list: Vec<Income> = self
            .income
            .read()?
            .iter()
            .filter(|i| i.user_id == user)
            .filter(|i| window.map_or(true, |w| w.contains(i.date)))
            .cloned()
            .collect();
        newest_first(&mut list, |i| (i.date, i.created_at));
        Ok(list)
    }

    fn upsert_budget(&self, budget: &Budget) -> FinanceResult<Option<Budget>> {
        self.budgets.mutate(|rows| {
            let replaced = rows
                .iter()
                .position(|b| b.key() == budget.key())
                .map(|idx| rows.remove(idx));
            rows.push(budget.clone());
            replaced
        })
    }

    fn list_budgets(&self, user: UserId) -> FinanceResult<Vec<Budget>> {
        let mut list: Vec<Budget> = self
            .budgets
            .read()?
            .iter()
            .filter(|b| b.user_id == user)
            .cloned()
            .collect();
        list.sort_by_key(|b| b.category);
        Ok(list)
    }

    fn delete_budget(
        &self,
        user: UserId,
        category: ExpenseCategory,
    ) -> FinanceResult<Option<Budget>> {
        Ok(self
            .budgets
            .remove_where(|b| b.key() == (user, category))?
            .into_iter()
            .next())
    }

    fn insert_goal(&self, goal: &SavingsGoal) -> FinanceResult<()> {
        self.goals.mutate(|rows| rows.push(goal.clone()))
    }

    fn update_goal(&self, goal: &SavingsGoal) -> FinanceResult<()> {
        let found = self.goals.mutate(|rows| {
            rows.iter_mut()
                .find(|g| g.id == goal.id)
                .map(|existing| *existing = goal.clone())
                .is_some()
        })?;
        if found {
            Ok(())
        } else {
            Err(FinanceError::goal_not_found(goal.id.to_string()))
        }
    }

    fn list_goals(&self, user: UserId) -> FinanceResult<Vec<SavingsGoal>> {
        let mut list: Vec<SavingsGoal> = self
            .goals
            .read()?
            .iter()
            .filter(|g| g.user_id == user)
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(a.target_date.cmp(&b.target_date))
        });
        Ok(list)
    }

    fn delete_goal(&self, user: UserId, id: GoalId) -> FinanceResult<bool> {
        Ok(!self
            .goals
            .remove_where(|g| g.user_id == user && g.id == id)?
            .is_empty())
    }

    fn replace_user_records(&self, user: UserId, records: &UserRecords) -> FinanceResult<()> {
        let mut expenses_slot = self.expenses.write()?;
        let mut income_slot = self.income.write()?;
        let mut budgets_slot = self.budgets.write()?;
        let mut goals_slot = self.goals.write()?;
        let expenses = self.expenses.loaded(&mut expenses_slot)?;
        let income = self.income.loaded(&mut income_slot)?;
        let budgets = self.budgets.loaded(&mut budgets_slot)?;
        let goals = self.goals.loaded(&mut goals_slot)?;

        let next_expenses =
            swap_owned(expenses.as_slice(), &records.expenses, |e| e.user_id == user);
        let next_income = swap_owned(income.as_slice(), &records.income, |i| i.user_id == user);
        let next_budgets =
            swap_owned(budgets.as_slice(), &records.budgets, |b| b.user_id == user);
        let next_goals = swap_owned(goals.as_slice(), &records.goals, |g| g.user_id == user);

        let mut staged = StagedWrites::default();
        self.expenses.stage(&mut staged, &next_expenses)?;
        self.income.stage(&mut staged, &next_income)?;
        self.budgets.stage(&mut staged, &next_budgets)?;
        self.goals.stage(&mut staged, &next_goals)?;
        staged.commit()?;

        *expenses = next_expenses;
        *income = next_income;
        *budgets = next_budgets;
        *goals = next_goals;
        debug!(user = %user, rows = records.len(), "replaced user records");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IncomeSource, Money};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn open_store() -> (JsonStore, FinancePaths, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = FinancePaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();
        let store = JsonStore::open(&paths).unwrap();
        (store, paths, temp_dir)
    }

    fn expense(amount: i64, category: ExpenseCategory, day: u32) -> Expense {
        Expense::new(UserId::default(), Money::from_dollars(amount), category, date(day))
    }

    #[test]
    fn test_insert_and_list_expenses() {
        let (store, _paths, _temp) = open_store();
        store
            .insert_expense(&expense(500, ExpenseCategory::Housing, 1))
            .unwrap();
        store
            .insert_expense(&expense(100, ExpenseCategory::Food, 2))
            .unwrap();

        let all = store.list_expenses(UserId::default(), None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].date, date(2));

        let other_user = store.list_expenses(UserId::new(2), None).unwrap();
        assert!(other_user.is_empty());
    }

    #[test]
    fn test_window_filter_is_inclusive() {
        let (store, _paths, _temp) = open_store();
        for day in [1, 10, 20, 30] {
            store
                .insert_expense(&expense(10, ExpenseCategory::Food, day))
                .unwrap();
        }

        let window = DateWindow::new(date(10), date(20));
        let within = store
            .list_expenses(UserId::default(), Some(window))
            .unwrap();
        assert_eq!(within.len(), 2);
    }

    #[test]
    fn test_data_survives_reopen() {
        let (store, paths, _temp) = open_store();
        let income = Income::new(
            UserId::default(),
            Money::from_dollars(3000),
            IncomeSource::Salary,
            date(1),
        );
        store.insert_income(&income).unwrap();
        drop(store);

        let reopened = JsonStore::open(&paths).unwrap();
        let loaded = reopened.list_income(UserId::default(), None).unwrap();
        assert_eq!(loaded, vec![income]);
    }

    #[test]
    fn test_budget_upsert_replaces_same_category() {
        let (store, _paths, _temp) = open_store();
        let user = UserId::default();
        let first = Budget::new(user, ExpenseCategory::Food, Money::from_dollars(300));
        let second = Budget::new(user, ExpenseCategory::Food, Money::from_dollars(400));

        assert!(store.upsert_budget(&first).unwrap().is_none());
        let replaced = store.upsert_budget(&second).unwrap();
        assert_eq!(replaced.map(|b| b.limit), Some(Money::from_dollars(300)));

        let budgets = store.list_budgets(UserId::default()).unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].limit, Money::from_dollars(400));
    }

    #[test]
    fn test_update_unknown_expense_is_not_found() {
        let (store, _paths, _temp) = open_store();
        let err = store
            .update_expense(&expense(1, ExpenseCategory::Other, 1))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_replace_user_records_swaps_all_tables() {
        let (store, paths, _temp) = open_store();
        let user = UserId::default();
        store
            .insert_expense(&expense(10, ExpenseCategory::Food, 1))
            .unwrap();
        store
            .upsert_budget(&Budget::new(user, ExpenseCategory::Food, Money::from_dollars(300)))
            .unwrap();
        let mut theirs = expense(20, ExpenseCategory::Food, 1);
        theirs.user_id = UserId::new(2);
        store.insert_expense(&theirs).unwrap();

        let records = UserRecords {
            expenses: vec![expense(45, ExpenseCategory::Housing, 3)],
            ..Default::default()
        };
        store.replace_user_records(user, &records).unwrap();

        let reopened = JsonStore::open(&paths).unwrap();
        let mine = reopened.list_expenses(user, None).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].category, ExpenseCategory::Housing);
        assert!(reopened.list_budgets(user).unwrap().is_empty());
        assert_eq!(reopened.list_expenses(UserId::new(2), None).unwrap(), vec![theirs]);
    }

    #[test]
    fn test_failed_replace_changes_nothing() {
        let (store, paths, _temp) = open_store();
        let user = UserId::default();
        store
            .insert_expense(&expense(10, ExpenseCategory::Food, 1))
            .unwrap();
        store
            .upsert_budget(&Budget::new(user, ExpenseCategory::Food, Money::from_dollars(300)))
            .unwrap();

        // A directory in the way of the goals temp file makes the last stage fail
        std::fs::create_dir(paths.goals_file().with_extension("json.tmp")).unwrap();

        let records = UserRecords {
            expenses: vec![expense(45, ExpenseCategory::Housing, 3)],
            ..Default::default()
        };
        assert!(store.replace_user_records(user, &records).is_err());

        assert_eq!(store.list_expenses(user, None).unwrap()[0].category, ExpenseCategory::Food);
        assert_eq!(store.list_budgets(user).unwrap().len(), 1);

        let reopened = JsonStore::open(&paths).unwrap();
        assert_eq!(reopened.list_expenses(user, None).unwrap().len(), 1);
        assert_eq!(reopened.list_budgets(user).unwrap().len(), 1);
        assert!(!paths.expenses_file().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_damaged_file_only_fails_its_table() {
        let (store, paths, _temp) = open_store();
        store
            .insert_expense(&expense(10, ExpenseCategory::Food, 1))
            .unwrap();
        std::fs::write(paths.expenses_file(), "{ not json").unwrap();

        let reopened = JsonStore::open(&paths).unwrap();
        assert!(reopened.list_income(UserId::default(), None).unwrap().is_empty());
        let err = reopened.list_expenses(UserId::default(), None).unwrap_err();
        assert!(matches!(err, FinanceError::Storage(_)));
    }
}
