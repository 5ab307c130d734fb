//! Embedded SQLite backend
//!
//! All tables live in `data/finance.db`. Money is stored as integer cents,
//! dates as ISO `YYYY-MM-DD` text and ids as full UUID strings, so the
//! rows read back exactly as they were written.
//!
//! Busy and locked failures are retried a fixed number of times with a
//! fixed delay; every other error is returned immediately.

use std::path::Path;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{debug, warn};

use crate::config::StoreBackend;
use crate::error::{FinanceError, FinanceResult};
use crate::models::{
    Budget, BudgetPeriod, Currency, DateWindow, Expense, ExpenseCategory, GoalId, Income,
    Money, SavingsGoal, User, UserId,
};

use super::store::{RecordStore, UserRecords};

/// Attempts made for an operation that keeps hitting a busy database
pub const MAX_ATTEMPTS: u32 = 5;

/// Pause between attempts
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// How long SQLite itself waits on a lock before reporting busy
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL,
        currency TEXT NOT NULL DEFAULT 'USD',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS expenses (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL,
        amount INTEGER NOT NULL,
        category TEXT NOT NULL,
        subcategory TEXT,
        date TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        payment_method TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_user_date ON expenses(user_id, date);
    CREATE TABLE IF NOT EXISTS income (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL,
        amount INTEGER NOT NULL,
        source TEXT NOT NULL,
        date TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_income_user_date ON income(user_id, date);
    CREATE TABLE IF NOT EXISTS budgets (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL,
        category TEXT NOT NULL,
        amount INTEGER NOT NULL,
        period TEXT NOT NULL DEFAULT 'Monthly',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE(user_id, category)
    );
    CREATE TABLE IF NOT EXISTS savings_goals (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        target_amount INTEGER NOT NULL,
        current_amount INTEGER NOT NULL DEFAULT 0,
        target_date TEXT NOT NULL,
        priority INTEGER NOT NULL DEFAULT 3,
        description TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
";

const EXPENSE_COLUMNS: &str = "id, user_id, amount, category, subcategory, date, description, \
     payment_method, created_at, updated_at";
const INCOME_COLUMNS: &str =
    "id, user_id, amount, source, date, description, created_at, updated_at";
const BUDGET_COLUMNS: &str = "id, user_id, category, amount, period, created_at, updated_at";
const GOAL_COLUMNS: &str = "id, user_id, name, target_amount, current_amount, target_date, \
     priority, description, created_at, updated_at";

/// Tables holding rows owned by a user, besides `users` itself
const USER_TABLES: [&str; 4] = ["expenses", "income", "budgets", "savings_goals"];

/// Record store backed by an embedded SQLite database
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the database file, creating the schema if needed
    pub fn open(path: &Path) -> FinanceResult<Self> {
        let conn = Connection::open(path).map_err(|e| {
            FinanceError::Config(format!("Failed to open database {}: {}", path.display(), e))
        })?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> FinanceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> FinanceResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = Self { conn };
        store.with_retry("create schema", |conn| conn.execute_batch(SCHEMA))?;
        debug!("sqlite schema ready");
        Ok(store)
    }

    /// Run `op`, retrying while the database reports busy or locked
    fn with_retry<T>(
        &self,
        what: &str,
        mut op: impl FnMut(&Connection) -> rusqlite::Result<T>,
    ) -> FinanceResult<T> {
        let mut attempt = 1;
        loop {
            match op(&self.conn) {
                Ok(value) => return Ok(value),
                Err(e) if is_transient(&e) && attempt < MAX_ATTEMPTS => {
                    warn!(operation = what, attempt, "database busy, retrying");
                    thread::sleep(RETRY_DELAY);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn is_transient(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

/// Parse a text column into a typed value, reporting failures as conversion errors
fn text_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    text_col(row, idx)
}

fn timestamp_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    text_col(row, idx)
}

fn user_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<UserId> {
    Ok(UserId::new(row.get(idx)?))
}

fn money_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Money> {
    Ok(Money::from_cents(row.get(idx)?))
}

fn currency_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Currency> {
    let raw: String = row.get(idx)?;
    Ok(Currency::parse(&raw).unwrap_or_default())
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: user_col(row, 0)?,
        username: row.get(1)?,
        currency: currency_col(row, 2)?,
        created_at: timestamp_col(row, 3)?,
        updated_at: timestamp_col(row, 4)?,
    })
}

fn map_expense(row: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: text_col(row, 0)?,
        user_id: user_col(row, 1)?,
        amount: money_col(row, 2)?,
        category: text_col(row, 3)?,
        subcategory: row.get(4)?,
        date: date_col(row, 5)?,
        description: row.get(6)?,
        payment_method: text_col(row, 7)?,
        created_at: timestamp_col(row, 8)?,
        updated_at: timestamp_col(row, 9)?,
    })
}

fn map_income(row: &Row<'_>) -> rusqlite::Result<Income> {
    Ok(Income {
        id: text_col(row, 0)?,
        user_id: user_col(row, 1)?,
        amount: money_col(row, 2)?,
        source: text_col(row, 3)?,
        date: date_col(row, 4)?,
        description: row.get(5)?,
        created_at: timestamp_col(row, 6)?,
        updated_at: timestamp_col(row, 7)?,
    })
}

fn map_budget(row: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: text_col(row, 0)?,
        user_id: user_col(row, 1)?,
        category: text_col(row, 2)?,
        limit: money_col(row, 3)?,
        period: BudgetPeriod::Monthly,
        created_at: timestamp_col(row, 5)?,
        updated_at: timestamp_col(row, 6)?,
    })
}

fn map_goal(row: &Row<'_>) -> rusqlite::Result<SavingsGoal> {
    Ok(SavingsGoal {
        id: text_col(row, 0)?,
        user_id: user_col(row, 1)?,
        name: row.get(2)?,
        target_amount: money_col(row, 3)?,
        current_amount: money_col(row, 4)?,
        target_date: date_col(row, 5)?,
        priority: row.get(6)?,
        description: row.get(7)?,
        created_at: timestamp_col(row, 8)?,
        updated_at: timestamp_col(row, 9)?,
    })
}

fn window_bounds(window: Option<DateWindow>) -> (String, String) {
    match window {
        Some(w) => (w.start.to_string(), w.end.to_string()),
        None => ("0000-01-01".to_string(), "9999-12-31".to_string()),
    }
}

fn insert_expense_row(conn: &Connection, expense: &Expense) -> rusqlite::Result<usize> {
    conn.execute(
        &format!(
            "INSERT INTO expenses ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            EXPENSE_COLUMNS
        ),
        params![
            expense.id.as_uuid().to_string(),
            expense.user_id.get(),
            expense.amount.cents(),
            expense.category.label(),
            expense.subcategory,
            expense.date.to_string(),
            expense.description,
            expense.payment_method.label(),
            expense.created_at.to_rfc3339(),
            expense.updated_at.to_rfc3339(),
        ],
    )
}

fn insert_income_row(conn: &Connection, income: &Income) -> rusqlite::Result<usize> {
    conn.execute(
        &format!(
            "INSERT INTO income ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            INCOME_COLUMNS
        ),
        params![
            income.id.as_uuid().to_string(),
            income.user_id.get(),
            income.amount.cents(),
            income.source.label(),
            income.date.to_string(),
            income.description,
            income.created_at.to_rfc3339(),
            income.updated_at.to_rfc3339(),
        ],
    )
}

fn insert_goal_row(conn: &Connection, goal: &SavingsGoal) -> rusqlite::Result<usize> {
    conn.execute(
        &format!(
            "INSERT INTO savings_goals ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            GOAL_COLUMNS
        ),
        params![
            goal.id.as_uuid().to_string(),
            goal.user_id.get(),
            goal.name,
            goal.target_amount.cents(),
            goal.current_amount.cents(),
            goal.target_date.to_string(),
            goal.priority,
            goal.description,
            goal.created_at.to_rfc3339(),
            goal.updated_at.to_rfc3339(),
        ],
    )
}

fn insert_budget_row(conn: &Connection, budget: &Budget) -> rusqlite::Result<usize> {
    conn.execute(
        &format!(
            "INSERT INTO budgets ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            BUDGET_COLUMNS
        ),
        params![
            budget.id.as_uuid().to_string(),
            budget.user_id.get(),
            budget.category.label(),
            budget.limit.cents(),
            budget.period.to_string(),
            budget.created_at.to_rfc3339(),
            budget.updated_at.to_rfc3339(),
        ],
    )
}

impl RecordStore for SqliteStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Sqlite
    }

    fn get_user(&self, id: UserId) -> FinanceResult<Option<User>> {
        self.with_retry("get user", |conn| {
            conn.query_row(
                "SELECT id, username, currency, created_at, updated_at FROM users WHERE id = ?1",
                params![id.get()],
                map_user,
            )
            .optional()
        })
    }

    fn save_user(&self, user: &User) -> FinanceResult<()> {
        self.with_retry("save user", |conn| {
            conn.execute(
                "INSERT INTO users (id, username, currency, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                   username = excluded.username,
                   currency = excluded.currency,
                   updated_at = excluded.updated_at",
                params![
                    user.id.get(),
                    user.username,
                    user.currency.code(),
                    user.created_at.to_rfc3339(),
                    user.updated_at.to_rfc3339(),
                ],
            )
        })?;
        Ok(())
    }

    fn delete_user(&self, id: UserId) -> FinanceResult<bool> {
        let removed = self.with_retry("delete user", |conn| {
            conn.execute("DELETE FROM users WHERE id = ?1", params![id.get()])
        })?;
        Ok(removed > 0)
    }

    fn insert_expense(&self, expense: &Expense) -> FinanceResult<()> {
        self.with_retry("insert expense", |conn| insert_expense_row(conn, expense))?;
        Ok(())
    }

    fn update_expense(&self, expense: &Expense) -> FinanceResult<()> {
        let changed = self.with_retry("update expense", |conn| {
            conn.execute(
                "UPDATE expenses SET amount = ?2, category = ?3, subcategory = ?4, date = ?5,
                   description = ?6, payment_method = ?7, updated_at = ?8
                 WHERE id = ?1",
                params![
                    expense.id.as_uuid().to_string(),
                    expense.amount.cents(),
                    expense.category.label(),
                    expense.subcategory,
                    expense.date.to_string(),
                    expense.description,
                    expense.payment_method.label(),
                    expense.updated_at.to_rfc3339(),
                ],
            )
        })?;
        if changed == 0 {
            return Err(FinanceError::expense_not_found(expense.id.to_string()));
        }
        Ok(())
    }

    fn list_expenses(
        &self,
        user: UserId,
        window: Option<DateWindow>,
    ) -> FinanceResult<Vec<Expense>> {
        let (start, end) = window_bounds(window);
        let sql = format!(
            "SELECT {} FROM expenses WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date DESC, created_at DESC",
            EXPENSE_COLUMNS
        );
        self.with_retry("list expenses", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![user.get(), start, end], map_expense)?;
            rows.collect()
        })
    }

    fn insert_income(&self, income: &Income) -> FinanceResult<()> {
        self.with_retry("insert income", |conn| insert_income_row(conn, income))?;
        Ok(())
    }

    fn update_income(&self, income: &Income) -> FinanceResult<()> {
        let changed = self.with_retry("update income", |conn| {
            conn.execute(
                "UPDATE income SET amount = ?2, source = ?3, date = ?4, description = ?5,
                   updated_at = ?6
                 WHERE id = ?1",
                params![
                    income.id.as_uuid().to_string(),
                    income.amount.cents(),
                    income.source.label(),
                    income.date.to_string(),
                    income.description,
                    income.updated_at.to_rfc3339(),
                ],
            )
        })?;
        if changed == 0 {
            return Err(FinanceError::income_not_found(income.id.to_string()));
        }
        Ok(())
    }

    fn list_income(&self, user: UserId, window: Option<DateWindow>) -> FinanceResult<Vec<Income>> {
        let (start, end) = window_bounds(window);
        let sql = format!(
            "SELECT {} FROM income WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date DESC, created_at DESC",
            INCOME_COLUMNS
        );
        self.with_retry("list income", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![user.get(), start, end], map_income)?;
            rows.collect()
        })
    }

    fn upsert_budget(&self, budget: &Budget) -> FinanceResult<Option<Budget>> {
        let replaced = self.delete_budget(budget.user_id, budget.category)?;
        self.with_retry("insert budget", |conn| insert_budget_row(conn, budget))?;
        Ok(replaced)
    }

    fn list_budgets(&self, user: UserId) -> FinanceResult<Vec<Budget>> {
        let sql = format!("SELECT {} FROM budgets WHERE user_id = ?1", BUDGET_COLUMNS);
        let mut list: Vec<Budget> = self.with_retry("list budgets", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![user.get()], map_budget)?;
            rows.collect()
        })?;
        list.sort_by_key(|b| b.category);
        Ok(list)
    }

    fn delete_budget(
        &self,
        user: UserId,
        category: ExpenseCategory,
    ) -> FinanceResult<Option<Budget>> {
        let sql = format!(
            "SELECT {} FROM budgets WHERE user_id = ?1 AND category = ?2",
            BUDGET_COLUMNS
        );
        let existing = self.with_retry("find budget", |conn| {
            conn.query_row(&sql, params![user.get(), category.label()], map_budget)
                .optional()
        })?;
        if existing.is_some() {
            self.with_retry("delete budget", |conn| {
                conn.execute(
                    "DELETE FROM budgets WHERE user_id = ?1 AND category = ?2",
                    params![user.get(), category.label()],
                )
            })?;
        }
        Ok(existing)
    }

    fn insert_goal(&self, goal: &SavingsGoal) -> FinanceResult<()> {
        self.with_retry("insert goal", |conn| insert_goal_row(conn, goal))?;
        Ok(())
    }

    fn update_goal(&self, goal: &SavingsGoal) -> FinanceResult<()> {
        let changed = self.with_retry("update goal", |conn| {
            conn.execute(
                "UPDATE savings_goals SET name = ?2, target_amount = ?3, current_amount = ?4,
                   target_date = ?5, priority = ?6, description = ?7, updated_at = ?8
                 WHERE id = ?1",
                params![
                    goal.id.as_uuid().to_string(),
                    goal.name,
                    goal.target_amount.cents(),
                    goal.current_amount.cents(),
                    goal.target_date.to_string(),
                    goal.priority,
                    goal.description,
                    goal.updated_at.to_rfc3339(),
                ],
            )
        })?;
        if changed == 0 {
            return Err(FinanceError::goal_not_found(goal.id.to_string()));
        }
        Ok(())
    }

    fn list_goals(&self, user: UserId) -> FinanceResult<Vec<SavingsGoal>> {
        let sql = format!(
            "SELECT {} FROM savings_goals WHERE user_id = ?1 ORDER BY priority, target_date",
            GOAL_COLUMNS
        );
        self.with_retry("list goals", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![user.get()], map_goal)?;
            rows.collect()
        })
    }

    fn delete_goal(&self, user: UserId, id: GoalId) -> FinanceResult<bool> {
        let removed = self.with_retry("delete goal", |conn| {
            conn.execute(
                "DELETE FROM savings_goals WHERE user_id = ?1 AND id = ?2",
                params![user.get(), id.as_uuid().to_string()],
            )
        })?;
        Ok(removed > 0)
    }

    fn replace_user_records(&self, user: UserId, records: &UserRecords) -> FinanceResult<()> {
        self.with_retry("replace user records", |conn| {
            // Rolled back on drop unless committed
            let tx = conn.unchecked_transaction()?;
            for table in USER_TABLES {
                let sql = format!("DELETE FROM {} WHERE user_id = ?1", table);
                tx.execute(&sql, params![user.get()])?;
            }
            for expense in &records.expenses {
                insert_expense_row(&tx, expense)?;
            }
            for income in &records.income {
                insert_income_row(&tx, income)?;
            }
            for budget in &records.budgets {
                insert_budget_row(&tx, budget)?;
            }
            for goal in &records.goals {
                insert_goal_row(&tx, goal)?;
            }
            tx.commit()
        })?;
        debug!(user = %user, rows = records.len(), "replaced user records");
        Ok(())
    }
}
