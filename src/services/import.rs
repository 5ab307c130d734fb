//! CSV import service
//!
//! One file carries rows for every table, told apart by a `type` column
//! (`expense`, `income`, `savings` or `budget`). Once the header is
//! accepted, the user's expenses, income, savings goals and budgets are all
//! replaced by the file's rows in one step, including tables the file has
//! no rows for.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{FinanceError, FinanceResult};
use crate::models::{
    Budget, Expense, ExpenseCategory, Income, IncomeSource, Money, PaymentMethod, SavingsGoal,
    UserId,
};
use crate::storage::{Storage, UserRecords};

/// Goal name used when a savings row has none
pub const UNNAMED_GOAL: &str = "Unnamed Goal";

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Row kinds recognised in the `type` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Expense,
    Income,
    Savings,
    Budget,
}

impl RowKind {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Some(RowKind::Expense),
            "income" => Some(RowKind::Income),
            "savings" => Some(RowKind::Savings),
            "budget" => Some(RowKind::Budget),
            _ => None,
        }
    }
}

/// Rows parsed from a file, ready to be written
#[derive(Debug, Clone, Default)]
pub struct ParsedImport {
    pub expenses: Vec<Expense>,
    pub income: Vec<Income>,
    pub goals: Vec<SavingsGoal>,
    /// Last row wins per category
    pub budgets: BTreeMap<ExpenseCategory, Budget>,
    /// One message per skipped row or substituted value
    pub warnings: Vec<String>,
}

impl ParsedImport {
    /// The parsed rows as a full replacement set
    pub fn into_records(self) -> (UserRecords, Vec<String>) {
        let records = UserRecords {
            expenses: self.expenses,
            income: self.income,
            budgets: self.budgets.into_values().collect(),
            goals: self.goals,
        };
        (records, self.warnings)
    }
}

/// Result of a completed import
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportResult {
    pub expenses: usize,
    pub income: usize,
    pub goals: usize,
    pub budgets: usize,
    /// Rows the import replaced, across all four tables
    pub replaced: usize,
    pub warnings: Vec<String>,
}

impl ImportResult {
    pub fn total(&self) -> usize {
        self.expenses + self.income + self.goals + self.budgets
    }
}

/// Named access to the fields of one CSV record
struct Row<'r> {
    record: &'r StringRecord,
    columns: &'r HashMap<String, usize>,
}

impl<'r> Row<'r> {
    /// A non-empty field, or `None` when the column is absent or blank
    fn field(&self, name: &str) -> Option<&'r str> {
        self.columns
            .get(name)
            .and_then(|&idx| self.record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn amount(&self, name: &str) -> Result<Money, String> {
        match self.field(name) {
            None => Ok(Money::zero()),
            Some(raw) => {
                let amount = Money::parse(raw)
                    .map_err(|_| format!("invalid {} '{}'", name, raw))?;
                if amount.is_negative() {
                    return Err(format!("negative {} '{}'", name, raw));
                }
                Ok(amount)
            }
        }
    }

    fn date(&self, name: &str, default: NaiveDate) -> Result<NaiveDate, String> {
        match self.field(name) {
            None => Ok(default),
            Some(raw) => parse_date(raw).ok_or_else(|| format!("invalid {} '{}'", name, raw)),
        }
    }

    fn text(&self, name: &str) -> String {
        self.field(name).unwrap_or_default().to_string()
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}

/// Service for CSV import
pub struct ImportService<'a> {
    storage: &'a Storage,
    user: UserId,
}

impl<'a> ImportService<'a> {
    pub fn new(storage: &'a Storage, user: UserId) -> Self {
        Self { storage, user }
    }

    /// Import a CSV file from disk
    pub fn import_file(&self, path: &Path, today: NaiveDate) -> FinanceResult<ImportResult> {
        let file = std::fs::File::open(path).map_err(|e| {
            FinanceError::Import(format!("Failed to open {}: {}", path.display(), e))
        })?;
        self.import_reader(file, today)
    }

    /// Parse then write; nothing is written if the file is rejected
    pub fn import_reader<R: Read>(
        &self,
        reader: R,
        today: NaiveDate,
    ) -> FinanceResult<ImportResult> {
        let parsed = self.parse_reader(reader, today)?;
        self.apply(parsed)
    }

    /// Parse a CSV into records for this user without touching storage
    pub fn parse_reader<R: Read>(
        &self,
        reader: R,
        today: NaiveDate,
    ) -> FinanceResult<ParsedImport> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let columns: HashMap<String, usize> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_lowercase(), idx))
            .collect();

        if !columns.contains_key("type") {
            return Err(FinanceError::Import(
                "CSV must contain a 'type' column (values: expense, income, savings, budget)"
                    .into(),
            ));
        }

        let mut parsed = ParsedImport::default();
        for (idx, result) in reader.records().enumerate() {
            // Row numbers as a spreadsheet shows them, after the header
            let line = idx + 2;
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    parsed.warnings.push(format!("Row {}: unreadable: {}", line, e));
                    continue;
                }
            };
            let row = Row {
                record: &record,
                columns: &columns,
            };
            if let Err(reason) = self.parse_row(&row, line, today, &mut parsed) {
                parsed
                    .warnings
                    .push(format!("Row {}: {}; skipped", line, reason));
            }
        }

        for warning in &parsed.warnings {
            warn!("{}", warning);
        }
        Ok(parsed)
    }

    fn parse_row(
        &self,
        row: &Row<'_>,
        line: usize,
        today: NaiveDate,
        parsed: &mut ParsedImport,
    ) -> Result<(), String> {
        let raw_kind = row.field("type").unwrap_or_default();
        let kind = RowKind::parse(raw_kind).ok_or_else(|| format!("unknown type '{}'", raw_kind))?;

        match kind {
            RowKind::Expense => {
                let amount = row.amount("amount")?;
                let date = row.date("date", today)?;
                let category = category_or_other(row, line, &mut parsed.warnings);
                let payment_method = match row.field("payment_method") {
                    None => PaymentMethod::Unknown,
                    Some(raw) => raw.parse().unwrap_or_else(|_| {
                        parsed.warnings.push(format!(
                            "Row {}: unknown payment method '{}', using Unknown",
                            line, raw
                        ));
                        PaymentMethod::Unknown
                    }),
                };
                let expense = Expense::new(self.user, amount, category, date)
                    .with_description(row.text("description"))
                    .with_payment_method(payment_method)
                    .with_subcategory(row.field("subcategory").map(str::to_string));
                parsed.expenses.push(expense);
            }
            RowKind::Income => {
                let amount = row.amount("amount")?;
                let date = row.date("date", today)?;
                let source = match row.field("source") {
                    None => IncomeSource::Other,
                    Some(raw) => raw.parse().unwrap_or_else(|_| {
                        parsed.warnings.push(format!(
                            "Row {}: unknown source '{}', using Other",
                            line, raw
                        ));
                        IncomeSource::Other
                    }),
                };
                let income = Income::new(self.user, amount, source, date)
                    .with_description(row.text("description"));
                parsed.income.push(income);
            }
            RowKind::Savings => {
                let target = row.amount("target_amount")?;
                let current = row.amount("current_amount")?;
                let year_end = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
                let target_date = row.date("target_date", year_end)?;
                let priority = match row.field("priority") {
                    None => 1,
                    Some(raw) => raw
                        .parse::<u8>()
                        .ok()
                        .filter(|p| (1..=5).contains(p))
                        .ok_or_else(|| format!("invalid priority '{}'", raw))?,
                };
                let name = row.field("goal_name").unwrap_or(UNNAMED_GOAL);
                let goal = SavingsGoal::new(self.user, name, target, target_date)
                    .with_current(current)
                    .with_priority(priority)
                    .with_description(row.field("description").map(str::to_string));
                parsed.goals.push(goal);
            }
            RowKind::Budget => {
                let limit = row.amount("limit_amount")?;
                let category = category_or_other(row, line, &mut parsed.warnings);
                parsed
                    .budgets
                    .insert(category, Budget::new(self.user, category, limit));
            }
        }
        Ok(())
    }

    /// Replace the user's expenses, income, goals and budgets with the parsed rows
    pub fn apply(&self, parsed: ParsedImport) -> FinanceResult<ImportResult> {
        let (records, warnings) = parsed.into_records();
        let previous = self.storage.replace_user_records(self.user, &records)?;

        let result = ImportResult {
            expenses: records.expenses.len(),
            income: records.income.len(),
            goals: records.goals.len(),
            budgets: records.budgets.len(),
            replaced: previous.len(),
            warnings,
        };
        info!(
            user = %self.user,
            records = result.total(),
            replaced = result.replaced,
            "import complete"
        );
        Ok(result)
    }
}

fn category_or_other(row: &Row<'_>, line: usize, warnings: &mut Vec<String>) -> ExpenseCategory {
    match row.field("category") {
        None => ExpenseCategory::Other,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warnings.push(format!(
                "Row {}: unknown category '{}', using Other",
                line, raw
            ));
            ExpenseCategory::Other
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::{json_storage, sqlite_storage};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 15).unwrap()
    }

    fn import(storage: &Storage, csv: &str) -> FinanceResult<ImportResult> {
        ImportService::new(storage, UserId::default()).import_reader(csv.as_bytes(), today())
    }

    #[test]
    fn test_mixed_file() {
        let (storage, _temp) = json_storage();
        let csv = "\
type,amount,category,date,description,payment_method,source,goal_name,\
target_amount,current_amount,target_date,limit_amount
expense,45.20,Food,2025-04-02,Groceries,Debit Card,,,,,,
expense,12.00,Transportation,2025-04-03,Bus pass,,,,,,,
income,2500,,2025-04-01,Pay,,Salary,,,,,
savings,,,,,,,Car,5000,1200,2026-06-30,
budget,,Food,,,,,,,,,400
";
        let result = import(&storage, csv).unwrap();
        assert_eq!(result.expenses, 2);
        assert_eq!(result.income, 1);
        assert_eq!(result.goals, 1);
        assert_eq!(result.budgets, 1);
        assert!(result.warnings.is_empty());

        let store = storage.store();
        let expenses = store.list_expenses(UserId::default(), None).unwrap();
        let bus = expenses.iter().find(|e| e.description == "Bus pass").unwrap();
        assert_eq!(bus.payment_method, PaymentMethod::Unknown);

        let goals = store.list_goals(UserId::default()).unwrap();
        assert_eq!(goals[0].name, "Car");
        assert_eq!(goals[0].current_amount, Money::from_dollars(1200));
    }

    #[test]
    fn test_missing_amount_defaults_to_zero() {
        let (storage, _temp) = json_storage();
        let csv = "\
type,amount,category,date
expense,,Food,2025-04-02
expense,30,Housing,2025-04-03
";
        let result = import(&storage, csv).unwrap();
        assert_eq!(result.expenses, 2);

        let expenses = storage.store().list_expenses(UserId::default(), None).unwrap();
        let food = expenses
            .iter()
            .find(|e| e.category == ExpenseCategory::Food)
            .unwrap();
        assert_eq!(food.amount, Money::zero());
    }

    #[test]
    fn test_missing_type_column_rejects_without_writing() {
        let (storage, _temp) = json_storage();
        import(&storage, "type,amount,category\nexpense,10,Food\n").unwrap();

        let err = import(&storage, "amount,category\n99,Food\n").unwrap_err();
        assert!(matches!(err, FinanceError::Import(_)));

        let expenses = storage.store().list_expenses(UserId::default(), None).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].amount, Money::from_dollars(10));
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let (storage, _temp) = json_storage();
        let csv = "\
type,amount,category,date
expense,abc,Food,2025-04-02
expense,-5,Food,2025-04-02
expense,10,Food,not-a-date
transfer,10,Food,2025-04-02
expense,7.50,Food,2025-04-02
";
        let result = import(&storage, csv).unwrap();
        assert_eq!(result.expenses, 1);
        assert_eq!(result.warnings.len(), 4);
        assert!(result.warnings[3].contains("unknown type 'transfer'"));
    }

    #[test]
    fn test_defaults_for_sparse_rows() {
        let (storage, _temp) = json_storage();
        let result = import(&storage, "type\nexpense\nincome\nsavings\nbudget\n").unwrap();
        assert_eq!(result.total(), 4);

        let store = storage.store();
        let user = UserId::default();
        let expense = &store.list_expenses(user, None).unwrap()[0];
        assert_eq!(expense.category, ExpenseCategory::Other);
        assert_eq!(expense.date, today());

        let income = &store.list_income(user, None).unwrap()[0];
        assert_eq!(income.source, IncomeSource::Other);

        let goal = &store.list_goals(user).unwrap()[0];
        assert_eq!(goal.name, UNNAMED_GOAL);
        assert_eq!(goal.priority, 1);
        assert_eq!(goal.target_date, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());

        let budget = &store.list_budgets(user).unwrap()[0];
        assert_eq!(budget.category, ExpenseCategory::Other);
        assert_eq!(budget.limit, Money::zero());
    }

    #[test]
    fn test_replaces_every_table() {
        let (storage, _temp) = sqlite_storage();
        import(
            &storage,
            "type,amount,category,source,limit_amount\n\
             expense,10,Food,,\n\
             income,100,,Salary,\n\
             budget,,Food,,300\n",
        )
        .unwrap();

        let result = import(&storage, "type,amount,category\nexpense,20,Housing\n").unwrap();
        assert_eq!(result.replaced, 3);

        let store = storage.store();
        let user = UserId::default();
        let expenses = store.list_expenses(user, None).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].category, ExpenseCategory::Housing);
        assert!(store.list_income(user, None).unwrap().is_empty());
        assert!(store.list_budgets(user).unwrap().is_empty());
    }

    #[test]
    fn test_file_with_only_skipped_rows_still_replaces() {
        let (storage, _temp) = json_storage();
        import(&storage, "type,category,limit_amount\nbudget,Food,300\n").unwrap();

        let result = import(&storage, "type,amount\ntransfer,10\n").unwrap();
        assert_eq!(result.total(), 0);
        assert_eq!(result.replaced, 1);
        assert!(storage.store().list_budgets(UserId::default()).unwrap().is_empty());
    }

    #[test]
    fn test_oversized_amount_skips_row() {
        let (storage, _temp) = json_storage();
        let csv = "type,amount,category\nexpense,10,Food\nexpense,99999999999999999,Food\n";
        let result = import(&storage, csv).unwrap();
        assert_eq!(result.expenses, 1);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("Row 3: invalid amount"));

        let expenses = storage.store().list_expenses(UserId::default(), None).unwrap();
        assert_eq!(expenses[0].amount, Money::from_dollars(10));
    }

    #[test]
    fn test_budget_rows_last_wins() {
        let (storage, _temp) = json_storage();
        let csv = "type,category,limit_amount\nbudget,Food,300\nbudget,food,250\n";
        let result = import(&storage, csv).unwrap();
        assert_eq!(result.budgets, 1);

        let budgets = storage.store().list_budgets(UserId::default()).unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].limit, Money::from_dollars(250));
    }

    #[test]
    fn test_unknown_category_maps_to_other() {
        let (storage, _temp) = json_storage();
        let result = import(&storage, "type,amount,category\nexpense,5,Snacks\n").unwrap();
        assert_eq!(result.expenses, 1);
        assert_eq!(result.warnings.len(), 1);

        let expenses = storage.store().list_expenses(UserId::default(), None).unwrap();
        assert_eq!(expenses[0].category, ExpenseCategory::Other);
    }
}
