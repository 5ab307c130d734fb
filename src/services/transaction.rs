//! Transaction service
//!
//! Recording, editing and analysing expenses and income. Recording an
//! expense against a budgeted category hands back that category's
//! freshly recomputed usage.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::audit::EntityType;
use crate::error::{FinanceError, FinanceResult};
use crate::models::{
    DateWindow, Expense, ExpenseCategory, Income, IncomeSource, Money, PaymentMethod, UserId,
};
use crate::storage::Storage;

use super::summary::{BudgetUsage, SummaryService};

/// Description given to records created by quick add
pub const QUICK_ADD_DESCRIPTION: &str = "Quick add";

/// Input for recording an expense
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub amount: Money,
    pub category: ExpenseCategory,
    pub date: NaiveDate,
    pub description: String,
    pub payment_method: PaymentMethod,
    pub subcategory: Option<String>,
}

/// Input for recording income
#[derive(Debug, Clone)]
pub struct NewIncome {
    pub amount: Money,
    pub source: IncomeSource,
    pub date: NaiveDate,
    pub description: String,
}

/// Fields to change on an existing expense; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdate {
    pub amount: Option<Money>,
    pub category: Option<ExpenseCategory>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub subcategory: Option<String>,
}

/// Fields to change on an existing income record
#[derive(Debug, Clone, Default)]
pub struct IncomeUpdate {
    pub amount: Option<Money>,
    pub source: Option<IncomeSource>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// A stored expense plus the budget usage it affected
#[derive(Debug, Clone)]
pub struct RecordedExpense {
    pub expense: Expense,
    pub budget_usage: Option<BudgetUsage>,
}

/// Which table quick add writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum QuickAddKind {
    Expense,
    Income,
}

/// What quick add recorded
#[derive(Debug, Clone)]
pub enum QuickAdded {
    Expense(RecordedExpense),
    Income(Income),
}

/// Expense statistics over a window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseAnalysis {
    pub window: DateWindow,
    pub count: usize,
    pub total: Money,
    pub average_daily: Money,
    pub by_category: BTreeMap<ExpenseCategory, Money>,
    pub by_payment_method: BTreeMap<PaymentMethod, Money>,
}

/// Income statistics over a window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeAnalysis {
    pub window: DateWindow,
    pub count: usize,
    pub total: Money,
    pub average_daily: Money,
    pub by_source: BTreeMap<IncomeSource, Money>,
}

/// `total / (days + 1)` for a window spanning more than a day, else the total
fn average_daily(total: Money, window: &DateWindow) -> Money {
    let days = window.span_days();
    if days > 0 {
        Money::from_cents((total.cents() as f64 / (days + 1) as f64).round() as i64)
    } else {
        total
    }
}

fn require_positive(amount: Money, what: &str) -> FinanceResult<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(FinanceError::Validation(format!(
            "{} amount must be greater than zero",
            what
        )))
    }
}

fn expense_label(expense: &Expense) -> String {
    format!("{} {}", expense.category, expense.amount)
}

fn income_label(income: &Income) -> String {
    format!("{} {}", income.source, income.amount)
}

/// Service for expense and income records
pub struct TransactionService<'a> {
    storage: &'a Storage,
    user: UserId,
}

impl<'a> TransactionService<'a> {
    pub fn new(storage: &'a Storage, user: UserId) -> Self {
        Self { storage, user }
    }

    fn build_expense(&self, input: NewExpense) -> FinanceResult<Expense> {
        require_positive(input.amount, "Expense")?;

        let expense = Expense::new(self.user, input.amount, input.category, input.date)
            .with_description(input.description.trim())
            .with_payment_method(input.payment_method)
            .with_subcategory(input.subcategory);
        expense
            .validate()
            .map_err(|e| FinanceError::Validation(e.to_string()))?;
        Ok(expense)
    }

    /// Whether `add_expense` would accept this input, without storing anything
    pub fn check_expense(&self, input: &NewExpense) -> FinanceResult<()> {
        self.build_expense(input.clone()).map(|_| ())
    }

    /// Record an expense entered by the user
    ///
    /// The returned usage covers the month ending `today`. The expense is
    /// stored even if that usage cannot be recomputed.
    pub fn add_expense(
        &self,
        input: NewExpense,
        today: NaiveDate,
    ) -> FinanceResult<RecordedExpense> {
        let expense = self.build_expense(input)?;

        self.storage.store().insert_expense(&expense)?;
        self.storage.log_create(
            EntityType::Expense,
            expense.id.to_string(),
            Some(expense_label(&expense)),
            &expense,
        )?;

        let budget_usage = SummaryService::new(self.storage)
            .budget_usage_for(self.user, expense.category, today)
            .unwrap_or_else(|e| {
                warn!(category = %expense.category, error = %e, "budget usage unavailable");
                None
            });

        Ok(RecordedExpense {
            expense,
            budget_usage,
        })
    }

    /// Record income entered by the user
    pub fn add_income(&self, input: NewIncome) -> FinanceResult<Income> {
        require_positive(input.amount, "Income")?;

        let income = Income::new(self.user, input.amount, input.source, input.date)
            .with_description(input.description.trim());
        income
            .validate()
            .map_err(|e| FinanceError::Validation(e.to_string()))?;

        self.storage.store().insert_income(&income)?;
        self.storage.log_create(
            EntityType::Income,
            income.id.to_string(),
            Some(income_label(&income)),
            &income,
        )?;

        Ok(income)
    }

    /// Record an expense or income dated today in one step
    ///
    /// For expenses the label names the category (unknown labels fall back
    /// to Other); for income it names the source.
    pub fn quick_add(
        &self,
        kind: QuickAddKind,
        amount: Money,
        label: &str,
        today: NaiveDate,
    ) -> FinanceResult<QuickAdded> {
        match kind {
            QuickAddKind::Expense => {
                let category = label.parse().unwrap_or_else(|_| {
                    warn!(label, "unknown category for quick add, using Other");
                    ExpenseCategory::Other
                });
                let recorded = self.add_expense(
                    NewExpense {
                        amount,
                        category,
                        date: today,
                        description: QUICK_ADD_DESCRIPTION.to_string(),
                        payment_method: PaymentMethod::default(),
                        subcategory: None,
                    },
                    today,
                )?;
                Ok(QuickAdded::Expense(recorded))
            }
            QuickAddKind::Income => {
                let source = label.parse().unwrap_or_else(|_| {
                    warn!(label, "unknown source for quick add, using Other");
                    IncomeSource::Other
                });
                let income = self.add_income(NewIncome {
                    amount,
                    source,
                    date: today,
                    description: QUICK_ADD_DESCRIPTION.to_string(),
                })?;
                Ok(QuickAdded::Income(income))
            }
        }
    }

    /// Find an expense by full id or unambiguous prefix
    pub fn find_expense(&self, ident: &str) -> FinanceResult<Expense> {
        let mut matches: Vec<Expense> = self
            .storage
            .store()
            .list_expenses(self.user, None)?
            .into_iter()
            .filter(|e| e.id.matches(ident))
            .collect();
        match matches.len() {
            0 => Err(FinanceError::expense_not_found(ident)),
            1 => Ok(matches.remove(0)),
            n => Err(FinanceError::Validation(format!(
                "'{}' matches {} expenses; use more of the id",
                ident, n
            ))),
        }
    }

    /// Find an income record by full id or unambiguous prefix
    pub fn find_income(&self, ident: &str) -> FinanceResult<Income> {
        let mut matches: Vec<Income> = self
            .storage
            .store()
            .list_income(self.user, None)?
            .into_iter()
            .filter(|i| i.id.matches(ident))
            .collect();
        match matches.len() {
            0 => Err(FinanceError::income_not_found(ident)),
            1 => Ok(matches.remove(0)),
            n => Err(FinanceError::Validation(format!(
                "'{}' matches {} income records; use more of the id",
                ident, n
            ))),
        }
    }

    /// Apply an explicit edit to an expense
    pub fn update_expense(&self, ident: &str, update: ExpenseUpdate) -> FinanceResult<Expense> {
        let before = self.find_expense(ident)?;
        let mut expense = before.clone();

        if let Some(amount) = update.amount {
            require_positive(amount, "Expense")?;
            expense.amount = amount;
        }
        if let Some(category) = update.category {
            expense.category = category;
        }
        if let Some(date) = update.date {
            expense.date = date;
        }
        if let Some(description) = update.description {
            expense.description = description.trim().to_string();
        }
        if let Some(method) = update.payment_method {
            expense.payment_method = method;
        }
        if let Some(subcategory) = update.subcategory {
            expense.subcategory = Some(subcategory).filter(|s| !s.trim().is_empty());
        }
        expense
            .validate()
            .map_err(|e| FinanceError::Validation(e.to_string()))?;
        expense.touch();

        self.storage.store().update_expense(&expense)?;
        self.storage.log_update(
            EntityType::Expense,
            expense.id.to_string(),
            Some(expense_label(&expense)),
            &before,
            &expense,
        )?;

        Ok(expense)
    }

    /// Apply an explicit edit to an income record
    pub fn update_income(&self, ident: &str, update: IncomeUpdate) -> FinanceResult<Income> {
        let before = self.find_income(ident)?;
        let mut income = before.clone();

        if let Some(amount) = update.amount {
            require_positive(amount, "Income")?;
            income.amount = amount;
        }
        if let Some(source) = update.source {
            income.source = source;
        }
        if let Some(date) = update.date {
            income.date = date;
        }
        if let Some(description) = update.description {
            income.description = description.trim().to_string();
        }
        income.touch();

        self.storage.store().update_income(&income)?;
        self.storage.log_update(
            EntityType::Income,
            income.id.to_string(),
            Some(income_label(&income)),
            &before,
            &income,
        )?;

        Ok(income)
    }

    /// Expenses in the window (all expenses when `None`), most recent first
    pub fn list_expenses(&self, window: Option<DateWindow>) -> FinanceResult<Vec<Expense>> {
        self.storage.store().list_expenses(self.user, window)
    }

    /// Income in the window (all income when `None`), most recent first
    pub fn list_incomes(&self, window: Option<DateWindow>) -> FinanceResult<Vec<Income>> {
        self.storage.store().list_income(self.user, window)
    }

    pub fn analyze_expenses(&self, window: DateWindow) -> FinanceResult<ExpenseAnalysis> {
        let expenses = self.list_expenses(Some(window))?;

        let mut by_category = BTreeMap::new();
        let mut by_payment_method = BTreeMap::new();
        for expense in &expenses {
            *by_category.entry(expense.category).or_insert_with(Money::zero) += expense.amount;
            *by_payment_method
                .entry(expense.payment_method)
                .or_insert_with(Money::zero) += expense.amount;
        }
        let total: Money = expenses.iter().map(|e| e.amount).sum();

        Ok(ExpenseAnalysis {
            window,
            count: expenses.len(),
            total,
            average_daily: average_daily(total, &window),
            by_category,
            by_payment_method,
        })
    }

    pub fn analyze_income(&self, window: DateWindow) -> FinanceResult<IncomeAnalysis> {
        let income = self.list_incomes(Some(window))?;

        let mut by_source = BTreeMap::new();
        for record in &income {
            *by_source.entry(record.source).or_insert_with(Money::zero) += record.amount;
        }
        let total: Money = income.iter().map(|i| i.amount).sum();

        Ok(IncomeAnalysis {
            window,
            count: income.len(),
            total,
            average_daily: average_daily(total, &window),
            by_source,
        })
    }
}
