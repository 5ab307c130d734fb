//! The record store seam
//!
//! Every table is scoped to a user. Reads of expenses and income can be
//! narrowed to a closed date window; everything else is read whole.

use crate::config::StoreBackend;
use crate::error::FinanceResult;
use crate::models::{
    Budget, DateWindow, Expense, ExpenseCategory, GoalId, Income, SavingsGoal, User, UserId,
};

/// Every row a user owns outside the users table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRecords {
    pub expenses: Vec<Expense>,
    pub income: Vec<Income>,
    pub budgets: Vec<Budget>,
    pub goals: Vec<SavingsGoal>,
}

impl UserRecords {
    pub fn len(&self) -> usize {
        self.expenses.len() + self.income.len() + self.budgets.len() + self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Typed access to the users, expenses, income, budgets and savings goal tables
///
/// Lists of expenses and income come back most recent first. Budgets are
/// unique on (user, category).
pub trait RecordStore {
    /// Which backend this is
    fn backend(&self) -> StoreBackend;

    // Users

    fn get_user(&self, id: UserId) -> FinanceResult<Option<User>>;

    /// Insert the user, or replace the existing row with the same id
    fn save_user(&self, user: &User) -> FinanceResult<()>;

    /// Remove the user row; returns whether it existed
    fn delete_user(&self, id: UserId) -> FinanceResult<bool>;

    // Expenses

    fn insert_expense(&self, expense: &Expense) -> FinanceResult<()>;

    /// Replace an existing expense; `NotFound` if its id is unknown
    fn update_expense(&self, expense: &Expense) -> FinanceResult<()>;

    fn list_expenses(&self, user: UserId, window: Option<DateWindow>)
        -> FinanceResult<Vec<Expense>>;

    // Income

    fn insert_income(&self, income: &Income) -> FinanceResult<()>;

    fn update_income(&self, income: &Income) -> FinanceResult<()>;

    fn list_income(&self, user: UserId, window: Option<DateWindow>) -> FinanceResult<Vec<Income>>;

    // Budgets

    /// Store a budget, replacing any budget for the same (user, category)
    ///
    /// Returns the budget that was replaced, if any.
    fn upsert_budget(&self, budget: &Budget) -> FinanceResult<Option<Budget>>;

    fn list_budgets(&self, user: UserId) -> FinanceResult<Vec<Budget>>;

    /// Remove the budget for one category, returning it if it existed
    fn delete_budget(
        &self,
        user: UserId,
        category: ExpenseCategory,
    ) -> FinanceResult<Option<Budget>>;

    // Savings goals

    fn insert_goal(&self, goal: &SavingsGoal) -> FinanceResult<()>;

    fn update_goal(&self, goal: &SavingsGoal) -> FinanceResult<()>;

    fn list_goals(&self, user: UserId) -> FinanceResult<Vec<SavingsGoal>>;

    fn delete_goal(&self, user: UserId, id: GoalId) -> FinanceResult<bool>;

    // Bulk

    /// Swap the user's expenses, income, budgets and goals for `records`
    ///
    /// All four tables change together or not at all. Other users' rows
    /// are untouched.
    fn replace_user_records(&self, user: UserId, records: &UserRecords) -> FinanceResult<()>;
}
