//! Core data models for fintrack
//!
//! This module contains the records the user keeps (expenses, income,
//! budgets, savings goals, the user profile) and the value types they are
//! built from (money, ids, categories, date windows).

pub mod budget;
pub mod category;
pub mod expense;
pub mod goal;
pub mod ids;
pub mod income;
pub mod money;
pub mod period;
pub mod user;

pub use budget::{Budget, BudgetPeriod};
pub use category::{ExpenseCategory, IncomeSource, PaymentMethod, UnknownLabel};
pub use expense::Expense;
pub use goal::SavingsGoal;
pub use ids::{BudgetId, ExpenseId, GoalId, IncomeId, UserId};
pub use income::Income;
pub use money::Money;
pub use period::{DateWindow, FlowRange, Month, SummaryPeriod};
pub use user::{Currency, User};
