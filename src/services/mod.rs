//! Service layer for fintrack
//!
//! Services sit on top of the storage layer and own validation, audit
//! logging and anything computed from more than one table.

pub mod budget;
pub mod dashboard;
pub mod goal;
pub mod import;
pub mod insight;
pub mod summary;
pub mod transaction;
pub mod user;

pub use budget::{BudgetProgress, BudgetService};
pub use dashboard::{
    health_indicators, Advice, Conclusion, DashboardService, HealthIndicators, MonthlyFlow,
    MonthlyMetrics,
};
pub use goal::{goal_totals, GoalService, GoalTotals, NewGoal};
pub use import::{ImportResult, ImportService};
pub use insight::{ExtractedTransaction, InsightService, NOT_ENOUGH_DATA};
pub use summary::{summarize, BudgetStatus, BudgetUsage, FinancialSummary, SummaryService};
pub use transaction::{
    ExpenseAnalysis, ExpenseUpdate, IncomeAnalysis, IncomeUpdate, NewExpense, NewIncome,
    QuickAddKind, QuickAdded, RecordedExpense, TransactionService,
};
pub use user::{AccountDeletion, UserService};
