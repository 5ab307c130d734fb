//! Budget service
//!
//! One monthly limit per category. Setting a limit for a category that
//! already has one replaces it.

use serde::Serialize;

use crate::audit::EntityType;
use crate::error::{FinanceError, FinanceResult};
use crate::models::{Budget, ExpenseCategory, Money, Month, UserId};
use crate::storage::Storage;

/// Budget vs actual for one category in one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetProgress {
    pub category: ExpenseCategory,
    pub limit: Money,
    pub spent: Money,
    pub remaining: Money,
    /// Spent as a share of the limit, clipped to 0..=100
    pub progress: f64,
}

impl BudgetProgress {
    pub fn is_over(&self) -> bool {
        self.spent > self.limit
    }
}

/// Service for budget management
pub struct BudgetService<'a> {
    storage: &'a Storage,
    user: UserId,
}

impl<'a> BudgetService<'a> {
    pub fn new(storage: &'a Storage, user: UserId) -> Self {
        Self { storage, user }
    }

    /// Set the monthly limit for a category
    pub fn set_budget(&self, category: ExpenseCategory, limit: Money) -> FinanceResult<Budget> {
        let budget = Budget::new(self.user, category, limit);
        budget
            .validate()
            .map_err(|e| FinanceError::Validation(e.to_string()))?;

        let replaced = self.storage.store().upsert_budget(&budget)?;
        match replaced {
            Some(before) => self.storage.log_update(
                EntityType::Budget,
                budget.id.to_string(),
                Some(category.to_string()),
                &before,
                &budget,
            )?,
            None => self.storage.log_create(
                EntityType::Budget,
                budget.id.to_string(),
                Some(category.to_string()),
                &budget,
            )?,
        }

        Ok(budget)
    }

    pub fn list_budgets(&self) -> FinanceResult<Vec<Budget>> {
        self.storage.store().list_budgets(self.user)
    }

    /// Spending against every budget within a calendar month
    pub fn budget_status(&self, month: Month) -> FinanceResult<Vec<BudgetProgress>> {
        let store = self.storage.store();
        let budgets = store.list_budgets(self.user)?;
        let expenses = store.list_expenses(self.user, Some(month.window()))?;

        Ok(budgets
            .into_iter()
            .map(|budget| {
                let spent: Money = expenses
                    .iter()
                    .filter(|e| e.category == budget.category)
                    .map(|e| e.amount)
                    .sum();
                BudgetProgress {
                    category: budget.category,
                    limit: budget.limit,
                    spent,
                    remaining: budget.limit - spent,
                    progress: spent.percent_of(budget.limit).clamp(0.0, 100.0),
                }
            })
            .collect())
    }

    /// Remove the budget for a category
    pub fn remove_budget(&self, category: ExpenseCategory) -> FinanceResult<Budget> {
        let removed = self
            .storage
            .store()
            .delete_budget(self.user, category)?
            .ok_or_else(|| FinanceError::budget_not_found(category.to_string()))?;

        self.storage.log_delete(
            EntityType::Budget,
            removed.id.to_string(),
            Some(category.to_string()),
            &removed,
        )?;

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Expense;
    use crate::storage::testing::{json_storage, sqlite_storage};
    use chrono::NaiveDate;

    fn april() -> Month {
        Month::parse("2025-04").unwrap()
    }

    #[test]
    fn test_set_budget_upserts() {
        let (storage, _temp) = sqlite_storage();
        let service = BudgetService::new(&storage, UserId::default());

        service
            .set_budget(ExpenseCategory::Food, Money::from_dollars(300))
            .unwrap();
        service
            .set_budget(ExpenseCategory::Food, Money::from_dollars(250))
            .unwrap();
        service
            .set_budget(ExpenseCategory::Housing, Money::from_dollars(1200))
            .unwrap();

        let budgets = service.list_budgets().unwrap();
        assert_eq!(budgets.len(), 2);
        let food = budgets
            .iter()
            .find(|b| b.category == ExpenseCategory::Food)
            .unwrap();
        assert_eq!(food.limit, Money::from_dollars(250));
    }

    #[test]
    fn test_negative_limit_rejected() {
        let (storage, _temp) = json_storage();
        let service = BudgetService::new(&storage, UserId::default());
        let err = service
            .set_budget(ExpenseCategory::Food, Money::from_cents(-1))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_status_uses_calendar_month_and_clips() {
        let (storage, _temp) = json_storage();
        let user = UserId::default();
        let service = BudgetService::new(&storage, user);
        service
            .set_budget(ExpenseCategory::Food, Money::from_dollars(100))
            .unwrap();

        let store = storage.store();
        for (day, month, dollars) in [(5, 4, 80), (20, 4, 70), (31, 3, 500)] {
            let date = NaiveDate::from_ymd_opt(2025, month, day).unwrap();
            store
                .insert_expense(&Expense::new(
                    user,
                    Money::from_dollars(dollars),
                    ExpenseCategory::Food,
                    date,
                ))
                .unwrap();
        }

        let status = service.budget_status(april()).unwrap();
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].spent, Money::from_dollars(150));
        assert_eq!(status[0].remaining, Money::from_dollars(-50));
        assert_eq!(status[0].progress, 100.0);
        assert!(status[0].is_over());
    }

    #[test]
    fn test_remove_budget() {
        let (storage, _temp) = json_storage();
        let service = BudgetService::new(&storage, UserId::default());
        service
            .set_budget(ExpenseCategory::Food, Money::from_dollars(100))
            .unwrap();

        service.remove_budget(ExpenseCategory::Food).unwrap();
        assert!(service.list_budgets().unwrap().is_empty());
        assert!(service
            .remove_budget(ExpenseCategory::Food)
            .unwrap_err()
            .is_not_found());
    }
}
