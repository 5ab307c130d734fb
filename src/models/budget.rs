//! Budget model
//!
//! A standing monthly spending limit for one expense category. There is at
//! most one budget per (user, category); storing a new one replaces the old.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::ExpenseCategory;
use super::ids::{BudgetId, UserId};
use super::money::Money;

/// How often a budget limit resets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BudgetPeriod {
    #[default]
    Monthly,
}

impl std::fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "Monthly"),
        }
    }
}

/// Validation errors for budgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetValidationError {
    NegativeLimit,
}

impl std::fmt::Display for BudgetValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeLimit => write!(f, "Budget limit cannot be negative"),
        }
    }
}

impl std::error::Error for BudgetValidationError {}

/// A spending limit for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserId,
    pub category: ExpenseCategory,
    pub limit: Money,
    #[serde(default)]
    pub period: BudgetPeriod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Create a new monthly budget
    pub fn new(user_id: UserId, category: ExpenseCategory, limit: Money) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            user_id,
            category,
            limit,
            period: BudgetPeriod::Monthly,
            created_at: now,
            updated_at: now,
        }
    }

    /// The (user, category) pair budgets are unique on
    pub fn key(&self) -> (UserId, ExpenseCategory) {
        (self.user_id, self.category)
    }

    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        if self.limit.is_negative() {
            return Err(BudgetValidationError::NegativeLimit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_budget_is_monthly() {
        let budget = Budget::new(
            UserId::default(),
            ExpenseCategory::Food,
            Money::from_dollars(300),
        );
        assert_eq!(budget.period, BudgetPeriod::Monthly);
        assert_eq!(budget.key(), (UserId::default(), ExpenseCategory::Food));
        assert!(budget.validate().is_ok());
    }

    #[test]
    fn test_zero_limit_is_valid() {
        let budget = Budget::new(UserId::default(), ExpenseCategory::Food, Money::zero());
        assert!(budget.validate().is_ok());
    }

    #[test]
    fn test_negative_limit_rejected() {
        let budget = Budget::new(UserId::default(), ExpenseCategory::Food, Money::from_cents(-1));
        assert_eq!(budget.validate(), Err(BudgetValidationError::NegativeLimit));
    }
}
