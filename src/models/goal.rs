//! Savings goal model
//!
//! Progress is only ever changed by the user updating `current_amount`;
//! it is never derived from expenses or income.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{GoalId, UserId};
use super::money::Money;

/// Validation errors for savings goals
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalValidationError {
    EmptyName,
    NonPositiveTarget,
    NegativeCurrent,
    PriorityOutOfRange(u8),
}

impl std::fmt::Display for GoalValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Goal name cannot be empty"),
            Self::NonPositiveTarget => write!(f, "Target amount must be greater than zero"),
            Self::NegativeCurrent => write!(f, "Current amount cannot be negative"),
            Self::PriorityOutOfRange(p) => write!(f, "Priority must be 1-5, got {}", p),
        }
    }
}

impl std::error::Error for GoalValidationError {}

/// Something the user is saving towards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: GoalId,
    pub user_id: UserId,
    pub name: String,
    pub target_amount: Money,
    pub current_amount: Money,
    pub target_date: NaiveDate,
    /// 1 (highest) to 5
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavingsGoal {
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        target_amount: Money,
        target_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: GoalId::new(),
            user_id,
            name: name.into(),
            target_amount,
            current_amount: Money::zero(),
            target_date,
            priority: 3,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_current(mut self, current: Money) -> Self {
        self.current_amount = current;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    /// Record a new saved amount
    pub fn set_current(&mut self, amount: Money) {
        self.current_amount = amount;
        self.updated_at = Utc::now();
    }

    /// Progress toward the target, clipped to 0..=100
    pub fn progress(&self) -> f64 {
        self.current_amount
            .percent_of(self.target_amount)
            .clamp(0.0, 100.0)
    }

    pub fn is_complete(&self) -> bool {
        self.current_amount >= self.target_amount
    }

    pub fn remaining(&self) -> Money {
        let remaining = self.target_amount - self.current_amount;
        if remaining.is_negative() {
            Money::zero()
        } else {
            remaining
        }
    }

    pub fn validate(&self) -> Result<(), GoalValidationError> {
        if self.name.trim().is_empty() {
            return Err(GoalValidationError::EmptyName);
        }
        if !self.target_amount.is_positive() {
            return Err(GoalValidationError::NonPositiveTarget);
        }
        if self.current_amount.is_negative() {
            return Err(GoalValidationError::NegativeCurrent);
        }
        if !(1..=5).contains(&self.priority) {
            return Err(GoalValidationError::PriorityOutOfRange(self.priority));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vacation() -> SavingsGoal {
        SavingsGoal::new(
            UserId::default(),
            "Vacation",
            Money::from_dollars(2000),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        )
        .with_current(Money::from_dollars(500))
        .with_priority(1)
    }

    #[test]
    fn test_progress() {
        let goal = vacation();
        assert_eq!(goal.progress(), 25.0);
        assert_eq!(goal.remaining(), Money::from_dollars(1500));
        assert!(!goal.is_complete());
    }

    #[test]
    fn test_progress_is_clipped() {
        let mut goal = vacation();
        goal.set_current(Money::from_dollars(3000));
        assert_eq!(goal.progress(), 100.0);
        assert_eq!(goal.remaining(), Money::zero());
        assert!(goal.is_complete());
    }

    #[test]
    fn test_validation() {
        assert!(vacation().validate().is_ok());
        assert_eq!(
            vacation().with_priority(6).validate(),
            Err(GoalValidationError::PriorityOutOfRange(6))
        );

        let mut unnamed = vacation();
        unnamed.name = " ".into();
        assert_eq!(unnamed.validate(), Err(GoalValidationError::EmptyName));

        let mut no_target = vacation();
        no_target.target_amount = Money::zero();
        assert_eq!(no_target.validate(), Err(GoalValidationError::NonPositiveTarget));
    }
}
