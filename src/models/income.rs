//! Income model
//!
//! A single inflow, tagged with the source it came from.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::category::IncomeSource;
use super::ids::{IncomeId, UserId};
use super::money::Money;

/// Validation errors for income records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomeValidationError {
    NegativeAmount,
}

impl std::fmt::Display for IncomeValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeAmount => write!(f, "Income amount cannot be negative"),
        }
    }
}

impl std::error::Error for IncomeValidationError {}

/// A recorded income
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: IncomeId,
    pub user_id: UserId,
    pub amount: Money,
    pub source: IncomeSource,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Income {
    /// Create a new income record
    pub fn new(user_id: UserId, amount: Money, source: IncomeSource, date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: IncomeId::new(),
            user_id,
            amount,
            source,
            date,
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the record as edited
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), IncomeValidationError> {
        if self.amount.is_negative() {
            return Err(IncomeValidationError::NegativeAmount);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_income() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let income = Income::new(
            UserId::default(),
            Money::from_dollars(3000),
            IncomeSource::Salary,
            date,
        )
        .with_description("Monthly salary");

        assert_eq!(income.amount.cents(), 300000);
        assert_eq!(income.source, IncomeSource::Salary);
        assert_eq!(income.description, "Monthly salary");
        assert!(income.validate().is_ok());
    }

    #[test]
    fn test_validation_negative_amount() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let income = Income::new(
            UserId::default(),
            Money::from_cents(-100),
            IncomeSource::Other,
            date,
        );

        assert!(matches!(
            income.validate(),
            Err(IncomeValidationError::NegativeAmount)
        ));
    }

    #[test]
    fn test_serialization() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let income = Income::new(
            UserId::default(),
            Money::from_dollars(10),
            IncomeSource::Gifts,
            date,
        );

        let json = serde_json::to_string(&income).unwrap();
        let deserialized: Income = serde_json::from_str(&json).unwrap();

        assert_eq!(income, deserialized);
    }
}
