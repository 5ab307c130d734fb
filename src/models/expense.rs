//! Expense model
//!
//! A single outflow recorded by the user or by bulk import. Amounts are
//! stored as positive values; the direction is implied by the table.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::category::{ExpenseCategory, PaymentMethod};
use super::ids::{ExpenseId, UserId};
use super::money::Money;

/// Validation errors for expenses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseValidationError {
    NegativeAmount,
    DescriptionTooLong(usize),
}

impl std::fmt::Display for ExpenseValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeAmount => write!(f, "Expense amount cannot be negative"),
            Self::DescriptionTooLong(len) => {
                write!(f, "Description too long ({} chars, max 500)", len)
            }
        }
    }
}

impl std::error::Error for ExpenseValidationError {}

/// A recorded expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub user_id: UserId,
    pub amount: Money,
    pub category: ExpenseCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Create a new expense with an empty description and unknown payment method
    pub fn new(user_id: UserId, amount: Money, category: ExpenseCategory, date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: ExpenseId::new(),
            user_id,
            amount,
            category,
            subcategory: None,
            date,
            description: String::new(),
            payment_method: PaymentMethod::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    pub fn with_subcategory(mut self, subcategory: Option<String>) -> Self {
        self.subcategory = subcategory.filter(|s| !s.trim().is_empty());
        self
    }

    /// Mark the record as edited
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), ExpenseValidationError> {
        if self.amount.is_negative() {
            return Err(ExpenseValidationError::NegativeAmount);
        }
        if self.description.len() > 500 {
            return Err(ExpenseValidationError::DescriptionTooLong(
                self.description.len(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    #[test]
    fn test_new_expense() {
        let expense = Expense::new(
            UserId::default(),
            Money::from_dollars(500),
            ExpenseCategory::Housing,
            date(1),
        )
        .with_description("Rent")
        .with_payment_method(PaymentMethod::BankTransfer);

        assert_eq!(expense.amount.cents(), 50000);
        assert_eq!(expense.description, "Rent");
        assert_eq!(expense.payment_method, PaymentMethod::BankTransfer);
        assert!(expense.subcategory.is_none());
        assert!(expense.validate().is_ok());
    }

    #[test]
    fn test_blank_subcategory_is_dropped() {
        let expense = Expense::new(UserId::default(), Money::zero(), ExpenseCategory::Food, date(2))
            .with_subcategory(Some("  ".into()));
        assert!(expense.subcategory.is_none());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let expense = Expense::new(
            UserId::default(),
            Money::from_cents(-1),
            ExpenseCategory::Food,
            date(2),
        );
        assert_eq!(expense.validate(), Err(ExpenseValidationError::NegativeAmount));
    }

    #[test]
    fn test_zero_amount_is_valid() {
        let expense = Expense::new(
            UserId::default(),
            Money::zero(),
            ExpenseCategory::Other,
            date(3),
        );
        assert!(expense.validate().is_ok());
    }
}
