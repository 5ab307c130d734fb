//! Demo data for a fresh installation
//!
//! `fintrack init --demo` resets the user's rows and loads a small data set
//! so every view has something to show. Dates are placed in the current
//! month so the default `month` summary picks them up.

use chrono::{Datelike, Duration, NaiveDate};
use tracing::info;

use crate::error::FinanceResult;
use crate::models::{
    Budget, Expense, ExpenseCategory, Income, IncomeSource, Money, Month, PaymentMethod,
    SavingsGoal, UserId,
};

use super::store::{RecordStore, UserRecords};

/// What `seed_demo` inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub expenses: usize,
    pub income: usize,
    pub budgets: usize,
    pub goals: usize,
}

/// Replace the user's data with the demo data set
pub fn seed_demo(
    store: &dyn RecordStore,
    user: UserId,
    today: NaiveDate,
) -> FinanceResult<SeedSummary> {
    let month_start = Month::containing(today).start_date();
    let second_day = (month_start + Duration::days(1)).min(today);
    let year_end = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);

    let records = UserRecords {
        expenses: vec![
            Expense::new(user, Money::from_dollars(500), ExpenseCategory::Housing, month_start)
                .with_description("Rent")
                .with_payment_method(PaymentMethod::BankTransfer),
            Expense::new(user, Money::from_dollars(100), ExpenseCategory::Food, second_day)
                .with_description("Groceries")
                .with_payment_method(PaymentMethod::CreditCard),
        ],
        income: vec![Income::new(
            user,
            Money::from_dollars(3000),
            IncomeSource::Salary,
            month_start,
        )
        .with_description("Monthly salary")],
        budgets: vec![Budget::new(user, ExpenseCategory::Food, Money::from_dollars(300))],
        goals: vec![
            SavingsGoal::new(user, "Vacation", Money::from_dollars(2000), year_end)
                .with_current(Money::from_dollars(500))
                .with_priority(1),
        ],
    };
    store.replace_user_records(user, &records)?;

    let summary = SeedSummary {
        expenses: records.expenses.len(),
        income: records.income.len(),
        budgets: records.budgets.len(),
        goals: records.goals.len(),
    };
    info!(user = %user, ?summary, "loaded demo data");
    Ok(summary)
}
