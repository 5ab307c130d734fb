//! Financial summary aggregator
//!
//! Reduces one user's expenses, income and budgets over a closed date window
//! to totals, per-category breakdowns and budget utilization. Nothing here
//! is stored: every summary is recomputed from the raw records, so running
//! it twice without writes in between gives the same answer.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::FinanceResult;
use crate::models::{
    Budget, DateWindow, Expense, ExpenseCategory, Income, IncomeSource, Money, SummaryPeriod,
    UserId,
};
use crate::storage::Storage;

/// How close a category is to its limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BudgetStatus {
    /// At or below 75% of the limit
    OnTrack,
    /// Above 75%
    Warning,
    /// Above 90%
    Critical,
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OnTrack => write!(f, "On track"),
            Self::Warning => write!(f, "Warning"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// Spending against one category's budget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetUsage {
    pub category: ExpenseCategory,
    pub limit: Money,
    pub spent: Money,
    /// May be negative when over budget
    pub remaining: Money,
    /// `spent / limit * 100`, or 0 when the limit is 0; not capped at 100
    pub percentage: f64,
}

impl BudgetUsage {
    pub fn new(category: ExpenseCategory, limit: Money, spent: Money) -> Self {
        let percentage = if limit.is_positive() {
            spent.percent_of(limit)
        } else {
            0.0
        };
        Self {
            category,
            limit,
            spent,
            remaining: limit - spent,
            percentage,
        }
    }

    pub fn status(&self) -> BudgetStatus {
        if self.percentage > 90.0 {
            BudgetStatus::Critical
        } else if self.percentage > 75.0 {
            BudgetStatus::Warning
        } else {
            BudgetStatus::OnTrack
        }
    }

    pub fn is_over(&self) -> bool {
        self.remaining.is_negative()
    }
}

/// Totals for one user over one window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub window: DateWindow,
    pub total_income: Money,
    pub total_expenses: Money,
    /// `total_income - total_expenses`; may be negative
    pub net_balance: Money,
    /// Only categories that have a budget
    pub budget_usage: BTreeMap<ExpenseCategory, BudgetUsage>,
    pub expenses_by_category: BTreeMap<ExpenseCategory, Money>,
    pub income_by_source: BTreeMap<IncomeSource, Money>,
    pub expense_count: usize,
    pub income_count: usize,
}

impl FinancialSummary {
    /// Share of income left after expenses, as a percentage (0 without income)
    pub fn savings_rate(&self) -> f64 {
        self.net_balance.percent_of(self.total_income)
    }

    pub fn is_empty(&self) -> bool {
        self.expense_count == 0 && self.income_count == 0
    }
}

/// Reduce records to a summary for `window`
///
/// Expenses and income dated outside the window are ignored; budgets are
/// not date-filtered. Callers are expected to pass one user's records.
pub fn summarize(
    window: DateWindow,
    expenses: &[Expense],
    income: &[Income],
    budgets: &[Budget],
) -> FinancialSummary {
    let mut expenses_by_category: BTreeMap<ExpenseCategory, Money> = BTreeMap::new();
    let mut expense_count = 0;
    for expense in expenses.iter().filter(|e| window.contains(e.date)) {
        *expenses_by_category.entry(expense.category).or_default() += expense.amount;
        expense_count += 1;
    }

    let mut income_by_source: BTreeMap<IncomeSource, Money> = BTreeMap::new();
    let mut income_count = 0;
    for record in income.iter().filter(|i| window.contains(i.date)) {
        *income_by_source.entry(record.source).or_default() += record.amount;
        income_count += 1;
    }

    let total_expenses: Money = expenses_by_category.values().sum();
    let total_income: Money = income_by_source.values().sum();

    let budget_usage = budgets
        .iter()
        .map(|budget| {
            let spent = expenses_by_category
                .get(&budget.category)
                .copied()
                .unwrap_or_default();
            (
                budget.category,
                BudgetUsage::new(budget.category, budget.limit, spent),
            )
        })
        .collect();

    FinancialSummary {
        window,
        total_income,
        total_expenses,
        net_balance: total_income - total_expenses,
        budget_usage,
        expenses_by_category,
        income_by_source,
        expense_count,
        income_count,
    }
}

/// Service that loads records and runs the aggregator
pub struct SummaryService<'a> {
    storage: &'a Storage,
}

impl<'a> SummaryService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Summary for the named period ending today
    pub fn financial_summary(
        &self,
        user: UserId,
        period: SummaryPeriod,
    ) -> FinanceResult<FinancialSummary> {
        self.financial_summary_at(user, period, chrono::Local::now().date_naive())
    }

    /// Summary for the named period ending on `today`
    ///
    /// Any fetch failure fails the whole summary.
    pub fn financial_summary_at(
        &self,
        user: UserId,
        period: SummaryPeriod,
        today: NaiveDate,
    ) -> FinanceResult<FinancialSummary> {
        let window = period.window_ending(today);
        self.summary_for_window(user, window)
    }

    /// Summary for an explicit window
    pub fn summary_for_window(
        &self,
        user: UserId,
        window: DateWindow,
    ) -> FinanceResult<FinancialSummary> {
        let store = self.storage.store();
        let expenses = store.list_expenses(user, Some(window))?;
        let income = store.list_income(user, Some(window))?;
        let budgets = store.list_budgets(user)?;

        debug!(
            %user,
            %window,
            expenses = expenses.len(),
            income = income.len(),
            budgets = budgets.len(),
            "summarizing"
        );
        Ok(summarize(window, &expenses, &income, &budgets))
    }

    /// Usage of one category's budget over the default `month` window
    ///
    /// `None` when the category has no budget.
    pub fn budget_usage_for(
        &self,
        user: UserId,
        category: ExpenseCategory,
        today: NaiveDate,
    ) -> FinanceResult<Option<BudgetUsage>> {
        let store = self.storage.store();
        let Some(budget) = store
            .list_budgets(user)?
            .into_iter()
            .find(|b| b.category == category)
        else {
            return Ok(None);
        };

        let window = SummaryPeriod::Month.window_ending(today);
        let spent: Money = store
            .list_expenses(user, Some(window))?
            .iter()
            .filter(|e| e.category == category)
            .map(|e| e.amount)
            .sum();

        Ok(Some(BudgetUsage::new(category, budget.limit, spent)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::{json_storage, sqlite_storage};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
    }

    fn user() -> UserId {
        UserId::default()
    }

    fn expense(dollars: i64, category: ExpenseCategory, date: NaiveDate) -> Expense {
        Expense::new(user(), Money::from_dollars(dollars), category, date)
    }

    fn salary(dollars: i64, date: NaiveDate) -> Income {
        Income::new(user(), Money::from_dollars(dollars), IncomeSource::Salary, date)
    }

    fn food_budget(dollars: i64) -> Budget {
        Budget::new(user(), ExpenseCategory::Food, Money::from_dollars(dollars))
    }

    fn april() -> DateWindow {
        DateWindow::new(d(1), d(30))
    }

    #[test]
    fn test_worked_example() {
        let expenses = vec![
            expense(500, ExpenseCategory::Housing, d(1)),
            expense(100, ExpenseCategory::Food, d(2)),
        ];
        let income = vec![salary(3000, d(1))];
        let budgets = vec![food_budget(300)];

        let summary = summarize(april(), &expenses, &income, &budgets);

        assert_eq!(summary.total_expenses, Money::from_dollars(600));
        assert_eq!(summary.total_income, Money::from_dollars(3000));
        assert_eq!(summary.net_balance, Money::from_dollars(2400));

        let food = &summary.budget_usage[&ExpenseCategory::Food];
        assert_eq!(food.limit, Money::from_dollars(300));
        assert_eq!(food.spent, Money::from_dollars(100));
        assert_eq!(food.remaining, Money::from_dollars(200));
        assert!((food.percentage - 33.333).abs() < 0.01);
        assert_eq!(food.status(), BudgetStatus::OnTrack);
    }

    #[test]
    fn test_unbudgeted_categories_only_in_breakdown() {
        let expenses = vec![
            expense(500, ExpenseCategory::Housing, d(1)),
            expense(100, ExpenseCategory::Food, d(2)),
        ];
        let summary = summarize(april(), &expenses, &[], &[food_budget(300)]);

        assert!(!summary.budget_usage.contains_key(&ExpenseCategory::Housing));
        assert_eq!(
            summary.expenses_by_category[&ExpenseCategory::Housing],
            Money::from_dollars(500)
        );
    }

    #[test]
    fn test_budget_without_spending_has_zero_usage() {
        let summary = summarize(april(), &[], &[], &[food_budget(300)]);
        let food = &summary.budget_usage[&ExpenseCategory::Food];
        assert_eq!(food.spent, Money::zero());
        assert_eq!(food.percentage, 0.0);
    }

    #[test]
    fn test_zero_limit_percentage_is_zero() {
        let expenses = vec![expense(50, ExpenseCategory::Food, d(3))];
        let summary = summarize(april(), &expenses, &[], &[food_budget(0)]);

        let food = &summary.budget_usage[&ExpenseCategory::Food];
        assert_eq!(food.percentage, 0.0);
        assert_eq!(food.remaining, Money::from_dollars(-50));
    }

    #[test]
    fn test_percentage_may_exceed_one_hundred() {
        let expenses = vec![expense(450, ExpenseCategory::Food, d(3))];
        let summary = summarize(april(), &expenses, &[], &[food_budget(300)]);

        let food = &summary.budget_usage[&ExpenseCategory::Food];
        assert_eq!(food.percentage, 150.0);
        assert!(food.is_over());
        assert_eq!(food.status(), BudgetStatus::Critical);
    }

    #[test]
    fn test_status_thresholds() {
        let usage = |spent| {
            BudgetUsage::new(
                ExpenseCategory::Food,
                Money::from_dollars(100),
                Money::from_dollars(spent),
            )
        };
        assert_eq!(usage(75).status(), BudgetStatus::OnTrack);
        assert_eq!(usage(76).status(), BudgetStatus::Warning);
        assert_eq!(usage(90).status(), BudgetStatus::Warning);
        assert_eq!(usage(91).status(), BudgetStatus::Critical);
    }

    #[test]
    fn test_net_balance_may_be_negative() {
        let expenses = vec![expense(500, ExpenseCategory::Housing, d(1))];
        let summary = summarize(april(), &expenses, &[], &[]);
        assert_eq!(summary.total_income, Money::zero());
        assert_eq!(summary.net_balance, Money::from_dollars(-500));
    }

    #[test]
    fn test_empty_input_gives_zeros() {
        let summary = summarize(april(), &[], &[], &[]);
        assert_eq!(summary.total_expenses, Money::zero());
        assert_eq!(summary.net_balance, Money::zero());
        assert!(summary.is_empty());
        assert!(summary.budget_usage.is_empty());
    }

    #[test]
    fn test_window_boundaries_are_included() {
        let expenses = vec![
            expense(1, ExpenseCategory::Food, d(1)),
            expense(2, ExpenseCategory::Food, d(30)),
            expense(4, ExpenseCategory::Food, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()),
            expense(8, ExpenseCategory::Food, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()),
        ];
        let summary = summarize(april(), &expenses, &[], &[]);
        assert_eq!(summary.total_expenses, Money::from_dollars(3));
        assert_eq!(summary.expense_count, 2);
    }

    #[test]
    fn test_total_matches_sum_of_amounts() {
        let expenses: Vec<Expense> = (1..=20)
            .map(|n| {
                let category = ExpenseCategory::all()[n as usize % ExpenseCategory::all().len()];
                Expense::new(user(), Money::from_cents(n * 137), category, d(n as u32))
            })
            .collect();
        let summary = summarize(april(), &expenses, &[], &[]);

        let expected: Money = expenses.iter().map(|e| e.amount).sum();
        assert_eq!(summary.total_expenses, expected);
        assert_eq!(
            summary.expenses_by_category.values().copied().sum::<Money>(),
            expected
        );
    }

    fn seed(storage: &Storage) {
        let store = storage.store();
        let january = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        store
            .insert_expense(&expense(500, ExpenseCategory::Housing, d(1)))
            .unwrap();
        store
            .insert_expense(&expense(100, ExpenseCategory::Food, d(2)))
            .unwrap();
        store
            .insert_expense(&expense(40, ExpenseCategory::Food, january))
            .unwrap();
        store.insert_income(&salary(3000, d(1))).unwrap();
        store.upsert_budget(&food_budget(300)).unwrap();
    }

    #[test]
    fn test_service_uses_period_window() {
        let (storage, _temp) = json_storage();
        seed(&storage);
        let service = SummaryService::new(&storage);

        let month = service
            .financial_summary_at(user(), SummaryPeriod::Month, d(30))
            .unwrap();
        assert_eq!(month.total_expenses, Money::from_dollars(600));
        assert_eq!(month.net_balance, Money::from_dollars(2400));

        let year = service
            .financial_summary_at(user(), SummaryPeriod::Year, d(30))
            .unwrap();
        assert_eq!(year.total_expenses, Money::from_dollars(640));
    }

    #[test]
    fn test_summary_is_idempotent() {
        let (storage, _temp) = json_storage();
        seed(&storage);
        let service = SummaryService::new(&storage);

        let first = service
            .financial_summary_at(user(), SummaryPeriod::Month, d(30))
            .unwrap();
        let second = service
            .financial_summary_at(user(), SummaryPeriod::Month, d(30))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_backends_agree() {
        let (json, _t1) = json_storage();
        let (sqlite, _t2) = sqlite_storage();
        seed(&json);
        seed(&sqlite);

        let from_json = SummaryService::new(&json)
            .financial_summary_at(user(), SummaryPeriod::Year, d(30))
            .unwrap();
        let from_sqlite = SummaryService::new(&sqlite)
            .financial_summary_at(user(), SummaryPeriod::Year, d(30))
            .unwrap();
        assert_eq!(from_json, from_sqlite);
    }

    #[test]
    fn test_budget_usage_for_category() {
        let (storage, _temp) = json_storage();
        seed(&storage);
        let service = SummaryService::new(&storage);

        let food = service
            .budget_usage_for(user(), ExpenseCategory::Food, d(30))
            .unwrap()
            .unwrap();
        assert_eq!(food.spent, Money::from_dollars(100));

        let housing = service
            .budget_usage_for(user(), ExpenseCategory::Housing, d(30))
            .unwrap();
        assert!(housing.is_none());
    }
}
