//! Dashboard service
//!
//! Month-over-month metrics, the monthly cash-flow series, health
//! indicators and the rule-based month-end conclusion.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::FinanceResult;
use crate::models::{FlowRange, Money, Month, UserId};
use crate::storage::Storage;

use super::goal::{goal_totals, GoalTotals};

/// Headline numbers for the current calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyMetrics {
    pub month: Month,
    pub spending: Money,
    pub income: Money,
    pub previous_spending: Money,
    pub previous_income: Money,
    /// Change vs the previous month in percent; 0 when that month was 0
    pub spending_change: f64,
    pub income_change: f64,
    pub savings: GoalTotals,
    /// `income - spending + saved`
    pub net_cash_flow: Money,
}

/// Income and spending for one month of the flow series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyFlow {
    pub month: Month,
    pub income: Money,
    pub spending: Money,
    /// `income - spending`
    pub savings: Money,
}

/// Averages over a flow series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealthIndicators {
    /// Mean monthly savings over mean monthly income, in percent
    pub average_savings_rate: f64,
    /// Mean monthly spending over mean monthly income, in percent
    pub expense_to_income_ratio: f64,
}

/// One line of month-end feedback
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Advice {
    /// Income exceeded spending by this much
    Saving(Money),
    /// Spending exceeded income by this much
    Overspending(Money),
    GoalsAbove75,
    GoalsAbove50,
    GoalsBelow50,
    /// Spending is above 80% of income
    ReduceDiscretionary,
    /// Spending did not drop from last month
    MaintainDiscipline,
    /// Suggested extra monthly contribution
    BoostSavings(Money),
}

/// Month-end conclusion and recommendations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conclusion {
    pub month: Month,
    pub income: Money,
    pub spending: Money,
    pub net: Money,
    pub savings: GoalTotals,
    /// How much less was spent than last month (0 if not less)
    pub spending_reduction: Money,
    pub assessment: Vec<Advice>,
    pub recommendations: Vec<Advice>,
}

fn change_percent(current: Money, previous: Money) -> f64 {
    if previous.is_zero() {
        0.0
    } else {
        (current - previous).percent_of(previous)
    }
}

/// Mean-based indicators over a flow series (zeros without income)
pub fn health_indicators(flows: &[MonthlyFlow]) -> HealthIndicators {
    let income: Money = flows.iter().map(|f| f.income).sum();
    let spending: Money = flows.iter().map(|f| f.spending).sum();
    let savings: Money = flows.iter().map(|f| f.savings).sum();

    // Means share the same month count, so the ratios of sums are equal
    HealthIndicators {
        average_savings_rate: savings.percent_of(income),
        expense_to_income_ratio: spending.percent_of(income),
    }
}

/// Service for dashboard views
pub struct DashboardService<'a> {
    storage: &'a Storage,
    user: UserId,
}

impl<'a> DashboardService<'a> {
    pub fn new(storage: &'a Storage, user: UserId) -> Self {
        Self { storage, user }
    }

    fn month_totals(&self, month: Month) -> FinanceResult<(Money, Money)> {
        let store = self.storage.store();
        let window = Some(month.window());
        let spending = store
            .list_expenses(self.user, window)?
            .iter()
            .map(|e| e.amount)
            .sum();
        let income = store
            .list_income(self.user, window)?
            .iter()
            .map(|i| i.amount)
            .sum();
        Ok((spending, income))
    }

    fn savings(&self) -> FinanceResult<GoalTotals> {
        Ok(goal_totals(&self.storage.store().list_goals(self.user)?))
    }

    pub fn monthly_metrics(&self, today: NaiveDate) -> FinanceResult<MonthlyMetrics> {
        let month = Month::containing(today);
        let (spending, income) = self.month_totals(month)?;
        let (previous_spending, previous_income) = self.month_totals(month.previous())?;
        let savings = self.savings()?;

        Ok(MonthlyMetrics {
            month,
            spending,
            income,
            previous_spending,
            previous_income,
            spending_change: change_percent(spending, previous_spending),
            income_change: change_percent(income, previous_income),
            savings,
            net_cash_flow: income - spending + savings.saved,
        })
    }

    /// Per-month income and spending over the range, oldest month first
    ///
    /// A month appears when it has income or spending (or both).
    pub fn monthly_flow(
        &self,
        range: FlowRange,
        today: NaiveDate,
    ) -> FinanceResult<Vec<MonthlyFlow>> {
        let window = Some(range.window_ending(today));
        let store = self.storage.store();

        let mut months: BTreeMap<Month, (Money, Money)> = BTreeMap::new();
        for expense in store.list_expenses(self.user, window)? {
            months.entry(Month::containing(expense.date)).or_default().1 += expense.amount;
        }
        for income in store.list_income(self.user, window)? {
            months.entry(Month::containing(income.date)).or_default().0 += income.amount;
        }

        Ok(months
            .into_iter()
            .map(|(month, (income, spending))| MonthlyFlow {
                month,
                income,
                spending,
                savings: income - spending,
            })
            .collect())
    }

    /// Month-end assessment with recommendations
    pub fn conclusion(&self, today: NaiveDate) -> FinanceResult<Conclusion> {
        let month = Month::containing(today);
        let (spending, income) = self.month_totals(month)?;
        let (previous_spending, _) = self.month_totals(month.previous())?;
        let savings = self.savings()?;

        let net = income - spending;
        let spending_reduction = if previous_spending > spending {
            previous_spending - spending
        } else {
            Money::zero()
        };

        let mut assessment = Vec::new();
        if income > spending {
            assessment.push(Advice::Saving(net));
        } else {
            assessment.push(Advice::Overspending(spending - income));
        }

        let saved = savings.saved.cents() as f64;
        let target = savings.target.cents() as f64;
        if saved >= target * 0.75 {
            assessment.push(Advice::GoalsAbove75);
        } else if saved >= target * 0.5 {
            assessment.push(Advice::GoalsAbove50);
        } else {
            assessment.push(Advice::GoalsBelow50);
        }

        let mut recommendations = Vec::new();
        if spending.cents() as f64 > income.cents() as f64 * 0.8 {
            recommendations.push(Advice::ReduceDiscretionary);
        }
        if spending_reduction.is_zero() && previous_spending.is_positive() {
            recommendations.push(Advice::MaintainDiscipline);
        }
        if saved < target * 0.5 {
            let gap = savings.target - savings.saved;
            recommendations.push(Advice::BoostSavings(Money::from_cents(
                (gap.cents() as f64 * 0.1).round() as i64,
            )));
        }

        Ok(Conclusion {
            month,
            income,
            spending,
            net,
            savings,
            spending_reduction,
            assessment,
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Expense, ExpenseCategory, Income, IncomeSource, SavingsGoal};
    use crate::storage::testing::json_storage;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn spend(storage: &Storage, dollars: i64, date: NaiveDate) {
        storage
            .store()
            .insert_expense(&Expense::new(
                UserId::default(),
                Money::from_dollars(dollars),
                ExpenseCategory::Food,
                date,
            ))
            .unwrap();
    }

    fn earn(storage: &Storage, dollars: i64, date: NaiveDate) {
        storage
            .store()
            .insert_income(&Income::new(
                UserId::default(),
                Money::from_dollars(dollars),
                IncomeSource::Salary,
                date,
            ))
            .unwrap();
    }

    fn save_goal(storage: &Storage, target: i64, current: i64) {
        storage
            .store()
            .insert_goal(
                &SavingsGoal::new(
                    UserId::default(),
                    "Vacation",
                    Money::from_dollars(target),
                    ymd(2025, 12, 31),
                )
                .with_current(Money::from_dollars(current)),
            )
            .unwrap();
    }

    #[test]
    fn test_monthly_metrics() {
        let (storage, _temp) = json_storage();
        spend(&storage, 200, ymd(2025, 3, 10));
        spend(&storage, 300, ymd(2025, 4, 2));
        earn(&storage, 3000, ymd(2025, 4, 1));
        save_goal(&storage, 2000, 500);

        let metrics = DashboardService::new(&storage, UserId::default())
            .monthly_metrics(ymd(2025, 4, 15))
            .unwrap();

        assert_eq!(metrics.spending, Money::from_dollars(300));
        assert_eq!(metrics.spending_change, 50.0);
        // no income last month
        assert_eq!(metrics.income_change, 0.0);
        assert_eq!(metrics.savings.progress, 25.0);
        assert_eq!(metrics.net_cash_flow, Money::from_dollars(3200));
    }

    #[test]
    fn test_monthly_flow_outer_joins_months() {
        let (storage, _temp) = json_storage();
        spend(&storage, 100, ymd(2025, 2, 10));
        earn(&storage, 1000, ymd(2025, 3, 1));
        spend(&storage, 400, ymd(2025, 3, 5));
        earn(&storage, 900, ymd(2024, 1, 1));

        let flows = DashboardService::new(&storage, UserId::default())
            .monthly_flow(FlowRange::Last3Months, ymd(2025, 4, 15))
            .unwrap();

        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].month.to_string(), "2025-02");
        assert_eq!(flows[0].income, Money::zero());
        assert_eq!(flows[0].savings, Money::from_dollars(-100));
        assert_eq!(flows[1].savings, Money::from_dollars(600));
    }

    #[test]
    fn test_health_indicators() {
        let month = Month::parse("2025-03").unwrap();
        let flows = vec![
            MonthlyFlow {
                month,
                income: Money::from_dollars(1000),
                spending: Money::from_dollars(600),
                savings: Money::from_dollars(400),
            },
            MonthlyFlow {
                month: month.next(),
                income: Money::from_dollars(1000),
                spending: Money::from_dollars(800),
                savings: Money::from_dollars(200),
            },
        ];
        let health = health_indicators(&flows);
        assert_eq!(health.average_savings_rate, 30.0);
        assert_eq!(health.expense_to_income_ratio, 70.0);
        assert_eq!(health_indicators(&[]).average_savings_rate, 0.0);
    }

    #[test]
    fn test_conclusion_when_overspending() {
        let (storage, _temp) = json_storage();
        spend(&storage, 500, ymd(2025, 3, 10));
        spend(&storage, 900, ymd(2025, 4, 2));
        earn(&storage, 800, ymd(2025, 4, 1));
        save_goal(&storage, 2000, 500);

        let conclusion = DashboardService::new(&storage, UserId::default())
            .conclusion(ymd(2025, 4, 20))
            .unwrap();

        assert_eq!(
            conclusion.assessment,
            vec![
                Advice::Overspending(Money::from_dollars(100)),
                Advice::GoalsBelow50
            ]
        );
        assert_eq!(
            conclusion.recommendations,
            vec![
                Advice::ReduceDiscretionary,
                Advice::MaintainDiscipline,
                Advice::BoostSavings(Money::from_dollars(150)),
            ]
        );
    }

    #[test]
    fn test_conclusion_when_saving() {
        let (storage, _temp) = json_storage();
        spend(&storage, 500, ymd(2025, 3, 10));
        spend(&storage, 200, ymd(2025, 4, 2));
        earn(&storage, 3000, ymd(2025, 4, 1));
        save_goal(&storage, 1000, 800);

        let conclusion = DashboardService::new(&storage, UserId::default())
            .conclusion(ymd(2025, 4, 20))
            .unwrap();

        assert_eq!(conclusion.spending_reduction, Money::from_dollars(300));
        assert_eq!(
            conclusion.assessment,
            vec![Advice::Saving(Money::from_dollars(2800)), Advice::GoalsAbove75]
        );
        assert!(conclusion.recommendations.is_empty());
    }
}
