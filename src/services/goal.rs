//! Savings goal service

use chrono::NaiveDate;
use serde::Serialize;

use crate::audit::EntityType;
use crate::error::{FinanceError, FinanceResult};
use crate::models::{Money, SavingsGoal, UserId};
use crate::storage::Storage;

/// Input for a new savings goal
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: Money,
    pub current_amount: Money,
    pub target_date: NaiveDate,
    pub priority: u8,
    pub description: Option<String>,
}

/// Totals across all of a user's goals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalTotals {
    pub saved: Money,
    pub target: Money,
    /// `saved / target * 100`, clipped to 0..=100
    pub progress: f64,
}

/// Service for savings goals
pub struct GoalService<'a> {
    storage: &'a Storage,
    user: UserId,
}

impl<'a> GoalService<'a> {
    pub fn new(storage: &'a Storage, user: UserId) -> Self {
        Self { storage, user }
    }

    pub fn add_goal(&self, input: NewGoal) -> FinanceResult<SavingsGoal> {
        let goal = SavingsGoal::new(
            self.user,
            input.name.trim(),
            input.target_amount,
            input.target_date,
        )
        .with_current(input.current_amount)
        .with_priority(input.priority)
        .with_description(input.description);
        goal.validate()
            .map_err(|e| FinanceError::Validation(e.to_string()))?;

        self.storage.store().insert_goal(&goal)?;
        self.storage.log_create(
            EntityType::SavingsGoal,
            goal.id.to_string(),
            Some(goal.name.clone()),
            &goal,
        )?;

        Ok(goal)
    }

    /// Goals ordered by priority, then target date
    pub fn list_goals(&self) -> FinanceResult<Vec<SavingsGoal>> {
        self.storage.store().list_goals(self.user)
    }

    /// Find a goal by exact name (case-insensitive) or id prefix
    pub fn find_goal(&self, ident: &str) -> FinanceResult<SavingsGoal> {
        let goals = self.list_goals()?;
        let wanted = ident.trim();

        if let Some(goal) = goals.iter().find(|g| g.name.eq_ignore_ascii_case(wanted)) {
            return Ok(goal.clone());
        }

        let mut by_id: Vec<SavingsGoal> = goals
            .into_iter()
            .filter(|g| g.id.matches(wanted))
            .collect();
        match by_id.len() {
            0 => Err(FinanceError::goal_not_found(wanted)),
            1 => Ok(by_id.remove(0)),
            n => Err(FinanceError::Validation(format!(
                "'{}' matches {} goals; use more of the id",
                wanted, n
            ))),
        }
    }

    /// Record how much has been saved towards a goal
    pub fn update_progress(&self, ident: &str, current: Money) -> FinanceResult<SavingsGoal> {
        if current.is_negative() {
            return Err(FinanceError::Validation(
                "Current amount cannot be negative".into(),
            ));
        }

        let before = self.find_goal(ident)?;
        let mut goal = before.clone();
        goal.set_current(current);

        self.storage.store().update_goal(&goal)?;
        self.storage.log_update(
            EntityType::SavingsGoal,
            goal.id.to_string(),
            Some(goal.name.clone()),
            &before,
            &goal,
        )?;

        Ok(goal)
    }

    pub fn remove_goal(&self, ident: &str) -> FinanceResult<SavingsGoal> {
        let goal = self.find_goal(ident)?;
        if !self.storage.store().delete_goal(self.user, goal.id)? {
            return Err(FinanceError::goal_not_found(ident));
        }
        self.storage.log_delete(
            EntityType::SavingsGoal,
            goal.id.to_string(),
            Some(goal.name.clone()),
            &goal,
        )?;
        Ok(goal)
    }

    pub fn totals(&self) -> FinanceResult<GoalTotals> {
        Ok(goal_totals(&self.list_goals()?))
    }
}

/// Saved and target sums over a set of goals
pub fn goal_totals(goals: &[SavingsGoal]) -> GoalTotals {
    let saved: Money = goals.iter().map(|g| g.current_amount).sum();
    let target: Money = goals.iter().map(|g| g.target_amount).sum();
    GoalTotals {
        saved,
        target,
        progress: saved.percent_of(target).clamp(0.0, 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::json_storage;

    fn vacation() -> NewGoal {
        NewGoal {
            name: "Vacation".into(),
            target_amount: Money::from_dollars(2000),
            current_amount: Money::from_dollars(500),
            target_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            priority: 1,
            description: None,
        }
    }

    #[test]
    fn test_add_and_update_progress() {
        let (storage, _temp) = json_storage();
        let service = GoalService::new(&storage, UserId::default());
        service.add_goal(vacation()).unwrap();

        let goal = service
            .update_progress("vacation", Money::from_dollars(1500))
            .unwrap();
        assert_eq!(goal.progress(), 75.0);

        let listed = service.list_goals().unwrap();
        assert_eq!(listed[0].current_amount, Money::from_dollars(1500));
    }

    #[test]
    fn test_invalid_goal_rejected() {
        let (storage, _temp) = json_storage();
        let service = GoalService::new(&storage, UserId::default());

        let err = service
            .add_goal(NewGoal {
                priority: 9,
                ..vacation()
            })
            .unwrap_err();
        assert!(err.is_validation());
        assert!(service.list_goals().unwrap().is_empty());
    }

    #[test]
    fn test_totals() {
        let (storage, _temp) = json_storage();
        let service = GoalService::new(&storage, UserId::default());
        service.add_goal(vacation()).unwrap();
        service
            .add_goal(NewGoal {
                name: "Emergency fund".into(),
                target_amount: Money::from_dollars(3000),
                current_amount: Money::from_dollars(4000),
                priority: 2,
                ..vacation()
            })
            .unwrap();

        let totals = service.totals().unwrap();
        assert_eq!(totals.saved, Money::from_dollars(4500));
        assert_eq!(totals.target, Money::from_dollars(5000));
        assert_eq!(totals.progress, 90.0);
    }

    #[test]
    fn test_totals_without_goals() {
        let totals = goal_totals(&[]);
        assert_eq!(totals.progress, 0.0);
    }

    #[test]
    fn test_remove_goal() {
        let (storage, _temp) = json_storage();
        let service = GoalService::new(&storage, UserId::default());
        service.add_goal(vacation()).unwrap();

        service.remove_goal("Vacation").unwrap();
        assert!(service.find_goal("Vacation").unwrap_err().is_not_found());
    }
}
