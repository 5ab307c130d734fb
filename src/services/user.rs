//! User profile service

use serde::Serialize;
use tracing::info;

use crate::audit::EntityType;
use crate::error::{FinanceError, FinanceResult};
use crate::models::{Currency, User, UserId};
use crate::storage::{Storage, UserRecords};

/// Rows removed by an account deletion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountDeletion {
    pub expenses: usize,
    pub income: usize,
    pub budgets: usize,
    pub goals: usize,
    pub user_removed: bool,
}

/// Service for the configured user's profile
pub struct UserService<'a> {
    storage: &'a Storage,
    user: UserId,
}

impl<'a> UserService<'a> {
    pub fn new(storage: &'a Storage, user: UserId) -> Self {
        Self { storage, user }
    }

    /// Create the user row on first use
    pub fn ensure_user(&self, currency: Currency) -> FinanceResult<User> {
        if let Some(user) = self.storage.store().get_user(self.user)? {
            return Ok(user);
        }

        let user = User::default_for(self.user, currency);
        self.storage.store().save_user(&user)?;
        self.storage.log_create(
            EntityType::User,
            user.id.to_string(),
            Some(user.username.clone()),
            &user,
        )?;
        info!(user = %user.id, "created user");
        Ok(user)
    }

    pub fn current(&self) -> FinanceResult<User> {
        self.storage
            .store()
            .get_user(self.user)?
            .ok_or_else(|| FinanceError::user_not_found(self.user.to_string()))
    }

    /// Change the username and/or currency
    pub fn update_user(
        &self,
        username: Option<String>,
        currency: Option<Currency>,
    ) -> FinanceResult<User> {
        let before = self.current()?;
        let mut user = before.clone();

        if let Some(name) = username {
            let name = name.trim();
            if name.is_empty() {
                return Err(FinanceError::Validation("Username cannot be empty".into()));
            }
            user.username = name.to_string();
        }
        if let Some(currency) = currency {
            user.currency = currency;
        }
        if user == before {
            return Ok(user);
        }

        user.touch();
        self.storage.store().save_user(&user)?;
        self.storage.log_update(
            EntityType::User,
            user.id.to_string(),
            Some(user.username.clone()),
            &before,
            &user,
        )?;
        Ok(user)
    }

    /// Remove every record the user owns, then the user row itself
    pub fn delete_account(&self) -> FinanceResult<AccountDeletion> {
        let existing = self.storage.store().get_user(self.user)?;

        let removed = self
            .storage
            .replace_user_records(self.user, &UserRecords::default())?;

        let deletion = AccountDeletion {
            expenses: removed.expenses.len(),
            income: removed.income.len(),
            budgets: removed.budgets.len(),
            goals: removed.goals.len(),
            user_removed: self.storage.store().delete_user(self.user)?,
        };

        if let Some(user) = existing {
            self.storage.log_delete(
                EntityType::User,
                user.id.to_string(),
                Some(user.username.clone()),
                &user,
            )?;
        }
        info!(user = %self.user, ?deletion, "deleted account");
        Ok(deletion)
    }
}
