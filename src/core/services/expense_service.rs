use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{CategoryId, CurrencyCode, Expense, ExpenseId, Money, UserId};
use crate::errors::{StorageError, TrackingError};
use crate::storage::{ExpenseRepository, GroupRepository};

use super::{parse_month, ServiceResult};

/// Raw expense form values; amount in cents, `paid_at` set when already paid.
#[derive(Debug, Clone)]
pub struct ExpenseInput {
    pub category_id: CategoryId,
    pub amount_cents: i64,
    pub description: String,
    pub spent_at: NaiveDate,
    pub paid_at: Option<NaiveDate>,
}

pub struct ExpenseService {
    groups: Arc<dyn GroupRepository>,
    expenses: Arc<dyn ExpenseRepository>,
    currency: CurrencyCode,
}

impl ExpenseService {
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        expenses: Arc<dyn ExpenseRepository>,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            groups,
            expenses,
            currency,
        }
    }

    /// Records an expense against one of the user's categories.
    pub fn create(&self, user_id: UserId, input: ExpenseInput) -> ServiceResult<Expense> {
        self.ensure_category(user_id, input.category_id)?;
        let expense = self.build(Uuid::new_v4(), input)?;
        self.expenses.save_expense(&expense)?;
        debug!(
            "expense {} of {} recorded in category {}",
            expense.id(),
            expense.amount(),
            expense.category_id()
        );
        Ok(expense)
    }

    /// Rewrites every field; a changed category must also belong to the user.
    pub fn update(&self, user_id: UserId, id: ExpenseId, input: ExpenseInput) -> ServiceResult<Expense> {
        let current = self.owned(user_id, id)?;
        if input.category_id != current.category_id() {
            self.ensure_category(user_id, input.category_id)?;
        }
        let expense = self.build(id, input)?;
        self.expenses.save_expense(&expense)?;
        debug!("expense {} updated", id);
        Ok(expense)
    }

    pub fn delete(&self, user_id: UserId, id: ExpenseId) -> ServiceResult<()> {
        self.owned(user_id, id)?;
        self.expenses.delete_expense(id)?;
        info!("expense {} deleted", id);
        Ok(())
    }

    pub fn get(&self, user_id: UserId, id: ExpenseId) -> ServiceResult<Expense> {
        self.owned(user_id, id)
    }

    pub fn mark_paid(&self, user_id: UserId, id: ExpenseId, paid_at: NaiveDate) -> ServiceResult<Expense> {
        let mut expense = self.owned(user_id, id)?;
        expense.mark_paid(paid_at);
        self.expenses.save_expense(&expense)?;
        Ok(expense)
    }

    pub fn mark_unpaid(&self, user_id: UserId, id: ExpenseId) -> ServiceResult<Expense> {
        let mut expense = self.owned(user_id, id)?;
        expense.mark_unpaid();
        self.expenses.save_expense(&expense)?;
        Ok(expense)
    }

    pub fn list(&self, user_id: UserId) -> ServiceResult<Vec<Expense>> {
        Ok(self.expenses.find_expenses_by_user(user_id)?)
    }

    pub fn list_by_month(&self, user_id: UserId, month: &str) -> ServiceResult<Vec<Expense>> {
        let month = parse_month(month)?;
        Ok(self.expenses.find_expenses_by_user_and_month(user_id, month)?)
    }

    pub fn total(&self, user_id: UserId, month: &str) -> ServiceResult<Money> {
        let month = parse_month(month)?;
        Ok(self.expenses.total_for_month(user_id, month, &self.currency)?)
    }

    fn build(&self, id: ExpenseId, input: ExpenseInput) -> ServiceResult<Expense> {
        let mut expense = Expense::new(
            id,
            input.category_id,
            Money::new(input.amount_cents, &self.currency),
            input.description.trim(),
            input.spent_at,
        )?;
        if let Some(paid_at) = input.paid_at {
            expense.mark_paid(paid_at);
        }
        Ok(expense)
    }

    fn ensure_category(&self, user_id: UserId, category_id: CategoryId) -> ServiceResult<()> {
        let group = self.groups.find_group_by_category(category_id)?;
        if group.user_id() != user_id {
            return Err(TrackingError::CategoryNotFound(category_id).into());
        }
        Ok(())
    }

    /// Loads an expense, hiding expenses filed under someone else's category.
    fn owned(&self, user_id: UserId, id: ExpenseId) -> ServiceResult<Expense> {
        let expense = self.expenses.find_expense(id)?;
        let owner = match self.groups.find_group_by_category(expense.category_id()) {
            Ok(group) => Some(group.user_id()),
            Err(StorageError::Tracking(TrackingError::CategoryNotFound(_))) => None,
            Err(err) => return Err(err.into()),
        };
        if owner != Some(user_id) {
            return Err(TrackingError::ExpenseNotFound(id).into());
        }
        Ok(expense)
    }
}
