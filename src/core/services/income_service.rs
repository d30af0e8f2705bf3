use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{CurrencyCode, Income, IncomeId, Money, Name, UserId};
use crate::errors::TrackingError;
use crate::storage::IncomeRepository;

use super::{parse_month, ServiceResult};

/// Raw income form values; amount in cents.
#[derive(Debug, Clone)]
pub struct IncomeInput {
    pub amount_cents: i64,
    pub source: String,
    pub received_at: NaiveDate,
}

pub struct IncomeService {
    incomes: Arc<dyn IncomeRepository>,
    currency: CurrencyCode,
}

impl IncomeService {
    pub fn new(incomes: Arc<dyn IncomeRepository>, currency: CurrencyCode) -> Self {
        Self { incomes, currency }
    }

    pub fn create(&self, user_id: UserId, input: IncomeInput) -> ServiceResult<Income> {
        let income = self.build(Uuid::new_v4(), user_id, input)?;
        self.incomes.save_income(&income)?;
        debug!("income {} of {} recorded for user {}", income.id(), income.amount(), user_id);
        Ok(income)
    }

    pub fn update(&self, user_id: UserId, id: IncomeId, input: IncomeInput) -> ServiceResult<Income> {
        self.owned(user_id, id)?;
        let income = self.build(id, user_id, input)?;
        self.incomes.save_income(&income)?;
        debug!("income {} updated", id);
        Ok(income)
    }

    pub fn delete(&self, user_id: UserId, id: IncomeId) -> ServiceResult<()> {
        self.owned(user_id, id)?;
        self.incomes.delete_income(id)?;
        info!("income {} deleted", id);
        Ok(())
    }

    pub fn get(&self, user_id: UserId, id: IncomeId) -> ServiceResult<Income> {
        self.owned(user_id, id)
    }

    pub fn list(&self, user_id: UserId) -> ServiceResult<Vec<Income>> {
        Ok(self.incomes.find_incomes_by_user(user_id)?)
    }

    pub fn list_by_month(&self, user_id: UserId, month: &str) -> ServiceResult<Vec<Income>> {
        let month = parse_month(month)?;
        Ok(self.incomes.find_incomes_by_user_and_month(user_id, month)?)
    }

    pub fn total(&self, user_id: UserId, month: &str) -> ServiceResult<Money> {
        let month = parse_month(month)?;
        Ok(self.incomes.total_for_month(user_id, month, &self.currency)?)
    }

    fn build(&self, id: IncomeId, user_id: UserId, input: IncomeInput) -> ServiceResult<Income> {
        Ok(Income::new(
            id,
            user_id,
            Money::new(input.amount_cents, &self.currency),
            Name::new(input.source.trim())?,
            input.received_at,
        )?)
    }

    fn owned(&self, user_id: UserId, id: IncomeId) -> ServiceResult<Income> {
        let income = self.incomes.find_income(id)?;
        if income.user_id() != user_id {
            return Err(TrackingError::IncomeNotFound(id).into());
        }
        Ok(income)
    }
}
