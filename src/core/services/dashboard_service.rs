use std::{collections::HashMap, sync::Arc};

use tracing::debug;

use crate::core::aggregation::{DashboardInput, DashboardReport, MonthlyAggregator};
use crate::domain::{CategoryId, CurrencyCode, Expense, Month, UserId};
use crate::storage::{ExpenseRepository, GroupRepository, IncomeRepository};

use super::{parse_month, ServiceResult};

/// Loads a user's month and runs the aggregation engine over it.
pub struct DashboardService {
    groups: Arc<dyn GroupRepository>,
    expenses: Arc<dyn ExpenseRepository>,
    incomes: Arc<dyn IncomeRepository>,
    currency: CurrencyCode,
}

impl DashboardService {
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        expenses: Arc<dyn ExpenseRepository>,
        incomes: Arc<dyn IncomeRepository>,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            groups,
            expenses,
            incomes,
            currency,
        }
    }

    pub fn report(&self, user_id: UserId, month: Month) -> ServiceResult<DashboardReport> {
        let groups = self.groups.find_groups_by_user_and_month(user_id, month)?;
        let totals = self
            .expenses
            .totals_by_category(user_id, month, &self.currency)?;
        let total_expenses = self
            .expenses
            .total_for_month(user_id, month, &self.currency)?;
        let total_income = self.incomes.total_for_month(user_id, month, &self.currency)?;

        let mut expenses: HashMap<CategoryId, Vec<Expense>> = HashMap::new();
        for expense in self.expenses.find_expenses_by_user_and_month(user_id, month)? {
            expenses.entry(expense.category_id()).or_default().push(expense);
        }

        debug!(
            "building dashboard for user {} in {} ({} groups)",
            user_id,
            month,
            groups.len()
        );
        let input = DashboardInput {
            month,
            currency: self.currency.clone(),
            total_income,
            total_expenses,
            groups,
            totals,
            expenses,
        };
        Ok(MonthlyAggregator::aggregate(&input)?)
    }

    /// Same as [`report`](Self::report) for a raw `YYYY-MM` month.
    pub fn report_for(&self, user_id: UserId, month: &str) -> ServiceResult<DashboardReport> {
        self.report(user_id, parse_month(month)?)
    }
}
