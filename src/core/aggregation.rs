//! Monthly aggregation: turns month-scoped groups and expense totals into a dashboard report.
//!
//! Everything here is pure computation. Callers load the groups (already
//! filtered to the month), the per-category totals and the expense lines, then
//! hand them over in a [`DashboardInput`].

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::domain::{
    Category, CategoryId, CategoryTotals, CurrencyCode, Expense, ExpenseId, Group, GroupId, Money,
    Month, PaymentStatus,
};
use crate::errors::Result;

/// Usage above this percentage flags a category as nearly exhausted.
pub const NEAR_BUDGET_THRESHOLD: f64 = 85.0;

const FULL: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BudgetStatus {
    Under,
    Equal,
    Over,
}

impl BudgetStatus {
    /// Classifies the planned budget against the month's income.
    pub fn classify(budgeted: &Money, income: &Money) -> Result<Self> {
        Ok(if budgeted.less_than(income)? {
            BudgetStatus::Under
        } else if budgeted.greater_than(income)? {
            BudgetStatus::Over
        } else {
            BudgetStatus::Equal
        })
    }
}

#[derive(Debug, Clone)]
pub struct DashboardInput {
    pub month: Month,
    pub currency: CurrencyCode,
    pub total_income: Money,
    pub total_expenses: Money,
    /// Groups in presentation order, categories already scoped to `month`.
    pub groups: Vec<Group>,
    pub totals: HashMap<CategoryId, CategoryTotals>,
    pub expenses: HashMap<CategoryId, Vec<Expense>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseLine {
    pub id: ExpenseId,
    pub description: String,
    pub amount: Money,
    pub spent_at: NaiveDate,
    pub payment: PaymentStatus,
}

impl From<&Expense> for ExpenseLine {
    fn from(expense: &Expense) -> Self {
        Self {
            id: expense.id(),
            description: expense.description().to_string(),
            amount: expense.amount().clone(),
            spent_at: expense.spent_at(),
            payment: expense.payment(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryReport {
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub is_recurrent: bool,
    pub budget: Money,
    pub spent: Money,
    pub paid_spent: Money,
    pub unpaid_spent: Money,
    pub percentage: f64,
    pub paid_percentage: f64,
    pub unpaid_percentage: f64,
    pub is_over_budget: bool,
    pub over_budget_amount: Money,
    pub remaining_budget: Money,
    pub is_near_budget: bool,
    pub expenses: Vec<ExpenseLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub group_id: GroupId,
    pub name: String,
    pub description: String,
    pub order: u32,
    pub total_budget: Money,
    pub total_spent: Money,
    pub categories: Vec<CategoryReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub month: Month,
    pub previous_month: Month,
    pub next_month: Month,
    pub total_income: Money,
    pub total_expenses: Money,
    pub balance: Money,
    /// Sum of every active category budget.
    pub total_budgeted: Money,
    pub paid_expenses_total: Money,
    /// Planned budget still unspent or unpaid: `total_budgeted - paid_expenses_total`.
    pub display_budget: Money,
    pub is_display_budget_negative: bool,
    pub budget_status: BudgetStatus,
    pub groups: Vec<GroupReport>,
}

pub struct MonthlyAggregator;

impl MonthlyAggregator {
    pub fn aggregate(input: &DashboardInput) -> Result<DashboardReport> {
        let currency = &input.currency;

        let groups = input
            .groups
            .iter()
            .map(|group| Self::group_report(group, input))
            .collect::<Result<Vec<_>>>()?;

        let total_budgeted = Money::sum(
            currency,
            input
                .groups
                .iter()
                .flat_map(|group| group.categories())
                .map(Category::budget),
        )?;
        let paid_expenses_total = Money::sum(currency, input.totals.values().map(|t| &t.paid))?;
        let display_budget = total_budgeted.subtract(&paid_expenses_total)?;
        let budget_status = BudgetStatus::classify(&total_budgeted, &input.total_income)?;

        Ok(DashboardReport {
            month: input.month,
            previous_month: input.month.previous(),
            next_month: input.month.next(),
            balance: input.total_income.subtract(&input.total_expenses)?,
            total_income: input.total_income.clone(),
            total_expenses: input.total_expenses.clone(),
            is_display_budget_negative: display_budget.is_negative()?,
            total_budgeted,
            paid_expenses_total,
            display_budget,
            budget_status,
            groups,
        })
    }

    fn group_report(group: &Group, input: &DashboardInput) -> Result<GroupReport> {
        let categories = group
            .categories()
            .iter()
            .map(|category| Self::category_report(category, input))
            .collect::<Result<Vec<_>>>()?;
        let total_budget = Money::sum(&input.currency, categories.iter().map(|c| &c.budget))?;
        let total_spent = Money::sum(&input.currency, categories.iter().map(|c| &c.spent))?;
        Ok(GroupReport {
            group_id: group.id(),
            name: group.name().to_string(),
            description: group.description().to_string(),
            order: group.order().value(),
            total_budget,
            total_spent,
            categories,
        })
    }

    fn category_report(category: &Category, input: &DashboardInput) -> Result<CategoryReport> {
        let zero = Money::zero(&input.currency);
        let budget = category.budget().clone();
        let (spent, paid_spent) = match input.totals.get(&category.id()) {
            Some(totals) => (totals.spent.clone(), totals.paid.clone()),
            None => (zero.clone(), zero.clone()),
        };

        let mut unpaid_spent = spent.subtract(&paid_spent)?;
        if unpaid_spent.is_negative()? {
            warn!(
                "category {} reports paid {} above spent {}; treating unpaid as zero",
                category.id(),
                paid_spent,
                spent
            );
            unpaid_spent = zero.clone();
        }

        let percentage = usage_percentage(&spent, &budget);
        let paid_percentage = usage_percentage(&paid_spent, &budget);
        let unpaid_percentage = usage_percentage(&unpaid_spent, &budget)
            .min(FULL - paid_percentage)
            .max(0.0);

        let is_over_budget = spent.greater_than(&budget)?;
        let (over_budget_amount, remaining_budget) = if is_over_budget {
            (spent.subtract(&budget)?, zero)
        } else {
            (zero, budget.subtract(&spent)?)
        };

        let expenses = input
            .expenses
            .get(&category.id())
            .map(|items| items.iter().map(ExpenseLine::from).collect())
            .unwrap_or_default();

        Ok(CategoryReport {
            category_id: category.id(),
            name: category.name().to_string(),
            description: category.description().to_string(),
            is_recurrent: category.is_recurrent(),
            budget,
            spent,
            paid_spent,
            unpaid_spent,
            percentage,
            paid_percentage,
            unpaid_percentage,
            is_over_budget,
            over_budget_amount,
            remaining_budget,
            is_near_budget: !is_over_budget && percentage > NEAR_BUDGET_THRESHOLD,
            expenses,
        })
    }
}

/// `part / budget` as a percentage in `0..=100`; zero when there is no budget.
fn usage_percentage(part: &Money, budget: &Money) -> f64 {
    if budget.cents() <= 0 {
        return 0.0;
    }
    ((part.cents() as f64 * FULL) / budget.cents() as f64).clamp(0.0, FULL)
}
