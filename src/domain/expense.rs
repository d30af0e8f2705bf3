//! Spending and income records that feed the monthly report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TrackingError};

use super::{
    common::{CategoryId, ExpenseId, Identifiable, IncomeId, UserId},
    money::{CurrencyCode, Money, MoneyError},
    month::Month,
    values::Name,
};

pub const EXPENSE_DESCRIPTION_MAX_LEN: usize = 255;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid {
        paid_at: NaiveDate,
    },
}

impl PaymentStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Paid { .. } => "Paid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawExpense")]
pub struct Expense {
    id: ExpenseId,
    category_id: CategoryId,
    amount: Money,
    description: String,
    spent_at: NaiveDate,
    #[serde(skip_serializing)]
    month: Month,
    payment: PaymentStatus,
}

#[derive(Deserialize)]
struct RawExpense {
    id: ExpenseId,
    category_id: CategoryId,
    amount: Money,
    #[serde(default)]
    description: String,
    spent_at: NaiveDate,
    #[serde(default)]
    payment: PaymentStatus,
}

impl TryFrom<RawExpense> for Expense {
    type Error = TrackingError;

    fn try_from(raw: RawExpense) -> Result<Self> {
        let mut expense = Expense::new(raw.id, raw.category_id, raw.amount, raw.description, raw.spent_at)?;
        expense.payment = raw.payment;
        Ok(expense)
    }
}

impl Expense {
    /// Records an unpaid expense. The amount must be strictly positive.
    pub fn new(
        id: ExpenseId,
        category_id: CategoryId,
        amount: Money,
        description: impl Into<String>,
        spent_at: NaiveDate,
    ) -> Result<Self> {
        if !amount.is_positive()? {
            return Err(TrackingError::NonPositiveAmount);
        }
        let description = description.into();
        if description.chars().count() > EXPENSE_DESCRIPTION_MAX_LEN {
            return Err(TrackingError::DescriptionTooLong {
                max: EXPENSE_DESCRIPTION_MAX_LEN,
            });
        }
        Ok(Self {
            id,
            category_id,
            amount,
            description,
            spent_at,
            month: Month::from_date(spent_at)?,
            payment: PaymentStatus::Unpaid,
        })
    }

    pub fn id(&self) -> ExpenseId {
        self.id
    }

    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    pub fn amount(&self) -> &Money {
        &self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn spent_at(&self) -> NaiveDate {
        self.spent_at
    }

    pub fn payment(&self) -> PaymentStatus {
        self.payment
    }

    pub fn is_paid(&self) -> bool {
        self.payment.is_paid()
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn mark_paid(&mut self, paid_at: NaiveDate) {
        self.payment = PaymentStatus::Paid { paid_at };
    }

    pub fn mark_unpaid(&mut self) {
        self.payment = PaymentStatus::Unpaid;
    }

    pub(crate) fn reassign(&mut self, category_id: CategoryId) {
        self.category_id = category_id;
    }
}

impl Identifiable for Expense {
    fn id(&self) -> ExpenseId {
        self.id
    }
}

impl Identifiable for Income {
    fn id(&self) -> IncomeId {
        self.id
    }
}

/// Money received by a user in a given month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawIncome")]
pub struct Income {
    id: IncomeId,
    user_id: UserId,
    amount: Money,
    source: Name,
    received_at: NaiveDate,
    #[serde(skip_serializing)]
    month: Month,
}

#[derive(Deserialize)]
struct RawIncome {
    id: IncomeId,
    user_id: UserId,
    amount: Money,
    source: Name,
    received_at: NaiveDate,
}

impl TryFrom<RawIncome> for Income {
    type Error = TrackingError;

    fn try_from(raw: RawIncome) -> Result<Self> {
        Income::new(raw.id, raw.user_id, raw.amount, raw.source, raw.received_at)
    }
}

impl Income {
    pub fn new(
        id: IncomeId,
        user_id: UserId,
        amount: Money,
        source: Name,
        received_at: NaiveDate,
    ) -> Result<Self> {
        if !amount.is_positive()? {
            return Err(TrackingError::NonPositiveAmount);
        }
        Ok(Self {
            id,
            user_id,
            amount,
            source,
            received_at,
            month: Month::from_date(received_at)?,
        })
    }

    pub fn id(&self) -> IncomeId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn amount(&self) -> &Money {
        &self.amount
    }

    pub fn source(&self) -> &Name {
        &self.source
    }

    pub fn received_at(&self) -> NaiveDate {
        self.received_at
    }

    pub fn month(&self) -> Month {
        self.month
    }
}

/// Spent and paid sums for one category in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub category_id: CategoryId,
    pub spent: Money,
    pub paid: Money,
}

impl CategoryTotals {
    /// Sums the given expenses; every one is counted as spent, paid ones also as paid.
    pub fn from_expenses<'a, I>(
        category_id: CategoryId,
        currency: &CurrencyCode,
        expenses: I,
    ) -> std::result::Result<Self, MoneyError>
    where
        I: IntoIterator<Item = &'a Expense>,
    {
        let mut totals = Self {
            category_id,
            spent: Money::zero(currency),
            paid: Money::zero(currency),
        };
        for expense in expenses {
            totals.spent = totals.spent.add(expense.amount())?;
            if expense.is_paid() {
                totals.paid = totals.paid.add(expense.amount())?;
            }
        }
        Ok(totals)
    }

    pub fn unpaid(&self) -> std::result::Result<Money, MoneyError> {
        self.spent.subtract(&self.paid)
    }
}
