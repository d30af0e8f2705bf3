//! Budget categories and their validity windows.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TrackingError};

use super::{
    common::{CategoryId, GroupId},
    interval::MonthInterval,
    money::Money,
    month::Month,
    values::{Description, Name},
};

/// When a category applies: a single month, or a run of months that may be open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", try_from = "RawRecurrence")]
pub enum Recurrence {
    OneOff { month: Month },
    Recurring { start: Month, end: Option<Month> },
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RawRecurrence {
    OneOff { month: Month },
    Recurring { start: Month, end: Option<Month> },
}

impl TryFrom<RawRecurrence> for Recurrence {
    type Error = TrackingError;

    fn try_from(raw: RawRecurrence) -> Result<Self> {
        match raw {
            RawRecurrence::OneOff { month } => Ok(Recurrence::OneOff { month }),
            RawRecurrence::Recurring { start, end } => Recurrence::recurring(start, end),
        }
    }
}

impl Recurrence {
    /// Builds a recurrence from flat form-style inputs.
    pub fn from_parts(is_recurrent: bool, start: Option<Month>, end: Option<Month>) -> Result<Self> {
        let start = start.ok_or_else(|| TrackingError::InvalidMonth(String::new()))?;
        if !is_recurrent {
            if end.is_some() {
                return Err(TrackingError::EndMonthNotAllowed);
            }
            return Ok(Recurrence::OneOff { month: start });
        }
        Self::recurring(start, end)
    }

    pub fn recurring(start: Month, end: Option<Month>) -> Result<Self> {
        if let Some(end) = end {
            if end.before(&start) {
                return Err(TrackingError::EndMonthBeforeStartMonth { start, end });
            }
        }
        Ok(Recurrence::Recurring { start, end })
    }

    pub fn start(&self) -> Month {
        match self {
            Recurrence::OneOff { month } => *month,
            Recurrence::Recurring { start, .. } => *start,
        }
    }

    /// Explicit end month; always `None` for one-off categories.
    pub fn end(&self) -> Option<Month> {
        match self {
            Recurrence::OneOff { .. } => None,
            Recurrence::Recurring { end, .. } => *end,
        }
    }

    pub fn is_recurrent(&self) -> bool {
        matches!(self, Recurrence::Recurring { .. })
    }

    pub fn window(&self) -> MonthInterval {
        match self {
            Recurrence::OneOff { month } => MonthInterval::single(*month),
            Recurrence::Recurring { start, end } => MonthInterval::new(*start, *end),
        }
    }

    pub fn active_for(&self, month: Month) -> bool {
        self.window().contains(month)
    }
}

/// Submitted values for creating or editing a category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDraft {
    pub name: Name,
    pub description: Description,
    pub is_recurrent: bool,
    pub start_month: Option<Month>,
    pub end_month: Option<Month>,
    pub budget: Money,
}

impl CategoryDraft {
    pub fn recurrence(&self) -> Result<Recurrence> {
        Recurrence::from_parts(self.is_recurrent, self.start_month, self.end_month)
    }
}

/// A spending bucket owned by a [`Group`](super::group::Group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCategory")]
pub struct Category {
    id: CategoryId,
    group_id: GroupId,
    name: Name,
    #[serde(default)]
    description: Description,
    recurrence: Recurrence,
    budget: Money,
}

#[derive(Deserialize)]
struct RawCategory {
    id: CategoryId,
    group_id: GroupId,
    name: Name,
    #[serde(default)]
    description: Description,
    recurrence: Recurrence,
    budget: Money,
}

impl TryFrom<RawCategory> for Category {
    type Error = TrackingError;

    fn try_from(raw: RawCategory) -> Result<Self> {
        let draft = CategoryDraft {
            name: raw.name,
            description: raw.description,
            is_recurrent: raw.recurrence.is_recurrent(),
            start_month: Some(raw.recurrence.start()),
            end_month: raw.recurrence.end(),
            budget: raw.budget,
        };
        Category::new(raw.id, raw.group_id, draft)
    }
}

impl Category {
    pub fn new(id: CategoryId, group_id: GroupId, draft: CategoryDraft) -> Result<Self> {
        let recurrence = draft.recurrence()?;
        validate_budget(&draft.budget)?;
        Ok(Self {
            id,
            group_id,
            name: draft.name,
            description: draft.description,
            recurrence,
            budget: draft.budget,
        })
    }

    pub fn id(&self) -> CategoryId {
        self.id
    }

    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn recurrence(&self) -> Recurrence {
        self.recurrence
    }

    pub fn is_recurrent(&self) -> bool {
        self.recurrence.is_recurrent()
    }

    pub fn start_month(&self) -> Month {
        self.recurrence.start()
    }

    pub fn end_month(&self) -> Option<Month> {
        self.recurrence.end()
    }

    pub fn budget(&self) -> &Money {
        &self.budget
    }

    pub fn window(&self) -> MonthInterval {
        self.recurrence.window()
    }

    pub fn active_for(&self, month: Month) -> bool {
        self.recurrence.active_for(month)
    }

    /// Same name and intersecting windows.
    pub fn conflicts_with(&self, name: &Name, window: &MonthInterval) -> bool {
        self.name == *name && self.window().intersects(window)
    }

    pub(crate) fn apply(&mut self, draft: CategoryDraft, recurrence: Recurrence) {
        self.name = draft.name;
        self.description = draft.description;
        self.recurrence = recurrence;
        self.budget = draft.budget;
    }

    /// Ends a recurring category at `end`, keeping every other field.
    pub(crate) fn close_at(&mut self, end: Month) -> Result<()> {
        self.recurrence = Recurrence::recurring(self.start_month(), Some(end))?;
        Ok(())
    }
}

pub(crate) fn validate_budget(budget: &Money) -> Result<()> {
    if budget.is_negative()? {
        return Err(TrackingError::NegativeBudget);
    }
    Ok(())
}
