use thiserror::Error;
use uuid::Uuid;

use crate::domain::{money::MoneyError, month::Month};

pub type Result<T> = std::result::Result<T, TrackingError>;

/// Validation and lookup failures raised by the group/category aggregate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackingError {
    #[error("month must be in YYYY-MM format, got `{0}`")]
    InvalidMonth(String),
    #[error("name cannot be empty")]
    EmptyName,
    #[error("name exceeds maximum length of {max} characters")]
    NameTooLong { max: usize },
    #[error("description exceeds maximum length of {max} characters")]
    DescriptionTooLong { max: usize },
    #[error("end month is only allowed for recurrent categories")]
    EndMonthNotAllowed,
    #[error("end month {end} must not be before start month {start}")]
    EndMonthBeforeStartMonth { start: Month, end: Month },
    #[error("category `{name}` already exists in group for an overlapping period")]
    CategoryNameExists { name: String },
    #[error("category {category} does not belong to group {group}")]
    CategoryGroupMismatch { category: Uuid, group: Uuid },
    #[error("category {0} already exists")]
    DuplicateCategory(Uuid),
    #[error("category not found: {0}")]
    CategoryNotFound(Uuid),
    #[error("group not found: {0}")]
    GroupNotFound(Uuid),
    #[error("order cannot be negative, got {0}")]
    InvalidOrder(i64),
    #[error("category budget cannot be negative")]
    NegativeBudget,
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("expense not found: {0}")]
    ExpenseNotFound(Uuid),
    #[error("income not found: {0}")]
    IncomeNotFound(Uuid),
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Failures surfaced by persistence backends. The domain never inspects these.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Storage lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Tracking(#[from] TrackingError),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
