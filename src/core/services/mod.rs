pub mod category_service;
pub mod dashboard_service;
pub mod expense_service;
pub mod group_service;
pub mod income_service;

pub use category_service::{CategoryInput, CategoryService};
pub use dashboard_service::DashboardService;
pub use expense_service::{ExpenseInput, ExpenseService};
pub use group_service::{GroupInput, GroupService};
pub use income_service::{IncomeInput, IncomeService};

use crate::domain::{Month, MoneyError};
use crate::errors::{StorageError, TrackingError};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Tracking(#[from] TrackingError),
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Tracking(inner) => ServiceError::Tracking(inner),
            other => ServiceError::Storage(other),
        }
    }
}

impl From<MoneyError> for ServiceError {
    fn from(err: MoneyError) -> Self {
        ServiceError::Tracking(err.into())
    }
}

impl ServiceError {
    /// The domain error kind, when this failure carries one.
    pub fn tracking(&self) -> Option<&TrackingError> {
        match self {
            ServiceError::Tracking(err) => Some(err),
            _ => None,
        }
    }
}

pub(crate) fn parse_month(raw: &str) -> ServiceResult<Month> {
    Ok(Month::parse(raw.trim())?)
}

/// Blank input means "no month".
pub(crate) fn parse_optional_month(raw: Option<&str>) -> ServiceResult<Option<Month>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Ok(Some(Month::parse(value)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_not_found_surfaces_as_tracking_error() {
        let id = uuid::Uuid::new_v4();
        let err: ServiceError = StorageError::from(TrackingError::GroupNotFound(id)).into();
        assert_eq!(err.tracking(), Some(&TrackingError::GroupNotFound(id)));
    }

    #[test]
    fn optional_month_parsing() {
        assert_eq!(parse_optional_month(None).unwrap(), None);
        assert_eq!(parse_optional_month(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_optional_month(Some("2024-05")).unwrap(),
            Some(Month::new(2024, 5).unwrap())
        );
        assert!(parse_month("2024-5").is_err());
    }
}
