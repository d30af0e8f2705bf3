//! Shared identifiers for budgeting primitives.

use uuid::Uuid;

pub type UserId = Uuid;
pub type GroupId = Uuid;
pub type CategoryId = Uuid;
pub type ExpenseId = Uuid;
pub type IncomeId = Uuid;

/// Exposes a stable identifier for entities stored by a repository.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}
