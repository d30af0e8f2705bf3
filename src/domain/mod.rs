pub mod category;
pub mod common;
pub mod expense;
pub mod group;
pub mod interval;
pub mod money;
pub mod month;
pub mod values;

pub use category::{Category, CategoryDraft, Recurrence};
pub use common::{CategoryId, ExpenseId, GroupId, Identifiable, IncomeId, UserId};
pub use expense::{CategoryTotals, Expense, Income, PaymentStatus};
pub use group::{CategoryUpdate, Group};
pub use interval::MonthInterval;
pub use money::{CurrencyCode, Money, MoneyError};
pub use month::Month;
pub use values::{Description, DisplayOrder, Name};
