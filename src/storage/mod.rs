//! Persistence contracts and the snapshot-backed stores implementing them.
//!
//! Each store keeps the whole dataset as one [`Snapshot`]. A write runs against
//! a staged copy and replaces the live snapshot only when it succeeds, so a
//! saved group (including both halves of a fork) lands as one unit.

pub mod json_backend;
pub mod memory;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        CategoryId, CategoryTotals, CurrencyCode, Expense, ExpenseId, Group, GroupId, Identifiable,
        Income, IncomeId, Money, Month, UserId,
    },
    errors::{StorageResult, TrackingError},
};

pub use json_backend::JsonStore;
pub use memory::MemoryStore;

pub trait GroupRepository: Send + Sync {
    /// Upserts the group together with every category it currently owns.
    fn save_group(&self, group: &Group) -> StorageResult<()>;
    fn find_group(&self, id: GroupId) -> StorageResult<Group>;
    fn find_groups_by_user(&self, user_id: UserId) -> StorageResult<Vec<Group>>;
    fn find_group_by_category(&self, category_id: CategoryId) -> StorageResult<Group>;
    fn delete_category(&self, id: CategoryId) -> StorageResult<()>;
    fn delete_group(&self, id: GroupId) -> StorageResult<()>;

    /// The user's groups ordered by display order then name, each holding only
    /// the categories active for `month`, sorted by name.
    fn find_groups_by_user_and_month(
        &self,
        user_id: UserId,
        month: Month,
    ) -> StorageResult<Vec<Group>> {
        let mut groups: Vec<Group> = self
            .find_groups_by_user(user_id)?
            .iter()
            .map(|group| group.for_month(month))
            .collect();
        sort_groups(&mut groups);
        for group in &mut groups {
            group.sort_categories_by_name();
        }
        Ok(groups)
    }
}

pub trait ExpenseRepository: Send + Sync {
    fn save_expense(&self, expense: &Expense) -> StorageResult<()>;
    fn find_expense(&self, id: ExpenseId) -> StorageResult<Expense>;
    fn delete_expense(&self, id: ExpenseId) -> StorageResult<()>;
    /// Every expense whose category belongs to one of the user's groups, oldest first.
    fn find_expenses_by_user(&self, user_id: UserId) -> StorageResult<Vec<Expense>>;
    /// Expenses dated in `month` whose category belongs to one of the user's groups.
    fn find_expenses_by_user_and_month(
        &self,
        user_id: UserId,
        month: Month,
    ) -> StorageResult<Vec<Expense>>;
    /// Moves expenses of `from` dated in or after `month` to `to`; returns how many moved.
    fn reassign_category_from_month(
        &self,
        from: CategoryId,
        to: CategoryId,
        month: Month,
    ) -> StorageResult<usize>;

    fn total_for_month(
        &self,
        user_id: UserId,
        month: Month,
        currency: &CurrencyCode,
    ) -> StorageResult<Money> {
        let expenses = self.find_expenses_by_user_and_month(user_id, month)?;
        Ok(Money::sum(currency, expenses.iter().map(Expense::amount))
            .map_err(TrackingError::from)?)
    }

    fn totals_by_category(
        &self,
        user_id: UserId,
        month: Month,
        currency: &CurrencyCode,
    ) -> StorageResult<HashMap<CategoryId, CategoryTotals>> {
        let expenses = self.find_expenses_by_user_and_month(user_id, month)?;
        let mut by_category: HashMap<CategoryId, Vec<&Expense>> = HashMap::new();
        for expense in &expenses {
            by_category
                .entry(expense.category_id())
                .or_default()
                .push(expense);
        }
        let mut totals = HashMap::with_capacity(by_category.len());
        for (category_id, items) in by_category {
            let summed = CategoryTotals::from_expenses(category_id, currency, items)
                .map_err(TrackingError::from)?;
            totals.insert(category_id, summed);
        }
        Ok(totals)
    }
}

pub trait IncomeRepository: Send + Sync {
    fn save_income(&self, income: &Income) -> StorageResult<()>;
    fn find_income(&self, id: IncomeId) -> StorageResult<Income>;
    fn delete_income(&self, id: IncomeId) -> StorageResult<()>;
    fn find_incomes_by_user(&self, user_id: UserId) -> StorageResult<Vec<Income>>;
    fn find_incomes_by_user_and_month(
        &self,
        user_id: UserId,
        month: Month,
    ) -> StorageResult<Vec<Income>>;

    fn total_for_month(
        &self,
        user_id: UserId,
        month: Month,
        currency: &CurrencyCode,
    ) -> StorageResult<Money> {
        let incomes = self.find_incomes_by_user_and_month(user_id, month)?;
        Ok(Money::sum(currency, incomes.iter().map(Income::amount))
            .map_err(TrackingError::from)?)
    }
}

/// Everything a store persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub incomes: Vec<Income>,
}

impl Snapshot {
    fn category_ids_of_user(&self, user_id: UserId) -> HashSet<CategoryId> {
        self.groups
            .iter()
            .filter(|group| group.user_id() == user_id)
            .flat_map(|group| group.categories().iter().map(|category| category.id()))
            .collect()
    }
}

/// A backend exposing its [`Snapshot`] for reads and staged writes.
pub trait SnapshotStore: Send + Sync {
    fn read<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> StorageResult<R>;

    /// Runs `f` on a staged copy and commits it only when `f` succeeds.
    fn write<R>(&self, f: impl FnOnce(&mut Snapshot) -> StorageResult<R>) -> StorageResult<R>;
}

impl<S: SnapshotStore> GroupRepository for S {
    fn save_group(&self, group: &Group) -> StorageResult<()> {
        self.write(|snapshot| {
            upsert(&mut snapshot.groups, group);
            Ok(())
        })
    }

    fn find_group(&self, id: GroupId) -> StorageResult<Group> {
        self.read(|snapshot| snapshot.groups.iter().find(|g| g.id() == id).cloned())?
            .ok_or_else(|| TrackingError::GroupNotFound(id).into())
    }

    fn find_groups_by_user(&self, user_id: UserId) -> StorageResult<Vec<Group>> {
        self.read(|snapshot| {
            snapshot
                .groups
                .iter()
                .filter(|group| group.user_id() == user_id)
                .cloned()
                .collect()
        })
    }

    fn find_group_by_category(&self, category_id: CategoryId) -> StorageResult<Group> {
        self.read(|snapshot| {
            snapshot
                .groups
                .iter()
                .find(|group| group.category(category_id).is_some())
                .cloned()
        })?
        .ok_or_else(|| TrackingError::CategoryNotFound(category_id).into())
    }

    fn delete_category(&self, id: CategoryId) -> StorageResult<()> {
        self.write(|snapshot| {
            let group = snapshot
                .groups
                .iter_mut()
                .find(|group| group.category(id).is_some())
                .ok_or(TrackingError::CategoryNotFound(id))?;
            group.remove_category(id)?;
            snapshot.expenses.retain(|expense| expense.category_id() != id);
            Ok(())
        })
    }

    fn delete_group(&self, id: GroupId) -> StorageResult<()> {
        self.write(|snapshot| {
            let index = snapshot
                .groups
                .iter()
                .position(|group| group.id() == id)
                .ok_or(TrackingError::GroupNotFound(id))?;
            let removed = snapshot.groups.remove(index);
            let owned: HashSet<CategoryId> =
                removed.categories().iter().map(|category| category.id()).collect();
            snapshot
                .expenses
                .retain(|expense| !owned.contains(&expense.category_id()));
            Ok(())
        })
    }
}

impl<S: SnapshotStore> ExpenseRepository for S {
    fn save_expense(&self, expense: &Expense) -> StorageResult<()> {
        self.write(|snapshot| {
            upsert(&mut snapshot.expenses, expense);
            Ok(())
        })
    }

    fn find_expense(&self, id: ExpenseId) -> StorageResult<Expense> {
        self.read(|snapshot| snapshot.expenses.iter().find(|e| e.id() == id).cloned())?
            .ok_or_else(|| TrackingError::ExpenseNotFound(id).into())
    }

    fn delete_expense(&self, id: ExpenseId) -> StorageResult<()> {
        self.write(|snapshot| {
            let before = snapshot.expenses.len();
            snapshot.expenses.retain(|expense| expense.id() != id);
            if snapshot.expenses.len() == before {
                return Err(TrackingError::ExpenseNotFound(id).into());
            }
            Ok(())
        })
    }

    fn find_expenses_by_user(&self, user_id: UserId) -> StorageResult<Vec<Expense>> {
        self.read(|snapshot| {
            let categories = snapshot.category_ids_of_user(user_id);
            let mut expenses: Vec<Expense> = snapshot
                .expenses
                .iter()
                .filter(|e| categories.contains(&e.category_id()))
                .cloned()
                .collect();
            expenses.sort_by_key(|expense| expense.spent_at());
            expenses
        })
    }

    fn find_expenses_by_user_and_month(
        &self,
        user_id: UserId,
        month: Month,
    ) -> StorageResult<Vec<Expense>> {
        self.read(|snapshot| {
            let categories = snapshot.category_ids_of_user(user_id);
            let mut expenses: Vec<Expense> = snapshot
                .expenses
                .iter()
                .filter(|e| e.month() == month && categories.contains(&e.category_id()))
                .cloned()
                .collect();
            expenses.sort_by_key(|expense| expense.spent_at());
            expenses
        })
    }

    fn reassign_category_from_month(
        &self,
        from: CategoryId,
        to: CategoryId,
        month: Month,
    ) -> StorageResult<usize> {
        self.write(|snapshot| {
            let mut moved = 0;
            for expense in snapshot
                .expenses
                .iter_mut()
                .filter(|e| e.category_id() == from && !e.month().before(&month))
            {
                expense.reassign(to);
                moved += 1;
            }
            Ok(moved)
        })
    }
}

impl<S: SnapshotStore> IncomeRepository for S {
    fn save_income(&self, income: &Income) -> StorageResult<()> {
        self.write(|snapshot| {
            upsert(&mut snapshot.incomes, income);
            Ok(())
        })
    }

    fn find_income(&self, id: IncomeId) -> StorageResult<Income> {
        self.read(|snapshot| snapshot.incomes.iter().find(|i| i.id() == id).cloned())?
            .ok_or_else(|| TrackingError::IncomeNotFound(id).into())
    }

    fn delete_income(&self, id: IncomeId) -> StorageResult<()> {
        self.write(|snapshot| {
            let before = snapshot.incomes.len();
            snapshot.incomes.retain(|income| income.id() != id);
            if snapshot.incomes.len() == before {
                return Err(TrackingError::IncomeNotFound(id).into());
            }
            Ok(())
        })
    }

    fn find_incomes_by_user(&self, user_id: UserId) -> StorageResult<Vec<Income>> {
        self.read(|snapshot| {
            let mut incomes: Vec<Income> = snapshot
                .incomes
                .iter()
                .filter(|income| income.user_id() == user_id)
                .cloned()
                .collect();
            incomes.sort_by_key(|income| income.received_at());
            incomes
        })
    }

    fn find_incomes_by_user_and_month(
        &self,
        user_id: UserId,
        month: Month,
    ) -> StorageResult<Vec<Income>> {
        Ok(self
            .find_incomes_by_user(user_id)?
            .into_iter()
            .filter(|income| income.month() == month)
            .collect())
    }
}

/// Replaces the stored item with the same id, or appends it.
fn upsert<T: Identifiable + Clone>(items: &mut Vec<T>, item: &T) {
    let id = item.id();
    match items.iter_mut().find(|existing| existing.id() == id) {
        Some(existing) => *existing = item.clone(),
        None => items.push(item.clone()),
    }
}

pub(crate) fn sort_groups(groups: &mut [Group]) {
    groups.sort_by(|a, b| {
        a.order()
            .cmp(&b.order())
            .then_with(|| a.name().as_str().cmp(b.name().as_str()))
    });
}
