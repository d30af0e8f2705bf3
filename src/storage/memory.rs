use std::sync::RwLock;

use crate::errors::{StorageError, StorageResult};

use super::{Snapshot, SnapshotStore};

/// Process-local store, handy for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> StorageResult<Snapshot> {
        self.read(Snapshot::clone)
    }
}

impl SnapshotStore for MemoryStore {
    fn read<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> StorageResult<R> {
        let guard = self.state.read().map_err(|_| StorageError::Poisoned)?;
        Ok(f(&*guard))
    }

    fn write<R>(&self, f: impl FnOnce(&mut Snapshot) -> StorageResult<R>) -> StorageResult<R> {
        let mut guard = self.state.write().map_err(|_| StorageError::Poisoned)?;
        let mut staged = guard.clone();
        let output = f(&mut staged)?;
        *guard = staged;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CategoryDraft, CurrencyCode, Description, DisplayOrder, Expense, Group, Income, Money,
        Month, Name,
    };
    use crate::errors::TrackingError;
    use crate::storage::{ExpenseRepository, GroupRepository, IncomeRepository};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn m(value: &str) -> Month {
        Month::parse(value).unwrap()
    }

    fn usd(cents: i64) -> Money {
        Money::new(cents, &CurrencyCode::default())
    }

    fn group(user: Uuid, name: &str, order: i64) -> Group {
        Group::new(
            Uuid::new_v4(),
            user,
            Name::new(name).unwrap(),
            Description::default(),
            DisplayOrder::new(order).unwrap(),
        )
    }

    fn add(group: &mut Group, name: &str, recurrent: bool, start: &str, end: Option<&str>) -> Uuid {
        group
            .create_category(
                Uuid::new_v4(),
                CategoryDraft {
                    name: Name::new(name).unwrap(),
                    description: Description::default(),
                    is_recurrent: recurrent,
                    start_month: Some(m(start)),
                    end_month: end.map(m),
                    budget: usd(10_000),
                },
            )
            .unwrap()
            .id()
    }

    fn expense(category: Uuid, cents: i64, day: &str) -> Expense {
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap();
        Expense::new(Uuid::new_v4(), category, usd(cents), "", date).unwrap()
    }

    #[test]
    fn save_group_upserts() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let mut household = group(user, "Household", 0);
        store.save_group(&household).unwrap();
        add(&mut household, "Rent", true, "2024-01", None);
        store.save_group(&household).unwrap();

        let loaded = store.find_group(household.id()).unwrap();
        assert_eq!(loaded, household);
        assert_eq!(store.find_groups_by_user(user).unwrap().len(), 1);
    }

    #[test]
    fn missing_rows_report_not_found() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.find_group(id),
            Err(StorageError::Tracking(TrackingError::GroupNotFound(found))) if found == id
        ));
        assert!(matches!(
            store.delete_group(id),
            Err(StorageError::Tracking(TrackingError::GroupNotFound(_)))
        ));
        assert!(matches!(
            store.delete_category(id),
            Err(StorageError::Tracking(TrackingError::CategoryNotFound(_)))
        ));
        assert!(matches!(
            store.delete_expense(id),
            Err(StorageError::Tracking(TrackingError::ExpenseNotFound(_)))
        ));
    }

    #[test]
    fn month_query_orders_and_filters() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let mut savings = group(user, "Savings", 1);
        add(&mut savings, "Emergency", true, "2024-01", None);
        let mut bills = group(user, "Bills", 1);
        add(&mut bills, "Water", true, "2024-01", None);
        add(&mut bills, "Electricity", true, "2024-01", None);
        add(&mut bills, "Old plan", true, "2023-01", Some("2023-12"));
        let mut first = group(user, "Zed", 0);
        add(&mut first, "Gift", false, "2024-03", None);
        for g in [&savings, &bills, &first] {
            store.save_group(g).unwrap();
        }
        store.save_group(&group(Uuid::new_v4(), "Other user", 0)).unwrap();

        let groups = store.find_groups_by_user_and_month(user, m("2024-02")).unwrap();
        let names: Vec<_> = groups.iter().map(|g| g.name().as_str()).collect();
        assert_eq!(names, ["Zed", "Bills", "Savings"]);
        assert!(groups[0].categories().is_empty());
        let bill_names: Vec<_> = groups[1].categories().iter().map(|c| c.name().as_str()).collect();
        assert_eq!(bill_names, ["Electricity", "Water"]);
    }

    #[test]
    fn deleting_category_cascades_expenses() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let mut household = group(user, "Household", 0);
        let food = add(&mut household, "Food", true, "2024-01", None);
        let rent = add(&mut household, "Rent", true, "2024-01", None);
        store.save_group(&household).unwrap();
        store.save_expense(&expense(food, 1_000, "2024-01-03")).unwrap();
        store.save_expense(&expense(rent, 90_000, "2024-01-01")).unwrap();

        store.delete_category(food).unwrap();
        let remaining = store.find_group(household.id()).unwrap();
        assert_eq!(remaining.categories().len(), 1);
        let expenses = store.find_expenses_by_user_and_month(user, m("2024-01")).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].category_id(), rent);

        store.delete_group(household.id()).unwrap();
        assert!(store.snapshot().unwrap().expenses.is_empty());
    }

    #[test]
    fn totals_are_scoped_to_user_and_month() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let mut household = group(user, "Household", 0);
        let food = add(&mut household, "Food", true, "2024-01", None);
        store.save_group(&household).unwrap();
        let mut stranger = group(Uuid::new_v4(), "Stranger", 0);
        let theirs = add(&mut stranger, "Food", true, "2024-01", None);
        store.save_group(&stranger).unwrap();

        let mut paid = expense(food, 4_000, "2024-01-10");
        paid.mark_paid(NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
        store.save_expense(&paid).unwrap();
        store.save_expense(&expense(food, 1_500, "2024-01-20")).unwrap();
        store.save_expense(&expense(food, 9_999, "2024-02-01")).unwrap();
        store.save_expense(&expense(theirs, 7_000, "2024-01-05")).unwrap();

        let currency = CurrencyCode::default();
        let total = ExpenseRepository::total_for_month(&store, user, m("2024-01"), &currency).unwrap();
        assert_eq!(total, usd(5_500));
        let totals = store.totals_by_category(user, m("2024-01"), &currency).unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[&food].spent, usd(5_500));
        assert_eq!(totals[&food].paid, usd(4_000));
    }

    #[test]
    fn reassign_moves_only_later_expenses() {
        let store = MemoryStore::new();
        let (old, new) = (Uuid::new_v4(), Uuid::new_v4());
        let january = expense(old, 100, "2024-01-31");
        let march = expense(old, 200, "2024-03-01");
        store.save_expense(&january).unwrap();
        store.save_expense(&march).unwrap();

        let moved = store.reassign_category_from_month(old, new, m("2024-03")).unwrap();
        assert_eq!(moved, 1);
        assert_eq!(store.find_expense(january.id()).unwrap().category_id(), old);
        assert_eq!(store.find_expense(march.id()).unwrap().category_id(), new);
    }

    #[test]
    fn incomes_total_per_month() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        for (cents, day) in [(200_000, "2024-01-05"), (50_000, "2024-01-20"), (10_000, "2024-02-01")] {
            let income = Income::new(
                Uuid::new_v4(),
                user,
                usd(cents),
                Name::new("Salary").unwrap(),
                NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
            )
            .unwrap();
            store.save_income(&income).unwrap();
        }
        let total =
            IncomeRepository::total_for_month(&store, user, m("2024-01"), &CurrencyCode::default()).unwrap();
        assert_eq!(total, usd(250_000));
        assert_eq!(store.find_incomes_by_user_and_month(user, m("2024-02")).unwrap().len(), 1);
    }

    #[test]
    fn incomes_are_found_and_deleted_by_id() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let income = Income::new(
            Uuid::new_v4(),
            user,
            usd(90_000),
            Name::new("Salary").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
        .unwrap();
        store.save_income(&income).unwrap();
        store.save_income(&income).unwrap();
        assert_eq!(store.find_incomes_by_user(user).unwrap(), vec![income.clone()]);
        assert_eq!(store.find_income(income.id()).unwrap(), income);

        store.delete_income(income.id()).unwrap();
        assert!(matches!(
            store.find_income(income.id()),
            Err(StorageError::Tracking(TrackingError::IncomeNotFound(_)))
        ));
        assert!(store.delete_income(income.id()).is_err());
    }

    #[test]
    fn expenses_by_user_span_all_months() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let mut household = group(user, "Household", 0);
        let food = add(&mut household, "Food", true, "2024-01", None);
        store.save_group(&household).unwrap();
        store.save_expense(&expense(food, 300, "2024-05-01")).unwrap();
        store.save_expense(&expense(food, 100, "2024-01-09")).unwrap();
        store.save_expense(&expense(Uuid::new_v4(), 999, "2024-01-09")).unwrap();

        let amounts: Vec<_> = store
            .find_expenses_by_user(user)
            .unwrap()
            .iter()
            .map(|e| e.amount().cents())
            .collect();
        assert_eq!(amounts, [100, 300]);
    }

    #[test]
    fn failed_write_leaves_state_untouched() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let household = group(user, "Household", 0);
        store.save_group(&household).unwrap();
        let before = store.snapshot().unwrap();

        let result: StorageResult<()> = store.write(|snapshot| {
            snapshot.groups.clear();
            Err(TrackingError::GroupNotFound(household.id()).into())
        });
        assert!(result.is_err());
        assert_eq!(store.snapshot().unwrap(), before);
    }
}
