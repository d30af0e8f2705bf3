#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use budget_tracking::{
    config::{Config, ConfigManager},
    core::services::{
        CategoryInput, CategoryService, DashboardService, ExpenseService, GroupInput, GroupService,
        IncomeService,
    },
    domain::{CurrencyCode, Money},
    storage::{JsonStore, MemoryStore},
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub struct Services {
    pub groups: GroupService,
    pub categories: CategoryService,
    pub expenses: ExpenseService,
    pub incomes: IncomeService,
    pub dashboard: DashboardService,
}

pub fn services_over<S>(store: Arc<S>) -> Services
where
    S: budget_tracking::storage::SnapshotStore + 'static,
{
    let currency = CurrencyCode::default();
    Services {
        groups: GroupService::new(store.clone()),
        categories: CategoryService::new(store.clone(), store.clone(), currency.clone()),
        expenses: ExpenseService::new(store.clone(), store.clone(), currency.clone()),
        incomes: IncomeService::new(store.clone(), currency.clone()),
        dashboard: DashboardService::new(store.clone(), store.clone(), store, currency),
    }
}

pub fn memory_env() -> (Arc<MemoryStore>, Services) {
    let store = Arc::new(MemoryStore::new());
    let services = services_over(store.clone());
    (store, services)
}

/// Creates a config manager and JSON store rooted in a unique directory.
pub fn json_env() -> (ConfigManager, Config) {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let manager = ConfigManager::with_base_dir(base.clone()).expect("create config manager");
    let config = Config {
        data_dir: Some(base.join("data")),
        backup_retention: 3,
        ..Config::default()
    };
    manager.save(&config).expect("save config");
    (manager, config)
}

pub fn open_store(config: &Config) -> Arc<JsonStore> {
    Arc::new(JsonStore::from_config(config).expect("open json store"))
}

pub fn usd(cents: i64) -> Money {
    Money::new(cents, &CurrencyCode::default())
}

pub fn group_input(name: &str, order: i64) -> GroupInput {
    GroupInput {
        name: name.into(),
        description: String::new(),
        order,
    }
}

pub fn category_input(
    name: &str,
    recurrent: bool,
    start: &str,
    end: Option<&str>,
    budget_cents: i64,
) -> CategoryInput {
    CategoryInput {
        name: name.into(),
        description: String::new(),
        is_recurrent: recurrent,
        start_month: start.into(),
        end_month: end.map(String::from),
        budget_cents,
    }
}
