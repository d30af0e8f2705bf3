#![doc(test(attr(deny(warnings))))]

//! Budget Tracking models monthly budgets as groups of time-bounded categories,
//! keeps category history intact across edits, and rolls a month's spending
//! into a dashboard report.

pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Budget Tracking tracing initialized.");
    });
}

/// Like [`init`], but takes the log directive from a loaded [`config::Config`].
pub fn init_with_config(config: &config::Config) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing_with(&config.log_filter);
        tracing::info!("Budget Tracking tracing initialized.");
    });
}
