pub mod aggregation;
pub mod services;
