pub mod api;
pub mod charts;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod parsers;
pub mod provider;
pub mod query;
pub mod table;
pub mod time_range;
pub mod transform;

pub use error::{DashboardError, Result};
