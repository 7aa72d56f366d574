//! Analysis modules.
//!
//! Pure aggregations over the loaded table and the dashboard that bundles
//! them for rendering.

pub mod aggregator;
pub mod dashboard;
pub mod stats;

pub use aggregator::*;
pub use dashboard::{build_dashboard, DashboardOptions, DASHBOARD_STEPS};
