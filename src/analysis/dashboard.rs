//! Assembles every aggregation into one [`Dashboard`].

use super::aggregator;
use crate::models::{Covariate, Dashboard, DashboardMetadata, Table};
use chrono::Utc;
use indicatif::ProgressBar;
use tracing::debug;

/// Which optional views to include and how to bin the histograms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardOptions {
    pub histogram_bins: usize,
    /// Number of raw rows to include, `None` to omit the raw view.
    pub head_rows: Option<usize>,
    pub include_describe: bool,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            histogram_bins: aggregator::DEFAULT_BINS,
            head_rows: Some(5),
            include_describe: false,
        }
    }
}

/// Run every aggregation over `table`, ticking `progress` once per section.
pub fn build_dashboard(
    table: &Table,
    source: &str,
    options: &DashboardOptions,
    progress: &ProgressBar,
) -> Dashboard {
    let (first_date, last_date) = match table.date_range() {
        Some((first, last)) => (Some(first), Some(last)),
        None => (None, None),
    };

    let metadata = DashboardMetadata {
        source: source.to_string(),
        rows: table.len(),
        first_date,
        last_date,
        generated_at: Utc::now(),
    };

    let step = |name: &str| {
        debug!("Computing {}", name);
        progress.set_message(name.to_string());
        progress.inc(1);
    };

    step("raw data");
    let head = options.head_rows.map(|n| aggregator::head(table, n));

    step("description");
    let description = options.include_describe.then(|| aggregator::describe(table));

    step("yearly trend");
    let yearly_trend = aggregator::yearly_trend(table);

    step("working day comparison");
    let working_day = aggregator::working_day_comparison(table);

    step("scatter series");
    let scatter = Covariate::ALL
        .iter()
        .map(|c| aggregator::scatter_series(table, *c))
        .collect();

    step("user distribution");
    let user_distribution = aggregator::user_distribution(table, options.histogram_bins);

    step("user statistics");
    let user_statistics = aggregator::user_statistics(table);

    step("daily average");
    let daily_average = aggregator::daily_average(table);

    step("holiday comparison");
    let holiday = aggregator::holiday_comparison(table);

    step("weather usage");
    let weather = aggregator::weather_usage(table);

    Dashboard {
        metadata,
        head,
        description,
        yearly_trend,
        working_day,
        scatter,
        user_distribution,
        user_statistics,
        daily_average,
        holiday,
        weather,
    }
}

/// Number of progress steps [`build_dashboard`] reports.
pub const DASHBOARD_STEPS: u64 = 10;
