//! Markdown and JSON dashboard rendering.
//!
//! This module turns a computed [`Dashboard`] into a Markdown document with
//! one section per chart, or into pretty-printed JSON with every series in
//! full.

use crate::models::{
    ColumnDescription, DailyAverage, Dashboard, DashboardMetadata, DensityHistogram, HolidayGroup,
    LabeledValue, Record, ScatterSeries, UserStatistics,
};
use anyhow::Result;

/// Generate the complete Markdown dashboard.
pub fn generate_markdown_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    output.push_str("# Bike Sharing Data Analysis Dashboard\n\n");
    output.push_str(&generate_metadata_section(&dashboard.metadata));
    output.push_str(&generate_table_of_contents(dashboard));

    if let Some(ref rows) = dashboard.head {
        output.push_str(&generate_raw_data_section(rows));
    }
    if let Some(ref description) = dashboard.description {
        output.push_str(&generate_description_section(description));
    }

    output.push_str(&generate_labeled_section(
        "Yearly Bike Usage Trend",
        "Year",
        "Total Rides",
        &dashboard.yearly_trend,
    ));
    output.push_str(&generate_labeled_section(
        "Average Usage: Weekday vs Weekend/Holiday",
        "Day Type",
        "Mean Rides",
        &dashboard.working_day,
    ));

    for series in &dashboard.scatter {
        output.push_str(&generate_scatter_section(series));
    }

    output.push_str(&generate_user_statistics_section(&dashboard.user_statistics));
    output.push_str(&generate_distribution_section(&dashboard.user_distribution));
    output.push_str(&generate_daily_section(&dashboard.daily_average));
    output.push_str(&generate_holiday_section(&dashboard.holiday));
    output.push_str(&generate_labeled_section(
        "Average Usage by Weather Situation",
        "Weather",
        "Mean Rides",
        &dashboard.weather,
    ));

    output.push_str(&generate_footer());

    output
}

/// Generate a JSON dashboard.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

fn anchor(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .collect::<String>()
        .replace(' ', "-")
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map(format_value).unwrap_or_default()
}

fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Dataset\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!("- **Rows:** {}\n", metadata.rows));
    if let (Some(first), Some(last)) = (metadata.first_date, metadata.last_date) {
        section.push_str(&format!("- **Date Range:** {} to {}\n", first, last));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents(dashboard: &Dashboard) -> String {
    let mut titles: Vec<&str> = Vec::new();

    if dashboard.head.is_some() {
        titles.push("Raw Data");
    }
    if dashboard.description.is_some() {
        titles.push("Data Description");
    }
    titles.push("Yearly Bike Usage Trend");
    titles.push("Average Usage: Weekday vs Weekend/Holiday");
    for series in &dashboard.scatter {
        titles.push(series.covariate.title());
    }
    titles.extend([
        "User Statistics",
        "Registered vs Casual Distribution",
        "Average Daily Usage",
        "Usage: Holiday vs Non-Holiday",
        "Average Usage by Weather Situation",
    ]);

    let mut toc = String::from("## Contents\n\n");
    for title in titles {
        toc.push_str(&format!("- [{}](#{})\n", title, anchor(title)));
    }
    toc.push('\n');

    toc
}

fn generate_raw_data_section(rows: &[Record]) -> String {
    let mut section = String::from("## Raw Data\n\n");

    section.push_str("| Instant | Date_Day | Season | Year | Month | Holiday | Weekday | Working_Day | Weather_Situation | Temperature | Apparent_Temperature | Humidity | Wind_Speed | Casual_Users | Registered_Users | Total_Count |\n");
    section.push_str("|---:|:---|:---|---:|---:|---:|---:|---:|:---|---:|---:|---:|---:|---:|---:|---:|\n");

    for r in rows {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {:.4} | {:.4} | {:.4} | {:.4} | {} | {} | {} |\n",
            r.instant,
            r.date_day,
            r.season,
            r.year,
            r.month,
            u8::from(r.holiday),
            r.weekday,
            u8::from(r.working_day),
            r.weather_situation,
            r.temperature,
            r.apparent_temperature,
            r.humidity,
            r.wind_speed,
            r.casual_users,
            r.registered_users,
            r.total_count,
        ));
    }
    section.push('\n');

    section
}

fn generate_description_section(description: &[ColumnDescription]) -> String {
    let mut section = String::from("## Data Description\n\n");

    section.push_str("| Column | Count | Mean | Std | Min | 25% | 50% | 75% | Max |\n");
    section.push_str("|:---|---:|---:|---:|---:|---:|---:|---:|---:|\n");

    for d in description {
        section.push_str(&format!(
            "| {} | {} | {:.4} | {} | {:.4} | {:.4} | {:.4} | {:.4} | {:.4} |\n",
            d.column,
            d.count,
            d.mean,
            d.std.map(|s| format!("{:.4}", s)).unwrap_or_default(),
            d.min,
            d.p25,
            d.p50,
            d.p75,
            d.max,
        ));
    }
    section.push('\n');

    section
}

fn generate_labeled_section(title: &str, label: &str, value: &str, rows: &[LabeledValue]) -> String {
    let mut section = format!("## {}\n\n", title);

    if rows.is_empty() {
        section.push_str("No data.\n\n");
        return section;
    }

    section.push_str(&format!("| {} | {} |\n", label, value));
    section.push_str("|:---|---:|\n");
    for row in rows {
        section.push_str(&format!("| {} | {} |\n", row.label, format_value(row.value)));
    }
    section.push('\n');

    section
}

fn generate_scatter_section(series: &ScatterSeries) -> String {
    let mut section = format!("## {}\n\n", series.covariate.title());

    let x_range = min_max(series.points.iter().map(|p| p.x));
    let y_range = min_max(series.points.iter().map(|p| p.y));

    section.push_str(&format!("- **Points:** {}\n", series.points.len()));
    if let (Some((x_lo, x_hi)), Some((y_lo, y_hi))) = (x_range, y_range) {
        section.push_str(&format!(
            "- **{} range:** {:.4} to {:.4}\n",
            series.covariate.column_name(),
            x_lo,
            x_hi
        ));
        section.push_str(&format!(
            "- **Total_Count range:** {} to {}\n",
            format_value(y_lo),
            format_value(y_hi)
        ));
    }
    match series.correlation {
        Some(r) => section.push_str(&format!("- **Correlation (Pearson r):** {:.3}\n", r)),
        None => section.push_str("- **Correlation (Pearson r):** undefined\n"),
    }
    section.push('\n');

    section
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        None => Some((v, v)),
    })
}

fn generate_user_statistics_section(stats: &UserStatistics) -> String {
    let mut section = String::from("## User Statistics\n\n");

    section.push_str("| Users | Max (Days) | Min (Days) | Total |\n");
    section.push_str("|:---|---:|---:|---:|\n");
    section.push_str(&format!(
        "| Registered | {} | {} | {} |\n",
        stats.registered.max, stats.registered.min, stats.registered.sum
    ));
    section.push_str(&format!(
        "| Casual | {} | {} | {} |\n\n",
        stats.casual.max, stats.casual.min, stats.casual.sum
    ));

    section
}

fn generate_distribution_section(hist: &DensityHistogram) -> String {
    let mut section = String::from("## Registered vs Casual Distribution\n\n");

    section.push_str(&format!(
        "*{} bins of width {:.2}; density integrates to 1 per series.*\n\n",
        hist.registered.counts.len(),
        hist.bin_width()
    ));
    section.push_str("| Bin | Registered | Registered Density | Casual | Casual Density |\n");
    section.push_str("|:---|---:|---:|---:|---:|\n");

    for (i, w) in hist.edges.windows(2).enumerate() {
        let closing = if i + 2 == hist.edges.len() { ']' } else { ')' };
        section.push_str(&format!(
            "| [{:.0}, {:.0}{} | {} | {:.6} | {} | {:.6} |\n",
            w[0],
            w[1],
            closing,
            hist.registered.counts[i],
            hist.registered.density[i],
            hist.casual.counts[i],
            hist.casual.density[i],
        ));
    }
    section.push('\n');

    section
}

fn generate_daily_section(daily: &[DailyAverage]) -> String {
    let mut section = String::from("## Average Daily Usage\n\n");

    let missing = daily.iter().filter(|d| d.mean_registered.is_none()).count();
    if missing > 0 {
        section.push_str(&format!(
            "*{} calendar day(s) have no data and are left blank.*\n\n",
            missing
        ));
    }

    section.push_str("| Date | Registered | Casual |\n");
    section.push_str("|:---|---:|---:|\n");
    for d in daily {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            d.date,
            format_optional(d.mean_registered),
            format_optional(d.mean_casual)
        ));
    }
    section.push('\n');

    section
}

fn generate_holiday_section(groups: &[HolidayGroup]) -> String {
    let mut section = String::from("## Usage: Holiday vs Non-Holiday\n\n");

    section.push_str("| Day | Days | Min | Q1 | Median | Q3 | Max |\n");
    section.push_str("|:---|---:|---:|---:|---:|---:|---:|\n");
    for g in groups {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            g.label,
            g.values.len(),
            format_value(g.summary.min),
            format_value(g.summary.q1),
            format_value(g.summary.median),
            format_value(g.summary.q3),
            format_value(g.summary.max),
        ));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    "---\n\n*Dashboard generated by bikedash*\n".to_string()
}
