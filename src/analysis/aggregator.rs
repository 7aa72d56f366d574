//! Dashboard aggregations.
//!
//! Every function here is a pure reduction over a loaded [`Table`]. Groups
//! without members are left out of the output instead of being reported as
//! zero or NaN.

use super::stats::{five_number_summary, gaussian_kde, mean, pearson, quantile_sorted, sample_std, sorted};
use crate::loader::{Column, COLUMN_MAP};
use crate::models::{
    ColumnDescription, Covariate, DailyAverage, DensityHistogram, HolidayGroup, LabeledValue,
    Record, ScatterPoint, ScatterSeries, SeriesDensity, Table, UserStatistics, UserStats,
    WeatherSituation,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Default number of histogram bins for the user distribution.
pub const DEFAULT_BINS: usize = 30;

/// Collect `value` per `key`, keys ordered ascending.
fn group_by<K, F, V>(table: &Table, key: F, value: V) -> BTreeMap<K, Vec<f64>>
where
    K: Ord,
    F: Fn(&Record) -> K,
    V: Fn(&Record) -> f64,
{
    let mut grouped: BTreeMap<K, Vec<f64>> = BTreeMap::new();

    for record in table {
        grouped.entry(key(record)).or_default().push(value(record));
    }

    grouped
}

fn total_count(record: &Record) -> f64 {
    f64::from(record.total_count)
}

fn year_label(code: u8) -> String {
    match code {
        0 => "2011".to_string(),
        1 => "2012".to_string(),
        other => format!("{}", 2011 + u32::from(other)),
    }
}

fn day_type_label(working_day: bool) -> &'static str {
    if working_day {
        "Weekday"
    } else {
        "Weekend/Holiday"
    }
}

fn holiday_label(holiday: bool) -> &'static str {
    if holiday {
        "Libur"
    } else {
        "Non-Libur"
    }
}

/// Total riders per year, ordered by year.
pub fn yearly_trend(table: &Table) -> Vec<LabeledValue> {
    group_by(table, |r| r.year, total_count)
        .into_iter()
        .map(|(year, counts)| LabeledValue::new(year, year_label(year), counts.iter().sum()))
        .collect()
}

/// Mean riders on weekends/holidays vs working days.
pub fn working_day_comparison(table: &Table) -> Vec<LabeledValue> {
    group_by(table, |r| r.working_day, total_count)
        .into_iter()
        .filter_map(|(working, counts)| {
            let avg = mean(&counts)?;
            Some(LabeledValue::new(u8::from(working), day_type_label(working), avg))
        })
        .collect()
}

/// `(covariate, Total_Count)` pairs in table order.
pub fn scatter_series(table: &Table, covariate: Covariate) -> ScatterSeries {
    let points: Vec<ScatterPoint> = table
        .iter()
        .map(|r| ScatterPoint {
            x: covariate.value(r),
            y: total_count(r),
        })
        .collect();

    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();

    ScatterSeries {
        covariate,
        correlation: pearson(&xs, &ys),
        points,
    }
}

/// Density histograms of registered and casual riders over shared edges.
///
/// Edges span `[0, max(registered, casual)]` in `bins` equal-width bins; the
/// last bin is closed on the right.
pub fn user_distribution(table: &Table, bins: usize) -> DensityHistogram {
    let bins = bins.max(1);
    let registered: Vec<f64> = table.iter().map(|r| f64::from(r.registered_users)).collect();
    let casual: Vec<f64> = table.iter().map(|r| f64::from(r.casual_users)).collect();

    let max = registered
        .iter()
        .chain(&casual)
        .copied()
        .fold(0.0_f64, f64::max);
    // All-zero data still needs a non-degenerate bin width.
    let upper = if max > 0.0 { max } else { 1.0 };
    let width = upper / bins as f64;

    let mut edges: Vec<f64> = (0..=bins).map(|i| i as f64 * width).collect();
    edges[bins] = upper;

    let midpoints: Vec<f64> = edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();

    DensityHistogram {
        registered: series_density("Registered", &registered, &edges, &midpoints),
        casual: series_density("Casual", &casual, &edges, &midpoints),
        edges,
    }
}

/// Bin of `value` within `edges`: `[edges[i], edges[i + 1])`, with the last
/// bin closed on the right.
fn bin_index(edges: &[f64], value: f64) -> usize {
    let bins = edges.len() - 1;
    edges
        .partition_point(|edge| *edge <= value)
        .saturating_sub(1)
        .min(bins - 1)
}

fn series_density(name: &str, values: &[f64], edges: &[f64], midpoints: &[f64]) -> SeriesDensity {
    let bins = edges.len() - 1;
    let width = edges[bins] / bins as f64;

    let mut counts = vec![0usize; bins];
    for &value in values {
        counts[bin_index(edges, value)] += 1;
    }

    let total = values.len() as f64;
    let density = counts
        .iter()
        .map(|&c| if total > 0.0 { c as f64 / (total * width) } else { 0.0 })
        .collect();

    SeriesDensity {
        name: name.to_string(),
        counts,
        density,
        kde: gaussian_kde(values, midpoints),
    }
}

fn column_stats(values: impl Iterator<Item = u32>) -> UserStats {
    let mut stats: Option<UserStats> = None;

    for v in values {
        let s = stats.get_or_insert(UserStats {
            max: v,
            min: v,
            sum: 0,
        });
        s.max = s.max.max(v);
        s.min = s.min.min(v);
        s.sum += u64::from(v);
    }

    stats.unwrap_or(UserStats { max: 0, min: 0, sum: 0 })
}

/// Max, min and sum of registered and casual riders.
pub fn user_statistics(table: &Table) -> UserStatistics {
    UserStatistics {
        registered: column_stats(table.iter().map(|r| r.registered_users)),
        casual: column_stats(table.iter().map(|r| r.casual_users)),
    }
}

/// Mean registered and casual riders for every calendar day between the
/// first and last date.
///
/// Days with several rows are averaged. Days without rows carry `None`.
pub fn daily_average(table: &Table) -> Vec<DailyAverage> {
    let Some((first, last)) = table.date_range() else {
        return Vec::new();
    };

    let mut by_day: BTreeMap<NaiveDate, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for record in table {
        let entry = by_day.entry(record.date_day).or_default();
        entry.0.push(f64::from(record.registered_users));
        entry.1.push(f64::from(record.casual_users));
    }

    first
        .iter_days()
        .take_while(|day| *day <= last)
        .map(|date| match by_day.get(&date) {
            Some((registered, casual)) => DailyAverage {
                date,
                mean_registered: mean(registered),
                mean_casual: mean(casual),
            },
            None => DailyAverage {
                date,
                mean_registered: None,
                mean_casual: None,
            },
        })
        .collect()
}

/// Full `Total_Count` distribution for non-holidays and holidays.
pub fn holiday_comparison(table: &Table) -> Vec<HolidayGroup> {
    let mut grouped: BTreeMap<bool, Vec<u32>> = BTreeMap::new();
    for record in table {
        grouped.entry(record.holiday).or_default().push(record.total_count);
    }

    grouped
        .into_iter()
        .filter_map(|(holiday, mut values)| {
            values.sort_unstable();
            let as_f64: Vec<f64> = values.iter().map(|&v| f64::from(v)).collect();
            Some(HolidayGroup {
                code: u8::from(holiday),
                label: holiday_label(holiday).to_string(),
                summary: five_number_summary(&as_f64)?,
                values,
            })
        })
        .collect()
}

/// Mean riders per weather situation, ordered by weather code.
pub fn weather_usage(table: &Table) -> Vec<LabeledValue> {
    group_by(table, |r| r.weather_situation, total_count)
        .into_iter()
        .filter_map(|(weather, counts): (WeatherSituation, Vec<f64>)| {
            Some(LabeledValue::new(weather.code(), weather.label(), mean(&counts)?))
        })
        .collect()
}

/// The first `n` records.
pub fn head(table: &Table, n: usize) -> Vec<Record> {
    table.records()[..n.min(table.len())].to_vec()
}

/// Numeric values of one canonical column, `None` for non-numeric columns.
fn column_values(table: &Table, column: Column) -> Option<Vec<f64>> {
    let extract: fn(&Record) -> Option<f64> = match column {
        Column::DateDay => return None,
        Column::Instant => |r| Some(f64::from(r.instant)),
        Column::Season => |r| Some(f64::from(r.season.code())),
        Column::Year => |r| Some(f64::from(r.year)),
        Column::Month => |r| Some(f64::from(r.month)),
        Column::Hour => |r| r.hour.map(f64::from),
        Column::Holiday => |r| Some(f64::from(u8::from(r.holiday))),
        Column::Weekday => |r| Some(f64::from(r.weekday)),
        Column::WorkingDay => |r| Some(f64::from(u8::from(r.working_day))),
        Column::WeatherSituation => |r| Some(f64::from(r.weather_situation.code())),
        Column::Temperature => |r| Some(r.temperature),
        Column::ApparentTemperature => |r| Some(r.apparent_temperature),
        Column::Humidity => |r| Some(r.humidity),
        Column::WindSpeed => |r| Some(r.wind_speed),
        Column::CasualUsers => |r| Some(f64::from(r.casual_users)),
        Column::RegisteredUsers => |r| Some(f64::from(r.registered_users)),
        Column::TotalCount => |r| Some(f64::from(r.total_count)),
    };

    table.iter().map(extract).collect()
}

/// Count, mean, std, min, quartiles and max of every numeric column.
pub fn describe(table: &Table) -> Vec<ColumnDescription> {
    COLUMN_MAP
        .iter()
        .filter_map(|entry| {
            let values = column_values(table, entry.column)?;
            let ordered = sorted(&values);

            Some(ColumnDescription {
                column: entry.canonical.to_string(),
                count: values.len(),
                mean: mean(&values)?,
                std: sample_std(&values),
                min: *ordered.first()?,
                p25: quantile_sorted(&ordered, 0.25)?,
                p50: quantile_sorted(&ordered, 0.5)?,
                p75: quantile_sorted(&ordered, 0.75)?,
                max: *ordered.last()?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_from_reader;
    use crate::loader::tests::SAMPLE;
    use crate::models::tests::record;

    fn sample() -> Table {
        load_from_reader(SAMPLE.as_bytes()).unwrap()
    }

    fn with_total(day: u32, total: u32) -> Record {
        let mut r = record(day, total, 0);
        r.total_count = total;
        r
    }

    #[test]
    fn test_yearly_trend_single_nonzero_row() {
        let mut rows = vec![with_total(0, 100), with_total(1, 0)];
        for (i, r) in rows.iter_mut().enumerate() {
            r.year = i as u8;
        }
        rows.push({
            let mut r = with_total(2, 0);
            r.year = 0;
            r
        });

        let trend = yearly_trend(&Table::new(rows));
        let pairs: Vec<(&str, f64)> = trend.iter().map(|v| (v.label.as_str(), v.value)).collect();
        assert_eq!(pairs, vec![("2011", 100.0), ("2012", 0.0)]);
    }

    #[test]
    fn test_yearly_trend_sample() {
        let trend = yearly_trend(&sample());
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].value, 13515.0);
        assert_eq!(trend[1].value, 3344.0);
    }

    #[test]
    fn test_yearly_trend_omits_missing_year() {
        let trend = yearly_trend(&Table::new(vec![with_total(0, 5)]));
        assert_eq!(trend, vec![LabeledValue::new(0, "2011", 5.0)]);
    }

    #[test]
    fn test_working_day_means() {
        let mut rows = Vec::new();
        for (i, total) in [10, 20, 30].into_iter().enumerate() {
            let mut r = with_total(i as u32, total);
            r.working_day = true;
            rows.push(r);
        }
        for (i, total) in [5, 15].into_iter().enumerate() {
            rows.push(with_total(10 + i as u32, total));
        }

        let comparison = working_day_comparison(&Table::new(rows));
        assert_eq!(
            comparison,
            vec![
                LabeledValue::new(0, "Weekend/Holiday", 10.0),
                LabeledValue::new(1, "Weekday", 20.0),
            ]
        );
    }

    #[test]
    fn test_scatter_passes_values_through() {
        let table = sample();
        let series = scatter_series(&table, Covariate::Humidity);
        assert_eq!(series.points.len(), table.len());
        assert_eq!(series.points[0].x, 0.805833);
        assert_eq!(series.points[0].y, 985.0);
        assert_eq!(series.points[12].y, 1050.0);
        let r = series.correlation.unwrap();
        assert!((-1.0..=1.0).contains(&r));
    }

    #[test]
    fn test_user_statistics() {
        // Registered [3, 7, 2] and casual [1, 9] padded with a zero-rider row
        // would change the minimum, so the series are built separately.
        let registered = Table::new(vec![record(0, 3, 1), record(1, 7, 9), record(2, 2, 1)]);
        let stats = user_statistics(&registered);
        assert_eq!(stats.registered, UserStats { max: 7, min: 2, sum: 12 });

        let casual = Table::new(vec![record(0, 0, 1), record(1, 0, 9)]);
        let stats = user_statistics(&casual);
        assert_eq!(stats.casual, UserStats { max: 9, min: 1, sum: 10 });
    }

    #[test]
    fn test_user_distribution_integrates_to_one() {
        let table = sample();
        let hist = user_distribution(&table, DEFAULT_BINS);

        assert_eq!(hist.edges.len(), DEFAULT_BINS + 1);
        assert_eq!(hist.edges[0], 0.0);
        assert_eq!(*hist.edges.last().unwrap(), 1608.0);

        let width = hist.bin_width();
        for series in [&hist.registered, &hist.casual] {
            assert_eq!(series.counts.iter().sum::<usize>(), table.len());
            let area: f64 = series.density.iter().map(|d| d * width).sum();
            assert!((area - 1.0).abs() < 1e-9);
            assert_eq!(series.kde.as_ref().map(Vec::len), Some(DEFAULT_BINS));
        }
    }

    #[test]
    fn test_user_distribution_max_value_in_last_bin() {
        let table = Table::new(vec![record(0, 10, 0), record(1, 0, 5)]);
        let hist = user_distribution(&table, 2);
        assert_eq!(hist.edges, vec![0.0, 5.0, 10.0]);
        assert_eq!(hist.registered.counts, vec![1, 1]);
        assert_eq!(hist.casual.counts, vec![1, 1]);
    }

    #[test]
    fn test_user_distribution_counts_follow_edges() {
        // 23 / (46 / 30) rounds just below 15, but 23 is exactly edges[15].
        let table = Table::new(vec![record(0, 46, 0), record(1, 23, 0)]);
        let hist = user_distribution(&table, 30);

        assert_eq!(hist.edges[15], 23.0);
        assert_eq!(hist.registered.counts[14], 0);
        assert_eq!(hist.registered.counts[15], 1);
        assert_eq!(hist.registered.counts[29], 1);
    }

    #[test]
    fn test_user_distribution_edge_values_land_in_their_bin() {
        for max in [46u32, 66, 70, 92, 132, 140, 1608] {
            let hist = user_distribution(&Table::new(vec![record(0, max, 0)]), 30);
            for (i, edge) in hist.edges[..30].iter().enumerate() {
                if edge.fract() != 0.0 {
                    continue;
                }
                let table = Table::new(vec![record(0, max, 0), record(1, *edge as u32, 0)]);
                let counts = user_distribution(&table, 30).registered.counts;
                let expected = if i == 29 { 2 } else { 1 };
                assert_eq!(counts[i], expected, "max {} edge {} bin {}", max, edge, i);
            }
        }
    }

    #[test]
    fn test_bin_index() {
        let edges = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(bin_index(&edges, 0.0), 0);
        assert_eq!(bin_index(&edges, 0.999), 0);
        assert_eq!(bin_index(&edges, 1.0), 1);
        assert_eq!(bin_index(&edges, 2.5), 2);
        assert_eq!(bin_index(&edges, 3.0), 2);
    }

    #[test]
    fn test_user_distribution_all_zero() {
        let table = Table::new(vec![record(0, 0, 0)]);
        let hist = user_distribution(&table, 4);
        assert_eq!(hist.edges.len(), 5);
        assert!(hist.registered.density.iter().all(|d| d.is_finite()));
        assert_eq!(hist.registered.kde, None);
    }

    #[test]
    fn test_daily_average_fills_gaps_with_none() {
        let table = Table::new(vec![record(0, 10, 2), record(2, 30, 6)]);
        let daily = daily_average(&table);

        assert_eq!(daily.len(), 3);
        assert_eq!(daily[0].mean_registered, Some(10.0));
        assert_eq!(daily[1].mean_registered, None);
        assert_eq!(daily[1].mean_casual, None);
        assert_eq!(daily[2].mean_casual, Some(6.0));
        assert!(daily.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_daily_average_merges_duplicate_days() {
        let table = Table::new(vec![record(0, 10, 2), record(0, 20, 4)]);
        let daily = daily_average(&table);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].mean_registered, Some(15.0));
        assert_eq!(daily[0].mean_casual, Some(3.0));
    }

    #[test]
    fn test_daily_average_sample_spans_full_range() {
        let daily = daily_average(&sample());
        // 2011-01-01 ..= 2012-01-04
        assert_eq!(daily.len(), 369);
        assert_eq!(daily.iter().filter(|d| d.mean_registered.is_some()).count(), 13);
    }

    #[test]
    fn test_holiday_comparison() {
        let groups = holiday_comparison(&sample());
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].label, "Non-Libur");
        assert_eq!(groups[0].values.len(), 12);
        assert!(groups[0].values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(groups[0].summary.min, 801.0);
        assert_eq!(groups[0].summary.max, 2294.0);

        assert_eq!(groups[1].label, "Libur");
        assert_eq!(groups[1].values, vec![1000]);
        assert_eq!(groups[1].summary.median, 1000.0);
    }

    #[test]
    fn test_weather_usage_ordered_by_code() {
        let mut rows = Vec::new();
        for (i, (code, total)) in [(3, 30), (1, 10), (2, 20), (1, 30), (4, 5)].into_iter().enumerate() {
            let mut r = with_total(i as u32, total);
            r.weather_situation = WeatherSituation::from_code(code).unwrap();
            rows.push(r);
        }

        let usage = weather_usage(&Table::new(rows));
        let codes: Vec<u8> = usage.iter().map(|v| v.code).collect();
        assert_eq!(codes, vec![1, 2, 3, 4]);
        assert_eq!(usage[0], LabeledValue::new(1, "Clear", 20.0));
        assert_eq!(usage[3].label, "Heavy Rain/Snow");
    }

    #[test]
    fn test_weather_usage_omits_empty_groups() {
        let usage = weather_usage(&sample());
        let labels: Vec<&str> = usage.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, vec!["Clear", "Mist/Cloudy", "Light Snow/Rain"]);
    }

    #[test]
    fn test_single_row_outputs_are_defined() {
        let table = Table::new(vec![record(0, 12, 3)]);

        assert!(yearly_trend(&table).iter().all(|v| v.value.is_finite()));
        assert!(working_day_comparison(&table).iter().all(|v| v.value.is_finite()));
        assert!(weather_usage(&table).iter().all(|v| v.value.is_finite()));
        assert_eq!(daily_average(&table)[0].mean_registered, Some(12.0));
        assert_eq!(holiday_comparison(&table)[0].summary.q3, 15.0);
        assert!(user_distribution(&table, DEFAULT_BINS)
            .registered
            .density
            .iter()
            .all(|d| d.is_finite()));
        assert!(describe(&table).iter().all(|d| d.mean.is_finite() && d.std.is_none()));
    }

    #[test]
    fn test_aggregations_are_idempotent() {
        let table = sample();
        assert_eq!(yearly_trend(&table), yearly_trend(&table));
        assert_eq!(user_distribution(&table, 30), user_distribution(&table, 30));
        assert_eq!(daily_average(&table), daily_average(&table));
        assert_eq!(describe(&table), describe(&table));
    }

    #[test]
    fn test_describe_columns() {
        let description = describe(&sample());
        let columns: Vec<&str> = description.iter().map(|d| d.column.as_str()).collect();

        assert!(!columns.contains(&"Date_Day"));
        assert!(!columns.contains(&"Hour"));
        assert_eq!(columns.first(), Some(&"Instant"));
        assert_eq!(columns.last(), Some(&"Total_Count"));
        assert_eq!(columns.len(), 15);

        let year = description.iter().find(|d| d.column == "Year").unwrap();
        assert_eq!(year.count, 13);
        assert_eq!(year.min, 0.0);
        assert_eq!(year.max, 1.0);
    }

    #[test]
    fn test_head() {
        let table = sample();
        assert_eq!(head(&table, 5).len(), 5);
        assert_eq!(head(&table, 100).len(), 13);
        assert_eq!(head(&table, 0).len(), 0);
    }
}
