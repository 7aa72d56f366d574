//! Data models for the bike-share dashboard.
//!
//! This module contains the core data structures used throughout the
//! application: the loaded records, the read-only table, and the summaries
//! produced by each aggregation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

/// Season of the year, encoded 1..=4 in the source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// Decode the numeric season code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Season::Spring),
            2 => Some(Season::Summer),
            3 => Some(Season::Fall),
            4 => Some(Season::Winter),
            _ => None,
        }
    }

    /// Numeric code as stored in the source data.
    pub fn code(&self) -> u8 {
        match self {
            Season::Spring => 1,
            Season::Summer => 2,
            Season::Fall => 3,
            Season::Winter => 4,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Spring => write!(f, "Spring"),
            Season::Summer => write!(f, "Summer"),
            Season::Fall => write!(f, "Fall"),
            Season::Winter => write!(f, "Winter"),
        }
    }
}

/// Weather situation, encoded 1..=4 from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum WeatherSituation {
    /// Clear, few clouds, partly cloudy
    Clear,
    /// Mist with clouds or broken clouds
    MistCloudy,
    /// Light snow, light rain, scattered thunderstorms
    LightSnowRain,
    /// Heavy rain, ice pellets, snow and fog
    HeavyRainSnow,
}

impl WeatherSituation {
    /// Decode the numeric weather code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(WeatherSituation::Clear),
            2 => Some(WeatherSituation::MistCloudy),
            3 => Some(WeatherSituation::LightSnowRain),
            4 => Some(WeatherSituation::HeavyRainSnow),
            _ => None,
        }
    }

    /// Numeric code as stored in the source data.
    pub fn code(&self) -> u8 {
        match self {
            WeatherSituation::Clear => 1,
            WeatherSituation::MistCloudy => 2,
            WeatherSituation::LightSnowRain => 3,
            WeatherSituation::HeavyRainSnow => 4,
        }
    }

    /// Dashboard label for this weather situation.
    pub fn label(&self) -> &'static str {
        match self {
            WeatherSituation::Clear => "Clear",
            WeatherSituation::MistCloudy => "Mist/Cloudy",
            WeatherSituation::LightSnowRain => "Light Snow/Rain",
            WeatherSituation::HeavyRainSnow => "Heavy Rain/Snow",
        }
    }
}

impl fmt::Display for WeatherSituation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One calendar day of bike-share activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(rename = "Instant")]
    pub instant: u32,
    #[serde(rename = "Date_Day")]
    pub date_day: NaiveDate,
    #[serde(rename = "Season")]
    pub season: Season,
    /// 0 for 2011, 1 for 2012.
    #[serde(rename = "Year")]
    pub year: u8,
    #[serde(rename = "Month")]
    pub month: u8,
    /// Only present in the hourly variant of the dataset.
    #[serde(rename = "Hour", skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
    #[serde(rename = "Holiday")]
    pub holiday: bool,
    #[serde(rename = "Weekday")]
    pub weekday: u8,
    #[serde(rename = "Working_Day")]
    pub working_day: bool,
    #[serde(rename = "Weather_Situation")]
    pub weather_situation: WeatherSituation,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Apparent_Temperature")]
    pub apparent_temperature: f64,
    #[serde(rename = "Humidity")]
    pub humidity: f64,
    #[serde(rename = "Wind_Speed")]
    pub wind_speed: f64,
    #[serde(rename = "Casual_Users")]
    pub casual_users: u32,
    #[serde(rename = "Registered_Users")]
    pub registered_users: u32,
    #[serde(rename = "Total_Count")]
    pub total_count: u32,
}

impl Record {
    /// Whether `Total_Count == Casual_Users + Registered_Users`.
    pub fn counts_consistent(&self) -> bool {
        u64::from(self.casual_users) + u64::from(self.registered_users)
            == u64::from(self.total_count)
    }
}

/// The full, read-only collection of records in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    records: Vec<Record>,
}

impl Table {
    /// Wrap loaded records. The table is never mutated afterwards.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest `Date_Day`, if the table has any rows.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|r| r.date_day).min()?;
        let last = self.records.iter().map(|r| r.date_day).max()?;
        Some((first, last))
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Continuous weather covariate plotted against `Total_Count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Covariate {
    Temperature,
    ApparentTemperature,
    Humidity,
    WindSpeed,
}

impl Covariate {
    /// All covariates in dashboard order.
    pub const ALL: [Covariate; 4] = [
        Covariate::Temperature,
        Covariate::ApparentTemperature,
        Covariate::Humidity,
        Covariate::WindSpeed,
    ];

    /// Read this covariate from a record.
    pub fn value(&self, record: &Record) -> f64 {
        match self {
            Covariate::Temperature => record.temperature,
            Covariate::ApparentTemperature => record.apparent_temperature,
            Covariate::Humidity => record.humidity,
            Covariate::WindSpeed => record.wind_speed,
        }
    }

    /// Canonical column name.
    pub fn column_name(&self) -> &'static str {
        match self {
            Covariate::Temperature => "Temperature",
            Covariate::ApparentTemperature => "Apparent_Temperature",
            Covariate::Humidity => "Humidity",
            Covariate::WindSpeed => "Wind_Speed",
        }
    }

    /// Human-readable chart title.
    pub fn title(&self) -> &'static str {
        match self {
            Covariate::Temperature => "Actual Temperature vs Total Riders",
            Covariate::ApparentTemperature => "Apparent Temperature vs Total Riders",
            Covariate::Humidity => "Humidity vs Total Riders",
            Covariate::WindSpeed => "Wind Speed vs Total Riders",
        }
    }
}

/// A grouped value with its numeric group code and display label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledValue {
    pub code: u8,
    pub label: String,
    pub value: f64,
}

impl LabeledValue {
    pub fn new(code: u8, label: impl Into<String>, value: f64) -> Self {
        Self {
            code,
            label: label.into(),
            value,
        }
    }
}

/// One `(x, Total_Count)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

/// Pass-through scatter series for one covariate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub covariate: Covariate,
    pub points: Vec<ScatterPoint>,
    /// Pearson correlation of x against y, if defined.
    pub correlation: Option<f64>,
}

/// Density histogram of one user series over shared bin edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDensity {
    pub name: String,
    pub counts: Vec<usize>,
    pub density: Vec<f64>,
    /// Gaussian KDE evaluated at the bin midpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kde: Option<Vec<f64>>,
}

/// Registered vs casual distribution on a shared set of bin edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityHistogram {
    pub edges: Vec<f64>,
    pub registered: SeriesDensity,
    pub casual: SeriesDensity,
}

impl DensityHistogram {
    pub fn bin_width(&self) -> f64 {
        match self.edges.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }
}

/// Max, min and sum of one user column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub max: u32,
    pub min: u32,
    pub sum: u64,
}

/// The six user-statistics scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserStatistics {
    pub registered: UserStats,
    pub casual: UserStats,
}

/// One calendar day of the resampled series. `None` marks a missing day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyAverage {
    pub date: NaiveDate,
    pub mean_registered: Option<f64>,
    pub mean_casual: Option<f64>,
}

/// Five-number summary used by the box plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Full `Total_Count` distribution for one holiday group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolidayGroup {
    pub code: u8,
    pub label: String,
    /// Sorted ascending.
    pub values: Vec<u32>,
    pub summary: FiveNumberSummary,
}

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescription {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, undefined for fewer than two rows.
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

/// Metadata about the loaded dataset and the rendering pass.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetadata {
    pub source: String,
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub generated_at: DateTime<Utc>,
}

/// Every aggregate for one rendering pass.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub metadata: DashboardMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Vec<Record>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Vec<ColumnDescription>>,
    pub yearly_trend: Vec<LabeledValue>,
    pub working_day: Vec<LabeledValue>,
    pub scatter: Vec<ScatterSeries>,
    pub user_distribution: DensityHistogram,
    pub user_statistics: UserStatistics,
    pub daily_average: Vec<DailyAverage>,
    pub holiday: Vec<HolidayGroup>,
    pub weather: Vec<LabeledValue>,
}
