//! Dataset loading and normalization.
//!
//! This module reads the fixed-schema daily CSV, maps every raw column to its
//! canonical name through [`COLUMN_MAP`], and parses each row into a typed
//! [`Record`]. A failure anywhere aborts the whole load.

pub mod cache;
pub mod schema;

pub use cache::TableCache;
pub use schema::{Column, HeaderIndex, COLUMN_MAP};

use crate::models::{Record, Season, Table, WeatherSituation};
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Date format of the `dteday` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors that abort a dataset load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV header: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },

    #[error("schema error: required column '{raw}' ({canonical}) is missing")]
    Schema {
        raw: &'static str,
        canonical: &'static str,
    },

    /// `column` is `None` when the row itself is malformed (wrong field
    /// count, invalid UTF-8).
    #[error("parse error at data row {row}{}: {reason}", field_context(.column, .value))]
    Parse {
        row: usize,
        column: Option<&'static str>,
        value: String,
        reason: String,
    },

    #[error("dataset is empty: no data rows after the header")]
    EmptyDataset,
}

fn field_context(column: &Option<&'static str>, value: &str) -> String {
    match column {
        Some(column) => format!(", column {} ('{}')", column, value),
        None => String::new(),
    }
}

/// Load the dataset at `path`.
pub fn load_table(path: &Path) -> Result<Table, LoadError> {
    info!("Loading dataset from {}", path.display());

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    load_from_reader(file)
}

/// Load a dataset from any CSV byte source.
pub fn load_from_reader<R: Read>(source: R) -> Result<Table, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|source| LoadError::Csv { source })?
        .clone();

    let index = HeaderIndex::resolve(&headers)?;

    let mut records = Vec::new();
    let mut inconsistent = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let row = idx + 1;
        let raw = result.map_err(|source| LoadError::Parse {
            row,
            column: None,
            value: String::new(),
            reason: format!("malformed row ({})", source),
        })?;
        let record = parse_record(&raw, &index, row)?;

        if !record.counts_consistent() {
            inconsistent += 1;
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(LoadError::EmptyDataset);
    }

    if inconsistent > 0 {
        warn!(
            "{} row(s) have Total_Count != Casual_Users + Registered_Users; keeping values as read",
            inconsistent
        );
    }

    debug!("Parsed {} records", records.len());
    Ok(Table::new(records))
}

/// Parse one CSV row into a typed record.
fn parse_record(raw: &StringRecord, index: &HeaderIndex, row: usize) -> Result<Record, LoadError> {
    let fields = RowFields { raw, index, row };

    let hour = match index.position(Column::Hour) {
        Some(_) => Some(fields.ranged(Column::Hour, 0..=23)?),
        None => None,
    };

    let season_code: u8 = fields.ranged(Column::Season, 1..=4)?;
    let weather_code: u8 = fields.ranged(Column::WeatherSituation, 1..=4)?;

    Ok(Record {
        instant: fields.number(Column::Instant)?,
        date_day: fields.date(Column::DateDay)?,
        season: Season::from_code(season_code).ok_or_else(|| fields.error(Column::Season, "is not a season code"))?,
        year: fields.ranged(Column::Year, 0..=1)?,
        month: fields.ranged(Column::Month, 1..=12)?,
        hour,
        holiday: fields.flag(Column::Holiday)?,
        weekday: fields.ranged(Column::Weekday, 0..=6)?,
        working_day: fields.flag(Column::WorkingDay)?,
        weather_situation: WeatherSituation::from_code(weather_code)
            .ok_or_else(|| fields.error(Column::WeatherSituation, "is not a weather code"))?,
        temperature: fields.real(Column::Temperature)?,
        apparent_temperature: fields.real(Column::ApparentTemperature)?,
        humidity: fields.real(Column::Humidity)?,
        wind_speed: fields.real(Column::WindSpeed)?,
        casual_users: fields.number(Column::CasualUsers)?,
        registered_users: fields.number(Column::RegisteredUsers)?,
        total_count: fields.number(Column::TotalCount)?,
    })
}

/// Typed accessors over one CSV row.
struct RowFields<'a> {
    raw: &'a StringRecord,
    index: &'a HeaderIndex,
    row: usize,
}

impl RowFields<'_> {
    fn text(&self, column: Column) -> Result<&str, LoadError> {
        self.index
            .position(column)
            .and_then(|pos| self.raw.get(pos))
            .ok_or_else(|| self.error(column, "is missing"))
    }

    fn number<T: FromStr>(&self, column: Column) -> Result<T, LoadError>
    where
        T::Err: std::fmt::Display,
    {
        let text = self.text(column)?;
        text.parse::<T>().map_err(|e| LoadError::Parse {
            row: self.row,
            column: Some(column.spec().canonical),
            value: text.to_string(),
            reason: format!("is not a non-negative integer ({})", e),
        })
    }

    fn ranged(&self, column: Column, range: std::ops::RangeInclusive<u8>) -> Result<u8, LoadError> {
        let value: u8 = self.number(column)?;
        if range.contains(&value) {
            Ok(value)
        } else {
            Err(self.error(
                column,
                &format!("is outside {}..={}", range.start(), range.end()),
            ))
        }
    }

    fn flag(&self, column: Column) -> Result<bool, LoadError> {
        Ok(self.ranged(column, 0..=1)? == 1)
    }

    fn real(&self, column: Column) -> Result<f64, LoadError> {
        let text = self.text(column)?;
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            Ok(_) => Err(self.error(column, "is not a finite number")),
            Err(e) => Err(self.error(column, &format!("is not a number ({})", e))),
        }
    }

    fn date(&self, column: Column) -> Result<NaiveDate, LoadError> {
        let text = self.text(column)?;
        NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map_err(|e| self.error(column, &format!("is not a {} date ({})", DATE_FORMAT, e)))
    }

    fn error(&self, column: Column, reason: &str) -> LoadError {
        let value = self
            .index
            .position(column)
            .and_then(|pos| self.raw.get(pos))
            .unwrap_or_default();

        LoadError::Parse {
            row: self.row,
            column: Some(column.spec().canonical),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
