//! Fixed raw-to-canonical column mapping.

use super::LoadError;
use csv::StringRecord;
use tracing::debug;

/// Canonical dataset columns, in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Instant,
    DateDay,
    Season,
    Year,
    Month,
    Hour,
    Holiday,
    Weekday,
    WorkingDay,
    WeatherSituation,
    Temperature,
    ApparentTemperature,
    Humidity,
    WindSpeed,
    CasualUsers,
    RegisteredUsers,
    TotalCount,
}

impl Column {
    /// The mapping entry for this column.
    pub fn spec(self) -> &'static ColumnSpec {
        &COLUMN_MAP[self as usize]
    }
}

/// One entry of the rename table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub column: Column,
    pub raw: &'static str,
    pub canonical: &'static str,
    pub required: bool,
}

const fn spec(column: Column, raw: &'static str, canonical: &'static str, required: bool) -> ColumnSpec {
    ColumnSpec {
        column,
        raw,
        canonical,
        required,
    }
}

/// Number of known columns.
pub const COLUMN_COUNT: usize = 17;

/// Raw CSV header to canonical name. Indexed by `Column as usize`.
pub static COLUMN_MAP: [ColumnSpec; COLUMN_COUNT] = [
    spec(Column::Instant, "instant", "Instant", true),
    spec(Column::DateDay, "dteday", "Date_Day", true),
    spec(Column::Season, "season", "Season", true),
    spec(Column::Year, "yr", "Year", true),
    spec(Column::Month, "mnth", "Month", true),
    spec(Column::Hour, "hr", "Hour", false),
    spec(Column::Holiday, "holiday", "Holiday", true),
    spec(Column::Weekday, "weekday", "Weekday", true),
    spec(Column::WorkingDay, "workingday", "Working_Day", true),
    spec(Column::WeatherSituation, "weathersit", "Weather_Situation", true),
    spec(Column::Temperature, "temp", "Temperature", true),
    spec(Column::ApparentTemperature, "atemp", "Apparent_Temperature", true),
    spec(Column::Humidity, "hum", "Humidity", true),
    spec(Column::WindSpeed, "windspeed", "Wind_Speed", true),
    spec(Column::CasualUsers, "casual", "Casual_Users", true),
    spec(Column::RegisteredUsers, "registered", "Registered_Users", true),
    spec(Column::TotalCount, "cnt", "Total_Count", true),
];

/// Positions of each canonical column within a CSV header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderIndex {
    positions: [Option<usize>; COLUMN_COUNT],
}

impl HeaderIndex {
    /// Match a header row against [`COLUMN_MAP`].
    ///
    /// Every required column must be present. Unknown columns are ignored.
    pub fn resolve(headers: &StringRecord) -> Result<Self, LoadError> {
        let names: Vec<&str> = headers.iter().map(normalize_header_name).collect();
        let mut positions = [None; COLUMN_COUNT];

        for entry in &COLUMN_MAP {
            let position = names.iter().position(|name| *name == entry.raw);
            if position.is_none() && entry.required {
                return Err(LoadError::Schema {
                    raw: entry.raw,
                    canonical: entry.canonical,
                });
            }
            positions[entry.column as usize] = position;
        }

        for name in &names {
            if !COLUMN_MAP.iter().any(|entry| entry.raw == *name) {
                debug!("Ignoring unknown column '{}'", name);
            }
        }

        Ok(Self { positions })
    }

    /// Position of `column` in the header, if present.
    pub fn position(&self, column: Column) -> Option<usize> {
        self.positions[column as usize]
    }
}

fn normalize_header_name(name: &str) -> &str {
    // Spreadsheet exports may prefix the first header with a BOM.
    name.trim().trim_start_matches('\u{feff}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_map_is_indexed_by_column() {
        for (idx, entry) in COLUMN_MAP.iter().enumerate() {
            assert_eq!(entry.column as usize, idx);
        }
        assert_eq!(Column::TotalCount.spec().canonical, "Total_Count");
        assert_eq!(Column::DateDay.spec().raw, "dteday");
    }

    #[test]
    fn test_resolve_reordered_header() {
        let headers = StringRecord::from(vec![
            "cnt", "registered", "casual", "windspeed", "hum", "atemp", "temp", "weathersit",
            "workingday", "weekday", "holiday", "mnth", "yr", "season", "dteday", "instant",
        ]);
        let index = HeaderIndex::resolve(&headers).unwrap();
        assert_eq!(index.position(Column::TotalCount), Some(0));
        assert_eq!(index.position(Column::Instant), Some(15));
        assert_eq!(index.position(Column::Hour), None);
    }

    #[test]
    fn test_resolve_strips_bom_and_ignores_extras() {
        let headers = StringRecord::from(vec![
            "\u{feff}instant", "dteday", "season", "yr", "mnth", "holiday", "weekday",
            "workingday", "weathersit", "temp", "atemp", "hum", "windspeed", "casual",
            "registered", "cnt", "notes",
        ]);
        let index = HeaderIndex::resolve(&headers).unwrap();
        assert_eq!(index.position(Column::Instant), Some(0));
    }

    #[test]
    fn test_resolve_reports_first_missing_column() {
        let headers = StringRecord::from(vec!["instant", "dteday"]);
        match HeaderIndex::resolve(&headers) {
            Err(LoadError::Schema { raw, .. }) => assert_eq!(raw, "season"),
            other => panic!("expected schema error, got {:?}", other),
        }
    }
}
