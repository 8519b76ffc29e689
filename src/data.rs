//! Data loading and cleaned-table persistence.

use crate::error::{PipelineError, Result};
use crate::types::{CleanedRecord, RawRecord, SymbolSeries};
use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, WriterBuilder};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Date format of the NSE export.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Data source configuration.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// CSV delimiter character.
    pub delimiter: u8,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Load raw daily records from a CSV file.
///
/// Empty cells in the nullable columns (`Trades`, `Deliverable Volume`,
/// `%Deliverble`) become `None`. Any other malformed row is an error.
pub fn load_raw_csv(path: impl AsRef<Path>, config: &DataConfig) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    info!("Loading data from: {}", path.display());

    let reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(config.delimiter)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let records = read_raw(reader)?;
    info!("Loaded {} rows", records.len());
    Ok(records)
}

/// Load raw records from an in-memory CSV document.
pub fn load_raw_str(content: &str, config: &DataConfig) -> Result<Vec<RawRecord>> {
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(config.delimiter)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    read_raw(reader)
}

fn read_raw<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<RawRecord>> {
    let mut records = Vec::new();
    for result in reader.deserialize() {
        let row: RawRecord = result?;
        records.push(row);
    }
    if records.is_empty() {
        return Err(PipelineError::NoData);
    }
    Ok(records)
}

/// Parse a date in the configured format.
pub fn parse_date(s: &str, format: &str) -> std::result::Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), format)
}

/// Day number of a date; 0001-01-01 is day 1.
pub fn to_ordinal(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
}

/// Inverse of [`to_ordinal`].
pub fn from_ordinal(ordinal: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(ordinal)
}

/// Write cleaned records to a CSV file.
pub fn write_cleaned_csv(path: impl AsRef<Path>, records: &[CleanedRecord]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!("Wrote {} cleaned rows to {}", records.len(), path.display());
    Ok(())
}

/// Read a file produced by [`write_cleaned_csv`].
pub fn load_cleaned_csv(path: impl AsRef<Path>) -> Result<Vec<CleanedRecord>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result?);
    }
    debug!("Read {} cleaned rows from {}", records.len(), path.display());
    Ok(records)
}

/// Split cleaned rows into per-symbol series.
///
/// Series come back in sorted symbol order (the category order of the
/// cleaned table); rows keep their source order within a symbol.
pub fn group_by_symbol(records: &[CleanedRecord]) -> Vec<SymbolSeries> {
    let mut groups: BTreeMap<&str, Vec<CleanedRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.symbol.as_str())
            .or_default()
            .push(record.clone());
    }

    groups
        .into_iter()
        .map(|(symbol, rows)| {
            let series = SymbolSeries::new(symbol, rows);
            if !series.validate() {
                warn!("Dates for {} are not strictly increasing", symbol);
            }
            series
        })
        .collect()
}

/// Find a symbol's series by name.
pub fn find_series<'a>(series: &'a [SymbolSeries], symbol: &str) -> Result<&'a SymbolSeries> {
    series
        .iter()
        .find(|s| s.symbol.eq_ignore_ascii_case(symbol))
        .ok_or_else(|| PipelineError::DataError(format!("Symbol '{}' not found", symbol)))
}
