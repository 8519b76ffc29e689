//! Core data types shared by the pipeline stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the NSE daily export, as read from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Series", default)]
    pub series: Option<String>,
    #[serde(rename = "Prev Close")]
    pub prev_close: f64,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Last")]
    pub last: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "VWAP")]
    pub vwap: f64,
    #[serde(rename = "Volume")]
    pub volume: f64,
    #[serde(rename = "Turnover")]
    pub turnover: f64,
    #[serde(rename = "Trades", default)]
    pub trades: Option<f64>,
    #[serde(rename = "Deliverable Volume", default)]
    pub deliverable_volume: Option<f64>,
    #[serde(rename = "%Deliverble", default)]
    pub pct_deliverable: Option<f64>,
}

/// A cleaned row: canonical ticker, ordinal date, imputed deliverable share.
///
/// Trades, deliverable volume and series code are dropped during cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    /// Proleptic Gregorian ordinal; 0001-01-01 is day 1.
    #[serde(rename = "Date")]
    pub date: i32,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Prev Close")]
    pub prev_close: f64,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Last")]
    pub last: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "VWAP")]
    pub vwap: f64,
    #[serde(rename = "Volume")]
    pub volume: f64,
    #[serde(rename = "Turnover")]
    pub turnover: f64,
    #[serde(rename = "%Deliverble")]
    pub pct_deliverable: f64,
}

/// Date-ordered rows of a single symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSeries {
    pub symbol: String,
    pub records: Vec<CleanedRecord>,
}

impl SymbolSeries {
    pub fn new(symbol: impl Into<String>, records: Vec<CleanedRecord>) -> Self {
        Self {
            symbol: symbol.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ordinal dates.
    pub fn dates(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.date as f64).collect()
    }

    /// Volume weighted average price, the modeled series.
    pub fn vwap(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.vwap).collect()
    }

    pub fn volume(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.volume).collect()
    }

    pub fn turnover(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.turnover).collect()
    }

    /// Check that dates are strictly increasing.
    pub fn validate(&self) -> bool {
        self.records.windows(2).all(|w| w[0].date < w[1].date)
    }
}

/// ARIMA order triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// Autoregressive order.
    pub p: usize,
    /// Differencing order.
    pub d: usize,
    /// Moving-average order.
    pub q: usize,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

impl From<[usize; 3]> for ArimaOrder {
    fn from(o: [usize; 3]) -> Self {
        Self::new(o[0], o[1], o[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: i32, vwap: f64) -> CleanedRecord {
        CleanedRecord {
            date,
            symbol: "INFY".to_string(),
            prev_close: vwap,
            open: vwap,
            high: vwap,
            low: vwap,
            last: vwap,
            close: vwap,
            vwap,
            volume: 100.0,
            turnover: 100.0 * vwap,
            pct_deliverable: 0.5,
        }
    }

    #[test]
    fn test_series_accessors() {
        let series = SymbolSeries::new("INFY", vec![record(10, 1.0), record(11, 2.0)]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.vwap(), vec![1.0, 2.0]);
        assert_eq!(series.dates(), vec![10.0, 11.0]);
        assert!(series.validate());
    }

    #[test]
    fn test_series_validate_rejects_unordered_dates() {
        let series = SymbolSeries::new("INFY", vec![record(11, 1.0), record(11, 2.0)]);
        assert!(!series.validate());
    }

    #[test]
    fn test_order_display() {
        assert_eq!(ArimaOrder::new(1, 1, 0).to_string(), "ARIMA(1,1,0)");
        assert_eq!(ArimaOrder::from([2, 0, 1]), ArimaOrder::new(2, 0, 1));
    }
}
