//! Cleaning of raw daily records.
//!
//! Cleaning turns [`RawRecord`]s into [`CleanedRecord`]s:
//!
//! - legacy tickers are renamed to their current symbol
//! - the symbol becomes a categorical variable ([`SymbolEncoding`])
//! - dates become ordinal day numbers
//! - missing `%Deliverble` values are filled with the column mean
//! - trades, deliverable volume and series code are dropped

use crate::data::{parse_date, to_ordinal, DEFAULT_DATE_FORMAT};
use crate::error::{PipelineError, Result};
use crate::types::{CleanedRecord, RawRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Legacy ticker to current ticker.
pub const LEGACY_TICKERS: [(&str, &str); 16] = [
    ("MUNDRAPORT", "ADANIPORTS"),
    ("UTIBANK", "AXISBANK"),
    ("BAJAUTOFIN", "BAJFINANCE"),
    ("BHARTI", "BHARTIARTL"),
    ("HEROHONDA", "HEROMOTOCO"),
    ("HINDALC0", "HINDALCO"),
    ("HINDLEVER", "HINDUNILVR"),
    ("INFOSYSTCH", "INFY"),
    ("JSWSTL", "JSWSTEEL"),
    ("KOTAKMAH", "KOTAKBANK"),
    ("TELCO", "TATAMOTORS"),
    ("TISCO", "TATASTEEL"),
    ("UNIPHOS", "UPL"),
    ("SESAGOA", "VEDL"),
    ("SSLT", "VEDL"),
    ("ZEETELE", "ZEEL"),
];

/// Index constituents present in the NIFTY-50 export, in category order.
pub const NIFTY50_SYMBOLS: [&str; 50] = [
    "ADANIPORTS", "ASIANPAINT", "AXISBANK", "BAJAJ-AUTO", "BAJAJFINSV", "BAJFINANCE",
    "BHARTIARTL", "BPCL", "BRITANNIA", "CIPLA", "COALINDIA", "DRREDDY", "EICHERMOT", "GAIL",
    "GRASIM", "HCLTECH", "HDFC", "HDFCBANK", "HEROMOTOCO", "HINDALCO", "HINDUNILVR",
    "ICICIBANK", "INDUSINDBK", "INFRATEL", "INFY", "IOC", "ITC", "JSWSTEEL", "KOTAKBANK", "LT",
    "M&M", "MARUTI", "NESTLEIND", "NTPC", "ONGC", "POWERGRID", "RELIANCE", "SBIN", "SHREECEM",
    "SUNPHARMA", "TATAMOTORS", "TATASTEEL", "TCS", "TECHM", "TITAN", "ULTRACEMCO", "UPL", "VEDL",
    "WIPRO", "ZEEL",
];

/// What to do with a symbol that is neither legacy nor known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTickerPolicy {
    /// Keep the symbol and report it.
    #[default]
    Warn,
    /// Abort cleaning.
    Error,
    /// Keep the symbol silently.
    Ignore,
}

impl FromStr for UnknownTickerPolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "ignore" => Ok(Self::Ignore),
            other => Err(PipelineError::ConfigError(format!(
                "Unknown ticker policy '{}' (expected warn, error or ignore)",
                other
            ))),
        }
    }
}

/// Mapping from legacy tickers to canonical tickers.
#[derive(Debug, Clone)]
pub struct TickerMap {
    mapping: HashMap<String, String>,
}

impl Default for TickerMap {
    fn default() -> Self {
        Self::legacy()
    }
}

impl TickerMap {
    /// The fixed NSE rename table.
    pub fn legacy() -> Self {
        let mapping = LEGACY_TICKERS
            .iter()
            .map(|(old, new)| (old.to_string(), new.to_string()))
            .collect();
        Self { mapping }
    }

    /// Add mappings on top of the fixed table.
    pub fn with_extra<I, K, V>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (old, new) in extra {
            self.mapping.insert(old.into(), new.into());
        }
        self
    }

    /// Canonical ticker for a symbol; unmapped symbols pass through.
    pub fn normalize<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.mapping.get(symbol).map(String::as_str).unwrap_or(symbol)
    }

    pub fn is_legacy(&self, symbol: &str) -> bool {
        self.mapping.contains_key(symbol)
    }

    pub fn canonical_symbols(&self) -> BTreeSet<&str> {
        self.mapping.values().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

/// Categorical encoding of the symbol column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEncoding {
    /// Sorted unique symbols.
    pub categories: Vec<String>,
    /// Category index of each row.
    pub codes: Vec<usize>,
}

impl SymbolEncoding {
    pub fn fit<S: AsRef<str>>(symbols: &[S]) -> Self {
        let categories: Vec<String> = symbols
            .iter()
            .map(|s| s.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: HashMap<&str, usize> = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        let codes = symbols.iter().map(|s| index[s.as_ref()]).collect();
        Self { categories, codes }
    }

    pub fn code(&self, symbol: &str) -> Option<usize> {
        self.categories.binary_search_by(|c| c.as_str().cmp(symbol)).ok()
    }

    /// One-hot matrix, one row per record.
    ///
    /// With `drop_first` the first category is the baseline and gets no column.
    pub fn dummies(&self, drop_first: bool) -> Vec<Vec<u8>> {
        let offset = usize::from(drop_first);
        let width = self.categories.len().saturating_sub(offset);
        self.codes
            .iter()
            .map(|&code| {
                let mut row = vec![0u8; width];
                if code >= offset {
                    row[code - offset] = 1;
                }
                row
            })
            .collect()
    }

    /// Column names matching [`SymbolEncoding::dummies`].
    pub fn dummy_names(&self, drop_first: bool) -> Vec<String> {
        self.categories
            .iter()
            .skip(usize::from(drop_first))
            .map(|c| format!("Symbol_{}", c))
            .collect()
    }
}

/// Mean imputation for a single numeric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanImputer {
    mean: f64,
}

impl MeanImputer {
    /// Learn the mean of the observed (non-missing, finite) entries.
    pub fn fit(column: &[Option<f64>]) -> Result<Self> {
        let (sum, count) = column
            .iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        if count == 0 {
            return Err(PipelineError::DataError(
                "Cannot impute a column with no observed values".to_string(),
            ));
        }
        Ok(Self {
            mean: sum / count as f64,
        })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn transform(&self, column: &[Option<f64>]) -> Vec<f64> {
        column
            .iter()
            .map(|v| match v {
                Some(x) if x.is_finite() => *x,
                _ => self.mean,
            })
            .collect()
    }
}

/// Cleaning configuration.
#[derive(Debug, Clone)]
pub struct CleaningConfig {
    pub date_format: String,
    pub unknown_ticker: UnknownTickerPolicy,
    /// Accepted symbols after renaming; empty disables the unknown check.
    pub known_symbols: Vec<String>,
    /// Legacy mappings added to the fixed table.
    pub extra_mappings: BTreeMap<String, String>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            unknown_ticker: UnknownTickerPolicy::Warn,
            known_symbols: NIFTY50_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            extra_mappings: BTreeMap::new(),
        }
    }
}

/// Summary of a cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub rows: usize,
    /// Rows renamed per legacy ticker.
    pub renamed: BTreeMap<String, usize>,
    pub unknown_symbols: Vec<String>,
    pub imputed: usize,
    pub deliverable_mean: f64,
    pub categories: usize,
}

/// Output of the cleaner.
#[derive(Debug, Clone)]
pub struct CleanedTable {
    pub records: Vec<CleanedRecord>,
    pub encoding: SymbolEncoding,
    pub imputer: MeanImputer,
    pub report: CleaningReport,
}

/// Turns raw records into a cleaned table.
#[derive(Debug, Clone)]
pub struct Cleaner {
    config: CleaningConfig,
    tickers: TickerMap,
    known: HashSet<String>,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new(CleaningConfig::default())
    }
}

impl Cleaner {
    pub fn new(config: CleaningConfig) -> Self {
        let tickers = TickerMap::legacy().with_extra(config.extra_mappings.clone());
        let mut known: HashSet<String> = config.known_symbols.iter().cloned().collect();
        if !known.is_empty() {
            known.extend(config.extra_mappings.values().cloned());
        }
        Self {
            config,
            tickers,
            known,
        }
    }

    pub fn tickers(&self) -> &TickerMap {
        &self.tickers
    }

    /// Clean raw records.
    ///
    /// Fails on the first date that does not parse, and on unknown tickers
    /// when the policy is [`UnknownTickerPolicy::Error`].
    pub fn clean(&self, raw: &[RawRecord]) -> Result<CleanedTable> {
        if raw.is_empty() {
            return Err(PipelineError::NoData);
        }

        let mut report = CleaningReport {
            rows: raw.len(),
            ..Default::default()
        };
        let mut unknown = BTreeSet::new();
        let mut dates = Vec::with_capacity(raw.len());
        let mut symbols = Vec::with_capacity(raw.len());

        for (i, row) in raw.iter().enumerate() {
            let date = parse_date(&row.date, &self.config.date_format).map_err(|source| {
                PipelineError::DateParseError {
                    row: i + 1,
                    value: row.date.clone(),
                    source,
                }
            })?;
            dates.push(to_ordinal(date));

            let symbol = self.tickers.normalize(&row.symbol);
            if self.tickers.is_legacy(&row.symbol) {
                *report.renamed.entry(row.symbol.clone()).or_insert(0) += 1;
            }
            if !self.known.is_empty() && !self.known.contains(symbol) {
                match self.config.unknown_ticker {
                    UnknownTickerPolicy::Error => {
                        return Err(PipelineError::UnknownTicker(symbol.to_string()))
                    }
                    UnknownTickerPolicy::Warn => {
                        if unknown.insert(symbol.to_string()) {
                            warn!("Unknown ticker '{}' kept unchanged", symbol);
                        }
                    }
                    UnknownTickerPolicy::Ignore => {}
                }
            }
            symbols.push(symbol.to_string());
        }

        let deliverable: Vec<Option<f64>> = raw.iter().map(|r| r.pct_deliverable).collect();
        let imputer = MeanImputer::fit(&deliverable)?;
        let filled = imputer.transform(&deliverable);
        report.imputed = deliverable
            .iter()
            .filter(|v| !matches!(v, Some(x) if x.is_finite()))
            .count();
        report.deliverable_mean = imputer.mean();
        debug!(
            "Imputed {} %Deliverble values with mean {:.4}",
            report.imputed,
            imputer.mean()
        );

        let records: Vec<CleanedRecord> = raw
            .iter()
            .zip(dates)
            .zip(symbols.iter())
            .zip(filled)
            .map(|(((row, date), symbol), pct)| CleanedRecord {
                date,
                symbol: symbol.clone(),
                prev_close: row.prev_close,
                open: row.open,
                high: row.high,
                low: row.low,
                last: row.last,
                close: row.close,
                vwap: row.vwap,
                volume: row.volume,
                turnover: row.turnover,
                pct_deliverable: pct,
            })
            .collect();

        let encoding = SymbolEncoding::fit(&symbols);
        report.categories = encoding.categories.len();
        report.unknown_symbols = unknown.into_iter().collect();

        info!(
            "Cleaned {} rows: {} symbols, {} renamed, {} imputed",
            report.rows,
            report.categories,
            report.renamed.values().sum::<usize>(),
            report.imputed
        );

        Ok(CleanedTable {
            records,
            encoding,
            imputer,
            report,
        })
    }
}
