//! nifty-arima - ARIMA modeling and forecasting of NIFTY-50 daily prices.
//!
//! # Overview
//!
//! The crate takes the NSE daily export of the NIFTY-50 constituents and runs
//! a batch time-series analysis over every symbol's volume-weighted average
//! price:
//!
//! - **Cleaning**: legacy tickers renamed, dates converted to ordinal day
//!   numbers, missing `%Deliverble` values mean-imputed, written to `cleaned.csv`
//! - **Order selection**: ADF-based differencing estimates per symbol, ACF and
//!   PACF correlograms of the differenced series
//! - **Fitting**: ARIMA(1,1,1) against ARIMA(1,1,0) by AIC, plus a stepwise
//!   automatic order search for selected symbols
//! - **Forecasting**: in-sample one-step predictions and long-horizon forecasts
//!   with confidence bands
//! - **Figures**: PNG (and optional SVG) charts rendered in-crate
//!
//! # Quick Start
//!
//! ```no_run
//! use nifty_arima::pipeline::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig {
//!     input: "NIFTY50_all.csv".into(),
//!     output_dir: "out".into(),
//!     ..Default::default()
//! };
//! let report = Pipeline::new(config).run().unwrap();
//! println!("Global d = {}", report.orders.global_d);
//! println!("MA improved {} fits", report.fits.ma_improved_count());
//! ```
//!
//! # Fitting a Single Series
//!
//! ```
//! use nifty_arima::arima::ArimaModel;
//! use nifty_arima::types::ArimaOrder;
//!
//! let data: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 + (i as f64 * 0.7).sin()).collect();
//! let model = ArimaModel::fit(&data, ArimaOrder::new(1, 1, 0)).unwrap();
//! let forecast = model.forecast(10, 0.05);
//! assert_eq!(forecast.horizon(), 10);
//! ```
//!
//! # Modules
//!
//! - [`types`]: Raw and cleaned records, per-symbol series, ARIMA orders
//! - [`data`]: CSV loading and writing, ordinal dates, grouping by symbol
//! - [`clean`]: Ticker normalization, categorical encoding, mean imputation
//! - [`stats`]: Small numeric helpers (differencing, OLS)
//! - [`stationarity`]: Augmented Dickey-Fuller test and `ndiffs`
//! - [`autocorrelation`]: ACF, PACF, confidence bands, Ljung-Box
//! - [`optim`]: Nelder-Mead minimizer
//! - [`arima`]: CSS estimation, forecasting, stepwise order search
//! - [`order`]: Differencing orders and correlogram samples across symbols
//! - [`fit`]: Per-symbol model comparison
//! - [`forecast`]: In-sample diagnostics and out-of-sample forecasts
//! - [`chart`], [`font`], [`viz`]: Figure rendering
//! - [`pipeline`]: End-to-end orchestration
//! - [`config`]: TOML configuration file support
//! - [`report`]: Terminal and JSON reports

pub mod arima;
pub mod autocorrelation;
pub mod chart;
pub mod clean;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod fit;
pub mod font;
pub mod forecast;
pub mod optim;
pub mod order;
pub mod pipeline;
pub mod report;
pub mod stationarity;
pub mod stats;
pub mod types;
pub mod viz;

// Re-exports for convenience
pub use arima::{auto_arima, ArimaModel, AutoArimaConfig, AutoArimaResult, Forecast};
pub use clean::{CleanedTable, Cleaner, CleaningConfig, CleaningReport, UnknownTickerPolicy};
pub use config::PipelineFileConfig;
pub use error::{PipelineError, Result};
pub use fit::{FitConfig, FitReport, ModelFitter, SymbolFit};
pub use forecast::{Forecaster, SymbolForecast};
pub use pipeline::{Pipeline, PipelineConfig, PipelineReport};
pub use report::ReportFormatter;
pub use types::{ArimaOrder, CleanedRecord, RawRecord, SymbolSeries};

// Data handling re-exports
pub use data::{
    from_ordinal, group_by_symbol, load_cleaned_csv, load_raw_csv, to_ordinal, write_cleaned_csv,
    DataConfig,
};

// Diagnostics
pub use autocorrelation::{acf, ljung_box, pacf, Correlogram, CorrelogramKind};
pub use stationarity::{adf_test, ndiffs, AdfResult};
