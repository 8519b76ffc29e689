//! End-to-end analysis: load, clean, visualize, select orders, fit, forecast.

use crate::clean::{CleanedTable, Cleaner, CleaningConfig, CleaningReport};
use crate::data::{group_by_symbol, load_raw_csv, write_cleaned_csv, DataConfig};
use crate::error::{PipelineError, Result};
use crate::fit::{FitConfig, FitReport, ModelFitter};
use crate::forecast::{Forecaster, SymbolForecast};
use crate::order::{select_orders, OrderConfig, OrderSelection};
use crate::types::{ArimaOrder, RawRecord, SymbolSeries};
use crate::viz::{
    correlogram_figure, forecast_figure, in_sample_figure, series_overview, sparkline,
    FigureSizes, FigureWriter,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

pub const CLEANED_FILE: &str = "cleaned.csv";

/// Width of the terminal trend line in forecast summaries.
const TREND_WIDTH: usize = 30;

/// Runtime configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub data: DataConfig,
    pub cleaning: CleaningConfig,
    pub order: OrderConfig,
    pub fit: FitConfig,
    pub forecaster: Forecaster,
    pub sizes: FigureSizes,
    /// Also write SVG versions of the figures.
    pub svg: bool,
    /// Category index of the symbol shown in the overview figure.
    pub sample_symbol: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("../NIFTY50_all.csv"),
            output_dir: PathBuf::from("."),
            data: DataConfig::default(),
            cleaning: CleaningConfig::default(),
            order: OrderConfig::default(),
            fit: FitConfig::default(),
            forecaster: Forecaster::default(),
            sizes: FigureSizes::default(),
            svg: false,
            sample_symbol: 0,
        }
    }
}

/// Forecast endpoints for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub symbol: String,
    pub order: ArimaOrder,
    pub last_observed: f64,
    pub final_mean: f64,
    pub final_lower: f64,
    pub final_upper: f64,
    pub in_sample_rmse: f64,
    /// Sparkline of the history followed by the forecast mean.
    #[serde(skip)]
    pub trend: String,
}

impl From<&SymbolForecast> for ForecastSummary {
    fn from(fc: &SymbolForecast) -> Self {
        let last = |v: &[f64]| v.last().copied().unwrap_or(f64::NAN);
        Self {
            symbol: fc.symbol.clone(),
            order: fc.order,
            last_observed: last(&fc.in_sample.actual),
            final_mean: last(&fc.forecast.mean),
            final_lower: last(&fc.forecast.lower),
            final_upper: last(&fc.forecast.upper),
            in_sample_rmse: fc.in_sample.rmse(),
            trend: sparkline(
                &[fc.in_sample.actual.as_slice(), fc.forecast.mean.as_slice()].concat(),
                TREND_WIDTH,
            ),
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub input: PathBuf,
    pub cleaning: CleaningReport,
    pub orders: OrderSelection,
    pub fits: FitReport,
    pub forecasts: Vec<ForecastSummary>,
    pub outputs: Vec<PathBuf>,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn writer(&self) -> FigureWriter {
        FigureWriter::new(&self.config.output_dir, self.config.svg)
    }

    pub fn load(&self) -> Result<Vec<RawRecord>> {
        load_raw_csv(&self.config.input, &self.config.data)
    }

    /// Clean raw records and write `cleaned.csv`.
    pub fn clean(&self, raw: &[RawRecord]) -> Result<(CleanedTable, PathBuf)> {
        let table = Cleaner::new(self.config.cleaning.clone()).clean(raw)?;
        let path = self.config.output_dir.join(CLEANED_FILE);
        write_cleaned_csv(&path, &table.records)?;
        info!("Wrote {} rows to {}", table.records.len(), path.display());
        Ok((table, path))
    }

    /// Overview figure of the sample symbol (`p1`).
    pub fn plot_overview(&self, series: &[SymbolSeries]) -> Result<Vec<PathBuf>> {
        let idx = self.config.sample_symbol;
        let sample = series.get(idx).ok_or(PipelineError::InsufficientSymbols {
            needed: idx + 1,
            available: series.len(),
        })?;
        self.writer()
            .write("p1", &series_overview(sample, &self.config.sizes))
    }

    /// Correlogram figures (`p2`, `p3`).
    pub fn plot_correlograms(&self, orders: &OrderSelection) -> Result<Vec<PathBuf>> {
        let writer = self.writer();
        let mut written = writer.write("p2", &correlogram_figure(&orders.pacf, &self.config.sizes))?;
        written.extend(writer.write("p3", &correlogram_figure(&orders.acf, &self.config.sizes))?);
        Ok(written)
    }

    /// Diagnostic and forecast figures (`p4`, `p5`).
    pub fn plot_forecasts(&self, forecasts: &[SymbolForecast]) -> Result<Vec<PathBuf>> {
        let writer = self.writer();
        let mut written = writer.write("p4", &in_sample_figure(forecasts, &self.config.sizes))?;
        written.extend(writer.write("p5", &forecast_figure(forecasts, &self.config.sizes))?);
        Ok(written)
    }

    /// Fit the candidate orders, using the global `d` when `uniform_d` is set.
    pub fn fit(&self, series: &[SymbolSeries], orders: &OrderSelection) -> Result<FitReport> {
        let mut config = self.config.fit.clone();
        if config.uniform_d {
            info!("Fitting every symbol with d = {}", orders.global_d);
            config = config.with_differencing(orders.global_d);
        }
        ModelFitter::new(config).fit_all(series)
    }

    pub fn run(&self) -> Result<PipelineReport> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let raw = self.load()?;
        info!("Loaded {} rows from {}", raw.len(), self.config.input.display());

        let (table, cleaned_path) = self.clean(&raw)?;
        let mut outputs = vec![cleaned_path];
        let series = group_by_symbol(&table.records);

        outputs.extend(self.plot_overview(&series)?);

        let orders = select_orders(&series, &self.config.order)?;
        outputs.extend(self.plot_correlograms(&orders)?);

        let fits = self.fit(&series, &orders)?;
        let forecasts = self.config.forecaster.forecast_all(&fits);
        outputs.extend(self.plot_forecasts(&forecasts)?);

        Ok(PipelineReport {
            input: self.config.input.clone(),
            cleaning: table.report,
            orders,
            fits,
            forecasts: forecasts.iter().map(ForecastSummary::from).collect(),
            outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::estimate_differencing;
    use crate::stats::testing::{random_walk, series_from};
    use tempfile::TempDir;

    const HEADER: &str = "Date,Symbol,Series,Prev Close,Open,High,Low,Last,Close,VWAP,Volume,Turnover,Trades,Deliverable Volume,%Deliverble";

    #[test]
    fn test_too_few_symbols_for_overview() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig {
            output_dir: dir.path().to_path_buf(),
            sample_symbol: 3,
            ..Default::default()
        };
        let err = Pipeline::new(config).plot_overview(&[]).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientSymbols { needed: 4, available: 0 }));
    }

    fn orders_for(series: &[SymbolSeries]) -> OrderSelection {
        let estimates = estimate_differencing(series, &OrderConfig::default()).unwrap();
        OrderSelection {
            global_d: estimates.iter().map(|e| e.d).max().unwrap(),
            estimates,
            pacf: Vec::new(),
            acf: Vec::new(),
        }
    }

    #[test]
    fn test_global_d_applies_to_every_symbol() {
        let mut level = 1000.0;
        let twice_integrated: Vec<f64> = random_walk(200, 0.0, 4)
            .into_iter()
            .map(|v| {
                level += v;
                level
            })
            .collect();
        let series = vec![
            series_from("WALK", &random_walk(200, 100.0, 3)),
            series_from("DRIFT", &twice_integrated),
        ];
        let orders = orders_for(&series);
        let d: Vec<usize> = orders.estimates.iter().map(|e| e.d).collect();
        assert_eq!(d, vec![1, 2]);
        assert_eq!(orders.global_d, 2);

        let fit = FitConfig {
            auto_symbols: Vec::new(),
            ..Default::default()
        };
        let pipeline = Pipeline::new(PipelineConfig {
            fit: fit.clone(),
            ..Default::default()
        });
        let report = pipeline.fit(&series, &orders).unwrap();
        assert_eq!(report.fits.len(), 2);
        for f in &report.fits {
            assert_eq!(f.with_ma.order, ArimaOrder::new(1, 2, 1));
            assert_eq!(f.without_ma.order, ArimaOrder::new(1, 2, 0));
        }

        let pipeline = Pipeline::new(PipelineConfig {
            fit: FitConfig {
                uniform_d: false,
                ..fit
            },
            ..Default::default()
        });
        let report = pipeline.fit(&series, &orders).unwrap();
        assert_eq!(report.fits.len(), 2);
        assert!(report.fits.iter().all(|f| f.with_ma.order.d == 1));
    }

    #[test]
    fn test_clean_writes_csv() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        let mut content = String::from(HEADER);
        for (i, v) in random_walk(5, 100.0, 1).iter().enumerate() {
            content.push_str(&format!(
                "\n2020-01-0{},UTIBANK,EQ,{v},{v},{v},{v},{v},{v},{v},100,{},,,0.4",
                i + 1,
                v * 100.0
            ));
        }
        std::fs::write(&input, content).unwrap();

        let pipeline = Pipeline::new(PipelineConfig {
            input,
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        });
        let raw = pipeline.load().unwrap();
        let (table, path) = pipeline.clean(&raw).unwrap();
        assert_eq!(path, dir.path().join(CLEANED_FILE));
        assert!(path.exists());
        assert!(table.records.iter().all(|r| r.symbol == "AXISBANK"));
    }
}
