//! Per-symbol ARIMA fitting and model comparison.

use crate::arima::{auto_arima, ArimaModel, AutoArimaConfig, AutoArimaResult, FitOptions};
use crate::error::{PipelineError, Result};
use crate::types::{ArimaOrder, SymbolSeries};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Configuration for the model fitter.
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// Order with the moving-average term.
    pub with_ma: ArimaOrder,
    /// Order without it.
    pub without_ma: ArimaOrder,
    /// Fit both orders with the global differencing order of the run.
    pub uniform_d: bool,
    /// Abort on the first failed fit instead of recording it.
    pub strict: bool,
    /// Show progress bar while fitting.
    pub show_progress: bool,
    /// Category indices that get an automatic order search.
    pub auto_symbols: Vec<usize>,
    pub auto: AutoArimaConfig,
}

impl FitConfig {
    /// Replace `d` in both candidate orders.
    pub fn with_differencing(mut self, d: usize) -> Self {
        self.with_ma.d = d;
        self.without_ma.d = d;
        self
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            with_ma: ArimaOrder::new(1, 1, 1),
            without_ma: ArimaOrder::new(1, 1, 0),
            uniform_d: true,
            strict: false,
            show_progress: false,
            auto_symbols: vec![0, 1, 7],
            auto: AutoArimaConfig::default(),
        }
    }
}

/// Both candidate models for one symbol.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolFit {
    pub symbol: String,
    pub with_ma: ArimaModel,
    pub without_ma: ArimaModel,
}

impl SymbolFit {
    /// True when adding the MA term lowers the AIC.
    pub fn ma_improves(&self) -> bool {
        self.without_ma.aic > self.with_ma.aic
    }

    /// The lower-AIC model.
    pub fn preferred(&self) -> &ArimaModel {
        if self.ma_improves() {
            &self.with_ma
        } else {
            &self.without_ma
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitFailure {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoFit {
    pub symbol: String,
    #[serde(flatten)]
    pub result: AutoArimaResult,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FitReport {
    pub fits: Vec<SymbolFit>,
    pub failures: Vec<FitFailure>,
    pub auto_fits: Vec<AutoFit>,
}

impl FitReport {
    /// Number of symbols where the MA term improved the fit.
    pub fn ma_improved_count(&self) -> usize {
        self.fits.iter().filter(|f| f.ma_improves()).count()
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolFit> {
        self.fits.iter().find(|f| f.symbol == symbol)
    }
}

fn failure_reason(err: &PipelineError) -> String {
    match err {
        PipelineError::ModelFit { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}

pub struct ModelFitter {
    config: FitConfig,
}

impl ModelFitter {
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Fit both candidate orders on a symbol's VWAP.
    pub fn fit_symbol(&self, series: &SymbolSeries) -> Result<SymbolFit> {
        let vwap = series.vwap();
        let (with_ma, without_ma) = (self.config.with_ma, self.config.without_ma);
        let options = FitOptions {
            condition: with_ma.p.max(without_ma.p),
            ..Default::default()
        };
        let with_ma = ArimaModel::fit_with(&vwap, with_ma, &options)
            .map_err(|e| e.for_symbol(&series.symbol))?;
        let without_ma = ArimaModel::fit_with(&vwap, without_ma, &options)
            .map_err(|e| e.for_symbol(&series.symbol))?;

        debug!(
            "{}: AIC {} = {:.3}, {} = {:.3}",
            series.symbol, with_ma.order, with_ma.aic, without_ma.order, without_ma.aic
        );

        Ok(SymbolFit {
            symbol: series.symbol.clone(),
            with_ma,
            without_ma,
        })
    }

    fn progress(&self, len: usize) -> Option<ProgressBar> {
        if !self.config.show_progress {
            return None;
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(pb)
    }

    /// Fit every symbol. Failures are recorded unless `strict` is set.
    pub fn fit_all(&self, series: &[SymbolSeries]) -> Result<FitReport> {
        let progress = self.progress(series.len());
        let mut report = FitReport::default();

        for s in series {
            if let Some(ref pb) = progress {
                pb.set_message(s.symbol.clone());
            }
            match self.fit_symbol(s) {
                Ok(fit) => report.fits.push(fit),
                Err(e) if self.config.strict => return Err(e),
                Err(e) => {
                    warn!("Skipping {}: {}", s.symbol, e);
                    report.failures.push(FitFailure {
                        symbol: s.symbol.clone(),
                        reason: failure_reason(&e),
                    });
                }
            }
            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Fitting complete");
        }

        info!(
            "Fitted {} symbols ({} failed); MA term improved AIC for {}",
            report.fits.len(),
            report.failures.len(),
            report.ma_improved_count()
        );
        report.auto_fits = self.auto_fit(series, &mut report.failures)?;
        Ok(report)
    }

    /// Run the stepwise search for the configured category indices.
    fn auto_fit(&self, series: &[SymbolSeries], failures: &mut Vec<FitFailure>) -> Result<Vec<AutoFit>> {
        let mut fits = Vec::new();
        for &idx in &self.config.auto_symbols {
            let s = series.get(idx).ok_or(PipelineError::InsufficientSymbols {
                needed: idx + 1,
                available: series.len(),
            })?;

            match auto_arima(&s.vwap(), &self.config.auto) {
                Ok(result) => {
                    info!(
                        "{}: auto search selected {} (AIC {:.3})",
                        s.symbol, result.model.order, result.model.aic
                    );
                    fits.push(AutoFit {
                        symbol: s.symbol.clone(),
                        result,
                    });
                }
                Err(e) => {
                    let e = e.for_symbol(&s.symbol);
                    if self.config.strict {
                        return Err(e);
                    }
                    warn!("Auto search failed for {}: {}", s.symbol, e);
                    failures.push(FitFailure {
                        symbol: s.symbol.clone(),
                        reason: failure_reason(&e),
                    });
                }
            }
        }
        Ok(fits)
    }
}

impl Default for ModelFitter {
    fn default() -> Self {
        Self::new(FitConfig::default())
    }
}
