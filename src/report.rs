//! Terminal and JSON reporting of pipeline results.

use crate::clean::CleaningReport;
use crate::error::Result;
use crate::fit::{AutoFit, FitReport};
use crate::order::OrderSelection;
use crate::pipeline::{ForecastSummary, PipelineReport};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tabled::{builder::Builder, settings::Style};

fn heading(title: &str) {
    println!();
    println!("{}", "═".repeat(60).blue());
    println!("{}", format!(" {} ", title).bold().blue());
    println!("{}", "═".repeat(60).blue());
    println!();
}

fn format_p_value(p: f64, alpha: f64) -> String {
    if p <= alpha {
        format!("{:.4}", p).green().to_string()
    } else {
        format!("{:.4}", p).red().to_string()
    }
}

/// Format results for terminal display.
pub struct ReportFormatter;

impl ReportFormatter {
    /// Print every section of a pipeline run.
    pub fn print_report(report: &PipelineReport) {
        heading("NIFTY-50 ARIMA ANALYSIS");
        println!("  Input:           {}", report.input.display());
        Self::print_cleaning(&report.cleaning);
        Self::print_orders(&report.orders, 0.05);
        Self::print_fits(&report.fits);
        Self::print_forecasts(&report.forecasts);

        println!("{}", "Outputs".bold().underline());
        for path in &report.outputs {
            println!("  {}", path.display());
        }
        println!();
        println!("{}", "═".repeat(60).blue());
    }

    pub fn print_cleaning(report: &CleaningReport) {
        println!("{}", "Cleaning".bold().underline());
        println!("  Rows:            {:>10}", report.rows);
        println!("  Symbols:         {:>10}", report.categories);
        println!(
            "  Imputed %Deliv.: {:>10}  (mean {:.4})",
            report.imputed, report.deliverable_mean
        );
        for (legacy, count) in &report.renamed {
            println!("  Renamed {:<12} {:>6} rows", legacy, count);
        }
        if !report.unknown_symbols.is_empty() {
            println!(
                "  {} {}",
                "Unknown tickers:".yellow(),
                report.unknown_symbols.join(", ")
            );
        }
        println!();
    }

    /// Per-symbol differencing estimates; p-values at or below `alpha` are green.
    pub fn print_orders(selection: &OrderSelection, alpha: f64) {
        println!("{}", "Differencing".bold().underline());
        let mut builder = Builder::new();
        builder.push_record(["Symbol", "d", "ADF stat", "p-value", "Lags"]);

        for est in &selection.estimates {
            let (stat, p, lags) = match &est.adf {
                Some(adf) => (
                    format!("{:.3}", adf.statistic),
                    format_p_value(adf.p_value, alpha),
                    adf.lags.to_string(),
                ),
                None => ("-".to_string(), "-".to_string(), "-".to_string()),
            };
            builder.push_record([est.symbol.clone(), est.d.to_string(), stat, p, lags]);
        }

        let table = builder.build().with(Style::rounded()).to_string();
        println!("{}", table);
        println!("  Global differencing order: {}", selection.global_d);

        for c in selection.pacf.iter().chain(&selection.acf) {
            let lags = c.significant_lags();
            if !lags.is_empty() {
                println!(
                    "  {} {}: significant lags {:?}",
                    c.kind.label(),
                    c.symbol,
                    lags
                );
            }
        }
        println!();
    }

    /// AIC table of both candidate orders per symbol.
    pub fn print_fits(report: &FitReport) {
        println!("{}", "Model Comparison".bold().underline());
        let (with_label, without_label) = match report.fits.first() {
            Some(f) => (f.with_ma.order.to_string(), f.without_ma.order.to_string()),
            None => ("with MA".to_string(), "without MA".to_string()),
        };

        let mut builder = Builder::new();
        builder.push_record([
            "Symbol".to_string(),
            format!("AIC {}", with_label),
            format!("AIC {}", without_label),
            "MA improves".to_string(),
        ]);
        for fit in &report.fits {
            let improves = if fit.ma_improves() {
                "yes".green().to_string()
            } else {
                "no".to_string()
            };
            builder.push_record([
                fit.symbol.clone(),
                format!("{:.2}", fit.with_ma.aic),
                format!("{:.2}", fit.without_ma.aic),
                improves,
            ]);
        }
        let table = builder.build().with(Style::rounded()).to_string();
        println!("{}", table);
        println!(
            "  MA term improved AIC for {} of {} symbols",
            report.ma_improved_count(),
            report.fits.len()
        );

        for failure in &report.failures {
            println!("  {} {}: {}", "Failed".red(), failure.symbol, failure.reason);
        }
        println!();

        if !report.auto_fits.is_empty() {
            Self::print_auto_fits(&report.auto_fits);
        }
    }

    pub fn print_auto_fits(fits: &[AutoFit]) {
        println!("{}", "Automatic Order Search".bold().underline());
        let mut builder = Builder::new();
        builder.push_record(["Symbol", "d (ADF)", "Selected", "AIC", "Tried"]);
        for auto in fits {
            builder.push_record([
                auto.symbol.clone(),
                auto.result.d_estimate.to_string(),
                auto.result.model.order.to_string(),
                format!("{:.2}", auto.result.model.aic),
                auto.result.candidates.len().to_string(),
            ]);
        }
        let table = builder.build().with(Style::rounded()).to_string();
        println!("{}", table);
        println!();
    }

    pub fn print_forecasts(forecasts: &[ForecastSummary]) {
        println!("{}", "Forecasts".bold().underline());
        let mut builder = Builder::new();
        builder.push_record(["Symbol", "Order", "Last", "Final", "Band", "RMSE", "Trend"]);
        for fc in forecasts {
            builder.push_record([
                fc.symbol.clone(),
                fc.order.to_string(),
                format!("{:.2}", fc.last_observed),
                format!("{:.2}", fc.final_mean),
                format!("[{:.2}, {:.2}]", fc.final_lower, fc.final_upper),
                format!("{:.3}", fc.in_sample_rmse),
                fc.trend.clone(),
            ]);
        }
        let table = builder.build().with(Style::rounded()).to_string();
        println!("{}", table);
        println!();
    }

    /// Export any serializable result to pretty JSON.
    pub fn to_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Write a serializable result as pretty JSON.
    pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(value)?;
        fs::write(path, content)?;
        Ok(())
    }
}
