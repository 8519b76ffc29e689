//! Command-line interface for the analysis pipeline.

use crate::arima::{auto_arima, ArimaModel, Candidate};
use crate::clean::Cleaner;
use crate::config::PipelineFileConfig;
use crate::data::{find_series, group_by_symbol, load_raw_csv};
use crate::error::Result;
use crate::fit::{AutoFit, ModelFitter};
use crate::order::{estimate_differencing, OrderSelection};
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::report::ReportFormatter;
use crate::types::{ArimaOrder, SymbolSeries};

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// nifty-arima - ARIMA modeling and forecasting of NIFTY-50 stock prices.
#[derive(Parser)]
#[command(name = "nifty-arima")]
#[command(version)]
#[command(about = "Clean NIFTY-50 daily data, select ARIMA orders, fit and forecast VWAP")]
#[command(long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the data comes from; command-line values override the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the raw CSV export
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the whole pipeline: clean, plot, select orders, fit and forecast
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Directory for cleaned.csv and the figures
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,

        /// Also write SVG figures
        #[arg(long)]
        svg: bool,

        /// Write the full report as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Clean the raw data and write cleaned.csv
    Clean {
        #[command(flatten)]
        source: SourceArgs,

        /// Directory for cleaned.csv
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,
    },

    /// Estimate the differencing order of every symbol
    Ndiffs {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Fit and compare the two candidate ARIMA orders for every symbol
    Fit {
        #[command(flatten)]
        source: SourceArgs,

        /// Abort on the first failed fit
        #[arg(long)]
        strict: bool,

        /// Order with the MA term, as p,d,q
        #[arg(long, value_parser = parse_order)]
        with_ma: Option<ArimaOrder>,

        /// Order without the MA term, as p,d,q
        #[arg(long, value_parser = parse_order)]
        without_ma: Option<ArimaOrder>,
    },

    /// Stepwise automatic order search for one symbol
    Auto {
        /// Symbol to search (canonical ticker)
        symbol: String,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Generate an example configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "nifty-arima.toml")]
        output: PathBuf,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Initialize logging based on verbosity level.
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}

impl SourceArgs {
    /// Build the runtime configuration from the optional file and overrides.
    pub fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineFileConfig::load(path)?.to_pipeline_config()?,
            None => PipelineFileConfig::default().to_pipeline_config()?,
        };
        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        Ok(config)
    }
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging();

    match &cli.command {
        Commands::Run {
            source,
            output_dir,
            svg,
            report,
        } => {
            let mut config = source.resolve()?;
            if let Some(dir) = output_dir {
                config.output_dir = dir.clone();
            }
            config.svg |= *svg;
            run_pipeline(config, report.as_ref(), cli.output)
        }

        Commands::Clean { source, output_dir } => {
            let mut config = source.resolve()?;
            if let Some(dir) = output_dir {
                config.output_dir = dir.clone();
            }
            clean_data(config, cli.output)
        }

        Commands::Ndiffs { source } => differencing(&source.resolve()?, cli.output),

        Commands::Fit {
            source,
            strict,
            with_ma,
            without_ma,
        } => {
            let mut config = source.resolve()?;
            config.fit.strict |= *strict;
            if let Some(order) = with_ma {
                config.fit.with_ma = *order;
            }
            if let Some(order) = without_ma {
                config.fit.without_ma = *order;
            }
            fit_models(&config, cli.output)
        }

        Commands::Auto { symbol, source } => auto_search(symbol, &source.resolve()?, cli.output),

        Commands::Init { output } => init_config(output),
    }
}

/// Load and clean the raw data in memory.
fn load_series(config: &PipelineConfig) -> Result<Vec<SymbolSeries>> {
    info!("Loading data from: {}", config.input.display());
    let raw = load_raw_csv(&config.input, &config.data)?;
    let table = Cleaner::new(config.cleaning.clone()).clean(&raw)?;
    Ok(group_by_symbol(&table.records))
}

fn run_pipeline(config: PipelineConfig, report_path: Option<&PathBuf>, output: OutputFormat) -> Result<()> {
    let report = Pipeline::new(config).run()?;

    if let Some(path) = report_path {
        ReportFormatter::write_json(path, &report)?;
        info!("Saved report to {}", path.display());
    }

    match output {
        OutputFormat::Text => ReportFormatter::print_report(&report),
        OutputFormat::Json => println!("{}", ReportFormatter::to_json(&report)),
    }
    Ok(())
}

fn clean_data(config: PipelineConfig, output: OutputFormat) -> Result<()> {
    fs::create_dir_all(&config.output_dir)?;
    let pipeline = Pipeline::new(config);
    let raw = pipeline.load()?;
    let (table, path) = pipeline.clean(&raw)?;

    match output {
        OutputFormat::Text => {
            ReportFormatter::print_cleaning(&table.report);
            println!("Saved: {}", path.display());
        }
        OutputFormat::Json => println!("{}", ReportFormatter::to_json(&table.report)),
    }
    Ok(())
}

fn differencing(config: &PipelineConfig, output: OutputFormat) -> Result<()> {
    let series = load_series(config)?;
    let estimates = estimate_differencing(&series, &config.order)?;
    let global_d = estimates.iter().map(|e| e.d).max().unwrap_or(0);

    match output {
        OutputFormat::Text => {
            let selection = OrderSelection {
                estimates,
                global_d,
                pacf: Vec::new(),
                acf: Vec::new(),
            };
            ReportFormatter::print_orders(&selection, config.order.alpha);
        }
        OutputFormat::Json => println!(
            "{}",
            ReportFormatter::to_json(&serde_json::json!({
                "estimates": estimates,
                "global_d": global_d,
            }))
        ),
    }
    Ok(())
}

fn fit_models(config: &PipelineConfig, output: OutputFormat) -> Result<()> {
    let series = load_series(config)?;
    let report = ModelFitter::new(config.fit.clone()).fit_all(&series)?;

    match output {
        OutputFormat::Text => ReportFormatter::print_fits(&report),
        OutputFormat::Json => println!("{}", ReportFormatter::to_json(&report)),
    }
    Ok(())
}

fn auto_search(symbol: &str, config: &PipelineConfig, output: OutputFormat) -> Result<()> {
    let series = load_series(config)?;
    let target = find_series(&series, symbol)?;
    let result = auto_arima(&target.vwap(), &config.fit.auto).map_err(|e| e.for_symbol(symbol))?;
    let auto = AutoFit {
        symbol: symbol.to_string(),
        result,
    };

    match output {
        OutputFormat::Text => {
            ReportFormatter::print_auto_fits(std::slice::from_ref(&auto));
            println!("{}", auto.result.model.summary());
            print_candidates(&auto.result.model, &auto.result.candidates);
        }
        OutputFormat::Json => println!("{}", ReportFormatter::to_json(&auto)),
    }
    Ok(())
}

fn print_candidates(selected: &ArimaModel, candidates: &[Candidate]) {
    println!("Orders tried:");
    for c in candidates {
        let marker = if c.order == selected.order { "*" } else { " " };
        match c.aic {
            Some(aic) => println!("  {} {:<16} AIC {:.2}", marker, c.order, aic),
            None => println!("  {} {:<16} failed", marker, c.order),
        }
    }
}

fn init_config(output: &PathBuf) -> Result<()> {
    let example = PipelineFileConfig::example();
    fs::write(output, example)?;
    println!("Created example configuration file: {}", output.display());
    println!("\nEdit this file to customize the analysis, then run:");
    println!("  nifty-arima run -c {}", output.display());
    Ok(())
}

/// Parse an order given as `p,d,q`.
pub fn parse_order(s: &str) -> std::result::Result<ArimaOrder, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected p,d,q, got '{}'", s));
    }
    let mut values = [0usize; 3];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{}' is not a non-negative integer", part))?;
    }
    Ok(ArimaOrder::from(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::try_parse_from([
            "nifty-arima",
            "-vv",
            "run",
            "-c",
            "nifty-arima.toml",
            "-d",
            "out",
            "--svg",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run {
                source,
                output_dir,
                svg,
                report,
            } => {
                assert_eq!(source.config, Some(PathBuf::from("nifty-arima.toml")));
                assert_eq!(output_dir, Some(PathBuf::from("out")));
                assert!(svg);
                assert!(report.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_auto_command() {
        let cli = Cli::try_parse_from(["nifty-arima", "-o", "json", "auto", "TCS", "-i", "data.csv"])
            .unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Auto { symbol, source } => {
                assert_eq!(symbol, "TCS");
                assert_eq!(source.input, Some(PathBuf::from("data.csv")));
            }
            _ => panic!("expected auto"),
        }
    }

    #[test]
    fn test_simple_commands() {
        assert!(Cli::try_parse_from(["nifty-arima", "init"]).is_ok());
        assert!(Cli::try_parse_from(["nifty-arima", "ndiffs"]).is_ok());
        assert!(Cli::try_parse_from(["nifty-arima", "fit", "--strict"]).is_ok());
        assert!(Cli::try_parse_from(["nifty-arima", "fit", "--with-ma", "2,1,2"]).is_ok());
        assert!(Cli::try_parse_from(["nifty-arima", "fit", "--with-ma", "2,1"]).is_err());
        assert!(Cli::try_parse_from(["nifty-arima", "auto"]).is_err());
        assert!(Cli::try_parse_from(["nifty-arima", "-o", "csv", "run"]).is_err());
    }

    #[test]
    fn test_source_overrides_input() {
        let source = SourceArgs {
            config: None,
            input: Some(PathBuf::from("other.csv")),
        };
        let config = source.resolve().unwrap();
        assert_eq!(config.input, PathBuf::from("other.csv"));
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_parse_order() {
        assert_eq!(parse_order("2, 1, 0").unwrap(), ArimaOrder::new(2, 1, 0));
        assert!(parse_order("1,1").is_err());
        assert!(parse_order("1,x,1").is_err());
    }
}
