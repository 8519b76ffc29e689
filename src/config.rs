//! Configuration file support.
//!
//! A pipeline run can be described by a TOML file so the same analysis can be
//! repeated with identical settings.

use crate::arima::AutoArimaConfig;
use crate::clean::{CleaningConfig, UnknownTickerPolicy, NIFTY50_SYMBOLS};
use crate::data::{DataConfig, DEFAULT_DATE_FORMAT};
use crate::error::{PipelineError, Result};
use crate::fit::FitConfig;
use crate::forecast::{Forecaster, DEFAULT_ALPHA, DEFAULT_HORIZON};
use crate::order::OrderConfig;
use crate::pipeline::PipelineConfig;
use crate::types::ArimaOrder;
use crate::viz::FigureSizes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Complete pipeline configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineFileConfig {
    /// Input and output locations.
    #[serde(default)]
    pub data: DataSettings,
    /// Ticker normalization.
    #[serde(default)]
    pub cleaning: CleaningSettings,
    /// Figures and correlogram samples.
    #[serde(default)]
    pub plots: PlotSettings,
    /// Differencing and ARIMA fitting.
    #[serde(default)]
    pub model: ModelSettings,
    /// Out-of-sample forecasts.
    #[serde(default)]
    pub forecast: ForecastSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    /// Path to the raw CSV export.
    #[serde(default = "default_input")]
    pub input: String,
    /// Directory receiving `cleaned.csv` and the figures.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// CSV delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Date format of the `Date` column.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_input() -> String { "../NIFTY50_all.csv".to_string() }
fn default_output_dir() -> String { ".".to_string() }
fn default_delimiter() -> char { ',' }
fn default_date_format() -> String { DEFAULT_DATE_FORMAT.to_string() }

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            input: default_input(),
            output_dir: default_output_dir(),
            delimiter: ',',
            date_format: default_date_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningSettings {
    /// "warn", "error" or "ignore".
    #[serde(default = "default_unknown_ticker")]
    pub unknown_ticker: String,
    /// Accepted tickers; defaults to the NIFTY-50 constituents. An empty list
    /// disables the check.
    #[serde(default)]
    pub known_symbols: Option<Vec<String>>,
    /// Extra legacy ticker renames.
    #[serde(default)]
    pub extra_mappings: BTreeMap<String, String>,
}

fn default_unknown_ticker() -> String { "warn".to_string() }

impl Default for CleaningSettings {
    fn default() -> Self {
        Self {
            unknown_ticker: default_unknown_ticker(),
            known_symbols: None,
            extra_mappings: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotSettings {
    /// Also write SVG copies of every figure.
    #[serde(default)]
    pub svg: bool,
    /// Category index of the symbol in `p1`.
    #[serde(default)]
    pub sample_symbol: usize,
    #[serde(default = "default_pacf_start")]
    pub pacf_start: usize,
    #[serde(default = "default_acf_start")]
    pub acf_start: usize,
    /// Symbols per correlogram figure.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    /// Correlogram lags; unset picks `min(10·log10(n), n-1)`.
    #[serde(default)]
    pub max_lag: Option<usize>,
    #[serde(default = "default_overview_size")]
    pub overview_size: [u32; 2],
    #[serde(default = "default_correlogram_size")]
    pub correlogram_size: [u32; 2],
    #[serde(default = "default_grid_width")]
    pub grid_width: u32,
    #[serde(default = "default_grid_row_height")]
    pub grid_row_height: u32,
}

fn default_pacf_start() -> usize { 1 }
fn default_acf_start() -> usize { 5 }
fn default_sample_size() -> usize { 4 }
fn default_overview_size() -> [u32; 2] { [1500, 1500] }
fn default_correlogram_size() -> [u32; 2] { [1500, 500] }
fn default_grid_width() -> u32 { 1500 }
fn default_grid_row_height() -> u32 { 200 }

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            svg: false,
            sample_symbol: 0,
            pacf_start: 1,
            acf_start: 5,
            sample_size: 4,
            max_lag: None,
            overview_size: default_overview_size(),
            correlogram_size: default_correlogram_size(),
            grid_width: 1500,
            grid_row_height: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// `[p, d, q]` of the model with the MA term.
    #[serde(default = "default_with_ma")]
    pub with_ma: [usize; 3],
    /// `[p, d, q]` of the model without it.
    #[serde(default = "default_without_ma")]
    pub without_ma: [usize; 3],
    /// Replace `d` in both orders by the maximum `ndiffs` over all symbols.
    #[serde(default = "default_true")]
    pub uniform_d: bool,
    /// Abort on the first failed fit.
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_true")]
    pub show_progress: bool,
    /// ADF significance level for `ndiffs`.
    #[serde(default = "default_alpha")]
    pub adf_alpha: f64,
    #[serde(default = "default_max_d")]
    pub max_d: usize,
    /// Category indices that get the stepwise order search.
    #[serde(default = "default_auto_symbols")]
    pub auto_symbols: Vec<usize>,
    #[serde(default = "default_max_pq")]
    pub max_p: usize,
    #[serde(default = "default_max_pq")]
    pub max_q: usize,
}

fn default_with_ma() -> [usize; 3] { [1, 1, 1] }
fn default_without_ma() -> [usize; 3] { [1, 1, 0] }
fn default_true() -> bool { true }
fn default_alpha() -> f64 { DEFAULT_ALPHA }
fn default_max_d() -> usize { 2 }
fn default_auto_symbols() -> Vec<usize> { vec![0, 1, 7] }
fn default_max_pq() -> usize { 3 }

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            with_ma: default_with_ma(),
            without_ma: default_without_ma(),
            uniform_d: true,
            strict: false,
            show_progress: true,
            adf_alpha: DEFAULT_ALPHA,
            max_d: 2,
            auto_symbols: default_auto_symbols(),
            max_p: 3,
            max_q: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSettings {
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    /// Band covers `1 - alpha`.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

fn default_horizon() -> usize { DEFAULT_HORIZON }

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            alpha: DEFAULT_ALPHA,
        }
    }
}

fn check_alpha(name: &str, alpha: f64) -> Result<f64> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(alpha)
    } else {
        Err(PipelineError::ConfigError(format!(
            "{} must be in (0, 1), got {}",
            name, alpha
        )))
    }
}

impl PipelineFileConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path)?;
        let config: PipelineFileConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PipelineError::ConfigError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Convert to the runtime configuration, validating values on the way.
    pub fn to_pipeline_config(&self) -> Result<PipelineConfig> {
        if !self.data.delimiter.is_ascii() {
            return Err(PipelineError::ConfigError(format!(
                "Delimiter must be a single ASCII character, got '{}'",
                self.data.delimiter
            )));
        }
        if self.forecast.horizon == 0 {
            return Err(PipelineError::ConfigError(
                "Forecast horizon must be positive".to_string(),
            ));
        }
        if self.plots.sample_size == 0 {
            return Err(PipelineError::ConfigError(
                "Correlogram sample size must be positive".to_string(),
            ));
        }

        let adf_alpha = check_alpha("model.adf_alpha", self.model.adf_alpha)?;
        let forecast_alpha = check_alpha("forecast.alpha", self.forecast.alpha)?;

        let known_symbols = match &self.cleaning.known_symbols {
            Some(list) => list.clone(),
            None => NIFTY50_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        };

        let cleaning = CleaningConfig {
            date_format: self.data.date_format.clone(),
            unknown_ticker: self.cleaning.unknown_ticker.parse::<UnknownTickerPolicy>()?,
            known_symbols,
            extra_mappings: self.cleaning.extra_mappings.clone(),
        };

        let order = OrderConfig {
            alpha: adf_alpha,
            max_d: self.model.max_d,
            pacf_start: self.plots.pacf_start,
            acf_start: self.plots.acf_start,
            sample_size: self.plots.sample_size,
            max_lag: self.plots.max_lag,
            ..Default::default()
        };

        let fit = FitConfig {
            with_ma: ArimaOrder::from(self.model.with_ma),
            without_ma: ArimaOrder::from(self.model.without_ma),
            uniform_d: self.model.uniform_d,
            strict: self.model.strict,
            show_progress: self.model.show_progress,
            auto_symbols: self.model.auto_symbols.clone(),
            auto: AutoArimaConfig {
                max_p: self.model.max_p,
                max_q: self.model.max_q,
                max_d: self.model.max_d,
                alpha: adf_alpha,
                ..Default::default()
            },
        };

        let sizes = FigureSizes {
            overview: (self.plots.overview_size[0], self.plots.overview_size[1]),
            correlogram: (self.plots.correlogram_size[0], self.plots.correlogram_size[1]),
            grid_row_height: self.plots.grid_row_height,
            grid_width: self.plots.grid_width,
        };

        Ok(PipelineConfig {
            input: PathBuf::from(&self.data.input),
            output_dir: PathBuf::from(&self.data.output_dir),
            data: DataConfig {
                delimiter: self.data.delimiter as u8,
            },
            cleaning,
            order,
            fit,
            forecaster: Forecaster::new(self.forecast.horizon, forecast_alpha),
            sizes,
            svg: self.plots.svg,
            sample_symbol: self.plots.sample_symbol,
        })
    }

    /// Generate an example configuration file content.
    pub fn example() -> String {
        r#"# nifty-arima configuration file

[data]
input = "../NIFTY50_all.csv"
output_dir = "."
delimiter = ","
date_format = "%Y-%m-%d"

[cleaning]
unknown_ticker = "warn"     # warn, error or ignore
# known_symbols = ["ADANIPORTS", "AXISBANK"]   # default: NIFTY-50 constituents
# [cleaning.extra_mappings]
# OLDTICKER = "NEWTICKER"

[plots]
svg = false
sample_symbol = 0           # category index shown in p1
pacf_start = 1              # p2: symbols 1-4
acf_start = 5               # p3: symbols 5-8
sample_size = 4
# max_lag = 20
overview_size = [1500, 1500]
correlogram_size = [1500, 500]
grid_width = 1500
grid_row_height = 200

[model]
with_ma = [1, 1, 1]
without_ma = [1, 1, 0]
uniform_d = true            # d from the global ndiffs estimate
strict = false
show_progress = true
adf_alpha = 0.05
max_d = 2
auto_symbols = [0, 1, 7]
max_p = 3
max_q = 3

[forecast]
horizon = 200
alpha = 0.05                # 95% band
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = PipelineFileConfig::default();
        assert_eq!(config.data.input, "../NIFTY50_all.csv");
        assert_eq!(config.model.with_ma, [1, 1, 1]);
        assert_eq!(config.forecast.horizon, 200);
    }

    #[test]
    fn test_load_config() {
        let toml_content = r#"
[data]
input = "prices.csv"
output_dir = "out"
delimiter = ";"

[cleaning]
unknown_ticker = "error"
known_symbols = []

[cleaning.extra_mappings]
OLDCO = "NEWCO"

[model]
without_ma = [2, 1, 0]
uniform_d = false
strict = true

[forecast]
horizon = 30
alpha = 0.1
"#;
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", toml_content).unwrap();

        let config = PipelineFileConfig::load(file.path()).unwrap();
        assert_eq!(config.data.input, "prices.csv");
        assert_eq!(config.data.delimiter, ';');
        assert_eq!(config.plots.acf_start, 5);
        assert_eq!(config.model.with_ma, [1, 1, 1]);

        let runtime = config.to_pipeline_config().unwrap();
        assert_eq!(runtime.input, PathBuf::from("prices.csv"));
        assert_eq!(runtime.data.delimiter, b';');
        assert_eq!(runtime.cleaning.unknown_ticker, UnknownTickerPolicy::Error);
        assert!(runtime.cleaning.known_symbols.is_empty());
        assert_eq!(runtime.cleaning.extra_mappings["OLDCO"], "NEWCO");
        assert_eq!(runtime.fit.without_ma, ArimaOrder::new(2, 1, 0));
        assert!(runtime.fit.strict);
        assert!(!runtime.fit.uniform_d);
        assert_eq!(runtime.forecaster.horizon, 30);
        assert!((runtime.forecaster.alpha - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_default_known_symbols() {
        let runtime = PipelineFileConfig::default().to_pipeline_config().unwrap();
        assert_eq!(runtime.cleaning.known_symbols.len(), 50);
        assert_eq!(runtime.fit.auto_symbols, vec![0, 1, 7]);
        assert_eq!(runtime.sizes.correlogram, (1500, 500));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = PipelineFileConfig::default();
        config.forecast.alpha = 1.5;
        assert!(matches!(
            config.to_pipeline_config(),
            Err(PipelineError::ConfigError(_))
        ));

        let mut config = PipelineFileConfig::default();
        config.cleaning.unknown_ticker = "explode".to_string();
        assert!(config.to_pipeline_config().is_err());

        let mut config = PipelineFileConfig::default();
        config.data.delimiter = '¦';
        assert!(config.to_pipeline_config().is_err());

        let mut config = PipelineFileConfig::default();
        config.forecast.horizon = 0;
        assert!(config.to_pipeline_config().is_err());
    }

    #[test]
    fn test_example_parses() {
        let config: PipelineFileConfig = toml::from_str(&PipelineFileConfig::example()).unwrap();
        assert_eq!(config.model.auto_symbols, vec![0, 1, 7]);
        assert!(config.to_pipeline_config().is_ok());
    }

    #[test]
    fn test_save_and_reload() {
        let file = NamedTempFile::new().unwrap();
        let mut config = PipelineFileConfig::default();
        config.plots.svg = true;
        config.save(file.path()).unwrap();

        let loaded = PipelineFileConfig::load(file.path()).unwrap();
        assert!(loaded.plots.svg);
        assert_eq!(loaded.model.auto_symbols, config.model.auto_symbols);
    }
}
