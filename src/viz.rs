//! Figures produced by the pipeline, plus terminal sparklines.
//!
//! - `p1`: VWAP, volume and turnover of a sample symbol
//! - `p2`/`p3`: PACF and ACF of the differenced VWAP for symbol samples
//! - `p4`: one-step-ahead in-sample predictions against observed VWAP
//! - `p5`: history followed by the forecast and its confidence band

use crate::autocorrelation::Correlogram;
use crate::chart::{Figure, Layer, Panel, BLUE, GREY, ORANGE, RED};
use crate::error::Result;
use crate::forecast::SymbolForecast;
use crate::types::SymbolSeries;
use std::path::{Path, PathBuf};
use tracing::info;

/// Characters used for sparkline rendering, ordered from low to high.
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Panels per row in the per-symbol grids.
pub const GRID_COLUMNS: usize = 5;

/// Pixel sizes of the generated figures.
#[derive(Debug, Clone)]
pub struct FigureSizes {
    pub overview: (u32, u32),
    pub correlogram: (u32, u32),
    /// Height of one row in the per-symbol grids.
    pub grid_row_height: u32,
    pub grid_width: u32,
}

impl Default for FigureSizes {
    fn default() -> Self {
        Self {
            overview: (1500, 1500),
            correlogram: (1500, 500),
            grid_row_height: 200,
            grid_width: 1500,
        }
    }
}

/// Three stacked panels: VWAP, volume and turnover against the date ordinal.
pub fn series_overview(series: &SymbolSeries, sizes: &FigureSizes) -> Figure {
    let (w, h) = sizes.overview;
    let dates = series.dates();
    let mut fig = Figure::new(3, 1, w, h);

    fig.push(
        Panel::new(format!("Time series plots of stock {}", series.symbol))
            .y_label("Volume weighted average price")
            .hide_x_ticks()
            .layer(Layer::line(dates.clone(), series.vwap(), BLUE)),
    );
    fig.push(
        Panel::new("")
            .y_label("Volume")
            .hide_x_ticks()
            .layer(Layer::line(dates.clone(), series.volume(), BLUE)),
    );
    fig.push(
        Panel::new("")
            .x_label("Date")
            .y_label("Turnover")
            .hide_x_ticks()
            .layer(Layer::line(dates, series.turnover(), BLUE)),
    );
    fig
}

/// One stem panel per correlogram, side by side.
pub fn correlogram_figure(correlograms: &[Correlogram], sizes: &FigureSizes) -> Figure {
    let (w, h) = sizes.correlogram;
    let mut fig = Figure::new(1, correlograms.len().max(1), w, h);

    for c in correlograms {
        let lags: Vec<f64> = (0..c.values.len()).map(|k| k as f64).collect();
        let upper: Vec<f64> = c.bounds.to_vec();
        let lower: Vec<f64> = c.bounds.iter().map(|b| -b).collect();
        fig.push(
            Panel::new(format!("{} plot for stock {}", c.kind.label(), c.symbol))
                .x_label("Lag")
                .layer(Layer::Band {
                    xs: lags[1..].to_vec(),
                    lower: lower[1..].to_vec(),
                    upper: upper[1..].to_vec(),
                    color: BLUE,
                })
                .layer(Layer::HLine { y: 0.0, color: GREY })
                .layer(Layer::Stems {
                    xs: lags,
                    ys: c.values.clone(),
                    color: BLUE,
                }),
        );
    }
    fig
}

fn grid(count: usize, sizes: &FigureSizes) -> Figure {
    let rows = count.div_ceil(GRID_COLUMNS).max(1);
    Figure::new(rows, GRID_COLUMNS, sizes.grid_width, sizes.grid_row_height * rows as u32)
}

/// In-sample predictions overlaid on the observed series.
pub fn in_sample_figure(forecasts: &[SymbolForecast], sizes: &FigureSizes) -> Figure {
    let mut fig = grid(forecasts.len(), sizes);
    for fc in forecasts {
        let s = &fc.in_sample;
        let observed_x: Vec<f64> = (0..s.actual.len()).map(|i| i as f64).collect();
        fig.push(
            Panel::new(&fc.symbol)
                .layer(Layer::labeled(observed_x, s.actual.clone(), BLUE, "observed"))
                .layer(Layer::labeled(s.index.clone(), s.predicted.clone(), RED, "predicted")),
        );
    }
    fig
}

/// History, forecast path and confidence band per symbol.
pub fn forecast_figure(forecasts: &[SymbolForecast], sizes: &FigureSizes) -> Figure {
    let mut fig = grid(forecasts.len(), sizes);
    for fc in forecasts {
        let history = &fc.in_sample.actual;
        let history_x: Vec<f64> = (0..history.len()).map(|i| i as f64).collect();
        fig.push(
            Panel::new(&fc.symbol)
                .hide_x_ticks()
                .layer(Layer::line(history_x, history.clone(), BLUE))
                .layer(Layer::Band {
                    xs: fc.index.clone(),
                    lower: fc.forecast.lower.clone(),
                    upper: fc.forecast.upper.clone(),
                    color: ORANGE,
                })
                .layer(Layer::line(fc.index.clone(), fc.forecast.mean.clone(), ORANGE)),
        );
    }
    fig
}

/// Writes figures as `<name>.png` (and `<name>.svg` when enabled).
#[derive(Debug, Clone)]
pub struct FigureWriter {
    pub dir: PathBuf,
    pub svg: bool,
}

impl FigureWriter {
    pub fn new(dir: impl AsRef<Path>, svg: bool) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            svg,
        }
    }

    /// Returns the paths written.
    pub fn write(&self, name: &str, figure: &Figure) -> Result<Vec<PathBuf>> {
        let png = self.dir.join(format!("{}.png", name));
        figure.save_png(&png)?;
        let mut written = vec![png];
        if self.svg {
            let svg = self.dir.join(format!("{}.svg", name));
            figure.save_svg(&svg)?;
            written.push(svg);
        }
        info!("Saved {}", written[0].display());
        Ok(written)
    }
}

/// Terminal sparkline of `values`, averaged into at most `width` buckets.
pub fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let n = values.len();
    let buckets = width.min(n);
    let means: Vec<f64> = (0..buckets)
        .map(|i| {
            let chunk = &values[i * n / buckets..(i + 1) * n / buckets];
            chunk.iter().sum::<f64>() / chunk.len() as f64
        })
        .collect();

    let (lo, hi) = means
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let top = SPARKLINE_CHARS.len() - 1;
    means
        .iter()
        .map(|&v| {
            let level = if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };
            SPARKLINE_CHARS[((level * top as f64).round() as usize).min(top)]
        })
        .collect()
}
