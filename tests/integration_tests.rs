//! Integration tests for the analysis pipeline.

use chrono::{Duration, NaiveDate};
use nifty_arima::clean::{Cleaner, CleaningConfig, UnknownTickerPolicy};
use nifty_arima::config::PipelineFileConfig;
use nifty_arima::data::{
    from_ordinal, group_by_symbol, load_cleaned_csv, load_raw_csv, load_raw_str, DataConfig,
};
use nifty_arima::error::PipelineError;
use nifty_arima::fit::{FitConfig, ModelFitter};
use nifty_arima::pipeline::{Pipeline, CLEANED_FILE};
use nifty_arima::report::ReportFormatter;
use nifty_arima::types::ArimaOrder;
use std::fs;
use tempfile::TempDir;

const HEADER: &str = "Date,Symbol,Series,Prev Close,Open,High,Low,Last,Close,VWAP,Volume,Turnover,Trades,Deliverable Volume,%Deliverble";

const SYMBOLS: [&str; 9] = [
    "ADANIPORTS", "ASIANPAINT", "AXISBANK", "BPCL", "CIPLA", "GAIL", "INFY", "ITC", "TCS",
];

const MUNDRAPORT: &str = "\
Date,Symbol,Series,Prev Close,Open,High,Low,Last,Close,VWAP,Volume,Turnover,Trades,Deliverable Volume,%Deliverble
2007-11-27,MUNDRAPORT,EQ,440.0,770.0,1050.0,770.0,959.0,962.9,984.72,27294366,2.6877e+15,,9859619,0.3695
2007-11-28,MUNDRAPORT,EQ,962.9,984.0,990.0,874.0,885.0,893.9,941.38,4581338,4.3127e+14,,1453278,0.3196
2007-11-29,MUNDRAPORT,EQ,893.9,909.0,914.75,841.0,887.0,884.2,888.09,5124121,4.5507e+14,,1069678,0.2953
2007-11-30,MUNDRAPORT,EQ,884.2,890.0,958.0,890.0,929.0,921.55,929.17,4609762,4.2832e+14,,,
2007-12-03,MUNDRAPORT,EQ,921.55,939.75,995.0,922.0,980.0,969.3,965.65,2977470,2.8752e+14,,831416,0.2798
2007-12-04,MUNDRAPORT,EQ,969.3,985.0,990.0,874.0,924.0,908.0,941.36,4849250,4.5649e+14,,1408046,0.2903
";

/// Deterministic uniform noise for synthetic prices.
struct Lcg(u64);

impl Lcg {
    fn normal(&mut self) -> f64 {
        (0..12)
            .map(|_| {
                self.0 = self
                    .0
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (self.0 >> 11) as f64 / (1u64 << 53) as f64
            })
            .sum::<f64>()
            - 6.0
    }
}

/// Raw export with one random-walk VWAP path per symbol.
fn synthetic_export(days: usize) -> String {
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    let mut csv = String::from(HEADER);
    for (s, symbol) in SYMBOLS.iter().enumerate() {
        let mut rng = Lcg(1000 + s as u64);
        let mut price = 100.0 + 50.0 * s as f64;
        for i in 0..days {
            price += rng.normal();
            let volume = 10_000.0 + 100.0 * i as f64;
            let date = start + Duration::days(i as i64);
            csv.push_str(&format!(
                "\n{},{},EQ,{p:.2},{p:.2},{:.2},{:.2},{p:.2},{p:.2},{p:.4},{volume},{:.2},100,5000,{:.4}",
                date.format("%Y-%m-%d"),
                symbol,
                price + 1.0,
                price - 1.0,
                price * volume,
                0.3 + 0.001 * (i % 50) as f64,
                p = price,
            ));
        }
    }
    csv
}

#[test]
fn test_mundraport_cleaning() {
    let raw = load_raw_str(MUNDRAPORT, &DataConfig::default()).unwrap();
    assert_eq!(raw.len(), 6);
    assert_eq!(raw[3].pct_deliverable, None);
    assert_eq!(raw[3].deliverable_volume, None);

    let table = Cleaner::default().clean(&raw).unwrap();
    assert_eq!(table.records.len(), 6);
    assert!(table.records.iter().all(|r| r.symbol == "ADANIPORTS"));

    let dates: Vec<i32> = table.records.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![733007, 733008, 733009, 733010, 733013, 733014]);
    assert_eq!(from_ordinal(733007), NaiveDate::from_ymd_opt(2007, 11, 27));

    let expected = (0.3695 + 0.3196 + 0.2953 + 0.2798 + 0.2903) / 5.0;
    assert!((table.records[3].pct_deliverable - expected).abs() < 1e-12);
    assert!((table.records[0].pct_deliverable - 0.3695).abs() < 1e-12);

    assert_eq!(table.report.renamed.get("MUNDRAPORT"), Some(&6));
    assert_eq!(table.report.imputed, 1);
    assert_eq!(table.encoding.categories, vec!["ADANIPORTS".to_string()]);
    assert!(table.report.unknown_symbols.is_empty());
}

#[test]
fn test_cleaned_csv_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("raw.csv");
    fs::write(&input, MUNDRAPORT).unwrap();

    let pipeline = Pipeline::new(nifty_arima::PipelineConfig {
        input,
        output_dir: dir.path().to_path_buf(),
        ..Default::default()
    });
    let raw = pipeline.load().unwrap();
    let (table, path) = pipeline.clean(&raw).unwrap();

    let header = fs::read_to_string(&path).unwrap();
    assert!(header.starts_with(
        "Date,Symbol,Prev Close,Open,High,Low,Last,Close,VWAP,Volume,Turnover,%Deliverble"
    ));
    assert_eq!(load_cleaned_csv(&path).unwrap(), table.records);
}

#[test]
fn test_bad_date_names_row() {
    let content = MUNDRAPORT.replace("2007-11-29", "29/11/2007");
    let raw = load_raw_str(&content, &DataConfig::default()).unwrap();
    match Cleaner::default().clean(&raw).unwrap_err() {
        PipelineError::DateParseError { row, value, .. } => {
            assert_eq!(row, 3);
            assert_eq!(value, "29/11/2007");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_ticker_policies() {
    let content = MUNDRAPORT.replace("MUNDRAPORT", "NEWLISTING");
    let raw = load_raw_str(&content, &DataConfig::default()).unwrap();

    let warn = Cleaner::default().clean(&raw).unwrap();
    assert_eq!(warn.report.unknown_symbols, vec!["NEWLISTING".to_string()]);
    assert!(warn.records.iter().all(|r| r.symbol == "NEWLISTING"));

    let strict = Cleaner::new(CleaningConfig {
        unknown_ticker: UnknownTickerPolicy::Error,
        ..Default::default()
    });
    assert!(matches!(
        strict.clean(&raw),
        Err(PipelineError::UnknownTicker(t)) if t == "NEWLISTING"
    ));
}

#[test]
fn test_fit_report_on_loaded_data() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("raw.csv");
    fs::write(&input, synthetic_export(150)).unwrap();

    let raw = load_raw_csv(&input, &DataConfig::default()).unwrap();
    let table = Cleaner::default().clean(&raw).unwrap();
    let series = group_by_symbol(&table.records);
    assert_eq!(series.len(), SYMBOLS.len());
    assert_eq!(series[0].symbol, "ADANIPORTS");

    let config = FitConfig {
        auto_symbols: Vec::new(),
        ..Default::default()
    };
    let report = ModelFitter::new(config).fit_all(&series[..3]).unwrap();
    assert_eq!(report.fits.len() + report.failures.len(), 3);
    for fit in &report.fits {
        assert_eq!(fit.with_ma.order, ArimaOrder::new(1, 1, 1));
        assert_eq!(fit.without_ma.order, ArimaOrder::new(1, 1, 0));
        assert_eq!(fit.ma_improves(), fit.without_ma.aic > fit.with_ma.aic);
    }

    let json: serde_json::Value = serde_json::from_str(&ReportFormatter::to_json(&report)).unwrap();
    assert_eq!(json["fits"].as_array().unwrap().len(), report.fits.len());
}

#[test]
fn test_full_pipeline_from_config() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("NIFTY50_all.csv");
    let output_dir = dir.path().join("out");
    fs::write(&input, synthetic_export(150)).unwrap();

    let mut file_config = PipelineFileConfig::default();
    file_config.data.input = input.display().to_string();
    file_config.data.output_dir = output_dir.display().to_string();
    file_config.plots.svg = true;
    file_config.plots.overview_size = [400, 300];
    file_config.plots.correlogram_size = [400, 150];
    file_config.plots.grid_width = 500;
    file_config.plots.grid_row_height = 100;
    file_config.model.show_progress = false;
    file_config.forecast.horizon = 20;

    let config_path = dir.path().join("nifty-arima.toml");
    file_config.save(&config_path).unwrap();
    let config = PipelineFileConfig::load(&config_path)
        .unwrap()
        .to_pipeline_config()
        .unwrap();

    let report = Pipeline::new(config).run().unwrap();

    assert!(output_dir.join(CLEANED_FILE).exists());
    for name in ["p1", "p2", "p3", "p4", "p5"] {
        assert!(output_dir.join(format!("{}.png", name)).exists(), "{} missing", name);
        assert!(output_dir.join(format!("{}.svg", name)).exists(), "{} svg missing", name);
    }
    assert_eq!(report.outputs.len(), 11);

    let p1 = image::open(output_dir.join("p1.png")).unwrap();
    assert_eq!((p1.width(), p1.height()), (400, 300));

    assert_eq!(report.cleaning.rows, 9 * 150);
    assert_eq!(report.orders.estimates.len(), 9);
    assert_eq!(
        report.orders.global_d,
        report.orders.estimates.iter().map(|e| e.d).max().unwrap()
    );
    let pacf: Vec<&str> = report.orders.pacf.iter().map(|c| c.symbol.as_str()).collect();
    assert_eq!(pacf, vec!["ASIANPAINT", "AXISBANK", "BPCL", "CIPLA"]);

    assert!(report.fits.fits.len() + report.fits.failures.len() >= 9);
    assert_eq!(report.forecasts.len(), report.fits.fits.len());
    for fc in &report.forecasts {
        assert!(fc.final_lower <= fc.final_mean && fc.final_mean <= fc.final_upper);
    }
}

#[test]
fn test_pipeline_needs_nine_symbols() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("raw.csv");
    let export = synthetic_export(60);
    let truncated: Vec<&str> = export
        .lines()
        .filter(|l| !l.contains(",TCS,") && !l.contains(",ITC,"))
        .collect();
    fs::write(&input, truncated.join("\n")).unwrap();

    let mut config = nifty_arima::PipelineConfig {
        input,
        output_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    config.sizes.overview = (200, 200);
    let err = Pipeline::new(config).run().unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InsufficientSymbols {
            needed: 9,
            available: 7
        }
    ));
}
