//! Property-based tests using proptest for invariant testing.
//!
//! These tests verify that:
//! 1. Ordinal dates are a bijective, monotonic encoding of calendar dates
//! 2. The mean imputer leaves no gaps and fills them with the observed mean
//! 3. Ticker normalization never leaves a legacy ticker behind
//! 4. Differencing and integration are inverse operations
//! 5. Correlations stay within [-1, 1] and small AR polynomials are stationary

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use nifty_arima::arima::is_stationary;
use nifty_arima::autocorrelation::{acf, pacf};
use nifty_arima::clean::{MeanImputer, SymbolEncoding, TickerMap, LEGACY_TICKERS};
use nifty_arima::data::{from_ordinal, to_ordinal};
use nifty_arima::stats::{difference, integrate};

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    // 1900-01-01 .. 2100-12-31
    (0i64..73_413).prop_map(|offset| {
        NaiveDate::from_ymd_opt(1900, 1, 1).unwrap() + Duration::days(offset)
    })
}

fn ticker_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        proptest::sample::select(LEGACY_TICKERS.iter().map(|(l, _)| l.to_string()).collect::<Vec<_>>()),
        "[A-Z]{2,10}",
    ]
}

// ============================================================================
// Date Encoding Properties
// ============================================================================

proptest! {
    #[test]
    fn ordinal_round_trips(date in date_strategy()) {
        prop_assert_eq!(from_ordinal(to_ordinal(date)), Some(date));
    }

    #[test]
    fn ordinal_is_monotonic(a in date_strategy(), b in date_strategy()) {
        prop_assert_eq!(a.cmp(&b), to_ordinal(a).cmp(&to_ordinal(b)));
        prop_assert_eq!((to_ordinal(b) - to_ordinal(a)) as i64, (b - a).num_days());
    }
}

// ============================================================================
// Cleaning Properties
// ============================================================================

proptest! {
    #[test]
    fn imputer_fills_with_observed_mean(
        column in prop::collection::vec(prop::option::of(0.0..1.0f64), 1..60)
    ) {
        let observed: Vec<f64> = column.iter().flatten().copied().collect();
        prop_assume!(!observed.is_empty());
        let mean = observed.iter().sum::<f64>() / observed.len() as f64;

        let imputer = MeanImputer::fit(&column).unwrap();
        prop_assert!((imputer.mean() - mean).abs() < 1e-12);

        let filled = imputer.transform(&column);
        prop_assert_eq!(filled.len(), column.len());
        for (orig, new) in column.iter().zip(&filled) {
            match orig {
                Some(v) => prop_assert_eq!(v, new),
                None => prop_assert!((new - mean).abs() < 1e-12),
            }
        }
    }

    #[test]
    fn normalization_removes_legacy_tickers(symbols in prop::collection::vec(ticker_strategy(), 1..40)) {
        let map = TickerMap::legacy();
        for s in &symbols {
            let normalized = map.normalize(s);
            prop_assert!(!map.is_legacy(normalized), "{} stayed legacy as {}", s, normalized);
            if !map.is_legacy(s) {
                prop_assert_eq!(normalized, s.as_str());
            }
        }
    }

    #[test]
    fn encoding_codes_index_sorted_categories(symbols in prop::collection::vec("[A-E]{1,2}", 1..50)) {
        let encoding = SymbolEncoding::fit(&symbols);
        prop_assert!(encoding.categories.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(encoding.codes.len(), symbols.len());
        for (s, code) in symbols.iter().zip(&encoding.codes) {
            prop_assert_eq!(&encoding.categories[*code], s);
        }
        let dummies = encoding.dummies(false);
        prop_assert!(dummies.iter().all(|row| row.iter().map(|&v| v as usize).sum::<usize>() == 1));
    }
}

// ============================================================================
// Numeric Properties
// ============================================================================

proptest! {
    #[test]
    fn integrate_inverts_difference(data in prop::collection::vec(-1000.0..1000.0f64, 2..100)) {
        let diffed = difference(&data, 1);
        prop_assert_eq!(diffed.len(), data.len() - 1);
        let rebuilt = integrate(&diffed, data[0]);
        prop_assert_eq!(rebuilt.len(), diffed.len());
        for (a, b) in data[1..].iter().zip(&rebuilt) {
            prop_assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn correlations_are_bounded(data in prop::collection::vec(-100.0..100.0f64, 20..120)) {
        let mean = data.iter().sum::<f64>() / data.len() as f64;
        prop_assume!(data.iter().any(|v| (v - mean).abs() > 1e-6));
        let r = acf(&data, 10);
        prop_assert!((r[0] - 1.0).abs() < 1e-12);
        prop_assert!(r.iter().all(|v| v.abs() <= 1.0 + 1e-9));
        let p = pacf(&data, 10);
        prop_assert!((p[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn small_ar_coefficients_are_stationary(phi in prop::collection::vec(-0.3..0.3f64, 1..3)) {
        // Σ|φ| < 1 keeps every root outside the unit circle.
        prop_assert!(is_stationary(&phi));
    }
}
