//! Property tests over arbitrary bar series.
//!
//! The engine promises to stay in range, stay deterministic and never panic
//! regardless of the series it is fed. These properties are exercised here
//! over generated OHLCV data.

use proptest::prelude::*;
use ta_advisor::indicators::IndicatorEngine;
use ta_advisor::patterns::PatternScanner;
use ta_advisor::recommend::{bearish_score, bullish_score, decide};
use ta_advisor::risk::{volatility_risk, RiskAssessor};
use ta_advisor::{Analyzer, Direction, PriceBar, Timeframe};

/// Arbitrary consistent bar series: high/low always bracket open/close and
/// prices stay positive
fn arb_bars() -> impl Strategy<Value = Vec<PriceBar>> {
    prop::collection::vec(
        (
            10.0f64..1000.0,
            10.0f64..1000.0,
            0.0f64..20.0,
            0.0f64..20.0,
            0.0f64..1_000_000.0,
        ),
        0..120,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (open, close, up, down, volume))| {
                let high = open.max(close) + up;
                let low = (open.min(close) - down).max(0.01);
                PriceBar::new(i as i64, open, high, low, close, volume)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn indicators_stay_in_range(bars in arb_bars()) {
        let set = IndicatorEngine::default().compute(&bars);

        prop_assert!((0.0..=100.0).contains(&set.rsi));
        prop_assert!((0.0..=100.0).contains(&set.stochastic_k));
        prop_assert!(set.bollinger.upper >= set.bollinger.middle);
        prop_assert!(set.bollinger.middle >= set.bollinger.lower);
        prop_assert!(set.volatility >= 0.0);
    }

    #[test]
    fn scores_and_confidence_stay_in_range(bars in arb_bars()) {
        prop_assume!(!bars.is_empty());

        let analyzer = Analyzer::new();
        let rec = analyzer.analyze("PROP", Timeframe::H4, &bars).unwrap();

        let bullish = bullish_score(&rec.indicators, &rec.patterns);
        let bearish = bearish_score(&rec.indicators, &rec.patterns);
        prop_assert!(bullish <= 100);
        prop_assert!(bearish <= 100);
        prop_assert!(rec.confidence <= 100);

        // The hysteresis band bounds neutral confidence at 70
        if rec.direction == Direction::Neutral {
            prop_assert!(rec.confidence <= 70);
        } else {
            prop_assert!(rec.confidence >= 81);
            prop_assert!(rec.confidence <= 95);
        }
    }

    #[test]
    fn equal_scores_are_always_neutral(score in 0u32..=100) {
        let (direction, confidence) = decide(score, score);
        prop_assert_eq!(direction, Direction::Neutral);
        prop_assert_eq!(confidence, 50);
    }

    #[test]
    fn analysis_is_deterministic(bars in arb_bars()) {
        prop_assume!(!bars.is_empty());

        let analyzer = Analyzer::new();
        let first = analyzer.analyze("PROP", Timeframe::H1, &bars).unwrap();
        let second = analyzer.analyze("PROP", Timeframe::H1, &bars).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn volatility_never_lowers_risk(bars in arb_bars(), a in 0.0f64..0.2, b in 0.0f64..0.2) {
        let (small, large) = if a <= b { (a, b) } else { (b, a) };

        prop_assert!(volatility_risk(small).score <= volatility_risk(large).score);

        // The same holds through the weighted composite when the other
        // factors are fixed
        let mut set = IndicatorEngine::default().compute(&bars);
        let assessor = RiskAssessor;

        set.volatility = small;
        let low = assessor.assess(&bars, &set).score;
        set.volatility = large;
        let high = assessor.assess(&bars, &set).score;
        prop_assert!(low <= high);
    }

    #[test]
    fn pattern_scan_never_panics(bars in arb_bars()) {
        let scan = PatternScanner::default().scan(&bars);
        for m in scan.bullish.iter().chain(&scan.bearish).chain(&scan.neutral) {
            prop_assert!(m.strength >= 10 && m.strength <= 20);
        }
    }
}
