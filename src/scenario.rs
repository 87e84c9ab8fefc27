//! Probability-weighted market scenarios.
//!
//! Three scenarios are produced per snapshot, one per direction. Probabilities
//! are additive condition weights capped at 70 for the directional scenarios;
//! the neutral probability is the remainder and may go negative when both
//! directional probabilities sit near their cap, which is kept as a signed
//! diagnostic of a conflicted market.

use crate::indicators::{IndicatorSet, VolumeTrend};

// ============================================================
// VALUE OBJECTS
// ============================================================

/// Price expectation of a scenario: a point target or a trading range
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceObjective {
    Target { price: f64 },
    Range { lower: f64, upper: f64 },
}

/// One directional market scenario
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Scenario {
    /// Condition-weighted probability; signed for the neutral scenario
    pub probability: i32,
    pub objective: PriceObjective,
    /// Expected play-out window
    pub horizon: &'static str,
    pub key_factors: &'static [&'static str],
    pub risks: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ScenarioSet {
    pub bullish: Scenario,
    pub bearish: Scenario,
    pub neutral: Scenario,
}

// ============================================================
// STATIC NARRATIVES
// ============================================================

const BULLISH_FACTORS: &[&str] = &[
    "Break above the key resistance level",
    "Rising trading volume",
    "Improving technical indicators",
    "Positive overall market trend",
];

const BULLISH_RISKS: &[&str] = &[
    "Strong resistance at higher levels",
    "Fading trading volume",
    "Negative market news",
];

const BEARISH_FACTORS: &[&str] = &[
    "Break below the key support level",
    "Weak trading volume",
    "Deteriorating technical indicators",
    "Negative overall market trend",
];

const BEARISH_RISKS: &[&str] = &[
    "Strong support at lower levels",
    "Buyers stepping in",
    "Unexpected positive news",
];

const NEUTRAL_FACTORS: &[&str] = &[
    "Oscillation between support and resistance",
    "No clear direction",
    "Waiting for an external catalyst",
    "Balance between buying and selling pressure",
];

// ============================================================
// GENERATOR
// ============================================================

/// Derives the three scenarios from one indicator snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioGenerator;

impl ScenarioGenerator {
    pub fn generate(&self, current_price: f64, indicators: &IndicatorSet) -> ScenarioSet {
        let bullish_probability = bullish_probability(indicators);
        let bearish_probability = bearish_probability(indicators);

        ScenarioSet {
            bullish: Scenario {
                probability: bullish_probability,
                objective: PriceObjective::Target {
                    price: current_price * 1.15,
                },
                horizon: "1-2 weeks",
                key_factors: BULLISH_FACTORS,
                risks: BULLISH_RISKS,
            },
            bearish: Scenario {
                probability: bearish_probability,
                objective: PriceObjective::Target {
                    price: current_price * 0.85,
                },
                horizon: "1-2 weeks",
                key_factors: BEARISH_FACTORS,
                risks: BEARISH_RISKS,
            },
            neutral: Scenario {
                probability: 100 - bullish_probability - bearish_probability,
                objective: PriceObjective::Range {
                    lower: current_price * 0.95,
                    upper: current_price * 1.05,
                },
                horizon: "1-3 weeks",
                key_factors: NEUTRAL_FACTORS,
                risks: &[],
            },
        }
    }
}

/// Weighted bullish conditions, capped at 70
pub fn bullish_probability(indicators: &IndicatorSet) -> i32 {
    let mut probability = 0;

    if indicators.rsi < 30.0 {
        probability += 20;
    }
    if indicators.macd.state.is_bullish() {
        probability += 15;
    }
    if indicators.moving_averages.trend.is_bullish() {
        probability += 20;
    }
    if indicators.support_resistance.near_support {
        probability += 15;
    }
    if indicators.volume.trend == VolumeTrend::Increasing {
        probability += 10;
    }

    probability.min(70)
}

/// Weighted bearish conditions, capped at 70
pub fn bearish_probability(indicators: &IndicatorSet) -> i32 {
    let mut probability = 0;

    if indicators.rsi > 70.0 {
        probability += 20;
    }
    if indicators.macd.state.is_bearish() {
        probability += 15;
    }
    if indicators.moving_averages.trend.is_bearish() {
        probability += 20;
    }
    if indicators.support_resistance.near_resistance {
        probability += 15;
    }
    if indicators.volume.trend == VolumeTrend::Decreasing {
        probability += 10;
    }

    probability.min(70)
}

// ============================================================
// TESTS
// ============================================================
