//! Risk scoring.
//!
//! Three independent factors (volatility, technical-signal conflict,
//! short-term market movement) are scored on a 0-100 scale, combined into a
//! 0.4/0.4/0.2 weighted composite and mapped to a risk level with fixed
//! position-sizing guidance.

use crate::indicators::IndicatorSet;
use crate::Ohlcv;

// ============================================================
// VALUE OBJECTS
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// One scored risk factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RiskFactor {
    pub level: RiskLevel,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RiskFactors {
    pub volatility: RiskFactor,
    pub technical: RiskFactor,
    pub market: RiskFactor,
}

/// Composite risk verdict for one snapshot
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: u32,
    pub factors: RiskFactors,
    pub guidance: &'static [&'static str],
}

// ============================================================
// GUIDANCE TEXT
// ============================================================

const LOW_RISK_GUIDANCE: &[&str] = &[
    "Normal position sizing is fine",
    "Stop-loss at 2-3%",
    "Suitable for beginner traders",
];

const MEDIUM_RISK_GUIDANCE: &[&str] = &[
    "Use a moderate position size",
    "Stop-loss at 3-4%",
    "Watch the market closely",
    "Suited to experienced traders",
];

const HIGH_RISK_GUIDANCE: &[&str] = &[
    "Use a small position size",
    "Tight stop-loss at 2%",
    "Avoid if you are a beginner",
    "Monitor the market continuously",
    "Be ready for a fast exit",
];

fn guidance(level: RiskLevel) -> &'static [&'static str] {
    match level {
        RiskLevel::Low => LOW_RISK_GUIDANCE,
        RiskLevel::Medium => MEDIUM_RISK_GUIDANCE,
        RiskLevel::High => HIGH_RISK_GUIDANCE,
    }
}

// ============================================================
// ASSESSOR
// ============================================================

/// Scores the three risk factors and their weighted composite
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskAssessor;

impl RiskAssessor {
    pub fn assess<T: Ohlcv>(&self, bars: &[T], indicators: &IndicatorSet) -> RiskAssessment {
        let volatility = volatility_risk(indicators.volatility);
        let technical = technical_risk(indicators);
        let market = market_risk(bars);

        let weighted = volatility.score as f64 * 0.4
            + technical.score as f64 * 0.4
            + market.score as f64 * 0.2;

        let level = if weighted > 60.0 {
            RiskLevel::High
        } else if weighted > 35.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        RiskAssessment {
            level,
            score: weighted.round() as u32,
            factors: RiskFactors {
                volatility,
                technical,
                market,
            },
            guidance: guidance(level),
        }
    }
}

/// Volatility buckets: >0.05 high, >0.03 medium, else low
pub fn volatility_risk(volatility: f64) -> RiskFactor {
    if volatility > 0.05 {
        RiskFactor {
            level: RiskLevel::High,
            score: 80,
        }
    } else if volatility > 0.03 {
        RiskFactor {
            level: RiskLevel::Medium,
            score: 50,
        }
    } else {
        RiskFactor {
            level: RiskLevel::Low,
            score: 20,
        }
    }
}

/// Signal-quality risk: RSI extremes, MACD/trend disagreement and proximity
/// to a key level each add to the score
pub fn technical_risk(indicators: &IndicatorSet) -> RiskFactor {
    let mut score = 0;

    if indicators.rsi > 80.0 || indicators.rsi < 20.0 {
        score += 30;
    }
    // Any mismatch counts, a neutral trend included
    if indicators.macd.state != indicators.moving_averages.trend {
        score += 20;
    }
    if indicators.support_resistance.near_resistance || indicators.support_resistance.near_support
    {
        score += 25;
    }

    let level = if score > 60 {
        RiskLevel::High
    } else if score > 30 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    RiskFactor { level, score }
}

/// Short-term market risk from the mean absolute percent change of the last
/// 10 closes
pub fn market_risk<T: Ohlcv>(bars: &[T]) -> RiskFactor {
    let start = bars.len().saturating_sub(10);
    let closes: Vec<f64> = bars[start..].iter().map(|b| b.close()).collect();

    let mut changes = Vec::new();
    for pair in closes.windows(2) {
        if pair[0] != 0.0 {
            changes.push(((pair[1] - pair[0]) / pair[0]).abs());
        }
    }

    let avg_change = if changes.is_empty() {
        0.0
    } else {
        changes.iter().sum::<f64>() / changes.len() as f64
    };

    if avg_change > 0.03 {
        RiskFactor {
            level: RiskLevel::High,
            score: 70,
        }
    } else if avg_change > 0.015 {
        RiskFactor {
            level: RiskLevel::Medium,
            score: 40,
        }
    } else {
        RiskFactor {
            level: RiskLevel::Low,
            score: 15,
        }
    }
}

// ============================================================
// TESTS
// ============================================================
