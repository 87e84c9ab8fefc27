//! Final recommendation synthesis.
//!
//! Aggregates indicators and detected patterns into bullish/bearish scores,
//! applies the 20-point hysteresis band to pick a direction, then derives
//! targets, stop-loss, entry zone, time horizon and key levels around it.

use crate::indicators::{BandPosition, IndicatorSet, VolumeTrend};
use crate::patterns::PatternScan;
use crate::risk::{RiskAssessment, RiskLevel};
use crate::scenario::ScenarioSet;
use crate::{Direction, Ohlcv, Timeframe};

// ============================================================
// VALUE OBJECTS
// ============================================================

/// One of the three profit-target tiers
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Target {
    pub level: u8,
    pub price: f64,
    /// Signed distance from the current price, in percent
    pub percentage: f64,
    pub probability: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct StopLoss {
    pub price: f64,
    /// Signed distance from the current price, in percent
    pub percentage: f64,
}

/// Acceptable band for opening a position
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct EntryZone {
    pub min: f64,
    pub max: f64,
    pub optimal: f64,
}

/// Support, resistance and pivot over the recent window
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct KeyLevels {
    pub support: f64,
    pub resistance: f64,
    pub pivot: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityRegime {
    High,
    Low,
    Neutral,
}

/// Broad market condition the recommendation was made in
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MarketContext {
    pub volatility: VolatilityRegime,
    pub high_volume: bool,
}

impl MarketContext {
    /// Compact label, e.g. `high_volatility_high_volume`
    pub fn label(&self) -> String {
        let base = match self.volatility {
            VolatilityRegime::High => "high_volatility",
            VolatilityRegime::Low => "low_volatility",
            VolatilityRegime::Neutral => "neutral",
        };
        if self.high_volume {
            format!("{base}_high_volume")
        } else {
            base.to_string()
        }
    }
}

impl std::fmt::Display for MarketContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// The terminal analysis artifact for one symbol and timeframe
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Recommendation {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub current_price: f64,
    pub direction: Direction,
    /// Certainty of the direction call, 0-100
    pub confidence: u8,
    pub targets: [Target; 3],
    pub stop_loss: StopLoss,
    pub entry_zone: EntryZone,
    pub time_horizon_hours: u32,
    pub key_levels: KeyLevels,
    pub market_context: MarketContext,
    pub indicators: IndicatorSet,
    pub patterns: PatternScan,
    pub scenarios: ScenarioSet,
    pub risk: RiskAssessment,
    /// Human-readable rationale
    pub summary: String,
}

// ============================================================
// SCORING
// ============================================================

/// Additive bullish evidence, capped at 100
pub fn bullish_score(indicators: &IndicatorSet, patterns: &PatternScan) -> u32 {
    let mut score = 0;

    if indicators.rsi < 30.0 {
        score += 20;
    }
    if indicators.rsi > 50.0 && indicators.rsi < 70.0 {
        score += 10;
    }
    if indicators.macd.state.is_bullish() {
        score += 15;
    }
    if indicators.bollinger.position == BandPosition::Lower {
        score += 10;
    }
    if indicators.stochastic_k < 20.0 {
        score += 15;
    }
    if indicators.moving_averages.trend.is_bullish() {
        score += 20;
    }
    if indicators.moving_averages.golden_cross {
        score += 25;
    }
    score += patterns.bullish_strength();
    if indicators.support_resistance.near_support {
        score += 15;
    }

    score.min(100)
}

/// Additive bearish evidence, capped at 100
pub fn bearish_score(indicators: &IndicatorSet, patterns: &PatternScan) -> u32 {
    let mut score = 0;

    if indicators.rsi > 70.0 {
        score += 20;
    }
    if indicators.rsi < 50.0 && indicators.rsi > 30.0 {
        score += 10;
    }
    if indicators.macd.state.is_bearish() {
        score += 15;
    }
    if indicators.bollinger.position == BandPosition::Upper {
        score += 10;
    }
    if indicators.stochastic_k > 80.0 {
        score += 15;
    }
    if indicators.moving_averages.trend.is_bearish() {
        score += 20;
    }
    if indicators.moving_averages.death_cross {
        score += 25;
    }
    score += patterns.bearish_strength();
    if indicators.support_resistance.near_resistance {
        score += 15;
    }

    score.min(100)
}

/// Direction call with a 20-point hysteresis band against flip-flopping on
/// marginal signals. Directional confidence is `min(95, 60 + diff)`; neutral
/// confidence is `50 + |diff|`, which the band itself bounds at 70.
pub fn decide(bullish: u32, bearish: u32) -> (Direction, u8) {
    if bullish > bearish + 20 {
        (Direction::Bullish, (60 + (bullish - bearish)).min(95) as u8)
    } else if bearish > bullish + 20 {
        (Direction::Bearish, (60 + (bearish - bullish)).min(95) as u8)
    } else {
        (Direction::Neutral, (50 + bullish.abs_diff(bearish)) as u8)
    }
}

// ============================================================
// AUXILIARY CALCULATORS
// ============================================================

/// Three target tiers at 3/6/10% with fixed decreasing probabilities.
/// Anything that is not bullish projects to the downside.
fn targets(current_price: f64, direction: Direction) -> [Target; 3] {
    let sign = if direction.is_bullish() { 1.0 } else { -1.0 };

    [(1u8, 0.03, 75u8), (2, 0.06, 60), (3, 0.10, 40)].map(|(level, pct, probability)| Target {
        level,
        price: current_price * (1.0 + sign * pct),
        percentage: sign * pct * 100.0,
        probability,
    })
}

/// Stop-loss sized by risk level (2/3/5%), placed opposite the direction
fn stop_loss(current_price: f64, direction: Direction, level: RiskLevel) -> StopLoss {
    let risk = match level {
        RiskLevel::Low => 0.02,
        RiskLevel::Medium => 0.03,
        RiskLevel::High => 0.05,
    };
    let sign = if direction.is_bullish() { -1.0 } else { 1.0 };

    StopLoss {
        price: current_price * (1.0 + sign * risk),
        percentage: sign * risk * 100.0,
    }
}

/// 1.5% band around the current price
fn entry_zone(current_price: f64) -> EntryZone {
    let range = 0.015;
    EntryZone {
        min: current_price * (1.0 - range),
        max: current_price * (1.0 + range),
        optimal: current_price,
    }
}

/// Base horizon of the timeframe scaled by confidence, rounded to hours
fn time_horizon(timeframe: Timeframe, confidence: u8) -> u32 {
    let base = timeframe.base_horizon_hours() as f64;
    (base * confidence as f64 / 100.0).round() as u32
}

/// Extremes and midpoint of the trailing window
fn key_levels<T: Ohlcv>(bars: &[T], lookback: usize) -> KeyLevels {
    if bars.is_empty() {
        return KeyLevels {
            support: 0.0,
            resistance: 0.0,
            pivot: 0.0,
        };
    }

    let start = bars.len().saturating_sub(lookback);
    let window = &bars[start..];
    let resistance = window.iter().map(|b| b.high()).fold(f64::MIN, f64::max);
    let support = window.iter().map(|b| b.low()).fold(f64::MAX, f64::min);

    KeyLevels {
        support,
        resistance,
        pivot: (resistance + support) / 2.0,
    }
}

/// Volatility regime (>0.05 high, <0.02 low) plus the rising-volume flag
fn market_context(indicators: &IndicatorSet) -> MarketContext {
    let volatility = if indicators.volatility > 0.05 {
        VolatilityRegime::High
    } else if indicators.volatility < 0.02 {
        VolatilityRegime::Low
    } else {
        VolatilityRegime::Neutral
    };

    MarketContext {
        volatility,
        high_volume: indicators.volume.trend == VolumeTrend::Increasing,
    }
}

/// Templated rationale by direction and confidence tier
fn summary(direction: Direction, confidence: u8, symbol: &str) -> String {
    match direction {
        Direction::Bullish => {
            if confidence > 80 {
                format!(
                    "Strong buy recommendation for {symbol}. Technical signals are very \
                     positive with a high probability of reaching the targets."
                )
            } else if confidence > 60 {
                format!(
                    "Buy recommendation for {symbol}. Technical signals are positive; \
                     apply sound risk management."
                )
            } else {
                format!(
                    "Weak buy signal for {symbol}. Waiting for stronger confirmation \
                     is advised."
                )
            }
        }
        Direction::Bearish => {
            if confidence > 80 {
                format!(
                    "Strong sell recommendation for {symbol}. Technical signals are very \
                     negative with a high probability of further downside."
                )
            } else if confidence > 60 {
                format!(
                    "Sell recommendation for {symbol}. Technical signals are negative; \
                     apply sound risk management."
                )
            } else {
                format!(
                    "Weak sell signal for {symbol}. Waiting for stronger confirmation \
                     is advised."
                )
            }
        }
        Direction::Neutral => format!(
            "The market is ranging for {symbol}. Waiting for a clear signal before \
             acting is advised."
        ),
    }
}

// ============================================================
// SYNTHESIS
// ============================================================

/// Merge every upstream signal into the terminal [`Recommendation`]
#[allow(clippy::too_many_arguments)]
pub(crate) fn synthesize<T: Ohlcv>(
    symbol: &str,
    timeframe: Timeframe,
    bars: &[T],
    key_level_lookback: usize,
    indicators: IndicatorSet,
    patterns: PatternScan,
    scenarios: ScenarioSet,
    risk: RiskAssessment,
) -> Recommendation {
    let current_price = bars.last().map(|b| b.close()).unwrap_or(0.0);

    let bullish = bullish_score(&indicators, &patterns);
    let bearish = bearish_score(&indicators, &patterns);
    let (direction, confidence) = decide(bullish, bearish);

    Recommendation {
        symbol: symbol.to_string(),
        timeframe,
        current_price,
        direction,
        confidence,
        targets: targets(current_price, direction),
        stop_loss: stop_loss(current_price, direction, risk.level),
        entry_zone: entry_zone(current_price),
        time_horizon_hours: time_horizon(timeframe, confidence),
        key_levels: key_levels(bars, key_level_lookback),
        market_context: market_context(&indicators),
        summary: summary(direction, confidence, symbol),
        indicators,
        patterns,
        scenarios,
        risk,
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{
        BollingerBands, Macd, MovingAverages, SupportResistance, VolumeProfile,
    };
    use crate::PriceBar;

    fn neutral_set() -> IndicatorSet {
        IndicatorSet {
            rsi: 50.0,
            macd: Macd {
                line: 0.0,
                signal_line: 0.0,
                histogram: 0.0,
                state: Direction::Bearish,
            },
            bollinger: BollingerBands {
                upper: 102.0,
                middle: 100.0,
                lower: 98.0,
                position: BandPosition::Middle,
            },
            stochastic_k: 50.0,
            moving_averages: MovingAverages {
                sma20: 100.0,
                sma50: 100.0,
                ema12: 100.0,
                ema26: 100.0,
                trend: Direction::Neutral,
                golden_cross: false,
                death_cross: false,
            },
            support_resistance: SupportResistance {
                support: 95.0,
                resistance: 105.0,
                near_support: false,
                near_resistance: false,
            },
            volume: VolumeProfile {
                trend: VolumeTrend::Neutral,
                average: 1_000.0,
                percent_change: 0.0,
            },
            volatility: 0.025,
        }
    }

    #[test]
    fn test_bullish_score_accumulates() {
        let mut set = neutral_set();
        set.rsi = 25.0;
        set.macd.state = Direction::Bullish;
        set.bollinger.position = BandPosition::Lower;
        set.stochastic_k = 10.0;
        set.moving_averages.trend = Direction::Bullish;
        set.moving_averages.golden_cross = true;
        set.support_resistance.near_support = true;

        // 20 + 15 + 10 + 15 + 20 + 25 + 15 = 120, capped at 100
        assert_eq!(bullish_score(&set, &PatternScan::default()), 100);
    }

    #[test]
    fn test_bearish_score_mirrors() {
        let mut set = neutral_set();
        set.rsi = 75.0;
        set.bollinger.position = BandPosition::Upper;
        set.stochastic_k = 90.0;
        set.moving_averages.trend = Direction::Bearish;
        set.moving_averages.death_cross = true;
        set.support_resistance.near_resistance = true;

        // 20 + 15 + 10 + 15 + 20 + 25 + 15 = 120, capped at 100
        assert_eq!(bearish_score(&set, &PatternScan::default()), 100);
    }

    #[test]
    fn test_midband_rsi_contributions() {
        let mut set = neutral_set();
        set.macd.state = Direction::Bullish;

        set.rsi = 60.0;
        assert_eq!(bullish_score(&set, &PatternScan::default()), 25);

        set.rsi = 40.0;
        assert_eq!(bullish_score(&set, &PatternScan::default()), 15);
        assert_eq!(bearish_score(&set, &PatternScan::default()), 10);
    }

    #[test]
    fn test_decide_hysteresis() {
        // A tie is always neutral
        assert_eq!(decide(50, 50), (Direction::Neutral, 50));
        // 20 points of separation is still inside the band
        assert_eq!(decide(60, 40), (Direction::Neutral, 70));
        // 21 points crosses it
        assert_eq!(decide(61, 40), (Direction::Bullish, 81));
        assert_eq!(decide(40, 61), (Direction::Bearish, 81));
    }

    #[test]
    fn test_confidence_caps() {
        let (_, confidence) = decide(100, 0);
        assert_eq!(confidence, 95);

        // Neutral confidence is bounded by the band itself
        let (direction, confidence) = decide(70, 50);
        assert_eq!(direction, Direction::Neutral);
        assert_eq!(confidence, 70);
    }

    #[test]
    fn test_targets_direction() {
        let up = targets(100.0, Direction::Bullish);
        assert_eq!(up[0].price, 103.0);
        assert_eq!(up[1].price, 106.0);
        assert_eq!(up[2].price, 110.0);
        assert_eq!(up[0].probability, 75);
        assert_eq!(up[2].probability, 40);

        // Neutral projects downside, like bearish
        let flat = targets(100.0, Direction::Neutral);
        assert_eq!(flat[0].price, 97.0);
        assert_eq!(flat[0].percentage, -3.0);
    }

    #[test]
    fn test_stop_loss_by_risk_level() {
        let low = stop_loss(100.0, Direction::Bullish, RiskLevel::Low);
        assert_eq!(low.price, 98.0);
        assert_eq!(low.percentage, -2.0);

        let high = stop_loss(100.0, Direction::Bullish, RiskLevel::High);
        assert_eq!(high.price, 95.0);

        let bearish = stop_loss(100.0, Direction::Bearish, RiskLevel::Medium);
        assert_eq!(bearish.price, 103.0);
        assert_eq!(bearish.percentage, 3.0);
    }

    #[test]
    fn test_entry_zone_band() {
        let zone = entry_zone(200.0);
        assert_eq!(zone.min, 197.0);
        assert_eq!(zone.max, 203.0);
        assert_eq!(zone.optimal, 200.0);
    }

    #[test]
    fn test_time_horizon_scaling() {
        assert_eq!(time_horizon(Timeframe::H4, 100), 72);
        assert_eq!(time_horizon(Timeframe::H4, 50), 36);
        assert_eq!(time_horizon(Timeframe::M1, 81), 1);
        assert_eq!(time_horizon(Timeframe::D1, 95), 160);
    }

    #[test]
    fn test_key_levels_window() {
        let bars: Vec<PriceBar> = (0..30)
            .map(|i| {
                let base = 100.0 + i as f64;
                PriceBar::new(i as i64, base, base + 2.0, base - 2.0, base, 1_000.0)
            })
            .collect();

        // Only the last 20 bars count
        let levels = key_levels(&bars, 20);
        assert_eq!(levels.resistance, 131.0);
        assert_eq!(levels.support, 108.0);
        assert_eq!(levels.pivot, 119.5);
    }

    #[test]
    fn test_market_context_labels() {
        let mut set = neutral_set();
        set.volatility = 0.06;
        set.volume.trend = VolumeTrend::Increasing;
        assert_eq!(market_context(&set).label(), "high_volatility_high_volume");

        set.volatility = 0.01;
        set.volume.trend = VolumeTrend::Neutral;
        assert_eq!(market_context(&set).label(), "low_volatility");

        set.volatility = 0.03;
        assert_eq!(market_context(&set).label(), "neutral");
    }

    #[test]
    fn test_summary_tiers() {
        assert!(summary(Direction::Bullish, 90, "BTC").starts_with("Strong buy"));
        assert!(summary(Direction::Bullish, 70, "BTC").starts_with("Buy"));
        assert!(summary(Direction::Bearish, 85, "BTC").starts_with("Strong sell"));
        assert!(summary(Direction::Neutral, 55, "BTC").contains("ranging"));
        assert!(summary(Direction::Bullish, 90, "BTC").contains("BTC"));
    }
}
