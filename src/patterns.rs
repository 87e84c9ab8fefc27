//! Reversal candlestick pattern detection.
//!
//! Detectors inspect only the last one or two bars of the series and never
//! fail: a series shorter than a pattern's minimum length simply produces no
//! match. All shape tests are pure comparisons on candle geometry, so
//! zero-range bars are safe (they match nothing).

use crate::{Direction, Ohlcv, OhlcvExt};

// ============================================================
// MATCH RESULT
// ============================================================

/// One detected pattern with its additive score contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PatternMatch {
    pub name: &'static str,
    pub direction: Direction,
    pub strength: u32,
    pub description: &'static str,
}

/// Patterns detected on the series tail, bucketed by direction
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct PatternScan {
    pub bullish: Vec<PatternMatch>,
    pub bearish: Vec<PatternMatch>,
    pub neutral: Vec<PatternMatch>,
}

impl PatternScan {
    pub fn is_empty(&self) -> bool {
        self.bullish.is_empty() && self.bearish.is_empty() && self.neutral.is_empty()
    }

    /// Sum of bullish pattern strengths
    pub fn bullish_strength(&self) -> u32 {
        self.bullish.iter().map(|p| p.strength).sum()
    }

    /// Sum of bearish pattern strengths
    pub fn bearish_strength(&self) -> u32 {
        self.bearish.iter().map(|p| p.strength).sum()
    }
}

// ============================================================
// PATTERN TRAIT
// ============================================================

/// A candlestick pattern evaluated on the tail of a bar series
pub trait CandlePattern {
    fn name(&self) -> &'static str;
    fn direction(&self) -> Direction;
    fn strength(&self) -> u32;
    fn description(&self) -> &'static str;

    /// Bars required before the shape test may run
    fn min_bars(&self) -> usize;

    /// Shape test on the series tail; only called with `min_bars` available
    fn matches<T: Ohlcv>(&self, bars: &[T]) -> bool;

    fn detect<T: Ohlcv>(&self, bars: &[T]) -> Option<PatternMatch> {
        if bars.len() < self.min_bars() || !self.matches(bars) {
            return None;
        }
        Some(PatternMatch {
            name: self.name(),
            direction: self.direction(),
            strength: self.strength(),
            description: self.description(),
        })
    }
}

// ============================================================
// SINGLE-BAR SHAPES
// ============================================================

/// Hammer: long lower shadow, minimal upper shadow on the latest bar
#[derive(Debug, Clone, Copy)]
pub struct Hammer {
    pub shadow_body_ratio: f64,
    pub counter_shadow_ratio: f64,
}

impl Default for Hammer {
    fn default() -> Self {
        Self {
            shadow_body_ratio: 2.0,
            counter_shadow_ratio: 0.5,
        }
    }
}

impl CandlePattern for Hammer {
    fn name(&self) -> &'static str {
        "Hammer"
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn strength(&self) -> u32 {
        15
    }

    fn description(&self) -> &'static str {
        "Bullish reversal marking the end of a downtrend"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn matches<T: Ohlcv>(&self, bars: &[T]) -> bool {
        let bar = &bars[bars.len() - 1];
        let body = bar.body();
        bar.lower_shadow() > body * self.shadow_body_ratio
            && bar.upper_shadow() < body * self.counter_shadow_ratio
    }
}

/// Shooting Star: mirror of the Hammer, long upper shadow on the latest bar
#[derive(Debug, Clone, Copy)]
pub struct ShootingStar {
    pub shadow_body_ratio: f64,
    pub counter_shadow_ratio: f64,
}

impl Default for ShootingStar {
    fn default() -> Self {
        Self {
            shadow_body_ratio: 2.0,
            counter_shadow_ratio: 0.5,
        }
    }
}

impl CandlePattern for ShootingStar {
    fn name(&self) -> &'static str {
        "Shooting Star"
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn strength(&self) -> u32 {
        15
    }

    fn description(&self) -> &'static str {
        "Bearish reversal marking the end of an uptrend"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn matches<T: Ohlcv>(&self, bars: &[T]) -> bool {
        let bar = &bars[bars.len() - 1];
        let body = bar.body();
        bar.upper_shadow() > body * self.shadow_body_ratio
            && bar.lower_shadow() < body * self.counter_shadow_ratio
    }
}

/// Doji: body smaller than a tenth of the bar's full range
#[derive(Debug, Clone, Copy)]
pub struct Doji {
    pub max_body_ratio: f64,
}

impl Default for Doji {
    fn default() -> Self {
        Self {
            max_body_ratio: 0.1,
        }
    }
}

impl CandlePattern for Doji {
    fn name(&self) -> &'static str {
        "Doji"
    }

    fn direction(&self) -> Direction {
        Direction::Neutral
    }

    fn strength(&self) -> u32 {
        10
    }

    fn description(&self) -> &'static str {
        "Indecision candle with no clear direction"
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn matches<T: Ohlcv>(&self, bars: &[T]) -> bool {
        let bar = &bars[bars.len() - 1];
        // Strict comparison keeps zero-range bars out
        bar.body() < bar.range() * self.max_body_ratio
    }
}

// ============================================================
// TWO-BAR SHAPES
// ============================================================

/// Bullish Engulfing: green body fully containing the prior red body
#[derive(Debug, Clone, Copy, Default)]
pub struct BullishEngulfing;

impl CandlePattern for BullishEngulfing {
    fn name(&self) -> &'static str {
        "Bullish Engulfing"
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn strength(&self) -> u32 {
        20
    }

    fn description(&self) -> &'static str {
        "Strong reversal opening an uptrend"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn matches<T: Ohlcv>(&self, bars: &[T]) -> bool {
        let current = &bars[bars.len() - 1];
        let previous = &bars[bars.len() - 2];

        previous.is_bearish()
            && current.is_bullish()
            && current.open() < previous.close()
            && current.close() > previous.open()
    }
}

/// Bearish Engulfing: red body fully containing the prior green body
#[derive(Debug, Clone, Copy, Default)]
pub struct BearishEngulfing;

impl CandlePattern for BearishEngulfing {
    fn name(&self) -> &'static str {
        "Bearish Engulfing"
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn strength(&self) -> u32 {
        20
    }

    fn description(&self) -> &'static str {
        "Strong reversal opening a downtrend"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn matches<T: Ohlcv>(&self, bars: &[T]) -> bool {
        let current = &bars[bars.len() - 1];
        let previous = &bars[bars.len() - 2];

        previous.is_bullish()
            && current.is_bearish()
            && current.open() > previous.close()
            && current.close() < previous.open()
    }
}

// ============================================================
// SCANNER
// ============================================================

/// Runs the fixed detector set over the series tail
#[derive(Debug, Clone, Default)]
pub struct PatternScanner {
    pub hammer: Hammer,
    pub bullish_engulfing: BullishEngulfing,
    pub shooting_star: ShootingStar,
    pub bearish_engulfing: BearishEngulfing,
    pub doji: Doji,
}

impl PatternScanner {
    pub fn scan<T: Ohlcv>(&self, bars: &[T]) -> PatternScan {
        let mut result = PatternScan::default();

        if let Some(m) = self.hammer.detect(bars) {
            result.bullish.push(m);
        }
        if let Some(m) = self.bullish_engulfing.detect(bars) {
            result.bullish.push(m);
        }
        if let Some(m) = self.shooting_star.detect(bars) {
            result.bearish.push(m);
        }
        if let Some(m) = self.bearish_engulfing.detect(bars) {
            result.bearish.push(m);
        }
        if let Some(m) = self.doji.detect(bars) {
            result.neutral.push(m);
        }

        result
    }
}

// ============================================================
// TESTS
// ============================================================
