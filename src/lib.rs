//! # TA-Advisor
//!
//! Technical analysis and trading recommendation engine for OHLCV bar series.
//!
//! Feeds a time-ordered bar series through indicator computation, candlestick
//! pattern detection, scenario generation and risk assessment, then merges all
//! signals into a single [`Recommendation`](recommend::Recommendation) with a
//! direction, confidence score, price targets, stop-loss and entry zone.
//!
//! The engine is a pure function of its input: no I/O, no shared state, safe
//! to call concurrently for different symbols.
//!
//! ## Quick Start
//!
//! ```rust
//! use ta_advisor::prelude::*;
//!
//! // Bars come from your market data provider, oldest first.
//! let bars: Vec<PriceBar> = (0..100i64)
//!     .map(|i| {
//!         let base = 100.0 + i as f64 * 0.2;
//!         PriceBar::new(i, base, base + 1.0, base - 1.0, base + 0.5, 1_000.0)
//!     })
//!     .collect();
//!
//! let analyzer = Analyzer::new();
//! let rec = analyzer.analyze("BTC/USDT", Timeframe::H4, &bars).unwrap();
//! assert!(rec.confidence <= 100);
//! ```

pub mod indicators;
pub mod patterns;
pub mod recommend;
pub mod risk;
pub mod scenario;

pub mod prelude {
    pub use crate::{
        // Indicators
        indicators::{
            BandPosition, BollingerBands, IndicatorEngine, IndicatorSet, Macd, MovingAverages,
            SupportResistance, VolumeProfile, VolumeTrend,
        },
        // Patterns
        patterns::{
            BearishEngulfing, BullishEngulfing, CandlePattern, Doji, Hammer, PatternMatch,
            PatternScan, PatternScanner, ShootingStar,
        },
        // Recommendation
        recommend::{
            EntryZone, KeyLevels, MarketContext, Recommendation, StopLoss, Target,
            VolatilityRegime,
        },
        // Risk
        risk::{RiskAssessment, RiskAssessor, RiskFactor, RiskFactors, RiskLevel},
        // Scenarios
        scenario::{PriceObjective, Scenario, ScenarioGenerator, ScenarioSet},
        // Engine
        analyze_parallel,
        AnalysisError,
        AnalysisFailure,
        Analyzer,
        AnalyzerBuilder,
        AnalyzerConfig,
        Direction,
        Ohlcv,
        OhlcvExt,
        Period,
        PriceBar,
        Result,
        Timeframe,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can cross the public `analyze` boundary.
///
/// Short series and degenerate ranges are never errors; indicators fall back
/// to their documented neutral values instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    #[error("no bars provided for {symbol}")]
    EmptySeries { symbol: String },

    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },

    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),

    #[error("unknown timeframe: {0}")]
    UnknownTimeframe(String),

    /// Data-provider failure funneled into the same taxonomy by callers that
    /// wrap fetch + analysis into one pipeline.
    #[error("market data unavailable: {message}")]
    Upstream { message: String },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Indicator window length (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(AnalysisError::InvalidConfig("period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV bar trait; the engine is generic over any bar type.
pub trait Ohlcv {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    fn timestamp(&self) -> Option<i64> {
        None
    }
}

/// Extension trait with the derived candle geometry used by the detectors.
pub trait OhlcvExt: Ohlcv {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Validate bar consistency
    fn validate(&self) -> Result<()> {
        if self.high() < self.low() {
            return Err(AnalysisError::InvalidBar {
                index: 0,
                reason: "high < low",
            });
        }
        let fields = [
            self.open(),
            self.high(),
            self.low(),
            self.close(),
            self.volume(),
        ];
        if fields.iter().any(|v| v.is_nan()) {
            return Err(AnalysisError::InvalidBar {
                index: 0,
                reason: "NaN in bar",
            });
        }
        if fields.iter().any(|v| v.is_infinite()) {
            return Err(AnalysisError::InvalidBar {
                index: 0,
                reason: "infinite value in bar",
            });
        }
        Ok(())
    }
}

impl<T: Ohlcv> OhlcvExt for T {}

/// Concrete OHLCV bar as delivered by a market data provider.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PriceBar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl Ohlcv for PriceBar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn timestamp(&self) -> Option<i64> {
        Some(self.timestamp)
    }
}

// ============================================================
// DIRECTION & TIMEFRAME
// ============================================================

/// Directional bias of a signal, trend or recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Neutral,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

/// Chart timeframe of the analyzed series.
///
/// Serializes as its wire label ("1m" .. "1d").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    H1,
    H4,
    D1,
}

impl Timeframe {
    /// Wire label for this timeframe
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    /// Base duration of a full-confidence recommendation, in hours
    pub fn base_horizon_hours(&self) -> u32 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 4,
            Timeframe::M15 => 12,
            Timeframe::H1 => 24,
            Timeframe::H4 => 72,
            Timeframe::D1 => 168,
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Timeframe {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1m" => Ok(Timeframe::M1),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "1h" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            other => Err(AnalysisError::UnknownTimeframe(other.to_string())),
        }
    }
}

impl serde::Serialize for Timeframe {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.label())
    }
}

impl<'de> serde::Deserialize<'de> for Timeframe {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(d)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================
// ANALYZER CONFIG & BUILDER
// ============================================================

use indicators::IndicatorEngine;
use patterns::PatternScanner;
use recommend::Recommendation;
use risk::RiskAssessor;
use scenario::ScenarioGenerator;

/// Indicator windows and engine behavior.
///
/// Defaults match the standard parameterization (RSI 14, Bollinger 20,
/// support/resistance over 50 bars, key levels over 20).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalyzerConfig {
    pub rsi_period: Period,
    pub stochastic_period: Period,
    pub bollinger_period: Period,
    pub sr_lookback: Period,
    pub key_level_lookback: Period,
    pub volatility_window: Period,
    /// Reject series containing malformed bars instead of analyzing them
    pub validate_data: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            rsi_period: Period::new_const(14),
            stochastic_period: Period::new_const(14),
            bollinger_period: Period::new_const(20),
            sr_lookback: Period::new_const(50),
            key_level_lookback: Period::new_const(20),
            volatility_window: Period::new_const(20),
            validate_data: false,
        }
    }
}

/// Builder for [`Analyzer`] instances with custom indicator windows
pub struct AnalyzerBuilder {
    rsi_period: usize,
    stochastic_period: usize,
    bollinger_period: usize,
    sr_lookback: usize,
    key_level_lookback: usize,
    volatility_window: usize,
    validate_data: bool,
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        let defaults = AnalyzerConfig::default();
        Self {
            rsi_period: defaults.rsi_period.get(),
            stochastic_period: defaults.stochastic_period.get(),
            bollinger_period: defaults.bollinger_period.get(),
            sr_lookback: defaults.sr_lookback.get(),
            key_level_lookback: defaults.key_level_lookback.get(),
            volatility_window: defaults.volatility_window.get(),
            validate_data: false,
        }
    }

    pub fn rsi_period(mut self, period: usize) -> Self {
        self.rsi_period = period;
        self
    }

    pub fn stochastic_period(mut self, period: usize) -> Self {
        self.stochastic_period = period;
        self
    }

    pub fn bollinger_period(mut self, period: usize) -> Self {
        self.bollinger_period = period;
        self
    }

    pub fn support_resistance_lookback(mut self, bars: usize) -> Self {
        self.sr_lookback = bars;
        self
    }

    pub fn key_level_lookback(mut self, bars: usize) -> Self {
        self.key_level_lookback = bars;
        self
    }

    pub fn volatility_window(mut self, bars: usize) -> Self {
        self.volatility_window = bars;
        self
    }

    /// Enable/disable bar validation before analysis
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.validate_data = enable;
        self
    }

    /// Build the analyzer, validating every window
    pub fn build(self) -> Result<Analyzer> {
        let config = AnalyzerConfig {
            rsi_period: Period::new(self.rsi_period)?,
            stochastic_period: Period::new(self.stochastic_period)?,
            bollinger_period: Period::new(self.bollinger_period)?,
            sr_lookback: Period::new(self.sr_lookback)?,
            key_level_lookback: Period::new(self.key_level_lookback)?,
            volatility_window: Period::new(self.volatility_window)?,
            validate_data: self.validate_data,
        };
        Ok(Analyzer::with_config(config))
    }
}

// ============================================================
// ANALYZER
// ============================================================

/// Top-level analysis engine.
///
/// Stateless: every call reads only its input series and allocates only the
/// value objects of its own result.
pub struct Analyzer {
    indicators: IndicatorEngine,
    patterns: PatternScanner,
    scenarios: ScenarioGenerator,
    risk: RiskAssessor,
    key_level_lookback: Period,
    validate_data: bool,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    /// Analyzer with default indicator windows
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            indicators: IndicatorEngine::new(
                config.rsi_period,
                config.stochastic_period,
                config.bollinger_period,
                config.sr_lookback,
                config.volatility_window,
            ),
            patterns: PatternScanner::default(),
            scenarios: ScenarioGenerator,
            risk: RiskAssessor,
            key_level_lookback: config.key_level_lookback,
            validate_data: config.validate_data,
        }
    }

    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Run the full pipeline for one symbol over one bar series.
    ///
    /// Bars are oldest first. A minimum of 50 bars (100 recommended) avoids
    /// fallback degradation across indicators; shorter series still succeed
    /// with the documented neutral fallbacks.
    pub fn analyze<T: Ohlcv>(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        bars: &[T],
    ) -> Result<Recommendation> {
        if self.validate_data {
            self.validate_bars(bars)?;
        }

        let current_price = bars
            .last()
            .map(|bar| bar.close())
            .ok_or_else(|| AnalysisError::EmptySeries {
                symbol: symbol.to_string(),
            })?;

        tracing::debug!(
            symbol = %symbol,
            timeframe = %timeframe,
            bars = bars.len(),
            "running analysis"
        );

        let indicators = self.indicators.compute(bars);
        let patterns = self.patterns.scan(bars);
        let scenarios = self.scenarios.generate(current_price, &indicators);
        let risk = self.risk.assess(bars, &indicators);

        let recommendation = recommend::synthesize(
            symbol,
            timeframe,
            bars,
            self.key_level_lookback.get(),
            indicators,
            patterns,
            scenarios,
            risk,
        );

        tracing::debug!(
            symbol = %symbol,
            direction = ?recommendation.direction,
            confidence = recommendation.confidence,
            "analysis complete"
        );

        Ok(recommendation)
    }

    fn validate_bars<T: Ohlcv>(&self, bars: &[T]) -> Result<()> {
        for (i, bar) in bars.iter().enumerate() {
            bar.validate().map_err(|e| match e {
                AnalysisError::InvalidBar { reason, .. } => {
                    AnalysisError::InvalidBar { index: i, reason }
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

// ============================================================
// PARALLEL ANALYSIS
// ============================================================

use rayon::prelude::*;

/// Per-symbol failure from a parallel batch
#[derive(Debug)]
pub struct AnalysisFailure {
    pub symbol: String,
    pub error: AnalysisError,
}

/// Analyze many instruments in parallel with one analyzer.
///
/// A failing instrument never aborts the batch; failures come back alongside
/// the successful recommendations.
pub fn analyze_parallel<'a, T, I>(
    analyzer: &Analyzer,
    timeframe: Timeframe,
    instruments: I,
) -> (Vec<Recommendation>, Vec<AnalysisFailure>)
where
    T: Ohlcv + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            analyzer
                .analyze(symbol, timeframe, bars)
                .map_err(|error| AnalysisFailure {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut failures = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => failures.push(e),
        }
    }

    (successes, failures)
}

// ============================================================
// TESTS
// ============================================================
