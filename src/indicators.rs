//! Technical indicator computation.
//!
//! Every indicator reads a trailing window of the bar series and falls back to
//! a documented neutral value when the series is shorter than its window.
//! Nothing in this module can fail or index out of range.

use crate::{Direction, Ohlcv, Period};

// ============================================================
// VALUE OBJECTS
// ============================================================

/// All indicators computed for one bar-series snapshot
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct IndicatorSet {
    /// Relative Strength Index in [0, 100]
    pub rsi: f64,
    pub macd: Macd,
    pub bollinger: BollingerBands,
    /// Stochastic %K in [0, 100]
    pub stochastic_k: f64,
    pub moving_averages: MovingAverages,
    pub support_resistance: SupportResistance,
    pub volume: VolumeProfile,
    /// Standard deviation of close-to-close returns, >= 0
    pub volatility: f64,
}

/// MACD momentum signal.
///
/// The signal line is a fixed 0.9 ratio of the MACD line rather than an
/// independently smoothed series, so the histogram is always one tenth of the
/// line. Kept that way for parity with the source system.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Macd {
    pub line: f64,
    pub signal_line: f64,
    pub histogram: f64,
    /// Bullish iff the MACD line is above its signal line
    pub state: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub position: BandPosition,
}

/// Where the current close sits relative to the Bollinger bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandPosition {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct MovingAverages {
    pub sma20: f64,
    pub sma50: f64,
    pub ema12: f64,
    pub ema26: f64,
    pub trend: Direction,
    pub golden_cross: bool,
    pub death_cross: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SupportResistance {
    pub support: f64,
    pub resistance: f64,
    pub near_support: bool,
    pub near_resistance: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct VolumeProfile {
    pub trend: VolumeTrend,
    /// Mean volume of the last 10 bars (0 when fewer than 20 bars)
    pub average: f64,
    /// Percent change of recent vs older mean volume
    pub percent_change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeTrend {
    Increasing,
    Neutral,
    Decreasing,
}

// ============================================================
// ENGINE
// ============================================================

/// Computes the full [`IndicatorSet`] for a bar series
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    rsi_period: Period,
    stochastic_period: Period,
    bollinger_period: Period,
    sr_lookback: Period,
    volatility_window: Period,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new(
            Period::new_const(14),
            Period::new_const(14),
            Period::new_const(20),
            Period::new_const(50),
            Period::new_const(20),
        )
    }
}

impl IndicatorEngine {
    pub fn new(
        rsi_period: Period,
        stochastic_period: Period,
        bollinger_period: Period,
        sr_lookback: Period,
        volatility_window: Period,
    ) -> Self {
        Self {
            rsi_period,
            stochastic_period,
            bollinger_period,
            sr_lookback,
            volatility_window,
        }
    }

    /// Compute every indicator for one snapshot.
    ///
    /// Never fails; an empty series yields the all-fallback set.
    pub fn compute<T: Ohlcv>(&self, bars: &[T]) -> IndicatorSet {
        IndicatorSet {
            rsi: rsi(bars, self.rsi_period.get()),
            macd: macd(bars),
            bollinger: bollinger(bars, self.bollinger_period.get()),
            stochastic_k: stochastic_k(bars, self.stochastic_period.get()),
            moving_averages: moving_averages(bars),
            support_resistance: support_resistance(bars, self.sr_lookback.get()),
            volume: volume_profile(bars),
            volatility: volatility(bars, self.volatility_window.get()),
        }
    }
}

// ============================================================
// INDICATOR FUNCTIONS
// ============================================================

fn last_close<T: Ohlcv>(bars: &[T]) -> f64 {
    bars.last().map(|b| b.close()).unwrap_or(0.0)
}

/// RSI over the last `period` close-to-close deltas.
///
/// Fewer than `period + 1` bars falls back to the neutral 50. A window with
/// losses but no gains reads 0, gains but no losses reads 100, and the fully
/// flat window (zero denominator) reads the neutral 50.
pub fn rsi<T: Ohlcv>(bars: &[T], period: usize) -> f64 {
    let len = bars.len();
    if len < period + 1 {
        return 50.0;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in 1..=period {
        let change = bars[len - i].close() - bars[len - i - 1].close();
        if change > 0.0 {
            gains += change;
        } else {
            losses += -change;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return 50.0;
        }
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Exponential moving average seeded from the close `period` bars back.
/// Falls back to the latest close when the series is shorter than the period.
pub fn ema<T: Ohlcv>(bars: &[T], period: usize) -> f64 {
    let len = bars.len();
    if len < period {
        return last_close(bars);
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut value = bars[len - period].close();
    for bar in &bars[len - period + 1..] {
        value = bar.close() * multiplier + value * (1.0 - multiplier);
    }
    value
}

/// Simple moving average of the last `period` closes.
/// Falls back to the latest close when the series is shorter than the period.
pub fn sma<T: Ohlcv>(bars: &[T], period: usize) -> f64 {
    let len = bars.len();
    if len < period {
        return last_close(bars);
    }

    let sum: f64 = bars[len - period..].iter().map(|b| b.close()).sum();
    sum / period as f64
}

/// MACD line from EMA(12) - EMA(26) with the fixed-ratio signal line
pub fn macd<T: Ohlcv>(bars: &[T]) -> Macd {
    let line = ema(bars, 12) - ema(bars, 26);
    let signal_line = line * 0.9;
    let state = if line > signal_line {
        Direction::Bullish
    } else {
        Direction::Bearish
    };

    Macd {
        line,
        signal_line,
        histogram: line - signal_line,
        state,
    }
}

/// Bollinger bands at ±2 population standard deviations around the SMA.
///
/// The position checks run upper first, lower second, so a degenerate band
/// where both match resolves to `Lower`. Short series fall back to a ±2% band
/// around the current close.
pub fn bollinger<T: Ohlcv>(bars: &[T], period: usize) -> BollingerBands {
    let current = last_close(bars);
    let len = bars.len();

    if len < period {
        return BollingerBands {
            upper: current * 1.02,
            middle: current,
            lower: current * 0.98,
            position: BandPosition::Middle,
        };
    }

    let window = &bars[len - period..];
    let mean: f64 = window.iter().map(|b| b.close()).sum::<f64>() / period as f64;
    let variance: f64 = window
        .iter()
        .map(|b| (b.close() - mean).powi(2))
        .sum::<f64>()
        / period as f64;
    let std_dev = variance.sqrt();

    let upper = mean + std_dev * 2.0;
    let lower = mean - std_dev * 2.0;

    let mut position = BandPosition::Middle;
    if current > upper * 0.95 {
        position = BandPosition::Upper;
    }
    if current < lower * 1.05 {
        position = BandPosition::Lower;
    }

    BollingerBands {
        upper,
        middle: mean,
        lower,
        position,
    }
}

/// Stochastic %K over the trailing window.
///
/// Short series and flat high/low ranges both read the neutral 50.
pub fn stochastic_k<T: Ohlcv>(bars: &[T], period: usize) -> f64 {
    let len = bars.len();
    if len < period {
        return 50.0;
    }

    let window = &bars[len - period..];
    let highest = window.iter().map(|b| b.high()).fold(f64::MIN, f64::max);
    let lowest = window.iter().map(|b| b.low()).fold(f64::MAX, f64::min);
    let range = highest - lowest;
    if range == 0.0 {
        return 50.0;
    }

    (last_close(bars) - lowest) / range * 100.0
}

/// SMA20/SMA50/EMA12/EMA26 with trend and cross classification
pub fn moving_averages<T: Ohlcv>(bars: &[T]) -> MovingAverages {
    let sma20 = sma(bars, 20);
    let sma50 = sma(bars, 50);
    let ema12 = ema(bars, 12);
    let ema26 = ema(bars, 26);
    let price = last_close(bars);

    let mut trend = Direction::Neutral;
    if price > sma20 && sma20 > sma50 {
        trend = Direction::Bullish;
    }
    if price < sma20 && sma20 < sma50 {
        trend = Direction::Bearish;
    }

    MovingAverages {
        sma20,
        sma50,
        ema12,
        ema26,
        trend,
        golden_cross: ema12 > ema26 && sma20 > sma50,
        death_cross: ema12 < ema26 && sma20 < sma50,
    }
}

/// Support and resistance from the trailing lookback window (or the whole
/// series when shorter), with proximity flags at 2% of each level
pub fn support_resistance<T: Ohlcv>(bars: &[T], lookback: usize) -> SupportResistance {
    if bars.is_empty() {
        return SupportResistance {
            support: 0.0,
            resistance: 0.0,
            near_support: false,
            near_resistance: false,
        };
    }

    let start = bars.len().saturating_sub(lookback);
    let window = &bars[start..];
    let resistance = window.iter().map(|b| b.high()).fold(f64::MIN, f64::max);
    let support = window.iter().map(|b| b.low()).fold(f64::MAX, f64::min);
    let price = last_close(bars);

    SupportResistance {
        support,
        resistance,
        near_support: price < support * 1.02,
        near_resistance: price > resistance * 0.98,
    }
}

/// Volume trend from the mean of the last 10 bars vs the preceding 10.
/// Fewer than 20 bars reads neutral with a zero average.
pub fn volume_profile<T: Ohlcv>(bars: &[T]) -> VolumeProfile {
    let len = bars.len();
    if len < 20 {
        return VolumeProfile {
            trend: VolumeTrend::Neutral,
            average: 0.0,
            percent_change: 0.0,
        };
    }

    let recent_avg: f64 = bars[len - 10..].iter().map(|b| b.volume()).sum::<f64>() / 10.0;
    let older_avg: f64 = bars[len - 20..len - 10]
        .iter()
        .map(|b| b.volume())
        .sum::<f64>()
        / 10.0;

    let mut trend = VolumeTrend::Neutral;
    if recent_avg > older_avg * 1.2 {
        trend = VolumeTrend::Increasing;
    }
    if recent_avg < older_avg * 0.8 {
        trend = VolumeTrend::Decreasing;
    }

    let percent_change = if older_avg == 0.0 {
        0.0
    } else {
        (recent_avg - older_avg) / older_avg * 100.0
    };

    VolumeProfile {
        trend,
        average: recent_avg,
        percent_change,
    }
}

/// Population standard deviation of close-to-close returns over the trailing
/// window. Fewer bars than the window reads the 0.02 fallback.
pub fn volatility<T: Ohlcv>(bars: &[T], window: usize) -> f64 {
    let len = bars.len();
    if len < window {
        return 0.02;
    }

    let mut returns = Vec::with_capacity(window.saturating_sub(1));
    for i in 1..window {
        let current = bars[len - i].close();
        let previous = bars[len - i - 1].close();
        if previous == 0.0 {
            returns.push(0.0);
        } else {
            returns.push((current - previous) / previous);
        }
    }
    if returns.is_empty() {
        return 0.0;
    }

    let mean: f64 = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    variance.sqrt()
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PriceBar;

    fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new(i as i64, c, c + 1.0, c - 1.0, c, 1_000.0))
            .collect()
    }

    fn flat_bars(n: usize, price: f64) -> Vec<PriceBar> {
        (0..n)
            .map(|i| PriceBar::new(i as i64, price, price, price, price, 500.0))
            .collect()
    }

    #[test]
    fn test_rsi_short_series_is_neutral() {
        let bars = bars_from_closes(&[1.0; 10]);
        assert_eq!(rsi(&bars, 14), 50.0);
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let bars = bars_from_closes(&closes);
        assert_eq!(rsi(&bars, 14), 100.0);
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let bars = bars_from_closes(&closes);
        assert_eq!(rsi(&bars, 14), 0.0);
    }

    #[test]
    fn test_rsi_flat_window_is_neutral() {
        let bars = flat_bars(30, 100.0);
        assert_eq!(rsi(&bars, 14), 50.0);
    }

    #[test]
    fn test_rsi_stays_in_range() {
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + ((i * 17 + 3) % 11) as f64 - 5.0)
            .collect();
        let bars = bars_from_closes(&closes);
        let value = rsi(&bars, 14);
        assert!((0.0..=100.0).contains(&value));
    }

    #[test]
    fn test_ema_short_series_is_last_close() {
        let bars = bars_from_closes(&[10.0, 11.0, 12.0]);
        assert_eq!(ema(&bars, 12), 12.0);
    }

    #[test]
    fn test_sma_window() {
        let bars = bars_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(sma(&bars, 5), 3.0);
        assert_eq!(sma(&bars, 3), 4.0);
        assert_eq!(sma(&bars, 10), 5.0);
    }

    #[test]
    fn test_macd_state_follows_line_sign() {
        let rising: Vec<f64> = (0..40).map(|i| 100.0 + i as f64 * 2.0).collect();
        let up = macd(&bars_from_closes(&rising));
        assert!(up.line > 0.0);
        assert_eq!(up.state, Direction::Bullish);
        assert!((up.histogram - up.line * 0.1).abs() < 1e-9);

        let falling: Vec<f64> = (0..40).map(|i| 200.0 - i as f64 * 2.0).collect();
        let down = macd(&bars_from_closes(&falling));
        assert!(down.line < 0.0);
        assert_eq!(down.state, Direction::Bearish);
    }

    #[test]
    fn test_bollinger_band_ordering() {
        let closes: Vec<f64> = (0..30)
            .map(|i| 100.0 + ((i * 13 + 7) % 9) as f64)
            .collect();
        let bands = bollinger(&bars_from_closes(&closes), 20);
        assert!(bands.upper >= bands.middle);
        assert!(bands.middle >= bands.lower);
    }

    #[test]
    fn test_bollinger_fallback_band() {
        let bars = bars_from_closes(&[100.0; 5]);
        let bands = bollinger(&bars, 20);
        assert_eq!(bands.middle, 100.0);
        assert_eq!(bands.upper, 102.0);
        assert_eq!(bands.lower, 98.0);
        assert_eq!(bands.position, BandPosition::Middle);
    }

    #[test]
    fn test_bollinger_degenerate_band_reads_lower() {
        // Zero deviation collapses the band onto the close; the lower check
        // runs last and wins.
        let bands = bollinger(&flat_bars(25, 100.0), 20);
        assert_eq!(bands.upper, bands.lower);
        assert_eq!(bands.position, BandPosition::Lower);
    }

    #[test]
    fn test_stochastic_flat_range_is_neutral() {
        assert_eq!(stochastic_k(&flat_bars(20, 50.0), 14), 50.0);
    }

    #[test]
    fn test_stochastic_short_series_is_neutral() {
        let bars = bars_from_closes(&[1.0, 2.0]);
        assert_eq!(stochastic_k(&bars, 14), 50.0);
    }

    #[test]
    fn test_stochastic_extremes() {
        // Close at the top of the range
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let k = stochastic_k(&bars_from_closes(&closes), 14);
        assert!(k > 90.0 && k <= 100.0);
    }

    #[test]
    fn test_moving_average_trend() {
        let rising: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let up = moving_averages(&bars_from_closes(&rising));
        assert_eq!(up.trend, Direction::Bullish);
        assert!(up.golden_cross);
        assert!(!up.death_cross);

        let falling: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        let down = moving_averages(&bars_from_closes(&falling));
        assert_eq!(down.trend, Direction::Bearish);
        assert!(down.death_cross);
    }

    #[test]
    fn test_support_resistance_flags() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let sr = support_resistance(&bars_from_closes(&closes), 50);
        // Latest close sits right under the window high
        assert!(sr.near_resistance);
        assert!(!sr.near_support);
        assert!(sr.resistance > sr.support);
    }

    #[test]
    fn test_volume_trend_detection() {
        let mut bars: Vec<PriceBar> = (0..10)
            .map(|i| PriceBar::new(i, 100.0, 101.0, 99.0, 100.0, 1_000.0))
            .collect();
        bars.extend((10..20).map(|i| PriceBar::new(i, 100.0, 101.0, 99.0, 100.0, 2_000.0)));

        let profile = volume_profile(&bars);
        assert_eq!(profile.trend, VolumeTrend::Increasing);
        assert_eq!(profile.average, 2_000.0);
        assert_eq!(profile.percent_change, 100.0);
    }

    #[test]
    fn test_volume_short_series_is_neutral() {
        let bars = bars_from_closes(&[1.0; 15]);
        let profile = volume_profile(&bars);
        assert_eq!(profile.trend, VolumeTrend::Neutral);
        assert_eq!(profile.average, 0.0);
    }

    #[test]
    fn test_volatility_fallback_and_flat() {
        let short = bars_from_closes(&[1.0; 10]);
        assert_eq!(volatility(&short, 20), 0.02);

        let flat = flat_bars(30, 100.0);
        assert_eq!(volatility(&flat, 20), 0.0);
    }

    #[test]
    fn test_empty_series_yields_fallbacks() {
        let bars: Vec<PriceBar> = vec![];
        let set = IndicatorEngine::default().compute(&bars);
        assert_eq!(set.rsi, 50.0);
        assert_eq!(set.stochastic_k, 50.0);
        assert_eq!(set.volatility, 0.02);
        assert_eq!(set.moving_averages.trend, Direction::Neutral);
        assert_eq!(set.volume.trend, VolumeTrend::Neutral);
    }
}
