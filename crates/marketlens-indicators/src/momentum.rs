//! Momentum indicators.

use marketlens_core::traits::{Indicator, MultiOutputIndicator};
use serde::{Deserialize, Serialize};

use crate::moving_average::ema_series;

/// Relative Strength Index with Wilder smoothing.
///
/// The first value lands on close `period`; a window with no losses reads 100.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "RSI period must be positive");
        Self { period }
    }

    /// Wilder's smoothing, aligned so element `i` covers `values[..=i]`.
    fn wilder_smooth(values: &[f64], period: usize) -> Vec<Option<f64>> {
        let mut result = vec![None; values.len()];
        if values.len() < period {
            return result;
        }

        let n = period as f64;
        let mut avg = values[..period].iter().sum::<f64>() / n;
        result[period - 1] = Some(avg);

        for (i, &value) in values.iter().enumerate().skip(period) {
            avg += (value - avg) / n;
            result[i] = Some(avg);
        }

        result
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(14)
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let mut result = vec![None; data.len()];
        if data.len() <= self.period {
            return result;
        }

        let (gains, losses): (Vec<f64>, Vec<f64>) = data
            .windows(2)
            .map(|w| {
                let change = w[1] - w[0];
                if change > 0.0 {
                    (change, 0.0)
                } else {
                    (0.0, -change)
                }
            })
            .unzip();

        let avg_gains = Self::wilder_smooth(&gains, self.period);
        let avg_losses = Self::wilder_smooth(&losses, self.period);

        // Change j sits between closes j and j+1
        for (j, (gain, loss)) in avg_gains.iter().zip(avg_losses.iter()).enumerate() {
            if let (Some(gain), Some(loss)) = (gain, loss) {
                result[j + 1] = Some(if *loss == 0.0 {
                    100.0
                } else {
                    100.0 - (100.0 / (1.0 + gain / loss))
                });
            }
        }

        result
    }

    fn period(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

/// One MACD bar. Signal and histogram stay empty until the signal span fills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdOutput {
    pub macd: f64,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
}

/// MACD line (fast EMA minus slow EMA) with an EMA signal line.
#[derive(Debug, Clone)]
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Macd {
    /// The usual 12/26/9.
    pub fn new() -> Self {
        Self::with_periods(12, 26, 9)
    }

    pub fn with_periods(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast > 0 && slow > 0 && signal > 0);
        assert!(fast < slow, "fast span must be shorter than slow span");
        Self {
            fast_period: fast,
            slow_period: slow,
            signal_period: signal,
        }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for Macd {
    type Outputs = MacdOutput;

    fn calculate(&self, data: &[f64]) -> Vec<Option<MacdOutput>> {
        let mut result = vec![None; data.len()];
        if data.len() < self.slow_period {
            return result;
        }

        let fast_ema = ema_series(data, self.fast_period);
        let slow_ema = ema_series(data, self.slow_period);

        // The line starts once the slow EMA span is filled
        let start = self.slow_period - 1;
        let macd_line: Vec<f64> = fast_ema[start..]
            .iter()
            .zip(&slow_ema[start..])
            .map(|(f, s)| f - s)
            .collect();

        // Signal line (EMA of MACD), seeded with the first line value
        let signal_line = ema_series(&macd_line, self.signal_period);

        for (j, (&macd, &signal)) in macd_line.iter().zip(signal_line.iter()).enumerate() {
            let signal = (j + 1 >= self.signal_period).then_some(signal);
            result[start + j] = Some(MacdOutput {
                macd,
                signal,
                histogram: signal.map(|s| macd - s),
            });
        }

        result
    }

    fn period(&self) -> usize {
        self.slow_period + self.signal_period - 1
    }

    fn name(&self) -> &str {
        "MACD"
    }
}
