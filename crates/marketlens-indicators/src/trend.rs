//! Trend strength indicators.

use marketlens_core::traits::OhlcvIndicator;
use marketlens_core::types::PriceBar;
use serde::{Deserialize, Serialize};

/// Directional movement output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DmiOutput {
    /// Positive directional indicator
    pub plus_di: f64,
    /// Negative directional indicator
    pub minus_di: f64,
    /// Average directional index, once a full period of DX values exists
    pub adx: Option<f64>,
}

/// Average Directional Index (ADX) with Wilder's DMI.
///
/// +DI/-DI are reported from bar `period`, ADX from bar `2 * period - 1`.
#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
}

impl Adx {
    /// Create a new ADX indicator.
    ///
    /// Common period is 14.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Default for Adx {
    fn default() -> Self {
        Self::new(14)
    }
}

impl OhlcvIndicator for Adx {
    type Output = DmiOutput;

    fn calculate(&self, bars: &[PriceBar]) -> Vec<Option<DmiOutput>> {
        let mut result = vec![None; bars.len()];
        if bars.len() < self.period + 1 {
            return result;
        }

        let period_f64 = self.period as f64;

        // Raw TR, +DM, -DM for bars 1..n
        let mut tr = Vec::with_capacity(bars.len() - 1);
        let mut plus_dm = Vec::with_capacity(bars.len() - 1);
        let mut minus_dm = Vec::with_capacity(bars.len() - 1);
        for w in bars.windows(2) {
            let (prev, cur) = (&w[0], &w[1]);
            let up = cur.high - prev.high;
            let down = prev.low - cur.low;
            tr.push(cur.true_range(Some(prev.close)));
            plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
            minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
        }

        // Wilder running sums, seeded with the first period
        let mut s_tr: f64 = tr[..self.period].iter().sum();
        let mut s_plus: f64 = plus_dm[..self.period].iter().sum();
        let mut s_minus: f64 = minus_dm[..self.period].iter().sum();

        let mut dx_window = Vec::with_capacity(self.period);
        let mut adx: Option<f64> = None;

        for j in (self.period - 1)..tr.len() {
            if j >= self.period {
                s_tr = s_tr - s_tr / period_f64 + tr[j];
                s_plus = s_plus - s_plus / period_f64 + plus_dm[j];
                s_minus = s_minus - s_minus / period_f64 + minus_dm[j];
            }

            let (plus_di, minus_di) = if s_tr > 0.0 {
                (100.0 * s_plus / s_tr, 100.0 * s_minus / s_tr)
            } else {
                (0.0, 0.0)
            };
            let di_sum = plus_di + minus_di;
            let dx = if di_sum > 0.0 {
                100.0 * (plus_di - minus_di).abs() / di_sum
            } else {
                0.0
            };

            adx = match adx {
                Some(prev) => Some((prev * (period_f64 - 1.0) + dx) / period_f64),
                None => {
                    dx_window.push(dx);
                    (dx_window.len() == self.period)
                        .then(|| dx_window.iter().sum::<f64>() / period_f64)
                }
            };

            result[j + 1] = Some(DmiOutput {
                plus_di,
                minus_di,
                adx,
            });
        }

        result
    }

    fn period(&self) -> usize {
        2 * self.period
    }

    fn name(&self) -> &str {
        "ADX"
    }
}
