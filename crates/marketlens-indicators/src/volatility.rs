//! Volatility indicators.

use marketlens_core::traits::{MultiOutputIndicator, OhlcvIndicator};
use marketlens_core::types::PriceBar;
use serde::{Deserialize, Serialize};

/// Average True Range with Wilder smoothing.
///
/// True range needs the previous close, so the first value sits on bar
/// `period`, seeded with the plain mean of the first `period` ranges.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "ATR period must be positive");
        Self { period }
    }
}

impl OhlcvIndicator for Atr {
    type Output = f64;

    fn calculate(&self, bars: &[PriceBar]) -> Vec<Option<f64>> {
        let mut result = vec![None; bars.len()];
        if bars.len() <= self.period {
            return result;
        }

        let ranges: Vec<f64> = bars
            .windows(2)
            .map(|pair| pair[1].true_range(Some(pair[0].close)))
            .collect();

        let n = self.period as f64;
        let mut atr = ranges[..self.period].iter().sum::<f64>() / n;
        result[self.period] = Some(atr);

        // range j belongs to bar j + 1
        for (j, &range) in ranges.iter().enumerate().skip(self.period) {
            atr += (range - atr) / n;
            result[j + 1] = Some(atr);
        }

        result
    }

    fn period(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "ATR"
    }
}

/// Upper, middle and lower band for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerOutput {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerOutput {
    /// Distance between the outer bands.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Bollinger Bands: a rolling mean with bands `k` population standard
/// deviations either side.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    k: f64,
}

impl BollingerBands {
    /// 20 bars, 2 deviations.
    pub fn new() -> Self {
        Self::with_params(20, 2.0)
    }

    pub fn with_params(period: usize, k: f64) -> Self {
        assert!(period > 1, "Bollinger period must exceed 1");
        assert!(k > 0.0, "band multiplier must be positive");
        Self { period, k }
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for BollingerBands {
    type Outputs = BollingerOutput;

    fn calculate(&self, data: &[f64]) -> Vec<Option<BollingerOutput>> {
        let mut result = vec![None; data.len()];
        let n = self.period as f64;

        for (i, window) in data.windows(self.period).enumerate() {
            let mean = window.iter().sum::<f64>() / n;
            let sd = (window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();

            result[i + self.period - 1] = Some(BollingerOutput {
                upper: mean + self.k * sd,
                middle: mean,
                lower: mean - self.k * sd,
            });
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "Bollinger"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn bars(high: &[f64], low: &[f64], close: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..close.len())
            .map(|i| {
                PriceBar::new(
                    "7203",
                    start + Duration::days(i as i64),
                    close[i],
                    high[i],
                    low[i],
                    close[i],
                    1_000,
                )
            })
            .collect()
    }

    #[test]
    fn test_atr_seed_and_smoothing() {
        let atr = Atr::new(3);
        let series = bars(
            &[10.0, 11.0, 12.0, 11.0, 13.0, 16.0],
            &[8.0, 9.0, 10.0, 9.0, 11.0, 12.0],
            &[9.0, 10.0, 11.0, 10.0, 12.0, 13.0],
        );

        let result = atr.calculate(&series);
        assert_eq!(result.len(), 6);
        assert!(result[2].is_none());
        // ranges for bars 1..=3 are all 2
        assert!((result[3].unwrap() - 2.0).abs() < 1e-10);
        // bar 4: range 3 (13 - 10)
        assert!((result[4].unwrap() - 7.0 / 3.0).abs() < 1e-10);
        // bar 5: range 4 (16 - 12)
        assert!((result[5].unwrap() - (7.0 / 3.0 * 2.0 + 4.0) / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_atr_too_short() {
        let series = bars(&[2.0; 3], &[1.0; 3], &[1.5; 3]);
        assert!(Atr::new(3).calculate(&series).iter().all(Option::is_none));
    }

    #[test]
    fn test_bollinger_ordering() {
        let bb = BollingerBands::new();
        let data: Vec<f64> = (0..30)
            .map(|i| 100.0 + (i as f64 * 0.1).sin() * 5.0)
            .collect();

        let result = bb.calculate(&data);
        assert!(result[18].is_none());
        assert!(result[19].is_some());

        for output in result.iter().flatten() {
            assert!(output.upper > output.middle);
            assert!(output.middle > output.lower);
        }
    }

    #[test]
    fn test_bollinger_known_window() {
        let bb = BollingerBands::with_params(3, 2.0);
        let result = bb.calculate(&[2.0, 4.0, 6.0]);

        // mean 4, population variance 8/3
        let sd = (8.0f64 / 3.0).sqrt();
        let out = result[2].unwrap();
        assert!((out.middle - 4.0).abs() < 1e-12);
        assert!((out.width() - 4.0 * sd).abs() < 1e-12);
    }

    #[test]
    fn test_bollinger_flat_price_collapses() {
        let bb = BollingerBands::with_params(5, 2.0);
        let out = bb.calculate(&[100.0; 5])[4].unwrap();
        assert_eq!(out.width(), 0.0);
        assert_eq!(out.middle, 100.0);
    }
}
