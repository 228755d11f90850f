//! Moving average indicators.

use marketlens_core::traits::Indicator;

/// Simple moving average over a trailing window.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "SMA period must be positive");
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let mut result = vec![None; data.len()];
        if data.len() < self.period {
            return result;
        }

        let n = self.period as f64;
        let mut sum: f64 = data[..self.period].iter().sum();
        result[self.first_index()] = Some(sum / n);

        for i in self.period..data.len() {
            sum += data[i] - data[i - self.period];
            result[i] = Some(sum / n);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Raw EMA recurrence over the whole input.
///
/// Seeded with the first value: `ema[0] = data[0]`, then
/// `ema[i] = data[i] * k + ema[i-1] * (1 - k)` with `k = 2 / (span + 1)`.
pub fn ema_series(data: &[f64], span: usize) -> Vec<f64> {
    let k = 2.0 / (span as f64 + 1.0);
    let mut prev: Option<f64> = None;
    data.iter()
        .map(|&x| {
            let ema = prev.map_or(x, |p| x * k + p * (1.0 - k));
            prev = Some(ema);
            ema
        })
        .collect()
}

/// Exponential moving average, reported once `span` values have been seen.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "EMA span must be positive");
        Self { period }
    }

    /// Smoothing factor `2 / (span + 1)`.
    pub fn multiplier(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let first = self.first_index();
        ema_series(data, self.period)
            .into_iter()
            .enumerate()
            .map(|(i, ema)| (i >= first).then_some(ema))
            .collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma() {
        let sma = Sma::new(3);
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma.calculate(&data);

        assert_eq!(result.len(), 5);
        assert!(result[0].is_none());
        assert!(result[1].is_none());
        assert!((result[2].unwrap() - 2.0).abs() < 1e-10); // (1+2+3)/3
        assert!((result[3].unwrap() - 3.0).abs() < 1e-10); // (2+3+4)/3
        assert!((result[4].unwrap() - 4.0).abs() < 1e-10); // (3+4+5)/3
    }

    #[test]
    fn test_sma_insufficient_data() {
        let sma = Sma::new(5);
        let data = vec![1.0, 2.0, 3.0];
        let result = sma.calculate(&data);

        assert_eq!(result.len(), 3);
        assert!(result.iter().all(Option::is_none));
    }

    #[test]
    fn test_ema_series_seeded_with_first_value() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = ema_series(&data, 3);

        // mult = 2/(3+1) = 0.5
        assert_eq!(result.len(), 5);
        assert_eq!(result[0], 1.0);
        assert!((result[1] - 1.5).abs() < 1e-10); // 2*0.5 + 1*0.5
        assert!((result[2] - 2.25).abs() < 1e-10); // 3*0.5 + 1.5*0.5
    }

    #[test]
    fn test_ema_series_empty() {
        assert!(ema_series(&[], 12).is_empty());
    }

    #[test]
    fn test_ema_gated_by_span() {
        let ema = Ema::new(3);
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = ema.calculate(&data);

        assert!(result[0].is_none());
        assert!(result[1].is_none());
        assert!((result[2].unwrap() - 2.25).abs() < 1e-10);
        assert!((result[3].unwrap() - 3.125).abs() < 1e-10);
        assert!((ema.multiplier() - 0.5).abs() < 1e-12);
    }
}
