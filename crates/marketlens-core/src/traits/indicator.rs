//! Indicator traits.
//!
//! Every indicator returns a vector aligned with its input: slot `i` belongs
//! to input `i`, and stays `None` until the lookback window has filled.

use crate::types::PriceBar;

/// Indicator over a series of closes.
pub trait Indicator: Send + Sync {
    type Output;

    fn calculate(&self, data: &[f64]) -> Vec<Option<Self::Output>>;

    /// Inputs consumed before the first `Some`.
    fn period(&self) -> usize;

    fn name(&self) -> &str;

    /// Index of the first populated slot.
    fn first_index(&self) -> usize {
        self.period().saturating_sub(1)
    }
}

/// Indicator producing several related lines per bar (MACD, Bollinger).
pub trait MultiOutputIndicator: Send + Sync {
    type Outputs;

    fn calculate(&self, data: &[f64]) -> Vec<Option<Self::Outputs>>;

    fn period(&self) -> usize;

    fn name(&self) -> &str;
}

/// Indicator reading high, low and close from whole bars.
pub trait OhlcvIndicator: Send + Sync {
    type Output;

    fn calculate(&self, bars: &[PriceBar]) -> Vec<Option<Self::Output>>;

    fn period(&self) -> usize;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TrailingSum(usize);

    impl Indicator for TrailingSum {
        type Output = f64;

        fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
            (0..data.len())
                .map(|i| (i + 1 >= self.0).then(|| data[i + 1 - self.0..=i].iter().sum()))
                .collect()
        }

        fn period(&self) -> usize {
            self.0
        }

        fn name(&self) -> &str {
            "sum"
        }
    }

    #[test]
    fn test_output_aligned_with_input() {
        let sum = TrailingSum(3);
        let result = sum.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(result.len(), 5);
        assert_eq!(result[..sum.first_index()], [None, None]);
        assert_eq!(result[2], Some(6.0));
        assert_eq!(result[4], Some(12.0));
    }

    #[test]
    fn test_first_index_of_zero_period() {
        assert_eq!(TrailingSum(0).first_index(), 0);
        assert_eq!(TrailingSum(1).first_index(), 0);
    }
}
