//! Daily series preparation: normalization, gap-filling and range slicing.

use chrono::{Duration, NaiveDate};
use marketlens_core::error::InvalidRecordError;
use marketlens_core::types::{ChartRange, EnrichedBar, PriceBar, RawQuote};
use tracing::{debug, warn};

/// Anything positioned on the exchange calendar.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for PriceBar {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for EnrichedBar {
    fn date(&self) -> NaiveDate {
        self.bar.date
    }
}

/// Convert upstream records into bars.
///
/// Records whose date or prices cannot be parsed are returned in the
/// second list instead of aborting the batch.
pub fn normalize(records: &[RawQuote]) -> (Vec<PriceBar>, Vec<InvalidRecordError>) {
    let mut bars = Vec::with_capacity(records.len());
    let mut invalid = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match record.to_price_bar() {
            Ok(bar) => bars.push(bar),
            Err(reason) => {
                invalid.push(InvalidRecordError::new(index, record.code.clone(), reason))
            }
        }
    }

    if !invalid.is_empty() {
        warn!(
            skipped = invalid.len(),
            total = records.len(),
            "Skipped unparseable quote records"
        );
    }

    (bars, invalid)
}

/// Sort bars by day and fill every missing calendar day.
///
/// A missing day gets a flat-carry bar from the previous day's close with
/// zero volume. When a day appears more than once the last occurrence wins.
pub fn gap_fill(bars: &[PriceBar]) -> Vec<PriceBar> {
    let mut sorted: Vec<&PriceBar> = bars.iter().collect();
    sorted.sort_by_key(|b| b.date);

    let mut result: Vec<PriceBar> = Vec::with_capacity(sorted.len());
    let mut filled = 0usize;

    for bar in sorted {
        if let Some(prev) = result.last_mut() {
            if prev.date == bar.date {
                *prev = bar.clone();
                continue;
            }
            let prev = prev.clone();
            let mut day = prev.date + Duration::days(1);
            while day < bar.date {
                result.push(prev.flat_carry(day));
                filled += 1;
                day += Duration::days(1);
            }
        }
        result.push(bar.clone());
    }

    if filled > 0 {
        debug!(filled, total = result.len(), "Gap-filled daily series");
    }

    result
}

/// Trailing window of an ascending series, ending at its last bar.
///
/// The window start is inclusive.
pub fn slice_range<T: Dated>(series: &[T], range: ChartRange) -> &[T] {
    let Some(last) = series.last() else {
        return series;
    };
    let start = range.start_from(last.date());
    let first = series.partition_point(|b| b.date() < start);
    &series[first..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bar(date: NaiveDate, close: f64) -> PriceBar {
        PriceBar::new("7203", date, close, close + 1.0, close - 1.0, close, 1_000)
    }

    #[test]
    fn test_gap_fill_scenario() {
        let bars = vec![
            bar(ymd(2024, 1, 5), 110.0),
            bar(ymd(2024, 1, 1), 100.0),
            bar(ymd(2024, 1, 2), 102.0),
        ];

        let filled = gap_fill(&bars);
        assert_eq!(filled.len(), 5);
        for (i, b) in filled.iter().enumerate() {
            assert_eq!(b.date, ymd(2024, 1, 1 + i as u32));
        }

        for b in &filled[2..4] {
            assert_eq!(b.close, 102.0);
            assert_eq!(b.open, 102.0);
            assert_eq!(b.volume, 0);
            assert_eq!(b.code, "7203");
        }
        assert_eq!(filled[4].close, 110.0);
    }

    #[test]
    fn test_gap_fill_empty_and_single() {
        assert!(gap_fill(&[]).is_empty());
        let single = gap_fill(&[bar(ymd(2024, 1, 1), 100.0)]);
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_gap_fill_duplicate_day_keeps_last() {
        let bars = vec![bar(ymd(2024, 1, 1), 100.0), bar(ymd(2024, 1, 1), 101.0)];
        let filled = gap_fill(&bars);
        assert_eq!(filled.len(), 1);
        assert_eq!(filled[0].close, 101.0);
    }

    #[test]
    fn test_normalize_reports_bad_dates() {
        let records = vec![
            RawQuote::new("2024-01-01", "7203", 100.0, 101.0, 99.0, 100.0, 10.0),
            RawQuote::new("01/02/24??", "7203", 100.0, 101.0, 99.0, 100.0, 10.0),
            RawQuote::new("20240103", "7203", 100.0, 101.0, 99.0, 100.0, 10.0),
        ];

        let (bars, invalid) = normalize(&records);
        assert_eq!(bars.len(), 2);
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].index, 1);
        assert!(invalid[0].reasons[0].contains("unparseable date"));
    }

    #[test]
    fn test_slice_range() {
        let bars: Vec<PriceBar> = (0..100)
            .map(|i| bar(ymd(2024, 1, 1) + Duration::days(i), 100.0))
            .collect();
        // Last bar is 2024-04-09
        let sliced = slice_range(&bars, ChartRange::OneMonth);
        assert_eq!(sliced.first().unwrap().date, ymd(2024, 3, 9));
        assert_eq!(sliced.last().unwrap().date, ymd(2024, 4, 9));

        let all = slice_range(&bars, ChartRange::FiveYears);
        assert_eq!(all.len(), 100);

        let empty: Vec<PriceBar> = Vec::new();
        assert!(slice_range(&empty, ChartRange::OneYear).is_empty());
    }
}
