use std::slice;

use serde::Serialize;

use crate::candle::Candle;

/// An ordered, read-only sequence of candles.
///
/// Candles are kept in insertion (file) order. Nothing here sorts or
/// de-duplicates; see [`CandleSeries::sorted_by_time`] for an explicit opt-in.
/// Serializes as a bare JSON array, `[]` when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Earliest and latest `time` in the series, or None if empty.
    pub fn time_range(&self) -> Option<(i64, i64)> {
        let min = self.candles.iter().map(|c| c.time).min()?;
        let max = self.candles.iter().map(|c| c.time).max()?;
        Some((min, max))
    }

    /// True when times never decrease from one candle to the next.
    pub fn is_time_ordered(&self) -> bool {
        self.candles.windows(2).all(|w| w[0].time <= w[1].time)
    }

    /// Index of the first candle whose time is earlier than its predecessor's.
    pub fn first_out_of_order(&self) -> Option<usize> {
        self.candles
            .windows(2)
            .position(|w| w[1].time < w[0].time)
            .map(|i| i + 1)
    }

    /// A copy sorted ascending by time. Equal times keep their file order.
    pub fn sorted_by_time(&self) -> Self {
        let mut candles = self.candles.clone();
        candles.sort_by_key(|c| c.time);
        Self { candles }
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

impl From<Vec<Candle>> for CandleSeries {
    fn from(candles: Vec<Candle>) -> Self {
        Self { candles }
    }
}

/// Accumulates candles during a parse; [`build`](Self::build) freezes the result.
#[derive(Debug, Default)]
pub struct CandleSeriesBuilder {
    candles: Vec<Candle>,
}

impl CandleSeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, candle: Candle) {
        self.candles.push(candle);
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn build(self) -> CandleSeries {
        CandleSeries {
            candles: self.candles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(time: i64) -> Candle {
        Candle::new(time, 100.0, 110.0, 90.0, 105.0)
    }

    #[test]
    fn builder_preserves_insertion_order() {
        let mut builder = CandleSeriesBuilder::new();
        for t in [30, 10, 20] {
            builder.push(candle(t));
        }
        assert_eq!(builder.len(), 3);
        let series = builder.build();
        let times: Vec<i64> = series.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![30, 10, 20]);
    }

    #[test]
    fn empty_series_serializes_to_empty_array() {
        let series = CandleSeries::empty();
        assert!(series.is_empty());
        assert_eq!(serde_json::to_string(&series).unwrap(), "[]");
        assert_eq!(series.time_range(), None);
        assert!(series.is_time_ordered());
    }

    #[test]
    fn time_range_ignores_order() {
        let series = CandleSeries::from(vec![candle(50), candle(10), candle(30)]);
        assert_eq!(series.time_range(), Some((10, 50)));
    }

    #[test]
    fn detects_out_of_order_rows() {
        let ordered = CandleSeries::from(vec![candle(1), candle(1), candle(2)]);
        assert!(ordered.is_time_ordered());
        assert_eq!(ordered.first_out_of_order(), None);

        let shuffled = CandleSeries::from(vec![candle(1), candle(3), candle(2)]);
        assert!(!shuffled.is_time_ordered());
        assert_eq!(shuffled.first_out_of_order(), Some(2));
    }

    #[test]
    fn sorted_copy_is_stable_and_leaves_original() {
        let mut first_dup = candle(5);
        first_dup.close = 1.0;
        let mut second_dup = candle(5);
        second_dup.close = 2.0;
        let series = CandleSeries::from(vec![first_dup, candle(1), second_dup]);

        let sorted = series.sorted_by_time();
        assert_eq!(sorted.candles()[0].time, 1);
        assert_eq!(sorted.candles()[1].close, 1.0);
        assert_eq!(sorted.candles()[2].close, 2.0);
        assert_eq!(series.first().unwrap().time, 5);
    }

    #[test]
    fn first_and_last() {
        let series = CandleSeries::from(vec![candle(1), candle(2)]);
        assert_eq!(series.first().unwrap().time, 1);
        assert_eq!(series.last().unwrap().time, 2);
        assert_eq!((&series).into_iter().count(), 2);
    }
}
