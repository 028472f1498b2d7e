use std::fmt;

use serde::{Deserialize, Serialize};

/// A single OHLC candle keyed by epoch seconds (UTC).
///
/// Field order is the wire order the renderer expects: `time`, `open`, `high`, `low`, `close`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
        }
    }

    /// True when `high` bounds the body from above and `low` from below.
    pub fn is_consistent(&self) -> bool {
        self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close)
    }
}

impl fmt::Display for Candle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Candle{{time={}, open={:.2}, high={:.2}, low={:.2}, close={:.2}}}",
            self.time, self.open, self.high, self.low, self.close
        )
    }
}
