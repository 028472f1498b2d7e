//! Best-effort CSV ingestion.
//!
//! Expected layout: an optional header starting with `date,` or `time,`, then
//! `<timestamp>,<open>,<high>,<low>,<close>[,ignored...]` per line. Bad rows are
//! logged and dropped; a file never fails as a whole.

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use crate::candle::Candle;
use crate::error::{RowError, TimestampError};
use crate::series::{CandleSeries, CandleSeriesBuilder};
use crate::timestamp::{EPOCH_FALLBACK, parse_timestamp};

const HEADER_PREFIXES: [&str; 2] = ["date,", "time,"];
const PRICE_FIELDS: [&str; 4] = ["open", "high", "low", "close"];
const MIN_FIELDS: usize = 1 + PRICE_FIELDS.len();
const ROW_BUFFER: usize = 256;

/// A row that was dropped, with its 1-indexed line number.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub line: u64,
    pub error: RowError,
}

/// A kept row whose timestamp was replaced by [`EPOCH_FALLBACK`].
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampFallback {
    pub line: u64,
    pub error: TimestampError,
}

/// The parsed series plus everything that was degraded along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    pub series: CandleSeries,
    pub skipped: Vec<SkippedRow>,
    pub timestamp_fallbacks: Vec<TimestampFallback>,
}

/// Whether the first line is a `date,`/`time,` header.
pub fn has_header(text: &str) -> bool {
    HEADER_PREFIXES.iter().any(|prefix| text.starts_with(prefix))
}

/// Parse CSV text into a series, dropping malformed rows.
pub fn parse(text: &str) -> CandleSeries {
    parse_with_report(text).series
}

/// Parse CSV text, keeping a record of skipped rows and timestamp fallbacks.
///
/// Rows are read one physical line at a time so that reported line numbers
/// count blank lines too.
pub fn parse_with_report(text: &str) -> ParseReport {
    let skip = usize::from(has_header(text));
    let mut reader_builder = ReaderBuilder::new();
    reader_builder
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .buffer_capacity(ROW_BUFFER);

    let mut builder = CandleSeriesBuilder::new();
    let mut skipped = Vec::new();
    let mut timestamp_fallbacks = Vec::new();
    let mut record = StringRecord::new();

    for (index, row) in text.lines().enumerate().skip(skip) {
        let line = index as u64 + 1;
        if row.trim().is_empty() {
            continue;
        }

        let fields = match reader_builder.from_reader(row.as_bytes()).read_record(&mut record) {
            Ok(_) => parse_fields(&record),
            Err(e) => Err(RowError::Malformed(e.to_string())),
        };

        let (raw_time, [open, high, low, close]) = match fields {
            Ok(fields) => fields,
            Err(error) => {
                match &error {
                    RowError::TooFewFields { found } => {
                        debug!(line, found, "skipping short row");
                    }
                    _ => warn!(line, error = %error, "skipping malformed row"),
                }
                skipped.push(SkippedRow { line, error });
                continue;
            }
        };

        let time = match parse_timestamp(raw_time) {
            Ok(time) => time,
            Err(error) => {
                warn!(line, raw = raw_time, error = %error, "timestamp fell back to epoch start");
                timestamp_fallbacks.push(TimestampFallback { line, error });
                EPOCH_FALLBACK
            }
        };

        builder.push(Candle::new(time, open, high, low, close));
    }

    debug!(
        candles = builder.len(),
        skipped = skipped.len(),
        fallbacks = timestamp_fallbacks.len(),
        "parsed CSV"
    );

    ParseReport {
        series: builder.build(),
        skipped,
        timestamp_fallbacks,
    }
}

/// Trailing empty fields do not count, so `1,2,3,4,` is a short row.
fn parse_fields(record: &StringRecord) -> Result<(&str, [f64; 4]), RowError> {
    let found = (0..record.len())
        .rposition(|i| !record[i].is_empty())
        .map_or(0, |last| last + 1);
    if found < MIN_FIELDS {
        return Err(RowError::TooFewFields { found });
    }

    let mut prices = [0.0; 4];
    for (i, field) in PRICE_FIELDS.iter().enumerate() {
        prices[i] = parse_price(field, &record[i + 1])?;
    }
    Ok((&record[0], prices))
}

fn parse_price(field: &'static str, value: &str) -> Result<f64, RowError> {
    let price: f64 = value.parse().map_err(|e: std::num::ParseFloatError| {
        RowError::InvalidNumber {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        }
    })?;
    if !price.is_finite() {
        return Err(RowError::NonFinite {
            field,
            value: value.to_string(),
        });
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "time,open,high,low,close\n1609459200,100,110,90,105\nbad,row\n1609462800,105,108,103,106";

    #[test]
    fn parses_sample_and_skips_bad_middle_row() {
        let series = parse(SAMPLE);
        assert_eq!(
            series.candles(),
            &[
                Candle::new(1609459200, 100.0, 110.0, 90.0, 105.0),
                Candle::new(1609462800, 105.0, 108.0, 103.0, 106.0),
            ]
        );
    }

    #[test]
    fn report_names_the_skipped_line() {
        let report = parse_with_report(SAMPLE);
        assert_eq!(
            report.skipped,
            vec![SkippedRow {
                line: 3,
                error: RowError::TooFewFields { found: 2 },
            }]
        );
        assert!(report.timestamp_fallbacks.is_empty());
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let text = "date,o,h,l,c\r\n1,1,2,0.5,1.5\r\n2,1.5,2.5,1,2\r\n";
        let series = parse(text);
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().close, 2.0);
    }

    #[test]
    fn first_line_is_data_without_known_header() {
        let text = "1,1,2,0.5,1.5\n2,1.5,2.5,1,2";
        assert_eq!(parse(text).len(), 2);
    }

    #[test]
    fn other_headers_are_treated_as_data_and_dropped() {
        let text = "timestamp,open,high,low,close\n1,1,2,0.5,1.5";
        let report = parse_with_report(text);
        assert_eq!(report.series.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, 1);
        assert!(matches!(
            report.skipped[0].error,
            RowError::InvalidNumber { field: "open", .. }
        ));
    }

    #[test]
    fn header_match_is_case_sensitive() {
        assert!(has_header("date,open"));
        assert!(has_header("time,open"));
        assert!(!has_header("Date,open"));
        assert!(!has_header(" time,open"));
        assert!(!has_header(""));
    }

    #[test]
    fn fields_are_trimmed() {
        let series = parse(" 10 , 1.5 ,\t2.5, 1 , 2 \n");
        assert_eq!(series.candles(), &[Candle::new(10, 1.5, 2.5, 1.0, 2.0)]);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let series = parse("10,1,2,0.5,1.5,12345,extra");
        assert_eq!(series.candles(), &[Candle::new(10, 1.0, 2.0, 0.5, 1.5)]);
    }

    #[test]
    fn non_numeric_price_drops_row() {
        let report = parse_with_report("time,o,h,l,c\n1,1,x,0.5,1.5\n2,1,2,0.5,1.5");
        assert_eq!(report.series.len(), 1);
        assert_eq!(report.series.first().unwrap().time, 2);
        assert_eq!(report.skipped[0].line, 2);
        assert!(matches!(
            &report.skipped[0].error,
            RowError::InvalidNumber { field: "high", value, .. } if value == "x"
        ));
    }

    #[test]
    fn non_finite_price_drops_row() {
        let report = parse_with_report("1,NaN,2,0.5,1.5\n2,1,inf,0.5,1.5");
        assert!(report.series.is_empty());
        assert!(matches!(
            report.skipped[0].error,
            RowError::NonFinite { field: "open", .. }
        ));
        assert!(matches!(
            report.skipped[1].error,
            RowError::NonFinite { field: "high", .. }
        ));
    }

    #[test]
    fn bad_timestamp_keeps_row_at_epoch_zero() {
        let report = parse_with_report("time,o,h,l,c\nyesterday,1,2,0.5,1.5");
        assert_eq!(report.series.candles(), &[Candle::new(0, 1.0, 2.0, 0.5, 1.5)]);
        assert_eq!(report.timestamp_fallbacks.len(), 1);
        assert_eq!(report.timestamp_fallbacks[0].line, 2);
    }

    #[test]
    fn iso_timestamps_are_normalized() {
        let series = parse("date,o,h,l,c\n2021-01-01T00:00:00.123456789,1,2,0.5,1.5");
        assert_eq!(series.first().unwrap().time, 1609459200);
    }

    #[test]
    fn empty_inputs_yield_empty_series() {
        for text in ["", "time,open,high,low,close", "time,open,high,low,close\n", "\n\n"] {
            let report = parse_with_report(text);
            assert!(report.series.is_empty(), "{text:?}");
            assert!(report.skipped.is_empty(), "{text:?}");
        }
    }

    #[test]
    fn blank_lines_count_toward_line_numbers() {
        let report = parse_with_report("time,o,h,l,c\n\n\r\n1,1,2,0.5,1.5\n2,x,2,0.5,1.5");
        assert_eq!(report.series.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, 5);
    }

    #[test]
    fn malformed_rows_interleaved_keep_valid_order() {
        let valid = ["1,1,2,0.5,1.5", "2,1,2,0.5,1.5", "3,1,2,0.5,1.5", "4,1,2,0.5,1.5"];
        let malformed = ["x", "5,1,2", "6,a,b,c,d", "7,1,2,0.5,"];
        let mut lines = Vec::new();
        for (v, m) in valid.iter().zip(malformed.iter()) {
            lines.push(*m);
            lines.push(*v);
        }
        let report = parse_with_report(&lines.join("\n"));
        let times: Vec<i64> = report.series.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![1, 2, 3, 4]);
        assert_eq!(report.skipped.len(), malformed.len());
        let skipped_lines: Vec<u64> = report.skipped.iter().map(|s| s.line).collect();
        assert_eq!(skipped_lines, vec![1, 3, 5, 7]);
    }

    #[test]
    fn trailing_empty_fields_make_a_short_row() {
        let report = parse_with_report("1,1,2,0.5,\n2,1,2,,,\n3,1,2,0.5,1.5,,");
        assert_eq!(report.series.candles(), &[Candle::new(3, 1.0, 2.0, 0.5, 1.5)]);
        assert_eq!(
            report.skipped,
            vec![
                SkippedRow {
                    line: 1,
                    error: RowError::TooFewFields { found: 4 },
                },
                SkippedRow {
                    line: 2,
                    error: RowError::TooFewFields { found: 3 },
                },
            ]
        );
    }

    #[test]
    fn interior_empty_field_is_an_invalid_number() {
        let report = parse_with_report("1,,2,0.5,1.5");
        assert!(report.series.is_empty());
        assert!(matches!(
            &report.skipped[0].error,
            RowError::InvalidNumber { field: "open", value, .. } if value.is_empty()
        ));
    }

    #[test]
    fn quotes_are_plain_characters() {
        let report = parse_with_report("\"1\",1,2,0.5,1.5\n2,\"1,5\",2,0.5,1.5");
        assert!(report.series.candles().iter().all(|c| c.time != 1));
        assert_eq!(report.timestamp_fallbacks.len(), 1);
        assert_eq!(report.timestamp_fallbacks[0].line, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, 2);
        assert!(matches!(
            &report.skipped[0].error,
            RowError::InvalidNumber { field: "open", value, .. } if value == "\"1"
        ));
    }

    #[test]
    fn whitespace_only_lines_are_blank() {
        let report = parse_with_report("time,o,h,l,c\n   \n\t\n1,1,2,0.5,1.5");
        assert_eq!(report.series.len(), 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn parsing_is_deterministic() {
        assert_eq!(parse_with_report(SAMPLE), parse_with_report(SAMPLE));
    }

    #[test]
    fn rows_are_not_sorted() {
        let series = parse("3,1,2,0.5,1.5\n1,1,2,0.5,1.5\n2,1,2,0.5,1.5");
        let times: Vec<i64> = series.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![3, 1, 2]);
    }
}
