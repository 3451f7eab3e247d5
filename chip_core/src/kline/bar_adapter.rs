use std::io::Read;

use tracing::{debug, warn};

use crate::common::{
    chip_exception::{ChipError, ErrCode},
    time::parse_bar_date,
    utils::parse_number,
};
use crate::kline::{
    bar::{Bar, DEFAULT_TURNOVER_RATE},
    column_map::{Column, ColumnMap},
};

/// A row of raw string cells, addressed by header position.
pub trait RawRecord {
    fn cell(&self, idx: usize) -> Option<&str>;
}

impl RawRecord for csv::StringRecord {
    fn cell(&self, idx: usize) -> Option<&str> {
        self.get(idx)
    }
}

impl RawRecord for Vec<String> {
    fn cell(&self, idx: usize) -> Option<&str> {
        self.get(idx).map(String::as_str)
    }
}

impl RawRecord for Vec<&str> {
    fn cell(&self, idx: usize) -> Option<&str> {
        self.get(idx).copied()
    }
}

impl<R: RawRecord + ?Sized> RawRecord for &R {
    fn cell(&self, idx: usize) -> Option<&str> {
        (**self).cell(idx)
    }
}

/// Bookkeeping from one normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub total_rows: usize,
    pub dropped_rows: usize,
    pub duplicate_dates: usize,
    /// The source had no turnover column and every bar got the default.
    pub turnover_defaulted: bool,
}

/// Turns raw tabular rows into checked, date-ordered bars.
#[derive(Debug, Clone)]
pub struct BarAdapter {
    autofix: bool,
}

impl Default for BarAdapter {
    fn default() -> Self {
        Self { autofix: true }
    }
}

impl BarAdapter {
    pub fn new(autofix: bool) -> Self {
        Self { autofix }
    }

    pub fn normalize<S, I, R>(
        &self,
        headers: &[S],
        rows: I,
    ) -> Result<(Vec<Bar>, NormalizeReport), ChipError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = R>,
        R: RawRecord,
    {
        let columns = ColumnMap::from_headers(headers)?;
        let mut report = NormalizeReport {
            turnover_defaulted: !columns.has(Column::TurnoverRate),
            ..Default::default()
        };
        if report.turnover_defaulted {
            warn!(
                "no turnover column found, using default {}%",
                DEFAULT_TURNOVER_RATE
            );
        }

        let mut bars = Vec::new();
        for (row_idx, row) in rows.into_iter().enumerate() {
            report.total_rows += 1;
            match self.parse_row(&columns, &row) {
                Ok(bar) => bars.push(bar),
                Err(e) => {
                    report.dropped_rows += 1;
                    debug!("dropping row {}: {}", row_idx, e);
                }
            }
        }

        // stable sort keeps source order among equal dates, so the last one survives
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => {
                    *last = bar;
                    report.duplicate_dates += 1;
                }
                _ => deduped.push(bar),
            }
        }

        Ok((deduped, report))
    }

    /// Checked copies of bars built by the caller rather than parsed here.
    pub fn check_bars(&self, bars: &[Bar]) -> Result<Vec<Bar>, ChipError> {
        bars.iter()
            .cloned()
            .map(|mut bar| bar.check(self.autofix).map(|_| bar))
            .collect()
    }

    /// Read a headed CSV stream.
    pub fn read_csv<R: Read>(&self, reader: R) -> Result<(Vec<Bar>, NormalizeReport), ChipError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let records = rdr.records().collect::<Result<Vec<_>, _>>()?;
        self.normalize(&headers, records)
    }

    fn parse_row<R: RawRecord>(&self, columns: &ColumnMap, row: &R) -> Result<Bar, ChipError> {
        let text = |column: Column| columns.position(column).and_then(|idx| row.cell(idx));
        let number = |column: Column| -> Result<f64, ChipError> {
            text(column).and_then(parse_number).ok_or_else(|| {
                ChipError::validation(
                    format!("{} is missing or not numeric", column),
                    ErrCode::SrcDataFormatError,
                )
            })
        };

        let date = text(Column::Date).and_then(parse_bar_date).ok_or_else(|| {
            ChipError::validation(
                format!("unparseable date {:?}", text(Column::Date)),
                ErrCode::SrcDataFormatError,
            )
        })?;
        let turnover_rate = text(Column::TurnoverRate)
            .and_then(parse_number)
            .unwrap_or(DEFAULT_TURNOVER_RATE);

        let mut bar = Bar::new(
            date,
            number(Column::Open)?,
            number(Column::High)?,
            number(Column::Low)?,
            number(Column::Close)?,
            turnover_rate,
        );
        bar.check(self.autofix)?;
        Ok(bar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_aliases_and_order() {
        let headers = ["日期", "开盘", "收盘", "最高", "最低", "换手率"];
        let rows = vec![
            row(&["2024-01-03", "10.2", "10.4", "10.5", "10.1", "2.5"]),
            row(&["2024-01-02", "10.0", "10.2", "10.3", "9.9", "3.0"]),
        ];
        let (bars, report) = BarAdapter::default().normalize(&headers, rows).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].close, 10.2);
        assert_eq!(bars[1].turnover_rate, 2.5);
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.dropped_rows, 0);
        assert!(!report.turnover_defaulted);
    }

    #[test]
    fn test_missing_turnover_column_defaults() {
        let headers = ["date", "open", "close", "high", "low"];
        let rows = vec![row(&["2024-01-02", "1", "1.1", "1.2", "0.9"])];
        let (bars, report) = BarAdapter::default().normalize(&headers, rows).unwrap();
        assert_eq!(bars[0].turnover_rate, DEFAULT_TURNOVER_RATE);
        assert!(report.turnover_defaulted);
    }

    #[test]
    fn test_empty_turnover_cell_defaults() {
        let headers = ["date", "open", "close", "high", "low", "hsl"];
        let rows = vec![row(&["2024-01-02", "1", "1.1", "1.2", "0.9", ""])];
        let (bars, _) = BarAdapter::default().normalize(&headers, rows).unwrap();
        assert_eq!(bars[0].turnover_rate, DEFAULT_TURNOVER_RATE);
    }

    #[test]
    fn test_bad_rows_dropped() {
        let headers = ["date", "open", "close", "high", "low"];
        let rows = vec![
            row(&["2024-01-02", "1", "1.1", "1.2", "0.9"]),
            row(&["garbage", "1", "1.1", "1.2", "0.9"]),
            row(&["2024-01-04", "1", "", "1.2", "0.9"]),
            row(&["2024-01-05", "1"]),
        ];
        let (bars, report) = BarAdapter::default().normalize(&headers, rows).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(report.dropped_rows, 3);
    }

    #[test]
    fn test_inconsistent_bar_dropped_without_autofix() {
        let headers = ["date", "open", "close", "high", "low"];
        let rows = vec![row(&["2024-01-02", "1", "1.5", "1.2", "0.9"])];
        let (bars, report) = BarAdapter::new(false).normalize(&headers, rows.clone()).unwrap();
        assert!(bars.is_empty());
        assert_eq!(report.dropped_rows, 1);

        let (bars, _) = BarAdapter::new(true).normalize(&headers, rows).unwrap();
        assert_eq!(bars[0].high, 1.5);
    }

    #[test]
    fn test_check_bars() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = vec![Bar::new(date, 1.0, 1.2, 0.9, 1.5, 2.0)];
        let fixed = BarAdapter::new(true).check_bars(&bars).unwrap();
        assert_eq!(fixed[0].high, 1.5);
        assert_eq!(bars[0].high, 1.2);
        assert!(BarAdapter::new(false).check_bars(&bars).is_err());

        let negative = vec![Bar::new(date, -1.0, 1.2, 0.9, 1.0, 2.0)];
        let err = BarAdapter::default().check_bars(&negative).unwrap_err();
        assert_eq!(err.errcode(), ErrCode::PriceBelowZero);
    }

    #[test]
    fn test_duplicate_dates_keep_last() {
        let headers = ["date", "open", "close", "high", "low"];
        let rows = vec![
            row(&["2024-01-02", "1", "1.1", "1.2", "0.9"]),
            row(&["2024-01-02", "2", "2.1", "2.2", "1.9"]),
        ];
        let (bars, report) = BarAdapter::default().normalize(&headers, rows).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].open, 2.0);
        assert_eq!(report.duplicate_dates, 1);
    }

    #[test]
    fn test_missing_close_column_is_error() {
        let headers = ["date", "open", "high", "low"];
        let rows: Vec<Vec<String>> = vec![];
        assert!(BarAdapter::default().normalize(&headers, rows).is_err());
    }

    #[test]
    fn test_read_csv() {
        let data = "date,open,high,low,close,volume,turnover_rate\n\
                    2024-01-02,10.0,10.5,9.8,10.2,1000,1.5\n\
                    2024-01-03,10.2,10.6,10.0,10.4,1200,2.0\n";
        let (bars, report) = BarAdapter::default().read_csv(data.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].high, 10.6);
        assert_eq!(bars[1].turnover_rate, 2.0);
        assert_eq!(report.total_rows, 2);
    }
}
