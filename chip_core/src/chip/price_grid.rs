use serde::{Deserialize, Serialize};

use crate::common::{
    chip_exception::{ChipError, ErrCode},
    utils::round2,
};
use crate::kline::bar::Bar;

/// Smallest price step between two grid edges.
pub const MIN_ACCURACY: f64 = 0.01;

/// Quantized price axis covering a bar window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceGrid {
    pub min_price: f64,
    pub max_price: f64,
    pub accuracy: f64,
    pub bin_count: usize,
}

impl PriceGrid {
    pub fn new(min_price: f64, max_price: f64, bin_count: usize) -> Result<Self, ChipError> {
        if bin_count < 2 {
            return Err(ChipError::config(format!(
                "bin_count must be >= 2, got {}",
                bin_count
            )));
        }
        if !min_price.is_finite() || !max_price.is_finite() || max_price < min_price {
            return Err(ChipError::computation(
                format!("invalid price range [{}, {}]", min_price, max_price),
                ErrCode::EmptyWindow,
            ));
        }

        let accuracy = MIN_ACCURACY.max((max_price - min_price) / (bin_count - 1) as f64);
        Ok(Self {
            min_price,
            max_price,
            accuracy,
            bin_count,
        })
    }

    /// Grid spanning the lowest low to the highest high of `window`.
    pub fn from_window(window: &[Bar], bin_count: usize) -> Result<Self, ChipError> {
        if window.is_empty() {
            return Err(ChipError::computation(
                "empty bar window",
                ErrCode::EmptyWindow,
            ));
        }

        let (min_price, max_price) = window
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), bar| {
                (lo.min(bar.low), hi.max(bar.high))
            });
        Self::new(min_price, max_price, bin_count)
    }

    /// Price of edge `i`.
    pub fn edge(&self, i: usize) -> f64 {
        self.min_price + self.accuracy * i as f64
    }

    fn last_bin(&self) -> usize {
        self.bin_count - 1
    }

    fn offset(&self, price: f64) -> f64 {
        (price - self.min_price) / self.accuracy
    }

    fn clamp_bin(&self, pos: f64) -> usize {
        if pos.is_nan() || pos <= 0.0 {
            0
        } else {
            (pos as usize).min(self.last_bin())
        }
    }

    /// Bin whose edge is closest to `price`.
    pub fn nearest_bin(&self, price: f64) -> usize {
        self.clamp_bin(self.offset(price).round())
    }

    /// First bin with edge >= `price`.
    pub fn ceil_bin(&self, price: f64) -> usize {
        self.clamp_bin(self.offset(price).ceil())
    }

    /// Last bin with edge <= `price`.
    pub fn floor_bin(&self, price: f64) -> usize {
        self.clamp_bin(self.offset(price).floor())
    }

    /// Every edge rounded to cents, the y axis of a chip chart.
    pub fn price_levels(&self) -> Vec<f64> {
        (0..self.bin_count).map(|i| round2(self.edge(i))).collect()
    }
}

/// Bars feeding the grid when evaluating at `index`: the last `range` bars up to
/// and including it, or everything from the start when `range` is None.
pub fn window(bars: &[Bar], index: usize, range: Option<usize>) -> Result<&[Bar], ChipError> {
    if index >= bars.len() {
        return Err(ChipError::computation(
            format!("invalid index {} for {} bars", index, bars.len()),
            ErrCode::EmptyWindow,
        ));
    }
    let start = match range {
        Some(r) if r > 0 => (index + 1).saturating_sub(r),
        _ => 0,
    };
    Ok(&bars[start..=index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(d: u32, high: f64, low: f64) -> Bar {
        let date = NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        Bar::new(date, low, high, low, high, 1.0)
    }

    #[test]
    fn test_from_window() {
        let bars = vec![bar(2, 11.0, 10.0), bar(3, 12.49, 10.5), bar(4, 11.5, 9.0)];
        let grid = PriceGrid::from_window(&bars, 150).unwrap();
        assert_eq!(grid.min_price, 9.0);
        assert_eq!(grid.max_price, 12.49);
        assert!((grid.accuracy - 3.49 / 149.0).abs() < 1e-12);
        assert!((grid.edge(149) - 12.49).abs() < 1e-9);
    }

    #[test]
    fn test_accuracy_floor() {
        let bars = vec![bar(2, 10.0, 10.0)];
        let grid = PriceGrid::from_window(&bars, 150).unwrap();
        assert_eq!(grid.accuracy, MIN_ACCURACY);
        assert_eq!(grid.edge(0), 10.0);
        assert_eq!(grid.price_levels().len(), 150);
        assert_eq!(grid.price_levels()[3], 10.03);
    }

    #[test]
    fn test_empty_window() {
        let err = PriceGrid::from_window(&[], 150).unwrap_err();
        assert_eq!(err.errcode(), ErrCode::EmptyWindow);
        assert!(matches!(err, ChipError::Computation { .. }));
    }

    #[test]
    fn test_bin_count_too_small() {
        let bars = vec![bar(2, 11.0, 10.0)];
        assert!(matches!(
            PriceGrid::from_window(&bars, 1),
            Err(ChipError::Config(_))
        ));
    }

    #[test]
    fn test_bin_lookup() {
        let grid = PriceGrid::new(10.0, 11.0, 11).unwrap();
        assert!((grid.accuracy - 0.1).abs() < 1e-12);
        assert_eq!(grid.nearest_bin(10.04), 0);
        assert_eq!(grid.nearest_bin(10.06), 1);
        assert_eq!(grid.ceil_bin(10.05), 1);
        assert_eq!(grid.floor_bin(10.05), 0);
        assert_eq!(grid.floor_bin(50.0), 10);
        assert_eq!(grid.ceil_bin(1.0), 0);
    }

    #[test]
    fn test_window() {
        let bars: Vec<Bar> = (2..12).map(|d| bar(d, 11.0, 10.0)).collect();
        assert_eq!(window(&bars, 9, None).unwrap().len(), 10);
        assert_eq!(window(&bars, 9, Some(3)).unwrap().len(), 3);
        assert_eq!(window(&bars, 1, Some(5)).unwrap().len(), 2);
        assert_eq!(window(&bars, 4, Some(3)).unwrap()[0].date, bars[2].date);
        assert!(window(&bars, 10, None).is_err());
        assert!(window(&[], 0, None).is_err());
    }
}
