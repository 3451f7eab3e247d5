use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::common::{
    chip_exception::{ChipError, ErrCode},
    utils::clamp_or_low,
};

/// Turnover rate (percent) assumed when a source does not provide one.
pub const DEFAULT_TURNOVER_RATE: f64 = 1.0;

/// One daily bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Percent of tradable shares exchanged that day, 5.2 means 5.2%.
    #[serde(default = "default_turnover_rate")]
    pub turnover_rate: f64,
}

fn default_turnover_rate() -> f64 {
    DEFAULT_TURNOVER_RATE
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, turnover_rate: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            turnover_rate,
        }
    }

    /// Typical price of the day, the peak of its triangular contribution.
    pub fn avg_price(&self) -> f64 {
        (self.open + self.close + self.high + self.low) / 4.0
    }

    /// Turnover as a fraction in [0, 1]; anything unusable counts as no turnover.
    pub fn turnover_fraction(&self) -> f64 {
        clamp_or_low(self.turnover_rate / 100.0, 0.0, 1.0)
    }

    /// Limit-board style bar with no intraday range.
    pub fn is_flat(&self) -> bool {
        self.high == self.low
    }

    pub fn check(&mut self, autofix: bool) -> Result<(), ChipError> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(ChipError::validation(
                format!(
                    "{} non-finite price in [open={}, high={}, low={}, close={}]",
                    self.date, self.open, self.high, self.low, self.close
                ),
                ErrCode::KlDataInvalid,
            ));
        }
        if prices.iter().any(|p| *p < 0.0) {
            return Err(ChipError::validation(
                format!(
                    "{} negative price in [open={}, high={}, low={}, close={}]",
                    self.date, self.open, self.high, self.low, self.close
                ),
                ErrCode::PriceBelowZero,
            ));
        }

        let min_price = self.low.min(self.open).min(self.high).min(self.close);
        let max_price = self.low.max(self.open).max(self.high).max(self.close);

        if self.low > min_price {
            if autofix {
                self.low = min_price;
            } else {
                return Err(ChipError::validation(
                    format!(
                        "{} low price={} is not min of [low={}, open={}, high={}, close={}]",
                        self.date, self.low, self.low, self.open, self.high, self.close
                    ),
                    ErrCode::KlDataInvalid,
                ));
            }
        }

        if self.high < max_price {
            if autofix {
                self.high = max_price;
            } else {
                return Err(ChipError::validation(
                    format!(
                        "{} high price={} is not max of [low={}, open={}, high={}, close={}]",
                        self.date, self.high, self.low, self.open, self.high, self.close
                    ),
                    ErrCode::KlDataInvalid,
                ));
            }
        }
        Ok(())
    }
}
