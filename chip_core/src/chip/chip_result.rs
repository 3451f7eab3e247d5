use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::chip::statistics::ChipStatistics;
use crate::common::{chip_exception::ChipError, utils::round2};

/// Chip distribution summary for one instrument on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipResult {
    pub code: String,
    pub date: NaiveDate,
    /// Share of holders in profit at the close, in [0, 1].
    pub profit_ratio: f64,
    /// Median cost by mass.
    pub avg_cost: f64,
    pub cost_90_low: f64,
    pub cost_90_high: f64,
    pub concentration_90: f64,
    pub cost_70_low: f64,
    pub cost_70_high: f64,
    pub concentration_70: f64,
}

impl ChipResult {
    pub fn from_statistics(
        code: impl Into<String>,
        date: NaiveDate,
        stats: &ChipStatistics<'_>,
        current_price: f64,
    ) -> Result<Self, ChipError> {
        let band_90 = stats.band_90()?;
        let band_70 = stats.band_70()?;
        Ok(Self {
            code: code.into(),
            date,
            profit_ratio: stats.profit_ratio(current_price),
            avg_cost: round2(stats.avg_cost()),
            cost_90_low: round2(band_90.low),
            cost_90_high: round2(band_90.high),
            concentration_90: band_90.concentration,
            cost_70_low: round2(band_70.low),
            cost_70_high: round2(band_70.high),
            concentration_70: band_70.concentration,
        })
    }

    pub fn summary(&self) -> String {
        format!(
            "{} {}: profit_ratio={:.1}%, avg_cost={:.2}, 90%=[{:.2}, {:.2}] concentration={:.2}%, 70%=[{:.2}, {:.2}] concentration={:.2}%",
            self.code,
            self.date,
            self.profit_ratio * 100.0,
            self.avg_cost,
            self.cost_90_low,
            self.cost_90_high,
            self.concentration_90 * 100.0,
            self.cost_70_low,
            self.cost_70_high,
            self.concentration_70 * 100.0,
        )
    }
}
