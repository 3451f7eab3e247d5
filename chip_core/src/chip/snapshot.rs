use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::chip::{
    accumulator::ChipDistribution, chip_result::ChipResult, price_grid::PriceGrid,
    statistics::ChipStatistics,
};
use crate::common::{chip_exception::ChipError, utils::round2};

/// One point of a chip chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChipLevel {
    pub price: f64,
    pub mass: f64,
}

/// Full distribution evaluated at one bar, kept for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChipSnapshot {
    pub date: NaiveDate,
    pub current_price: f64,
    pub grid: PriceGrid,
    pub distribution: ChipDistribution,
}

impl ChipSnapshot {
    pub fn statistics(&self) -> ChipStatistics<'_> {
        ChipStatistics::new(&self.grid, &self.distribution)
    }

    pub fn to_result(&self, code: impl Into<String>) -> Result<ChipResult, ChipError> {
        ChipResult::from_statistics(code, self.date, &self.statistics(), self.current_price)
    }

    /// Price levels paired with their mass, lowest price first.
    pub fn levels(&self) -> Vec<ChipLevel> {
        self.grid
            .price_levels()
            .into_iter()
            .zip(self.distribution.masses().iter())
            .map(|(price, &mass)| ChipLevel { price, mass })
            .collect()
    }

    pub fn peak_price(&self) -> Option<f64> {
        self.statistics().peak_price().map(round2)
    }
}
