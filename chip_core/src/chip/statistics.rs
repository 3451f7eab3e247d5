use serde::{Deserialize, Serialize};

use crate::chip::{accumulator::ChipDistribution, price_grid::PriceGrid};
use crate::common::chip_exception::{ChipError, ErrCode};

/// Price band holding a given share of the chip mass, centred on the median.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBand {
    pub low: f64,
    pub high: f64,
    /// (high - low) / (high + low); 0 when both ends are 0.
    /// A band whose upper target is never reached has `high == 0`.
    pub concentration: f64,
}

impl CostBand {
    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// Read-only reductions over a finished distribution.
#[derive(Debug, Clone, Copy)]
pub struct ChipStatistics<'a> {
    grid: &'a PriceGrid,
    distribution: &'a ChipDistribution,
    total_mass: f64,
}

impl<'a> ChipStatistics<'a> {
    pub fn new(grid: &'a PriceGrid, distribution: &'a ChipDistribution) -> Self {
        Self {
            grid,
            distribution,
            total_mass: distribution.total_mass(),
        }
    }

    pub fn total_mass(&self) -> f64 {
        self.total_mass
    }

    /// Edge price of the first bin at which the running mass exceeds `target`,
    /// or 0 when the running mass never gets there.
    pub fn cost_at_cumulative(&self, target: f64) -> f64 {
        let mut sum = 0.0;
        for (i, &mass) in self.distribution.masses().iter().enumerate() {
            if sum + mass > target {
                return self.grid.edge(i);
            }
            sum += mass;
        }
        0.0
    }

    /// Median cost by mass. Reported as "avg_cost" for historical reasons.
    pub fn avg_cost(&self) -> f64 {
        self.cost_at_cumulative(self.total_mass * 0.5)
    }

    /// Share of the mass priced at or below `price`.
    pub fn profit_ratio(&self, price: f64) -> f64 {
        if self.total_mass <= 0.0 {
            return 0.0;
        }
        let below: f64 = self
            .distribution
            .masses()
            .iter()
            .enumerate()
            .filter(|(i, _)| price >= self.grid.edge(*i))
            .map(|(_, m)| *m)
            .sum();
        (below / self.total_mass).clamp(0.0, 1.0)
    }

    pub fn percentile_band(&self, percent: f64) -> Result<CostBand, ChipError> {
        if !(percent > 0.0 && percent <= 1.0) {
            return Err(ChipError::validation(
                format!("argument \"percent\" out of range (0, 1]: {}", percent),
                ErrCode::ParaError,
            ));
        }

        let low = self.cost_at_cumulative(self.total_mass * (1.0 - percent) / 2.0);
        let high = self.cost_at_cumulative(self.total_mass * (1.0 + percent) / 2.0);
        let concentration = if low + high == 0.0 {
            0.0
        } else {
            (high - low) / (high + low)
        };
        Ok(CostBand {
            low,
            high,
            concentration,
        })
    }

    pub fn band_90(&self) -> Result<CostBand, ChipError> {
        self.percentile_band(0.9)
    }

    pub fn band_70(&self) -> Result<CostBand, ChipError> {
        self.percentile_band(0.7)
    }

    /// Level holding the most mass, None when the distribution is empty.
    pub fn peak_price(&self) -> Option<f64> {
        self.distribution
            .masses()
            .iter()
            .enumerate()
            .filter(|(_, m)| **m > 0.0)
            .fold(None, |best: Option<(usize, f64)>, (i, &m)| match best {
                Some((_, bm)) if bm >= m => best,
                _ => Some((i, m)),
            })
            .map(|(i, _)| self.grid.edge(i))
    }
}
