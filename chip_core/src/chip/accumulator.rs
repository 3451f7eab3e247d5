use serde::Serialize;

use crate::chip::price_grid::PriceGrid;
use crate::kline::bar::Bar;

const EPSILON: f64 = 1e-8;

/// Chip mass per grid edge.
///
/// Each bar first removes a turnover-sized share of every existing holding,
/// then adds a triangular density over [low, high] peaked at the bar's
/// average price. Older days therefore fade geometrically with each
/// following day's turnover.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChipDistribution {
    masses: Vec<f64>,
}

impl ChipDistribution {
    pub fn new(bin_count: usize) -> Self {
        Self {
            masses: vec![0.0; bin_count],
        }
    }

    /// Replay `bars` in order over an empty distribution.
    pub fn accumulate(grid: &PriceGrid, bars: &[Bar]) -> Self {
        let mut dist = Self::new(grid.bin_count);
        for bar in bars {
            dist.apply_bar(grid, bar);
        }
        dist
    }

    pub fn apply_bar(&mut self, grid: &PriceGrid, bar: &Bar) {
        debug_assert_eq!(self.masses.len(), grid.bin_count);

        let rate = bar.turnover_fraction();
        self.decay(rate);
        if rate == 0.0 {
            return;
        }

        let avg = bar.avg_price();
        if bar.is_flat() {
            // one-price day: the whole contribution lands on a single level
            let peak = (grid.bin_count - 1) as f64;
            let idx = grid.nearest_bin(avg);
            self.masses[idx] += peak * rate / 2.0;
            return;
        }
        if bar.high < bar.low {
            return;
        }

        let (low, high) = (bar.low, bar.high);
        let peak = 2.0 / (high - low);
        let from = grid.ceil_bin(low);
        let to = grid.floor_bin(high);
        if to < from {
            return;
        }

        for j in from..=to {
            let price = grid.edge(j);
            let shape = if price <= avg {
                if (avg - low).abs() < EPSILON {
                    1.0
                } else {
                    (price - low) / (avg - low)
                }
            } else if (high - avg).abs() < EPSILON {
                1.0
            } else {
                (high - price) / (high - avg)
            };
            self.masses[j] += shape.max(0.0) * peak * rate;
        }
    }

    fn decay(&mut self, rate: f64) {
        let keep = 1.0 - rate;
        for mass in self.masses.iter_mut() {
            *mass *= keep;
        }
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    pub fn total_mass(&self) -> f64 {
        self.masses.iter().sum()
    }
}
