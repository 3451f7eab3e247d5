use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::calculator::data_fetcher::DataFetcher;
use crate::chip::{
    accumulator::ChipDistribution,
    chip_result::ChipResult,
    price_grid::{self, PriceGrid},
    snapshot::ChipSnapshot,
};
use crate::common::chip_exception::{ChipError, ErrCode};
use crate::config::chip_config::ChipConfig;
use crate::kline::{
    bar::Bar,
    bar_adapter::{BarAdapter, RawRecord},
};

/// Per-symbol outcomes of a batch run, in request order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub entries: Vec<(String, Option<ChipResult>)>,
    pub errors: Vec<(String, ChipError)>,
}

impl BatchOutcome {
    pub fn get(&self, code: &str) -> Option<&ChipResult> {
        self.entries
            .iter()
            .find(|(c, _)| c == code)
            .and_then(|(_, r)| r.as_ref())
    }

    pub fn error(&self, code: &str) -> Option<&ChipError> {
        self.errors.iter().find(|(c, _)| c == code).map(|(_, e)| e)
    }

    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|(_, r)| r.is_some()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Turns bar history into chip results.
///
/// Every call builds its own grid and distribution; the calculator holds
/// only configuration and the injected fetcher, so it can be shared across
/// threads.
pub struct ChipCalculator {
    config: ChipConfig,
    adapter: BarAdapter,
    fetcher: Option<Arc<dyn DataFetcher>>,
}

impl ChipCalculator {
    pub fn new(config: ChipConfig, fetcher: Arc<dyn DataFetcher>) -> Result<Self, ChipError> {
        Self::build(config, Some(fetcher))
    }

    /// Calculator for caller-supplied bars only; by-code calls fail with a config error.
    pub fn offline(config: ChipConfig) -> Result<Self, ChipError> {
        Self::build(config, None)
    }

    fn build(config: ChipConfig, fetcher: Option<Arc<dyn DataFetcher>>) -> Result<Self, ChipError> {
        config.validate()?;
        Ok(Self {
            adapter: BarAdapter::new(config.autofix),
            config,
            fetcher,
        })
    }

    pub fn config(&self) -> &ChipConfig {
        &self.config
    }

    /// Chip result at the last bar of `bars`, which must be date-ordered.
    pub fn calculate(&self, code: &str, bars: &[Bar]) -> Result<ChipResult, ChipError> {
        if bars.len() < self.config.min_bars {
            warn!(
                "{}: {} bars, need at least {}",
                code,
                bars.len(),
                self.config.min_bars
            );
            return Err(ChipError::InsufficientData {
                required: self.config.min_bars,
                actual: bars.len(),
            });
        }

        let recent = self.trim(bars);
        if recent.len() < bars.len() {
            debug!("{}: using last {} of {} bars", code, recent.len(), bars.len());
        }

        let result = self.calculate_at(code, recent, recent.len() - 1)?;
        info!("{}", result.summary());
        Ok(result)
    }

    /// Normalize raw rows, then `calculate`.
    pub fn calculate_records<S, I, R>(
        &self,
        code: &str,
        headers: &[S],
        rows: I,
    ) -> Result<ChipResult, ChipError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = R>,
        R: RawRecord,
    {
        let (bars, report) = self.adapter.normalize(headers, rows)?;
        if report.dropped_rows > 0 {
            debug!(
                "{}: dropped {} of {} rows",
                code, report.dropped_rows, report.total_rows
            );
        }
        self.calculate(code, &bars)
    }

    /// Chip result evaluated at `bars[index]`, without the minimum-history rule.
    pub fn calculate_at(&self, code: &str, bars: &[Bar], index: usize) -> Result<ChipResult, ChipError> {
        self.snapshot_at(bars, index)?.to_result(code)
    }

    pub fn snapshot_at(&self, bars: &[Bar], index: usize) -> Result<ChipSnapshot, ChipError> {
        let window = self
            .adapter
            .check_bars(price_grid::window(bars, index, self.config.range)?)?;
        let grid = PriceGrid::from_window(&window, self.config.bin_count)?;
        let distribution = ChipDistribution::accumulate(&grid, &window);
        let target = window
            .last()
            .ok_or_else(|| ChipError::computation("no bars", ErrCode::EmptyWindow))?;
        Ok(ChipSnapshot {
            date: target.date,
            current_price: target.close,
            grid,
            distribution,
        })
    }

    /// Snapshot at the last bar after the same trimming `calculate` applies.
    pub fn snapshot(&self, bars: &[Bar]) -> Result<ChipSnapshot, ChipError> {
        let recent = self.trim(bars);
        if recent.is_empty() {
            return Err(ChipError::computation("no bars", ErrCode::EmptyWindow));
        }
        self.snapshot_at(recent, recent.len() - 1)
    }

    pub fn fetch(&self, code: &str) -> Result<Vec<Bar>, ChipError> {
        let fetcher = self
            .fetcher
            .as_ref()
            .ok_or_else(|| ChipError::config("no data fetcher configured"))?;

        let bars = fetcher
            .get_daily_data(code, self.config.fetch_days)
            .map_err(|e| match e {
                ChipError::DataUnavailable { .. } | ChipError::Validation { .. } => e,
                other => ChipError::fetch(
                    ErrCode::DataFetchError,
                    code,
                    fetcher.name(),
                    other.to_string(),
                ),
            })?;
        if bars.is_empty() {
            return Err(ChipError::fetch(
                ErrCode::NoData,
                code,
                fetcher.name(),
                "no bars returned",
            ));
        }
        info!("{}: fetched {} bars from {}", code, bars.len(), fetcher.name());
        Ok(bars)
    }

    pub fn calculate_by_code(&self, code: &str) -> Result<ChipResult, ChipError> {
        let bars = self.fetch(code)?;
        self.calculate(code, &bars)
    }

    /// Independent per-symbol calculation; a failing symbol gets a `None` entry.
    pub fn calculate_batch<S: AsRef<str> + Sync>(&self, codes: &[S]) -> BatchOutcome {
        let outcomes: Vec<(String, Result<ChipResult, ChipError>)> = codes
            .par_iter()
            .map(|code| {
                let code = code.as_ref();
                (code.to_string(), self.calculate_by_code(code))
            })
            .collect();

        let mut batch = BatchOutcome::default();
        for (code, outcome) in outcomes {
            match outcome {
                Ok(result) => batch.entries.push((code, Some(result))),
                Err(e) => {
                    warn!("{}: no chip result: {}", code, e);
                    batch.entries.push((code.clone(), None));
                    batch.errors.push((code, e));
                }
            }
        }
        batch
    }

    fn trim<'b>(&self, bars: &'b [Bar]) -> &'b [Bar] {
        let keep = self.config.calc_days;
        if bars.len() > keep {
            &bars[bars.len() - keep..]
        } else {
            bars
        }
    }
}

/// One-shot calculation with the default configuration.
pub fn calculate_chip_distribution(code: &str, bars: &[Bar]) -> Result<ChipResult, ChipError> {
    ChipCalculator::offline(ChipConfig::default())?.calculate(code, bars)
}
