use std::fs::File;
use std::path::{Path, PathBuf};

use chip_core::common::stock_code::StockCode;
use chip_core::kline::bar_adapter::BarAdapter;
use chip_core::{Bar, ChipError, DataFetcher};
use tracing::debug;

/// Reads `<dir>/<code>.csv` files of daily bars.
#[derive(Debug, Clone)]
pub struct CsvDirFetcher {
    dir: PathBuf,
    adapter: BarAdapter,
}

impl CsvDirFetcher {
    pub fn new(dir: impl Into<PathBuf>, autofix: bool) -> Self {
        Self {
            dir: dir.into(),
            adapter: BarAdapter::new(autofix),
        }
    }

    /// Candidate file names: raw code, normalized code, then market-prefixed code.
    fn resolve(&self, code: &str) -> Option<PathBuf> {
        let stock = StockCode::new(code);
        let mut names = vec![code.trim().to_string(), stock.normalized().to_string()];
        names.push(stock.with_prefix());
        names.push(stock.with_prefix().to_uppercase());
        names.dedup();

        names
            .into_iter()
            .map(|name| self.dir.join(format!("{}.csv", name)))
            .find(|path| path.is_file())
    }
}

pub fn read_csv_file(path: &Path, adapter: &BarAdapter) -> Result<Vec<Bar>, ChipError> {
    let file = File::open(path)?;
    let (bars, report) = adapter.read_csv(file)?;
    debug!(
        "{}: {} rows, {} dropped, {} duplicate dates",
        path.display(),
        report.total_rows,
        report.dropped_rows,
        report.duplicate_dates
    );
    Ok(bars)
}

impl DataFetcher for CsvDirFetcher {
    fn name(&self) -> &str {
        "csv"
    }

    fn get_daily_data(&self, code: &str, days: usize) -> Result<Vec<Bar>, ChipError> {
        let path = self.resolve(code).ok_or_else(|| {
            ChipError::unavailable(
                code,
                self.name(),
                format!("no csv file for {} in {}", code, self.dir.display()),
            )
        })?;
        let mut bars = read_csv_file(&path, &self.adapter)?;
        if bars.len() > days {
            bars.drain(..bars.len() - days);
        }
        Ok(bars)
    }
}
