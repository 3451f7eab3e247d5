use std::collections::HashMap;

use crate::common::chip_exception::ChipError;
use crate::kline::{bar::Bar, bar_adapter::BarAdapter};

/// Source of ordered daily bars for a symbol.
///
/// Retry and backoff belong to implementations; callers make one request
/// per symbol.
pub trait DataFetcher: Send + Sync {
    fn name(&self) -> &str;

    /// The most recent `days` bars for `code`, oldest first.
    fn get_daily_data(&self, code: &str, days: usize) -> Result<Vec<Bar>, ChipError>;
}

#[derive(Debug, Clone)]
enum Table {
    Bars(Vec<Bar>),
    Records {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// In-memory fetcher, for embedding callers that already hold their data.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    tables: HashMap<String, Table>,
    adapter: BarAdapter,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_bars(&mut self, code: impl Into<String>, bars: Vec<Bar>) {
        self.tables.insert(code.into(), Table::Bars(bars));
    }

    /// Raw rows are normalized on every fetch, so malformed tables fail then.
    pub fn insert_records(
        &mut self,
        code: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) {
        self.tables
            .insert(code.into(), Table::Records { headers, rows });
    }
}

impl DataFetcher for MemoryFetcher {
    fn name(&self) -> &str {
        "memory"
    }

    fn get_daily_data(&self, code: &str, days: usize) -> Result<Vec<Bar>, ChipError> {
        let mut bars = match self.tables.get(code) {
            Some(Table::Bars(bars)) => self.adapter.check_bars(bars)?,
            Some(Table::Records { headers, rows }) => self.adapter.normalize(headers, rows)?.0,
            None => return Err(ChipError::unavailable(code, self.name(), "unknown symbol")),
        };
        if bars.len() > days {
            bars.drain(..bars.len() - days);
        }
        Ok(bars)
    }
}
