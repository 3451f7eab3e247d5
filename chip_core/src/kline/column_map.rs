use std::collections::HashMap;

use strum_macros::{Display, EnumString};

use crate::common::chip_exception::{ChipError, ErrCode};

/// Canonical bar columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Column {
    Date,
    Open,
    Close,
    High,
    Low,
    Volume,
    Amount,
    TurnoverRate,
    PctChange,
}

/// Header aliases accepted for each canonical column, matched case-insensitively.
pub const COLUMN_ALIASES: &[(&str, Column)] = &[
    ("date", Column::Date),
    ("日期", Column::Date),
    ("trade_date", Column::Date),
    ("open", Column::Open),
    ("开盘", Column::Open),
    ("close", Column::Close),
    ("收盘", Column::Close),
    ("high", Column::High),
    ("最高", Column::High),
    ("low", Column::Low),
    ("最低", Column::Low),
    ("volume", Column::Volume),
    ("vol", Column::Volume),
    ("成交量", Column::Volume),
    ("amount", Column::Amount),
    ("成交额", Column::Amount),
    ("turnover_rate", Column::TurnoverRate),
    ("turnover", Column::TurnoverRate),
    ("hsl", Column::TurnoverRate),
    ("换手率", Column::TurnoverRate),
    ("pct_change", Column::PctChange),
    ("pct_chg", Column::PctChange),
    ("zdf", Column::PctChange),
    ("涨跌幅", Column::PctChange),
];

/// Columns a bar cannot be built without.
pub const REQUIRED_COLUMNS: &[Column] = &[
    Column::Date,
    Column::Open,
    Column::Close,
    Column::High,
    Column::Low,
];

impl Column {
    pub fn from_header(header: &str) -> Option<Self> {
        let key = header.trim().trim_start_matches('\u{feff}').to_lowercase();
        COLUMN_ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, column)| *column)
    }
}

/// Header positions resolved against the alias table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    positions: HashMap<Column, usize>,
}

impl ColumnMap {
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Result<Self, ChipError> {
        let mut positions = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(column) = Column::from_header(header.as_ref()) {
                // first matching header wins
                positions.entry(column).or_insert(idx);
            }
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !positions.contains_key(*c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ChipError::validation(
                format!("missing required columns: {:?}", missing),
                ErrCode::SrcDataFormatError,
            ));
        }

        Ok(Self { positions })
    }

    pub fn position(&self, column: Column) -> Option<usize> {
        self.positions.get(&column).copied()
    }

    pub fn has(&self, column: Column) -> bool {
        self.positions.contains_key(&column)
    }
}
