pub mod calculator;
pub mod chip;
pub mod common;
pub mod config;
pub mod kline;

pub use calculator::chip_calculator::{calculate_chip_distribution, BatchOutcome, ChipCalculator};
pub use calculator::data_fetcher::{DataFetcher, MemoryFetcher};
pub use chip::chip_result::ChipResult;
pub use common::chip_exception::{ChipError, ErrCode};
pub use config::chip_config::ChipConfig;
pub use kline::bar::Bar;
