pub mod accumulator;
pub mod chip_result;
pub mod price_grid;
pub mod snapshot;
pub mod statistics;
