pub mod chip_calculator;
pub mod data_fetcher;
