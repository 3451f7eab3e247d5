pub mod chip_exception;
pub mod stock_code;
pub mod time;
pub mod utils;
