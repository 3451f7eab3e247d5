pub mod chip_config;
