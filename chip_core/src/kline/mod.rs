pub mod bar;
pub mod bar_adapter;
pub mod column_map;
