pub mod csv_table;
pub mod polars_utils;

pub use csv_table::{CsvTable, dataframe_from_table, read_csv_table, read_dataframe};
pub use polars_utils::{any_to_f64, any_to_string, format_numeric, parse_f64};
