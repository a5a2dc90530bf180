//! Data module - file loading and processing

mod loader;
mod processor;

pub use loader::{
    load_csv_as_text, load_file, load_json, load_jsonl, load_jsonl_lenient, DataLoader,
    LoadedData, LoaderError,
};
pub use processor::{any_value_text, format_thousands, truncate_chars, DataInfo, DataProcessor};
