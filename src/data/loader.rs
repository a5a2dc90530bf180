//! Data File Loader Module
//! Handles CSV, JSON and JSONL loading and conversion into Polars DataFrames.

use polars::prelude::*;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Rows used for CSV schema inference.
const INFER_SCHEMA_ROWS: usize = 10000;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error loading JSON file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Malformed JSON on line {line} of {path}: {source}")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("JSON data must be an object or a list of objects")]
    NotRecords,
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Json,
    Jsonl,
}

impl FileKind {
    /// Detect file type from extension.
    pub fn detect(path: &Path) -> Result<Self, LoaderError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(FileKind::Csv),
            "json" => Ok(FileKind::Json),
            "jsonl" => Ok(FileKind::Jsonl),
            "" => Err(LoaderError::UnsupportedType(String::new())),
            _ => Err(LoaderError::UnsupportedType(format!(".{}", ext))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Csv => "CSV",
            FileKind::Json => "JSON",
            FileKind::Jsonl => "JSONL",
        }
    }
}

/// A file loaded into a DataFrame.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub df: DataFrame,
    pub path: PathBuf,
    pub kind: FileKind,
}

fn read_to_string(path: &Path) -> Result<String, LoaderError> {
    fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a JSON document.
pub fn load_json(path: &Path) -> Result<Value, LoaderError> {
    let text = read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| LoaderError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a JSONL file (one JSON value per line). Blank lines are skipped;
/// the first malformed line aborts the load.
pub fn load_jsonl(path: &Path) -> Result<Vec<Value>, LoaderError> {
    let text = read_to_string(path)?;
    let mut records = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|source| LoaderError::MalformedLine {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Load a JSONL file, skipping malformed lines. A missing file yields no records.
pub fn load_jsonl_lenient(path: &Path) -> Vec<Value> {
    if !path.exists() {
        return Vec::new();
    }

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("Error reading {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match serde_json::from_str(line.trim()) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    "Skipping malformed JSON on line {} of {}: {}",
                    idx + 1,
                    path.display(),
                    e
                );
                None
            }
        })
        .collect()
}

/// Load a CSV file using Polars.
pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .finish()?
        .collect()?;
    Ok(df)
}

/// Load a CSV file keeping every column as text.
pub fn load_csv_as_text(path: &Path) -> Result<DataFrame, LoaderError> {
    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()?;
    Ok(df)
}

/// Inferred column type while scanning JSON records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsonColumnKind {
    Unknown,
    Int,
    Float,
    Bool,
    Text,
}

impl JsonColumnKind {
    fn merge(self, value: &Value) -> Self {
        let seen = match value {
            Value::Null => return self,
            Value::Bool(_) => JsonColumnKind::Bool,
            Value::Number(n) if n.is_i64() => JsonColumnKind::Int,
            Value::Number(_) => JsonColumnKind::Float,
            _ => JsonColumnKind::Text,
        };

        match (self, seen) {
            (JsonColumnKind::Unknown, s) => s,
            (a, b) if a == b => a,
            (JsonColumnKind::Int, JsonColumnKind::Float)
            | (JsonColumnKind::Float, JsonColumnKind::Int) => JsonColumnKind::Float,
            _ => JsonColumnKind::Text,
        }
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Convert JSON data (a single object or a list of objects) to a DataFrame.
///
/// Columns appear in first-seen key order; missing keys become nulls and
/// nested values are kept as compact JSON text.
pub fn records_to_dataframe(data: &Value) -> Result<DataFrame, LoaderError> {
    let records: Vec<&Map<String, Value>> = match data {
        Value::Object(obj) => vec![obj],
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_object().ok_or(LoaderError::NotRecords))
            .collect::<Result<_, _>>()?,
        _ => return Err(LoaderError::NotRecords),
    };

    let mut names: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let mut columns = Vec::with_capacity(names.len());
    for name in &names {
        let cells: Vec<&Value> = records
            .iter()
            .map(|r| r.get(name).unwrap_or(&Value::Null))
            .collect();
        let kind = cells
            .iter()
            .fold(JsonColumnKind::Unknown, |kind, v| kind.merge(v));

        let column = match kind {
            JsonColumnKind::Int => {
                let values: Vec<Option<i64>> = cells.iter().map(|v| v.as_i64()).collect();
                Column::new(name.as_str().into(), values)
            }
            JsonColumnKind::Float => {
                let values: Vec<Option<f64>> = cells.iter().map(|v| v.as_f64()).collect();
                Column::new(name.as_str().into(), values)
            }
            JsonColumnKind::Bool => {
                let values: Vec<Option<bool>> = cells.iter().map(|v| v.as_bool()).collect();
                Column::new(name.as_str().into(), values)
            }
            JsonColumnKind::Text | JsonColumnKind::Unknown => {
                let values: Vec<Option<String>> =
                    cells.iter().map(|v| value_as_text(v)).collect();
                Column::new(name.as_str().into(), values)
            }
        };
        columns.push(column);
    }

    Ok(DataFrame::new(columns)?)
}

/// Load any supported file, detecting the type from its extension.
pub fn load_file(path: &Path) -> Result<LoadedData, LoaderError> {
    let kind = FileKind::detect(path)?;

    let df = match kind {
        FileKind::Csv => load_csv(path)?,
        FileKind::Json => records_to_dataframe(&load_json(path)?)?,
        FileKind::Jsonl => records_to_dataframe(&Value::Array(load_jsonl(path)?))?,
    };

    info!(
        "Loaded {} file {}: {} rows, {} columns",
        kind.label(),
        path.display(),
        df.height(),
        df.width()
    );

    Ok(LoadedData {
        df,
        path: path.to_path_buf(),
        kind,
    })
}

/// Holds the currently loaded data file.
pub struct DataLoader {
    data: Option<LoadedData>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self { data: None }
    }

    /// File name of the loaded file.
    pub fn get_file_name(&self) -> Option<String> {
        self.data
            .as_ref()
            .and_then(|d| d.path.file_name())
            .map(|n| n.to_string_lossy().to_string())
    }

    /// Get list of column names from loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.get_dataframe()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.get_dataframe().map(|df| df.height()).unwrap_or(0)
    }

    /// Get a reference to the loaded DataFrame.
    pub fn get_dataframe(&self) -> Option<&DataFrame> {
        self.data.as_ref().map(|d| &d.df)
    }

    pub fn get_file_kind(&self) -> Option<FileKind> {
        self.data.as_ref().map(|d| d.kind)
    }

    /// Set loaded data directly (used for async loading)
    pub fn set_data(&mut self, data: LoadedData) {
        self.data = Some(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn detects_kind_case_insensitively() {
        assert_eq!(FileKind::detect(Path::new("a.CSV")).unwrap(), FileKind::Csv);
        assert_eq!(FileKind::detect(Path::new("a.json")).unwrap(), FileKind::Json);
        assert_eq!(FileKind::detect(Path::new("a.JsonL")).unwrap(), FileKind::Jsonl);

        let err = FileKind::detect(Path::new("a.txt")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: .txt");

        let err = FileKind::detect(Path::new("README")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: ");
    }

    #[test]
    fn loads_csv_with_expected_shape() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_file(&dir, "data.csv", "name,age,score\nann,31,1.5\nbob,,2.5\ncid,40,\n");

        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.kind, FileKind::Csv);
        assert_eq!(loaded.df.height(), 3);
        assert_eq!(loaded.df.width(), 3);
        assert_eq!(loaded.df.column("age").unwrap().null_count(), 1);
        assert_eq!(loaded.df.column("score").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn csv_as_text_keeps_strings() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_file(&dir, "users.csv", "id,count\nu1,5\n");

        let df = load_csv_as_text(&path).unwrap();
        assert_eq!(df.column("count").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn jsonl_skips_blank_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_file(&dir, "rows.jsonl", "{\"a\": 1}\n\n   \n{\"a\": 2}\n");

        let records = load_jsonl(&path).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn jsonl_reports_malformed_line_number() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_file(&dir, "rows.jsonl", "{\"a\": 1}\n\n{oops\n");

        match load_jsonl(&path) {
            Err(LoaderError::MalformedLine { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected malformed line error, got {:?}", other),
        }
    }

    #[test]
    fn lenient_jsonl_skips_bad_lines_and_missing_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_file(&dir, "rows.jsonl", "{\"a\": 1}\nnot json\n{\"a\": 3}\n");

        assert_eq!(load_jsonl_lenient(&path).len(), 2);
        assert!(load_jsonl_lenient(&dir.path().join("missing.jsonl")).is_empty());
    }

    #[test]
    fn records_infer_column_types() {
        let data = json!([
            {"id": "a", "n": 1, "x": 1.5, "ok": true, "tags": ["p"]},
            {"id": "b", "n": 2, "x": 2, "extra": "late"},
        ]);

        let df = records_to_dataframe(&data).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["id", "n", "x", "ok", "tags", "extra"]);
        assert_eq!(df.column("n").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("x").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("ok").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(df.column("tags").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("extra").unwrap().null_count(), 1);
    }

    #[test]
    fn single_object_becomes_one_row() {
        let df = records_to_dataframe(&json!({"a": 1, "b": "x"})).unwrap();
        assert_eq!(df.shape(), (1, 2));
    }

    #[test]
    fn scalar_json_is_rejected() {
        assert!(matches!(
            records_to_dataframe(&json!(5)),
            Err(LoaderError::NotRecords)
        ));
        assert!(matches!(
            records_to_dataframe(&json!([1, 2])),
            Err(LoaderError::NotRecords)
        ));
    }

    #[test]
    fn data_loader_tracks_loaded_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_file(&dir, "rows.json", "[{\"a\": 1, \"b\": 2}, {\"a\": 3}]");

        let mut loader = DataLoader::new();
        assert_eq!(loader.get_row_count(), 0);
        loader.set_data(load_file(&path).unwrap());
        assert_eq!(loader.get_row_count(), 2);
        assert_eq!(loader.get_file_name().as_deref(), Some("rows.json"));
        assert_eq!(loader.get_columns(), vec!["a", "b"]);
        assert_eq!(loader.get_file_kind(), Some(FileKind::Json));
    }
}
