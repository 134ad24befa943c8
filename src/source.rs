//! Row source adapters for the tabular formats accepted at upload

use crate::{ProfileError, Result};
use calamine::{Data, Reader as SpreadsheetReader, Xlsx};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Input formats understood by the profiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Tsv,
    Spreadsheet,
    Json,
}

impl SourceFormat {
    /// Resolve a format from a file extension or MIME type
    pub fn from_hint(hint: &str) -> Result<Self> {
        let hint = hint.trim().to_ascii_lowercase();

        if hint.contains('/') {
            return match hint.as_str() {
                "text/csv" => Ok(SourceFormat::Csv),
                "text/tab-separated-values" => Ok(SourceFormat::Tsv),
                "application/json" => Ok(SourceFormat::Json),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                | "application/vnd.ms-excel" => Ok(SourceFormat::Spreadsheet),
                _ => Err(ProfileError::UnsupportedFormat(hint)),
            };
        }

        // Accept "csv", ".csv" and full file names alike
        let extension = hint.rsplit('.').next().unwrap_or(&hint);
        match extension {
            "csv" => Ok(SourceFormat::Csv),
            "tsv" => Ok(SourceFormat::Tsv),
            "json" => Ok(SourceFormat::Json),
            "xlsx" | "xls" => Ok(SourceFormat::Spreadsheet),
            _ => Err(ProfileError::UnsupportedFormat(hint)),
        }
    }

    fn delimiter(&self) -> u8 {
        match self {
            SourceFormat::Tsv => b'\t',
            _ => b',',
        }
    }
}

/// A row of raw cell values, aligned with the reader's header
pub type RawRow = Vec<Value>;

/// An uploaded byte buffer together with its resolved format
#[derive(Debug, Clone)]
pub struct RowSource {
    bytes: Vec<u8>,
    format: SourceFormat,
}

impl RowSource {
    pub fn new(bytes: Vec<u8>, format: SourceFormat) -> Self {
        Self { bytes, format }
    }

    /// Create a source from raw bytes and a format hint (extension or MIME type)
    pub fn from_hint(bytes: Vec<u8>, hint: &str) -> Result<Self> {
        let format = SourceFormat::from_hint(hint)?;
        Ok(Self::new(bytes, format))
    }

    /// Read a file and resolve its format from the extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ProfileError::UnsupportedFormat(path.display().to_string()))?;
        let format = SourceFormat::from_hint(extension)?;
        let bytes = std::fs::read(path)?;
        Ok(Self::new(bytes, format))
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Open a lazy, single-pass reader over the source's rows
    pub fn reader(&self) -> Result<RowReader<'_>> {
        match self.format {
            SourceFormat::Csv | SourceFormat::Tsv => self.open_delimited(),
            SourceFormat::Json => self.open_json(),
            SourceFormat::Spreadsheet => self.open_spreadsheet(),
        }
    }

    fn open_delimited(&self) -> Result<RowReader<'_>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.format.delimiter())
            .has_headers(true)
            .flexible(true)
            .from_reader(self.bytes.as_slice());

        let header: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        debug!(columns = header.len(), "opened delimited source");

        Ok(RowReader {
            header,
            inner: RowsInner::Csv(reader.into_records()),
        })
    }

    fn open_json(&self) -> Result<RowReader<'_>> {
        let parsed: Value = serde_json::from_slice(&self.bytes)
            .map_err(|e| ProfileError::UnsupportedFormat(format!("invalid JSON: {}", e)))?;

        let objects: Vec<&serde_json::Map<String, Value>> = match &parsed {
            // A single object is treated as a one-row array
            Value::Object(map) => vec![map],
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_object().ok_or_else(|| {
                        ProfileError::RowShape(
                            "JSON array elements must be objects".to_string(),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            _ => {
                return Err(ProfileError::UnsupportedFormat(
                    "JSON input must be an array of objects or a single object".to_string(),
                ))
            }
        };

        // Column set is the union of keys across all rows, in first-appearance order
        let mut header: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for object in &objects {
            for key in object.keys() {
                if seen.insert(key.as_str()) {
                    header.push(key.clone());
                }
            }
        }

        let rows: Vec<RawRow> = objects
            .iter()
            .map(|object| {
                header
                    .iter()
                    .map(|key| object.get(key).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        debug!(columns = header.len(), rows = rows.len(), "parsed JSON source");

        Ok(RowReader {
            header,
            inner: RowsInner::Buffered(rows.into_iter()),
        })
    }

    fn open_spreadsheet(&self) -> Result<RowReader<'_>> {
        let cursor = Cursor::new(self.bytes.as_slice());
        let mut workbook = Xlsx::new(cursor).map_err(|e| {
            ProfileError::UnsupportedFormat(format!("not a readable spreadsheet: {}", e))
        })?;

        // First sheet only
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range?,
            None => {
                return Ok(RowReader {
                    header: Vec::new(),
                    inner: RowsInner::Buffered(Vec::new().into_iter()),
                })
            }
        };

        let mut sheet_rows = range.rows();
        let header: Vec<String> = match sheet_rows.next() {
            Some(cells) => cells
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let name = header_name(cell);
                    if name.is_empty() {
                        format!("column_{}", i + 1)
                    } else {
                        name
                    }
                })
                .collect(),
            None => Vec::new(),
        };

        let width = header.len();
        let rows: Vec<RawRow> = sheet_rows
            .map(|cells| {
                let mut row: RawRow = cells.iter().take(width).map(cell_to_value).collect();
                row.resize(width, Value::Null);
                row
            })
            .collect();

        debug!(columns = width, rows = rows.len(), "parsed spreadsheet source");

        Ok(RowReader {
            header,
            inner: RowsInner::Buffered(rows.into_iter()),
        })
    }
}

/// Lazy iterator of rows, all aligned with `header`
pub struct RowReader<'a> {
    header: Vec<String>,
    inner: RowsInner<'a>,
}

enum RowsInner<'a> {
    Csv(csv::StringRecordsIntoIter<&'a [u8]>),
    Buffered(std::vec::IntoIter<RawRow>),
}

impl std::fmt::Debug for RowReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowReader")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

impl RowReader<'_> {
    /// Column names, in source order
    pub fn header(&self) -> &[String] {
        &self.header
    }
}

impl Iterator for RowReader<'_> {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            RowsInner::Csv(records) => {
                let record = match records.next()? {
                    Ok(record) => record,
                    Err(e) => return Some(Err(e.into())),
                };
                // Zip against the header: short rows are null-padded, extra
                // trailing fields are dropped
                let row: RawRow = (0..self.header.len())
                    .map(|i| match record.get(i) {
                        Some("") | None => Value::Null,
                        Some(cell) => Value::String(cell.to_string()),
                    })
                    .collect();
                Some(Ok(row))
            }
            RowsInner::Buffered(rows) => rows.next().map(Ok),
        }
    }
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => match cell_to_value(other) {
            Value::Null => String::new(),
            Value::String(s) => s,
            value => value.to_string(),
        },
    }
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => {
            if s.is_empty() {
                Value::Null
            } else {
                Value::String(s.clone())
            }
        }
        Data::Int(i) => Value::Number((*i).into()),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            // Date-only cells render without the midnight time component
            Some(naive) if naive.time() == chrono::NaiveTime::MIN => {
                Value::String(naive.format("%Y-%m-%d").to_string())
            }
            Some(naive) => Value::String(naive.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => serde_json::Number::from_f64(dt.as_f64())
                .map(Value::Number)
                .unwrap_or(Value::Null),
        },
        Data::DateTimeIso(s) => Value::String(s.clone()),
        Data::DurationIso(s) => Value::String(s.clone()),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_hint() {
        assert_eq!(SourceFormat::from_hint("csv").unwrap(), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_hint(".tsv").unwrap(), SourceFormat::Tsv);
        assert_eq!(
            SourceFormat::from_hint("report.XLSX").unwrap(),
            SourceFormat::Spreadsheet
        );
        assert_eq!(
            SourceFormat::from_hint("application/json").unwrap(),
            SourceFormat::Json
        );
        assert_eq!(
            SourceFormat::from_hint("text/csv").unwrap(),
            SourceFormat::Csv
        );
    }

    #[test]
    fn test_unsupported_hint() {
        let err = SourceFormat::from_hint("docx").unwrap_err();
        assert!(matches!(err, ProfileError::UnsupportedFormat(_)));

        let err = SourceFormat::from_hint("application/pdf").unwrap_err();
        assert!(matches!(err, ProfileError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_csv_rows() {
        let source = RowSource::new(
            b"id,email\n1,a@b.com\n2,c@d.com\n".to_vec(),
            SourceFormat::Csv,
        );
        let reader = source.reader().unwrap();
        assert_eq!(reader.header(), &["id", "email"]);

        let rows: Vec<RawRow> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], Value::String("1".to_string()));
        assert_eq!(rows[1][1], Value::String("c@d.com".to_string()));
    }

    #[test]
    fn test_csv_ragged_rows_are_padded() {
        let source = RowSource::new(
            b"a,b,c\n1,2\n1,2,3,4\n".to_vec(),
            SourceFormat::Csv,
        );
        let reader = source.reader().unwrap();
        let rows: Vec<RawRow> = reader.map(|r| r.unwrap()).collect();

        // Short row null-padded
        assert_eq!(rows[0], vec![
            Value::String("1".to_string()),
            Value::String("2".to_string()),
            Value::Null,
        ]);
        // Long row truncated to the header width
        assert_eq!(rows[1].len(), 3);
    }

    #[test]
    fn test_csv_empty_cell_is_null() {
        let source = RowSource::new(b"a,b\n,x\n".to_vec(), SourceFormat::Csv);
        let rows: Vec<RawRow> = source.reader().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(rows[0][0], Value::Null);
        assert_eq!(rows[0][1], Value::String("x".to_string()));
    }

    #[test]
    fn test_tsv_delimiter() {
        let source = RowSource::new(b"a\tb\n1\t2\n".to_vec(), SourceFormat::Tsv);
        let reader = source.reader().unwrap();
        assert_eq!(reader.header(), &["a", "b"]);
        let rows: Vec<RawRow> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(rows[0][1], Value::String("2".to_string()));
    }

    #[test]
    fn test_json_union_of_keys() {
        let source = RowSource::new(
            br#"[{"a": 1, "b": 2}, {"b": 3, "c": 4}]"#.to_vec(),
            SourceFormat::Json,
        );
        let reader = source.reader().unwrap();
        assert_eq!(reader.header(), &["a", "b", "c"]);

        let rows: Vec<RawRow> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(rows[0][2], Value::Null);
        assert_eq!(rows[1][0], Value::Null);
        assert_eq!(rows[1][1], serde_json::json!(3));
    }

    #[test]
    fn test_json_single_object_is_one_row() {
        let source = RowSource::new(br#"{"a": 1}"#.to_vec(), SourceFormat::Json);
        let reader = source.reader().unwrap();
        let rows: Vec<RawRow> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_json_scalar_input_rejected() {
        let source = RowSource::new(b"42".to_vec(), SourceFormat::Json);
        assert!(matches!(
            source.reader().unwrap_err(),
            ProfileError::UnsupportedFormat(_)
        ));
    }

    #[test]
    fn test_json_array_of_scalars_rejected() {
        let source = RowSource::new(b"[1, 2, 3]".to_vec(), SourceFormat::Json);
        assert!(matches!(
            source.reader().unwrap_err(),
            ProfileError::RowShape(_)
        ));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let source = RowSource::new(b"not json".to_vec(), SourceFormat::Json);
        assert!(matches!(
            source.reader().unwrap_err(),
            ProfileError::UnsupportedFormat(_)
        ));
    }

    #[test]
    fn test_spreadsheet_cell_conversion() {
        assert_eq!(cell_to_value(&Data::Empty), Value::Null);
        assert_eq!(
            cell_to_value(&Data::String("hi".to_string())),
            Value::String("hi".to_string())
        );
        assert_eq!(cell_to_value(&Data::Int(7)), serde_json::json!(7));
        assert_eq!(cell_to_value(&Data::Float(1.5)), serde_json::json!(1.5));
        assert_eq!(cell_to_value(&Data::Bool(true)), Value::Bool(true));
        assert_eq!(cell_to_value(&Data::String(String::new())), Value::Null);
    }

    #[test]
    fn test_not_a_spreadsheet_rejected() {
        let source = RowSource::new(b"plain text".to_vec(), SourceFormat::Spreadsheet);
        assert!(matches!(
            source.reader().unwrap_err(),
            ProfileError::UnsupportedFormat(_)
        ));
    }
}
