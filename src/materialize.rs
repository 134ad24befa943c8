//! Single-pass transposition of a row stream into per-column value lists

use crate::source::{RawRow, RowReader};
use crate::{ProfileError, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::info;

/// Non-null raw values of one column, with its null accounting
#[derive(Debug, Clone)]
pub struct ColumnValues {
    pub name: String,
    /// Non-null values in row order, bounded by the materialization limit
    pub values: Vec<Value>,
    pub null_count: usize,
    /// Materialized row count; `null_count + values.len() == total_count`
    pub total_count: usize,
}

/// Result of the materialization pass
#[derive(Debug, Clone)]
pub struct Materialized {
    /// One entry per column, in header order
    pub columns: Vec<ColumnValues>,
    /// Row count over the entire stream, including rows past the limit
    pub total_rows: usize,
    /// Rows whose full value tuple is identical to an earlier row
    pub duplicate_rows: usize,
    /// First rows of the stream, as JSON objects keyed by column name
    pub preview: Vec<serde_json::Map<String, Value>>,
}

/// Transpose a row stream into per-column value lists.
///
/// Values are accumulated for at most `max_rows` rows, while the row count,
/// duplicate detection and preview capture observe the whole stream.
pub fn materialize(
    reader: RowReader<'_>,
    max_rows: usize,
    preview_rows: usize,
) -> Result<Materialized> {
    let header: Vec<String> = reader.header().to_vec();

    let mut columns: Vec<ColumnValues> = header
        .iter()
        .map(|name| ColumnValues {
            name: name.clone(),
            values: Vec::new(),
            null_count: 0,
            total_count: 0,
        })
        .collect();

    let mut digests: HashSet<[u8; 32]> = HashSet::new();
    let mut total_rows = 0usize;
    let mut duplicate_rows = 0usize;
    let mut preview = Vec::with_capacity(preview_rows.min(64));

    for row in reader {
        let row = row?;
        total_rows += 1;

        if !digests.insert(row_digest(&row)) {
            duplicate_rows += 1;
        }

        if preview.len() < preview_rows {
            let mut object = serde_json::Map::new();
            for (name, value) in header.iter().zip(row.iter()) {
                object.insert(name.clone(), value.clone());
            }
            preview.push(object);
        }

        if total_rows > max_rows {
            continue;
        }

        for (column, value) in columns.iter_mut().zip(row.into_iter()) {
            column.total_count += 1;
            if value.is_null() {
                column.null_count += 1;
            } else {
                column.values.push(value);
            }
        }
    }

    if total_rows == 0 {
        return Err(ProfileError::EmptyDataset);
    }

    info!(
        rows = total_rows,
        columns = columns.len(),
        duplicates = duplicate_rows,
        "materialization complete"
    );

    Ok(Materialized {
        columns,
        total_rows,
        duplicate_rows,
        preview,
    })
}

/// Digest of a row's full ordered value tuple.
///
/// Each cell is framed with a type tag and a length prefix so that adjacent
/// cells cannot collide ("ab","c" vs "a","bc").
fn row_digest(row: &RawRow) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for value in row {
        match value {
            Value::Null => hasher.update([0u8]),
            Value::String(s) => {
                hasher.update([1u8]);
                hasher.update((s.len() as u64).to_le_bytes());
                hasher.update(s.as_bytes());
            }
            other => {
                let rendered = other.to_string();
                hasher.update([2u8]);
                hasher.update((rendered.len() as u64).to_le_bytes());
                hasher.update(rendered.as_bytes());
            }
        }
    }
    hasher.finalize().into()
}
