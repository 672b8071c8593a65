use csv::ReaderBuilder;
use serde::Serialize;
use std::collections::HashSet;

use crate::error::ReconcileError;

const UTF8_BOM: char = '\u{feff}';

/// An uploaded table exactly as read, before any column mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, ReconcileError> {
        let content = std::str::from_utf8(bytes)
            .map_err(|e| ReconcileError::ParseFailure(format!("upload is not UTF-8: {}", e)))?;
        Self::from_csv_str(content)
    }

    pub fn from_csv_str(content: &str) -> Result<Self, ReconcileError> {
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let header_record = rdr
            .headers()
            .map_err(|e| ReconcileError::ParseFailure(e.to_string()))?
            .clone();
        if header_record.is_empty() {
            return Err(ReconcileError::EmptyTable);
        }
        let headers = dedupe_headers(header_record.iter());
        let width = headers.len();

        let mut rows = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| ReconcileError::ParseFailure(e.to_string()))?;
            if record.len() > width {
                return Err(ReconcileError::ParseFailure(format!(
                    "data row {} has {} fields, expected {}",
                    row_index + 1,
                    record.len(),
                    width
                )));
            }
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(ReconcileError::EmptyTable);
        }

        Ok(Self { headers, rows })
    }
}

// Spreadsheet exports repeat headers such as "Quantity"; later copies become
// "Quantity.1", "Quantity.2", skipping any name already taken.
fn dedupe_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let raw: Vec<&str> = raw.collect();
    let mut taken: HashSet<String> = raw.iter().map(|h| h.to_string()).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());

    for header in raw {
        if seen.insert(header) {
            headers.push(header.to_string());
            continue;
        }
        let mut suffix = 1;
        let mut candidate = format!("{}.{}", header, suffix);
        while taken.contains(&candidate) {
            suffix += 1;
            candidate = format!("{}.{}", header, suffix);
        }
        taken.insert(candidate.clone());
        headers.push(candidate);
    }
    headers
}
