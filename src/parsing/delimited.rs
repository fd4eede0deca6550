use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use super::table::Table;
use crate::error::TableError;

/// UTF-8 first; anything else is read as Latin-1, which maps every byte.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.trim_start_matches('\u{feff}').to_string(),
        Err(_) => {
            warn!("Input is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

/// Picks whichever of `;`, `,` or tab occurs most in the header line.
fn sniff_delimiter(content: &str) -> char {
    let header = content.lines().next().unwrap_or("");
    [';', ',', '\t']
        .into_iter()
        .max_by_key(|d| header.matches(*d).count())
        .filter(|d| header.contains(*d))
        .unwrap_or(',')
}

fn split_records(content: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            d if d == delimiter => record.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
        .into_iter()
        .filter(|r| r.iter().any(|cell| !cell.trim().is_empty()))
        .collect()
}

/// Parses delimited text. The first non-blank record is the header.
pub fn parse_table(content: &str) -> Result<Table, TableError> {
    let delimiter = sniff_delimiter(content);
    let mut records = split_records(content, delimiter).into_iter();
    let headers: Vec<String> = records
        .next()
        .ok_or(TableError::Empty)?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, mut row) in records.enumerate() {
        if row.len() > headers.len() {
            return Err(TableError::RaggedRow {
                row: idx + 1,
                expected: headers.len(),
                found: row.len(),
            });
        }
        row.resize(headers.len(), String::new());
        rows.push(row);
    }
    debug!(columns = headers.len(), rows = rows.len(), ?delimiter, "Parsed table");
    Ok(Table::from_rows(headers, rows))
}

pub fn read_table(path: &Path) -> Result<Table, TableError> {
    let bytes = fs::read(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&decode_text(&bytes))
}
