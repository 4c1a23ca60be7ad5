//! Pipe-separated table files: one header line, one record per line.

use common::DatabaseError;
use std::collections::HashMap;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::warn;

pub(crate) const SEPARATOR: char = '|';

#[derive(Debug, Clone)]
pub(crate) struct Record {
    table: &'static str,
    line: usize,
    values: HashMap<String, String>,
}

impl Record {
    /// Raw value, empty when the column is missing.
    pub fn text(&self, column: &str) -> String {
        self.values.get(column).cloned().unwrap_or_default()
    }

    pub fn optional(&self, column: &str) -> Option<String> {
        self.values
            .get(column)
            .filter(|v| !v.is_empty())
            .cloned()
    }

    /// Unsigned integer column; empty reads as 0.
    pub fn number(&self, column: &str) -> Result<u32, DatabaseError> {
        let raw = self.text(column);
        if raw.is_empty() {
            return Ok(0);
        }
        raw.parse().map_err(|_| self.invalid(format!("{} is not a number: {:?}", column, raw)))
    }

    pub fn flag(&self, column: &str) -> bool {
        self.text(column).eq_ignore_ascii_case("true")
    }

    /// Comma-separated list, trimmed, empties dropped.
    pub fn list(&self, column: &str) -> Vec<String> {
        self.text(column)
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn invalid(&self, message: impl Into<String>) -> DatabaseError {
        DatabaseError::InvalidRecord {
            table: self.table.to_string(),
            message: format!("line {}: {}", self.line, message.into()),
        }
    }
}

/// Every well-formed record of `table`. A missing file is an empty table.
pub(crate) async fn read_table(dir: &Path, table: &'static str) -> Result<Vec<Record>, DatabaseError> {
    let path = table_path(dir, table);
    if !path.exists() {
        warn!(path = %path.display(), "Table file not found");
        return Ok(Vec::new());
    }

    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| DatabaseError::TableRead {
            table: table.to_string(),
            source,
        })?;

    Ok(parse_table(table, &raw))
}

pub(crate) fn parse_table(table: &'static str, raw: &str) -> Vec<Record> {
    let mut lines = raw.lines().enumerate();
    let header: Vec<String> = match lines.next() {
        Some((_, line)) => split_line(line),
        None => return Vec::new(),
    };

    let mut records = Vec::new();
    for (index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let values = split_line(line);
        if values.len() != header.len() {
            warn!(
                table,
                line = index + 1,
                expected = header.len(),
                actual = values.len(),
                "Skipping row with wrong column count"
            );
            continue;
        }
        records.push(Record {
            table,
            line: index + 1,
            values: header.iter().cloned().zip(values).collect(),
        });
    }
    records
}

fn split_line(line: &str) -> Vec<String> {
    line.trim()
        .split(SEPARATOR)
        .map(|v| v.trim().to_string())
        .collect()
}

/// Append one row, writing `header` first when the file does not exist yet.
pub(crate) async fn append_row(
    dir: &Path,
    table: &'static str,
    header: &[&str],
    values: &[String],
) -> Result<(), DatabaseError> {
    let write_err = |source| DatabaseError::TableWrite {
        table: table.to_string(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(write_err)?;
    let path = table_path(dir, table);
    let mut contents = String::new();
    if !path.exists() {
        contents.push_str(&header.join("|"));
        contents.push('\n');
    }
    let row: Vec<String> = values.iter().map(|v| sanitize(v)).collect();
    contents.push_str(&row.join("|"));
    contents.push('\n');

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .map_err(write_err)?;
    file.write_all(contents.as_bytes()).await.map_err(write_err)?;
    file.flush().await.map_err(write_err)?;
    Ok(())
}

/// Separators and line breaks would corrupt the row.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == SEPARATOR || c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

fn table_path(dir: &Path, table: &str) -> std::path::PathBuf {
    dir.join(format!("{}.txt", table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_skips_bad_rows() {
        let raw = "prop_id|type|quantity\nP1|football|10\n\nP2|cones\nP3|bibs|x\n";
        let records = parse_table("props", raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text("type"), "football");
        assert_eq!(records[0].number("quantity").unwrap(), 10);
        assert!(records[1].number("quantity").is_err());
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(parse_table("users", "user_id|name\n").is_empty());
        assert!(parse_table("users", "").is_empty());
    }

    #[test]
    fn test_field_conversions() {
        let raw = "a|b|c|d\ntrue||x, y,,z|\n";
        let record = &parse_table("t", raw)[0];
        assert!(record.flag("a"));
        assert_eq!(record.optional("b"), None);
        assert_eq!(record.list("c"), vec!["x", "y", "z"]);
        assert!(record.list("d").is_empty());
        assert_eq!(record.number("d").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_append_creates_header_once() {
        let dir = TempDir::new().unwrap();
        let header = ["prop_id", "status", "notes"];
        append_row(dir.path(), "prop_updates", &header, &["P1".into(), "good".into(), "a|b\nc".into()])
            .await
            .unwrap();
        append_row(dir.path(), "prop_updates", &header, &["P2".into(), "damaged".into(), String::new()])
            .await
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join("prop_updates.txt")).unwrap();
        assert_eq!(raw, "prop_id|status|notes\nP1|good|a b c\nP2|damaged|\n");

        let records = read_table(dir.path(), "prop_updates").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text("notes"), "a b c");
    }

    #[tokio::test]
    async fn test_missing_table_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_table(dir.path(), "events").await.unwrap().is_empty());
    }
}
