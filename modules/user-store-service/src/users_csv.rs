//! Semicolon-delimited user table: read, write, and row lookup.
//!
//! The header row defines a column set shared by every record. `name` and
//! `id` always lead; other columns keep the order they were introduced in.

use crate::error::StoreResult;
use std::fs;
use std::path::Path;
use user_store_types::{blank_record, UserRecord, ID_COLUMN, NAME_COLUMN};

const DELIMITER: u8 = b';';

/// Create `path` holding only the `name;id` header if it does not exist yet.
fn ensure_users_file(path: &Path) -> StoreResult<()> {
    if path.exists() {
        return Ok(());
    }
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_path(path)?;
    writer.write_record([NAME_COLUMN, ID_COLUMN])?;
    writer.flush()?;
    log::debug!("Created empty user table at {}", path.display());
    Ok(())
}

/// Force `name` and `id` to the front, keeping the remaining order.
pub fn normalize_columns(columns: &[String]) -> Vec<String> {
    let mut ordered = vec![NAME_COLUMN.to_string(), ID_COLUMN.to_string()];
    for column in columns {
        if !ordered.contains(column) {
            ordered.push(column.clone());
        }
    }
    ordered
}

/// Load every record and the ordered column list. Creates a header-only
/// file when `path` is missing. Short rows are padded with empty strings.
pub fn read_users(path: &Path) -> StoreResult<(Vec<UserRecord>, Vec<String>)> {
    ensure_users_file(path)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let columns = normalize_columns(&header);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.len() == 1 && row[0].is_empty() {
            continue;
        }
        let record: UserRecord = columns
            .iter()
            .map(|column| {
                // A repeated header name takes its last cell.
                let value = header
                    .iter()
                    .rposition(|h| h == column)
                    .and_then(|i| row.get(i))
                    .unwrap_or("");
                (column.clone(), value.to_string())
            })
            .collect();
        records.push(record);
    }

    Ok((records, columns))
}

/// Rewrite the whole table. The new content goes to a sibling temp file
/// that is renamed over `path`.
pub fn write_users(records: &[UserRecord], columns: &[String], path: &Path) -> StoreResult<()> {
    let columns = normalize_columns(columns);
    let tmp_path = path.with_extension("csv.tmp");

    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .from_path(&tmp_path)?;
        writer.write_record(&columns)?;
        for record in records {
            writer.write_record(
                columns
                    .iter()
                    .map(|c| record.get(c).map(String::as_str).unwrap_or("")),
            )?;
        }
        writer.flush()?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// First record whose name matches case-insensitively and whose id matches exactly.
pub fn find_user_index(records: &[UserRecord], name: &str, id: &str) -> Option<usize> {
    let name_lower = name.to_lowercase();
    records.iter().position(|r| {
        r.get(NAME_COLUMN)
            .map(|n| n.to_lowercase() == name_lower)
            .unwrap_or(false)
            && r.get(ID_COLUMN).map(String::as_str) == Some(id)
    })
}

/// Find the record for `(name, id)` or append a blank one. Returns its index.
pub fn ensure_user_row(
    records: &mut Vec<UserRecord>,
    columns: &[String],
    name: &str,
    id: &str,
) -> usize {
    match find_user_index(records, name, id) {
        Some(idx) => idx,
        None => {
            records.push(blank_record(columns, name, id));
            records.len() - 1
        }
    }
}

/// Keep only the first record matching `(name, id)`; later matches are dropped
/// wherever they sit in the table.
pub fn dedupe_user(records: &mut Vec<UserRecord>, name: &str, id: &str) -> usize {
    let name_lower = name.to_lowercase();
    let before = records.len();
    let mut seen = false;
    records.retain(|r| {
        let matches = r
            .get(NAME_COLUMN)
            .map(|n| n.to_lowercase() == name_lower)
            .unwrap_or(false)
            && r.get(ID_COLUMN).map(String::as_str) == Some(id);
        if !matches {
            return true;
        }
        if seen {
            return false;
        }
        seen = true;
        true
    });
    before - records.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_read_creates_header_only_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("users.csv");

        let (records, columns) = read_users(&path).unwrap();
        assert!(records.is_empty());
        assert_eq!(columns, cols(&["name", "id"]));

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw.trim_end(), "name;id");
    }

    #[test]
    fn test_read_forces_name_and_id_to_front() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("users.csv");
        fs::write(&path, "grade;id;name\r\nA;1;Alice\r\n").unwrap();

        let (records, columns) = read_users(&path).unwrap();
        assert_eq!(columns, cols(&["name", "id", "grade"]));
        assert_eq!(records[0]["name"], "Alice");
        assert_eq!(records[0]["id"], "1");
        assert_eq!(records[0]["grade"], "A");
    }

    #[test]
    fn test_read_adds_missing_required_columns() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("users.csv");
        fs::write(&path, "grade\nB\n").unwrap();

        let (records, columns) = read_users(&path).unwrap();
        assert_eq!(columns, cols(&["name", "id", "grade"]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "");
        assert_eq!(records[0]["id"], "");
        assert_eq!(records[0]["grade"], "B");
    }

    #[test]
    fn test_repeated_header_takes_last_cell() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("users.csv");
        fs::write(&path, "name;id;grade;grade\nAlice;1;B;A\n").unwrap();

        let (records, columns) = read_users(&path).unwrap();
        assert_eq!(columns, cols(&["name", "id", "grade"]));
        assert_eq!(records[0]["grade"], "A");
    }

    #[test]
    fn test_read_pads_short_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("users.csv");
        fs::write(&path, "name;id;grade;city\nAlice;1\n").unwrap();

        let (records, _) = read_users(&path).unwrap();
        assert_eq!(records[0]["grade"], "");
        assert_eq!(records[0]["city"], "");
    }

    #[test]
    fn test_write_then_read_preserves_columns_and_quoting() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("users.csv");
        let columns = cols(&["name", "id", "note"]);

        let mut alice = blank_record(&columns, "Alice", "1");
        alice.insert("note".into(), "likes; semicolons".into());
        let bob = blank_record(&columns, "Bob", "2");
        write_users(&[alice, bob], &columns, &path).unwrap();

        let (records, read_columns) = read_users(&path).unwrap();
        assert_eq!(read_columns, columns);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["note"], "likes; semicolons");
        assert_eq!(records[1]["name"], "Bob");
        assert!(!tmp.path().join("users.csv.tmp").exists());
    }

    #[test]
    fn test_write_fills_missing_keys_with_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("users.csv");
        let mut partial = UserRecord::new();
        partial.insert("name".into(), "Carol".into());
        write_users(&[partial], &cols(&["extra", "name", "id"]), &path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines, vec!["name;id;extra", "Carol;;"]);
    }

    #[test]
    fn test_find_user_index_matching_rules() {
        let columns = cols(&["name", "id"]);
        let records = vec![
            blank_record(&columns, "Alice", "123"),
            blank_record(&columns, "alice", "123"),
            blank_record(&columns, "Bob", "ABC"),
        ];
        assert_eq!(find_user_index(&records, "ALICE", "123"), Some(0));
        assert_eq!(find_user_index(&records, "bob", "ABC"), Some(2));
        assert_eq!(find_user_index(&records, "bob", "abc"), None);
        assert_eq!(find_user_index(&records, "Carol", "1"), None);
    }

    #[test]
    fn test_ensure_user_row_appends_once() {
        let columns = cols(&["name", "id", "grade"]);
        let mut records = Vec::new();
        let first = ensure_user_row(&mut records, &columns, "Alice", "1");
        let second = ensure_user_row(&mut records, &columns, "ALICE", "1");
        assert_eq!(first, 0);
        assert_eq!(second, 0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["grade"], "");
    }

    #[test]
    fn test_dedupe_user_keeps_first_match_only() {
        let columns = cols(&["name", "id"]);
        let mut records = vec![
            blank_record(&columns, "Bob", "2"),
            blank_record(&columns, "Alice", "1"),
            blank_record(&columns, "Bob", "2"),
            blank_record(&columns, "alice", "1"),
            blank_record(&columns, "ALICE", "1"),
        ];
        let removed = dedupe_user(&mut records, "Alice", "1");
        assert_eq!(removed, 2);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1]["name"], "Alice");
        // Other duplicated pairs are untouched.
        assert_eq!(find_user_index(&records, "Bob", "2"), Some(0));
        assert_eq!(records[2]["name"], "Bob");
    }
}
