//! Output files: the columns header, the append-only results file and its
//! deduplicated copy.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use crate::error::ScrapeError;
use crate::fields::{COMMENT_FIELDS, ID_COLUMN, THREAD_CREATED_COLUMN};
use crate::tsv;

/// Overwrite `path` with the single header row.
pub fn write_columns(path: &Path) -> Result<(), ScrapeError> {
    let mut writer = BufWriter::new(File::create(path).map_err(|e| ScrapeError::io(path, e))?);
    tsv::write_row(&mut writer, &COMMENT_FIELDS).map_err(|e| ScrapeError::io(path, e))?;
    writer.flush().map_err(|e| ScrapeError::io(path, e))
}

/// Create `path` empty if it does not exist yet.
pub fn initialize_output_file(path: &Path) -> Result<(), ScrapeError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| ScrapeError::io(path, e))
}

/// Timestamp to resume from: one second before the newest thread already in
/// the output file, so a thread cut off by a crash is fetched again.
/// Without an output file the run starts at `start_time`.
pub fn initial_page_boundary(path: &Path, start_time: i64) -> Result<i64, ScrapeError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(start_time),
        Err(e) => return Err(ScrapeError::io(path, e)),
    };

    let mut latest = start_time;
    for row in tsv::parse_rows(&text) {
        let Some(raw) = row.get(THREAD_CREATED_COLUMN) else {
            continue;
        };
        match raw.parse::<i64>() {
            Ok(created) => latest = latest.max(created),
            Err(_) => tracing::warn!(
                "Skipping row with unparsable thread_created_utc {:?} in {}",
                raw,
                path.display()
            ),
        }
    }
    Ok(latest - 1)
}

/// Copy `input` to `output` keeping only the first row per comment id.
/// Returns the number of rows written.
pub fn deduplicate(input: &Path, output: &Path) -> Result<usize, ScrapeError> {
    let text = fs::read_to_string(input).map_err(|e| ScrapeError::io(input, e))?;
    let mut writer = BufWriter::new(File::create(output).map_err(|e| ScrapeError::io(output, e))?);

    let mut seen = HashSet::new();
    for row in tsv::parse_rows(&text) {
        let id = row.get(ID_COLUMN).cloned().unwrap_or_default();
        if seen.insert(id) {
            tsv::write_row(&mut writer, &row).map_err(|e| ScrapeError::io(output, e))?;
        }
    }
    writer.flush().map_err(|e| ScrapeError::io(output, e))?;
    Ok(seen.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::START_TIME;

    fn row(thread_created: &str, id: &str, body: &str) -> Vec<String> {
        let mut row = vec![String::new(); COMMENT_FIELDS.len()];
        row[0] = "t".to_string();
        row[THREAD_CREATED_COLUMN] = thread_created.to_string();
        row[ID_COLUMN] = id.to_string();
        row[6] = body.to_string();
        row
    }

    fn write_rows(path: &Path, rows: &[Vec<String>]) {
        let mut buf = Vec::new();
        for r in rows {
            tsv::write_row(&mut buf, r).unwrap();
        }
        fs::write(path, buf).unwrap();
    }

    #[test]
    fn test_columns_file_is_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("columns.tsv");
        write_columns(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("thread_id\tthread_created_utc\tid\t"));
        assert!(text.ends_with("treatment_tags\r\n"));
        assert_eq!(tsv::parse_rows(&text).len(), 1);
    }

    #[test]
    fn test_initialize_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        initialize_output_file(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        fs::write(&path, "kept").unwrap();
        initialize_output_file(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "kept");
    }

    #[test]
    fn test_boundary_without_file_is_start_time() {
        let dir = tempfile::tempdir().unwrap();
        let boundary = initial_page_boundary(&dir.path().join("missing.tsv"), START_TIME).unwrap();
        assert_eq!(boundary, START_TIME);
    }

    #[test]
    fn test_boundary_of_empty_file_is_before_start_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        initialize_output_file(&path).unwrap();
        assert_eq!(initial_page_boundary(&path, START_TIME).unwrap(), START_TIME - 1);
    }

    #[test]
    fn test_boundary_is_one_second_before_newest_thread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        write_rows(
            &path,
            &[
                row("1500000000", "a", "multi\nline"),
                row("1600000000", "b", ""),
                row("garbage", "c", ""),
                row("1550000000", "d", ""),
            ],
        );
        assert_eq!(initial_page_boundary(&path, START_TIME).unwrap(), 1_599_999_999);
    }

    #[test]
    fn test_deduplicate_keeps_first_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("out.tsv");
        let output = dir.path().join("dedup.tsv");
        write_rows(
            &input,
            &[
                row("1500000000", "a", "first"),
                row("1500000000", "b", "quoted \"body\""),
                row("1500000000", "a", "second"),
            ],
        );

        let written = deduplicate(&input, &output).unwrap();
        assert_eq!(written, 2);

        let rows = tsv::parse_rows(&fs::read_to_string(&output).unwrap());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][6], "first");
        assert_eq!(rows[1][6], "quoted \"body\"");
    }
}
