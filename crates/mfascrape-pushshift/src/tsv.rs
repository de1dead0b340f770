//! Excel-tab TSV: tab separated, `"` quoting with doubled quotes, minimal
//! quoting, CRLF row terminator.

use std::io::{self, Write};
use std::mem::take;

const SEP: char = '\t';

fn needs_quotes(field: &str) -> bool {
    field.contains(SEP) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

pub fn write_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{}", SEP)?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\r\n")
}

/// Parse TSV text into rows. Quoted fields may span lines; blank lines are
/// skipped; an unterminated quote swallows the rest of the input.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row: Vec<String> = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if matches!(chars.peek(), Some('"')) {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            c if c == SEP && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if row.len() == 1 && row[0].is_empty() {
                    row.clear();
                } else {
                    rows.push(take(&mut row));
                }
            }
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(row: &[&str]) -> String {
        let mut buf = Vec::new();
        write_row(&mut buf, row).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_row_quotes_minimally() {
        assert_eq!(render(&["a", "b c", ""]), "a\tb c\t\r\n");
        assert_eq!(
            render(&["tab\there", "say \"hi\"", "two\nlines"]),
            "\"tab\there\"\t\"say \"\"hi\"\"\"\t\"two\nlines\"\r\n"
        );
    }

    #[test]
    fn test_parse_rows_reads_what_write_row_writes() {
        let mut buf = Vec::new();
        write_row(&mut buf, &["1", "multi\r\nline \"body\"", ""]).unwrap();
        write_row(&mut buf, &["2", "plain", "t3"]).unwrap();
        let rows = parse_rows(&String::from_utf8(buf).unwrap());
        assert_eq!(
            rows,
            vec![
                vec!["1".to_string(), "multi\r\nline \"body\"".to_string(), String::new()],
                vec!["2".to_string(), "plain".to_string(), "t3".to_string()],
            ]
        );
    }

    #[test]
    fn test_parse_rows_skips_blank_lines_and_keeps_trailing_row() {
        let rows = parse_rows("a\tb\n\n\nc\td");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["c", "d"]);
        assert!(parse_rows("").is_empty());
    }

    #[test]
    fn test_quote_inside_unquoted_field_is_literal() {
        assert_eq!(parse_rows("5\" heel\tx\n"), vec![vec!["5\" heel", "x"]]);
    }
}
