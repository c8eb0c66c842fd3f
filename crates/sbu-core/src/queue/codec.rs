//! Minimal CSV record codec for the queue file.
//!
//! Covers the subset the queue needs: comma separation, RFC-4180 quoting
//! (embedded commas, quotes, newlines), LF or CRLF terminators. Blank lines
//! are skipped on read.

use std::borrow::Cow;

/// Split `input` into records of fields.
pub fn parse_records(input: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => {
                fields.push(std::mem::take(&mut field));
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                end_record(&mut records, &mut fields, &mut field);
            }
            '\n' => end_record(&mut records, &mut fields, &mut field),
            _ => field.push(c),
        }
    }
    end_record(&mut records, &mut fields, &mut field);

    records
}

fn end_record(records: &mut Vec<Vec<String>>, fields: &mut Vec<String>, field: &mut String) {
    if fields.is_empty() && field.is_empty() {
        // blank line or trailing newline
        return;
    }
    fields.push(std::mem::take(field));
    records.push(std::mem::take(fields));
}

/// Render one record as a CSV line with trailing newline.
pub fn write_record(fields: &[String]) -> String {
    let mut line = String::new();
    for (i, f) in fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape(f));
    }
    line.push('\n');
    line
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
