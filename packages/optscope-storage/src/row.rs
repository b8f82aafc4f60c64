//! CSV row encoding for the result table
//!
//! Quoting follows RFC 4180: a field containing a comma, quote, CR or LF is
//! wrapped in quotes with inner quotes doubled. Rows end with `\n`; the reader
//! also accepts `\r\n`.

use crate::error::{Result, StorageError};
use optscope_analysis::{BenchmarkResult, OptFlag};

/// Column count of every row (and the header).
pub const COLUMN_COUNT: usize = 12;

/// Header row, in field order.
pub const HEADER: [&str; COLUMN_COUNT] = [
    "Filename",
    "LOC",
    "ForLoops",
    "WhileLoops",
    "IfStatements",
    "SwitchStatements",
    "O0ExecTime",
    "O1ExecTime",
    "O2ExecTime",
    "O3ExecTime",
    "OfastExecTime",
    "BestFlag",
];

/// Field values of one result, in header order.
pub fn fields(result: &BenchmarkResult) -> Vec<String> {
    let counts = result.features.counts();
    let mut fields = Vec::with_capacity(COLUMN_COUNT);

    fields.push(result.filename.clone());
    fields.push(result.features.lines_of_code.to_string());
    fields.push(counts.for_loops.to_string());
    fields.push(counts.while_loops.to_string());
    fields.push(counts.if_statements.to_string());
    fields.push(counts.switch_statements.to_string());
    for flag in OptFlag::ALL {
        fields.push(result.measurements.get(flag).to_string());
    }
    // Absent best flag is an empty field
    fields.push(
        result
            .best_flag
            .map(|flag| flag.as_arg().to_string())
            .unwrap_or_default(),
    );

    fields
}

/// Encode one line, terminator included.
pub fn encode_line<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|f| quote(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split table text into records of fields.
pub fn parse_records(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
                line += 1;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(StorageError::malformed_row(line, "unterminated quoted field"));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}
