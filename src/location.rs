//! Byte offset to line/column mapping.
use crate::types::Location;

/// Width of the line separator (`\n`) in bytes.
const SEPARATOR_WIDTH: usize = 1;

/// Map a byte offset in `text` to its line, column, and line text.
///
/// Lines are split on `\n` only; a `\r` before it stays in the line text.
/// Line `n` owns the half-open span `[start, start + len + 1)`, so an offset
/// sitting on a line break belongs to the line that break terminates.
/// Offsets past the end of the text map to the last line, column 0, and an
/// empty line text.
pub fn locate(text: &[u8], offset: usize) -> Location {
    let mut line_start = 0usize;
    let mut line_number = 0usize;

    for line in text.split(|b| return *b == b'\n') {
        line_number = line_number.saturating_add(1);
        let line_end = line_start.saturating_add(line.len()).saturating_add(SEPARATOR_WIDTH);

        if (line_start..line_end).contains(&offset) {
            return Location {
                column_number: offset.saturating_sub(line_start),
                line_number,
                line_text: String::from_utf8_lossy(line).into_owned(),
            };
        }

        line_start = line_end;
    }

    return Location {
        column_number: 0,
        line_number,
        line_text: String::new(),
    };
}
