//! Column layout for key/value and tabular output.
//!
//! Every column but the last is padded to its widest cell plus `padding`
//! spaces; the last column is written as-is so rows carry no trailing
//! whitespace. Widths are display widths, so wide characters line up. Cells
//! are plain text; styling is applied to whole lines after layout.

use unicode_width::UnicodeWidthStr;

pub fn format_rows(prefix: &str, rows: &[Vec<String>], padding: usize) -> Vec<String> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    rows.iter()
        .map(|row| {
            let mut line = String::from(prefix);
            for (i, cell) in row.iter().enumerate() {
                line.push_str(cell);
                if i + 1 < row.len() {
                    let fill = widths[i] - cell.width() + padding;
                    line.push_str(&" ".repeat(fill));
                }
            }
            line.trim_end().to_string()
        })
        .collect()
}
