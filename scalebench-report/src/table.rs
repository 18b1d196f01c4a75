//! Console Table
//!
//! Fixed-width rendering for the sweep comparison: header, per-column dash
//! separator, one row per worker count. Columns are left-justified and
//! separated by two spaces.

/// Render an aligned table. Every column is padded to its widest cell.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let fmt_row = |parts: &[String]| -> String {
        parts
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{:<width$}", p, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let separator = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("  ");

    let mut lines = vec![fmt_row(&header_cells), separator];
    lines.extend(rows.iter().map(|r| fmt_row(r)));
    lines.join("\n")
}
