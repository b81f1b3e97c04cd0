//! Output formatting for CLI display.

use crate::manager::QueryReport;

/// Number of columns name listings are laid out in.
pub const COLUMNS: usize = 4;

/// Lay `items` out in rows of four under a single heading, with a dashed
/// rule under the header and columns padded to their widest cell.
#[must_use]
pub fn tabulate<S: AsRef<str>>(items: &[S], heading: &str) -> String {
    let rows: Vec<&[S]> = items.chunks(COLUMNS).collect();

    let mut widths = [0usize; COLUMNS];
    widths[0] = heading.chars().count();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.as_ref().chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let mut header = vec![heading.to_string()];
    header.resize(COLUMNS, String::new());
    lines.push(render_row(&header, &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string(),
    );
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| c.as_ref().to_string()).collect();
        lines.push(render_row(&cells, &widths));
    }

    lines.join("\n")
}

fn render_row(cells: &[String], widths: &[usize; COLUMNS]) -> String {
    cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Human readable rendering of a `--debug` report.
pub fn debug_report(report: &QueryReport) -> String {
    let mut out = String::new();
    let filters = serde_json::to_string_pretty(&report.filters)
        .unwrap_or_else(|e| format!("<unserializable filters: {}>", e));
    out.push_str(&format!("Filters: {}\n", filters));
    for entry in &report.sample {
        out.push_str(&format!("{}\n", entry.path));
        out.push_str(&format!("{} x {}\n", entry.media.width, entry.media.height));
    }
    out.push_str(&format!("Total rows: {}\n", report.total));
    out.push_str(&report.sql);
    out
}
