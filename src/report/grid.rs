//! Terminal rendering of a seating grid.
//!
//! Each table takes one cell, two lines tall:
//! - first line: category code and first occupant
//! - second line: second occupant (blank for someone seated alone)
//!
//! Placeholder cells render as empty space so a two-table back row lands
//! in the outer columns.

use crate::layout::CellKind;
use crate::service::Seating;

const CELL_WIDTH: usize = 28;

pub fn render(seating: &Seating) -> String {
    let layout = &seating.layout;
    let tables = seating.arrangement.tables();

    if tables.is_empty() {
        return String::from("No tables.\n");
    }

    let mut output = String::new();
    let rule = "-".repeat((CELL_WIDTH + 2) * layout.columns);

    output.push_str(&format!("{:^width$}\n", "[ front ]", width = rule.len()));
    output.push_str(&rule);
    output.push('\n');

    for row in 0..layout.rows {
        let mut first = String::new();
        let mut second = String::new();

        for cell in layout.row(row) {
            let (top, bottom) = match cell.kind {
                CellKind::Table { index } => match tables.get(index) {
                    Some(table) => (
                        format!("[{}] {}", table.category, truncate(&table.first, CELL_WIDTH - 4)),
                        format!("    {}", truncate(table.second.as_deref().unwrap_or(""), CELL_WIDTH - 4)),
                    ),
                    None => (String::new(), String::new()),
                },
                CellKind::Placeholder => (String::new(), String::new()),
            };
            first.push_str(&format!("  {top:width$}", width = CELL_WIDTH));
            second.push_str(&format!("  {bottom:width$}", width = CELL_WIDTH));
        }

        output.push_str(first.trim_end());
        output.push('\n');
        output.push_str(second.trim_end());
        output.push_str("\n\n");
    }

    let pairs = tables.iter().filter(|t| !t.is_single()).count();
    output.push_str(&format!(
        "{} tables, {} seated\n",
        tables.len(),
        seating.arrangement.names().count()
    ));
    if pairs != tables.len() {
        output.push_str(&format!("{} seated alone\n", tables.len() - pairs));
    }

    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}
