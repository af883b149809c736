//! Seating grid geometry.
//!
//! Tables fill a grid four columns wide, front to back. When the last row
//! holds exactly two tables, two blank cells go between them so the pair
//! sits at the outer edges of the row instead of bunching up on the left.

use serde::Serialize;

use crate::pairing::Arrangement;

pub const COLUMNS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellKind {
    /// Index into the arrangement's tables.
    Table { index: usize },
    Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub row: usize,
    pub column: usize,
    #[serde(flatten)]
    pub kind: CellKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub columns: usize,
    pub rows: usize,
    pub cells: Vec<Cell>,
}

impl Layout {
    pub fn placeholders(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c.kind, CellKind::Placeholder))
            .count()
    }

    /// Cells of one row, left to right.
    pub fn row(&self, row: usize) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(move |c| c.row == row)
    }
}

/// Computes the grid for `arrangement`. Table order is never changed.
pub fn plan(arrangement: &Arrangement) -> Layout {
    plan_count(arrangement.len())
}

fn plan_count(total: usize) -> Layout {
    if total == 0 {
        return Layout {
            columns: COLUMNS,
            rows: 0,
            cells: Vec::new(),
        };
    }

    let last_row_start = (total - 1) / COLUMNS * COLUMNS;
    let last_row_count = total - last_row_start;
    let spread_last_row = last_row_count == 2;

    let mut cells = Vec::with_capacity(total + 2);
    let mut slot = 0usize;

    for index in 0..total {
        if spread_last_row && index == last_row_start + 1 {
            for _ in 0..2 {
                cells.push(Cell {
                    row: slot / COLUMNS,
                    column: slot % COLUMNS,
                    kind: CellKind::Placeholder,
                });
                slot += 1;
            }
        }

        cells.push(Cell {
            row: slot / COLUMNS,
            column: slot % COLUMNS,
            kind: CellKind::Table { index },
        });
        slot += 1;
    }

    Layout {
        columns: COLUMNS,
        rows: slot.div_ceil(COLUMNS),
        cells,
    }
}
