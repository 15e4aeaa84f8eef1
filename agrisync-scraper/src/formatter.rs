//! Record formatter: reshape the extracted report for the destination sheet
//!
//! Two pure steps, applied in this order:
//! 1. [`format`] - domain semantics: drop all-empty rows, durations → hours
//! 2. [`clean_for_sheets`] - destination constraint: everything is text
//!
//! Durations must be converted before stringification, otherwise they would
//! reach the sheet as `0 days 01:30:00` instead of `1.5`.

use crate::table::{Cell, SheetValues, Table};

/// Drop fully-empty rows and convert duration columns to fractional hours
pub fn format(table: Table) -> Table {
    let Table { columns, rows } = table;

    let mut rows: Vec<Vec<Cell>> = rows
        .into_iter()
        .filter(|row| !row.iter().all(Cell::is_empty))
        .collect();

    for idx in duration_columns(&rows, columns.len()) {
        for cell in rows.iter_mut().filter_map(|row| row.get_mut(idx)) {
            if let Cell::Duration(d) = cell {
                *cell = Cell::Number(to_hours(d));
            }
        }
    }

    Table { columns, rows }
}

/// Render every cell as a string; missing values become `""`
pub fn clean_for_sheets(table: &Table) -> SheetValues {
    SheetValues {
        header: table.columns.clone(),
        rows: table
            .rows
            .iter()
            .map(|row| row.iter().map(Cell::to_display_string).collect())
            .collect(),
    }
}

/// Columns whose non-missing values are all durations (and there is at least one)
fn duration_columns(rows: &[Vec<Cell>], width: usize) -> Vec<usize> {
    (0..width)
        .filter(|&idx| {
            let mut values = rows
                .iter()
                .filter_map(|row| row.get(idx))
                .filter(|c| !c.is_empty());
            let mut any = false;
            let all = values.all(|c| {
                any = true;
                matches!(c, Cell::Duration(_))
            });
            any && all
        })
        .collect()
}

/// Total seconds / 3600, rounded to 2 decimal places (halves to even)
fn to_hours(d: &chrono::Duration) -> f64 {
    let seconds = d.num_milliseconds() as f64 / 1000.0;
    (seconds / 3600.0 * 100.0).round_ties_even() / 100.0
}
