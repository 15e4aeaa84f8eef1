//! Load the first worksheet of the extracted report into a [`Table`]
//!
//! The first row is the header. Blank headers become `Unnamed: N` and
//! repeated headers get a `.N` suffix so every column name is unique.

use crate::error::{SyncError, SyncResult};
use crate::table::{Cell, Table};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDateTime};
use iso8601_duration::Duration as IsoDuration;
use std::collections::HashMap;
use std::path::Path;

/// Read the first sheet of a workbook file
pub fn load_first_sheet(path: &Path) -> SyncResult<Table> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SyncError::Workbook(format!("{} has no worksheets", path.display())))??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::default());
    };

    let mut table = Table::new(header_names(header));
    for row in rows {
        table.push_row(row.iter().map(to_cell).collect());
    }
    settle_numeric_columns(&mut table);

    tracing::debug!(
        path = %path.display(),
        columns = table.columns.len(),
        rows = table.len(),
        "Workbook loaded"
    );
    Ok(table)
}

fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, data)| {
            let base = match to_cell(data) {
                Cell::Empty => format!("Unnamed: {}", idx),
                cell => cell.to_display_string(),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

/// Numbers are typed per column, not per cell. A column holding only numbers
/// and blanks stays integral only when every cell is an integer; a fraction or
/// a blank anywhere turns all of its integers into floats. Columns that also
/// hold text keep each cell as read.
fn settle_numeric_columns(table: &mut Table) {
    for idx in 0..table.columns.len() {
        let (mut has_int, mut has_float_or_blank) = (false, false);
        let mut numeric_only = true;
        for cell in table.rows.iter().filter_map(|row| row.get(idx)) {
            match cell {
                Cell::Int(_) => has_int = true,
                Cell::Number(_) | Cell::Empty => has_float_or_blank = true,
                _ => numeric_only = false,
            }
        }
        if !(numeric_only && has_int && has_float_or_blank) {
            continue;
        }

        for row in table.rows.iter_mut() {
            if let Some(cell) = row.get_mut(idx) {
                if let Cell::Int(i) = *cell {
                    *cell = Cell::Number(i as f64);
                }
            }
        }
    }
}

/// Convert one workbook value into a typed cell
pub(crate) fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Cell::Int(*f as i64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => Cell::Duration(days_to_duration(dt.as_f64())),
        Data::DateTime(dt) => match dt.as_datetime() {
            // Serial values below one day are times of day without a date
            Some(value) if dt.as_f64() < 1.0 => Cell::Time(value.time()),
            Some(value) => Cell::DateTime(value),
            None => Cell::Empty,
        },
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .map(Cell::DateTime)
            .unwrap_or_else(|_| Cell::Text(s.clone())),
        Data::DurationIso(s) => parse_iso_duration(s)
            .map(Cell::Duration)
            .unwrap_or_else(|| Cell::Text(s.clone())),
    }
}

fn days_to_duration(days: f64) -> Duration {
    Duration::milliseconds((days * 86_400_000.0).round() as i64)
}

fn parse_iso_duration(value: &str) -> Option<Duration> {
    let duration = value.parse::<IsoDuration>().ok()?;
    let seconds = duration.day as f64 * 86_400.0
        + duration.hour as f64 * 3600.0
        + duration.minute as f64 * 60.0
        + duration.second as f64;
    Some(Duration::milliseconds((seconds * 1000.0).round() as i64))
}
