//! Tabular data as extracted from the report workbook, and its text-only form
//! for the destination sheet

use chrono::{Duration, NaiveDateTime, NaiveTime};
use std::fmt;

/// One typed cell of an extracted table
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing value
    Empty,
    Text(String),
    /// Integral number (workbook numbers without a fractional part)
    Int(i64),
    /// Floating point number
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    /// Time of day without a date
    Time(NaiveTime),
    /// Elapsed time (`[h]:mm:ss` style cells)
    Duration(Duration),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Display string for a text-only destination; missing values become `""`
    pub fn to_display_string(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Int(i) => i.to_string(),
            Cell::Number(n) => format_float(*n),
            Cell::Bool(true) => "True".to_string(),
            Cell::Bool(false) => "False".to_string(),
            Cell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Cell::Time(t) => t.format("%H:%M:%S").to_string(),
            Cell::Duration(d) => format_duration(d),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

/// Floats always carry a decimal point (`3.0`, `1.5`, `2.25`)
fn format_float(n: f64) -> String {
    if n.is_nan() {
        return String::new();
    }
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}

/// `D days HH:MM:SS` (unconverted durations only show up in mixed columns)
fn format_duration(d: &Duration) -> String {
    let total = d.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    let days = total / 86_400;
    let rem = total % 86_400;
    format!(
        "{}{} days {:02}:{:02}:{:02}",
        sign,
        days,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

static MISSING: Cell = Cell::Empty;

/// Ordered named columns with typed cells
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the column count
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column, top to bottom
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Cell> + 'a> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(move |row| row.get(idx).unwrap_or(&MISSING)),
        )
    }
}

/// Text-only table: header plus rows of display strings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SheetValues {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetValues {
    /// Header row followed by data rows, as sent to the sheet in one update
    pub fn to_grid(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.header.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_display_strings() {
        assert_eq!(Cell::Empty.to_display_string(), "");
        assert_eq!(Cell::Number(1.5).to_display_string(), "1.5");
        assert_eq!(Cell::Number(3.0).to_display_string(), "3.0");
        assert_eq!(Cell::Int(42).to_display_string(), "42");
        assert_eq!(Cell::Bool(true).to_display_string(), "True");
        assert_eq!(Cell::Number(f64::NAN).to_display_string(), "");

        let dt = NaiveDate::from_ymd_opt(2026, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Cell::DateTime(dt).to_display_string(), "2026-02-01 00:00:00");
        assert_eq!(
            Cell::Duration(Duration::seconds(5400)).to_display_string(),
            "0 days 01:30:00"
        );
    }

    #[test]
    fn test_push_row_pads_to_width() {
        let mut table = Table::new(vec!["a".into(), "b".into(), "c".into()]);
        table.push_row(vec![Cell::text("x")]);
        assert_eq!(table.rows[0], vec![Cell::text("x"), Cell::Empty, Cell::Empty]);
    }

    #[test]
    fn test_column_of_ragged_rows() {
        let table = Table {
            columns: vec!["a".into(), "b".into()],
            rows: vec![vec![Cell::text("x"), Cell::Int(1)], vec![Cell::text("y")]],
        };
        let b: Vec<&Cell> = table.column("b").unwrap().collect();
        assert_eq!(b, vec![&Cell::Int(1), &Cell::Empty]);
    }

    #[test]
    fn test_grid_has_header_first() {
        let values = SheetValues {
            header: vec!["作業ID".into(), "内容".into()],
            rows: vec![vec!["T001".into(), "テスト".into()]],
        };
        assert_eq!(
            values.to_grid(),
            vec![vec!["作業ID", "内容"], vec!["T001", "テスト"]]
        );
        assert_eq!(values.get(0, "内容"), Some("テスト"));
    }
}
