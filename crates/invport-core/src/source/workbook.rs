//! Spreadsheet workbooks read through calamine, one [`Table`] per worksheet.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use super::table::{clean_column_name, Table};
use super::Result;
use crate::error::SourceError;

/// All worksheets of a workbook, in workbook order.
#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<(String, Table)>,
}

/// How the worksheets of a workbook should be processed.
#[derive(Debug, Clone, Copy)]
pub enum SheetLayout<'a> {
    /// A header sheet and a line sheet linked by invoice number.
    Split {
        header_sheet: &'a str,
        headers: &'a Table,
        line_sheet: &'a str,
        lines: &'a Table,
    },
    /// One sheet carrying headers and lines together.
    Combined { sheet: &'a str, table: &'a Table },
}

impl Workbook {
    /// Open a workbook and read every worksheet. Row 1 of each sheet is the header.
    pub fn open(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)?;
        let names: Vec<String> = workbook.sheet_names().to_vec();

        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            let range = workbook.worksheet_range(&name)?;
            let table = range_to_table(&range);
            debug!(
                "Worksheet '{}': {} columns, {} rows",
                name,
                table.columns().len(),
                table.len()
            );
            sheets.push((name, table));
        }

        Ok(Self { sheets })
    }

    /// Build a workbook from already-parsed sheets.
    pub fn from_sheets(sheets: Vec<(String, Table)>) -> Self {
        Self { sheets }
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|(name, _)| name.as_str())
    }

    /// Pick the processing layout by worksheet name.
    ///
    /// A sheet whose name contains `header` and another containing `line`
    /// (case-insensitive) form a split layout. Otherwise the `header` or
    /// `line` sheet found, or else the first sheet, is a combined source.
    pub fn layout(&self) -> Result<SheetLayout<'_>> {
        let header = self.find_sheet("header", None);
        let line = self.find_sheet("line", header);

        let layout = match (header, line) {
            (Some(h), Some(l)) => SheetLayout::Split {
                header_sheet: &self.sheets[h].0,
                headers: &self.sheets[h].1,
                line_sheet: &self.sheets[l].0,
                lines: &self.sheets[l].1,
            },
            (Some(i), None) | (None, Some(i)) => self.combined(i),
            (None, None) if !self.sheets.is_empty() => self.combined(0),
            (None, None) => return Err(SourceError::Workbook("workbook has no sheets".to_string())),
        };
        Ok(layout)
    }

    fn combined(&self, i: usize) -> SheetLayout<'_> {
        SheetLayout::Combined {
            sheet: &self.sheets[i].0,
            table: &self.sheets[i].1,
        }
    }

    fn find_sheet(&self, needle: &str, skip: Option<usize>) -> Option<usize> {
        self.sheets
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .find(|(_, (name, _))| name.to_lowercase().contains(needle))
            .map(|(i, _)| i)
    }
}

/// Sheet row 1 is always the header, and row numbers are sheet positions
/// with the header excluded, so they still match after skipped empty rows.
fn range_to_table(range: &calamine::Range<Data>) -> Table {
    let Some((first_row, _)) = range.start() else {
        return Table::new(Vec::new(), Vec::new());
    };
    let first_row = first_row as usize;
    let mut rows = range.rows().enumerate().map(|(i, row)| (first_row + i, row));

    let columns: Vec<String> = if first_row == 0 {
        rows.next()
            .map(|(_, header)| {
                header
                    .iter()
                    .map(|cell| clean_column_name(&cell_to_string(cell)))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
    } else {
        debug!("Sheet row 1 is empty, naming columns by position");
        (1..=range.width()).map(|i| format!("column{}", i)).collect()
    };

    let data = rows
        .map(|(number, row)| (number, row.iter().map(cell_to_string).collect::<Vec<_>>()))
        .filter(|(_, row)| row.iter().any(|v| !v.trim().is_empty()))
        .collect();

    Table::with_row_numbers(columns, data)
}

/// Render a cell as the raw string the coercion rules expect.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.time() == chrono::NaiveTime::MIN => {
                value.format("%Y-%m-%d").to_string()
            }
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str]) -> Table {
        Table::new(columns.iter().map(|c| c.to_string()).collect(), Vec::new())
    }

    #[test]
    fn test_split_layout() {
        let workbook = Workbook::from_sheets(vec![
            ("Invoice Lines".to_string(), table(&["invoice_number", "tka_name"])),
            ("Invoice Header".to_string(), table(&["invoice_number", "company_name"])),
        ]);

        match workbook.layout().unwrap() {
            SheetLayout::Split {
                header_sheet,
                line_sheet,
                ..
            } => {
                assert_eq!(header_sheet, "Invoice Header");
                assert_eq!(line_sheet, "Invoice Lines");
            }
            other => panic!("unexpected layout {:?}", other),
        }
    }

    #[test]
    fn test_first_sheet_when_no_names_match() {
        let workbook = Workbook::from_sheets(vec![
            ("Sheet1".to_string(), table(&["a"])),
            ("Sheet2".to_string(), table(&["b"])),
        ]);

        match workbook.layout().unwrap() {
            SheetLayout::Combined { sheet, .. } => assert_eq!(sheet, "Sheet1"),
            other => panic!("unexpected layout {:?}", other),
        }
    }

    #[test]
    fn test_lone_line_sheet_is_combined() {
        let workbook = Workbook::from_sheets(vec![
            ("Summary".to_string(), table(&["a"])),
            ("LINES".to_string(), table(&["b"])),
        ]);

        match workbook.layout().unwrap() {
            SheetLayout::Combined { sheet, .. } => assert_eq!(sheet, "LINES"),
            other => panic!("unexpected layout {:?}", other),
        }
    }

    #[test]
    fn test_empty_workbook_is_error() {
        let workbook = Workbook::from_sheets(Vec::new());
        assert!(workbook.layout().is_err());
    }

    fn text(value: &str) -> Data {
        Data::String(value.to_string())
    }

    #[test]
    fn test_row_numbers_follow_sheet_rows() {
        let mut range = calamine::Range::new((0, 0), (3, 1));
        range.set_value((0, 0), text("Invoice Number"));
        range.set_value((0, 1), text("Worker"));
        range.set_value((1, 0), text("INV-1"));
        range.set_value((3, 0), text("INV-2"));

        let table = range_to_table(&range);
        let rows: Vec<(usize, Option<&str>)> =
            table.rows().map(|r| (r.number(), r.get("invoice_number"))).collect();

        assert_eq!(table.columns(), ["invoice_number", "worker"]);
        assert_eq!(rows, vec![(1, Some("INV-1")), (3, Some("INV-2"))]);
    }

    #[test]
    fn test_empty_first_row_is_unnamed_header() {
        let mut range = calamine::Range::new((1, 0), (2, 1));
        range.set_value((1, 0), text("invoice_number"));
        range.set_value((2, 0), text("INV-1"));

        let table = range_to_table(&range);

        assert_eq!(table.columns(), ["column1", "column2"]);
        let numbers: Vec<usize> = table.rows().map(|r| r.number()).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_empty_range() {
        let range: calamine::Range<Data> = calamine::Range::empty();
        let table = range_to_table(&range);
        assert!(table.columns().is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Float(3.0)), "3");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::String(" x ".into())), " x ");
    }
}
