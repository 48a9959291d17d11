//! Column-named, row-ordered grid of raw cell strings.

use std::collections::HashMap;

use tracing::debug;

use super::tokenizer::tokenize_line;
use super::Result;
use crate::error::SourceError;

/// In-memory table shared by delimited text and worksheet sources.
///
/// Columns are fixed at construction and every row holds exactly one value
/// per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    numbers: Vec<usize>,
    index: HashMap<String, usize>,
}

/// A borrowed row with its 1-based data row number.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    number: usize,
    values: &'a [String],
}

impl Table {
    /// Build a table, padding or truncating every row to the column count.
    ///
    /// Column names that collide case-insensitively get a `_2`, `_3`, ...
    /// suffix so lookups stay unambiguous.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let numbered = rows.into_iter().enumerate().map(|(i, row)| (i + 1, row)).collect();
        Self::with_row_numbers(columns, numbered)
    }

    /// Like [`Table::new`], but each row carries the number reported for it
    /// in errors and warnings.
    pub fn with_row_numbers(columns: Vec<String>, rows: Vec<(usize, Vec<String>)>) -> Self {
        let mut unique = Vec::with_capacity(columns.len());
        let mut index = HashMap::with_capacity(columns.len());

        for name in columns {
            let mut candidate = name.clone();
            let mut suffix = 2;
            while index.contains_key(&candidate.to_lowercase()) {
                candidate = format!("{}_{}", name, suffix);
                suffix += 1;
            }
            index.insert(candidate.to_lowercase(), unique.len());
            unique.push(candidate);
        }

        let width = unique.len();
        let (numbers, rows): (Vec<usize>, Vec<Vec<String>>) = rows
            .into_iter()
            .map(|(number, mut row)| {
                row.resize(width, String::new());
                (number, row)
            })
            .unzip();

        Self {
            columns: unique,
            rows,
            numbers,
            index,
        }
    }

    /// Parse delimited text.
    ///
    /// Blank lines are skipped. With `has_headers` the first non-blank line
    /// supplies cleaned column names, otherwise columns are named
    /// `column1..columnN` after the first line's field count.
    pub fn from_delimited(text: &str, delimiter: char, has_headers: bool) -> Result<Self> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        let first = lines.next().ok_or(SourceError::Empty)?;
        let first_fields = tokenize_line(first, delimiter);

        let mut rows = Vec::new();
        let columns = if has_headers {
            first_fields.iter().map(|f| clean_column_name(f)).collect()
        } else {
            let names = (1..=first_fields.len()).map(|i| format!("column{}", i)).collect();
            rows.push(first_fields);
            names
        };

        rows.extend(lines.map(|line| tokenize_line(line, delimiter)));

        let table = Self::new(columns, rows);
        debug!(
            "Parsed delimited text: {} columns, {} rows",
            table.columns.len(),
            table.rows.len()
        );
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_lowercase()).copied()
    }

    /// Rows in source order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows
            .iter()
            .zip(&self.numbers)
            .map(move |(values, &number)| Row {
                table: self,
                number,
                values,
            })
    }
}

impl<'a> Row<'a> {
    /// 1-based row number, header excluded.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Raw value of a column, matched case-insensitively.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.table
            .column_index(column)
            .map(|i| self.values[i].as_str())
    }

    pub fn values(&self) -> &'a [String] {
        self.values
    }
}

/// Normalise a header cell: trim, spaces and hyphens to `_`, lower-case.
pub fn clean_column_name(raw: &str) -> String {
    raw.trim().replace([' ', '-'], "_").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_column_name() {
        assert_eq!(clean_column_name("  Invoice Number "), "invoice_number");
        assert_eq!(clean_column_name("Unit-Price"), "unit_price");
        assert_eq!(clean_column_name("TKA Name"), "tka_name");
    }

    #[test]
    fn test_from_delimited_with_headers() {
        let text = "Invoice Number,Company Name\nINV-1,PT Maju\n\nINV-2,PT Jaya\n";
        let table = Table::from_delimited(text, ',', true).unwrap();

        assert_eq!(table.columns(), ["invoice_number", "company_name"]);
        assert_eq!(table.len(), 2);

        let rows: Vec<Row> = table.rows().collect();
        assert_eq!(rows[1].number(), 2);
        assert_eq!(rows[1].get("INVOICE_NUMBER"), Some("INV-2"));
    }

    #[test]
    fn test_from_delimited_without_headers() {
        let table = Table::from_delimited("a;b;c\nd;e;f\n", ';', false).unwrap();

        assert_eq!(table.columns(), ["column1", "column2", "column3"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows().next().unwrap().get("column1"), Some("a"));
    }

    #[test]
    fn test_rows_padded_and_truncated() {
        let table = Table::from_delimited("a,b,c\n1\n1,2,3,4,5\n", ',', true).unwrap();
        let rows: Vec<Row> = table.rows().collect();

        assert_eq!(rows[0].values(), ["1", "", ""]);
        assert_eq!(rows[1].values(), ["1", "2", "3"]);
    }

    #[test]
    fn test_duplicate_columns_made_unique() {
        let table = Table::new(
            vec!["total".to_string(), "Total".to_string(), "total".to_string()],
            vec![vec!["1".into(), "2".into(), "3".into()]],
        );

        assert_eq!(table.columns(), ["total", "Total_2", "total_3"]);
        assert_eq!(table.rows().next().unwrap().get("total_2"), Some("2"));
    }

    #[test]
    fn test_explicit_row_numbers() {
        let table = Table::with_row_numbers(
            vec!["a".to_string()],
            vec![(1, vec!["x".into()]), (4, vec!["y".into()])],
        );
        let numbers: Vec<usize> = table.rows().map(|r| r.number()).collect();
        assert_eq!(numbers, vec![1, 4]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let table = Table::from_delimited("a,b\r\n1,2\r\n", ',', true).unwrap();
        assert_eq!(table.columns(), ["a", "b"]);
        assert_eq!(table.rows().next().unwrap().get("b"), Some("2"));
    }

    #[test]
    fn test_empty_text_is_error() {
        assert!(matches!(
            Table::from_delimited("\n  \n", ',', true),
            Err(SourceError::Empty)
        ));
    }

    #[test]
    fn test_header_only_has_no_rows() {
        let table = Table::from_delimited("a,b\n", ',', true).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_index("B"), Some(1));
    }
}
