//! The import driver: detect, parse, classify, extract, aggregate, validate.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Local, NaiveDate};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::aggregator::Aggregator;
use super::classifier::{classify, Structure};
use super::result::{ImportError, ImportResult, ImportWarning};
use crate::error::SourceError;
use crate::invoice::columns::{FieldSource, JsonFields, LogicalField};
use crate::invoice::extractor::RowExtractor;
use crate::invoice::validation::validate_all;
use crate::models::config::ImportOptions;
use crate::source::{self, decode_text, detect_delimiter, FileType, SheetLayout, Table, TextEncoding, Workbook};

/// Shared flag for cooperative cancellation, polled between rows.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What [`Importer::inspect`] found without importing.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub file_type: FileType,

    /// Text encoding, for delimited text and JSON.
    pub encoding: Option<TextEncoding>,

    /// Field delimiter, for delimited text.
    pub delimiter: Option<char>,

    /// Worksheet names, for workbooks.
    pub sheets: Vec<String>,

    /// `(header sheet, line sheet)` when the workbook is split.
    pub split_sheets: Option<(String, String)>,

    /// Column names of the main table, or keys of the first JSON record.
    pub columns: Vec<String>,

    pub structure: Option<Structure>,

    /// Data rows, or top-level JSON records.
    pub records: usize,
}

type ProgressFn = Arc<dyn Fn(usize) + Send + Sync>;

/// Runs imports with a fixed set of options.
#[derive(Clone)]
pub struct Importer {
    options: ImportOptions,
    cancel: CancelToken,
    today: NaiveDate,
    progress: Option<ProgressFn>,
}

impl fmt::Debug for Importer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Importer")
            .field("options", &self.options)
            .field("cancel", &self.cancel)
            .field("today", &self.today)
            .finish_non_exhaustive()
    }
}

impl Importer {
    pub fn new(options: ImportOptions) -> Self {
        Self {
            options,
            cancel: CancelToken::new(),
            today: Local::now().date_naive(),
            progress: None,
        }
    }

    /// Use a token shared with the caller.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fix the date used for defaults and synthetic invoice numbers.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Call `progress` with the running count of processed records after each one.
    pub fn with_progress(mut self, progress: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Import a file. File-level failures are reported on the result, never returned.
    pub fn import_file(&self, path: &Path) -> ImportResult {
        let file_type = FileType::from_path(path);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!("Importing {} as {:?}", path.display(), file_type);
        let mut run = self.start(file_name, file_type);

        let outcome = match file_type {
            FileType::DelimitedText => read_file(path).and_then(|bytes| {
                let (text, encoding) = decode_text(&bytes, self.options.encoding);
                debug!("Decoded {} as {}", path.display(), encoding.label());
                run.delimited(&text)
            }),
            FileType::Spreadsheet => open_workbook(path).and_then(|workbook| run.workbook(&workbook)),
            FileType::JsonDocument => read_file(path).and_then(|bytes| {
                let (text, _) = decode_text(&bytes, None);
                run.json(&text)
            }),
        };

        run.complete(outcome)
    }

    /// Import delimited text already in memory.
    pub fn import_text(&self, file_name: &str, text: &str) -> ImportResult {
        let mut run = self.start(file_name.to_string(), FileType::DelimitedText);
        let outcome = run.delimited(text);
        run.complete(outcome)
    }

    /// Import a JSON document already in memory.
    pub fn import_json_str(&self, file_name: &str, text: &str) -> ImportResult {
        let mut run = self.start(file_name.to_string(), FileType::JsonDocument);
        let outcome = run.json(text);
        run.complete(outcome)
    }

    /// Import an already-read workbook.
    pub fn import_workbook(&self, file_name: &str, workbook: &Workbook) -> ImportResult {
        let mut run = self.start(file_name.to_string(), FileType::Spreadsheet);
        let outcome = run.workbook(workbook);
        run.complete(outcome)
    }

    /// Detect format, encoding, delimiter, columns and structure of a file.
    pub fn inspect(&self, path: &Path) -> crate::Result<Detection> {
        let file_type = FileType::from_path(path);
        let mut detection = Detection {
            file_type,
            encoding: None,
            delimiter: None,
            sheets: Vec::new(),
            split_sheets: None,
            columns: Vec::new(),
            structure: None,
            records: 0,
        };

        match file_type {
            FileType::DelimitedText => {
                let (text, encoding) = decode_text(&read_file(path)?, self.options.encoding);
                let delimiter = self.options.delimiter.unwrap_or_else(|| detect_delimiter(&text));
                let table = Table::from_delimited(&text, delimiter, self.options.has_headers)?;

                detection.encoding = Some(encoding);
                detection.delimiter = Some(delimiter);
                detection.structure = Some(classify(table.columns()));
                detection.columns = table.columns().to_vec();
                detection.records = table.len();
            }
            FileType::Spreadsheet => {
                let workbook = open_workbook(path)?;
                detection.sheets = workbook.sheet_names().map(str::to_string).collect();
                match workbook.layout()? {
                    SheetLayout::Split {
                        header_sheet,
                        headers,
                        line_sheet,
                        lines,
                    } => {
                        detection.split_sheets = Some((header_sheet.to_string(), line_sheet.to_string()));
                        detection.columns = lines.columns().to_vec();
                        detection.records = headers.len() + lines.len();
                    }
                    SheetLayout::Combined { table, .. } => {
                        detection.structure = Some(classify(table.columns()));
                        detection.columns = table.columns().to_vec();
                        detection.records = table.len();
                    }
                }
            }
            FileType::JsonDocument => {
                let (text, encoding) = decode_text(&read_file(path)?, None);
                let records = source::json::read_records(&text)?;

                detection.encoding = Some(encoding);
                detection.columns = records
                    .first()
                    .and_then(Value::as_object)
                    .map(|o| o.keys().cloned().collect())
                    .unwrap_or_default();
                detection.records = records.len();
            }
        }

        Ok(detection)
    }

    fn start(&self, file_name: String, file_type: FileType) -> ImportRun<'_> {
        ImportRun {
            options: &self.options,
            cancel: &self.cancel,
            progress: self.progress.as_ref(),
            extractor: RowExtractor::new(&self.options, self.today),
            aggregator: Aggregator::new(),
            result: ImportResult::new(file_name, Some(file_type), &self.options),
        }
    }
}

fn read_file(path: &Path) -> source::Result<Vec<u8>> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.display().to_string()));
    }
    Ok(fs::read(path)?)
}

fn open_workbook(path: &Path) -> source::Result<Workbook> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.display().to_string()));
    }
    Workbook::open(path)
}

/// State of one import, consumed by [`ImportRun::complete`].
struct ImportRun<'a> {
    options: &'a ImportOptions,
    cancel: &'a CancelToken,
    progress: Option<&'a ProgressFn>,
    extractor: RowExtractor,
    aggregator: Aggregator,
    result: ImportResult,
}

impl ImportRun<'_> {
    fn delimited(&mut self, text: &str) -> source::Result<()> {
        let delimiter = self.options.delimiter.unwrap_or_else(|| detect_delimiter(text));
        debug!("Using delimiter {:?}", delimiter);

        let table = Table::from_delimited(text, delimiter, self.options.has_headers)?;
        self.table(&table, None);
        Ok(())
    }

    fn workbook(&mut self, workbook: &Workbook) -> source::Result<()> {
        match workbook.layout()? {
            SheetLayout::Split {
                header_sheet,
                headers,
                line_sheet,
                lines,
            } => {
                debug!("Split workbook: headers in '{}', lines in '{}'", header_sheet, line_sheet);
                self.split(header_sheet, headers, line_sheet, lines);
            }
            SheetLayout::Combined { sheet, table } => {
                debug!("Combined workbook: using sheet '{}'", sheet);
                self.table(table, Some(sheet));
            }
        }
        Ok(())
    }

    fn json(&mut self, text: &str) -> source::Result<()> {
        let records = source::json::read_records(text)?;
        self.result.total_records = records.len();

        for (i, record) in records.iter().enumerate() {
            if self.should_stop() {
                break;
            }
            let number = i + 1;

            let Some(object) = record.as_object() else {
                self.fail(number, None, "record", "Expected an invoice object".to_string());
                continue;
            };
            let fields = JsonFields::new(object, number);

            match object.get("lines") {
                None => self.grouped_record(&fields, None),
                Some(Value::Array(lines)) => self.json_invoice(&fields, lines),
                Some(_) => self.fail(number, None, "lines", "lines must be an array".to_string()),
            }
        }
        Ok(())
    }

    fn table(&mut self, table: &Table, sheet: Option<&str>) {
        let structure = classify(table.columns());
        debug!("Classified {} columns as {:?}", table.columns().len(), structure);
        self.result.structure = Some(structure);
        self.result.total_records += table.len();

        match structure {
            Structure::MultiInvoice => {
                for row in table.rows() {
                    if self.should_stop() {
                        break;
                    }
                    self.grouped_record(&row, sheet);
                }
            }
            Structure::SingleInvoice => {
                if self.should_stop() {
                    return;
                }
                let header = self.extractor.synthetic_header(self.options);
                let number = header.invoice_number.clone();
                self.aggregator.insert(header);

                for row in table.rows() {
                    if self.should_stop() {
                        break;
                    }
                    let mut warnings = Vec::new();
                    if let Some(line) = self.extractor.line(&row, &mut warnings) {
                        if let Some(invoice) = self.aggregator.get_mut(&number) {
                            invoice.lines.push(line);
                        }
                    }
                    self.accept(warnings, sheet);
                }
            }
        }
    }

    fn split(&mut self, header_sheet: &str, headers: &Table, line_sheet: &str, lines: &Table) {
        self.result.total_records += headers.len() + lines.len();
        let header_sheet = Some(header_sheet);
        let line_sheet = Some(line_sheet);

        for row in headers.rows() {
            if self.should_stop() {
                break;
            }
            let Some(number) = self.extractor.invoice_number(&row) else {
                self.missing_number(row.number(), header_sheet);
                continue;
            };

            let mut warnings = Vec::new();
            if self.aggregator.contains(&number) {
                warnings.push(ImportWarning::new(
                    row.number(),
                    LogicalField::InvoiceNumber.name(),
                    format!("Duplicate header for invoice {}, first one kept", number),
                ));
            } else {
                let header = self.extractor.header(&row, &number, &mut warnings);
                self.aggregator.insert(header);
            }
            self.accept(warnings, header_sheet);
        }

        for row in lines.rows() {
            if self.should_stop() {
                break;
            }
            let Some(number) = self.extractor.invoice_number(&row) else {
                self.missing_number(row.number(), line_sheet);
                continue;
            };

            let mut warnings = Vec::new();
            let line = self.extractor.line(&row, &mut warnings);
            match self.aggregator.get_mut(&number) {
                Some(invoice) => {
                    invoice.lines.extend(line);
                    self.accept(warnings, line_sheet);
                }
                None => self.fail(
                    row.number(),
                    line_sheet,
                    LogicalField::InvoiceNumber.name(),
                    format!("No header found for invoice {}", number),
                ),
            }
        }
    }

    /// A record carrying its own invoice number: header on first sight, then a line.
    fn grouped_record(&mut self, src: &impl FieldSource, sheet: Option<&str>) {
        let Some(number) = self.extractor.invoice_number(src) else {
            self.missing_number(src.row_number(), sheet);
            return;
        };

        let mut warnings = Vec::new();
        let extractor = &self.extractor;
        let invoice = self
            .aggregator
            .get_or_insert_with(&number, || extractor.header(src, &number, &mut warnings));
        if let Some(line) = extractor.line(src, &mut warnings) {
            invoice.lines.push(line);
        }
        self.accept(warnings, sheet);
    }

    /// A JSON invoice object with nested `lines`.
    fn json_invoice(&mut self, fields: &JsonFields<'_>, lines: &[Value]) {
        let row = fields.row_number();
        let Some(number) = self.extractor.invoice_number(fields) else {
            self.missing_number(row, None);
            return;
        };

        let mut warnings = Vec::new();
        let extractor = &self.extractor;
        let invoice = self
            .aggregator
            .get_or_insert_with(&number, || extractor.header(fields, &number, &mut warnings));

        for (i, value) in lines.iter().enumerate() {
            match value.as_object() {
                Some(object) => {
                    if let Some(line) = extractor.line(&JsonFields::new(object, row), &mut warnings) {
                        invoice.lines.push(line);
                    }
                }
                None => warnings.push(ImportWarning::new(
                    row,
                    "lines",
                    format!("Line {} is not an object, skipped", i + 1),
                )),
            }
        }
        self.accept(warnings, None);
    }

    fn should_stop(&mut self) -> bool {
        if !self.cancel.is_cancelled() {
            return false;
        }
        if !self.result.cancelled {
            warn!(
                "Import of {} cancelled after {} records",
                self.result.file_name,
                self.result.success_count + self.result.failed_count
            );
            self.result.cancelled = true;
        }
        true
    }

    fn accept(&mut self, warnings: Vec<ImportWarning>, sheet: Option<&str>) {
        self.result
            .warnings
            .extend(warnings.into_iter().map(|w| w.in_sheet(sheet)));
        self.result.record_success();
        self.report_progress();
    }

    fn missing_number(&mut self, row: usize, sheet: Option<&str>) {
        self.fail(
            row,
            sheet,
            LogicalField::InvoiceNumber.name(),
            "Invoice number is required".to_string(),
        );
    }

    fn fail(&mut self, row: usize, sheet: Option<&str>, field: &str, message: String) {
        warn!("Row {}: {}", row, message);
        self.result
            .record_failure(ImportError::new(row, field, message).in_sheet(sheet));
        self.report_progress();
    }

    fn report_progress(&self) {
        if let Some(progress) = self.progress {
            progress(self.result.success_count + self.result.failed_count);
        }
    }

    fn complete(self, outcome: source::Result<()>) -> ImportResult {
        let mut result = self.result;

        if let Err(err) = outcome {
            warn!("Import of {} failed: {}", result.file_name, err);
            result.file_error(err.to_string());
            return result;
        }

        let invoices = self.aggregator.finish();
        let validation = validate_all(&invoices);
        result.finish(invoices, validation);

        info!(
            "Imported {}: {} records, {} ok, {} failed, {} invoices, {} validation issues",
            result.file_name,
            result.total_records,
            result.success_count,
            result.failed_count,
            result.invoices.len(),
            result.validation.len()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn importer() -> Importer {
        Importer::new(ImportOptions::default()).with_today(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
    }

    const MULTI: &str = "\
invoice_number,company_name,invoice_date,tka_name,job_name,quantity,unit_price
INV-1,PT Maju,31/12/2024,Budi,Welding,1,100
INV-1,PT Maju,31/12/2024,Sari,Welding,1,200
INV-2,PT Jaya,2024-12-30,Andi,Painting,2,150
";

    #[test]
    fn test_multi_invoice_grouping() {
        let result = importer().import_text("multi.csv", MULTI);

        assert!(result.success);
        assert_eq!(result.structure, Some(Structure::MultiInvoice));
        assert_eq!(result.total_records, 3);
        assert_eq!(result.success_count, 3);
        assert_eq!(result.invoices.len(), 2);
        assert_eq!(result.invoices[0].lines.len(), 2);
        assert_eq!(result.invoices[0].subtotal, Decimal::from(300));
        assert_eq!(result.invoices[0].vat_amount, Decimal::from(33));
        assert_eq!(result.invoices[1].total, Decimal::from(333));
        assert!(result.validation.is_empty());
    }

    #[test]
    fn test_single_invoice_mode() {
        let text = "no,description,quantity,unit_price,total\n1,Welding,2,100,\n2,Painting,1,50,\n";
        let result = importer().import_text("lines.csv", text);

        assert_eq!(result.structure, Some(Structure::SingleInvoice));
        assert_eq!(result.invoices.len(), 1);
        let invoice = &result.invoices[0];
        assert_eq!(invoice.invoice_number(), "IMP-20250115-001");
        assert_eq!(invoice.header.company_name, "Imported Company");
        assert_eq!(invoice.lines.len(), 2);
        assert_eq!(invoice.subtotal, Decimal::from(250));
        // No worker column, so every line fails the worker rule.
        assert_eq!(result.validation.len(), 2);
    }

    #[test]
    fn test_empty_text_is_file_error() {
        let result = importer().import_text("empty.csv", "\n\n");
        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row, 0);
        assert_eq!(result.total_records, 0);
    }

    #[test]
    fn test_cancelled_before_start() {
        let importer = importer();
        importer.cancel_token().cancel();
        let result = importer.import_text("multi.csv", MULTI);

        assert!(result.cancelled);
        assert_eq!(result.success_count, 0);
        assert!(result.invoices.is_empty());
    }

    #[test]
    fn test_cancelled_mid_run_keeps_processed_rows() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let importer = importer().with_cancel_token(cancel).with_progress(move |done| {
            if done == 2 {
                trigger.cancel();
            }
        });

        let result = importer.import_text("multi.csv", MULTI);

        assert!(result.cancelled);
        assert!(result.success);
        assert_eq!(result.total_records, 3);
        assert_eq!(result.success_count, 2);
        assert_eq!(result.invoices.len(), 1);

        let invoice = &result.invoices[0];
        assert_eq!(invoice.invoice_number(), "INV-1");
        assert_eq!(invoice.lines.len(), 2);
        assert_eq!(invoice.subtotal, Decimal::from(300));
        assert_eq!(invoice.total, Decimal::from(333));
    }

    #[test]
    fn test_progress_counts_failed_rows() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let text = "invoice_number,tka_name
INV-1,Budi
,Sari
INV-1,Andi
";

        importer()
            .with_progress(move |done| sink.lock().unwrap().push(done))
            .import_text("progress.csv", text);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_single_invoice_cancelled_before_start_has_no_invoice() {
        let importer = importer();
        importer.cancel_token().cancel();
        let result = importer.import_text("lines.csv", "no,description,quantity,price
1,Welding,2,100
");

        assert!(result.cancelled);
        assert_eq!(result.structure, Some(Structure::SingleInvoice));
        assert!(result.invoices.is_empty());
        assert!(result.validation.is_empty());
    }

    #[test]
    fn test_single_invoice_without_rows_keeps_header() {
        let result = importer().import_text("lines.csv", "no,description,quantity,price
");

        assert_eq!(result.invoices.len(), 1);
        assert_eq!(result.validation[0].message, "Invoice must have at least one line");
    }

    #[test]
    fn test_inspect_missing_file() {
        let err = importer().inspect(Path::new("does-not-exist.csv")).unwrap_err();
        assert!(matches!(
            err,
            crate::InvportError::Source(SourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_json_nested_lines() {
        let text = r#"{
            "invoice_number": "INV-5",
            "company_name": "PT Maju",
            "invoice_date": "2024-12-31",
            "lines": [
                {"tka_name": "Budi", "job_name": "Welding", "quantity": 2, "unit_price": "Rp 1.000"},
                "bogus"
            ]
        }"#;
        let result = importer().import_json_str("one.json", text);

        assert!(result.success);
        assert_eq!(result.invoices.len(), 1);
        assert_eq!(result.invoices[0].lines[0].line_total, Decimal::from(2000));
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].field, "lines");
    }

    #[test]
    fn test_json_non_object_record_is_row_error() {
        let result = importer().import_json_str("bad.json", r#"[{"invoice_number": "A", "company_name": "X", "tka_name": "Budi"}, 5]"#);

        assert_eq!(result.total_records, 2);
        assert_eq!(result.success_count, 1);
        assert_eq!(result.failed_count, 1);
        assert_eq!(result.errors[0].row, 2);
    }
}
