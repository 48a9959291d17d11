//! Rendering import results as JSON, CSV or text.

use console::style;

use invport_core::invoice::rules::format_amount;
use invport_core::models::config::OutputConfig;
use invport_core::{FileType, ImportResult, Structure};

use super::import::OutputFormat;

pub fn format_result(
    result: &ImportResult,
    format: OutputFormat,
    output: &OutputConfig,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            if output.pretty_json {
                Ok(serde_json::to_string_pretty(result)?)
            } else {
                Ok(serde_json::to_string(result)?)
            }
        }
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result, output)),
    }
}

pub fn file_type_label(file_type: Option<FileType>) -> &'static str {
    match file_type {
        Some(FileType::DelimitedText) => "delimited text",
        Some(FileType::Spreadsheet) => "spreadsheet",
        Some(FileType::JsonDocument) => "JSON document",
        None => "unknown",
    }
}

pub fn structure_label(structure: Structure) -> &'static str {
    match structure {
        Structure::SingleInvoice => "single invoice",
        Structure::MultiInvoice => "multiple invoices",
    }
}

/// One row per invoice line, header columns repeated. An invoice without
/// lines still gets one row.
fn format_csv(result: &ImportResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    // Write header
    wtr.write_record([
        "invoice_number",
        "company_name",
        "company_tax_id",
        "invoice_date",
        "due_date",
        "vat_percentage",
        "baris",
        "tka_name",
        "tka_passport",
        "job_name",
        "quantity",
        "unit_price",
        "line_total",
        "invoice_subtotal",
        "invoice_vat",
        "invoice_total",
    ])?;

    for invoice in &result.invoices {
        let header = &invoice.header;
        let head = [
            header.invoice_number.clone(),
            header.company_name.clone(),
            header.company_tax_id.clone().unwrap_or_default(),
            header.invoice_date.to_string(),
            header.due_date.map(|d| d.to_string()).unwrap_or_default(),
            header.vat_percentage.to_string(),
        ];
        let totals = [
            invoice.subtotal.to_string(),
            invoice.vat_amount.to_string(),
            invoice.total.to_string(),
        ];

        if invoice.lines.is_empty() {
            let blank = vec![String::new(); 7];
            wtr.write_record(head.iter().chain(&blank).chain(&totals))?;
            continue;
        }

        for line in &invoice.lines {
            let cells = [
                line.baris.to_string(),
                line.tka_name.clone(),
                line.tka_passport.clone().unwrap_or_default(),
                line.job_name.clone(),
                line.quantity.to_string(),
                line.unit_price.to_string(),
                line.line_total.to_string(),
            ];
            wtr.write_record(head.iter().chain(&cells).chain(&totals))?;
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ImportResult, output: &OutputConfig) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "File: {} ({})\n",
        result.file_name,
        file_type_label(result.file_type)
    ));
    if let Some(structure) = result.structure {
        out.push_str(&format!("Structure: {}\n", structure_label(structure)));
    }
    out.push_str(&format!(
        "Records: {} total, {} imported, {} failed\n",
        result.total_records, result.success_count, result.failed_count
    ));
    if result.cancelled {
        out.push_str("Cancelled before the end of the file\n");
    }
    out.push_str(&format!("Invoices: {}\n", result.invoices.len()));

    for invoice in &result.invoices {
        let header = &invoice.header;
        out.push('\n');
        out.push_str(&format!(
            "Invoice {} - {}\n",
            header.invoice_number, header.company_name
        ));
        out.push_str(&format!("  Date: {}\n", header.invoice_date));
        if let Some(due_date) = header.due_date {
            out.push_str(&format!("  Due:  {}\n", due_date));
        }
        if let Some(tax_id) = &header.company_tax_id {
            out.push_str(&format!("  NPWP: {}\n", tax_id));
        }

        for (i, line) in invoice.lines.iter().enumerate() {
            out.push_str(&format!(
                "  {:>3}. {} / {}  {} x {} = {}\n",
                i + 1,
                line.tka_name,
                line.job_name,
                line.quantity,
                format_amount(line.unit_price),
                format_amount(line.line_total)
            ));
        }

        out.push_str(&format!("  Subtotal: {}\n", format_amount(invoice.subtotal)));
        out.push_str(&format!(
            "  VAT ({}%): {}\n",
            header.vat_percentage,
            format_amount(invoice.vat_amount)
        ));
        out.push_str(&format!("  Total:    {}\n", format_amount(invoice.total)));
    }

    if !result.errors.is_empty() {
        out.push_str("\nErrors:\n");
        for error in &result.errors {
            out.push_str(&format!("  - row {}: {}\n", error.row, error.message));
        }
    }

    if !result.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for warning in &result.warnings {
            out.push_str(&format!(
                "  - row {} ({}): {}\n",
                warning.row, warning.field, warning.message
            ));
        }
    }

    if output.show_validation && !result.validation.is_empty() {
        out.push_str("\nValidation:\n");
        for issue in &result.validation {
            out.push_str(&format!("  - {}: {}\n", issue.invoice_number, issue.message));
        }
    }

    out
}

/// Print row errors and validation issues to stderr.
pub fn print_problems(result: &ImportResult, output: &OutputConfig) {
    if !result.errors.is_empty() {
        eprintln!("{}", style("Errors:").red());
        let limit = match output.max_errors_shown {
            0 => result.errors.len(),
            n => n,
        };
        for error in result.errors.iter().take(limit) {
            match &error.sheet {
                Some(sheet) => eprintln!("  - {} row {}: {}", sheet, error.row, error.message),
                None => eprintln!("  - row {}: {}", error.row, error.message),
            }
        }
        if result.errors.len() > limit {
            eprintln!("  ... and {} more", result.errors.len() - limit);
        }
    }

    if output.show_validation && !result.validation.is_empty() {
        eprintln!("{}", style("Validation issues:").yellow());
        for issue in &result.validation {
            eprintln!("  - {}: {}", issue.invoice_number, issue.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invport_core::{ImportOptions, Importer};
    use chrono::NaiveDate;

    const CSV: &str = "\
invoice_number,company_name,invoice_date,tka_name,job_name,quantity,unit_price
INV-1,PT Maju,31/12/2024,Budi,Welding,2,\"1.000\"
INV-1,PT Maju,31/12/2024,Sari,Painting,1,500
";

    fn result() -> ImportResult {
        Importer::new(ImportOptions::default())
            .with_today(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
            .import_text("invoices.csv", CSV)
    }

    #[test]
    fn test_csv_repeats_header_per_line() {
        let csv = format_csv(&result()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("invoice_number,company_name"));
        assert!(lines[1].starts_with("INV-1,PT Maju,,2024-12-31,,11,1,Budi,,Welding,2,1000,2000"));
        assert!(lines[2].starts_with("INV-1,PT Maju,,2024-12-31,,11,1,Sari,,Painting,1,500,500"));
        assert!(lines[2].ends_with("2500,275,2775"));
    }

    #[test]
    fn test_text_summary() {
        let text = format_text(&result(), &OutputConfig::default());

        assert!(text.contains("File: invoices.csv (delimited text)"));
        assert!(text.contains("Structure: multiple invoices"));
        assert!(text.contains("Invoice INV-1 - PT Maju"));
        assert!(text.contains("Subtotal: 2.500"));
        assert!(text.contains("Total:    2.775"));
    }

    #[test]
    fn test_json_is_parseable() {
        let json = format_result(&result(), OutputFormat::Json, &OutputConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["invoices"][0]["header"]["invoice_number"], "INV-1");
        assert_eq!(value["success"], true);
    }
}
