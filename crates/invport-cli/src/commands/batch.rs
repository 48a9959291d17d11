//! Batch import command for multiple files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use invport_core::{CancelToken, ImportResult, Importer};

use super::import::{cancel_on_ctrl_c, import_blocking, load_config, OutputFormat, SourceArgs};
use super::output::{file_type_label, format_result};

/// Extensions picked up from a glob match.
const SUPPORTED_EXTENSIONS: [&str; 8] = ["csv", "txt", "xlsx", "xlsm", "xlsb", "xls", "ods", "json"];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    source: SourceArgs,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let mut options = config.import.clone();
    args.source.apply(&mut options);

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to import",
        style("ℹ").blue(),
        files.len()
    );

    // Create output directory if specified
    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let cancel = CancelToken::new();
    let ctrl_c = cancel_on_ctrl_c(cancel.clone());
    let importer = Importer::new(options).with_cancel_token(cancel.clone());

    let mut results: Vec<ImportResult> = Vec::with_capacity(files.len());
    let mut outcome = Ok(());

    for path in files {
        let result = import_blocking(importer.clone(), path.clone()).await?;
        overall_pb.inc(1);

        if let Some(output_dir) = &args.output_dir {
            write_output(output_dir, &path, &result, &args, &config.output)?;
        }

        let failed = !result.is_success();
        let first_error = result.errors.first().map(|e| e.message.clone());
        results.push(result);

        if cancel.is_cancelled() {
            warn!("Batch cancelled after {}", path.display());
            break;
        }

        if failed {
            let error_msg = first_error.unwrap_or_else(|| "import failed".to_string());
            if args.continue_on_error {
                warn!("Failed to import {}: {}", path.display(), error_msg);
            } else {
                error!("Failed to import {}: {}", path.display(), error_msg);
                outcome = Err(anyhow::anyhow!("Import failed for {}: {}", path.display(), error_msg));
                break;
            }
        }
    }

    ctrl_c.abort();
    overall_pb.finish_with_message("Complete");

    // Generate summary if requested
    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = results.iter().filter(|r| r.is_success()).count();
    let failed: Vec<&ImportResult> = results.iter().filter(|r| !r.is_success()).collect();

    // Print summary
    println!();
    println!(
        "{} Imported {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {} failed record(s){}",
                result.file_name,
                result.failed_count,
                result
                    .errors
                    .first()
                    .map(|e| format!(", first: {}", e.message))
                    .unwrap_or_default()
            );
        }
    }

    outcome
}

fn is_supported(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    SUPPORTED_EXTENSIONS.contains(&ext.as_str())
}

fn write_output(
    output_dir: &Path,
    input: &Path,
    result: &ImportResult,
    args: &BatchArgs,
    output: &invport_core::OutputConfig,
) -> anyhow::Result<()> {
    let output_name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("import");

    let output_path = output_dir.join(format!("{}.{}", output_name, args.format.extension()));
    let content = format_result(result, args.format, output)?;

    fs::write(&output_path, content)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn write_summary(path: &Path, results: &[ImportResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "file_type",
        "total_records",
        "success_count",
        "failed_count",
        "invoices",
        "lines",
        "warnings",
        "validation_issues",
        "grand_total",
        "error",
    ])?;

    for result in results {
        let status = if result.cancelled {
            "cancelled"
        } else if result.is_success() {
            "success"
        } else {
            "error"
        };
        let grand_total = result.grand_total().map(|t| t.to_string()).unwrap_or_default();

        wtr.write_record([
            result.file_name.as_str(),
            status,
            file_type_label(result.file_type),
            &result.total_records.to_string(),
            &result.success_count.to_string(),
            &result.failed_count.to_string(),
            &result.invoices.len().to_string(),
            &result.line_count().to_string(),
            &result.warnings.len().to_string(),
            &result.validation.len().to_string(),
            &grand_total,
            result.errors.first().map(|e| e.message.as_str()).unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
