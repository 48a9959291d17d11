//! Import command - read invoices from a single file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use invport_core::models::config::{ImportOptions, InvportConfig, OutputConfig};
use invport_core::{CancelToken, ImportResult, Importer, TextEncoding};

use super::config::{default_config_path, load_or_default};
use super::output::{format_result, print_problems};

/// Arguments for the import command.
#[derive(Args)]
pub struct ImportArgs {
    /// Input file (CSV, TXT, XLSX, XLS or JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    source: SourceArgs,

    /// Invoice number for single-invoice files
    #[arg(long)]
    invoice_number: Option<String>,

    /// Company name for single-invoice files
    #[arg(long)]
    company: Option<String>,

    /// Default VAT percentage
    #[arg(long)]
    vat: Option<Decimal>,

    /// Only report what would be imported
    #[arg(long)]
    validate_only: bool,
}

/// Options describing how delimited text is read.
#[derive(Args, Clone, Default)]
pub struct SourceArgs {
    /// Field delimiter (a single character, or "tab")
    #[arg(long, value_parser = parse_delimiter)]
    delimiter: Option<char>,

    /// Text encoding (detected from the byte order mark by default)
    #[arg(long, value_enum)]
    encoding: Option<EncodingArg>,

    /// First line is data, not column names
    #[arg(long)]
    no_headers: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per invoice line
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum EncodingArg {
    Utf8,
    Utf16le,
    Utf16be,
}

impl From<EncodingArg> for TextEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Utf8 => TextEncoding::Utf8,
            EncodingArg::Utf16le => TextEncoding::Utf16Le,
            EncodingArg::Utf16be => TextEncoding::Utf16Be,
        }
    }
}

fn parse_delimiter(value: &str) -> Result<char, String> {
    match value {
        "tab" | "\\t" => Ok('\t'),
        _ => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(format!("expected a single character, got '{}'", value)),
            }
        }
    }
}

impl SourceArgs {
    /// Apply these flags over options loaded from the config file.
    pub fn apply(&self, options: &mut ImportOptions) {
        if let Some(delimiter) = self.delimiter {
            options.delimiter = Some(delimiter);
        }
        if let Some(encoding) = self.encoding {
            options.encoding = Some(encoding.into());
        }
        if self.no_headers {
            options.has_headers = false;
        }
    }
}

/// Load the config file named by `--config`, or the default one when present.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<InvportConfig> {
    match config_path {
        Some(path) => Ok(InvportConfig::from_file(Path::new(path))?),
        None => load_or_default(&default_config_path()),
    }
}

pub async fn run(args: ImportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    // Check input file exists
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let options = import_options(&args, &config);
    info!("Importing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Importing {}...", args.input.display()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let spinner = pb.clone();
    let name = args.input.display().to_string();
    let importer = Importer::new(options).with_progress(move |done| {
        spinner.set_message(format!("Importing {}... {} records", name, done));
    });
    let cancel = cancel_on_ctrl_c(importer.cancel_token());
    let result = import_blocking(importer, args.input.clone()).await;
    cancel.abort();
    let result = result?;

    pb.finish_and_clear();

    // Format output
    let output = format_result(&result, args.format, &config.output)?;

    // Write output
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    print_summary(&result, &config.output);
    debug!("Total import time: {:?}", start.elapsed());

    if result.cancelled {
        anyhow::bail!("Import cancelled");
    }
    if !result.is_success() {
        anyhow::bail!(
            "Import finished with {} failed record(s)",
            result.failed_count
        );
    }

    Ok(())
}

fn import_options(args: &ImportArgs, config: &InvportConfig) -> ImportOptions {
    let mut options = config.import.clone();
    args.source.apply(&mut options);

    if let Some(number) = &args.invoice_number {
        options.default_invoice_number = Some(number.clone());
    }
    if let Some(company) = &args.company {
        options.default_company_name = Some(company.clone());
    }
    if let Some(vat) = args.vat {
        options.default_vat_percentage = vat;
    }
    if args.validate_only {
        options.validate_only = true;
    }
    options
}

/// Run one import on the blocking pool.
pub async fn import_blocking(importer: Importer, path: PathBuf) -> anyhow::Result<ImportResult> {
    let result = tokio::task::spawn_blocking(move || importer.import_file(&path)).await?;
    Ok(result)
}

/// Cancel `token` on Ctrl-C. Abort the returned task once the work is done.
pub fn cancel_on_ctrl_c(token: CancelToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling import");
            token.cancel();
        }
    })
}

fn print_summary(result: &ImportResult, output: &OutputConfig) {
    let status = if result.is_success() {
        style("✓").green()
    } else {
        style("✗").red()
    };

    eprintln!();
    eprintln!(
        "{} {}: {} records, {} imported, {} failed, {} invoice(s)",
        status,
        result.file_name,
        result.total_records,
        style(result.success_count).green(),
        style(result.failed_count).red(),
        result.invoices.len()
    );

    print_problems(result, output);
}
