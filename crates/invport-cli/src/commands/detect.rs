//! Detect command - show how a file would be read.

use std::path::PathBuf;

use clap::Args;
use console::style;

use invport_core::{Detection, Importer};

use super::import::{load_config, SourceArgs};
use super::output::{file_type_label, structure_label};

/// Arguments for the detect command.
#[derive(Args)]
pub struct DetectArgs {
    /// Input file
    #[arg(required = true)]
    input: PathBuf,

    #[command(flatten)]
    source: SourceArgs,
}

pub async fn run(args: DetectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let mut options = config.import.clone();
    args.source.apply(&mut options);

    let detection = Importer::new(options).inspect(&args.input)?;
    print!("{}", describe(&args.input, &detection));

    Ok(())
}

fn describe(input: &std::path::Path, detection: &Detection) -> String {
    let mut out = String::new();

    out.push_str(&format!("{} {}\n", style("File:").bold(), input.display()));
    out.push_str(&format!("Type:      {}\n", file_type_label(Some(detection.file_type))));
    if let Some(encoding) = detection.encoding {
        out.push_str(&format!("Encoding:  {}\n", encoding.label()));
    }
    if let Some(delimiter) = detection.delimiter {
        out.push_str(&format!("Delimiter: {}\n", delimiter_label(delimiter)));
    }
    if !detection.sheets.is_empty() {
        out.push_str(&format!("Sheets:    {}\n", detection.sheets.join(", ")));
    }
    if let Some((headers, lines)) = &detection.split_sheets {
        out.push_str(&format!("Layout:    headers in '{}', lines in '{}'\n", headers, lines));
    }
    if let Some(structure) = detection.structure {
        out.push_str(&format!("Structure: {}\n", structure_label(structure)));
    }
    out.push_str(&format!("Records:   {}\n", detection.records));

    if !detection.columns.is_empty() {
        out.push_str("Columns:\n");
        for column in &detection.columns {
            out.push_str(&format!("  - {}\n", column));
        }
    }

    out
}

fn delimiter_label(delimiter: char) -> String {
    match delimiter {
        '\t' => "tab".to_string(),
        c => format!("'{}'", c),
    }
}
