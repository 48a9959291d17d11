use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CSV: &str = "\
invoice_number;company_name;invoice_date;tka_name;job_name;quantity;unit_price
INV-1;PT Maju;31/12/2024;Budi;Welding;1;100
INV-1;PT Maju;31/12/2024;Sari;Welding;1;200
INV-2;PT Jaya;30/12/2024;Andi;Painting;2;150
";

fn invport() -> Command {
    Command::cargo_bin("invport").unwrap()
}

fn fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn import_prints_json() {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, "invoices.csv", CSV);

    invport()
        .arg("import")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"invoice_number\": \"INV-1\""))
        .stdout(predicate::str::contains("\"invoice_number\": \"INV-2\""));
}

#[test]
fn import_writes_csv_output() {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, "invoices.csv", CSV);
    let output = dir.path().join("out.csv");

    invport()
        .args(["import", "--format", "csv", "--output"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let content = fs::read_to_string(&output).unwrap();
    assert_eq!(content.lines().count(), 4);
    assert!(content.contains("INV-2,PT Jaya,,2024-12-30"));
}

#[test]
fn import_with_row_errors_exits_with_failure() {
    let dir = TempDir::new().unwrap();
    let input = fixture(
        &dir,
        "errors.csv",
        "invoice_number,company_name,invoice_date,tka_name,job_name,quantity,unit_price\n\
         ,PT Maju,31/12/2024,Budi,Welding,1,100\n",
    );

    invport()
        .args(["import", "--format", "text"])
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Records: 1 total, 0 imported, 1 failed"))
        .stderr(predicate::str::contains("Invoice number is required"));
}

#[test]
fn import_missing_file_fails() {
    invport()
        .args(["import", "does-not-exist.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn single_invoice_flags_apply() {
    let dir = TempDir::new().unwrap();
    let input = fixture(
        &dir,
        "lines.csv",
        "tka_name,description,quantity,price,total\nBudi,Welding,1,100,\n",
    );

    invport()
        .args(["import", "--invoice-number", "INV-77", "--company", "PT Sinar", "--vat", "10"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("INV-77"))
        .stdout(predicate::str::contains("PT Sinar"))
        .stdout(predicate::str::contains("\"total\": \"110\""));
}

#[test]
fn detect_reports_delimiter_and_structure() {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, "invoices.csv", CSV);

    invport()
        .arg("detect")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Delimiter: ';'"))
        .stdout(predicate::str::contains("Structure: multiple invoices"))
        .stdout(predicate::str::contains("Records:   3"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let dir = TempDir::new().unwrap();
    fixture(&dir, "a.csv", CSV);
    fixture(&dir, "b.csv", CSV);
    fixture(&dir, "ignored.pdf", "not an import");
    let out_dir = dir.path().join("out");
    let pattern = dir.path().join("*.*");

    invport()
        .arg("batch")
        .arg(pattern.to_str().unwrap())
        .arg("--output-dir")
        .arg(&out_dir)
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"));

    assert!(out_dir.join("a.json").exists());
    assert!(out_dir.join("b.json").exists());
    let summary = fs::read_to_string(out_dir.join("summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 3);
}

#[test]
fn config_init_set_get() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    let config_arg = config.to_str().unwrap();

    invport()
        .args(["--config", config_arg, "config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    invport()
        .args(["--config", config_arg, "config", "set", "import.delimiter", ";"])
        .assert()
        .success();

    invport()
        .args(["--config", config_arg, "config", "get", "import.delimiter"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\";\""));
}
