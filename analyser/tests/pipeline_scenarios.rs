//! End-to-end scenarios over real files.

use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use spend_analyser::{
    analyze, export_table, read_table, render_report, run_pipeline, ExportFormat, ExportKind,
    IngestError, PipelineError, PipelineOptions, YearError,
};
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn run(path: &Path) -> Result<spend_analyser::PipelineResult, PipelineError> {
    run_pipeline(path, &PipelineOptions::default())
}

#[test]
fn test_duplicate_eu_amounts_and_yoy() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "spend.csv",
        "Supplier Name,Amount,Category,Year\n\
         Acme Inc,\"1.000,00\",Services,2023\n\
         Acme Inc,\"1.000,00\",Services,2023\n\
         Globex,500,Goods,2024\n",
    );

    let result = run(&path).unwrap();
    assert_eq!(result.table.len(), 2);
    assert_eq!(result.stats.duplicates, 1);

    let analysis = analyze(&result.table, 10);
    assert_eq!(analysis.total_spend, 1500.0);
    assert_eq!(analysis.supplier_count, 2);
    assert_eq!(analysis.yoy_growth().unwrap().percent, Some(-50.0));

    let report = render_report(&analysis, "€");
    assert!(report.contains("Total Spend: €1,500.00"));
    assert!(report.contains("YoY Growth (2023 → 2024): -50.0%"));
}

#[test]
fn test_invoice_number_keeps_repeated_amounts() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "spend.csv",
        "Invoice No,Supplier,Spend,Year
         INV-1,Acme,100,2024
         INV-2,Acme,100,2024
",
    );

    let result = run(&path).unwrap();

    assert_eq!(result.table.len(), 2);
    assert_eq!(result.stats.duplicates, 0);
    assert_eq!(result.unmatched_columns, vec!["Invoice No"]);
    assert_eq!(analyze(&result.table, 10).total_spend, 200.0);
}

#[test]
fn test_negative_spend_excluded() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "spend.csv",
        "vendor,spend\nAcme,-50\nGlobex,100\n",
    );

    let result = run(&path).unwrap();
    let analysis = analyze(&result.table, 10);

    assert_eq!(result.stats.negative_spend, 1);
    assert_eq!(analysis.total_spend, 100.0);
    assert!(analysis.top_suppliers.iter().all(|t| t.label != "Acme"));
}

#[test]
fn test_no_year_column_omits_growth() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "spend.csv", "supplier,cost,type\nAcme,10,IT\nGlobex,20,HR\n");

    let result = run(&path).unwrap();
    let analysis = analyze(&result.table, 10);

    assert!(analysis.years.is_empty());
    assert!(!render_report(&analysis, "€").contains("YoY"));
}

#[test]
fn test_all_garbage_spend_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "spend.csv", "supplier,spend\nAcme,abc\nGlobex,n/a\n");

    let err = run(&path).unwrap_err();
    assert!(matches!(err, PipelineError::NoValidRows { input_rows: 2 }));
    assert!(err.to_string().contains("No valid rows after cleaning"));
}

#[test]
fn test_semicolon_eu_export_detected() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "erp.csv",
        "Lieferant;Vendor;Value;Fiscal Year\n\
         x;acme inc;1.234,56;2024-03-15\n\
         y;GLOBEX;99,90;2024-01-02\n",
    );

    let result = run(&path).unwrap();
    let source = result.source.as_ref().unwrap();

    assert_eq!(source.delimiter, Some(';'));
    assert_eq!(result.unmatched_columns, vec!["Lieferant"]);
    assert_eq!(result.table.records[0].supplier, "Acme Inc");
    assert_eq!(result.table.records[0].spend, 1234.56);
    assert_eq!(result.table.records[1].spend, 99.9);
    assert_eq!(result.table.records[1].year, Some(2024));
}

#[test]
fn test_foreign_date_format_aborts() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "spend.csv",
        "supplier,spend,year\nAcme,1,2024\nGlobex,2,15/03/2024\n",
    );

    match run(&path).unwrap_err() {
        PipelineError::Year(YearError::Format { examples }) => {
            assert_eq!(examples, vec!["15/03/2024"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_huge_year_is_range_error() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "spend.csv",
        "supplier,spend,year
Acme,1,2024
Globex,2,30000000000
",
    );

    match run(&path).unwrap_err() {
        PipelineError::Year(YearError::Range { examples, min, max }) => {
            assert_eq!(examples, vec!["30000000000"]);
            assert_eq!((min, max), (2000, 2100));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_required_column_aborts() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "spend.csv", "supplier,total\nAcme,1\n");

    let err = run(&path).unwrap_err();
    assert!(matches!(err, PipelineError::Schema(_)));
    assert!(err.to_string().contains("spend"));
}

#[test]
fn test_header_only_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "spend.csv", "supplier,spend\n");

    let err = run(&path).unwrap_err();
    assert!(matches!(err, PipelineError::Ingest(IngestError::EmptyFile(_))));
}

#[test]
fn test_xlsx_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        &dir,
        "spend.csv",
        "supplier,spend,category,year\nAcme,1000,Services,2023\nGlobex,500.5,,2024\n",
    );
    let first = run(&input).unwrap();

    let workbook = dir.path().join("clean.xlsx");
    let outcome = export_table(&first.table, &workbook, ExportFormat::Xlsx).unwrap();
    assert_eq!(outcome.format, ExportKind::Xlsx);

    let second = run(&workbook).unwrap();
    assert_eq!(second.table.records, first.table.records);
    assert_eq!(second.source.unwrap().sheets, vec!["Spend"]);
}

#[test]
fn test_multi_sheet_workbook_is_concatenated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("erp.xlsx");

    let mut workbook = Workbook::new();
    let first = workbook.add_worksheet();
    first.set_name("FY2023").unwrap();
    for (col, header) in ["Supplier", "Amount", "Year"].iter().enumerate() {
        first.write_string(0, col as u16, *header).unwrap();
    }
    first.write_string(1, 0, "acme inc").unwrap();
    first.write_number(1, 1, 1000.0).unwrap();
    first.write_number(1, 2, 2023.0).unwrap();
    first.write_string(2, 0, "Globex").unwrap();
    first.write_number(2, 1, 250.0).unwrap();
    first.write_number(2, 2, 2023.0).unwrap();

    workbook.add_worksheet().set_name("Notes").unwrap();

    let second = workbook.add_worksheet();
    second.set_name("FY2024").unwrap();
    for (col, header) in ["Supplier", "Amount", "Category"].iter().enumerate() {
        second.write_string(0, col as u16, *header).unwrap();
    }
    second.write_string(1, 0, "Initech").unwrap();
    second.write_number(1, 1, 75.5).unwrap();
    second.write_string(1, 2, "it services").unwrap();
    workbook.save(&path).unwrap();

    let parsed = read_table(&path, None).unwrap();
    assert_eq!(parsed.table.headers, vec!["Supplier", "Amount", "Year", "Category"]);
    assert_eq!(parsed.table.len(), 3);
    assert_eq!(parsed.info.sheets, vec!["FY2023", "FY2024"]);

    let result = run(&path).unwrap();
    let records = &result.table.records;
    assert_eq!(records.len(), 3);
    assert!(result.table.has_category);
    assert!(result.table.has_year);
    assert_eq!(records[0].supplier, "Acme Inc");
    assert_eq!((records[0].year, records[0].category.as_deref()), (Some(2023), None));
    assert_eq!(records[2].supplier, "Initech");
    assert_eq!(records[2].spend, 75.5);
    assert_eq!((records[2].year, records[2].category.as_deref()), (None, Some("It Services")));
    assert_eq!(result.source.unwrap().sheets, vec!["FY2023", "FY2024"]);
}

#[test]
fn test_export_fallback_path() {
    let dir = TempDir::new().unwrap();
    let long_name = "x".repeat(40_000);
    let input = write_file(&dir, "spend.csv", &format!("supplier,spend\n{long_name},10\n"));
    let result = run(&input).unwrap();

    let outcome = export_table(&result.table, &dir.path().join("out.xlsx"), ExportFormat::Xlsx).unwrap();

    assert_eq!(outcome.format, ExportKind::Csv);
    assert_eq!(outcome.path, dir.path().join("out.csv"));
    let reread = run(&outcome.path).unwrap();
    assert_eq!(reread.table.records[0].spend, 10.0);
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "spend.json", "[]");

    let err = run(&path).unwrap_err();
    assert!(matches!(err, PipelineError::Ingest(IngestError::UnsupportedFormat(_))));
}
