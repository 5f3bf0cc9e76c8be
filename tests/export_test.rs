//! Excel出力の統合テスト

use receipt_scan_common::{assign_colors, group_into_rows, Invoice, Item, NormalizedRect, ScanReport, Tax, TextFragment};
use receipt_scan_rust::export::excel;
use tempfile::tempdir;

fn create_test_report(index: usize) -> ScanReport {
    let fragments = assign_colors(vec![
        TextFragment::new("Widget", NormalizedRect::new(0.1, 0.8, 0.3, 0.05)),
        TextFragment::new("$9.99", NormalizedRect::new(0.6, 0.8, 0.15, 0.05)),
        TextFragment::new("Gadget", NormalizedRect::new(0.1, 0.5, 0.3, 0.05)),
        TextFragment::new("$4.99", NormalizedRect::new(0.6, 0.5, 0.15, 0.05)),
    ]);

    ScanReport {
        file_name: format!("receipt_{}.jpg", index),
        rows: group_into_rows(fragments),
        ..Default::default()
    }
}

#[test]
fn test_excel_generation_rows_only() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_path = dir.path().join("rows.xlsx");

    let reports: Vec<ScanReport> = (1..=3).map(create_test_report).collect();
    let result = excel::generate_excel(&reports, &output_path);

    assert!(result.is_ok(), "Excel生成に失敗: {:?}", result.err());
    assert!(output_path.exists(), "Excelファイルが作成されていない");

    let bytes = std::fs::read(&output_path).expect("ファイル読み込み失敗");
    assert!(bytes.starts_with(b"PK"), "xlsx(zip)形式でない");
}

#[test]
fn test_excel_generation_with_invoice() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_path = dir.path().join("nested").join("invoice.xlsx");

    let mut report = create_test_report(1);
    report.invoice = Some(Invoice {
        name: Some("Hardware".to_string()),
        date: "2026-01-10T00:00:00Z".to_string(),
        items: vec![
            Item { name: "Widget".into(), price: 9.99, ..Default::default() },
            Item { name: "Gadget".into(), price: 4.99, quantity: Some(3.0), ..Default::default() },
        ],
        taxes: vec![Tax { tax_name: "GST".into(), amount: 1.25 }],
        ..Default::default()
    });

    let result = excel::generate_excel(&[report], &output_path);
    assert!(result.is_ok(), "Excel生成に失敗: {:?}", result.err());

    let metadata = std::fs::metadata(&output_path).expect("ファイルメタデータ取得失敗");
    assert!(metadata.len() > 0, "Excelファイルが空");
}

#[test]
fn test_excel_generation_empty() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_path = dir.path().join("empty.xlsx");

    let result = excel::generate_excel(&[], &output_path);
    assert!(result.is_ok(), "空データでもExcelを生成できるべき");
    assert!(output_path.exists());
}
