//! Excel生成（CLI版）
//!
//! 共通ライブラリの rust_xlsxwriter 実装でバッファを作り、ファイルに書く

use crate::error::{ReceiptScanError, Result};
use receipt_scan_common::export::excel_core::generate_excel_buffer;
use receipt_scan_common::ScanReport;
use std::path::Path;

pub fn generate_excel(reports: &[ScanReport], output_path: &Path) -> Result<()> {
    let buffer = generate_excel_buffer(reports)
        .map_err(|e| ReceiptScanError::ExcelGeneration(e.to_string()))?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, buffer)?;
    Ok(())
}
