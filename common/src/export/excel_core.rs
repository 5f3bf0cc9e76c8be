//! Excel生成（共通ライブラリ）
//!
//! スキャン結果を2シートのブックにする:
//! - Rows: テキスト行を1行ずつ。セル背景は色分けの色
//! - Items: 抽出された請求書の明細（請求書がある場合のみ）

use crate::error::{Error, Result};
use crate::report::ScanReport;
use rust_xlsxwriter::*;

const ROWS_SHEET: &str = "Rows";
const ITEMS_SHEET: &str = "Items";
const CELL_COL_WIDTH: f64 = 18.0;

fn xlsx_err(context: &str) -> impl Fn(XlsxError) -> Error + '_ {
    move |e| Error::Export(format!("{}: {}", context, e))
}

/// Excelをバッファに生成
pub fn generate_excel_buffer(reports: &[ScanReport]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let title_format = Format::new()
        .set_bold()
        .set_font_size(11.0)
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xAAAAAA));

    let header_format = Format::new()
        .set_bold()
        .set_font_size(9.0)
        .set_font_color(Color::RGB(0x555555))
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xAAAAAA));

    let plain_format = Format::new()
        .set_font_size(11.0)
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    // Rowsシート
    {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(ROWS_SHEET)
            .map_err(xlsx_err("シート名設定エラー"))?;

        let widest = reports
            .iter()
            .flat_map(|r| r.rows.iter().map(|row| row.len()))
            .max()
            .unwrap_or(1)
            .max(1);
        for col in 0..widest {
            worksheet
                .set_column_width(col as u16, CELL_COL_WIDTH)
                .map_err(xlsx_err("列幅設定エラー"))?;
        }

        let mut current_row: u32 = 0;
        for report in reports {
            worksheet
                .write_string_with_format(current_row, 0, &report.file_name, &title_format)
                .map_err(xlsx_err("見出し書き込みエラー"))?;
            current_row += 1;

            for row in &report.rows {
                for (col, fragment) in row.fragments.iter().enumerate() {
                    let format = match fragment.color {
                        Some(color) => plain_format
                            .clone()
                            .set_background_color(Color::RGB(color.rgb())),
                        None => plain_format.clone(),
                    };
                    worksheet
                        .write_string_with_format(current_row, col as u16, &fragment.text, &format)
                        .map_err(xlsx_err("セル書き込みエラー"))?;
                }
                current_row += 1;
            }

            // 画像ごとに1行空ける
            current_row += 1;
        }
    }

    // Itemsシート
    let invoices: Vec<_> = reports
        .iter()
        .filter_map(|r| r.invoice.as_ref().map(|inv| (r.file_name.as_str(), inv)))
        .collect();

    if !invoices.is_empty() {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(ITEMS_SHEET)
            .map_err(xlsx_err("シート名設定エラー"))?;

        let headers = ["File", "Invoice", "Date", "Item", "Quantity", "Price", "Total"];
        for (col, header) in headers.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, *header, &header_format)
                .map_err(xlsx_err("見出し書き込みエラー"))?;
            worksheet
                .set_column_width(col as u16, CELL_COL_WIDTH)
                .map_err(xlsx_err("列幅設定エラー"))?;
        }

        let mut current_row: u32 = 1;
        for (file_name, invoice) in invoices {
            for item in &invoice.items {
                worksheet
                    .write_string(current_row, 0, file_name)
                    .map_err(xlsx_err("値書き込みエラー"))?;
                worksheet
                    .write_string(current_row, 1, invoice.title())
                    .map_err(xlsx_err("値書き込みエラー"))?;
                worksheet
                    .write_string(current_row, 2, item.display_date())
                    .map_err(xlsx_err("値書き込みエラー"))?;
                worksheet
                    .write_string(current_row, 3, &item.name)
                    .map_err(xlsx_err("値書き込みエラー"))?;
                worksheet
                    .write_number(current_row, 4, item.effective_quantity())
                    .map_err(xlsx_err("値書き込みエラー"))?;
                worksheet
                    .write_number(current_row, 5, item.price)
                    .map_err(xlsx_err("値書き込みエラー"))?;
                worksheet
                    .write_number(current_row, 6, item.line_total())
                    .map_err(xlsx_err("値書き込みエラー"))?;
                current_row += 1;
            }

            for tax in &invoice.taxes {
                worksheet
                    .write_string(current_row, 1, invoice.title())
                    .map_err(xlsx_err("値書き込みエラー"))?;
                worksheet
                    .write_string(current_row, 3, &tax.tax_name)
                    .map_err(xlsx_err("値書き込みエラー"))?;
                worksheet
                    .write_number(current_row, 6, tax.amount)
                    .map_err(xlsx_err("値書き込みエラー"))?;
                current_row += 1;
            }

            worksheet
                .write_string_with_format(current_row, 5, "Total", &header_format)
                .map_err(xlsx_err("値書き込みエラー"))?;
            worksheet
                .write_number_with_format(current_row, 6, invoice.calculated_total(), &title_format)
                .map_err(xlsx_err("値書き込みエラー"))?;
            current_row += 2;
        }
    }

    // バッファに書き出し
    workbook
        .save_to_buffer()
        .map_err(xlsx_err("Excel保存エラー"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::assign_colors;
    use crate::invoice::{Invoice, Item, Tax};
    use crate::rows::group_into_rows;
    use crate::types::{NormalizedRect, TextFragment};

    fn sample_report() -> ScanReport {
        let fragments = assign_colors(vec![
            TextFragment::new("Widget", NormalizedRect::new(0.1, 0.8, 0.3, 0.05)),
            TextFragment::new("$9.99", NormalizedRect::new(0.6, 0.8, 0.15, 0.05)),
            TextFragment::new("Gadget", NormalizedRect::new(0.1, 0.5, 0.3, 0.05)),
        ]);
        ScanReport {
            file_name: "receipt.jpg".into(),
            rows: group_into_rows(fragments),
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_rows_only() {
        let buffer = generate_excel_buffer(&[sample_report()]).unwrap();
        // xlsxはzip
        assert!(buffer.starts_with(b"PK"));
    }

    #[test]
    fn test_generate_with_invoice() {
        let mut report = sample_report();
        report.invoice = Some(Invoice {
            name: Some("Hardware".into()),
            items: vec![Item {
                name: "Widget".into(),
                price: 9.99,
                quantity: Some(2.0),
                ..Default::default()
            }],
            taxes: vec![Tax {
                tax_name: "GST".into(),
                amount: 1.0,
            }],
            ..Default::default()
        });
        let buffer = generate_excel_buffer(&[report]).unwrap();
        assert!(buffer.starts_with(b"PK"));
    }

    #[test]
    fn test_generate_empty() {
        let buffer = generate_excel_buffer(&[]).unwrap();
        assert!(!buffer.is_empty());
    }
}
