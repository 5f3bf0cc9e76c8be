//! 撮影画像の処理パイプライン
//!
//! 画像1枚ずつ順番に:
//! 認識 → 矩形補正 → 色分け → 行再構成 →（任意）アップロード → テキスト送信
//!
//! バッチでは認識に失敗した画像を記録して次へ進む。送信の失敗も記録するが
//! 自動リトライはしない。

use crate::api::ApiClient;
use crate::error::Result;
use crate::recognizer::TextRecognizer;
use crate::scanner::ImageInfo;
use indicatif::{ProgressBar, ProgressStyle};
use receipt_scan_common::{
    assign_colors_with_tolerance, sanitize_fragments, BatchReport, ExtractedTextRequest, Row,
    RowAnchor, RowGrouper, ScanFailure, ScanReport, TextFragment, DEFAULT_TOLERANCE,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOptions {
    pub color_tolerance: f64,
    pub anchor: RowAnchor,
    /// 画像をアップロードしてファイル付きで送信する
    pub upload: bool,
    /// 抽出バックエンドへ送信する
    pub submit: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            color_tolerance: DEFAULT_TOLERANCE,
            anchor: RowAnchor::LastAppended,
            upload: false,
            submit: false,
        }
    }
}

/// 行再構成の結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub rows: Vec<Row>,
    pub dropped: usize,
}

/// 認識結果を行に組み立てる（I/Oなし）
pub fn build_layout(fragments: Vec<TextFragment>, options: &PipelineOptions) -> Layout {
    let sanitized = sanitize_fragments(fragments);
    if sanitized.dropped > 0 {
        warn!(dropped = sanitized.dropped, "不正な矩形の断片を除外");
    }

    let colored = assign_colors_with_tolerance(sanitized.fragments, options.color_tolerance);
    let rows = RowGrouper::default()
        .with_anchor(options.anchor)
        .group(colored);

    Layout {
        rows,
        dropped: sanitized.dropped,
    }
}

pub struct CapturePipeline {
    recognizer: Arc<dyn TextRecognizer>,
    api: Option<ApiClient>,
    options: PipelineOptions,
}

impl CapturePipeline {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, options: PipelineOptions) -> Self {
        Self {
            recognizer,
            api: None,
            options,
        }
    }

    pub fn with_api(mut self, api: ApiClient) -> Self {
        self.api = Some(api);
        self
    }

    fn needs_api(&self) -> bool {
        self.options.upload || self.options.submit
    }

    /// 認識と行再構成のみ（通信なし）
    pub async fn scan_image(&self, image: &ImageInfo) -> Result<ScanReport> {
        debug!(file = %image.file_name, "認識開始");
        let fragments = self.recognizer.recognize(&image.path).await?;
        let layout = build_layout(fragments, &self.options);
        info!(
            file = %image.file_name,
            rows = layout.rows.len(),
            dropped = layout.dropped,
            "行再構成完了"
        );

        Ok(ScanReport {
            file_name: image.file_name.clone(),
            captured_at: image.date.clone(),
            rows: layout.rows,
            dropped: layout.dropped,
            ..Default::default()
        })
    }

    /// アップロードとテキスト送信
    pub async fn deliver(&self, report: &mut ScanReport, image: &ImageInfo) -> Result<()> {
        let Some(api) = self.api.as_ref().filter(|_| self.needs_api()) else {
            return Ok(());
        };

        if self.options.upload {
            report.uploaded = Some(api.upload_image(&image.path).await?);
        }

        let request = ExtractedTextRequest::from_rows(&report.rows);
        let file_id = report.uploaded.as_ref().map(|f| f.key.as_str());
        let response = api.submit_text(&request, file_id).await?;

        report.message = Some(response.message);
        report.invoice = Some(response.invoice);
        Ok(())
    }

    /// 画像1枚を最後まで処理
    pub async fn process_image(&self, image: &ImageInfo) -> Result<ScanReport> {
        let mut report = self.scan_image(image).await?;
        self.deliver(&mut report, image).await?;
        Ok(report)
    }

    /// 画像を1枚ずつ順に処理。失敗は記録して続行
    pub async fn run_batch(&self, images: &[ImageInfo]) -> BatchReport {
        let progress = ProgressBar::new(images.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("  [{bar:30}] {pos}/{len} {msg}") {
            progress.set_style(style.progress_chars("=> "));
        }

        let mut batch = BatchReport {
            created_at: chrono::Local::now().to_rfc3339(),
            ..Default::default()
        };

        for image in images {
            progress.set_message(image.file_name.clone());

            match self.scan_image(image).await {
                Ok(mut report) => {
                    if let Err(e) = self.deliver(&mut report, image).await {
                        warn!(file = %image.file_name, error = %e, "送信失敗");
                        report.message = Some(e.to_string());
                        batch.failures.push(ScanFailure {
                            file_name: image.file_name.clone(),
                            message: e.to_string(),
                        });
                    }
                    batch.reports.push(report);
                }
                Err(e) => {
                    warn!(file = %image.file_name, error = %e, "認識失敗");
                    batch.failures.push(ScanFailure {
                        file_name: image.file_name.clone(),
                        message: e.to_string(),
                    });
                }
            }

            progress.inc(1);
        }

        progress.finish_and_clear();
        batch
    }
}

/// `submit` の送信単位
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub label: String,
    pub request: ExtractedTextRequest,
    pub file_id: Option<String>,
}

/// 送信用JSONを読む
///
/// 受け付ける形式:
/// - scan の出力（BatchReport）: 画像ごとに1件。アップロード済みならそのキーを使う
/// - `{"extractedText": [[...]]}`
/// - `[[...]]`
pub fn parse_submissions(content: &str, file_id: Option<&str>) -> Result<Vec<Submission>> {
    let value: serde_json::Value = serde_json::from_str(content)?;

    if value.get("reports").is_some() {
        let batch: BatchReport = serde_json::from_value(value)?;
        return Ok(batch
            .reports
            .iter()
            .map(|report| Submission {
                label: report.file_name.clone(),
                request: ExtractedTextRequest {
                    extracted_text: report.extracted_text(),
                },
                file_id: file_id
                    .map(str::to_string)
                    .or_else(|| report.uploaded.as_ref().map(|f| f.key.clone())),
            })
            .collect());
    }

    let request = if value.is_array() {
        ExtractedTextRequest {
            extracted_text: serde_json::from_value(value)?,
        }
    } else {
        serde_json::from_value(value)?
    };

    Ok(vec![Submission {
        label: "extractedText".to_string(),
        request,
        file_id: file_id.map(str::to_string),
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use receipt_scan_common::{ColorTag, NormalizedRect};

    #[test]
    fn test_parse_submissions_plain_rows() {
        let subs = parse_submissions(r#"[["Widget", "$9.99"], ["Gadget"]]"#, None).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].request.extracted_text[0], vec!["Widget", "$9.99"]);
        assert!(subs[0].file_id.is_none());

        let subs = parse_submissions(r#"{"extractedText": [["TOTAL", "14.98"]]}"#, Some("k1")).unwrap();
        assert_eq!(subs[0].request.extracted_text[0][0], "TOTAL");
        assert_eq!(subs[0].file_id.as_deref(), Some("k1"));
    }

    #[test]
    fn test_parse_submissions_batch_report() {
        let content = r#"{
            "createdAt": "2026-01-10T00:00:00+00:00",
            "reports": [
                {"fileName": "a.jpg", "rows": [[{"text": "TOTAL", "bounds": {"minX": 0.1, "minY": 0.1, "width": 0.2, "height": 0.05}}]],
                 "uploaded": {"_id": "f1", "name": "x.jpeg", "type": "image/jpeg", "key": "uploads/x.jpeg"}},
                {"fileName": "b.jpg", "rows": []}
            ],
            "failures": []
        }"#;
        let subs = parse_submissions(content, None).unwrap();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].label, "a.jpg");
        assert_eq!(subs[0].file_id.as_deref(), Some("uploads/x.jpeg"));
        assert_eq!(subs[0].request.extracted_text, vec![vec!["TOTAL".to_string()]]);
        assert!(subs[1].file_id.is_none());
    }

    #[test]
    fn test_parse_submissions_rejects_garbage() {
        assert!(parse_submissions(r#"{"foo": 1}"#, None).is_err());
        assert!(parse_submissions("not json", None).is_err());
    }

    fn receipt_fragments() -> Vec<TextFragment> {
        vec![
            TextFragment::new("$4.99", NormalizedRect::new(0.6, 0.5, 0.15, 0.05)),
            TextFragment::new("Widget", NormalizedRect::new(0.1, 0.8, 0.3, 0.05)),
            TextFragment::new("Gadget", NormalizedRect::new(0.1, 0.5, 0.3, 0.05)),
            TextFragment::new("$9.99", NormalizedRect::new(0.6, 0.8, 0.15, 0.05)),
            TextFragment::new("bad", NormalizedRect::new(f64::NAN, 0.8, 0.1, 0.05)),
        ]
    }

    #[test]
    fn test_build_layout() {
        let layout = build_layout(receipt_fragments(), &PipelineOptions::default());
        assert_eq!(layout.dropped, 1);

        let texts: Vec<Vec<String>> = layout.rows.iter().map(|r| r.texts()).collect();
        assert_eq!(texts, vec![vec!["Widget", "$9.99"], vec!["Gadget", "$4.99"]]);

        // 到着順: $4.99の帯が先に作られる
        assert_eq!(layout.rows[1].fragments[1].color, Some(ColorTag::Red));
        assert_eq!(layout.rows[0].fragments[0].color, Some(ColorTag::Green));
    }

    #[test]
    fn test_build_layout_empty() {
        let layout = build_layout(Vec::new(), &PipelineOptions::default());
        assert!(layout.rows.is_empty());
        assert_eq!(layout.dropped, 0);
    }
}
