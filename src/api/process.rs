//! 抽出テキストの送信

use super::ApiClient;
use crate::error::Result;
use receipt_scan_common::{ExtractedTextRequest, TextExtractResponse};
use tracing::info;

/// ファイルIDがあればファイル付きのエンドポイントを使う
pub(crate) fn text_extract_path(file_id: Option<&str>) -> String {
    match file_id {
        Some(id) => format!("/api/files/process/text-extract/{}", id),
        None => "/api/files/process/text-extract".to_string(),
    }
}

impl ApiClient {
    pub async fn submit_text(
        &self,
        request: &ExtractedTextRequest,
        file_id: Option<&str>,
    ) -> Result<TextExtractResponse> {
        let path = text_extract_path(file_id);
        info!(path = %path, rows = request.extracted_text.len(), "抽出テキスト送信");
        self.send(self.post(&path).json(request)).await
    }
}
