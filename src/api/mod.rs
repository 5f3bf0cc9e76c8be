//! バックエンドAPIクライアント
//!
//! - process: 抽出テキストから請求書を生成
//! - invoices / items: 請求書・明細のCRUD
//! - files: 画像アップロード
//!
//! 失敗時の自動リトライはしない。

mod files;
mod invoices;
mod items;
mod process;

pub use files::encode_jpeg;

use crate::config::Config;
use crate::error::{ReceiptScanError, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    host: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(host: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            host: host.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.api_host(),
            config.access_token(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.post(self.url(path)))
    }

    pub(crate) fn put(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.put(self.url(path)))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.delete(self.url(path)))
    }

    /// リクエストを送ってJSONを受け取る
    pub(crate) async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), body_len = body.len(), "APIレスポンス");
        decode_response(status, &body)
    }
}

#[derive(Deserialize)]
struct ServerMessage {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// エラーレスポンスから表示用メッセージを取り出す
fn server_message(body: &str) -> String {
    serde_json::from_str::<ServerMessage>(body)
        .ok()
        .and_then(|m| m.error.or(m.message))
        .unwrap_or_else(|| body.trim().to_string())
}

/// ステータスとボディからレスポンスを解釈
pub(crate) fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
    if status == StatusCode::UNAUTHORIZED {
        warn!("APIが401を返しました");
        return Err(ReceiptScanError::Unauthorized);
    }

    if !status.is_success() {
        return Err(ReceiptScanError::ApiServer {
            status: status.as_u16(),
            message: server_message(body),
        });
    }

    serde_json::from_str(body).map_err(|e| ReceiptScanError::ApiParse(format!("{} (body: {})", e, body)))
}

/// 更新系で必須のIDを取り出す
pub(crate) fn require_id<'a>(id: Option<&'a str>, kind: &str) -> Result<&'a str> {
    id.filter(|id| !id.is_empty())
        .ok_or_else(|| ReceiptScanError::MissingRecordId(kind.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use receipt_scan_common::Invoice;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:3000/", Some("t".into()), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_host_trailing_slash_trimmed() {
        let client = client();
        assert_eq!(client.host(), "http://localhost:3000");
        assert_eq!(client.url("/api/invoices"), "http://localhost:3000/api/invoices");
    }

    #[test]
    fn test_decode_success() {
        let invoice: Invoice = decode_response(StatusCode::OK, r#"{"_id": "i1"}"#).unwrap();
        assert_eq!(invoice.id.as_deref(), Some("i1"));
    }

    #[test]
    fn test_decode_unauthorized() {
        let result: Result<Invoice> = decode_response(StatusCode::UNAUTHORIZED, "");
        assert!(matches!(result, Err(ReceiptScanError::Unauthorized)));
    }

    #[test]
    fn test_decode_server_error_message() {
        let result: Result<Invoice> =
            decode_response(StatusCode::BAD_REQUEST, r#"{"error": "extractedText is required"}"#);
        match result {
            Err(ReceiptScanError::ApiServer { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "extractedText is required");
            }
            other => panic!("unexpected: {:?}", other),
        }

        let result: Result<Invoice> = decode_response(StatusCode::BAD_GATEWAY, "upstream down\n");
        match result {
            Err(ReceiptScanError::ApiServer { message, .. }) => assert_eq!(message, "upstream down"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_parse_error_keeps_body() {
        let result: Result<Invoice> = decode_response(StatusCode::OK, "<html>oops</html>");
        match result {
            Err(ReceiptScanError::ApiParse(msg)) => assert!(msg.contains("<html>oops</html>")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_require_id() {
        assert_eq!(require_id(Some("abc"), "invoice").unwrap(), "abc");
        assert!(matches!(
            require_id(None, "invoice"),
            Err(ReceiptScanError::MissingRecordId(_))
        ));
        assert!(require_id(Some(""), "item").is_err());
    }
}
