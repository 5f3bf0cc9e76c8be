use crate::recognizer::RecognitionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReceiptScanError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("アクセストークンが設定されていません。`receipt-scan config --set-token YOUR_TOKEN` で設定してください")]
    MissingApiToken,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("文字認識エラー: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("HTTP通信エラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("認証に失敗しました（401）。トークンを確認してください")]
    Unauthorized,

    #[error("サーバーエラー ({status}): {message}")]
    ApiServer { status: u16, message: String },

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("レコードIDがありません: {0}")]
    MissingRecordId(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error(transparent)]
    Common(#[from] receipt_scan_common::Error),
}

pub type Result<T> = std::result::Result<T, ReceiptScanError>;
