//! receipt-scan
//!
//! レシート・請求書画像の文字認識、行再構成、請求書抽出バックエンドとの連携

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod live;
pub mod pipeline;
pub mod recognizer;
pub mod scanner;
