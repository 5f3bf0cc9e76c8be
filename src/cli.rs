use crate::recognizer::RecognizerKind;
use clap::{Parser, Subcommand, ValueEnum};
use receipt_scan_common::RowAnchor;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "receipt-scan")]
#[command(about = "レシート・請求書の文字認識と行再構成、請求書抽出クライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 認識アダプタ (command/sidecar)
    #[arg(long, default_value = "command", global = true)]
    pub recognizer: RecognizerKind,
}

/// 行継続判定の基準
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum AnchorArg {
    /// 直前に追加した断片
    #[default]
    Last,
    /// 行の最初の断片
    First,
}

impl From<AnchorArg> for RowAnchor {
    fn from(value: AnchorArg) -> Self {
        match value {
            AnchorArg::Last => RowAnchor::LastAppended,
            AnchorArg::First => RowAnchor::First,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像（またはフォルダ）を認識して行に組み立てる
    Scan {
        /// 画像ファイルまたはフォルダ
        #[arg(required = true)]
        input: PathBuf,

        /// 出力JSONファイル（デフォルト: 標準出力に行を表示）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 抽出バックエンドへ送信して請求書を作る
        #[arg(long)]
        submit: bool,

        /// 画像をアップロードしてファイル付きで送信（--submit を含む）
        #[arg(long)]
        upload: bool,

        /// 結果をExcelにも出力
        #[arg(long)]
        excel: Option<PathBuf>,

        /// 行継続判定の基準
        #[arg(long, default_value = "last")]
        anchor: AnchorArg,
    },

    /// 断片JSONを行に組み立てる（認識なし）
    Rows {
        /// 認識結果JSON（配列または {"items": [...]}）
        #[arg(required = true)]
        input: PathBuf,

        /// 出力JSONファイル
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 行継続判定の基準
        #[arg(long, default_value = "last")]
        anchor: AnchorArg,
    },

    /// 行JSONまたはスキャン結果を抽出バックエンドへ送信
    Submit {
        /// 行JSON（[[...]]）またはscanの出力JSON
        #[arg(required = true)]
        input: PathBuf,

        /// アップロード済みファイルのキー
        #[arg(long)]
        file_id: Option<String>,
    },

    /// 画像をアップロード
    Upload {
        /// 画像ファイル
        #[arg(required = true)]
        image: PathBuf,
    },

    /// フォルダの画像をカメラのフレームとして流しライブスキャン
    Live {
        /// フレーム画像のフォルダ
        #[arg(required = true)]
        folder: PathBuf,

        /// 認識間隔（ミリ秒、省略時は設定値）
        #[arg(long)]
        interval_ms: Option<u64>,

        /// フレームの送出レート
        #[arg(long, default_value = "30")]
        fps: u32,
    },

    /// スキャン結果からExcelを生成
    Export {
        /// scanの出力JSON
        #[arg(required = true)]
        input: PathBuf,

        /// 出力ファイル（デフォルト: 入力と同名の .xlsx）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 請求書の操作
    Invoice {
        #[command(subcommand)]
        action: InvoiceAction,
    },

    /// 明細の操作
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },

    /// 設定を表示/編集
    Config {
        /// アクセストークンを設定
        #[arg(long)]
        set_token: Option<String>,

        /// 接続先ホストを設定
        #[arg(long)]
        set_host: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum InvoiceAction {
    /// 一覧
    List {
        /// プロジェクトで絞り込み
        #[arg(long)]
        project: Option<String>,
    },
    /// 1件取得
    Get { id: String },
    /// JSONファイルから作成
    Create { input: PathBuf },
    /// JSONファイルで更新（`_id` 必須）
    Update { input: PathBuf },
}

#[derive(Subcommand)]
pub enum ItemAction {
    /// 請求書またはプロジェクトの明細一覧
    List {
        #[arg(long, conflicts_with = "project", required_unless_present = "project")]
        invoice: Option<String>,
        #[arg(long)]
        project: Option<String>,
    },
    /// 1件取得
    Get { id: String },
    /// JSONファイルから作成
    Create { input: PathBuf },
    /// JSONファイルで更新（`_id` 必須）
    Update { input: PathBuf },
    /// 削除
    Delete { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan() {
        let cli = Cli::parse_from([
            "receipt-scan", "--recognizer", "sidecar", "scan", "receipts", "--upload", "--anchor", "first",
        ]);
        assert_eq!(cli.recognizer, RecognizerKind::Sidecar);
        match cli.command {
            Commands::Scan { input, upload, submit, anchor, .. } => {
                assert_eq!(input, PathBuf::from("receipts"));
                assert!(upload);
                assert!(!submit);
                assert_eq!(RowAnchor::from(anchor), RowAnchor::First);
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_item_list_requires_scope() {
        assert!(Cli::try_parse_from(["receipt-scan", "item", "list"]).is_err());
        assert!(Cli::try_parse_from(["receipt-scan", "item", "list", "--invoice", "i1"]).is_ok());
    }
}
