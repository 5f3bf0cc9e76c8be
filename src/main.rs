use clap::Parser;
use receipt_scan_common::{group_into_rows, parse_observations, BatchReport, Invoice, Item, Row};
use receipt_scan_rust::api::ApiClient;
use receipt_scan_rust::cli::{Cli, Commands, InvoiceAction, ItemAction};
use receipt_scan_rust::config::Config;
use receipt_scan_rust::error::{ReceiptScanError, Result};
use receipt_scan_rust::live::{Frame, LiveSession, LiveSnapshot};
use receipt_scan_rust::pipeline::{self, CapturePipeline, PipelineOptions};
use receipt_scan_rust::recognizer::{CommandRecognizer, RecognizerKind, SidecarRecognizer, TextRecognizer};
use receipt_scan_rust::{export, scanner};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_recognizer(kind: RecognizerKind, config: &Config) -> Arc<dyn TextRecognizer> {
    let settings = &config.recognizer;
    match kind {
        RecognizerKind::Command => Arc::new(CommandRecognizer::from_config(
            settings,
            Duration::from_secs(config.timeout_seconds),
        )),
        RecognizerKind::Sidecar => {
            Arc::new(SidecarRecognizer::new(settings.origin, settings.min_confidence))
        }
    }
}

/// 通信が必要なコマンド用（トークン必須）
fn api_client(config: &Config) -> Result<ApiClient> {
    config.require_access_token()?;
    ApiClient::from_config(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.is_file() {
        return Err(ReceiptScanError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn print_rows(rows: &[Row]) {
    for (i, row) in rows.iter().enumerate() {
        let cells: Vec<String> = row
            .fragments
            .iter()
            .map(|f| match f.color {
                Some(color) => format!("{} ({})", f.text, color),
                None => f.text.clone(),
            })
            .collect();
        println!("  {:>3}: {}", i + 1, cells.join(" | "));
    }
}

fn print_invoice(invoice: &Invoice) {
    println!(
        "  {} [{}] {} 合計 {:.2}",
        invoice.id.as_deref().unwrap_or("-"),
        invoice.display_date(),
        invoice.title(),
        invoice.total_amount
    );
    for item in &invoice.items {
        println!(
            "    - {} x{} @ {:.2}",
            item.name,
            item.effective_quantity(),
            item.price
        );
    }
    for tax in &invoice.taxes {
        println!("    + {} {:.2}", tax.tax_name, tax.amount);
    }
    let calculated = invoice.calculated_total();
    if (calculated - invoice.total_amount).abs() > 0.005 && !invoice.items.is_empty() {
        println!("    ⚠ 明細から計算した合計: {:.2}", calculated);
    }
}

fn print_item(item: &Item) {
    println!(
        "  {} [{}] {} x{} @ {:.2}",
        item.id.as_deref().unwrap_or("-"),
        item.display_date(),
        item.name,
        item.effective_quantity(),
        item.price
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Scan { input, output, submit, upload, excel, anchor } => {
            println!("🧾 receipt-scan - スキャン\n");

            // 1. 画像スキャン
            println!("[1/3] 画像を検出中...");
            let images = scanner::resolve_inputs(&input)?;
            println!("✔ {}枚の画像を検出\n", images.len());

            // 2. 認識・行再構成・送信
            let options = PipelineOptions {
                color_tolerance: config.color_tolerance,
                anchor: anchor.into(),
                upload,
                submit: submit || upload,
            };
            let mut pipeline = CapturePipeline::new(build_recognizer(cli.recognizer, &config), options);
            if options.submit {
                pipeline = pipeline.with_api(api_client(&config)?);
            }

            println!("[2/3] 文字認識中... ({})", cli.recognizer);
            let batch = pipeline.run_batch(&images).await;
            println!(
                "✔ 認識完了: 成功 {}件 / 失敗 {}件\n",
                batch.reports.len(),
                batch.failures.len()
            );

            // 3. 結果
            println!("[3/3] 結果を出力中...");
            for report in &batch.reports {
                println!(
                    "■ {} ({}行 / {}件)",
                    report.file_name,
                    report.rows.len(),
                    report.fragment_count()
                );
                if output.is_none() {
                    print_rows(&report.rows);
                }
                if let Some(invoice) = &report.invoice {
                    print_invoice(invoice);
                }
            }
            for failure in &batch.failures {
                println!("✖ {}: {}", failure.file_name, failure.message);
            }
            let invoice_count = batch.invoices().count();
            if invoice_count > 0 {
                println!("✔ 請求書 {}件を抽出", invoice_count);
            }

            if let Some(output) = &output {
                let json = serde_json::to_string_pretty(&batch)?;
                std::fs::write(output, json)?;
                println!("✔ 結果を保存: {}", output.display());
            }

            if let Some(excel_path) = &excel {
                export::excel::generate_excel(&batch.reports, excel_path)?;
                println!("✔ Excel出力: {}", excel_path.display());
            }

            println!("\n✅ スキャン完了");
        }

        Commands::Rows { input, output, anchor } => {
            if !input.is_file() {
                return Err(ReceiptScanError::FileNotFound(input.display().to_string()));
            }
            let content = std::fs::read_to_string(&input)?;
            let fragments = parse_observations(&content)?;
            let options = PipelineOptions {
                color_tolerance: config.color_tolerance,
                anchor: anchor.into(),
                ..Default::default()
            };
            let layout = pipeline::build_layout(fragments, &options);

            match output {
                Some(output) => {
                    let json = serde_json::to_string_pretty(&layout.rows)?;
                    std::fs::write(&output, json)?;
                    println!("✔ {}行を保存: {}", layout.rows.len(), output.display());
                }
                None => print_rows(&layout.rows),
            }
            if layout.dropped > 0 {
                println!("⚠ 不正な矩形の断片を{}件除外", layout.dropped);
            }
        }

        Commands::Submit { input, file_id } => {
            println!("📤 receipt-scan - 送信\n");
            if !input.is_file() {
                return Err(ReceiptScanError::FileNotFound(input.display().to_string()));
            }
            let content = std::fs::read_to_string(&input)?;
            let submissions = pipeline::parse_submissions(&content, file_id.as_deref())?;
            let api = api_client(&config)?;

            for submission in &submissions {
                println!("- {} ({}行)", submission.label, submission.request.extracted_text.len());
                match api.submit_text(&submission.request, submission.file_id.as_deref()).await {
                    Ok(response) => {
                        println!("✔ {}", response.message);
                        print_invoice(&response.invoice);
                    }
                    Err(e) => println!("✖ 送信失敗: {}", e),
                }
            }
        }

        Commands::Upload { image } => {
            if !image.is_file() {
                return Err(ReceiptScanError::FileNotFound(image.display().to_string()));
            }
            let api = api_client(&config)?;
            let uploaded = api.upload_image(&image).await?;
            println!("✔ アップロード完了");
            println!("  ID: {}", uploaded.id);
            println!("  キー: {}", uploaded.key);
            if let Some(url) = &uploaded.url {
                println!("  URL: {}", url);
            }
        }

        Commands::Live { folder, interval_ms, fps } => {
            println!("🎥 receipt-scan - ライブスキャン\n");
            let images = scanner::scan_folder(&folder)?;
            if images.is_empty() {
                return Err(ReceiptScanError::NoImagesFound(folder.display().to_string()));
            }

            let interval = Duration::from_millis(interval_ms.unwrap_or(config.live_interval_ms));
            let session = LiveSession::new(build_recognizer(cli.recognizer, &config))
                .with_min_interval(interval)
                .with_color_tolerance(config.color_tolerance);

            let (frame_tx, frame_rx) = mpsc::channel(1);
            let (update_tx, mut update_rx) = watch::channel(LiveSnapshot::default());
            let session_task = tokio::spawn(session.run(frame_rx, update_tx));

            // 公開された結果を表示
            let printer = tokio::spawn(async move {
                while update_rx.changed().await.is_ok() {
                    let snapshot = update_rx.borrow_and_update().clone();
                    println!("#{} ({}件)", snapshot.sequence, snapshot.fragments.len());
                    print_rows(&group_into_rows(snapshot.fragments));
                }
            });

            // フォルダの画像をカメラのフレームとして流す
            let mut ticker = tokio::time::interval(Duration::from_secs(1) / fps.clamp(1, 1000));
            for image in &images {
                ticker.tick().await;
                // 認識中・処理待ちならフレームは捨てる
                let _ = frame_tx.try_send(Frame::new(&image.path, Instant::now()));
            }
            drop(frame_tx);

            let stats = session_task
                .await
                .map_err(|e| ReceiptScanError::Config(format!("ライブスキャン異常終了: {}", e)))?;
            let _ = printer.await;

            println!("\n✔ 処理 {} / 間引き {} / 認識中で破棄 {} / 失敗 {} / 表示終了で破棄 {}",
                stats.processed, stats.throttled, stats.busy_dropped, stats.failed, stats.discarded);
        }

        Commands::Export { input, output } => {
            println!("📄 receipt-scan - エクスポート\n");
            let batch: BatchReport = read_json(&input)?;
            let output_path = export::output_path_for(&input, output.as_deref(), "xlsx");

            println!("- Excelを生成中...");
            export::excel::generate_excel(&batch.reports, &output_path)?;
            println!("✔ Excel出力: {}", output_path.display());

            println!("\n✅ エクスポート完了");
        }

        Commands::Invoice { action } => {
            let api = api_client(&config)?;
            match action {
                InvoiceAction::List { project } => {
                    let invoices = api.list_invoices(project.as_deref()).await?;
                    println!("請求書: {}件", invoices.len());
                    for invoice in &invoices {
                        print_invoice(invoice);
                    }
                }
                InvoiceAction::Get { id } => {
                    let invoice = api.get_invoice(&id).await?;
                    println!("{}", serde_json::to_string_pretty(&invoice)?);
                }
                InvoiceAction::Create { input } => {
                    let invoice: Invoice = read_json(&input)?;
                    let created = api.create_invoice(&invoice).await?;
                    println!("✔ 請求書を作成しました");
                    print_invoice(&created);
                }
                InvoiceAction::Update { input } => {
                    let invoice: Invoice = read_json(&input)?;
                    let envelope = api.update_invoice(&invoice).await?;
                    if let Some(error) = &envelope.error {
                        println!("⚠ {}", error);
                    }
                    println!("✔ {}", envelope.message);
                    print_invoice(&envelope.invoice);
                }
            }
        }

        Commands::Item { action } => {
            let api = api_client(&config)?;
            match action {
                ItemAction::List { invoice, project } => {
                    let items = match (invoice, project) {
                        (Some(invoice_id), _) => api.list_items_for_invoice(&invoice_id).await?,
                        (None, Some(project_id)) => api.list_items_for_project(&project_id).await?,
                        (None, None) => Vec::new(),
                    };
                    println!("明細: {}件", items.len());
                    for item in &items {
                        print_item(item);
                    }
                }
                ItemAction::Get { id } => {
                    let item = api.get_item(&id).await?;
                    println!("{}", serde_json::to_string_pretty(&item)?);
                }
                ItemAction::Create { input } => {
                    let item: Item = read_json(&input)?;
                    let created = api.create_item(&item).await?;
                    println!("✔ 明細を作成しました");
                    print_item(&created);
                }
                ItemAction::Update { input } => {
                    let item: Item = read_json(&input)?;
                    let updated = api.update_item(&item).await?;
                    println!("✔ 明細を更新しました");
                    print_item(&updated);
                }
                ItemAction::Delete { id } => {
                    let response = api.delete_item(&id).await?;
                    match response.ok {
                        Some(false) => println!("⚠ 削除に失敗しました: {}", id),
                        _ => println!("✔ 明細を削除しました: {}", id),
                    }
                }
            }
        }

        Commands::Config { set_token, set_host, show } => {
            let mut config = config;

            if let Some(token) = set_token {
                config.set_access_token(token)?;
                println!("✔ アクセストークンを設定しました");
            }

            if let Some(host) = set_host {
                config.set_api_host(host)?;
                println!("✔ 接続先を設定しました");
            }

            if show {
                println!("設定:");
                println!("  接続先: {}", config.api_host());
                println!("  トークン: {}", if config.access_token().is_some() { "設定済み" } else { "未設定" });
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  色分け許容差: {}", config.color_tolerance);
                println!("  ライブ認識間隔: {}ms", config.live_interval_ms);
                println!("  認識コマンド: {} {}", config.recognizer.program, config.recognizer.args.join(" "));
                println!("  座標原点: {:?}", config.recognizer.origin);
                println!("  最低信頼度: {}", config.recognizer.min_confidence);
            }
        }
    }

    Ok(())
}
