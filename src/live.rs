//! ライブスキャン
//!
//! カメラのフレームをチャネルで受け取り、一定間隔ごとに認識にかける。
//! - 前回採用したフレームから `min_interval` 未満のフレームは捨てる
//! - 認識中に届いたフレームも捨てる（キューに積まない）
//! - 結果は色分けして `watch` チャネルに完了順で公開する
//! - 受け手が居なくなっていたら結果を捨ててセッションを終える

use crate::recognizer::{RecognitionError, TextRecognizer};
use receipt_scan_common::{assign_colors_with_tolerance, sanitize_fragments, TextFragment, DEFAULT_TOLERANCE};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(200);

/// カメラから届くフレーム
#[derive(Debug, Clone)]
pub struct Frame {
    pub path: PathBuf,
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(path: impl Into<PathBuf>, captured_at: Instant) -> Self {
        Self {
            path: path.into(),
            captured_at,
        }
    }
}

/// フレーム間引き（固定間隔、スキップのみ）
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    min_interval: Duration,
    last_accepted: Option<Instant>,
}

impl FrameThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted: None,
        }
    }

    /// 採用するなら記録して true
    pub fn accept(&mut self, at: Instant) -> bool {
        let ready = match self.last_accepted {
            Some(last) => at.saturating_duration_since(last) >= self.min_interval,
            None => true,
        };
        if ready {
            self.last_accepted = Some(at);
        }
        ready
    }
}

/// UIに見せる最新の認識結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveSnapshot {
    pub sequence: u64,
    pub fragments: Vec<TextFragment>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveStats {
    pub processed: u64,
    pub throttled: u64,
    pub busy_dropped: u64,
    pub failed: u64,
    pub discarded: u64,
}

type RecognitionTask = JoinHandle<Result<Vec<TextFragment>, RecognitionError>>;

async fn wait_in_flight(
    task: &mut Option<RecognitionTask>,
) -> Result<Result<Vec<TextFragment>, RecognitionError>, JoinError> {
    match task {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

pub struct LiveSession {
    recognizer: Arc<dyn TextRecognizer>,
    min_interval: Duration,
    color_tolerance: f64,
}

impl LiveSession {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            recognizer,
            min_interval: DEFAULT_MIN_INTERVAL,
            color_tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    pub fn with_color_tolerance(mut self, tolerance: f64) -> Self {
        self.color_tolerance = tolerance;
        self
    }

    /// フレームが尽きて認識中の処理も終わるか、受け手が居なくなるまで動く
    pub async fn run(
        self,
        mut frames: mpsc::Receiver<Frame>,
        updates: watch::Sender<LiveSnapshot>,
    ) -> LiveStats {
        let mut throttle = FrameThrottle::new(self.min_interval);
        let mut stats = LiveStats::default();
        let mut in_flight: Option<RecognitionTask> = None;
        let mut frames_open = true;
        let mut sequence = 0u64;

        while frames_open || in_flight.is_some() {
            tokio::select! {
                frame = frames.recv(), if frames_open => {
                    let Some(frame) = frame else {
                        debug!("フレーム入力終了");
                        frames_open = false;
                        continue;
                    };

                    if updates.is_closed() {
                        // 認識中の結果は待たずに破棄扱い（タスクは止めない）
                        if in_flight.is_some() {
                            stats.discarded += 1;
                        }
                        info!("表示側が閉じられたためセッション終了");
                        break;
                    }
                    if in_flight.is_some() {
                        stats.busy_dropped += 1;
                        continue;
                    }
                    if !throttle.accept(frame.captured_at) {
                        stats.throttled += 1;
                        continue;
                    }

                    debug!(path = %frame.path.display(), "フレーム認識開始");
                    let recognizer = Arc::clone(&self.recognizer);
                    in_flight = Some(tokio::spawn(async move {
                        recognizer.recognize(&frame.path).await
                    }));
                }

                joined = wait_in_flight(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;

                    if updates.is_closed() {
                        stats.discarded += 1;
                        info!("表示側が閉じられたため結果を破棄");
                        break;
                    }

                    match joined {
                        Ok(Ok(fragments)) => {
                            let sanitized = sanitize_fragments(fragments);
                            let fragments = assign_colors_with_tolerance(
                                sanitized.fragments,
                                self.color_tolerance,
                            );
                            sequence += 1;
                            stats.processed += 1;
                            debug!(sequence, fragments = fragments.len(), "結果を公開");
                            if updates.send(LiveSnapshot { sequence, fragments }).is_err() {
                                stats.processed -= 1;
                                stats.discarded += 1;
                                break;
                            }
                        }
                        Ok(Err(e)) => {
                            stats.failed += 1;
                            warn!(error = %e, "フレーム認識失敗");
                        }
                        Err(e) => {
                            stats.failed += 1;
                            warn!(error = %e, "認識タスク異常終了");
                        }
                    }
                }
            }
        }

        info!(
            processed = stats.processed,
            throttled = stats.throttled,
            busy_dropped = stats.busy_dropped,
            failed = stats.failed,
            discarded = stats.discarded,
            "ライブスキャン終了"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_first_frame_accepted() {
        let mut throttle = FrameThrottle::new(Duration::from_millis(200));
        assert!(throttle.accept(Instant::now()));
    }

    #[test]
    fn test_throttle_interval() {
        let start = Instant::now();
        let mut throttle = FrameThrottle::new(Duration::from_millis(200));
        assert!(throttle.accept(start));
        assert!(!throttle.accept(start + Duration::from_millis(100)));
        assert!(!throttle.accept(start + Duration::from_millis(199)));
        assert!(throttle.accept(start + Duration::from_millis(200)));
        // 間隔は最後に採用したフレームから測る
        assert!(!throttle.accept(start + Duration::from_millis(350)));
        assert!(throttle.accept(start + Duration::from_millis(400)));
    }

    #[test]
    fn test_throttle_out_of_order_frame_rejected() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut throttle = FrameThrottle::new(Duration::from_millis(200));
        assert!(throttle.accept(start));
        assert!(!throttle.accept(start - Duration::from_millis(500)));
    }
}
