//! Rotating status messages shown while an analysis is in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// How often the message changes.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

/// Published as soon as the analysis starts.
pub const INITIAL_PROGRESS_MESSAGE: &str = "위험 요인을 분석하고 있습니다...";

/// Rotation order. The first tick publishes index 1, then wraps around.
pub const PROGRESS_MESSAGES: [&str; 4] = [
    "공사 현장의 특성을 파악 중입니다...",
    "공종별 위험 요인을 도출하고 있습니다...",
    "KOSHA 가이드라인에 따른 안전 대책을 수립 중입니다...",
    "최종 위험성평가표를 생성하고 있습니다...",
];

/// Background task that publishes progress messages until stopped.
///
/// Dropping the ticker stops it, so every exit path of the owning future
/// (including the future itself being dropped) ends the rotation.
#[derive(Debug)]
pub struct ProgressTicker {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    /// Publish the initial message and spawn the rotation task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(sender: Arc<watch::Sender<String>>) -> Self {
        sender.send_replace(INITIAL_PROGRESS_MESSAGE.to_string());

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + PROGRESS_INTERVAL, PROGRESS_INTERVAL);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut index = 0usize;

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticks.tick() => {
                        index = (index + 1) % PROGRESS_MESSAGES.len();
                        sender.send_replace(PROGRESS_MESSAGES[index].to_string());
                    }
                }
            }
            tracing::trace!("progress ticker stopped");
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Stop publishing and wait for the task to exit.
    ///
    /// Once this returns no further message will be published, so the
    /// caller can overwrite the channel without racing a late tick.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                tracing::debug!(error = %err, "progress ticker ended abnormally");
            }
        }
    }
}

// Without `stop()` (e.g. the owning future was dropped) the task is aborted.
impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
