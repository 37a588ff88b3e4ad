//! Outbound notification boundary.

use async_trait::async_trait;
use tracing::info;

/// Notifies a user that their composed video is ready.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Best-effort; failures are the implementation's problem to log.
    async fn video_ready(&self, email: &str, video_url: &str);
}

/// Default notifier: records the event in the logs only.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn video_ready(&self, email: &str, video_url: &str) {
        info!(email, video_url, "Video ready notification");
    }
}
