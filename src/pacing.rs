//! Fixed-interval request pacing.
//!
//! The remote API has no published rate limit, so the scan waits a fixed time after
//! every call whether it succeeded or not. Nothing adapts to errors or latency.

use crate::config::ResolvedConfig;
use std::time::Duration;
use tokio::time::sleep;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    request: Duration,
    download: Duration,
    between_cnpj: Duration,
}

impl Pacer {
    pub fn new(request: Duration, download: Duration, between_cnpj: Duration) -> Self {
        Self {
            request,
            download,
            between_cnpj,
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(
            Duration::from_millis(config.request_delay_ms),
            Duration::from_millis(config.download_delay_ms),
            Duration::from_millis(config.between_cnpj_delay_ms),
        )
    }

    /// No waiting at all.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }

    /// Waits after a certificate listing request.
    pub async fn after_request(&self) {
        pause("request", self.request).await;
    }

    /// Waits after a file download attempt.
    pub async fn after_download(&self) {
        pause("download", self.download).await;
    }

    /// Waits after all months of a CNPJ were visited.
    pub async fn after_cnpj(&self) {
        pause("between_cnpj", self.between_cnpj).await;
    }
}

async fn pause(kind: &'static str, delay: Duration) {
    if delay.is_zero() {
        return;
    }
    trace!(kind, delay_ms = delay.as_millis() as u64, "Pacing");
    sleep(delay).await;
}
