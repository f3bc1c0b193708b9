//! Global spacing between outbound API calls.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum gap between consecutive outbound requests.
///
/// One pacer is shared by every call site on a client, so the request rate
/// stays bounded no matter how many brand pipelines run concurrently. The
/// per-call retry back-off alone cannot provide that guarantee once callers
/// run in parallel.
///
/// Waiters queue on the internal lock, so concurrent acquirers are released
/// one gap apart rather than in a burst.
#[derive(Debug, Clone)]
pub struct Pacer {
    min_gap: Duration,
    last_call: Arc<Mutex<Option<Instant>>>,
}

impl Pacer {
    #[must_use]
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last_call: Arc::new(Mutex::new(None)),
        }
    }

    /// Waits until at least `min_gap` has passed since the previous call,
    /// then records the new call time. A zero gap returns immediately.
    pub async fn acquire(&self) {
        if self.min_gap.is_zero() {
            return;
        }
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.min_gap;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}
