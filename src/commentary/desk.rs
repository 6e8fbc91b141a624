//! Background commentary fetches

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{CommentaryProvider, CommentaryRequest, Delivery, FALLBACK_EMPTY, FALLBACK_FAILED};
use crate::error::CommentaryError;

/// Ask `provider` for commentary, never failing.
///
/// Empty answers become [`FALLBACK_EMPTY`]; errors and timeouts become
/// [`FALLBACK_FAILED`].
pub async fn fetch_or_fallback(
    provider: &dyn CommentaryProvider,
    request: &CommentaryRequest,
    timeout: Duration,
) -> String {
    let outcome = match tokio::time::timeout(timeout, provider.comment(request)).await {
        Ok(result) => result,
        Err(_) => Err(CommentaryError::Timeout(timeout.as_millis() as u64)),
    };
    match outcome {
        Ok(text) if text.trim().is_empty() => {
            log::warn!("Commentary service returned no text");
            FALLBACK_EMPTY.to_string()
        }
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            log::warn!("Error fetching commentary: {}", e);
            FALLBACK_FAILED.to_string()
        }
    }
}

/// Runs commentary fetches as independent tasks and collects the answers.
///
/// Each answer carries the epoch it was requested for; whether it is still
/// wanted is the engine's call.
pub struct CommentaryDesk {
    provider: Arc<dyn CommentaryProvider>,
    timeout: Duration,
    tx: UnboundedSender<Delivery>,
    rx: UnboundedReceiver<Delivery>,
}

impl CommentaryDesk {
    pub fn new(provider: Arc<dyn CommentaryProvider>, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            provider,
            timeout,
            tx,
            rx,
        }
    }

    /// Start a fetch for `epoch`. Must be called inside a tokio runtime.
    pub fn request(&self, epoch: u64, request: CommentaryRequest) {
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        let timeout = self.timeout;
        log::debug!("Requesting commentary for epoch {}", epoch);
        tokio::spawn(async move {
            let text = fetch_or_fallback(provider.as_ref(), &request, timeout).await;
            // Receiver gone means the desk was dropped; nobody is waiting
            let _ = tx.send(Delivery { epoch, text });
        });
    }

    /// A finished answer, if any arrived
    pub fn try_recv(&mut self) -> Option<Delivery> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next answer
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commentary::CannedProvider;
    use crate::sim::GameTheme;
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl CommentaryProvider for Fixed {
        async fn comment(&self, _request: &CommentaryRequest) -> Result<String, CommentaryError> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl CommentaryProvider for Failing {
        async fn comment(&self, _request: &CommentaryRequest) -> Result<String, CommentaryError> {
            Err(CommentaryError::Status(503))
        }
    }

    /// Takes `per_point_ms` per scored point to answer
    struct Slow {
        per_point_ms: u64,
    }

    #[async_trait]
    impl CommentaryProvider for Slow {
        async fn comment(&self, request: &CommentaryRequest) -> Result<String, CommentaryError> {
            let delay = self.per_point_ms * u64::from(request.score);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(format!("slow {}", request.score))
        }
    }

    fn request(score: u32) -> CommentaryRequest {
        CommentaryRequest::new(GameTheme::Snake, score, 4)
    }

    #[tokio::test]
    async fn test_fallbacks() {
        let timeout = Duration::from_millis(200);
        assert_eq!(fetch_or_fallback(&Fixed("  Nice!  "), &request(1), timeout).await, "Nice!");
        assert_eq!(fetch_or_fallback(&Fixed("   "), &request(1), timeout).await, FALLBACK_EMPTY);
        assert_eq!(fetch_or_fallback(&Failing, &request(1), timeout).await, FALLBACK_FAILED);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let slow = Slow { per_point_ms: 1000 };
        let text = fetch_or_fallback(&slow, &request(10), Duration::from_millis(8000)).await;
        assert_eq!(text, FALLBACK_FAILED);
    }

    #[tokio::test]
    async fn test_desk_tags_epochs() {
        let mut desk = CommentaryDesk::new(Arc::new(CannedProvider), Duration::from_secs(1));
        assert!(desk.try_recv().is_none());
        desk.request(7, request(30));
        let delivery = desk.recv().await.expect("delivery");
        assert_eq!(delivery.epoch, 7);
        assert!(delivery.text.contains("30 points"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_desk_answers_out_of_order() {
        let mut desk = CommentaryDesk::new(Arc::new(Slow { per_point_ms: 100 }), Duration::from_secs(8));
        desk.request(0, request(20));
        desk.request(1, request(1));

        let first = desk.recv().await.expect("delivery");
        assert_eq!(first, Delivery { epoch: 1, text: "slow 1".to_string() });
        let second = desk.recv().await.expect("delivery");
        assert_eq!(second, Delivery { epoch: 0, text: "slow 20".to_string() });
    }
}
