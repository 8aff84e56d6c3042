use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::base::{DeltaStream, Provider};
use crate::errors::{ProviderError, ProviderResult};
use crate::models::message::Message;

/// A mock provider that streams pre-configured deltas, for testing
#[derive(Clone)]
pub struct MockProvider {
    deltas: Vec<String>,
    setup_error: Option<ProviderError>,
    failure: Option<ProviderError>,
    delay: Option<Duration>,
    hang: bool,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
    dropped: Arc<AtomicBool>,
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl MockProvider {
    /// Create a new mock provider that streams the given deltas
    pub fn new<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            deltas: deltas.into_iter().map(Into::into).collect(),
            setup_error: None,
            failure: None,
            delay: None,
            hang: false,
            requests: Arc::new(Mutex::new(Vec::new())),
            dropped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A provider whose call fails before any delta is produced
    pub fn failing_setup(error: ProviderError) -> Self {
        Self {
            setup_error: Some(error),
            ..Self::new(Vec::<String>::new())
        }
    }

    /// Fail after all deltas have been streamed
    pub fn with_failure(mut self, error: ProviderError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Wait before each delta
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Never finish after the last delta
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Conversations received so far, one entry per call
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Whether a stream handed out by this provider has been dropped
    pub fn stream_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn stream(&self, messages: &[Message]) -> ProviderResult<DeltaStream> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }
        if let Some(error) = &self.setup_error {
            return Err(error.clone());
        }

        let deltas = self.deltas.clone();
        let failure = self.failure.clone();
        let delay = self.delay;
        let hang = self.hang;
        let flag = DropFlag(self.dropped.clone());

        Ok(Box::pin(async_stream::stream! {
            let _flag = flag;
            for delta in deltas {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(delta);
            }
            if let Some(error) = failure {
                yield Err(error);
                return;
            }
            if hang {
                futures::future::pending::<()>().await;
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_scripted_deltas_then_failure() {
        let provider = MockProvider::new(["a", "b"])
            .with_failure(ProviderError::Stream("connection reset".to_string()));

        let items: Vec<_> = provider.stream(&[]).await.unwrap().collect().await;
        assert_eq!(
            items,
            vec![
                Ok("a".to_string()),
                Ok("b".to_string()),
                Err(ProviderError::Stream("connection reset".to_string()))
            ]
        );
        assert!(provider.stream_dropped());
    }

    #[tokio::test]
    async fn test_records_requests() {
        let provider = MockProvider::failing_setup(ProviderError::RequestFailed("dns".to_string()));
        let messages = vec![Message::user().with_text("hi")];

        assert!(provider.stream(&messages).await.is_err());
        assert_eq!(provider.requests(), vec![messages]);
    }
}
