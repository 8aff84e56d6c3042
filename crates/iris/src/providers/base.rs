use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::ProviderResult;
use crate::models::message::Message;

/// Incremental text deltas of one assistant turn.
///
/// A failure part way through is yielded as a single `Err` item, after which the stream ends.
pub type DeltaStream = BoxStream<'static, ProviderResult<String>>;

/// Base trait for hosted model providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Model identifier sent upstream
    fn model(&self) -> &str;

    /// Open a streaming completion for the conversation.
    ///
    /// Errors raised while setting up the call (bad credentials, network failure, non-success
    /// status) are returned directly. Nothing is retried.
    async fn stream(&self, messages: &[Message]) -> ProviderResult<DeltaStream>;
}
