use anyhow::{bail, Context, Result};
use iris::models::message::ChatRequest;
use iris::providers::configs::ProviderKind;
use reqwest::{Client, Response};

/// HTTP client for the relay's chat routes
pub struct RelayClient {
    client: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn route(kind: ProviderKind) -> &'static str {
        match kind {
            ProviderKind::Doubao => "/api/chat",
            ProviderKind::Qwen => "/api/qwen-chat",
        }
    }

    /// Submit one turn. The returned response body is the relay's event stream.
    pub async fn send(&self, kind: ProviderKind, request: &ChatRequest) -> Result<Response> {
        let url = format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            Self::route(kind)
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("Failed to reach relay at {}", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP error! status: {}", status);
        }
        Ok(response)
    }
}
