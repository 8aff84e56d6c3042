use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde_json::{json, Value};

use super::base::{DeltaStream, Provider};
use super::configs::OpenAiProviderConfig;
use crate::errors::{ProviderError, ProviderResult};
use crate::models::message::Message;
use crate::stream::LineBuffer;

/// Streaming client for any OpenAI-compatible chat completion API
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

#[derive(Debug, PartialEq)]
enum ChunkLine {
    Skip,
    Done,
    Delta(String),
    Failed(ProviderError),
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> ProviderResult<Self> {
        // no request timeout
        let client = Client::builder().build()?;

        Ok(Self { client, config })
    }

    fn payload(&self, messages: &[Message]) -> Value {
        let mut payload = json!({
            "model": self.config.model,
            "messages": messages,
            "stream": true,
        });

        if let Some(temp) = self.config.temperature {
            payload["temperature"] = json!(temp);
        }
        if let Some(tokens) = self.config.max_tokens {
            payload["max_tokens"] = json!(tokens);
        }
        payload
    }

    async fn post(&self, payload: Value) -> ProviderResult<Response> {
        let url = format!(
            "{}/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());
        Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn parse_chunk_line(line: &str) -> ChunkLine {
        let Some(data) = line.strip_prefix("data:") else {
            return ChunkLine::Skip;
        };
        let data = data.trim();
        if data.is_empty() {
            return ChunkLine::Skip;
        }
        if data == "[DONE]" {
            return ChunkLine::Done;
        }

        let chunk: Value = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                return ChunkLine::Failed(ProviderError::Stream(format!(
                    "Failed to parse chunk: {}",
                    e
                )))
            }
        };

        if let Some(error) = chunk.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| error.to_string());
            return ChunkLine::Failed(ProviderError::Upstream(message));
        }

        match chunk
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)
        {
            Some(content) if !content.is_empty() => ChunkLine::Delta(content.to_string()),
            _ => ChunkLine::Skip,
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn stream(&self, messages: &[Message]) -> ProviderResult<DeltaStream> {
        let response = self.post(self.payload(messages)).await?;
        let mut body = response.bytes_stream();

        Ok(Box::pin(async_stream::stream! {
            let mut lines = LineBuffer::new();

            'read: while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(ProviderError::Stream(e.to_string()));
                        return;
                    }
                };

                for line in lines.push(&chunk) {
                    match Self::parse_chunk_line(&line) {
                        ChunkLine::Skip => {}
                        ChunkLine::Done => break 'read,
                        ChunkLine::Delta(content) => {
                            yield Ok(content);
                        }
                        ChunkLine::Failed(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sse_body(chunks: &[Value]) -> String {
        let mut body: String = chunks
            .iter()
            .map(|chunk| format!("data: {}\n\n", chunk))
            .collect();
        body.push_str("data: [DONE]\n\n");
        body
    }

    fn delta(content: &str) -> Value {
        json!({
            "id": "chatcmpl-123",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
        })
    }

    async fn setup_mock_server(response: ResponseTemplate) -> (MockServer, OpenAiProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/chat/completions"))
            .and(header("Authorization", "Bearer test_api_key"))
            .and(body_partial_json(json!({"model": "vision-test", "stream": true})))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        let config = OpenAiProviderConfig {
            host: format!("{}/api/v3/", mock_server.uri()),
            api_key: "test_api_key".to_string(),
            model: "vision-test".to_string(),
            temperature: None,
            max_tokens: None,
        };

        let provider = OpenAiProvider::new(config).unwrap();
        (mock_server, provider)
    }

    async fn collect(stream: DeltaStream) -> Vec<ProviderResult<String>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn test_stream_yields_deltas() {
        let body = sse_body(&[
            json!({"choices": [{"index": 0, "delta": {"role": "assistant"}}]}),
            delta("Hi"),
            delta(""),
            delta(" there"),
            json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]}),
        ]);
        let (_server, provider) =
            setup_mock_server(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
                .await;

        let messages = vec![Message::user().with_text("hello")];
        let items = collect(provider.stream(&messages).await.unwrap()).await;

        assert_eq!(items, vec![Ok("Hi".to_string()), Ok(" there".to_string())]);
    }

    #[tokio::test]
    async fn test_nothing_after_done_is_read() {
        let mut body = sse_body(&[delta("one")]);
        body.push_str(&format!("data: {}\n\n", delta("two")));
        let (_server, provider) =
            setup_mock_server(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
                .await;

        let items = collect(provider.stream(&[]).await.unwrap()).await;
        assert_eq!(items, vec![Ok("one".to_string())]);
    }

    #[tokio::test]
    async fn test_setup_failure_is_returned() {
        let (_server, provider) = setup_mock_server(
            ResponseTemplate::new(401).set_body_string("{\"error\":\"invalid api key\"}"),
        )
        .await;

        match provider.stream(&[]).await {
            Err(ProviderError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("invalid api key"));
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected setup failure"),
        }
    }

    #[tokio::test]
    async fn test_mid_stream_error_ends_stream() {
        let body = format!(
            "data: {}\n\ndata: {}\n\ndata: {}\n\n",
            delta("Partial"),
            json!({"error": {"message": "rate limited", "code": 429}}),
            delta("never")
        );
        let (_server, provider) =
            setup_mock_server(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
                .await;

        let items = collect(provider.stream(&[]).await.unwrap()).await;
        assert_eq!(
            items,
            vec![
                Ok("Partial".to_string()),
                Err(ProviderError::Upstream("rate limited".to_string()))
            ]
        );
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let config = OpenAiProviderConfig {
            host: "http://127.0.0.1:1".to_string(),
            api_key: "key".to_string(),
            model: "m".to_string(),
            temperature: None,
            max_tokens: None,
        };
        let provider = OpenAiProvider::new(config).unwrap();
        assert!(matches!(
            provider.stream(&[]).await,
            Err(ProviderError::RequestFailed(_))
        ));
    }

    #[test]
    fn test_payload_optional_parameters() {
        let config = OpenAiProviderConfig {
            host: "http://localhost".to_string(),
            api_key: "key".to_string(),
            model: "qwen-vl-max-latest".to_string(),
            temperature: Some(0.5),
            max_tokens: Some(512),
        };
        let provider = OpenAiProvider::new(config).unwrap();
        let messages = vec![Message::user()
            .with_text("what is this")
            .with_image("data:image/jpeg;base64,AAAA")];

        let payload = provider.payload(&messages);
        assert_eq!(payload["model"], "qwen-vl-max-latest");
        assert_eq!(payload["stream"], true);
        assert_eq!(payload["temperature"], json!(0.5));
        assert_eq!(payload["max_tokens"], json!(512));
        assert_eq!(
            payload["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,AAAA"
        );
    }

    #[test]
    fn test_parse_chunk_lines() {
        assert_eq!(OpenAiProvider::parse_chunk_line(": ping"), ChunkLine::Skip);
        assert_eq!(OpenAiProvider::parse_chunk_line("data:[DONE]"), ChunkLine::Done);
        assert_eq!(
            OpenAiProvider::parse_chunk_line(&format!("data:{}", delta("x"))),
            ChunkLine::Delta("x".to_string())
        );
        assert!(matches!(
            OpenAiProvider::parse_chunk_line("data: {oops"),
            ChunkLine::Failed(ProviderError::Stream(_))
        ));
    }
}
