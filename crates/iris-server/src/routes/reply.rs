use crate::state::AppState;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::{stream::StreamExt, Stream};
use iris::{
    models::message::{ChatRequest, Message},
    providers::{base::Provider, configs::ProviderKind},
    stream::Frame,
};
use serde_json::{json, Value};
use std::{
    convert::Infallible,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Images travel inline as data URIs, so bodies get large
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

// Frames waiting for a slow client; beyond this the upstream read waits too
const CHANNEL_CAPACITY: usize = 16;

// Event stream response carrying encoded relay frames
pub struct SseResponse {
    rx: ReceiverStream<String>,
}

impl SseResponse {
    fn new(rx: ReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        let body = Body::from_stream(self);

        (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
                (header::CONNECTION, "keep-alive"),
            ],
            body,
        )
            .into_response()
    }
}

/// Pump upstream deltas into the response channel until the turn ends.
///
/// Emits one content frame per delta and the done frame on success. Any upstream failure
/// becomes a single error frame and nothing follows it. Returns early once the client has
/// gone away, which drops the upstream stream with it.
async fn forward(provider: Arc<dyn Provider>, messages: Vec<Message>, tx: mpsc::Sender<String>) {
    let started = tokio::select! {
        _ = tx.closed() => {
            tracing::info!("Client disconnected before the upstream call started");
            return;
        }
        result = provider.stream(&messages) => result,
    };

    let mut stream = match started {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!("Failed to start upstream stream: {}", e);
            let _ = tx.send(Frame::error(e.to_string()).encode()).await;
            return;
        }
    };

    loop {
        tokio::select! {
            _ = tx.closed() => {
                tracing::info!("Client disconnected, dropping upstream stream");
                return;
            }
            item = stream.next() => match item {
                Some(Ok(delta)) => {
                    if let Err(e) = tx.send(Frame::content(delta).encode()).await {
                        tracing::error!("Error sending frame through channel: {}", e);
                        return;
                    }
                }
                Some(Err(e)) => {
                    tracing::error!("Upstream stream failed: {}", e);
                    let _ = tx.send(Frame::error(e.to_string()).encode()).await;
                    return;
                }
                None => break,
            }
        }
    }

    let _ = tx.send(Frame::Done.encode()).await;
}

async fn relay(
    state: AppState,
    kind: ProviderKind,
    request: ChatRequest,
) -> Result<SseResponse, (StatusCode, Json<Value>)> {
    if request.messages.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "messages must not be empty" })),
        ));
    }

    let provider = state.provider(kind);
    tracing::info!(
        provider = kind.name(),
        model = provider.model(),
        messages = request.messages.len(),
        "Relaying chat turn"
    );

    // Create channel for streaming
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(forward(provider, request.messages, tx));

    Ok(SseResponse::new(ReceiverStream::new(rx)))
}

async fn doubao_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<SseResponse, (StatusCode, Json<Value>)> {
    relay(state, ProviderKind::Doubao, request).await
}

async fn qwen_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<SseResponse, (StatusCode, Json<Value>)> {
    relay(state, ProviderKind::Qwen, request).await
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(doubao_handler))
        .route("/api/qwen-chat", post(qwen_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
