use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use iris::attachments::load_jpeg_data_uri;
use iris::models::message::Message;
use iris::providers::configs::ProviderKind;
use iris::stream::{consume, ConsumerOutcome, TurnUpdate};
use iris::transcript::Transcript;

use crate::client::RelayClient;

#[derive(Debug, PartialEq, Eq)]
pub enum TurnResult {
    /// Nothing to send
    Skipped,
    Completed(String),
    /// The relay sent an error frame; the turn was rolled back
    Failed(String),
    /// Interrupted with ctrl-c; the turn was rolled back
    Interrupted,
}

/// An image waiting to go out with the next turn
#[derive(Debug, Clone)]
pub struct PendingImage {
    pub path: PathBuf,
    pub data_uri: String,
}

/// One conversation with one hosted model through the relay
pub struct Session {
    client: RelayClient,
    kind: ProviderKind,
    transcript: Transcript,
    pending_images: Vec<PendingImage>,
}

impl Session {
    pub fn new(client: RelayClient, kind: ProviderKind) -> Self {
        Self {
            client,
            kind,
            transcript: Transcript::default(),
            pending_images: Vec::new(),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn pending_images(&self) -> &[PendingImage] {
        &self.pending_images
    }

    /// Re-encode an image file and hold it for the next turn
    pub fn attach_image(&mut self, path: &Path) -> Result<()> {
        let data_uri = load_jpeg_data_uri(path)
            .with_context(|| format!("Failed to load image {}", path.display()))?;
        self.pending_images.push(PendingImage {
            path: path.to_path_buf(),
            data_uri,
        });
        Ok(())
    }

    /// Drop one pending image by position, keeping the order of the rest
    pub fn remove_image(&mut self, index: usize) -> Option<PendingImage> {
        (index < self.pending_images.len()).then(|| self.pending_images.remove(index))
    }

    /// Drop every pending image without touching the conversation
    pub fn clear_images(&mut self) {
        self.pending_images.clear();
    }

    pub fn clear(&mut self) -> Result<()> {
        self.pending_images.clear();
        self.transcript.clear()?;
        Ok(())
    }

    /// Send one turn and stream the reply, calling `on_text` with each new piece of text.
    ///
    /// Any failure leaves the transcript as it was before the turn.
    pub async fn run_turn<F>(&mut self, input: &str, mut on_text: F) -> Result<TurnResult>
    where
        F: FnMut(&str),
    {
        let images: Vec<String> = std::mem::take(&mut self.pending_images)
            .into_iter()
            .map(|image| image.data_uri)
            .collect();
        let Some(message) = Message::compose_user(input, &images) else {
            return Ok(TurnResult::Skipped);
        };

        let request = self.transcript.begin_turn(message)?;
        let response = match self.client.send(self.kind, &request).await {
            Ok(response) => response,
            Err(e) => {
                self.transcript.rollback()?;
                return Err(e);
            }
        };
        self.transcript.start_streaming()?;

        let transcript = &mut self.transcript;
        let mut shown = 0;
        let outcome = tokio::select! {
            result = consume(Box::pin(response.bytes_stream()), |update| {
                if let TurnUpdate::Snapshot(text) = &update {
                    on_text(&text[shown..]);
                    shown = text.len();
                }
                if let Err(e) = transcript.apply(update) {
                    tracing::warn!("Ignoring stream update: {}", e);
                }
            }) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };

        match outcome {
            None => {
                self.transcript.rollback()?;
                Ok(TurnResult::Interrupted)
            }
            Some(Err(e)) => {
                self.transcript.rollback()?;
                Err(e).context("Relay stream was interrupted")
            }
            Some(Ok(ConsumerOutcome::Failed(message))) => Ok(TurnResult::Failed(message)),
            Some(Ok(ConsumerOutcome::Completed { text, .. })) => {
                self.transcript.complete()?;
                Ok(TurnResult::Completed(text))
            }
        }
    }
}
