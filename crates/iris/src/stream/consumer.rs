use bytes::Bytes;
use futures::{Stream, StreamExt};

use super::frame::{parse_line, ParsedLine, StreamEvent};
use super::line_buffer::LineBuffer;

/// Change to apply to the in-progress assistant message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnUpdate {
    /// Full assistant text received so far
    Snapshot(String),
    /// The relay reported an error; the turn did not happen
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumerOutcome {
    Completed { text: String, saw_done: bool },
    Failed(String),
}

/// Decodes a relay event stream into assistant text.
///
/// Deltas are accumulated so every update carries the whole text so far. An error frame ends
/// consumption: anything after it is ignored.
#[derive(Debug, Default)]
pub struct StreamConsumer {
    lines: LineBuffer,
    text: String,
    failure: Option<String>,
    saw_done: bool,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<TurnUpdate> {
        let mut updates = Vec::new();
        if self.failure.is_some() {
            return updates;
        }

        for line in self.lines.push(chunk) {
            match parse_line(&line) {
                ParsedLine::Ignored => {}
                ParsedLine::Done => self.saw_done = true,
                ParsedLine::Malformed(reason) => {
                    tracing::warn!("Skipping malformed stream frame: {}", reason);
                }
                ParsedLine::Event(StreamEvent::Content(delta)) => {
                    self.text.push_str(&delta);
                    updates.push(TurnUpdate::Snapshot(self.text.clone()));
                }
                ParsedLine::Event(StreamEvent::Error(message)) => {
                    tracing::error!("Stream error: {}", message);
                    self.failure = Some(message.clone());
                    updates.push(TurnUpdate::Failed(message));
                    break;
                }
            }
        }
        updates
    }

    /// Called once the underlying read reports end of stream
    pub fn finish(mut self) -> ConsumerOutcome {
        if let Some(rest) = self.lines.finish() {
            tracing::debug!("Discarding unterminated trailing line: {:?}", rest);
        }
        match self.failure {
            Some(message) => ConsumerOutcome::Failed(message),
            None => ConsumerOutcome::Completed {
                text: self.text,
                saw_done: self.saw_done,
            },
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Read a relay response body to its end, reporting each update as it is decoded.
///
/// Stops early after an error frame. A transport error while reading is returned as is.
pub async fn consume<S, E, F>(mut body: S, mut on_update: F) -> Result<ConsumerOutcome, E>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    F: FnMut(TurnUpdate),
{
    let mut consumer = StreamConsumer::new();
    while let Some(chunk) = body.next().await {
        for update in consumer.feed(&chunk?) {
            on_update(update);
        }
        if consumer.is_failed() {
            break;
        }
    }
    Ok(consumer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::frame::Frame;
    use futures::stream;
    use std::convert::Infallible;

    fn wire(frames: &[Frame]) -> Vec<u8> {
        frames.iter().map(Frame::encode).collect::<String>().into_bytes()
    }

    fn decode_in_chunks(
        bytes: &[u8],
        sizes: impl Fn(usize) -> usize,
    ) -> (Vec<TurnUpdate>, ConsumerOutcome) {
        let mut consumer = StreamConsumer::new();
        let mut updates = Vec::new();
        let mut offset = 0;
        let mut index = 0;
        while offset < bytes.len() {
            let end = (offset + sizes(index).max(1)).min(bytes.len());
            updates.extend(consumer.feed(&bytes[offset..end]));
            offset = end;
            index += 1;
        }
        (updates, consumer.finish())
    }

    #[test]
    fn test_text_is_concatenation_of_deltas() {
        let bytes = wire(&[Frame::content("Hi"), Frame::content(" there"), Frame::Done]);
        let mut consumer = StreamConsumer::new();
        let updates = consumer.feed(&bytes);

        assert_eq!(
            updates,
            vec![
                TurnUpdate::Snapshot("Hi".to_string()),
                TurnUpdate::Snapshot("Hi there".to_string()),
            ]
        );
        assert_eq!(
            consumer.finish(),
            ConsumerOutcome::Completed {
                text: "Hi there".to_string(),
                saw_done: true
            }
        );
    }

    #[test]
    fn test_any_split_gives_same_result() {
        let bytes = wire(&[
            Frame::content("Ünïcödé "),
            Frame::content("mixed 漢字 "),
            Frame::content("and emoji 🦀\n"),
            Frame::Done,
        ]);
        let (whole_updates, whole) = decode_in_chunks(&bytes, |_| bytes.len());

        for split in 1..bytes.len() {
            let (_, outcome) =
                decode_in_chunks(&bytes, |i| if i == 0 { split } else { bytes.len() });
            assert_eq!(outcome, whole, "split at byte {}", split);
        }

        let (byte_updates, byte_by_byte) = decode_in_chunks(&bytes, |_| 1);
        assert_eq!(byte_by_byte, whole);
        assert_eq!(byte_updates, whole_updates);

        let (_, uneven) = decode_in_chunks(&bytes, |i| (i * 7) % 5 + 1);
        assert_eq!(uneven, whole);
    }

    #[test]
    fn test_error_frame_ends_turn() {
        let bytes = wire(&[
            Frame::content("Partial"),
            Frame::error("upstream went away"),
            Frame::content("ignored"),
        ]);
        let mut consumer = StreamConsumer::new();
        let updates = consumer.feed(&bytes);

        assert_eq!(
            updates,
            vec![
                TurnUpdate::Snapshot("Partial".to_string()),
                TurnUpdate::Failed("upstream went away".to_string()),
            ]
        );
        assert!(consumer.feed(&wire(&[Frame::content("more")])).is_empty());
        assert_eq!(
            consumer.finish(),
            ConsumerOutcome::Failed("upstream went away".to_string())
        );
    }

    #[test]
    fn test_malformed_frame_is_skipped() {
        let mut bytes = wire(&[Frame::content("a")]);
        bytes.extend_from_slice(b"data: {not json}\n\n: keep-alive\n\n");
        bytes.extend(wire(&[Frame::content("b"), Frame::Done]));

        let (_, outcome) = decode_in_chunks(&bytes, |_| 3);
        assert_eq!(
            outcome,
            ConsumerOutcome::Completed {
                text: "ab".to_string(),
                saw_done: true
            }
        );
    }

    #[test]
    fn test_unterminated_trailing_frame_is_dropped() {
        let mut bytes = wire(&[Frame::content("kept")]);
        bytes.extend_from_slice(b"data: {\"content\":\"lost\"}");

        let (_, outcome) = decode_in_chunks(&bytes, |_| bytes.len());
        assert_eq!(
            outcome,
            ConsumerOutcome::Completed {
                text: "kept".to_string(),
                saw_done: false
            }
        );
    }

    #[tokio::test]
    async fn test_consume_reports_updates() {
        let bytes = wire(&[Frame::content("Hi"), Frame::content(" there"), Frame::Done]);
        let chunks: Vec<Result<Bytes, Infallible>> = bytes
            .chunks(4)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();

        let mut snapshots = Vec::new();
        let outcome = consume(stream::iter(chunks), |update| snapshots.push(update))
            .await
            .unwrap();

        assert_eq!(snapshots.last(), Some(&TurnUpdate::Snapshot("Hi there".to_string())));
        assert_eq!(
            outcome,
            ConsumerOutcome::Completed {
                text: "Hi there".to_string(),
                saw_done: true
            }
        );
    }

    #[tokio::test]
    async fn test_consume_propagates_read_errors() {
        let chunks: Vec<Result<Bytes, &str>> = vec![
            Ok(Bytes::from(Frame::content("Hi").encode())),
            Err("connection reset"),
        ];
        let result = consume(stream::iter(chunks), |_| {}).await;
        assert_eq!(result, Err("connection reset"));
    }
}
