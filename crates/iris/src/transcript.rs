//! Client-side conversation state for one chat session.
//!
//! History only grows, except that a failed turn is rolled back as if it never happened.
//! One turn at a time: a new turn cannot begin while the previous one is sending or streaming.
use crate::errors::TranscriptError;
use crate::models::content::MessageContent;
use crate::models::message::{ChatRequest, Message, DEFAULT_SYSTEM_PROMPT};
use crate::models::role::Role;
use crate::stream::TurnUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    /// User message appended, relay request in flight
    Sending,
    /// Assistant placeholder appended, deltas arriving
    Streaming,
}

#[derive(Debug, Clone)]
pub struct Transcript {
    system_prompt: String,
    messages: Vec<Message>,
    state: TurnState,
    turn_start: usize,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl Transcript {
    pub fn new<S: Into<String>>(system_prompt: S) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: Vec::new(),
            state: TurnState::Idle,
            turn_start: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state != TurnState::Idle
    }

    /// Append the user message and build the relay request for this turn.
    ///
    /// The request carries one system message followed by the full history.
    pub fn begin_turn(&mut self, message: Message) -> Result<ChatRequest, TranscriptError> {
        if self.is_busy() {
            return Err(TranscriptError::Busy);
        }
        self.turn_start = self.messages.len();
        self.messages.push(message);
        self.state = TurnState::Sending;

        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(self.messages.iter().cloned());
        Ok(ChatRequest { messages })
    }

    /// The relay accepted the request; add the empty assistant message deltas will fill
    pub fn start_streaming(&mut self) -> Result<(), TranscriptError> {
        if self.state != TurnState::Sending {
            return Err(TranscriptError::NoTurn);
        }
        self.messages.push(Message::assistant());
        self.state = TurnState::Streaming;
        Ok(())
    }

    pub fn apply(&mut self, update: TurnUpdate) -> Result<(), TranscriptError> {
        match update {
            TurnUpdate::Snapshot(text) => {
                if self.state != TurnState::Streaming {
                    return Err(TranscriptError::NoTurn);
                }
                if let Some(last) = self.messages.last_mut() {
                    if last.role == Role::Assistant {
                        last.content = MessageContent::Text(text);
                    }
                }
                Ok(())
            }
            TurnUpdate::Failed(_) => self.rollback(),
        }
    }

    /// The stream ended normally; keep the assistant message
    pub fn complete(&mut self) -> Result<(), TranscriptError> {
        if self.state != TurnState::Streaming {
            return Err(TranscriptError::NoTurn);
        }
        self.state = TurnState::Idle;
        Ok(())
    }

    /// Drop every message the current turn added
    pub fn rollback(&mut self) -> Result<(), TranscriptError> {
        if !self.is_busy() {
            return Err(TranscriptError::NoTurn);
        }
        self.messages.truncate(self.turn_start);
        self.state = TurnState::Idle;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), TranscriptError> {
        if self.is_busy() {
            return Err(TranscriptError::Busy);
        }
        self.messages.clear();
        self.turn_start = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streaming_turn(transcript: &mut Transcript, text: &str) {
        transcript.begin_turn(Message::user().with_text(text)).unwrap();
        transcript.start_streaming().unwrap();
    }

    #[test]
    fn test_request_prepends_one_system_message() {
        let mut transcript = Transcript::default();
        streaming_turn(&mut transcript, "first");
        transcript
            .apply(TurnUpdate::Snapshot("reply".to_string()))
            .unwrap();
        transcript.complete().unwrap();

        let request = transcript
            .begin_turn(Message::user().with_text("second"))
            .unwrap();
        let roles: Vec<Role> = request.messages.iter().map(|m| m.role.clone()).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(request.messages[0].text(), DEFAULT_SYSTEM_PROMPT);
        assert_eq!(request.messages[2].text(), "reply");
    }

    #[test]
    fn test_snapshots_replace_assistant_text() {
        let mut transcript = Transcript::default();
        streaming_turn(&mut transcript, "hello");
        for snapshot in ["Hi", "Hi there"] {
            transcript
                .apply(TurnUpdate::Snapshot(snapshot.to_string()))
                .unwrap();
        }
        transcript.complete().unwrap();

        assert_eq!(transcript.messages().len(), 2);
        assert_eq!(transcript.messages()[1].text(), "Hi there");
        assert_eq!(transcript.state(), TurnState::Idle);
    }

    #[test]
    fn test_busy_while_turn_in_flight() {
        let mut transcript = Transcript::default();
        transcript.begin_turn(Message::user().with_text("one")).unwrap();
        assert_eq!(
            transcript.begin_turn(Message::user().with_text("two")),
            Err(TranscriptError::Busy)
        );

        transcript.start_streaming().unwrap();
        assert_eq!(
            transcript.begin_turn(Message::user().with_text("two")),
            Err(TranscriptError::Busy)
        );
        assert_eq!(transcript.clear(), Err(TranscriptError::Busy));
    }

    #[test]
    fn test_error_frame_rolls_back_turn() {
        let mut transcript = Transcript::default();
        streaming_turn(&mut transcript, "kept");
        transcript.complete().unwrap();

        streaming_turn(&mut transcript, "dropped");
        transcript
            .apply(TurnUpdate::Snapshot("Partial".to_string()))
            .unwrap();
        transcript
            .apply(TurnUpdate::Failed("boom".to_string()))
            .unwrap();

        assert_eq!(transcript.state(), TurnState::Idle);
        assert_eq!(transcript.messages().len(), 2);
        assert_eq!(transcript.messages()[0].text(), "kept");
    }

    #[test]
    fn test_request_failure_rolls_back_user_message() {
        let mut transcript = Transcript::default();
        transcript.begin_turn(Message::user().with_text("hello")).unwrap();
        transcript.rollback().unwrap();

        assert!(transcript.messages().is_empty());
        assert!(!transcript.is_busy());
        assert_eq!(transcript.rollback(), Err(TranscriptError::NoTurn));
    }

    #[test]
    fn test_out_of_order_calls_rejected() {
        let mut transcript = Transcript::default();
        assert_eq!(transcript.start_streaming(), Err(TranscriptError::NoTurn));
        assert_eq!(transcript.complete(), Err(TranscriptError::NoTurn));
        assert_eq!(
            transcript.apply(TurnUpdate::Snapshot("x".to_string())),
            Err(TranscriptError::NoTurn)
        );
    }
}
