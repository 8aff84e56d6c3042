use super::content::{ContentPart, MessageContent};
use super::role::Role;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// System prompt sent ahead of every conversation
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that can understand images and text.";

/// Prompt used when images are attached without any text
pub const DEFAULT_IMAGE_PROMPT: &str = "What can you tell me about this image?";
pub const DEFAULT_IMAGES_PROMPT: &str = "What can you tell me about these images?";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: MessageContent,
    /// Fields the relay does not interpret, forwarded as received
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn new<C: Into<MessageContent>>(role: Role, content: C) -> Self {
        Message {
            role,
            content: content.into(),
            extra: Map::new(),
        }
    }

    pub fn system<S: Into<String>>(text: S) -> Self {
        Message::new(Role::System, text.into())
    }

    /// Create an empty user message
    pub fn user() -> Self {
        Message::new(Role::User, MessageContent::default())
    }

    /// Create an empty assistant message
    pub fn assistant() -> Self {
        Message::new(Role::Assistant, MessageContent::default())
    }

    /// Add a content part, switching to the parts form if needed
    pub fn with_part(mut self, part: ContentPart) -> Self {
        let mut parts = match self.content {
            MessageContent::Text(text) if text.is_empty() => Vec::new(),
            MessageContent::Text(text) => vec![ContentPart::text(text)],
            MessageContent::Parts(parts) => parts,
            MessageContent::Other(_) => Vec::new(),
        };
        parts.push(part);
        self.content = MessageContent::Parts(parts);
        self
    }

    /// Add text content to the message
    ///
    /// A message without images keeps the bare string form.
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        match &mut self.content {
            MessageContent::Text(existing) => {
                existing.push_str(&text.into());
                self
            }
            _ => self.with_part(ContentPart::text(text)),
        }
    }

    /// Add an image by url or data URI
    pub fn with_image<S: Into<String>>(self, url: S) -> Self {
        self.with_part(ContentPart::image(url))
    }

    pub fn text(&self) -> String {
        self.content.text()
    }

    pub fn images(&self) -> Vec<&str> {
        self.content.image_urls()
    }

    pub fn has_images(&self) -> bool {
        !self.images().is_empty()
    }

    /// Build the user message for one turn from the typed input and attached images.
    ///
    /// Returns None when there is nothing to send. With images attached the text part comes
    /// first, falling back to a default prompt, followed by the images in attach order.
    pub fn compose_user(input: &str, images: &[String]) -> Option<Message> {
        let input = input.trim();
        if input.is_empty() && images.is_empty() {
            return None;
        }
        if images.is_empty() {
            return Some(Message::user().with_text(input));
        }

        let prompt = match (input.is_empty(), images.len()) {
            (false, _) => input,
            (true, 1) => DEFAULT_IMAGE_PROMPT,
            (true, _) => DEFAULT_IMAGES_PROMPT,
        };
        let message = images
            .iter()
            .fold(Message::user().with_part(ContentPart::text(prompt)), |message, image| {
                message.with_image(image.clone())
            });
        Some(message)
    }
}

/// Body of a relay request: the full conversation, system message included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}
