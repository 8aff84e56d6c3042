use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reference to an image, either a remote URL or a self-contained data URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageRef {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
/// A fragment of message content
///
/// Parts that are not exactly a plain text or image part, including ones carrying extra
/// fields such as `detail`, are kept verbatim in `Other` and serialize back unchanged.
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageRef },
    #[serde(untagged)]
    Other(Value),
}

impl ContentPart {
    pub fn text<S: Into<String>>(text: S) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image<S: Into<String>>(url: S) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageRef { url: url.into() },
        }
    }

    /// Get the text if this is a Text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Get the image url if this is an ImageUrl part
    pub fn as_image_url(&self) -> Option<&str> {
        match self {
            ContentPart::ImageUrl { image_url } => Some(&image_url.url),
            ContentPart::Other(value) if value["type"] == "image_url" => {
                value["image_url"]["url"].as_str()
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
/// Message content in either of its wire forms
///
/// Anything else, such as `null`, is carried through as `Other`.
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
    Other(Value),
}

impl MessageContent {
    /// Content as an ordered list of parts; a bare string becomes a single text part
    pub fn parts(&self) -> Vec<ContentPart> {
        match self {
            MessageContent::Text(text) => vec![ContentPart::text(text.clone())],
            MessageContent::Parts(parts) => parts.clone(),
            MessageContent::Other(_) => Vec::new(),
        }
    }

    /// All text parts concatenated in order
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts.iter().filter_map(ContentPart::as_text).collect(),
            MessageContent::Other(_) => String::new(),
        }
    }

    pub fn image_urls(&self) -> Vec<&str> {
        match self {
            MessageContent::Parts(parts) => {
                parts.iter().filter_map(ContentPart::as_image_url).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MessageContent::Text(text) => text.is_empty(),
            MessageContent::Parts(parts) => parts.is_empty(),
            MessageContent::Other(value) => value.is_null(),
        }
    }
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

// A bare string and a single text part carry the same meaning
impl PartialEq for MessageContent {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MessageContent::Text(a), MessageContent::Text(b)) => a == b,
            (MessageContent::Other(a), MessageContent::Other(b)) => a == b,
            (MessageContent::Other(_), _) | (_, MessageContent::Other(_)) => false,
            _ => self.parts() == other.parts(),
        }
    }
}

impl Eq for MessageContent {}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

impl From<Vec<ContentPart>> for MessageContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        MessageContent::Parts(parts)
    }
}
