use thiserror::Error;

/// Failures raised while talking to an upstream model provider
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::RequestFailed(err.to_string())
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("A turn is already in progress")]
    Busy,

    #[error("No turn is in progress")]
    NoTurn,
}

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to read image file: {0}")]
    Io(#[from] std::io::Error),
}
