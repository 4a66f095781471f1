use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode completion response: {0}")]
    Decode(String),

    #[error("Completion response contained no choices")]
    NoChoices,
}
