use reqwest::StatusCode;
use thiserror::Error;

/// Why a completion did not yield a JSON payload.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LLM returned HTTP {status}")]
    Http { status: StatusCode, body: String },

    #[error("failed to decode completion envelope: {source}")]
    Envelope {
        #[source]
        source: serde_json::Error,
        raw_response: String,
    },

    #[error("completion has no message content")]
    MissingContent,

    #[error("LLM output is not valid JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        raw_output: String,
    },
}

impl LlmError {
    /// Raw upstream text attached to the error, if any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            LlmError::Http { body, .. } => Some(body),
            LlmError::Envelope { raw_response, .. } => Some(raw_response),
            LlmError::Parse { raw_output, .. } => Some(raw_output),
            LlmError::Transport(_) | LlmError::MissingContent => None,
        }
    }
}
