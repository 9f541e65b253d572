use thiserror::Error;

/// Shown when a request fails without a usable error message
pub const CONNECT_FAILURE_MESSAGE: &str = "Failed to connect to the backend.";

/// Why a round trip to the service produced no usable body.
///
/// `Display` is exactly the text surfaced to the user as the session's
/// error banner.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    /// Non-2xx response; `message` comes from the body's `detail` or is
    /// synthesized from the status code
    #[error("{message}")]
    Http { status: u16, message: String },

    /// No response was obtained at all
    #[error("{}", or_fallback(.0))]
    Network(String),

    /// A 2xx response whose body was not the expected JSON
    #[error("{}", or_fallback(.0))]
    Decode(String),
}

fn or_fallback(message: &str) -> &str {
    if message.trim().is_empty() {
        CONNECT_FAILURE_MESSAGE
    } else {
        message
    }
}

impl RequestError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RequestError::Decode(err.to_string())
        } else {
            RequestError::Network(err.to_string())
        }
    }
}

/// A submit action that was refused before anything changed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// Input was empty or whitespace only
    #[error("nothing to send")]
    EmptyInput,

    /// The session already has a request in flight
    #[error("a request is already in flight for this session")]
    Busy,
}
