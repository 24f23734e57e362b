use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FirstStreetError>;

#[derive(Debug, Error)]
pub enum FirstStreetError {
    /// Connection failure, timeout or non-2xx status.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },

    #[error("Malformed response: {message}")]
    MalformedResponse {
        message: String,
        payload: Option<Value>,
    },

    #[error("API returned an error: {errors}")]
    Api { errors: Value },

    #[error("Property {fsid} not found")]
    NotFound { fsid: u64 },

    #[error("Missing field: {path}")]
    Extraction { path: String },
}

impl FirstStreetError {
    pub fn malformed(message: impl Into<String>, payload: Option<Value>) -> Self {
        FirstStreetError::MalformedResponse {
            message: message.into(),
            payload,
        }
    }

    pub fn extraction(path: impl Into<String>) -> Self {
        FirstStreetError::Extraction { path: path.into() }
    }

    /// Only transport failures can succeed on a later attempt without a
    /// provider-side change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FirstStreetError::Transport { .. })
    }

    /// Raw provider payload attached to the error, if any.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            FirstStreetError::Api { errors } => Some(errors),
            FirstStreetError::MalformedResponse { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FirstStreetError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else {
            err.to_string()
        };
        FirstStreetError::Transport {
            message,
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

impl From<serde_json::Error> for FirstStreetError {
    fn from(err: serde_json::Error) -> Self {
        FirstStreetError::malformed(format!("invalid JSON: {err}"), None)
    }
}
