use serde::Deserialize;

pub const FALLBACK_MESSAGE: &str = "An error occurred";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The backend answered with a non-success status.
    #[error("{message}")]
    Request { status: u16, message: String },
    /// No usable response: transport failure, timeout or malformed body.
    #[error("network error: {0}")]
    Network(String),
    /// Rejected on the client before any request was issued.
    #[error("{0}")]
    Validation(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network(err.to_string())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for an inline form error or a toast.
    pub fn user_message(&self) -> String {
        match self {
            Self::Request { message, .. } | Self::Validation(message) => message.clone(),
            Self::Network(_) => "Unable to reach the server".to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::network(err)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<serde_json::Value>,
}

/// Extracts the human-readable message from an error body: `detail`, then
/// `message`, then [`FALLBACK_MESSAGE`].
pub fn extract_error_message(body: &[u8]) -> String {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    parsed
        .detail
        .as_ref()
        .and_then(message_text)
        .or_else(|| parsed.message.as_ref().and_then(message_text))
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

fn message_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        // FastAPI validation failures carry a list of {loc, msg, type}.
        serde_json::Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(|msg| msg.as_str()))
            .map(str::to_string),
        _ => None,
    }
}
