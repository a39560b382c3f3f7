use thiserror::Error;

/// Errors returned by every client tier.
///
/// Nothing in this crate recovers from an error locally: transport failures are
/// not retried, and lookups that find nothing report [`Error::NotFound`] rather
/// than an empty value.
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be sent or the connection failed.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The service answered with a non-success status other than 404.
    #[error("HTTP {status} for url ({url}): {body}")]
    HttpStatus { status: u16, url: String, body: String },

    /// No resource matches the identifier or name.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// A model run reports a result type this crate cannot decode.
    #[error("model run {modelrun} has unsupported result type {result_type:?}")]
    UnsupportedResultType {
        modelrun: String,
        result_type: Option<String>,
    },

    /// The response body did not match the expected JSON shape.
    #[error("failed to parse API JSON (url={url}): {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn not_found(resource: impl Into<String>) -> Self {
        Error::NotFound {
            resource: resource.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

// FastAPI-style error document: {"detail": "..."} or {"detail": [{...}]}.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ServiceErrorResponse {
    #[serde(default)]
    pub(crate) detail: Option<serde_json::Value>,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

/// Picks the human-readable part out of an error body, falling back to the raw text.
pub(crate) fn error_body_message(text: &str) -> String {
    let Ok(err) = serde_json::from_str::<ServiceErrorResponse>(text) else {
        return text.trim().to_string();
    };

    match (err.detail, err.message) {
        (Some(serde_json::Value::String(detail)), _) => detail,
        (Some(detail), _) => detail.to_string(),
        (None, Some(message)) => message,
        (None, None) => text.trim().to_string(),
    }
}
