use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("response does not match {schema}: {detail}")]
    SchemaViolation {
        schema: &'static str,
        detail: String,
    },

    #[error("invalid image data URL: {0}")]
    InvalidImage(String),

    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<InferenceError>,
    },
}

impl InferenceError {
    /// Whether another attempt of the same call could succeed.
    ///
    /// Client errors other than 408 and 429 are answered the same way every
    /// time, as are bad images and configuration.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Server { status, .. } => {
                matches!(*status, 408 | 429) || !(400..500).contains(status)
            }
            Self::InvalidConfiguration(_)
            | Self::InvalidImage(_)
            | Self::RetriesExhausted { .. } => false,
            Self::Http(_) | Self::Json(_) | Self::EmptyResponse | Self::SchemaViolation { .. } => {
                true
            }
        }
    }
}
