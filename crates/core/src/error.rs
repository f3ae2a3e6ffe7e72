use thiserror::Error;

/// Request-level failures. Any of these aborts the whole search request;
/// nothing below the hit level ever surfaces as one of these.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("search request failed: {0}")]
    Search(String),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("relevance model error: {0}")]
    Model(String),
}

/// Per-hit failures. These stay local to the hit that raised them and are
/// folded into its result record instead of failing the batch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("content request returned {0}")]
    Status(reqwest::StatusCode),

    #[error("response is not valid utf-8: {0}")]
    Decode(String),

    #[error("pdf text extraction failed: {0}")]
    PdfExtract(String),

    #[error("failed to fetch content for {name}: {details}")]
    Item { name: String, details: String },
}

impl FetchError {
    /// Attaches the originating item name, so the orchestrator always sees
    /// which document a failure belongs to.
    pub fn for_item(name: &str, error: FetchError) -> FetchError {
        match error {
            already @ FetchError::Item { .. } => already,
            other => FetchError::Item {
                name: name.to_string(),
                details: other.to_string(),
            },
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
