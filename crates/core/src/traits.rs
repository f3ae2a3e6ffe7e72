use crate::error::{FetchError, PipelineError};
use crate::models::{ItemMetadata, SearchPage};
use async_trait::async_trait;

/// Supplies a bearer credential usable against the search and document
/// retrieval capabilities. The acquisition strategy (pass-through, delegated
/// exchange, service credential) is a swappable policy; by the time a token
/// reaches the pipeline it is treated as already validated.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn bearer_token(&self, incoming: Option<&str>) -> Result<String, PipelineError>;
}

/// The search capability: one ranked hit list per query string.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        search_term: &str,
        bearer: &str,
        page_size: usize,
    ) -> Result<SearchPage, PipelineError>;
}

/// The document retrieval capability: raw text, byte payloads (optionally as
/// a PDF rendition), and item metadata.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn fetch_text(
        &self,
        bearer: &str,
        drive_id: &str,
        item_id: &str,
    ) -> Result<String, FetchError>;

    async fn fetch_bytes(
        &self,
        bearer: &str,
        drive_id: &str,
        item_id: &str,
        pdf_rendition: bool,
    ) -> Result<Vec<u8>, FetchError>;

    async fn fetch_metadata(
        &self,
        bearer: &str,
        drive_id: &str,
        item_id: &str,
    ) -> Result<ItemMetadata, FetchError>;
}

/// The relevance-extraction capability: given one text window and a
/// natural-language query, returns the relevant sentences or a fixed
/// "no information" sentinel.
#[async_trait]
pub trait RelevanceModel: Send + Sync {
    async fn extract(&self, window: &str, query: &str) -> Result<String, PipelineError>;
}
