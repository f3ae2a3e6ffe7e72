//! Fans search hits out through classification, fetch, windowing, and
//! relevance extraction. One orchestrator serves all endpoint variants; the
//! caller picks the post-fetch stage.

use crate::error::PipelineError;
use crate::fetch::fetch_content;
use crate::format::classify;
use crate::models::{
    FetchedText, ItemMetadata, PipelineOptions, RecordStatus, ResultRecord, SearchHit,
};
use crate::relevance::extract_document;
use crate::traits::{CredentialProvider, DocumentStore, RelevanceModel, SearchProvider};
use futures_util::future::join_all;
use tracing::{info, warn};

pub const UNSUPPORTED_CONTENT: &str = "Unsupported File Type";
pub const METADATA_UNAVAILABLE: &str = "Unable to retrieve metadata";

/// Which post-fetch stage a request wants. Selecting a stage here replaces
/// per-endpoint copies of the fan-out control flow.
#[derive(Debug, Clone)]
pub enum HitStage {
    /// Item metadata only; content is never fetched.
    MetadataOnly,
    /// Full extracted text per document.
    RawContent,
    /// Windowed relevance excerpts for a natural-language question.
    Relevance { query: String },
}

/// Terminal outcome of one search request.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// The provider reported zero hits; no per-hit work was attempted.
    NoResults,
    Records(Vec<ResultRecord>),
    Metadata(Vec<ItemMetadata>),
}

pub struct RelevancePipeline<C, S, M>
where
    C: CredentialProvider,
    S: SearchProvider + DocumentStore,
    M: RelevanceModel,
{
    credentials: C,
    store: S,
    model: M,
    options: PipelineOptions,
}

impl<C, S, M> RelevancePipeline<C, S, M>
where
    C: CredentialProvider,
    S: SearchProvider + DocumentStore,
    M: RelevanceModel,
{
    pub fn new(credentials: C, store: S, model: M, options: PipelineOptions) -> Self {
        Self {
            credentials,
            store,
            model,
            options,
        }
    }

    /// Runs one request end to end: credential, search, fan-out, rank sort.
    /// Authorization and search failures abort the request; everything below
    /// the hit level is absorbed into per-hit records.
    pub async fn run(
        &self,
        search_term: &str,
        incoming_bearer: Option<&str>,
        stage: HitStage,
    ) -> Result<SearchOutcome, PipelineError> {
        let bearer = self.credentials.bearer_token(incoming_bearer).await?;

        let page = self
            .store
            .search(search_term, &bearer, self.options.page_size)
            .await?;

        if page.total == 0 {
            info!(search_term, "search returned no hits");
            return Ok(SearchOutcome::NoResults);
        }

        info!(search_term, hits = page.hits.len(), "processing search hits");

        let outcome = match stage {
            HitStage::MetadataOnly => {
                SearchOutcome::Metadata(self.run_metadata(&page.hits, &bearer).await)
            }
            HitStage::RawContent => {
                SearchOutcome::Records(self.run_records(&page.hits, &bearer, None).await)
            }
            HitStage::Relevance { query } => {
                SearchOutcome::Records(self.run_records(&page.hits, &bearer, Some(&query)).await)
            }
        };

        Ok(outcome)
    }

    /// All-settled fan-out over the hits; each branch owns its record and a
    /// failure in one never aborts the others. Output is sorted ascending by
    /// provider rank, never by completion order.
    async fn run_records(
        &self,
        hits: &[SearchHit],
        bearer: &str,
        query: Option<&str>,
    ) -> Vec<ResultRecord> {
        let mut records = join_all(
            hits.iter()
                .map(|hit| self.process_hit(hit, bearer, query)),
        )
        .await;

        records.sort_by_key(|record| record.rank);
        records
    }

    async fn process_hit(
        &self,
        hit: &SearchHit,
        bearer: &str,
        query: Option<&str>,
    ) -> ResultRecord {
        let format = classify(&hit.name);

        let fetched = match fetch_content(&self.store, bearer, hit, format).await {
            Ok(fetched) => fetched,
            Err(error) => {
                warn!(name = %hit.name, %error, "hit failed during content fetch");
                return self.record(hit, format!("Error: {error}"), RecordStatus::Error);
            }
        };

        match fetched {
            FetchedText::Unsupported => {
                self.record(hit, UNSUPPORTED_CONTENT.to_string(), RecordStatus::Unsupported)
            }
            FetchedText::Text(text) => {
                let content = match query {
                    Some(query) => {
                        extract_document(&self.model, &text, query, self.options.max_window_tokens)
                            .await
                    }
                    None => text,
                };
                self.record(hit, content, RecordStatus::Success)
            }
        }
    }

    async fn run_metadata(&self, hits: &[SearchHit], bearer: &str) -> Vec<ItemMetadata> {
        let mut entries = join_all(hits.iter().map(|hit| async move {
            let metadata = match self
                .store
                .fetch_metadata(bearer, &hit.drive_id, &hit.item_id)
                .await
            {
                Ok(metadata) => metadata,
                Err(error) => {
                    warn!(name = %hit.name, %error, "hit failed during metadata fetch");
                    ItemMetadata {
                        title: hit.name.clone(),
                        url: None,
                        last_modified: None,
                        modified_by: "Unknown".to_string(),
                        error: Some(METADATA_UNAVAILABLE.to_string()),
                    }
                }
            };
            (hit.rank, metadata)
        }))
        .await;

        entries.sort_by_key(|(rank, _)| *rank);
        entries.into_iter().map(|(_, metadata)| metadata).collect()
    }

    fn record(&self, hit: &SearchHit, content: String, status: RecordStatus) -> ResultRecord {
        ResultRecord {
            name: hit.name.clone(),
            web_url: hit.web_url.clone(),
            rank: hit.rank,
            content,
            status,
        }
    }
}
