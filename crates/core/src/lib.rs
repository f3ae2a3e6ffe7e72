pub mod auth;
pub mod error;
pub mod fetch;
pub mod format;
pub mod models;
pub mod pipeline;
pub mod relevance;
pub mod store;
pub mod traits;
pub mod window;

pub use auth::{OboExchange, ResolvedCredential, ServiceAccount, StaticToken, GRAPH_SCOPE};
pub use error::{FetchError, PipelineError};
pub use fetch::{extract_pdf_text, fetch_content};
pub use format::{classify, FileFormat};
pub use models::{
    FetchedText, ItemMetadata, PipelineOptions, RecordStatus, ResultRecord, SearchHit, SearchPage,
};
pub use pipeline::{
    HitStage, RelevancePipeline, SearchOutcome, METADATA_UNAVAILABLE, UNSUPPORTED_CONTENT,
};
pub use relevance::{
    extract_document, OpenAiRelevanceModel, RelevanceModelConfig, NO_INFORMATION_SENTINEL,
};
pub use store::GraphStore;
pub use traits::{CredentialProvider, DocumentStore, RelevanceModel, SearchProvider};
pub use window::window_tokens;
