use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One matched document reference from the search provider. Immutable once
/// parsed; `rank` is provider-assigned (lower is better) and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    pub item_id: String,
    pub drive_id: String,
    pub name: String,
    pub web_url: String,
    pub rank: i64,
}

/// The provider's answer to one search query.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub total: u64,
    pub hits: Vec<SearchHit>,
}

/// Item metadata as served by the metadata-only endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    pub title: String,
    pub url: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub modified_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
    Unsupported,
    Error,
}

/// One output entry of the content/relevance pipeline. Created once per hit,
/// never mutated after assembly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultRecord {
    pub name: String,
    #[serde(rename = "webUrl")]
    pub web_url: String,
    pub rank: i64,
    pub content: String,
    pub status: RecordStatus,
}

/// Outcome of the content fetcher: extracted text, or the recognized
/// terminal outcome for formats outside the allow-list. Not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedText {
    Text(String),
    Unsupported,
}

/// Explicit pipeline configuration. Nothing in the core reads ambient
/// process state; the hosting binary assembles this once at startup.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Whitespace-token cap per relevance window. Sized to roughly 3/4 of a
    /// 10k-token model budget to leave headroom for prompt overhead.
    pub max_window_tokens: usize,
    /// Sentence cap the relevance model is instructed to honor per window.
    pub max_excerpt_sentences: usize,
    /// Search pagination window, `[0, page_size)`.
    pub page_size: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_window_tokens: 7_500,
            max_excerpt_sentences: 10,
            page_size: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_record_serializes_wire_field_names() {
        let record = ResultRecord {
            name: "report.txt".to_string(),
            web_url: "https://example.com/report.txt".to_string(),
            rank: 2,
            content: "alpha".to_string(),
            status: RecordStatus::Unsupported,
        };

        let value = serde_json::to_value(&record).expect("record should serialize");
        assert_eq!(value["webUrl"], "https://example.com/report.txt");
        assert_eq!(value["status"], "unsupported");
        assert_eq!(value["rank"], 2);
    }

    #[test]
    fn metadata_serializes_camel_case_and_skips_absent_error() {
        let metadata = ItemMetadata {
            title: "spec.docx".to_string(),
            url: Some("https://example.com/spec.docx".to_string()),
            last_modified: None,
            modified_by: "Unknown".to_string(),
            error: None,
        };

        let value = serde_json::to_value(&metadata).expect("metadata should serialize");
        assert_eq!(value["modifiedBy"], "Unknown");
        assert!(value.get("error").is_none());
        assert!(value["lastModified"].is_null());
    }
}
