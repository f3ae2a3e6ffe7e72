use crate::error::{FetchError, PipelineError};
use crate::models::{ItemMetadata, SearchHit, SearchPage};
use crate::traits::{DocumentStore, SearchProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::{json, Value};

const DRIVE_ITEM_TYPE: &str = "#microsoft.graph.driveItem";

/// Client for a Microsoft Graph style drive API: `/search/query` for ranked
/// hits, `/drives/{drive}/items/{item}` for metadata and content, with an
/// optional `?format=pdf` rendition on the content route.
pub struct GraphStore {
    client: Client,
    base_url: String,
}

impl GraphStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn item_url(&self, drive_id: &str, item_id: &str) -> String {
        format!("{}/drives/{}/items/{}", self.base_url, drive_id, item_id)
    }

    fn content_url(&self, drive_id: &str, item_id: &str, pdf_rendition: bool) -> String {
        let mut url = format!("{}/content", self.item_url(drive_id, item_id));
        if pdf_rendition {
            url.push_str("?format=pdf");
        }
        url
    }
}

#[async_trait]
impl SearchProvider for GraphStore {
    async fn search(
        &self,
        search_term: &str,
        bearer: &str,
        page_size: usize,
    ) -> Result<SearchPage, PipelineError> {
        let body = json!({
            "requests": [
                {
                    "entityTypes": ["driveItem"],
                    "query": { "queryString": search_term },
                    "from": 0,
                    "size": page_size,
                }
            ]
        });

        let response = self
            .client
            .post(format!("{}/search/query", self.base_url))
            .bearer_auth(bearer)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::BackendResponse {
                backend: "drive-search".to_string(),
                details: response.status().to_string(),
            });
        }

        let response_json: Value = response.json().await?;
        Ok(parse_search_page(&response_json))
    }
}

#[async_trait]
impl DocumentStore for GraphStore {
    async fn fetch_text(
        &self,
        bearer: &str,
        drive_id: &str,
        item_id: &str,
    ) -> Result<String, FetchError> {
        let response = self
            .client
            .get(self.content_url(drive_id, item_id, false))
            .bearer_auth(bearer)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        Ok(response.text().await?)
    }

    async fn fetch_bytes(
        &self,
        bearer: &str,
        drive_id: &str,
        item_id: &str,
        pdf_rendition: bool,
    ) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(self.content_url(drive_id, item_id, pdf_rendition))
            .bearer_auth(bearer)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch_metadata(
        &self,
        bearer: &str,
        drive_id: &str,
        item_id: &str,
    ) -> Result<ItemMetadata, FetchError> {
        let response = self
            .client
            .get(self.item_url(drive_id, item_id))
            .bearer_auth(bearer)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let item: Value = response.json().await?;
        Ok(parse_item_metadata(&item))
    }
}

/// Extracts the hit list from a `/search/query` response. Only driveItem
/// resources are kept; other entity kinds are filtered out here so the
/// orchestrator never sees them. Total comes from the first hits container.
pub fn parse_search_page(response: &Value) -> SearchPage {
    let containers = response
        .pointer("/value/0/hitsContainers")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let total = containers
        .first()
        .and_then(|container| container.pointer("/total"))
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let mut hits = Vec::new();
    for container in &containers {
        let raw_hits = container
            .pointer("/hits")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for raw in raw_hits {
            let resource = match raw.pointer("/resource") {
                Some(resource) => resource,
                None => continue,
            };

            let resource_type = resource.pointer("/@odata.type").and_then(Value::as_str);
            if resource_type != Some(DRIVE_ITEM_TYPE) {
                continue;
            }

            let name = resource
                .pointer("/name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let item_id = resource
                .pointer("/id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let drive_id = resource
                .pointer("/parentReference/driveId")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let web_url = resource
                .pointer("/webUrl")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .replace(char::is_whitespace, "%20");
            let rank = raw.pointer("/rank").and_then(Value::as_i64).unwrap_or(0);

            hits.push(SearchHit {
                item_id,
                drive_id,
                name,
                web_url,
                rank,
            });
        }
    }

    SearchPage { total, hits }
}

pub fn parse_item_metadata(item: &Value) -> ItemMetadata {
    let last_modified = item
        .pointer("/lastModifiedDateTime")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|parsed| parsed.with_timezone(&Utc));

    ItemMetadata {
        title: item
            .pointer("/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        url: item
            .pointer("/webUrl")
            .and_then(Value::as_str)
            .map(str::to_string),
        last_modified,
        modified_by: item
            .pointer("/lastModifiedBy/user/displayName")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string(),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_page_keeps_only_drive_items_and_escapes_urls() {
        let response = json!({
            "value": [{
                "hitsContainers": [{
                    "total": 2,
                    "hits": [
                        {
                            "rank": 1,
                            "resource": {
                                "@odata.type": "#microsoft.graph.driveItem",
                                "id": "item-1",
                                "name": "quarterly report.docx",
                                "webUrl": "https://example.com/quarterly report.docx",
                                "parentReference": { "driveId": "drive-1" }
                            }
                        },
                        {
                            "rank": 2,
                            "resource": {
                                "@odata.type": "#microsoft.graph.listItem",
                                "id": "item-2",
                                "name": "list entry"
                            }
                        }
                    ]
                }]
            }]
        });

        let page = parse_search_page(&response);
        assert_eq!(page.total, 2);
        assert_eq!(page.hits.len(), 1);
        assert_eq!(page.hits[0].item_id, "item-1");
        assert_eq!(page.hits[0].drive_id, "drive-1");
        assert_eq!(
            page.hits[0].web_url,
            "https://example.com/quarterly%20report.docx"
        );
        assert_eq!(page.hits[0].rank, 1);
    }

    #[test]
    fn search_page_reports_zero_total_for_empty_response() {
        let page = parse_search_page(&json!({
            "value": [{ "hitsContainers": [{ "total": 0, "hits": [] }] }]
        }));
        assert_eq!(page.total, 0);
        assert!(page.hits.is_empty());
    }

    #[test]
    fn item_metadata_defaults_modified_by_to_unknown() {
        let item = json!({
            "name": "spec.docx",
            "webUrl": "https://example.com/spec.docx",
            "lastModifiedDateTime": "2024-03-01T12:30:00Z"
        });

        let metadata = parse_item_metadata(&item);
        assert_eq!(metadata.title, "spec.docx");
        assert_eq!(metadata.modified_by, "Unknown");
        assert!(metadata.last_modified.is_some());
    }

    #[test]
    fn item_metadata_reads_display_name_when_present() {
        let item = json!({
            "name": "spec.docx",
            "lastModifiedBy": { "user": { "displayName": "Dana" } }
        });

        let metadata = parse_item_metadata(&item);
        assert_eq!(metadata.modified_by, "Dana");
        assert!(metadata.url.is_none());
        assert!(metadata.last_modified.is_none());
    }
}
