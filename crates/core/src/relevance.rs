//! Per-window relevance extraction through a chat-completions endpoint, and
//! the document-level combiner that joins window excerpts back in order.

use crate::error::PipelineError;
use crate::traits::RelevanceModel;
use crate::window::window_tokens;
use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const NO_INFORMATION_SENTINEL: &str = "No information provided";

#[derive(Debug, Clone)]
pub struct RelevanceModelConfig {
    pub base_url: String,
    pub api_key: String,
    /// Model id sent to the completions endpoint.
    pub model: String,
    /// Sentence cap the model is instructed to honor per window.
    pub max_sentences: usize,
}

/// OpenAI-compatible chat client. Temperature is pinned to zero so repeated
/// calls over identical input stay stable.
pub struct OpenAiRelevanceModel {
    client: Client,
    config: RelevanceModelConfig,
}

impl OpenAiRelevanceModel {
    pub fn new(config: RelevanceModelConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a helpful assistant that finds relevant content in text based on a query. \
             You only return the relevant sentences, and you return a maximum of {} sentences",
            self.config.max_sentences
        )
    }
}

#[async_trait]
impl RelevanceModel for OpenAiRelevanceModel {
    async fn extract(&self, window: &str, query: &str) -> Result<String, PipelineError> {
        let user_prompt = format!(
            "Based on this question: **\"{query}\"**, get the relevant parts from the \
             following text:*****\n\n{window}*****. If you cannot answer the question \
             based on the text, respond with '{NO_INFORMATION_SENTINEL}'"
        );

        let request = ChatCompletionsRequest {
            model: self.config.model.clone(),
            messages: vec![
                Message {
                    role: "system",
                    content: self.system_prompt(),
                },
                Message {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: 0.0,
            max_tokens: 1_000,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|error| PipelineError::Model(error.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::Model(format!(
                "chat completions returned {}",
                response.status()
            )));
        }

        let parsed: ChatCompletionsResponse = response
            .json()
            .await
            .map_err(|error| PipelineError::Model(error.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

/// Windows a document's text, extracts each window concurrently, and joins
/// the excerpts in window order. A failed window degrades into an inline
/// error marker rather than failing the document.
pub async fn extract_document<M>(
    model: &M,
    text: &str,
    query: &str,
    max_window_tokens: usize,
) -> String
where
    M: RelevanceModel + ?Sized,
{
    let windows = window_tokens(text, max_window_tokens);

    let excerpts = join_all(windows.iter().map(|window| async move {
        match model.extract(window, query).await {
            Ok(excerpt) => excerpt,
            Err(error) => {
                tracing::warn!(%error, "relevance extraction failed for one window");
                format!("Error processing text with relevance model: {error}")
            }
        }
    }))
    .await;

    excerpts.join("\n")
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
    max_tokens: u64,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echoes the first token of each window, failing on windows that
    /// contain a poison marker.
    struct EchoModel;

    #[async_trait]
    impl RelevanceModel for EchoModel {
        async fn extract(&self, window: &str, _query: &str) -> Result<String, PipelineError> {
            if window.contains("poison") {
                return Err(PipelineError::Model("window rejected".to_string()));
            }
            Ok(window
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string())
        }
    }

    #[tokio::test]
    async fn excerpts_are_joined_in_window_order() {
        let text = "first a b second c d third e f";

        let combined = extract_document(&EchoModel, text, "anything", 3).await;
        assert_eq!(combined, "first\nsecond\nthird");
    }

    #[tokio::test]
    async fn failed_window_degrades_without_failing_the_document() {
        let text = "first a b poison c d third e f";

        let combined = extract_document(&EchoModel, text, "anything", 3).await;
        let lines: Vec<&str> = combined.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "first");
        assert!(lines[1].contains("window rejected"));
        assert_eq!(lines[2], "third");
    }

    #[tokio::test]
    async fn empty_text_produces_empty_excerpt() {
        let combined = extract_document(&EchoModel, "   ", "anything", 3).await;
        assert!(combined.is_empty());
    }
}
