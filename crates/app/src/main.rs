use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use drive_relevance_core::{
    GraphStore, HitStage, OboExchange, OpenAiRelevanceModel, PipelineError, PipelineOptions,
    RelevanceModelConfig, RelevancePipeline, ResolvedCredential, SearchOutcome, ServiceAccount,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "drive-relevance-server", version)]
struct Cli {
    /// Listen address for the HTTP server.
    #[arg(long, default_value = "127.0.0.1:7071")]
    listen_addr: String,

    /// Drive API base URL.
    #[arg(long, default_value = "https://graph.microsoft.com/v1.0")]
    drive_url: String,

    /// OAuth2 authority base URL.
    #[arg(long, default_value = "https://login.microsoftonline.com")]
    login_url: String,

    /// Directory tenant for token exchange.
    #[arg(long, env = "TENANT_ID")]
    tenant_id: String,

    /// Application client id.
    #[arg(long, env = "CLIENT_ID")]
    client_id: String,

    /// Application client secret for the on-behalf-of exchange.
    #[arg(long, env = "CLIENT_SECRET")]
    client_secret: String,

    /// Service account used when requests carry no bearer token.
    #[arg(long, env = "SERVICE_USERNAME")]
    service_username: Option<String>,

    #[arg(long, env = "SERVICE_PASSWORD")]
    service_password: Option<String>,

    /// Chat completions base URL.
    #[arg(long, default_value = "https://api.openai.com")]
    model_url: String,

    #[arg(long, env = "OPENAI_API_KEY")]
    model_api_key: String,

    /// Model id used for relevance extraction.
    #[arg(long, default_value = "gpt-4o-mini")]
    model: String,

    /// Word cap per relevance window.
    #[arg(long, default_value = "7500")]
    max_window_tokens: usize,

    /// Sentence cap per window excerpt.
    #[arg(long, default_value = "10")]
    max_excerpt_sentences: usize,

    /// Number of search hits processed per request.
    #[arg(long, default_value = "10")]
    page_size: usize,
}

type AppPipeline = RelevancePipeline<
    ResolvedCredential<OboExchange, ServiceAccount>,
    GraphStore,
    OpenAiRelevanceModel,
>;

struct AppState {
    pipeline: AppPipeline,
}

type SharedState = Arc<AppState>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SearchParams {
    search_term: Option<String>,
    query: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let token_url = format!(
        "{}/{}/oauth2/v2.0/token",
        cli.login_url.trim_end_matches('/'),
        cli.tenant_id
    );

    let obo = OboExchange::new(&token_url, &cli.client_id, &cli.client_secret);
    let service = match (&cli.service_username, &cli.service_password) {
        (Some(username), Some(password)) => Some(ServiceAccount::new(
            &token_url,
            &cli.client_id,
            username,
            password,
        )),
        _ => None,
    };

    let model = OpenAiRelevanceModel::new(RelevanceModelConfig {
        base_url: cli.model_url.clone(),
        api_key: cli.model_api_key.clone(),
        model: cli.model.clone(),
        max_sentences: cli.max_excerpt_sentences,
    });

    let pipeline = RelevancePipeline::new(
        ResolvedCredential::new(obo, service),
        GraphStore::new(&cli.drive_url),
        model,
        PipelineOptions {
            max_window_tokens: cli.max_window_tokens,
            max_excerpt_sentences: cli.max_excerpt_sentences,
            page_size: cli.page_size,
        },
    );

    let state: SharedState = Arc::new(AppState { pipeline });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/search/relevance", get(relevance_get).post(relevance_post))
        .route("/search/content", get(content_get).post(content_post))
        .route("/search/documents", get(documents_get).post(documents_post))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cli.listen_addr).await?;
    info!(listen_addr = %cli.listen_addr, "drive-relevance-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn relevance_get(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    relevance(state, headers, params).await
}

async fn relevance_post(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(params): Json<SearchParams>,
) -> impl IntoResponse {
    relevance(state, headers, params).await
}

async fn content_get(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    content(state, headers, params).await
}

async fn content_post(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(params): Json<SearchParams>,
) -> impl IntoResponse {
    content(state, headers, params).await
}

async fn documents_get(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    documents(state, headers, params).await
}

async fn documents_post(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(params): Json<SearchParams>,
) -> impl IntoResponse {
    documents(state, headers, params).await
}

async fn relevance(
    state: SharedState,
    headers: HeaderMap,
    params: SearchParams,
) -> (StatusCode, Json<Value>) {
    let Some(search_term) = params.search_term else {
        return bad_request("searchTerm is required");
    };
    let Some(query) = params.query else {
        return bad_request("query is required");
    };

    let bearer = bearer_from_headers(&headers);
    let outcome = state
        .pipeline
        .run(&search_term, bearer.as_deref(), HitStage::Relevance { query })
        .await;
    respond(outcome)
}

async fn content(
    state: SharedState,
    headers: HeaderMap,
    params: SearchParams,
) -> (StatusCode, Json<Value>) {
    let Some(search_term) = params.search_term else {
        return bad_request("searchTerm is required");
    };

    let bearer = bearer_from_headers(&headers);
    let outcome = state
        .pipeline
        .run(&search_term, bearer.as_deref(), HitStage::RawContent)
        .await;
    respond(outcome)
}

async fn documents(
    state: SharedState,
    headers: HeaderMap,
    params: SearchParams,
) -> (StatusCode, Json<Value>) {
    let Some(search_term) = params.search_term else {
        return bad_request("searchTerm is required");
    };

    let bearer = bearer_from_headers(&headers);
    let outcome = state
        .pipeline
        .run(&search_term, bearer.as_deref(), HitStage::MetadataOnly)
        .await;
    respond(outcome)
}

fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Request-level failures produce a single error body; per-hit failures are
/// already folded into individual records and never change the status code.
fn respond(outcome: Result<SearchOutcome, PipelineError>) -> (StatusCode, Json<Value>) {
    match outcome {
        Ok(SearchOutcome::NoResults) => (
            StatusCode::OK,
            Json(json!({ "message": "No results found", "list": [] })),
        ),
        Ok(SearchOutcome::Records(records)) => (StatusCode::OK, Json(json!({ "list": records }))),
        Ok(SearchOutcome::Metadata(entries)) => (StatusCode::OK, Json(json!({ "list": entries }))),
        Err(error) => {
            error!(%error, "search request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error.to_string() })),
            )
        }
    }
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}
