//! Credential acquisition against an OAuth2 token endpoint. Two concrete
//! strategies mirror the provider's supported flows: on-behalf-of exchange
//! of a caller's bearer token, and a service-account password grant.

use crate::error::PipelineError;
use crate::traits::CredentialProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

const OBO_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

async fn token_error(response: reqwest::Response) -> PipelineError {
    let status = response.status();
    let body: TokenErrorBody = response.json().await.unwrap_or_default();
    let details = body
        .error_description
        .or(body.error)
        .unwrap_or_else(|| status.to_string());
    PipelineError::Auth(details)
}

/// Exchanges the caller's bearer token for a delegated drive token.
pub struct OboExchange {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl OboExchange {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for OboExchange {
    async fn bearer_token(&self, incoming: Option<&str>) -> Result<String, PipelineError> {
        let assertion = incoming.ok_or_else(|| {
            PipelineError::Auth("on-behalf-of exchange requires a caller bearer token".to_string())
        })?;

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", OBO_GRANT_TYPE),
            ("assertion", assertion),
            ("requested_token_use", "on_behalf_of"),
            ("scope", GRAPH_SCOPE),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(token_error(response).await);
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

/// Password-grant flow for a dedicated service account. Used when requests
/// arrive without a caller token.
pub struct ServiceAccount {
    client: Client,
    token_url: String,
    client_id: String,
    username: String,
    password: String,
}

impl ServiceAccount {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for ServiceAccount {
    async fn bearer_token(&self, _incoming: Option<&str>) -> Result<String, PipelineError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("scope", GRAPH_SCOPE),
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
            ("grant_type", "password"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(token_error(response).await);
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

/// Policy wrapper: delegated exchange when the caller sent a bearer token,
/// service account otherwise. A missing fallback is an authorization error,
/// not a silent anonymous call.
pub struct ResolvedCredential<O, S>
where
    O: CredentialProvider,
    S: CredentialProvider,
{
    obo: O,
    service: Option<S>,
}

impl<O, S> ResolvedCredential<O, S>
where
    O: CredentialProvider,
    S: CredentialProvider,
{
    pub fn new(obo: O, service: Option<S>) -> Self {
        Self { obo, service }
    }
}

#[async_trait]
impl<O, S> CredentialProvider for ResolvedCredential<O, S>
where
    O: CredentialProvider,
    S: CredentialProvider,
{
    async fn bearer_token(&self, incoming: Option<&str>) -> Result<String, PipelineError> {
        match (incoming, &self.service) {
            (Some(bearer), _) => self.obo.bearer_token(Some(bearer)).await,
            (None, Some(service)) => service.bearer_token(None).await,
            (None, None) => Err(PipelineError::Auth(
                "no caller bearer token and no service account configured".to_string(),
            )),
        }
    }
}

/// Fixed token, for tests and local development against a stub drive.
pub struct StaticToken(pub String);

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn bearer_token(&self, _incoming: Option<&str>) -> Result<String, PipelineError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tagged(&'static str);

    #[async_trait]
    impl CredentialProvider for Tagged {
        async fn bearer_token(&self, _incoming: Option<&str>) -> Result<String, PipelineError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn resolved_credential_prefers_exchange_when_bearer_present() {
        let provider = ResolvedCredential::new(Tagged("obo"), Some(Tagged("service")));

        let token = provider
            .bearer_token(Some("caller-token"))
            .await
            .expect("exchange should succeed");
        assert_eq!(token, "obo");
    }

    #[tokio::test]
    async fn resolved_credential_falls_back_to_service_account() {
        let provider = ResolvedCredential::new(Tagged("obo"), Some(Tagged("service")));

        let token = provider
            .bearer_token(None)
            .await
            .expect("fallback should succeed");
        assert_eq!(token, "service");
    }

    #[tokio::test]
    async fn missing_fallback_is_an_authorization_error() {
        let provider: ResolvedCredential<Tagged, Tagged> =
            ResolvedCredential::new(Tagged("obo"), None);

        let error = provider.bearer_token(None).await.unwrap_err();
        assert!(matches!(error, PipelineError::Auth(_)));
    }
}
