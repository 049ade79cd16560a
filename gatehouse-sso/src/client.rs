//! HTTP client for the Authentication Service, behind a trait so handlers
//! and the proxy middleware are testable without a live service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::warn;

use gatehouse_core::api_types::{LoginRequest, LoginResponse, VerifyResponse};

/// What a call to the Authentication Service can come back with.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The service answered 401: bad credentials, or a missing, expired, or
    /// revoked token.
    #[error("not authenticated")]
    Unauthenticated,

    /// The service is unreachable, timed out, or answered outside its
    /// contract. Callers on the request path treat this as "not logged in"
    /// rather than hanging or failing the page.
    #[error("authentication service unavailable: {0}")]
    Unavailable(String),
}

/// The gateway's view of the Authentication Service.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for an access/refresh pair.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, GatewayError>;

    /// Resolve an access token to its identity.
    async fn verify(&self, access_token: &str) -> Result<VerifyResponse, GatewayError>;

    /// Revoke the given access token. Fails with
    /// [`GatewayError::Unauthenticated`] when the token is already dead,
    /// which logout callers ignore.
    async fn revoke(&self, access_token: &str) -> Result<(), GatewayError>;
}

/// `reqwest`-backed [`AuthApi`]. The client-wide timeout keeps a slow or
/// dead Authentication Service from stalling the login page or the proxy.
#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    client: Client,
    base_url: String,
}

impl HttpAuthClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        warn!("authentication service call timed out");
    }
    GatewayError::Unavailable(err.to_string())
}

#[async_trait]
impl AuthApi for HttpAuthClient {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, GatewayError> {
        let response = self
            .client
            .post(self.url("/login"))
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => response.json().await.map_err(|err| {
                GatewayError::Unavailable(format!("malformed login response: {err}"))
            }),
            StatusCode::UNAUTHORIZED => Err(GatewayError::Unauthenticated),
            status => Err(GatewayError::Unavailable(format!(
                "login answered {status}"
            ))),
        }
    }

    async fn verify(&self, access_token: &str) -> Result<VerifyResponse, GatewayError> {
        let response = self
            .client
            .get(self.url("/verify"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => response.json().await.map_err(|err| {
                GatewayError::Unavailable(format!("malformed verify response: {err}"))
            }),
            StatusCode::UNAUTHORIZED => Err(GatewayError::Unauthenticated),
            status => Err(GatewayError::Unavailable(format!(
                "verify answered {status}"
            ))),
        }
    }

    async fn revoke(&self, access_token: &str) -> Result<(), GatewayError> {
        // An empty body revokes the token the request authenticates with.
        let response = self
            .client
            .post(self.url("/tokens/revoke"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(GatewayError::Unauthenticated),
            status => Err(GatewayError::Unavailable(format!(
                "revoke answered {status}"
            ))),
        }
    }
}
