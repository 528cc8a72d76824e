//! Outbound calls to the wallet API.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Plan, Transaction, UserProfile},
    error::ApiErrorBody,
    protocol::{
        LoginRequest, LoginResponse, MessageResponse, PlanTransferRequest, PurchaseRequest,
        RegisterRequest, TransferRequest,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::{error::RequestError, session::BearerToken};

pub const LOGIN: &str = "/api/login";
pub const REGISTER: &str = "/api/register";
pub const USER: &str = "/api/user";
pub const TRANSACTIONS: &str = "/api/transactions";
pub const PLANS: &str = "/api/plans";
pub const TRANSFER: &str = "/api/transfer";
pub const PURCHASE: &str = "/api/wallet/purchase";
pub const TRANSFER_PLAN: &str = "/api/wallet/transferPlan";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[async_trait]
pub trait WalletGateway: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, RequestError>;
    async fn register(&self, request: &RegisterRequest) -> Result<(), RequestError>;
    async fn fetch_user(&self, token: &BearerToken) -> Result<UserProfile, RequestError>;
    async fn fetch_transactions(
        &self,
        token: &BearerToken,
    ) -> Result<Vec<Transaction>, RequestError>;
    async fn fetch_plans(&self, token: &BearerToken) -> Result<Vec<Plan>, RequestError>;
    async fn transfer(
        &self,
        token: &BearerToken,
        request: &TransferRequest,
    ) -> Result<MessageResponse, RequestError>;
    async fn purchase(
        &self,
        token: &BearerToken,
        request: &PurchaseRequest,
    ) -> Result<(), RequestError>;
    async fn transfer_plan(
        &self,
        token: &BearerToken,
        request: &PlanTransferRequest,
    ) -> Result<MessageResponse, RequestError>;
}

/// Maps a non-2xx answer to a [`RequestError`].
///
/// On authenticated calls 401 and 403 mean the token is no longer accepted, whatever
/// the body; on anonymous calls (login, register) they are ordinary rejections such
/// as bad credentials. Any other answer without a JSON error body (proxy error
/// pages, empty bodies) is malformed rather than a server verdict.
pub fn classify_failure(
    endpoint: &'static str,
    status: StatusCode,
    body: &[u8],
    authenticated: bool,
) -> RequestError {
    let decoded = serde_json::from_slice::<ApiErrorBody>(body);
    let status_code = status.as_u16();
    if authenticated && matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return RequestError::SessionInvalid {
            endpoint,
            status: status_code,
            body: decoded.unwrap_or_default(),
        };
    }
    match decoded {
        Ok(body) => RequestError::Rejected {
            endpoint,
            status: status_code,
            body,
        },
        Err(err) => RequestError::Malformed {
            endpoint,
            reason: format!("status {status_code} with undecodable body: {err}"),
        },
    }
}

fn decode<T: DeserializeOwned>(endpoint: &'static str, bytes: &[u8]) -> Result<T, RequestError> {
    serde_json::from_slice(bytes).map_err(|err| RequestError::Malformed {
        endpoint,
        reason: err.to_string(),
    })
}

/// Acknowledgements may come back with an empty body.
fn decode_ack(endpoint: &'static str, bytes: &[u8]) -> Result<MessageResponse, RequestError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(MessageResponse::default());
    }
    decode(endpoint, bytes)
}

#[derive(Clone)]
pub struct HttpGateway {
    http: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let parsed =
            Url::parse(base_url).with_context(|| format!("invalid API base url '{base_url}'"))?;
        anyhow::ensure!(
            matches!(parsed.scheme(), "http" | "https"),
            "API base url must be http(s), got '{base_url}'"
        );

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build().context("failed to build HTTP client")?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    fn get(&self, endpoint: &str, token: &BearerToken) -> RequestBuilder {
        self.http
            .get(self.url(endpoint))
            .header(ACCEPT, "application/json")
            .bearer_auth(token.expose())
    }

    fn post(&self, endpoint: &str, token: Option<&BearerToken>) -> RequestBuilder {
        let request = self
            .http
            .post(self.url(endpoint))
            .header(ACCEPT, "application/json");
        match token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }

    /// Sends one request and returns the raw body of a 2xx answer.
    async fn execute(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<Vec<u8>, RequestError> {
        debug!(endpoint, "dispatching wallet API request");
        let response = request
            .send()
            .await
            .map_err(|err| RequestError::Transport {
                endpoint,
                reason: err.to_string(),
            })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| RequestError::Transport {
                endpoint,
                reason: err.to_string(),
            })?;

        if status.is_success() {
            debug!(endpoint, status = status.as_u16(), "wallet API request succeeded");
            return Ok(body.to_vec());
        }

        let err = classify_failure(endpoint, status, &body, authenticated);
        warn!(endpoint, status = status.as_u16(), error = %err, "wallet API request failed");
        Err(err)
    }
}

#[async_trait]
impl WalletGateway for HttpGateway {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, RequestError> {
        let body = self
            .execute(LOGIN, self.post(LOGIN, None).json(request), false)
            .await?;
        decode(LOGIN, &body)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<(), RequestError> {
        self.execute(REGISTER, self.post(REGISTER, None).json(request), false)
            .await?;
        Ok(())
    }

    async fn fetch_user(&self, token: &BearerToken) -> Result<UserProfile, RequestError> {
        let body = self.execute(USER, self.get(USER, token), true).await?;
        decode(USER, &body)
    }

    async fn fetch_transactions(
        &self,
        token: &BearerToken,
    ) -> Result<Vec<Transaction>, RequestError> {
        let body = self
            .execute(TRANSACTIONS, self.get(TRANSACTIONS, token), true)
            .await?;
        decode(TRANSACTIONS, &body)
    }

    async fn fetch_plans(&self, token: &BearerToken) -> Result<Vec<Plan>, RequestError> {
        let body = self.execute(PLANS, self.get(PLANS, token), true).await?;
        decode(PLANS, &body)
    }

    async fn transfer(
        &self,
        token: &BearerToken,
        request: &TransferRequest,
    ) -> Result<MessageResponse, RequestError> {
        let body = self
            .execute(TRANSFER, self.post(TRANSFER, Some(token)).json(request), true)
            .await?;
        decode_ack(TRANSFER, &body)
    }

    async fn purchase(
        &self,
        token: &BearerToken,
        request: &PurchaseRequest,
    ) -> Result<(), RequestError> {
        self.execute(PURCHASE, self.post(PURCHASE, Some(token)).json(request), true)
            .await?;
        Ok(())
    }

    async fn transfer_plan(
        &self,
        token: &BearerToken,
        request: &PlanTransferRequest,
    ) -> Result<MessageResponse, RequestError> {
        let body = self
            .execute(
                TRANSFER_PLAN,
                self.post(TRANSFER_PLAN, Some(token)).json(request),
                true,
            )
            .await?;
        decode_ack(TRANSFER_PLAN, &body)
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
