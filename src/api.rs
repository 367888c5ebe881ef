use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::{
    ChainCatalog, ChainsPayload, Envelope, ExecutionResult, Quote, QuotePayload, QuoteRequest,
};

const SUPPORTED_CHAINS_PATH: &str = "/api/supported_chains";
const QUOTE_PATH: &str = "/api/cross_chain_quote";
const EXECUTE_PATH: &str = "/api/execute_cross_chain_swap";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Backend answered `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("response is missing `{0}`")]
    MissingPayload(&'static str),

    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Text shown to the user. Backend rejections carry their own message;
    /// everything else collapses to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Rejected(msg) if !msg.is_empty() => msg.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// The three backend calls the quote workflow needs.
#[async_trait]
pub trait SwapBackend: Send + Sync + 'static {
    async fn supported_chains(&self) -> Result<ChainCatalog, ApiError>;

    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, ApiError>;

    /// `success: false` is a normal result here, not an error: the caller
    /// shows the message and keeps its quote.
    async fn execute(&self, request: &QuoteRequest) -> Result<ExecutionResult, ApiError>;
}

#[derive(Clone)]
pub struct HttpBackend {
    base: Url,
    http_client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)?;
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base, http_client })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "GET");
        let resp = self.http_client.get(url).send().await?;
        decode(resp).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let body_json = serde_json::to_string(body)?;
        tracing::debug!(%url, body = body_json, "POST");

        let resp = self
            .http_client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body_json)
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        tracing::warn!(status = %status, body, "backend HTTP error");
        if let Some(message) = rejection_message(&body) {
            return Err(ApiError::Rejected(message));
        }
        return Err(ApiError::Status { status: status.as_u16(), body });
    }

    Ok(serde_json::from_str(&body)?)
}

/// Error bodies that still follow the `{ success: false, message }` shape.
#[derive(Deserialize)]
struct ErrorBody {
    success: Option<bool>,
    message: Option<String>,
}

fn rejection_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed {
        ErrorBody { success: Some(false), message: Some(message) } if !message.is_empty() => {
            Some(message)
        }
        _ => None,
    }
}

fn rejection(message: Option<String>, fallback: &str) -> ApiError {
    ApiError::Rejected(message.unwrap_or_else(|| fallback.to_string()))
}

#[async_trait]
impl SwapBackend for HttpBackend {
    async fn supported_chains(&self) -> Result<ChainCatalog, ApiError> {
        let envelope: Envelope<ChainsPayload> = self.get_json(SUPPORTED_CHAINS_PATH).await?;
        if !envelope.success {
            return Err(rejection(envelope.message, "could not load supported chains"));
        }
        let chains = envelope.payload.chains.ok_or(ApiError::MissingPayload("chains"))?;
        Ok(ChainCatalog::new(chains))
    }

    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, ApiError> {
        let envelope: Envelope<QuotePayload> = self.post_json(QUOTE_PATH, request).await?;
        if !envelope.success {
            return Err(rejection(envelope.message, "quote unavailable"));
        }
        envelope.payload.quote.ok_or(ApiError::MissingPayload("quote"))
    }

    async fn execute(&self, request: &QuoteRequest) -> Result<ExecutionResult, ApiError> {
        self.post_json(EXECUTE_PATH, request).await
    }
}
