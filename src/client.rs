// HTTP client for the moderation provider's API.
//
// Every endpoint (prompt execution, moderation, conversation continuation)
// takes a JSON body and the API key in the `x-hl-api-key` header. Status and
// decoding failures are turned into ApiError here so the adapters only deal
// with typed response contracts.

use anyhow::{Context, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;

pub const DEFAULT_API_URL: &str = "https://api.hyperleap.ai";

const API_KEY_HEADER: &str = "x-hl-api-key";

/// Client for the provider API. Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    /// Create a client pointing at the given base URL.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("parapet/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(Method::POST, path, body).await
    }

    pub async fn patch<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(Method::PATCH, path, body).await
    }

    async fn send<B, R>(&self, method: Method, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let response = self
            .client
            .request(method, &url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(url = %url, status = status.as_u16(), body = %text, "API response");

        serde_json::from_str(&text).map_err(|e| ApiError::ResponseShape(e.to_string()))
    }
}
