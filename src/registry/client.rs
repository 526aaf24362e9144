//! HTTP client shared by registry lookups
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Exponential backoff retry on rate limits, timeouts and broken bodies
//! - Mapping of HTTP failures onto `RegistryError`

use crate::error::RegistryError;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("packman/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// HTTP client wrapper with retry logic
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

/// Who a request is for; used to label errors and log events
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub package: &'a str,
    pub registry: &'a str,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a new HTTP client with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| {
                RegistryError::network_error("", "HTTP client", format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// GET `url`, retrying transient failures
    pub async fn get(&self, url: &str, ctx: RequestContext<'_>) -> Result<Response, RegistryError> {
        let mut delay = BASE_DELAY_MS;
        let mut attempt = 0;

        loop {
            let error = match self.client.get(url).send().await {
                Ok(response) => match check_status(response, ctx) {
                    Ok(response) => return Ok(response),
                    Err(e @ RegistryError::RateLimitExceeded { .. }) => e,
                    Err(e) => return Err(e),
                },
                Err(e) if e.is_timeout() => RegistryError::timeout(ctx.package, ctx.registry),
                Err(e) => RegistryError::network_error(ctx.package, ctx.registry, e.to_string()),
            };

            if attempt >= self.max_retries {
                return Err(error);
            }
            tracing::debug!(url, attempt, error = %error, "retrying registry request");
            tokio::time::sleep(Duration::from_millis(delay)).await;
            delay *= 2;
            attempt += 1;
        }
    }

    /// GET `url` and decode the JSON body, retrying bodies that fail to decode
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        ctx: RequestContext<'_>,
    ) -> Result<T, RegistryError> {
        let mut delay = BASE_DELAY_MS;
        let mut attempt = 0;

        loop {
            let response = self.get(url, ctx).await?;
            match response.json::<T>().await {
                Ok(parsed) => return Ok(parsed),
                Err(e) => {
                    let error = RegistryError::InvalidResponse {
                        package: ctx.package.to_string(),
                        registry: ctx.registry.to_string(),
                        message: format!("failed to parse JSON: {}", e),
                    };
                    if attempt >= self.max_retries {
                        return Err(error);
                    }
                    tracing::debug!(url, attempt, error = %error, "retrying registry request");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    delay *= 2;
                    attempt += 1;
                }
            }
        }
    }
}

fn check_status(response: Response, ctx: RequestContext<'_>) -> Result<Response, RegistryError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::TOO_MANY_REQUESTS => Err(RegistryError::rate_limit_exceeded(ctx.registry)),
        StatusCode::NOT_FOUND => Err(RegistryError::package_not_found(ctx.package, ctx.registry)),
        status => Err(RegistryError::network_error(
            ctx.package,
            ctx.registry,
            format!("HTTP {}", status),
        )),
    }
}
