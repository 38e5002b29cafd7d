//! HTTP transport capability and its reqwest implementation

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use std::collections::BTreeMap;
use std::pin::Pin;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::config::ClientConfig;
use crate::core::errors::{ClientError, Result};
use crate::core::request::Request;

/// A pinned, sendable stream of body chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Response as produced by a transport
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Headers with non-UTF-8 values dropped
    pub headers: BTreeMap<String, String>,
    /// Unread body
    pub body: ByteStream,
}

impl RawResponse {
    /// Response whose body is already in memory
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self {
            status,
            headers: BTreeMap::new(),
            body: Box::pin(stream::once(async move { Ok(body) })),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Buffer the whole body, failing with `Cancelled` if the token fires first
    pub async fn collect(mut self, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                chunk = self.body.next() => chunk,
            };
            match chunk {
                Some(chunk) => buf.extend_from_slice(&chunk?),
                None => return Ok(buf),
            }
        }
    }
}

impl std::fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Sends requests to the server
///
/// Implementations must not block, must return `ClientError::Cancelled`
/// once they observe `cancel`, and must report network failures as
/// `ClientError::Transport`. Non-success statuses are responses, not errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request, cancel: &CancellationToken) -> Result<RawResponse>;
}

/// Transport over a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport using the configured timeout and user agent
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request, cancel: &CancellationToken) -> Result<RawResponse> {
        let url = request.url()?;
        let mut builder = self.client.request(request.method.clone(), url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        debug!(method = %request.method, %url, "sending HTTP request");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%url, "request cancelled before response");
                return Err(ClientError::Cancelled);
            }
            response = builder.send() => response?,
        };

        let status = response.status().as_u16();
        debug!(%url, status, "received HTTP response");

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body: ByteStream = Box::pin(response.bytes_stream().map(|r| r.map_err(ClientError::from)));

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
