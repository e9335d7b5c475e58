//! HTTP transport seam between the client and the backend.

use std::future::Future;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;
use url::Url;

use crate::error::TrafficError;

use super::client::ClientConfig;

/// A GET request relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Unencoded path segments, e.g. `["traffic", "city", "Beijing"]`.
    pub segments: Vec<String>,
    /// Query parameters in send order.
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    /// Request for the given path segments with no query.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
        }
    }

    /// Append a query parameter.
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Path for logs and lookup tables, e.g. `/traffic/city/Beijing`.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// Value of a query parameter, if present.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl ApiResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can execute an [`ApiRequest`].
///
/// Implementations return `Err` only when no response was obtained
/// ([`TrafficError::Transport`] or [`TrafficError::RequestConfig`]); any
/// status code, including errors, comes back as `Ok`.
pub trait Transport: Send + Sync {
    /// Execute a GET request.
    fn get(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TrafficError>> + Send;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL, e.g. `http://localhost:8080/api`.
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport from client config.
    pub fn new(config: &ClientConfig) -> Result<Self, TrafficError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            TrafficError::RequestConfig(format!("invalid base url {}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TrafficError::RequestConfig(format!(
                "base url {} cannot carry a path",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| TrafficError::RequestConfig(format!("failed to build client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL for a request, with path segments percent-encoded.
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url, TrafficError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TrafficError::RequestConfig("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(&request.segments);
        Ok(url)
    }
}

impl Transport for HttpTransport {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, TrafficError> {
        let url = self.url_for(request)?;
        debug!(url = %url, "Sending request");

        let response = self.http.get(url).query(&request.query).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}
