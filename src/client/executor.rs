use std::future::Future;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> ClientResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Path plus the percent-encoded query string.
    pub fn uri(&self) -> ClientResult<String> {
        let url = reqwest::Url::parse_with_params(&format!("http://localhost{}", self.path), &self.query)
            .map_err(|e| ClientError::Transport(format!("Invalid request path: {}", e)))?;

        Ok(match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub fn from_json<T: Serialize>(status: StatusCode, body: &T) -> ClientResult<Self> {
        Ok(Self::new(status, serde_json::to_vec(body)?))
    }

    /// Decode a successful response; any other status becomes [`ClientError::Status`].
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        if !self.status.is_success() {
            return Err(ClientError::Status {
                status: self.status,
                message: self.error_message(),
            });
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    fn error_message(&self) -> String {
        serde_json::from_slice::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| String::from_utf8_lossy(&self.body).into_owned())
    }
}

/// Sends API requests. Passed explicitly to everything that talks to the server.
pub trait RequestExecutor: Send + Sync + 'static {
    fn execute(&self, request: ApiRequest) -> impl Future<Output = ClientResult<ApiResponse>> + Send;
}

/// [`RequestExecutor`] over HTTP.
#[derive(Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
    base_url: String,
}

impl HttpExecutor {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl RequestExecutor for HttpExecutor {
    async fn execute(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.uri()?);
        let mut builder = self.client.request(request.method.clone(), &url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(method = %request.method, url = %url, "Request failed: {}", e);
            ClientError::from(e)
        })?;

        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok(ApiResponse::new(status, body))
    }
}
