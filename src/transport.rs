//! Raw HTTP exchange with the budgeting API.
//!
//! The transport knows nothing about sessions: it sends whatever bearer
//! token the request carries and hands back status + body untouched.

use std::future::Future;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{SyncError, SyncResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base, e.g. `/auth/profile`.
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            bearer: None,
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn post<B: Serialize>(path: impl Into<String>, body: &B) -> SyncResult<Self> {
        Self::new(Method::Post, path).with_json(body)
    }

    pub fn put<B: Serialize>(path: impl Into<String>, body: &B) -> SyncResult<Self> {
        Self::new(Method::Put, path).with_json(body)
    }

    pub fn with_json<B: Serialize>(mut self, body: &B) -> SyncResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| SyncError::InvalidInput(format!("Cannot encode request: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn with_bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> SyncResult<T> {
        serde_json::from_str(&self.body).map_err(|e| SyncError::Decode(e.to_string()))
    }
}

/// Something that can carry an [`ApiRequest`] to the backend.
pub trait Transport: Send + Sync {
    /// Resolve to the response for any status code; only a failure to talk
    /// to the server at all is an error.
    fn send(&self, request: ApiRequest) -> impl Future<Output = SyncResult<ApiResponse>> + Send;
}

/// `reqwest`-backed transport rooted at the configured API base.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Config,
}

impl HttpTransport {
    pub fn new(config: &Config) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SyncError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> SyncResult<ApiResponse> {
        let url = self.config.url(&request.path);
        debug!(method = request.method.as_str(), path = %request.path, "Sending API request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("{} {}: {}", request.method.as_str(), url, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SyncError::Network(format!("Failed to read response body: {}", e)))?;

        debug!(path = %request.path, status, "API response received");
        Ok(ApiResponse { status, body })
    }
}
