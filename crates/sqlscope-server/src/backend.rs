//! Upstream API client.
//!
//! Forwards gateway calls to `<backend>/v1/...`, carrying the caller's
//! `Authorization` header only when one was sent.

use std::time::Duration;

use axum::http::{HeaderValue, Method, StatusCode, header};
use reqwest::Client;
use reqwest::multipart::Form;
use serde_json::Value;
use url::Url;

use crate::error::{ProxyError, Result};

/// Request body sent upstream.
#[derive(Debug, Default)]
pub enum Payload {
    #[default]
    Empty,
    Json(Value),
    Multipart(Form),
}

/// One upstream call.
#[derive(Debug)]
pub struct BackendCall {
    pub method: Method,
    /// Path segments below `v1/`; each is percent-encoded.
    pub segments: Vec<String>,
    /// Raw query string, forwarded verbatim.
    pub query: Option<String>,
    pub authorization: Option<HeaderValue>,
    pub payload: Payload,
}

impl BackendCall {
    pub fn new<S: Into<String>>(method: Method, segments: impl IntoIterator<Item = S>) -> Self {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: None,
            authorization: None,
            payload: Payload::Empty,
        }
    }

    pub fn get<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self::new(Method::GET, segments)
    }

    pub fn post<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self::new(Method::POST, segments)
    }

    /// Forward the caller's `Authorization` header, if any.
    pub fn authorization(mut self, value: Option<&HeaderValue>) -> Self {
        self.authorization = value.cloned();
        self
    }

    /// Send `Authorization: Bearer <token>`.
    pub fn bearer(mut self, token: &str) -> Result<Self> {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ProxyError::Internal("access token is not a valid header value".to_string()))?;
        self.authorization = Some(value);
        Ok(self)
    }

    /// Forward a raw query string.
    pub fn query(mut self, query: Option<String>) -> Self {
        self.query = query.filter(|q| !q.is_empty());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.payload = Payload::Json(body);
        self
    }

    pub fn multipart(mut self, form: Form) -> Self {
        self.payload = Payload::Multipart(form);
        self
    }
}

/// A buffered upstream response.
#[derive(Debug)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl BackendResponse {
    /// Whether the backend labelled its body as JSON.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
    }

    /// The body as JSON, or `None` if it is empty or does not parse.
    pub fn json(&self) -> Option<Value> {
        if self.body.trim().is_empty() {
            return None;
        }
        serde_json::from_str(&self.body).ok()
    }

    /// Ensure a 2xx status, turning anything else into an upstream error
    /// that carries the backend's body.
    pub fn success(self, fallback: &'static str) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(ProxyError::Upstream {
                status: self.status,
                body: self.json(),
                fallback,
            })
        }
    }

    /// The 2xx body as JSON. Empty bodies are `None`; text that is not JSON
    /// is returned as a JSON string.
    pub fn into_value(self) -> Option<Value> {
        if self.body.trim().is_empty() {
            return None;
        }
        Some(serde_json::from_str(&self.body).unwrap_or(Value::String(self.body)))
    }
}

/// Client for the upstream API.
#[derive(Debug, Clone)]
pub struct Backend {
    http: Client,
    base_url: Url,
}

impl Backend {
    /// Create a client for `base_url` with a per-request `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ProxyError::Config(format!("Invalid backend URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ProxyError::Config(format!(
                "Backend URL '{}' cannot be used as a base",
                base_url
            )));
        }
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(format!("sqlscope-gateway/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProxyError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    /// Base URL of the upstream API.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `<base>/v1/<segments...>?<query>`.
    pub fn url(&self, segments: &[String], query: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v1").extend(segments);
        }
        url.set_query(query);
        url
    }

    /// Perform `call` and buffer the response.
    pub async fn send(&self, call: BackendCall) -> std::result::Result<BackendResponse, reqwest::Error> {
        let url = self.url(&call.segments, call.query.as_deref());
        tracing::debug!(method = %call.method, url = %url, "Forwarding to backend");

        let mut request = self.http.request(call.method, url);
        if let Some(auth) = call.authorization {
            request = request.header(header::AUTHORIZATION, auth);
        }
        request = match call.payload {
            Payload::Empty => request,
            Payload::Json(body) => request.json(&body),
            Payload::Multipart(form) => request.multipart(form),
        };

        let response = request.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(BackendResponse {
            status,
            content_type,
            body,
        })
    }
}
