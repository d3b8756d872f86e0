//! Replayable request descriptions.
//!
//! A request may be sent twice (once, then again after a refresh), so bodies
//! are held as owned data rather than as one-shot streams.

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::error::{Error, Result};

/// Fallback failure message when an operation does not name one.
pub const DEFAULT_FALLBACK: &str = "Request failed";

/// One field of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub name: String,
    pub content: UploadContent,
}

/// Contents of an [`UploadPart`].
#[derive(Debug, Clone)]
pub enum UploadContent {
    /// Plain text field.
    Text(String),
    /// File field.
    File {
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

impl UploadPart {
    /// A text field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: UploadContent::Text(value.into()),
        }
    }

    /// A file field.
    pub fn file(name: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content: UploadContent::File {
                file_name: file_name.into(),
                content_type: None,
                bytes,
            },
        }
    }

    /// Set the MIME type of a file field. Ignored for text fields.
    pub fn with_content_type(mut self, mime: impl Into<String>) -> Self {
        if let UploadContent::File { content_type, .. } = &mut self.content {
            *content_type = Some(mime.into());
        }
        self
    }
}

/// Request body.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<UploadPart>),
}

impl RequestBody {
    /// Build a fresh multipart form from the owned parts.
    pub(crate) fn to_form(parts: &[UploadPart]) -> Result<Form> {
        let mut form = Form::new();
        for part in parts {
            form = match &part.content {
                UploadContent::Text(value) => form.text(part.name.clone(), value.clone()),
                UploadContent::File {
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let mut file = Part::bytes(bytes.clone()).file_name(file_name.clone());
                    if let Some(mime) = content_type {
                        file = file.mime_str(mime)?;
                    }
                    form.part(part.name.clone(), file)
                }
            };
        }
        Ok(form)
    }
}

/// A call against the gateway `/api` surface.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: RequestBody,
    pub(crate) retried: bool,
    pub(crate) refreshable: bool,
    pub(crate) fallback: &'static str,
}

impl ApiRequest {
    /// A request with `method` against `api/<path>`.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            retried: false,
            refreshable: true,
            fallback: DEFAULT_FALLBACK,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<B: serde::Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach a multipart body.
    pub fn multipart(mut self, parts: Vec<UploadPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter when `value` is present.
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Set a header. A caller-supplied `Authorization` wins over the stored token.
    pub fn header(mut self, name: HeaderName, value: &str) -> Result<Self> {
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::Config(format!("invalid value for header {}", name)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Message used when a failure response carries no reason.
    pub fn fallback(mut self, message: &'static str) -> Self {
        self.fallback = message;
        self
    }

    /// Opt out of refresh-on-401 (credential exchanges and logout).
    pub fn without_refresh(mut self) -> Self {
        self.refreshable = false;
        self
    }

    /// Whether this request has already been replayed after a refresh.
    pub fn is_retried(&self) -> bool {
        self.retried
    }
}
