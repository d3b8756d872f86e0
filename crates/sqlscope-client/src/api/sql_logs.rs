//! SQL-log API.

use std::path::Path;

use serde_json::Value;

use crate::client::SqlscopeClient;
use crate::error::Result;
use crate::request::{ApiRequest, UploadPart};

/// Query parameters for listing and scanning logs.
#[derive(Debug, Clone, Default)]
pub struct SqlLogQuery {
    /// Database name.
    pub db: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SqlLogQuery {
    fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .query_opt("db", self.db.as_deref())
            .query_opt("page", self.page)
            .query_opt("limit", self.limit)
    }
}

/// SQL-log API client.
pub struct SqlLogsApi {
    client: SqlscopeClient,
}

impl SqlLogsApi {
    pub(crate) fn new(client: SqlscopeClient) -> Self {
        Self { client }
    }

    /// List stored log entries.
    pub async fn list(&self, query: &SqlLogQuery) -> Result<Value> {
        let request = query.apply(ApiRequest::get("sql-logs").fallback("Failed to load SQL logs"));
        self.client.execute(request).await
    }

    /// Trigger a scan of the log source.
    pub async fn scan(&self, query: &SqlLogQuery) -> Result<Value> {
        let request =
            query.apply(ApiRequest::get("sql-logs/scan").fallback("Failed to scan SQL logs"));
        self.client.execute(request).await
    }

    /// Names of the databases with logs.
    pub async fn databases(&self) -> Result<Vec<String>> {
        let body = self
            .client
            .execute(ApiRequest::get("sql-logs/databases").fallback("Failed to load databases"))
            .await?;
        Ok(database_names(&body))
    }

    /// Upload raw multipart parts.
    pub async fn upload(&self, parts: Vec<UploadPart>) -> Result<Value> {
        let request = ApiRequest::post("sql-logs/upload")
            .multipart(parts)
            .fallback("Failed to upload SQL logs");
        self.client.execute(request).await
    }

    /// Upload a log file for `db`.
    pub async fn upload_file(&self, path: &Path, db: &str) -> Result<Value> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.log".to_string());

        self.upload(vec![
            UploadPart::file("file", file_name, bytes),
            UploadPart::text("db", db),
        ])
        .await
    }
}

/// Database names from a listing: a bare array, or one under `data` or
/// `databases`; entries are strings or objects with `name`, `db` or `db_name`.
pub fn database_names(body: &Value) -> Vec<String> {
    let entries = body
        .as_array()
        .or_else(|| body.get("data").and_then(Value::as_array))
        .or_else(|| body.get("databases").and_then(Value::as_array));

    entries
        .into_iter()
        .flatten()
        .filter_map(|entry| match entry {
            Value::String(name) => Some(name.as_str()),
            Value::Object(obj) => ["name", "db", "db_name"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str)),
            _ => None,
        })
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
