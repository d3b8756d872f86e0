//! AI analysis API.

use serde_json::Value;

use crate::client::SqlscopeClient;
use crate::error::Result;
use crate::request::ApiRequest;

/// Query parameters for an analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisQuery {
    /// Database whose logs are analyzed.
    pub db_name: Option<String>,
}

impl AnalysisQuery {
    pub fn for_database(db_name: impl Into<String>) -> Self {
        Self {
            db_name: Some(db_name.into()),
        }
    }
}

/// Analysis API client.
pub struct AnalysisApi {
    client: SqlscopeClient,
}

impl AnalysisApi {
    pub(crate) fn new(client: SqlscopeClient) -> Self {
        Self { client }
    }

    /// Run an analysis. The result shape is backend-defined.
    pub async fn analyze(&self, query: &AnalysisQuery) -> Result<Value> {
        let request = ApiRequest::get("ai-analysis")
            .query_opt("db_name", query.db_name.as_deref())
            .fallback("AI analysis request failed");
        self.client.execute(request).await
    }
}
