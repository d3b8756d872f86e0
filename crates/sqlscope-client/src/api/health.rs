//! Health API.

use serde::{Deserialize, Serialize};

use crate::client::SqlscopeClient;
use crate::error::{Error, Result};

/// Gateway liveness report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health API client.
///
/// The health endpoint sits outside `/api` and needs no token.
pub struct HealthApi {
    client: SqlscopeClient,
}

impl HealthApi {
    pub(crate) fn new(client: SqlscopeClient) -> Self {
        Self { client }
    }

    /// Check gateway health.
    pub async fn check(&self) -> Result<HealthResponse> {
        let url = self.client.root_url("health")?;
        let response = self.client.http().get(url).send().await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Error::Api {
                status: response.status().as_u16(),
                code: "health_check_failed".to_string(),
                message: "Health check failed".to_string(),
            })
        }
    }

    /// Returns true if the gateway is reachable and healthy.
    pub async fn is_healthy(&self) -> bool {
        self.check().await.is_ok()
    }
}
