//! Auth API: session establishment and teardown.

use serde_json::Value;
use sqlscope_types::{
    AccessToken, LoginRequest, RegisterRequest, SessionResponse, User, select_user_payload,
};

use crate::client::SqlscopeClient;
use crate::error::Result;
use crate::request::ApiRequest;

/// Auth API client.
pub struct AuthApi {
    client: SqlscopeClient,
}

impl AuthApi {
    pub(crate) fn new(client: SqlscopeClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a session. The access token lands in the
    /// token store and the refresh cookie in the client's jar.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<Option<User>> {
        let request = ApiRequest::post("auth/login")
            .json(credentials)?
            .without_refresh()
            .fallback("Login failed");
        self.establish(request).await
    }

    /// Create an account and start a session.
    pub async fn register(&self, account: &RegisterRequest) -> Result<Option<User>> {
        let request = ApiRequest::post("auth/register")
            .json(account)?
            .without_refresh()
            .fallback("Registration failed");
        self.establish(request).await
    }

    /// End the session. The token store is cleared even if the call fails.
    pub async fn logout(&self) -> Result<()> {
        let result = self
            .client
            .execute(ApiRequest::post("auth/logout").without_refresh())
            .await;
        self.client.token_store().clear();
        result.map(|_| ())
    }

    /// Load the current user.
    pub async fn me(&self) -> Result<User> {
        let body = self
            .client
            .execute(ApiRequest::get("auth/me").fallback("Failed to load current user"))
            .await?;
        Ok(serde_json::from_value(select_user_payload(body))?)
    }

    /// Refresh the access token through the refresh cookie.
    pub async fn refresh(&self) -> Result<Option<AccessToken>> {
        self.client.refresh().await
    }

    /// Restore a session on startup: refresh once if no token is held, then
    /// load the user. Failures leave the client anonymous.
    pub async fn bootstrap(&self) -> Option<User> {
        if self.client.token_store().get().is_none() {
            let refreshed = {
                let _authenticating = self.client.authenticating();
                self.client.refresh().await
            };

            match refreshed {
                Ok(Some(_)) => {}
                Ok(None) => return None,
                Err(e) => {
                    tracing::debug!(error = %e, "No session to restore");
                    return None;
                }
            }
        }

        match self.me().await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!(error = %e, "Failed to load user during bootstrap");
                None
            }
        }
    }

    async fn establish(&self, request: ApiRequest) -> Result<Option<User>> {
        let _authenticating = self.client.authenticating();
        let result = self.client.execute(request).await;

        let session: SessionResponse = serde_json::from_value(result?)?;
        self.client.token_store().set(session.access_token);

        Ok(session
            .user
            .filter(|u| !u.is_null())
            .map(select_user_payload)
            .and_then(|u: Value| serde_json::from_value(u).ok()))
    }
}
