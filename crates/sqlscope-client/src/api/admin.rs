//! Admin user-management API.

use serde::Deserialize;
use serde_json::Value;
use sqlscope_types::{CreateUserRequest, RoleUpdate, StatusUpdate, User, UserId, select_user_payload};

use crate::client::SqlscopeClient;
use crate::error::Result;
use crate::request::ApiRequest;

/// Listing shapes seen from backends.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserList {
    Bare(Vec<User>),
    Wrapped { users: Vec<User> },
}

/// Admin API client.
pub struct AdminApi {
    client: SqlscopeClient,
}

impl AdminApi {
    pub(crate) fn new(client: SqlscopeClient) -> Self {
        Self { client }
    }

    /// List all users.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let body = self
            .client
            .execute(ApiRequest::get("admin/users").fallback("Failed to load users"))
            .await?;
        let list: UserList = serde_json::from_value(body)?;
        Ok(match list {
            UserList::Bare(users) | UserList::Wrapped { users } => users,
        })
    }

    /// Create a user.
    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<User> {
        let body = self
            .client
            .execute(
                ApiRequest::post("admin/users")
                    .json(request)?
                    .fallback("Failed to create user"),
            )
            .await?;
        Ok(serde_json::from_value(select_user_payload(body))?)
    }

    /// Change a user's role.
    pub async fn update_role(&self, id: &UserId, role: impl Into<String>) -> Result<Value> {
        let body = RoleUpdate { role: role.into() };
        self.client
            .execute(
                ApiRequest::put(format!("admin/users/{}/role", id))
                    .json(&body)?
                    .fallback("Failed to update role"),
            )
            .await
    }

    /// Change a user's status.
    pub async fn update_status(&self, id: &UserId, status: impl Into<String>) -> Result<Value> {
        let body = StatusUpdate {
            status: status.into(),
        };
        self.client
            .execute(
                ApiRequest::put(format!("admin/users/{}/status", id))
                    .json(&body)?
                    .fallback("Failed to update status"),
            )
            .await
    }

    /// Delete a user.
    pub async fn delete_user(&self, id: &UserId) -> Result<()> {
        self.client
            .execute(ApiRequest::delete(format!("admin/users/{}", id)).fallback("Failed to delete user"))
            .await?;
        Ok(())
    }
}
