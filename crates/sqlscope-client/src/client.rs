//! Main client implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::cookie::Jar;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde_json::Value;
use sqlscope_types::{AccessToken, failure_message};
use url::Url;

use crate::api::{AdminApi, AnalysisApi, AuthApi, HealthApi, SqlLogsApi};
use crate::error::{Error, Result};
use crate::refresh::RefreshCoordinator;
use crate::request::{ApiRequest, RequestBody};
use crate::token_store::{TokenPersistence, TokenStore};

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on a single refresh.
const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the caller stands with the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No access token held.
    Anonymous,
    /// A login, registration, bootstrap or refresh is underway.
    Authenticating,
    /// An access token is held.
    Authenticated,
}

/// sqlscope gateway client.
///
/// Attaches the stored access token to every call and recovers once from a
/// 401 by refreshing through the gateway's refresh cookie.
///
/// # Example
///
/// ```no_run
/// use sqlscope_client::SqlscopeClient;
/// use sqlscope_types::LoginRequest;
///
/// # async fn example() -> sqlscope_client::Result<()> {
/// let client = SqlscopeClient::builder()
///     .base_url("http://localhost:3000")
///     .build()?;
///
/// client.auth().login(&LoginRequest {
///     email: "ada@example.com".into(),
///     password: "hunter2".into(),
/// }).await?;
///
/// let users = client.admin().list_users().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SqlscopeClient {
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) timeout: Duration,
    pub(crate) store: TokenStore,
    pub(crate) refresher: RefreshCoordinator,
    pub(crate) cookies: Arc<Jar>,
    pub(crate) authenticating: AtomicUsize,
}

impl std::fmt::Debug for SqlscopeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlscopeClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("state", &self.state())
            .finish()
    }
}

impl SqlscopeClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The token store backing this client.
    pub fn token_store(&self) -> &TokenStore {
        &self.inner.store
    }

    /// The cookie jar holding the refresh cookie.
    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.inner.cookies
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        if self.inner.authenticating.load(Ordering::SeqCst) > 0 || self.inner.refresher.is_refreshing() {
            SessionState::Authenticating
        } else if self.inner.store.get().is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    /// Refresh the access token now, joining an in-flight refresh if any.
    pub async fn refresh(&self) -> Result<Option<AccessToken>> {
        Ok(self.inner.refresher.refresh().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the auth API.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access the admin user-management API.
    pub fn admin(&self) -> AdminApi {
        AdminApi::new(self.clone())
    }

    /// Access the SQL-log API.
    pub fn sql_logs(&self) -> SqlLogsApi {
        SqlLogsApi::new(self.clone())
    }

    /// Access the AI analysis API.
    pub fn analysis(&self) -> AnalysisApi {
        AnalysisApi::new(self.clone())
    }

    /// Access the health API.
    pub fn health(&self) -> HealthApi {
        HealthApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request pipeline
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a URL for an `/api` path.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.inner
            .base_url
            .join(&format!("api/{}", path))
            .map_err(Error::from)
    }

    /// Build a URL outside the `/api` surface.
    pub(crate) fn root_url(&self, path: &str) -> Result<Url> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(Error::from)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Report `Authenticating` until the returned guard is dropped.
    pub(crate) fn authenticating(&self) -> AuthenticatingGuard {
        self.inner.authenticating.fetch_add(1, Ordering::SeqCst);
        AuthenticatingGuard {
            client: self.clone(),
        }
    }

    /// Send a request, recovering once from a 401 through the refresh
    /// coordinator. Returns the decoded JSON body (`Null` when empty).
    pub async fn execute(&self, mut request: ApiRequest) -> Result<Value> {
        loop {
            let response = self.send_once(&request).await?;

            if response.status() == StatusCode::UNAUTHORIZED && request.refreshable {
                if request.retried {
                    tracing::debug!(path = %request.path, "Replayed request rejected again");
                    return Err(self.extract_error(response, request.fallback).await);
                }

                tracing::debug!(path = %request.path, "Access token rejected, refreshing");
                request.retried = true;
                match self.inner.refresher.refresh().await? {
                    Some(token) => {
                        let value = HeaderValue::from_str(&token.bearer())
                            .map_err(|_| Error::Config("refreshed token is not a valid header value".to_string()))?;
                        request.headers.insert(AUTHORIZATION, value);
                    }
                    None => {
                        request.headers.remove(AUTHORIZATION);
                    }
                }
                continue;
            }

            return self.handle_response(response, request.fallback).await;
        }
    }

    async fn send_once(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        let url = self.url(&request.path)?;
        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), url)
            .timeout(self.inner.timeout)
            .headers(request.headers.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if !request.headers.contains_key(AUTHORIZATION)
            && let Some(token) = self.inner.store.get()
        {
            builder = builder.bearer_auth(token.as_str());
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(parts) => builder.multipart(RequestBody::to_form(parts)?),
        };

        Ok(builder.send().await?)
    }

    /// Handle a response, extracting the body or error.
    async fn handle_response(&self, response: reqwest::Response, fallback: &str) -> Result<Value> {
        if !response.status().is_success() {
            return Err(self.extract_error(response, fallback).await);
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Extract an error from a failed response.
    async fn extract_error(&self, response: reqwest::Response, fallback: &str) -> Error {
        let status = response.status().as_u16();
        let body: Value = match response.text().await {
            Ok(text) => serde_json::from_str(&text).unwrap_or(Value::Null),
            Err(_) => Value::Null,
        };

        let message = failure_message(&body).unwrap_or_else(|| fallback.to_string());
        let code = body
            .get("error")
            .and_then(|e| e.get("code"))
            .map(|c| match c {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "unknown".to_string());

        match status {
            401 => Error::Auth(message),
            404 => Error::NotFound(message),
            _ => Error::Api {
                status,
                code,
                message,
            },
        }
    }
}

/// Holds the client in `Authenticating`; released on drop, including when
/// the owning future is cancelled.
pub(crate) struct AuthenticatingGuard {
    client: SqlscopeClient,
}

impl Drop for AuthenticatingGuard {
    fn drop(&mut self) {
        self.client.inner.authenticating.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Builder for creating a [`SqlscopeClient`].
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    refresh_timeout: Duration,
    user_agent: Option<String>,
    store: Option<TokenStore>,
    persistence: Option<Arc<dyn TokenPersistence>>,
    cookies: Option<Arc<Jar>>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("refresh_timeout", &self.refresh_timeout)
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            user_agent: None,
            store: None,
            persistence: None,
            cookies: None,
        }
    }

    /// Set the gateway base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bound how long a refresh (and every caller queued on it) may wait.
    pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Share an existing token store.
    pub fn token_store(mut self, store: TokenStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Persist the access token through `persistence`. Ignored when a
    /// store is supplied with [`token_store`](Self::token_store).
    pub fn persistence(mut self, persistence: Arc<dyn TokenPersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Use a pre-seeded cookie jar.
    pub fn cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.cookies = Some(jar);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<SqlscopeClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        // Parse and normalize base URL
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("sqlscope-client/{}", env!("CARGO_PKG_VERSION")));

        let cookies = self.cookies.unwrap_or_default();
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .user_agent(user_agent)
            .build()?;

        let store = match (self.store, self.persistence) {
            (Some(store), _) => store,
            (None, Some(persistence)) => TokenStore::with_persistence(persistence),
            (None, None) => TokenStore::new(),
        };

        let refresh_url = base_url.join("api/auth/refresh")?;
        let refresher =
            RefreshCoordinator::new(http.clone(), refresh_url, store.clone(), self.refresh_timeout);

        Ok(SqlscopeClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout: self.timeout,
                store,
                refresher,
                cookies,
                authenticating: AtomicUsize::new(0),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_base_url() {
        let result = ClientBuilder::new().build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_normalizes_trailing_slash() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:3000")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:3000/");
    }

    #[test]
    fn test_url_building() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:3000/dash")
            .build()
            .unwrap();

        let url = client.url("auth/me").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/dash/api/auth/me");

        let url = client.url("/admin/users").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/dash/api/admin/users");

        let url = client.root_url("/health").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/dash/health");
    }

    #[test]
    fn test_state_follows_store() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:3000")
            .build()
            .unwrap();
        assert_eq!(client.state(), SessionState::Anonymous);

        client.token_store().set(Some(AccessToken::new("t")));
        assert_eq!(client.state(), SessionState::Authenticated);

        let first = client.authenticating();
        let second = client.authenticating();
        assert_eq!(client.state(), SessionState::Authenticating);

        drop(first);
        assert_eq!(client.state(), SessionState::Authenticating);
        drop(second);
        assert_eq!(client.state(), SessionState::Authenticated);
    }
}
