//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use anyhow::Result;
use reqwest::Client;
use reqwest::redirect::Policy;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use wiremock::MockServer;

use sqlscope_server::{Server, ServerConfig};

/// A gateway running in the background against a mocked backend.
pub struct TestGateway {
    /// The gateway's address.
    pub addr: SocketAddr,
    /// The mocked upstream API.
    pub backend: MockServer,
    /// Plain HTTP client: no cookie store, no redirects.
    pub client: Client,
    shutdown: Option<oneshot::Sender<()>>,
    _handle: JoinHandle<()>,
}

impl TestGateway {
    /// Start a gateway with default configuration.
    pub async fn start() -> Result<Self> {
        Self::start_with(|config| config).await
    }

    /// Start a gateway, letting the caller adjust the configuration.
    pub async fn start_with(configure: impl FnOnce(ServerConfig) -> ServerConfig) -> Result<Self> {
        let backend = MockServer::start().await;
        let config = configure(ServerConfig::new(backend.uri()).with_request_logging(false));
        let (addr, shutdown, handle) = spawn(config).await?;

        Ok(Self {
            addr,
            backend,
            client: Client::builder().redirect(Policy::none()).build()?,
            shutdown: Some(shutdown),
            _handle: handle,
        })
    }

    /// Get the base URL for the gateway.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.put(self.url(path))
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Bind an ephemeral port and serve `config` until the sender fires.
pub async fn spawn(config: ServerConfig) -> Result<(SocketAddr, oneshot::Sender<()>, JoinHandle<()>)> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server = Server::new(config)?;
    let (tx, rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let _ = server
            .run_with_shutdown(listener, async {
                let _ = rx.await;
            })
            .await;
    });

    Ok((addr, tx, handle))
}

/// All `Set-Cookie` values on `response`.
pub fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}
