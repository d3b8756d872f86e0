//! CLI session persistence.
//!
//! Between invocations the access token lives in the session file and the
//! refresh cookie in a sibling `.cookie` file, both mode 0600. The cookie is
//! replayed into the client's jar on startup so the gateway can refresh.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use reqwest::cookie::{CookieStore, Jar};
use sqlscope_client::{FilePersistence, SqlscopeClient};
use sqlscope_types::REFRESH_COOKIE_NAME;
use url::Url;

use crate::commands::Context;

/// A client wired to the on-disk session.
pub struct Session {
    client: SqlscopeClient,
    jar: Arc<Jar>,
    gateway: Url,
    cookie_path: PathBuf,
}

impl Session {
    /// Open the session for the context's gateway.
    pub fn open(ctx: &Context) -> Result<Self> {
        let token_path = token_path(ctx)?;
        let cookie_path = token_path.with_extension("cookie");
        let gateway = Url::parse(&ctx.server_url)
            .with_context(|| format!("Invalid gateway URL '{}'", ctx.server_url))?;

        let jar = Arc::new(Jar::default());
        if let Some(rt) = read_cookie(&cookie_path)? {
            jar.add_cookie_str(&format!("{}={}; Path=/", REFRESH_COOKIE_NAME, rt), &gateway);
            tracing::debug!(path = %cookie_path.display(), "Restored refresh cookie");
        }

        let client_config = ctx.config.client();
        let client = SqlscopeClient::builder()
            .base_url(ctx.server_url.clone())
            .refresh_timeout(std::time::Duration::from_secs(client_config.refresh_timeout_secs))
            .persistence(Arc::new(FilePersistence::new(&token_path)))
            .cookie_jar(jar.clone())
            .build()?;

        Ok(Self {
            client,
            jar,
            gateway,
            cookie_path,
        })
    }

    pub fn client(&self) -> &SqlscopeClient {
        &self.client
    }

    /// Write the current refresh cookie back to disk, or remove the file if
    /// the gateway cleared it.
    pub fn save(&self) -> Result<()> {
        let current = self
            .jar
            .cookies(&self.gateway)
            .and_then(|header| header.to_str().ok().and_then(refresh_value).map(str::to_string));

        match current {
            Some(rt) => write_private(&self.cookie_path, &rt),
            None => self.forget(),
        }
    }

    /// Remove the stored refresh cookie.
    pub fn forget(&self) -> Result<()> {
        match std::fs::remove_file(&self.cookie_path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Session file from `[client].session_file`, else `<config dir>/session/token`.
fn token_path(ctx: &Context) -> Result<PathBuf> {
    if let Some(path) = ctx.config.client().session_file {
        return Ok(path);
    }
    let dir = sqlscope_config::xdg_config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(dir.join("session").join("token"))
}

/// The `rt` value out of a `Cookie` header.
fn refresh_value(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == REFRESH_COOKIE_NAME)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

fn read_cookie(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let value = contents.trim();
            Ok((!value.is_empty()).then(|| value.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

fn write_private(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
