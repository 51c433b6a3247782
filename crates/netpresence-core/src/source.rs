// ── Host table sources ──
//
// The scheduler pulls rows through `HostTableSource`. `RouterSource` is
// the production implementation backed by the router's web API.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use netpresence_api::transport::{TlsMode, TransportConfig};
use netpresence_api::{HostEntry, RouterClient};

use crate::config::{RouterConfig, TlsVerification};
use crate::convert::device_rows;
use crate::error::CoreError;
use crate::model::DeviceRow;

/// Anything that can produce the router's current host table.
#[async_trait]
pub trait HostTableSource: Send + Sync {
    /// Fetch the current table. Any failure is reported as a [`CoreError`]
    /// and leaves entity state untouched.
    async fn fetch_host_table(&self) -> Result<Vec<DeviceRow>, CoreError>;

    /// Release any session held with the router.
    async fn close(&self) {}
}

// ── RouterSource ─────────────────────────────────────────────────────

/// Host table source that logs in lazily and keeps the session cookie.
///
/// An expired session triggers exactly one re-login per fetch.
pub struct RouterSource {
    client: RouterClient,
    username: String,
    password: SecretString,
    logged_in: AtomicBool,
    session: Mutex<()>,
}

impl RouterSource {
    pub fn new(config: &RouterConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: match config.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: config.timeout,
            cookie_jar: None,
        };
        let client = RouterClient::new(config.url.clone(), &transport)?;

        Ok(Self {
            client,
            username: config.username.clone(),
            password: config.password.clone(),
            logged_in: AtomicBool::new(false),
            session: Mutex::new(()),
        })
    }

    /// Fetch the raw host table entries, logging in first if needed.
    pub async fn host_entries(&self) -> Result<Vec<HostEntry>, CoreError> {
        self.ensure_session().await?;

        match self.client.host_table().await {
            Ok(entries) => Ok(entries),
            Err(e) if e.is_auth_expired() => {
                debug!("router session expired, logging in again");
                self.logged_in.store(false, Ordering::Release);
                self.ensure_session().await?;
                Ok(self.client.host_table().await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_session(&self) -> Result<(), CoreError> {
        if self.logged_in.load(Ordering::Acquire) {
            return Ok(());
        }
        let _guard = self.session.lock().await;
        if self.logged_in.load(Ordering::Acquire) {
            return Ok(());
        }

        debug!(router = %self.client.base_url(), "logging in");
        self.client.login(&self.username, &self.password).await?;
        self.logged_in.store(true, Ordering::Release);
        Ok(())
    }
}

#[async_trait]
impl HostTableSource for RouterSource {
    async fn fetch_host_table(&self) -> Result<Vec<DeviceRow>, CoreError> {
        let entries = self.host_entries().await?;
        Ok(device_rows(&entries))
    }

    async fn close(&self) {
        if !self.logged_in.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = self.client.logout().await {
            warn!(error = %e, "logout failed (non-fatal)");
        }
    }
}
