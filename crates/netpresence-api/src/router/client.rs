// Router HTTP client
//
// Wraps `reqwest::Client` with the router's URL layout and envelope
// unwrapping. Endpoint groups (session, hosts) are inherent methods in
// sibling modules so this file stays focused on transport mechanics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::router::models::RouterResponse;
use crate::transport::TransportConfig;

/// HTTP client for the router's `/api/v1` web API.
///
/// Holds a cookie-backed session once [`login`](Self::login) succeeds.
/// All request helpers return the unwrapped `data` payload; the envelope
/// is checked and stripped before the caller sees it.
#[derive(Clone)]
pub struct RouterClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RouterClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// A cookie jar is added if the config doesn't carry one, since the
    /// router keeps its session in a cookie. `base_url` is the router root,
    /// e.g. `http://192.168.0.1/`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The router base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/v1/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/v1/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and unwrap the envelope.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await?;

        self.parse_envelope(resp).await
    }

    /// Send a form-encoded POST request and unwrap the envelope.
    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        url: Url,
        form: &(impl Serialize + Sync),
    ) -> Result<Option<T>, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .header("X-Requested-With", "XMLHttpRequest")
            .form(form)
            .send()
            .await?;

        self.parse_envelope(resp).await
    }

    /// Check the HTTP status, then the `{ error, message, data }` envelope.
    ///
    /// Returns `data` (which some endpoints omit) on success, or
    /// `Error::RouterApi` when `error != "ok"`.
    async fn parse_envelope<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<Option<T>, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::SessionExpired);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::RouterApi {
                message: format!("HTTP {status}: {}", preview(&body)),
            });
        }

        let body = resp.text().await?;

        let envelope: RouterResponse<T> =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            })?;

        if envelope.is_ok() {
            Ok(envelope.data)
        } else {
            Err(Error::RouterApi {
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("error={}", envelope.error)),
            })
        }
    }
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}
