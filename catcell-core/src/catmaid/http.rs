// HTTP client for the CATMAID REST API.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use tracing::{debug, instrument, warn};

use crate::config::CatcellConfig;
use crate::error::{CatmaidError, ConfigError};
use crate::types::{SkeletonId, SkeletonNode};

use super::CatmaidSource;
use super::wire::{NeuronEntity, QUERY_TARGETS_BODY, QueryTargetsResponse, parse_compact_skeleton};

/// Maximum retry attempts for transient failures.
const MAX_RETRIES: u32 = 3;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Credentials attached to every request.
#[derive(Clone, Default)]
pub struct CatmaidAuth {
    pub token: Option<String>,
    pub basic: Option<(String, String)>,
}

impl std::fmt::Debug for CatmaidAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatmaidAuth")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("basic", &self.basic.as_ref().map(|(user, _)| user))
            .finish()
    }
}

impl CatmaidAuth {
    /// Token from the configured environment variable; basic auth only when
    /// both a username and a password are present.
    pub fn from_config(config: &CatcellConfig) -> Self {
        let section = &config.catmaid;
        let basic = match (section.username(), section.password()) {
            (Some(user), Some(password)) => Some((user.to_string(), password)),
            _ => None,
        };
        Self {
            token: section.token(),
            basic,
        }
    }

    fn token_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Token {t}"))
    }
}

/// reqwest is built without a bundled rustls provider, so one must be
/// installed before the first client is built. Idempotent.
pub fn install_crypto_provider() {
    // Err only means a provider is already installed.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// CATMAID REST client. Requests are issued one at a time.
#[derive(Debug)]
pub struct HttpCatmaidClient {
    api_root: String,
    auth: CatmaidAuth,
    client: Client,
}

impl HttpCatmaidClient {
    pub fn from_config(config: &CatcellConfig) -> crate::error::Result<Self> {
        install_crypto_provider();

        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(concat!("catcell/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(config.catmaid.accept_invalid_certs)
            .timeout(Duration::from_secs(config.catmaid.timeout_secs))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("cannot build HTTP client: {e}")))?;

        let auth = CatmaidAuth::from_config(config);
        if auth.token.is_none() {
            warn!(
                env = %config.catmaid.token_env,
                "No CATMAID API token set, requests will be anonymous"
            );
        }

        Ok(Self::with_client(config.api_root(), auth, client))
    }

    /// Create with an explicit API root such as `https://host/catmaid/49`.
    pub fn with_client(api_root: String, auth: CatmaidAuth, client: Client) -> Self {
        Self {
            api_root: api_root.trim_end_matches('/').to_string(),
            auth,
            client,
        }
    }

    pub fn query_targets_url(&self) -> String {
        format!("{}/annotations/query-targets", self.api_root)
    }

    pub fn compact_skeleton_url(&self, id: SkeletonId) -> String {
        format!("{}/{id}/0/1/compact-skeleton", self.api_root)
    }

    /// POST with auth, retrying rate limits and gateway errors.
    async fn api_post<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &'static str,
        content_type: Option<&'static str>,
    ) -> crate::error::Result<T> {
        let mut delay = Duration::from_secs(1);
        let mut attempt = 0;

        loop {
            let mut req = self.client.post(url).body(body);
            if let Some(ct) = content_type {
                req = req.header(CONTENT_TYPE, ct);
            }
            if let Some(token) = self.auth.token_header() {
                req = req.header("X-Authorization", token);
            }
            if let Some((user, password)) = &self.auth.basic {
                req = req.basic_auth(user, Some(password));
            }

            debug!(url = %url, attempt, "CATMAID API request");

            let resp = req
                .send()
                .await
                .map_err(|e| CatmaidError::Network(format!("{url}: {e}")))?;

            if resp.status().is_success() {
                return resp
                    .json()
                    .await
                    .map_err(|e| CatmaidError::Decode(format!("{url}: {e}")).into());
            }

            let status = resp.status().as_u16();
            if matches!(status, 429 | 502 | 503 | 504) {
                if attempt == MAX_RETRIES {
                    return Err(CatmaidError::RetriesExhausted {
                        url: url.to_string(),
                        status,
                    }
                    .into());
                }
                let wait = backoff(resp.headers(), delay);
                warn!(
                    attempt,
                    status,
                    wait_secs = wait.as_secs(),
                    "CATMAID busy, backing off"
                );
                tokio::time::sleep(wait).await;
                delay = (delay * 2).min(MAX_BACKOFF);
                attempt += 1;
                continue;
            }

            let body = resp.text().await.unwrap_or_default();
            return Err(CatmaidError::Status {
                status,
                url: url.to_string(),
                body,
            }
            .into());
        }
    }
}

/// Wait before the next attempt: `retry-after` seconds when the server sends
/// them, else `fallback`, never more than [`MAX_BACKOFF`].
fn backoff(headers: &HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map_or(fallback, Duration::from_secs)
        .min(MAX_BACKOFF)
}

#[async_trait::async_trait]
impl CatmaidSource for HttpCatmaidClient {
    #[instrument(skip_all, name = "query_neurons")]
    async fn query_neurons(&self) -> crate::error::Result<Vec<NeuronEntity>> {
        let resp: QueryTargetsResponse = self
            .api_post(
                &self.query_targets_url(),
                QUERY_TARGETS_BODY,
                Some(FORM_CONTENT_TYPE),
            )
            .await?;
        debug!(entities = resp.entities.len(), "Fetched neuron entities");
        Ok(resp.entities)
    }

    #[instrument(skip(self), name = "compact_skeleton")]
    async fn compact_skeleton(&self, id: SkeletonId) -> crate::error::Result<Vec<SkeletonNode>> {
        let body: serde_json::Value = self
            .api_post(&self.compact_skeleton_url(id), "", None)
            .await?;
        let nodes = parse_compact_skeleton(id, &body)?;
        debug!(nodes = nodes.len(), "Fetched skeleton");
        Ok(nodes)
    }
}
