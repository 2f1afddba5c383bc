// Signed request dispatcher
//
// Wraps `reqwest::Client` with token acquisition, request signing, envelope
// unwrapping, and failure classification. Endpoint methods live in
// `devices.rs` as inherent methods to keep this module focused on transport
// mechanics. A single failed call returns its classified error; nothing
// here retries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::Credentials;
use crate::error::{Error, TOKEN_REJECTED_CODES};
use crate::models::Envelope;
use crate::signer::{RequestTarget, SignedRequest, Signer};
use crate::token::{TokenCache, TokenGrant};
use crate::transport::TransportConfig;

/// Token endpoint, authenticated by credentials only.
pub const TOKEN_PATH: &str = "/v1.0/token";

const BODY_PREVIEW_CHARS: usize = 200;

/// HTTP client for the platform's OpenAPI.
///
/// Stateless per call apart from the shared [`TokenCache`]; safe to share
/// behind an `Arc` and call from many tasks at once.
pub struct TuyaClient {
    http: reqwest::Client,
    credentials: Credentials,
    signer: Signer,
    tokens: Arc<TokenCache>,
    timeout_secs: u64,
}

impl TuyaClient {
    /// Create a client with its own token cache on the system clock.
    pub fn new(credentials: Credentials, transport: &TransportConfig) -> Result<Self, Error> {
        Self::with_tokens(credentials, transport, Arc::new(TokenCache::default()))
    }

    /// Create a client around an existing token cache.
    ///
    /// The cache's clock also supplies the signing timestamps.
    pub fn with_tokens(
        credentials: Credentials,
        transport: &TransportConfig,
        tokens: Arc<TokenCache>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let signer = Signer::new(credentials.access_id.clone(), credentials.access_secret.clone());
        Ok(Self {
            http,
            credentials,
            signer,
            tokens,
            timeout_secs: transport.timeout_secs(),
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn tokens(&self) -> &Arc<TokenCache> {
        &self.tokens
    }

    // ── Token lifecycle ──────────────────────────────────────────────

    /// Fetch a brand-new token from the platform, bypassing the cache.
    ///
    /// Every failure, whether network or envelope, is reported as
    /// [`Error::Authentication`].
    pub async fn fetch_new_token(&self) -> Result<TokenGrant, Error> {
        let target = RequestTarget::new(TOKEN_PATH, &[("grant_type", "1".into())]);
        debug!(access_id = %self.credentials.redacted_id(), "requesting access token");

        let result = self
            .execute(Method::GET, target, None, None)
            .await
            .map_err(|e| {
                warn!(error = %e, "access token request failed");
                Error::Authentication {
                    message: format!("failed to obtain access token: {e}"),
                }
            })?;

        serde_json::from_value(result).map_err(|e| Error::Authentication {
            message: format!("malformed token response: {e}"),
        })
    }

    /// A valid access token, fetched only if the cache has none.
    async fn access_token(&self) -> Result<SecretString, Error> {
        self.tokens.get_valid_token(|| self.fetch_new_token()).await
    }

    /// Ensure a usable token exists and report when it expires.
    pub async fn verify_credentials(&self) -> Result<DateTime<Utc>, Error> {
        self.access_token().await?;
        self.tokens
            .current()
            .await
            .map(|token| token.expires_at())
            .ok_or_else(|| Error::Authentication {
                message: "platform issued a token that is already expired".into(),
            })
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Perform one authenticated call and return the envelope's `result`.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, Error> {
        let token = self.access_token().await?;
        let target = RequestTarget::new(path, query);

        let result = self
            .execute(method, target, body, Some(token.expose_secret()))
            .await;

        if let Err(Error::Api { code, ref message }) = result {
            if TOKEN_REJECTED_CODES.contains(&code) {
                warn!(code, %message, "platform rejected access token; dropping cached token");
                self.tokens.invalidate().await;
            }
        }

        result
    }

    /// Authenticated GET.
    pub(crate) async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, Error> {
        self.call(Method::GET, path, query, None).await
    }

    /// Authenticated POST with a JSON body.
    pub(crate) async fn post(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<Value, Error> {
        let body = serde_json::to_value(body).map_err(Error::Encode)?;
        self.call(Method::POST, path, &[], Some(&body)).await
    }

    /// Sign and send a single request.
    async fn execute(
        &self,
        method: Method,
        target: RequestTarget,
        body: Option<&Value>,
        access_token: Option<&str>,
    ) -> Result<Value, Error> {
        // Serialised exactly once: these bytes are both hashed and sent.
        let body = match body {
            Some(value) => serde_json::to_vec(value).map_err(Error::Encode)?,
            None => Vec::new(),
        };
        let timestamp_ms = self.tokens.clock().now().timestamp_millis();
        let nonce = Uuid::new_v4().simple().to_string();

        let signed = self.signer.sign(
            method,
            target,
            body,
            timestamp_ms,
            nonce,
            access_token.map(str::to_owned),
        )?;
        let headers = signed.headers()?;
        let SignedRequest {
            method,
            target,
            body,
            ..
        } = signed;

        let url = target.url(&self.credentials.endpoint);
        debug!("{method} {}", target.path_and_query());

        let mut builder = self.http.request(method, url).headers(headers);
        if !body.is_empty() {
            builder = builder.body(body);
        }

        let resp = builder.send().await.map_err(|e| self.transport_error(e))?;
        self.parse_envelope(resp, target.path()).await
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }

    /// Parse the `{success, result, code, msg}` envelope, returning `result`
    /// on success or a classified error otherwise.
    async fn parse_envelope(&self, resp: reqwest::Response, path: &str) -> Result<Value, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        let envelope: Envelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
                warn!(%status, path, "response is not a platform envelope");
                return Err(Error::Protocol {
                    status: status.as_u16(),
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                });
            }
        };

        if envelope.success {
            debug!(path, tid = envelope.tid.as_deref(), "request successful");
            return Ok(envelope.result.unwrap_or(Value::Null));
        }

        let code = envelope
            .code
            .unwrap_or_else(|| i64::from(status.as_u16()));
        let message = envelope
            .msg
            .unwrap_or_else(|| "Unknown error from platform".into());
        warn!(path, code, %message, "platform reported failure");
        Err(Error::Api { code, message })
    }
}

/// Decode an envelope `result` into a typed model.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value::<T>(value.clone()).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: value.to_string(),
    })
}
