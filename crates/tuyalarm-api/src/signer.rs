// Request signing
//
// Computes the platform's canonical string-to-sign and the HMAC-SHA256
// signature over it. The platform recomputes the same digest server-side
// and rejects any mismatch with a generic auth failure, so the query string
// that gets signed and the one that gets transmitted both come from
// `RequestTarget`.

use hmac::{Hmac, Mac};
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use url::{Url, form_urlencoded};

use crate::error::Error;

type HmacSha256 = Hmac<Sha256>;

/// Value of the `sign_method` header.
pub const SIGN_METHOD: &str = "HMAC-SHA256";

/// Lowercase hex SHA-256 of a request body.
pub fn content_hash(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

// ── Request target ──────────────────────────────────────────────────

/// Path plus canonical query string.
///
/// Query parameters are sorted by key (then value) and form-encoded once;
/// the resulting string is what gets signed and what goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    path: String,
    query: String,
}

impl RequestTarget {
    pub fn new(path: &str, query: &[(&str, String)]) -> Self {
        let mut params: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();
        params.sort_unstable();

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            serializer.append_pair(key, value);
        }

        Self {
            path: path.to_owned(),
            query: serializer.finish(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The canonical query string, empty when there are no parameters.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// `path` or `path?query`, exactly as it appears in the string-to-sign.
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }

    /// Resolve against the platform endpoint.
    ///
    /// The endpoint's own path is replaced, not extended; configuration
    /// only accepts bare origins.
    pub fn url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        url.set_path(&self.path);
        url.set_query((!self.query.is_empty()).then_some(self.query.as_str()));
        url
    }
}

/// `METHOD\ncontent_hash\n<headers>\npath[?query]` with an empty header block.
pub fn string_to_sign(method: &Method, body: &[u8], target: &RequestTarget) -> String {
    format!(
        "{}\n{}\n\n{}",
        method.as_str(),
        content_hash(body),
        target.path_and_query()
    )
}

// ── Signed request ──────────────────────────────────────────────────

/// One fully signed request, built per call and never reused.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub method: Method,
    pub target: RequestTarget,
    pub body: Vec<u8>,
    pub timestamp_ms: i64,
    pub nonce: String,
    pub signature: String,
    client_id: String,
    access_token: Option<String>,
}

impl SignedRequest {
    /// Authentication headers for this request.
    pub fn headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        insert(&mut headers, "client_id", &self.client_id, false)?;
        if let Some(ref token) = self.access_token {
            insert(&mut headers, "access_token", token, true)?;
        }
        insert(&mut headers, "sign", &self.signature, false)?;
        insert(&mut headers, "t", &self.timestamp_ms.to_string(), false)?;
        insert(&mut headers, "nonce", &self.nonce, false)?;
        insert(&mut headers, "sign_method", SIGN_METHOD, false)?;
        if !self.body.is_empty() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        Ok(headers)
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str, sensitive: bool) -> Result<(), Error> {
    let mut value = HeaderValue::from_str(value).map_err(|e| Error::Authentication {
        message: format!("invalid {name} header value: {e}"),
    })?;
    value.set_sensitive(sensitive);
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

// ── Signer ──────────────────────────────────────────────────────────

/// Holds the signing key material for one credential set.
#[derive(Clone)]
pub struct Signer {
    access_id: String,
    access_secret: SecretString,
}

impl Signer {
    pub fn new(access_id: impl Into<String>, access_secret: SecretString) -> Self {
        Self {
            access_id: access_id.into(),
            access_secret,
        }
    }

    /// `access_id + token? + timestamp + nonce + string_to_sign`.
    pub fn sign_source(
        &self,
        string_to_sign: &str,
        timestamp_ms: i64,
        nonce: &str,
        access_token: Option<&str>,
    ) -> String {
        format!(
            "{}{}{timestamp_ms}{nonce}{string_to_sign}",
            self.access_id,
            access_token.unwrap_or_default()
        )
    }

    /// Uppercase hex HMAC-SHA256 of `message` keyed by the access secret.
    pub fn hmac_hex_upper(&self, message: &str) -> Result<String, Error> {
        let mut mac = HmacSha256::new_from_slice(self.access_secret.expose_secret().as_bytes())
            .map_err(|e| Error::Authentication {
                message: format!("invalid signing key: {e}"),
            })?;
        mac.update(message.as_bytes());
        Ok(hex::encode_upper(mac.finalize().into_bytes()))
    }

    /// Compute the signature for the given request parts.
    pub fn signature(
        &self,
        method: &Method,
        target: &RequestTarget,
        body: &[u8],
        timestamp_ms: i64,
        nonce: &str,
        access_token: Option<&str>,
    ) -> Result<String, Error> {
        let string_to_sign = string_to_sign(method, body, target);
        let source = self.sign_source(&string_to_sign, timestamp_ms, nonce, access_token);
        self.hmac_hex_upper(&source)
    }

    /// Sign a request and bundle everything needed to send it.
    pub fn sign(
        &self,
        method: Method,
        target: RequestTarget,
        body: Vec<u8>,
        timestamp_ms: i64,
        nonce: String,
        access_token: Option<String>,
    ) -> Result<SignedRequest, Error> {
        let signature = self.signature(
            &method,
            &target,
            &body,
            timestamp_ms,
            &nonce,
            access_token.as_deref(),
        )?;
        Ok(SignedRequest {
            method,
            target,
            body,
            timestamp_ms,
            nonce,
            signature,
            client_id: self.access_id.clone(),
            access_token,
        })
    }
}
