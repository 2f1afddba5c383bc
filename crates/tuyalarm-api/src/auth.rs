use std::fmt;

use secrecy::SecretString;
use url::Url;

/// Default OpenAPI endpoint (Singapore data center).
pub const DEFAULT_ENDPOINT: &str = "https://openapi-sg.iotbing.com";

/// Cloud project credentials used to sign every request.
///
/// Immutable for the lifetime of a client. The secret is held as a
/// [`SecretString`] so it is redacted from `Debug` output and never logged.
#[derive(Clone)]
pub struct Credentials {
    /// Project access id, sent as the `client_id` header.
    pub access_id: String,
    /// Project access secret, used as the HMAC key.
    pub access_secret: SecretString,
    /// Platform base URL (e.g. `https://openapi-sg.iotbing.com`).
    pub endpoint: Url,
}

impl Credentials {
    pub fn new(access_id: impl Into<String>, access_secret: SecretString, endpoint: Url) -> Self {
        Self {
            access_id: access_id.into(),
            access_secret,
            endpoint,
        }
    }

    /// A shortened access id suitable for log lines.
    pub fn redacted_id(&self) -> String {
        let prefix: String = self.access_id.chars().take(6).collect();
        format!("{prefix}...")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_id", &self.redacted_id())
            .field("access_secret", &"[REDACTED]")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}
