// ── Runtime connection configuration ──
//
// Describes how to reach the platform: credentials plus transport tuning.
// Never touches disk or the environment; tuyalarm-config (or a test)
// builds an `AlarmConfig` and hands it in.

use std::time::Duration;

use chrono::TimeDelta;
use secrecy::SecretString;
use tuyalarm_api::{Credentials, DEFAULT_SAFETY_MARGIN, TlsMode, TransportConfig};
use url::Url;

/// Configuration for talking to one cloud project.
#[derive(Debug, Clone)]
pub struct AlarmConfig {
    /// OpenAPI base URL.
    pub endpoint: Url,
    pub access_id: String,
    pub access_secret: SecretString,
    pub tls: TlsMode,
    /// Total request timeout.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Tokens are refreshed this long before they expire.
    pub token_margin: TimeDelta,
}

impl AlarmConfig {
    /// Build with default transport settings.
    pub fn new(access_id: impl Into<String>, access_secret: SecretString, endpoint: Url) -> Self {
        let transport = TransportConfig::default();
        Self {
            endpoint,
            access_id: access_id.into(),
            access_secret,
            tls: transport.tls,
            timeout: transport.timeout,
            connect_timeout: transport.connect_timeout,
            token_margin: DEFAULT_SAFETY_MARGIN,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.access_id.clone(),
            self.access_secret.clone(),
            self.endpoint.clone(),
        )
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
        }
    }
}
