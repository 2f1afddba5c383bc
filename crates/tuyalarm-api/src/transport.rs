// Shared transport configuration for building reqwest::Client instances.
//
// Every outbound call carries both a connect timeout and a total request
// timeout so nothing blocks indefinitely; a timed-out call surfaces as a
// network error.

use std::path::PathBuf;
use std::time::Duration;

/// TLS trust configuration.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the bundled web PKI roots.
    #[default]
    System,
    /// Additionally trust a custom CA certificate from the given PEM file
    /// (for TLS-intercepting proxies).
    CustomCa(PathBuf),
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Total request timeout (connect + send + read).
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(concat!("tuyalarm/", env!("CARGO_PKG_VERSION")));

        if let TlsMode::CustomCa(path) = &self.tls {
            let cert_pem = std::fs::read(path).map_err(|e| {
                crate::error::Error::Tls(format!("failed to read CA cert: {e}"))
            })?;
            let cert = reqwest::Certificate::from_pem(&cert_pem)
                .map_err(|e| crate::error::Error::Tls(format!("invalid CA cert: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }

        builder
            .build()
            .map_err(|e| crate::error::Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Total timeout in whole seconds, for error reporting.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }
}
