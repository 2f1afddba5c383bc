// tuyalarm-api: Async Rust client for the Tuya OpenAPI (signed requests + token cache)

pub mod auth;
pub mod client;
pub mod clock;
pub mod devices;
pub mod error;
pub mod models;
pub mod signer;
pub mod token;
pub mod transport;

pub use auth::{Credentials, DEFAULT_ENDPOINT};
pub use client::{TOKEN_PATH, TuyaClient};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AUTH_CODES, Error, ErrorKind};
pub use models::{CommandPayload, DeviceInfo, StatusEntry};
pub use signer::{RequestTarget, SignedRequest, Signer};
pub use token::{AccessToken, DEFAULT_SAFETY_MARGIN, TokenCache, TokenGrant};
pub use transport::{TlsMode, TransportConfig};
