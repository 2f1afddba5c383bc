//! Response envelope: the one place operation outcomes become output.
//!
//! Success: `{"data", "meta"}`. Failure: `{"success": false, "error":
//! {"code", "message", "status", "details"}, "meta"}`. `status` carries the
//! HTTP-equivalent status so scripted callers can branch on it.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use uuid::Uuid;

use tuyalarm_core::{AUTH_CODES, ApiFailure, ApiResult, CoreError, ErrorKind};

use crate::error::{exit_code, exit_code_for};

/// Shortest device id accepted before the core is invoked.
pub const MIN_DEVICE_ID_LEN: usize = 10;

#[derive(Debug, Serialize)]
pub struct Meta {
    pub timestamp: String,
    pub request_id: String,
}

impl Meta {
    fn now() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            request_id: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub status: u16,
    pub details: Value,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Success {
        data: Value,
        meta: Meta,
    },
    Failure {
        success: bool,
        error: ErrorBody,
        meta: Meta,
    },
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Success { .. } => exit_code::SUCCESS,
            Self::Failure { error, .. } => {
                let kind = error
                    .details
                    .get("kind")
                    .cloned()
                    .and_then(|k| serde_json::from_value::<ErrorKind>(k).ok());
                let auth_rejection = error
                    .details
                    .get("platform_code")
                    .and_then(Value::as_i64)
                    .is_some_and(|code| AUTH_CODES.contains(&code));
                kind.map_or(exit_code::GENERAL, |kind| exit_code_for(kind, auth_rejection))
            }
        }
    }
}

/// HTTP-equivalent status for a failure.
pub fn http_status(failure: &ApiFailure) -> u16 {
    match failure.kind {
        ErrorKind::Validation => 400,
        ErrorKind::Network => 503,
        ErrorKind::Protocol | ErrorKind::Auth => 502,
        ErrorKind::Api => match failure.code {
            Some(code) if AUTH_CODES.contains(&code) => 502,
            _ => 400,
        },
    }
}

/// Envelope error code for a failure.
fn error_code(failure: &ApiFailure) -> String {
    match failure.kind {
        ErrorKind::Validation => "INVALID_PARAM".into(),
        ErrorKind::Network => "NETWORK_ERROR".into(),
        ErrorKind::Protocol => "PROTOCOL_ERROR".into(),
        ErrorKind::Auth => "AUTH_ERROR".into(),
        ErrorKind::Api => failure
            .code
            .map_or_else(|| "TUYA_ERROR".into(), |code| code.to_string()),
    }
}

/// Wrap a boundary result into the envelope.
pub fn wrap(result: ApiResult) -> Envelope {
    let meta = Meta::now();
    match (result.success, result.payload, result.error) {
        (true, payload, _) => Envelope::Success {
            data: payload.unwrap_or_else(|| json!({})),
            meta,
        },
        (false, _, Some(failure)) => {
            let mut details = json!({ "kind": failure.kind });
            if let Some(code) = failure.code {
                details["platform_code"] = json!(code);
            }
            Envelope::Failure {
                success: false,
                error: ErrorBody {
                    code: error_code(&failure),
                    status: http_status(&failure),
                    message: failure.message,
                    details,
                },
                meta,
            }
        }
        (false, _, None) => Envelope::Failure {
            success: false,
            error: ErrorBody {
                code: "INTERNAL_ERROR".into(),
                message: "operation failed without an error".into(),
                status: 500,
                details: json!({}),
            },
            meta,
        },
    }
}

/// Route-level device id check, applied before the core is invoked.
pub fn validate_device_id(device_id: &str) -> Result<(), ApiResult> {
    if device_id.chars().count() < MIN_DEVICE_ID_LEN {
        return Err(ApiResult::failure(&CoreError::Validation {
            message: format!(
                "Invalid device_id: expected at least {MIN_DEVICE_ID_LEN} characters"
            ),
        }));
    }
    Ok(())
}
