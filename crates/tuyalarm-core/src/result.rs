// ── Boundary result ──
//
// The uniform `(success, payload)` / `(failure, error)` shape handed to
// the route layer. Built from an operation's `Result` in one place.

use serde::Serialize;
use serde_json::Value;
use tuyalarm_api::ErrorKind;

use crate::error::CoreError;

/// Failure half of an [`ApiResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiFailure {
    pub kind: ErrorKind,
    /// Platform code, for `API` failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    pub message: String,
}

impl From<&CoreError> for ApiFailure {
    fn from(err: &CoreError) -> Self {
        Self {
            kind: err.kind(),
            code: err.api_code(),
            message: err.to_string(),
        }
    }
}

/// Exactly one of `payload` / `error` is set, matching `success`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResult {
    pub success: bool,
    pub payload: Option<Value>,
    pub error: Option<ApiFailure>,
}

impl ApiResult {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(err: &CoreError) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(ApiFailure::from(err)),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

impl<T: Serialize> From<Result<T, CoreError>> for ApiResult {
    fn from(result: Result<T, CoreError>) -> Self {
        match result.and_then(|payload| {
            serde_json::to_value(payload).map_err(|e| CoreError::Protocol {
                message: format!("payload could not be serialised: {e}"),
            })
        }) {
            Ok(payload) => Self::ok(payload),
            Err(err) => Self::failure(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn success_carries_payload_only() {
        let result = ApiResult::from(Ok::<_, CoreError>(json!({"ok": 1})));
        assert!(result.success);
        assert_eq!(result.payload, Some(json!({"ok": 1})));
        assert!(result.error.is_none());
    }

    #[test]
    fn failure_carries_kind_and_code() {
        let result = ApiResult::from(Err::<Value, _>(CoreError::Api {
            code: 1010,
            message: "token invalid".into(),
        }));
        assert!(!result.success);
        assert!(result.payload.is_none());
        let error = result.error.unwrap();
        assert_eq!(error.kind, ErrorKind::Api);
        assert_eq!(error.code, Some(1010));
    }

    #[test]
    fn serialised_kind_is_upper_case() {
        let result = ApiResult::failure(&CoreError::Timeout { timeout_secs: 10 });
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["error"]["kind"], "NETWORK");
        assert!(value["error"].get("code").is_none());
    }
}
