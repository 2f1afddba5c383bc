// OpenAPI response types
//
// Every endpoint wraps its payload in `{success, result, code, msg, t, tid}`.
// Fields use `#[serde(default)]` liberally since the platform omits keys
// freely depending on device category and project type.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ── Response envelope ────────────────────────────────────────────────

/// Standard platform response envelope.
///
/// ```json
/// { "success": true, "result": {...}, "t": 1700000000000, "tid": "..." }
/// { "success": false, "code": 1010, "msg": "token invalid", "t": 1700000000000 }
/// ```
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
    /// Server timestamp (ms).
    #[serde(default)]
    pub t: Option<i64>,
    /// Trace id.
    #[serde(default)]
    pub tid: Option<String>,
}

// ── Device ───────────────────────────────────────────────────────────

/// One `{code, value}` data point from a device's status array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub code: String,
    pub value: Value,
}

/// One `{code, value}` entry of a command batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub code: String,
    pub value: Value,
}

/// Body of `POST /v1.0/devices/{id}/commands`.
#[derive(Debug, Serialize)]
pub struct CommandBatch<'a> {
    pub commands: &'a [CommandPayload],
}

/// Device object from `GET /v1.0/devices/{id}`.
///
/// Commonly needed fields are modelled; everything else lands in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub online: Option<bool>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    /// Local LAN encryption key. Never re-serialised.
    #[serde(default, skip_serializing)]
    pub local_key: Option<String>,
    /// `null` and absent both decode as empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: Vec<StatusEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
