//! Request and response models of the migration control surface.

use serde::{Deserialize, Serialize};

use crate::pattern::AccessPattern;

/// Everything succeeded.
pub const CODE_OK: i32 = 0;
/// The request was well-formed but had nothing to do (already running, not
/// running). Not an error.
pub const CODE_BENIGN: i32 = 400;
/// The server could not carry out the request.
pub const CODE_SYSTEM_ERROR: i32 = 5;

/// Envelope every control endpoint returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ApiResponse {
    pub fn ok(msg: impl Into<String>) -> Self {
        Self { code: CODE_OK, msg: msg.into(), data: None }
    }

    pub fn ok_with_data(msg: impl Into<String>, data: serde_json::Value) -> Self {
        Self { code: CODE_OK, msg: msg.into(), data: Some(data) }
    }

    pub fn benign(msg: impl Into<String>) -> Self {
        Self { code: CODE_BENIGN, msg: msg.into(), data: None }
    }

    pub fn system_error(msg: impl Into<String>) -> Self {
        Self { code: CODE_SYSTEM_ERROR, msg: msg.into(), data: None }
    }
}

/// Body of `POST /incr/start`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StartIncrRequest {
    /// Update-time watermark; only rows changed after it are scanned.
    pub utime: i64,
    /// Sleep between exhausted scans, in milliseconds. JSON carries plain
    /// integers, so the duration travels as millis.
    pub interval: i64,
}

/// Body of `POST /full/batch/start`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StartBatchRequest {
    pub limit: i64,
}

/// Payload of `GET /status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatus {
    pub pattern: AccessPattern,
    pub full_running: bool,
    pub incr_running: bool,
}
