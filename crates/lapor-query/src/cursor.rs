// SPDX-License-Identifier: Apache-2.0

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

use lapor_model::TimeField;
use lapor_store::ResumePoint;

type HmacSha256 = Hmac<Sha256>;

const CURSOR_VERSION_V1: &str = "v1";
pub const MAX_CURSOR_TOKEN_LEN: usize = 1024;
const MAX_CURSOR_PAYLOAD_PART_LEN: usize = 768;
const MAX_CURSOR_SIG_PART_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CursorErrorCode {
    InvalidFormat,
    UnsupportedVersion,
    InvalidSignature,
    InvalidPayload,
    OrderMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorError {
    pub code: CursorErrorCode,
    pub message: String,
}

impl CursorError {
    #[must_use]
    pub fn new(code: CursorErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CursorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for CursorError {}

/// The signed resume token payload.
///
/// The token pins the time field that produced it: a cursor minted under one
/// ordering must never resume a query under another, so the engine adopts
/// `time_field` instead of re-probing whenever a cursor is supplied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CursorPayload {
    #[serde(default = "cursor_version_v1")]
    pub cursor_version: String,
    pub time_field: String,
    /// Time-field value of the last raw document examined, matching or not.
    pub last_time: Value,
    pub last_id: String,
}

fn cursor_version_v1() -> String {
    CURSOR_VERSION_V1.to_string()
}

impl CursorPayload {
    #[must_use]
    pub fn from_resume(time_field: TimeField, resume: &ResumePoint) -> Self {
        Self {
            cursor_version: cursor_version_v1(),
            time_field: time_field.as_str().to_string(),
            last_time: resume
                .value_for(time_field.as_str())
                .cloned()
                .unwrap_or(Value::Null),
            last_id: resume.doc_id.clone(),
        }
    }

    /// The time field this cursor was minted under. Infallible after
    /// [`decode_cursor`], which rejects unknown field names.
    #[must_use]
    pub fn pinned_time_field(&self) -> Option<TimeField> {
        TimeField::from_field_name(&self.time_field)
    }

    #[must_use]
    pub fn resume_point(&self) -> ResumePoint {
        ResumePoint {
            order_values: vec![(self.time_field.clone(), self.last_time.clone())],
            doc_id: self.last_id.clone(),
        }
    }
}

pub fn encode_cursor(payload: &CursorPayload, secret: &[u8]) -> Result<String, CursorError> {
    let payload_bytes = serde_json::to_vec(payload)
        .map_err(|e| CursorError::new(CursorErrorCode::InvalidPayload, e.to_string()))?;
    let payload_part = URL_SAFE_NO_PAD.encode(payload_bytes);
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| CursorError::new(CursorErrorCode::InvalidSignature, e.to_string()))?;
    mac.update(payload_part.as_bytes());
    let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{payload_part}.{sig_part}"))
}

pub fn decode_cursor(token: &str, secret: &[u8]) -> Result<CursorPayload, CursorError> {
    if token.len() > MAX_CURSOR_TOKEN_LEN {
        return Err(CursorError::new(
            CursorErrorCode::InvalidFormat,
            "cursor token exceeds maximum length",
        ));
    }
    let (payload_part, sig_part) = token.split_once('.').ok_or_else(|| {
        CursorError::new(CursorErrorCode::InvalidFormat, "invalid cursor format")
    })?;
    if payload_part.len() > MAX_CURSOR_PAYLOAD_PART_LEN || sig_part.len() > MAX_CURSOR_SIG_PART_LEN
    {
        return Err(CursorError::new(
            CursorErrorCode::InvalidFormat,
            "cursor part exceeds maximum length",
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| CursorError::new(CursorErrorCode::InvalidSignature, e.to_string()))?;
    mac.update(payload_part.as_bytes());
    let expected = URL_SAFE_NO_PAD
        .decode(sig_part)
        .map_err(|e| CursorError::new(CursorErrorCode::InvalidFormat, e.to_string()))?;
    mac.verify_slice(&expected)
        .map_err(|_| CursorError::new(CursorErrorCode::InvalidSignature, "cursor signature mismatch"))?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_part)
        .map_err(|e| CursorError::new(CursorErrorCode::InvalidFormat, e.to_string()))?;
    let payload: CursorPayload = serde_json::from_slice(&payload_bytes)
        .map_err(|e| CursorError::new(CursorErrorCode::InvalidPayload, e.to_string()))?;

    if payload.cursor_version != CURSOR_VERSION_V1 {
        return Err(CursorError::new(
            CursorErrorCode::UnsupportedVersion,
            format!("unsupported cursor version {}", payload.cursor_version),
        ));
    }
    if payload.pinned_time_field().is_none() {
        return Err(CursorError::new(
            CursorErrorCode::OrderMismatch,
            format!("cursor pinned to unknown ordering field {}", payload.time_field),
        ));
    }
    Ok(payload)
}
