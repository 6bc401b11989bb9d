// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

use crate::fields::{CategoryField, TimeField, DATE_FIELD};

pub const ID_MAX_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct ReportId(String);

impl ReportId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if input.is_empty() {
            return Err(ValidationError("report id must not be empty".to_string()));
        }
        if input.trim() != input {
            return Err(ValidationError(
                "report id must not contain leading/trailing whitespace".to_string(),
            ));
        }
        if input.len() > ID_MAX_LEN {
            return Err(ValidationError(format!(
                "report id exceeds max length {ID_MAX_LEN}"
            )));
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ReportId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Workflow stage number.
///
/// Stored as a JSON number by the current writer, but historical writers left
/// numeric strings behind, so extraction is deliberately loose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct StageValue(i64);

impl StageValue {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Extracts a stage from a raw document value: integers, integral floats,
    /// and numeric strings all count.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Some(Self(i));
                }
                n.as_f64().and_then(|f| {
                    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                        Some(Self(f as i64))
                    } else {
                        None
                    }
                })
            }
            Value::String(s) => s.trim().parse::<i64>().ok().map(Self),
            _ => None,
        }
    }
}

impl Display for StageValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for StageValue {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A decoded report document.
///
/// Every field except the id is optional: the engine never rejects a document
/// for missing attributes, it only filters on the ones that are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub stage: Option<StageValue>,
    pub tanggal: Option<String>,
    pub nama: Option<String>,
    pub lokasi: Option<String>,
    pub keterangan: Option<String>,
    /// Raw creation-timestamp value and the field it was found under.
    pub created_at: Option<(TimeField, Value)>,
}

impl Report {
    /// Decodes a raw document, reading the stage from whichever category key
    /// is present and the timestamp from the first known candidate.
    #[must_use]
    pub fn from_fields(id: &str, fields: &Map<String, Value>) -> Self {
        let stage = CategoryField::candidates()
            .into_iter()
            .find_map(|c| fields.get(c.as_str()))
            .and_then(StageValue::from_value);
        let created_at = TimeField::candidates().into_iter().find_map(|candidate| {
            fields
                .get(candidate.as_str())
                .map(|v| (candidate, v.clone()))
        });
        Self {
            id: id.to_string(),
            stage,
            tanggal: fields
                .get(DATE_FIELD)
                .and_then(Value::as_str)
                .map(str::to_string),
            nama: fields.get("nama").and_then(Value::as_str).map(str::to_string),
            lokasi: fields
                .get("lokasi")
                .and_then(Value::as_str)
                .map(str::to_string),
            keterangan: fields
                .get("keterangan")
                .and_then(Value::as_str)
                .map(str::to_string),
            created_at,
        }
    }
}
