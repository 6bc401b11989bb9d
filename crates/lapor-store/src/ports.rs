// SPDX-License-Identifier: Apache-2.0

//! Narrow contracts toward the out-of-scope collaborators: the submission
//! path that writes report documents and the object storage that holds the
//! photos. The query engine never calls these; they exist so the rest of the
//! product depends on interfaces instead of concrete services.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use lapor_model::ReportId;

use crate::error::StoreError;

/// Stable reference to an uploaded binary object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub path: String,
    pub url: String,
}

#[async_trait]
pub trait ReportSubmitter: Send + Sync {
    /// Persists a new report document and returns its id.
    async fn submit(&self, fields: Map<String, Value>) -> Result<ReportId, StoreError>;
}

#[async_trait]
pub trait ObjectUploader: Send + Sync {
    /// Uploads a binary object and returns a stable reference/URL.
    async fn upload(&self, bytes: &[u8], content_type: &str) -> Result<ObjectRef, StoreError>;
}
