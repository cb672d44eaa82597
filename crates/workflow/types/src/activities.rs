//! Activity payloads
//!
//! Requests are built by orchestrators and handed to the scheduler as JSON;
//! responses come back the same way. Every request carries its own
//! observability properties so the receiving activity can continue the trace.

use crate::request::impl_workflow_request;
use crate::{
    ActivityResponse, BlobStorageInfo, ObservabilityProperties, StorageLocation, Validate,
    ValidationResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value a secret lookup returns when the secret does not exist
pub const SECRET_NOT_FOUND: &str = "<secret-not-found>";

/// Soft failure name reported for [`SECRET_NOT_FOUND`]
pub const SECRET_NOT_FOUND_FAILURE: &str = "secret-not-found";

// ── Secrets ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetSecretRequest {
    pub secret_name: String,
    #[serde(
        rename = "observableProperties",
        skip_serializing_if = "ObservabilityProperties::is_empty"
    )]
    pub observability: ObservabilityProperties,
}

impl GetSecretRequest {
    pub fn new(secret_name: impl Into<String>) -> Self {
        Self {
            secret_name: secret_name.into(),
            observability: ObservabilityProperties::new(),
        }
    }
}

impl Validate for GetSecretRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.require(!self.secret_name.trim().is_empty(), "secret name is missing.");
        result
    }
}

/// A secret as returned by the secret store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretValue {
    pub name: String,
    pub value: String,
}

impl SecretValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Sentinel returned instead of an error when the store has no such secret
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::new(name, SECRET_NOT_FOUND)
    }

    pub fn is_not_found(&self) -> bool {
        self.value == SECRET_NOT_FOUND
    }
}

impl ActivityResponse for SecretValue {
    fn soft_failure(&self) -> Option<&'static str> {
        self.is_not_found().then_some(SECRET_NOT_FOUND_FAILURE)
    }
}

// ── Blobs ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WriteBlobRequest {
    pub target: BlobStorageInfo,
    pub content: String,
    #[serde(
        rename = "observableProperties",
        skip_serializing_if = "ObservabilityProperties::is_empty"
    )]
    pub observability: ObservabilityProperties,
}

impl WriteBlobRequest {
    pub fn new(target: BlobStorageInfo, content: impl Into<String>) -> Self {
        Self {
            target,
            content: content.into(),
            observability: ObservabilityProperties::new(),
        }
    }
}

impl Validate for WriteBlobRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.merge(Some(&self.target.validate()), "Target");
        result
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CopyBlobRequest {
    pub source: BlobStorageInfo,
    pub target: BlobStorageInfo,
    #[serde(
        rename = "observableProperties",
        skip_serializing_if = "ObservabilityProperties::is_empty"
    )]
    pub observability: ObservabilityProperties,
}

impl CopyBlobRequest {
    pub fn new(source: BlobStorageInfo, target: BlobStorageInfo) -> Self {
        Self {
            source,
            target,
            observability: ObservabilityProperties::new(),
        }
    }
}

impl Validate for CopyBlobRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result
            .merge(Some(&self.source.validate()), "Source")
            .merge(Some(&self.target.validate()), "Target");
        if self.source == self.target {
            result.add_error_message("source and target are the same blob.");
        }
        result
    }
}

/// Acknowledgement of a blob write or copy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobWriteResponse {
    pub blob_uri: String,
    pub bytes_written: u64,
}

impl ActivityResponse for BlobWriteResponse {
    fn is_empty(&self) -> bool {
        self.blob_uri.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadBlobRequest {
    pub source: BlobStorageInfo,
    #[serde(
        rename = "observableProperties",
        skip_serializing_if = "ObservabilityProperties::is_empty"
    )]
    pub observability: ObservabilityProperties,
}

impl ReadBlobRequest {
    pub fn new(source: BlobStorageInfo) -> Self {
        Self {
            source,
            observability: ObservabilityProperties::new(),
        }
    }
}

impl Validate for ReadBlobRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.merge(Some(&self.source.validate()), "Source");
        result
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobContent {
    pub content: String,
}

impl ActivityResponse for BlobContent {
    fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

// ── AI Services ──────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateEmbeddingRequest {
    pub text: String,
    pub model: String,
    #[serde(
        rename = "observableProperties",
        skip_serializing_if = "ObservabilityProperties::is_empty"
    )]
    pub observability: ObservabilityProperties,
}

impl GenerateEmbeddingRequest {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            observability: ObservabilityProperties::new(),
        }
    }
}

impl Validate for GenerateEmbeddingRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result
            .require(!self.text.trim().is_empty(), "text to embed is empty.")
            .require(!self.model.trim().is_empty(), "embedding model is missing.");
        result
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Embedding {
    pub vector: Vec<f32>,
}

impl Embedding {
    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

impl ActivityResponse for Embedding {
    fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeDocumentRequest {
    pub source: BlobStorageInfo,
    pub model_id: String,
    #[serde(
        rename = "observableProperties",
        skip_serializing_if = "ObservabilityProperties::is_empty"
    )]
    pub observability: ObservabilityProperties,
}

impl AnalyzeDocumentRequest {
    pub fn new(source: BlobStorageInfo, model_id: impl Into<String>) -> Self {
        Self {
            source,
            model_id: model_id.into(),
            observability: ObservabilityProperties::new(),
        }
    }
}

impl Validate for AnalyzeDocumentRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.require(!self.model_id.trim().is_empty(), "analysis model id is missing.");
        result.merge(Some(&self.source.validate()), "Source");
        result
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentAnalysis {
    pub pages: u32,
    pub content: String,
    pub key_value_pairs: BTreeMap<String, String>,
}

impl ActivityResponse for DocumentAnalysis {
    fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

// ── Listing And Conversion ───────────────────────────────────────────

/// Request for one page of a server-side listing
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListItemsRequest {
    pub location: StorageLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
    pub page_size: i64,
    #[serde(
        rename = "observableProperties",
        skip_serializing_if = "ObservabilityProperties::is_empty"
    )]
    pub observability: ObservabilityProperties,
}

impl ListItemsRequest {
    pub fn new(
        location: StorageLocation,
        continuation_token: Option<String>,
        page_size: i64,
    ) -> Self {
        Self {
            location,
            continuation_token,
            page_size,
            observability: ObservabilityProperties::new(),
        }
    }
}

impl Validate for ListItemsRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        if self.page_size <= 0 {
            result.add_error_message(format!(
                "page size must be positive, got {}.",
                self.page_size
            ));
        }
        result.merge(Some(&self.location.validate()), "Location");
        result
    }
}

/// One page of item names plus the token for the next page
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemPage {
    pub item_names: Vec<String>,
    /// Absent on the last page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

impl ItemPage {
    pub fn is_last(&self) -> bool {
        self.continuation_token.is_none()
    }
}

impl ActivityResponse for ItemPage {}

/// Position in a paged listing together with the page it produced
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationCursor {
    /// Token the page was requested with; absent for the first page
    pub continuation_token: Option<String>,
    pub page_size: i64,
    pub item_names: Vec<String>,
}

/// One page worth of conversion work
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompoundConversionRequest {
    pub source_location: StorageLocation,
    pub destination_location: StorageLocation,
    pub item_names: Vec<String>,
    #[serde(
        rename = "observableProperties",
        skip_serializing_if = "ObservabilityProperties::is_empty"
    )]
    pub observability: ObservabilityProperties,
}

impl CompoundConversionRequest {
    pub fn new(
        source_location: StorageLocation,
        destination_location: StorageLocation,
        item_names: Vec<String>,
    ) -> Self {
        Self {
            source_location,
            destination_location,
            item_names,
            observability: ObservabilityProperties::new(),
        }
    }
}

impl Validate for CompoundConversionRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.require(!self.item_names.is_empty(), "no items to convert.");
        result
            .merge(Some(&self.source_location.validate()), "SourceLocation")
            .merge(Some(&self.destination_location.validate()), "DestinationLocation");
        result
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionReport {
    pub converted: Vec<String>,
}

impl ActivityResponse for ConversionReport {}

impl_workflow_request!(
    GetSecretRequest,
    WriteBlobRequest,
    CopyBlobRequest,
    ReadBlobRequest,
    GenerateEmbeddingRequest,
    AnalyzeDocumentRequest,
    ListItemsRequest,
    CompoundConversionRequest,
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_secret_sentinel_is_soft_failure() {
        let found = SecretValue::new("a", "s3cr3t");
        assert_eq!(found.soft_failure(), None);

        let missing = SecretValue::not_found("a");
        assert!(missing.is_not_found());
        assert_eq!(missing.soft_failure(), Some(SECRET_NOT_FOUND_FAILURE));
        assert!(!missing.is_empty());
    }

    #[test]
    fn test_copy_rejects_same_blob() {
        let blob = BlobStorageInfo::new("data", "a.csv").with_storage_account("acct");
        let result = CopyBlobRequest::new(blob.clone(), blob).validate();
        assert!(!result.is_valid());
        assert_eq!(result.messages()[0].text, "source and target are the same blob.");
    }

    #[test]
    fn test_empty_responses() {
        assert!(BlobContent { content: "  ".into() }.is_empty());
        assert!(Embedding { vector: vec![] }.is_empty());
        assert!(DocumentAnalysis::default().is_empty());
        assert!(!ItemPage::default().is_empty());
    }

    #[test]
    fn test_list_items_page_size() {
        let result = ListItemsRequest::new(StorageLocation::new("raw"), None, 0).validate();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_compound_request_needs_items() {
        let request = CompoundConversionRequest::new(
            StorageLocation::new("raw"),
            StorageLocation::new("curated"),
            vec![],
        );
        assert_eq!(request.validate().error_count(), 1);
    }

    #[test]
    fn test_item_page_wire_format() {
        let page: ItemPage =
            serde_json::from_value(json!({ "itemNames": ["x", "y"], "continuationToken": "A" }))
                .unwrap();
        assert!(!page.is_last());
        let last: ItemPage = serde_json::from_value(json!({ "itemNames": [] })).unwrap();
        assert!(last.is_last());
    }
}
