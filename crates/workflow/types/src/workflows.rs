//! Workflow inputs
//!
//! One request type per workflow. Sub-objects are optional on the wire so a
//! missing one is reported as a validation error instead of a decode error.

use crate::request::impl_workflow_request;
use crate::{
    BlobStorageInfo, ObservabilityProperties, StorageLocation, Validate, ValidationResult,
};
use serde::{Deserialize, Serialize};

const SOURCE_BLOB_LABEL: &str = "SourceBlobStorageInfo";
const TARGET_BLOB_LABEL: &str = "TargetBlobStorageInfo";

// ── Secret To Blob ───────────────────────────────────────────────────

/// Copy a named secret into a blob
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecretToBlobRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_blob_storage_info: Option<BlobStorageInfo>,
    #[serde(
        rename = "observableProperties",
        skip_serializing_if = "ObservabilityProperties::is_empty"
    )]
    pub observability: ObservabilityProperties,
}

impl SecretToBlobRequest {
    pub fn new(name: impl Into<String>, target: BlobStorageInfo) -> Self {
        Self {
            name: name.into(),
            target_blob_storage_info: Some(target),
            observability: ObservabilityProperties::new(),
        }
    }
}

impl Validate for SecretToBlobRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result
            .require(!self.name.trim().is_empty(), "secret name is missing.")
            .require(
                self.target_blob_storage_info.is_some(),
                "target blob storage info is missing.",
            );
        let target = self.target_blob_storage_info.as_ref().map(Validate::validate);
        result.merge(target.as_ref(), TARGET_BLOB_LABEL);
        result
    }
}

// ── Blob Copy ────────────────────────────────────────────────────────

/// Copy one blob onto another
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlobCopyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_blob_storage_info: Option<BlobStorageInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_blob_storage_info: Option<BlobStorageInfo>,
    #[serde(
        rename = "observableProperties",
        skip_serializing_if = "ObservabilityProperties::is_empty"
    )]
    pub observability: ObservabilityProperties,
}

impl Validate for BlobCopyRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        validate_blob_pair(
            &mut result,
            self.source_blob_storage_info.as_ref(),
            self.target_blob_storage_info.as_ref(),
        );
        result
    }
}

// ── Embedding ────────────────────────────────────────────────────────

/// Embed the text of one blob and store the vector in another
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_blob_storage_info: Option<BlobStorageInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_blob_storage_info: Option<BlobStorageInfo>,
    pub model: String,
    #[serde(
        rename = "observableProperties",
        skip_serializing_if = "ObservabilityProperties::is_empty"
    )]
    pub observability: ObservabilityProperties,
}

impl Validate for EmbeddingRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.require(!self.model.trim().is_empty(), "embedding model is missing.");
        validate_blob_pair(
            &mut result,
            self.source_blob_storage_info.as_ref(),
            self.target_blob_storage_info.as_ref(),
        );
        result
    }
}

// ── Document Analysis ────────────────────────────────────────────────

/// Run a document-analysis model over one blob and store the extracted text
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentAnalysisRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_blob_storage_info: Option<BlobStorageInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_blob_storage_info: Option<BlobStorageInfo>,
    pub model_id: String,
    #[serde(
        rename = "observableProperties",
        skip_serializing_if = "ObservabilityProperties::is_empty"
    )]
    pub observability: ObservabilityProperties,
}

impl Validate for DocumentAnalysisRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.require(!self.model_id.trim().is_empty(), "analysis model id is missing.");
        validate_blob_pair(
            &mut result,
            self.source_blob_storage_info.as_ref(),
            self.target_blob_storage_info.as_ref(),
        );
        result
    }
}

// ── Parquet Conversion ───────────────────────────────────────────────

/// Convert every item under a location to parquet, one batch per listing page
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParquetConversionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_location: Option<StorageLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_location: Option<StorageLocation>,
    /// Items per listing page; the engine default applies when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    #[serde(
        rename = "observableProperties",
        skip_serializing_if = "ObservabilityProperties::is_empty"
    )]
    pub observability: ObservabilityProperties,
}

impl Validate for ParquetConversionRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result
            .require(self.source_location.is_some(), "source location is missing.")
            .require(
                self.destination_location.is_some(),
                "destination location is missing.",
            );
        if let Some(size) = self.page_size.filter(|size| *size <= 0) {
            result.add_error_message(format!("page size must be positive, got {}.", size));
        }
        let source = self.source_location.as_ref().map(Validate::validate);
        let destination = self.destination_location.as_ref().map(Validate::validate);
        result
            .merge(source.as_ref(), "SourceLocation")
            .merge(destination.as_ref(), "DestinationLocation");
        result
    }
}

impl_workflow_request!(
    SecretToBlobRequest,
    BlobCopyRequest,
    EmbeddingRequest,
    DocumentAnalysisRequest,
    ParquetConversionRequest,
);

fn validate_blob_pair(
    result: &mut ValidationResult,
    source: Option<&BlobStorageInfo>,
    target: Option<&BlobStorageInfo>,
) {
    result
        .require(source.is_some(), "source blob storage info is missing.")
        .require(target.is_some(), "target blob storage info is missing.");
    let source = source.map(Validate::validate);
    let target = target.map(Validate::validate);
    result
        .merge(source.as_ref(), SOURCE_BLOB_LABEL)
        .merge(target.as_ref(), TARGET_BLOB_LABEL);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkflowRequest;
    use serde_json::json;

    #[test]
    fn test_secret_to_blob_missing_target() {
        let request: SecretToBlobRequest =
            serde_json::from_value(json!({ "name": "secretA" })).unwrap();
        let result = request.validate();
        assert!(!result.is_valid());
        assert_eq!(result.messages().len(), 1);
        assert_eq!(result.messages()[0].text, "target blob storage info is missing.");
    }

    #[test]
    fn test_secret_to_blob_nested_errors_are_labelled() {
        let request = SecretToBlobRequest::new("secretA", BlobStorageInfo::new("", "out.txt"));
        let result = request.validate();
        assert!(!result.is_valid());
        assert_eq!(
            result.errors().next().unwrap().text,
            "TargetBlobStorageInfo: container name is missing."
        );
    }

    #[test]
    fn test_blob_copy_reports_every_problem() {
        let result = BlobCopyRequest::default().validate();
        assert_eq!(result.error_count(), 2);
    }

    #[test]
    fn test_embedding_valid() {
        let request: EmbeddingRequest = serde_json::from_value(json!({
            "sourceBlobStorageInfo": {
                "storageAccount": "a",
                "containerName": "docs",
                "blobName": "in.txt"
            },
            "targetBlobStorageInfo": {
                "storageAccount": "a",
                "containerName": "vectors",
                "blobName": "out.json"
            },
            "model": "text-embedding",
        }))
        .unwrap();
        assert!(request.validate().is_valid());
    }

    #[test]
    fn test_document_analysis_requires_model() {
        let request = DocumentAnalysisRequest {
            source_blob_storage_info: Some(BlobStorageInfo::new("docs", "a.pdf")),
            target_blob_storage_info: Some(BlobStorageInfo::new("text", "a.txt")),
            ..Default::default()
        };
        let result = request.validate();
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.messages()[0].text, "analysis model id is missing.");
    }

    #[test]
    fn test_parquet_page_size_must_be_positive() {
        for size in [0, -5] {
            let request = ParquetConversionRequest {
                source_location: Some(StorageLocation::new("raw")),
                destination_location: Some(StorageLocation::new("curated")),
                page_size: Some(size),
                ..Default::default()
            };
            let result = request.validate();
            assert!(!result.is_valid());
            assert!(result.messages()[0].text.starts_with("page size must be positive"));
        }
    }

    #[test]
    fn test_observable_properties_wire_field() {
        let mut request: BlobCopyRequest = serde_json::from_value(json!({
            "observableProperties": { "traceparent": "00-x", "ignored": { "nested": true } },
            "unknownField": 1,
        }))
        .unwrap();
        assert_eq!(
            request.observability_properties().get_str("traceparent"),
            Some("00-x")
        );
        request.observability_properties_mut().remove("ignored");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["observableProperties"], json!({ "traceparent": "00-x" }));
    }
}
