//! Storage descriptors shared by request variants

use crate::{Validate, ValidationResult};
use serde::{Deserialize, Serialize};

const MIN_CONTAINER_NAME_LEN: usize = 3;
const MAX_CONTAINER_NAME_LEN: usize = 63;

/// Address of a single blob
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlobStorageInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_account: Option<String>,
    pub container_name: String,
    pub blob_name: String,
}

impl BlobStorageInfo {
    pub fn new(container_name: impl Into<String>, blob_name: impl Into<String>) -> Self {
        Self {
            storage_account: None,
            container_name: container_name.into(),
            blob_name: blob_name.into(),
        }
    }

    pub fn with_storage_account(mut self, account: impl Into<String>) -> Self {
        self.storage_account = Some(account.into());
        self
    }

    /// `container/blob`
    pub fn path(&self) -> String {
        format!("{}/{}", self.container_name, self.blob_name)
    }
}

impl std::fmt::Display for BlobStorageInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.storage_account {
            Some(account) => write!(f, "{}/{}", account, self.path()),
            None => f.write_str(&self.path()),
        }
    }
}

impl Validate for BlobStorageInfo {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        validate_container_name(&self.container_name, &mut result);
        result.require(!self.blob_name.trim().is_empty(), "blob name is missing.");
        if self.storage_account.is_none() {
            result.add_message("storage account not set, the default account is used.");
        }
        result
    }
}

/// A container plus an optional path prefix, used for bulk listings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageLocation {
    pub container_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
}

impl StorageLocation {
    pub fn new(container_name: impl Into<String>) -> Self {
        Self {
            container_name: container_name.into(),
            path_prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }
}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path_prefix {
            Some(prefix) => write!(f, "{}/{}", self.container_name, prefix),
            None => f.write_str(&self.container_name),
        }
    }
}

impl Validate for StorageLocation {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        validate_container_name(&self.container_name, &mut result);
        result
    }
}

fn validate_container_name(name: &str, result: &mut ValidationResult) {
    if name.trim().is_empty() {
        result.add_error_message("container name is missing.");
        return;
    }

    let well_formed = (MIN_CONTAINER_NAME_LEN..=MAX_CONTAINER_NAME_LEN).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !well_formed {
        result.add_error_message(format!(
            "container name '{}' must be {}-{} lowercase letters, digits or '-'.",
            name, MIN_CONTAINER_NAME_LEN, MAX_CONTAINER_NAME_LEN
        ));
    }
}
