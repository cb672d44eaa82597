//! In-memory stand-ins for the external services behind each capability

#![allow(dead_code)]

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use workflow_engine::{ActivityRegistry, EngineConfig, WorkflowHost};
use workflow_types::{
    ActivityError, AnalyzeDocumentRequest, BlobContent, BlobWriteResponse,
    CompoundConversionRequest, ConversionReport, CopyBlobRequest, DocumentAnalysis, Embedding,
    GenerateEmbeddingRequest, GetSecretRequest, ItemPage, ListItemsRequest, ReadBlobRequest,
    SecretValue, WriteBlobRequest,
};

/// Fake services plus a log of every capability that actually ran
#[derive(Clone, Default)]
pub struct Fixture {
    secrets: BTreeMap<String, String>,
    blobs: Arc<Mutex<BTreeMap<String, String>>>,
    /// Listing pages keyed by the continuation token that requests them; "" is the first page
    listing: BTreeMap<String, ItemPage>,
    failing_items: BTreeSet<String>,
    calls: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: &str, value: &str) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }

    pub fn with_blob(self, path: &str, content: &str) -> Self {
        self.blobs.lock().insert(path.into(), content.into());
        self
    }

    pub fn with_page(mut self, requested_by: &str, items: &[&str], next: Option<&str>) -> Self {
        self.listing.insert(
            requested_by.into(),
            ItemPage {
                item_names: items.iter().map(|s| s.to_string()).collect(),
                continuation_token: next.map(str::to_string),
            },
        );
        self
    }

    pub fn failing_on(mut self, item: &str) -> Self {
        self.failing_items.insert(item.into());
        self
    }

    pub fn blob(&self, path: &str) -> Option<String> {
        self.blobs.lock().get(path).cloned()
    }

    /// Capability names in execution order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, capability: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == capability).count()
    }

    /// Serialized requests as the activities received them
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().clone()
    }

    pub fn host(&self) -> WorkflowHost {
        WorkflowHost::with_builtin_workflows(Arc::new(self.registry()), &EngineConfig::default())
    }

    pub fn registry(&self) -> ActivityRegistry {
        let mut registry = ActivityRegistry::new();

        let this = self.clone();
        registry.register_fn("GetSecret", move |req: GetSecretRequest| {
            this.log("GetSecret", &req);
            let found = this.secrets.get(&req.secret_name).cloned();
            async move {
                Ok::<_, ActivityError>(match found {
                    Some(value) => SecretValue::new(req.secret_name, value),
                    None => SecretValue::not_found(req.secret_name),
                })
            }
        });

        let this = self.clone();
        registry.register_fn("WriteBlob", move |req: WriteBlobRequest| {
            this.log("WriteBlob", &req);
            let path = req.target.path();
            let bytes_written = req.content.len() as u64;
            this.blobs.lock().insert(path.clone(), req.content);
            async move {
                Ok::<_, ActivityError>(BlobWriteResponse {
                    blob_uri: format!("memory://{}", path),
                    bytes_written,
                })
            }
        });

        let this = self.clone();
        registry.register_fn("CopyBlob", move |req: CopyBlobRequest| {
            this.log("CopyBlob", &req);
            let source = req.source.path();
            let target = req.target.path();
            let mut blobs = this.blobs.lock();
            let outcome = match blobs.get(&source).cloned() {
                Some(content) => {
                    let bytes_written = content.len() as u64;
                    blobs.insert(target.clone(), content);
                    Ok(BlobWriteResponse {
                        blob_uri: format!("memory://{}", target),
                        bytes_written,
                    })
                }
                None => Err(ActivityError::failed(
                    "CopyBlob",
                    format!("blob '{}' not found", source),
                )),
            };
            async move { outcome }
        });

        let this = self.clone();
        registry.register_fn("ReadBlob", move |req: ReadBlobRequest| {
            this.log("ReadBlob", &req);
            let path = req.source.path();
            let outcome = match this.blob(&path) {
                Some(content) => Ok(BlobContent { content }),
                None => Err(ActivityError::failed(
                    "ReadBlob",
                    format!("blob '{}' not found", path),
                )),
            };
            async move { outcome }
        });

        let this = self.clone();
        registry.register_fn("GenerateEmbedding", move |req: GenerateEmbeddingRequest| {
            this.log("GenerateEmbedding", &req);
            let words = req.text.split_whitespace().count() as f32;
            let chars = req.text.chars().count() as f32;
            async move {
                Ok::<_, ActivityError>(Embedding {
                    vector: vec![words, chars, 1.0],
                })
            }
        });

        let this = self.clone();
        registry.register_fn("AnalyzeDocument", move |req: AnalyzeDocumentRequest| {
            this.log("AnalyzeDocument", &req);
            let outcome = match this.blob(&req.source.path()) {
                Some(content) => Ok(DocumentAnalysis {
                    pages: 1,
                    content: content.to_uppercase(),
                    key_value_pairs: BTreeMap::from([("model".to_string(), req.model_id.clone())]),
                }),
                None => Err(ActivityError::failed("AnalyzeDocument", "document not found")),
            };
            async move { outcome }
        });

        let this = self.clone();
        registry.register_fn("ListItems", move |req: ListItemsRequest| {
            this.log("ListItems", &req);
            let token = req.continuation_token.clone().unwrap_or_default();
            let outcome = this.listing.get(&token).cloned().ok_or_else(|| {
                ActivityError::failed(
                    "ListItems",
                    format!("unknown continuation token '{}'", token),
                )
            });
            async move { outcome }
        });

        let this = self.clone();
        registry.register_fn("ConvertToParquet", move |req: CompoundConversionRequest| {
            this.log("ConvertToParquet", &req);
            let failing = req
                .item_names
                .iter()
                .find(|item| this.failing_items.contains(*item))
                .cloned();
            async move {
                match failing {
                    Some(item) => Err(ActivityError::failed(
                        "ConvertToParquet",
                        format!("'{}' is not a valid CSV file", item),
                    )),
                    None => Ok(ConversionReport {
                        converted: req
                            .item_names
                            .iter()
                            .map(|item| format!("{}.parquet", item))
                            .collect(),
                    }),
                }
            }
        });

        registry
    }

    fn log<T: serde::Serialize>(&self, capability: &str, request: &T) {
        self.calls.lock().push(capability.to_string());
        self.requests
            .lock()
            .push(serde_json::to_value(request).unwrap_or(Value::Null));
    }
}

pub fn blob(container: &str, name: &str) -> Value {
    json!({ "containerName": container, "blobName": name })
}
