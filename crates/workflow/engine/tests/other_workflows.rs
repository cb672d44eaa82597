mod common;

use common::{blob, Fixture};
use serde_json::json;
use workflow_types::RunState;

#[tokio::test]
async fn test_blob_copy() {
    let fixture = Fixture::new().with_blob("raw/report.csv", "a,b\n1,2\n");
    let host = fixture.host();

    let output = host
        .run(
            "BlobCopy",
            json!({
                "sourceBlobStorageInfo": blob("raw", "report.csv"),
                "targetBlobStorageInfo": blob("archive", "report.csv")
            }),
        )
        .await
        .unwrap();

    assert!(output.is_completed());
    assert_eq!(
        output.results,
        vec![
            "CopyBlob::Copied 8 bytes to 'memory://archive/report.csv'.",
            "BlobCopy::Blob 'raw/report.csv' copied to 'archive/report.csv'.",
        ]
    );
    assert_eq!(fixture.blob("archive/report.csv").as_deref(), Some("a,b\n1,2\n"));
}

#[tokio::test]
async fn test_blob_copy_missing_source_terminates() {
    let fixture = Fixture::new();
    let host = fixture.host();

    let output = host
        .run(
            "BlobCopy",
            json!({
                "sourceBlobStorageInfo": blob("raw", "gone.csv"),
                "targetBlobStorageInfo": blob("archive", "gone.csv")
            }),
        )
        .await
        .unwrap();

    assert_eq!(output.state, RunState::TerminatedWithErrors);
    assert_eq!(
        output.results,
        vec!["CopyBlob::CopyBlob failed: blob 'raw/gone.csv' not found"]
    );
}

#[tokio::test]
async fn test_embedding() {
    let fixture = Fixture::new().with_blob("docs/intro.txt", "hello durable world");
    let host = fixture.host();

    let output = host
        .run(
            "Embedding",
            json!({
                "sourceBlobStorageInfo": blob("docs", "intro.txt"),
                "targetBlobStorageInfo": blob("vectors", "intro.json"),
                "model": "text-embedding-small"
            }),
        )
        .await
        .unwrap();

    assert!(output.is_completed());
    assert_eq!(fixture.calls(), vec!["ReadBlob", "GenerateEmbedding", "WriteBlob"]);
    assert_eq!(fixture.blob("vectors/intro.json").as_deref(), Some("[3.0,19.0,1.0]"));
    assert_eq!(
        output.results,
        vec![
            "ReadBlob::Read 19 characters from 'docs/intro.txt'.",
            "GenerateEmbedding::Generated a 3-dimension embedding with 'text-embedding-small'.",
            "Embedding::Embedding of 'docs/intro.txt' written to blob 'vectors/intro.json'.",
        ]
    );
}

#[tokio::test]
async fn test_embedding_of_blank_text_terminates() {
    let fixture = Fixture::new().with_blob("docs/blank.txt", "   ");
    let host = fixture.host();

    let output = host
        .run(
            "Embedding",
            json!({
                "sourceBlobStorageInfo": blob("docs", "blank.txt"),
                "targetBlobStorageInfo": blob("vectors", "blank.json"),
                "model": "text-embedding-small"
            }),
        )
        .await
        .unwrap();

    assert_eq!(output.state, RunState::TerminatedWithErrors);
    assert_eq!(
        output.results,
        vec!["ReadBlob::ReadBlob returned an empty result."]
    );
    assert_eq!(fixture.calls_to("GenerateEmbedding"), 0);
}

#[tokio::test]
async fn test_embedding_requires_model() {
    let fixture = Fixture::new();
    let host = fixture.host();

    let output = host
        .run(
            "Embedding",
            json!({
                "sourceBlobStorageInfo": blob("docs", "intro.txt"),
                "targetBlobStorageInfo": blob("vectors", "intro.json")
            }),
        )
        .await
        .unwrap();

    assert_eq!(
        output.results,
        vec!["ValidateRequest::embedding model is missing."]
    );
}

#[tokio::test]
async fn test_document_analysis() {
    let fixture = Fixture::new().with_blob("inbox/invoice.pdf", "total due 42");
    let host = fixture.host();

    let output = host
        .run(
            "DocumentAnalysis",
            json!({
                "sourceBlobStorageInfo": blob("inbox", "invoice.pdf"),
                "targetBlobStorageInfo": blob("extracted", "invoice.txt"),
                "modelId": "prebuilt-invoice"
            }),
        )
        .await
        .unwrap();

    assert!(output.is_completed());
    assert_eq!(fixture.blob("extracted/invoice.txt").as_deref(), Some("TOTAL DUE 42"));
    assert_eq!(
        output.results,
        vec![
            "AnalyzeDocument::Analyzed 1 page(s) with 'prebuilt-invoice', 1 field(s) extracted.",
            "DocumentAnalysis::Analysis of 'inbox/invoice.pdf' written to blob 'extracted/invoice.txt'.",
        ]
    );
}

#[tokio::test]
async fn test_undecodable_input() {
    let fixture = Fixture::new();
    let host = fixture.host();

    let output = host
        .run("DocumentAnalysis", json!({ "modelId": ["not", "a", "string"] }))
        .await
        .unwrap();

    assert_eq!(output.state, RunState::TerminatedWithErrors);
    assert_eq!(output.results.len(), 1);
    assert!(output.results[0].starts_with("ValidateRequest::request could not be decoded"));
    assert!(fixture.calls().is_empty());
}
