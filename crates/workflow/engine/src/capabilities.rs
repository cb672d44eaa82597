//! Capability names
//!
//! Stable identifiers the orchestrators schedule by. They double as the step
//! identifiers in result messages.

pub const GET_SECRET: &str = "GetSecret";
pub const WRITE_BLOB: &str = "WriteBlob";
pub const COPY_BLOB: &str = "CopyBlob";
pub const READ_BLOB: &str = "ReadBlob";
pub const GENERATE_EMBEDDING: &str = "GenerateEmbedding";
pub const ANALYZE_DOCUMENT: &str = "AnalyzeDocument";
pub const LIST_ITEMS: &str = "ListItems";
pub const CONVERT_TO_PARQUET: &str = "ConvertToParquet";

/// Every capability the built-in workflows use
pub const ALL: &[&str] = &[
    GET_SECRET,
    WRITE_BLOB,
    COPY_BLOB,
    READ_BLOB,
    GENERATE_EMBEDDING,
    ANALYZE_DOCUMENT,
    LIST_ITEMS,
    CONVERT_TO_PARQUET,
];
