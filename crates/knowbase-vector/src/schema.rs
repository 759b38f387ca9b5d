use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Fixed dimensionality of stored vectors. Must match the embedder used
/// on both the ingestion and query paths.
pub const EMBEDDING_DIM: i32 = 384;

/// Arrow schema of the chunk table. Metadata that has no dedicated
/// column travels in `extra` as a JSON object.
pub fn build_arrow_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("doc_type", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("repo", DataType::Utf8, true),
        Field::new("repo_url", DataType::Utf8, true),
        Field::new("extra", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("chunk_index", DataType::Int32, false),
        Field::new("total_chunks", DataType::Int32, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                EMBEDDING_DIM,
            ),
            true,
        ),
    ]))
}
