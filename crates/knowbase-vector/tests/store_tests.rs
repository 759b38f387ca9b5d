use std::collections::HashMap;

use knowbase_core::types::{Category, DocMeta, DocType, DocumentChunk};
use knowbase_vector::schema::EMBEDDING_DIM;
use knowbase_vector::KnowledgeStore;

fn chunk(id: &str, content: &str, category: Category) -> DocumentChunk {
    let mut meta = DocMeta::new(format!("/tmp/{id}.md"), DocType::Markdown, category);
    meta.extra = HashMap::from([("original_format".to_string(), "markdown".to_string())]);
    DocumentChunk {
        id: id.to_string(),
        content: content.to_string(),
        meta,
        chunk_index: 0,
        total_chunks: 1,
    }
}

/// Unit vector along one axis, so distances between test rows are exact.
fn axis_vector(axis: usize) -> Vec<f32> {
    let mut v = vec![0f32; EMBEDDING_DIM as usize];
    v[axis] = 1.0;
    v
}

#[tokio::test]
async fn empty_store_searches_and_counts_cleanly() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = KnowledgeStore::open(tmp.path(), "knowledge").await?;

    assert_eq!(store.count().await?, 0);
    assert!(store.categories(100).await?.is_empty());
    assert!(store.search(axis_vector(0), 5, None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn add_then_search_returns_nearest_first() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = KnowledgeStore::open(tmp.path(), "knowledge").await?;

    let chunks = vec![
        chunk("a", "rbac policy notes", Category::Security),
        chunk("b", "terraform layout", Category::Infrastructure),
    ];
    let embeddings = vec![axis_vector(0), axis_vector(1)];
    store.add_chunks(&chunks, &embeddings).await?;

    assert_eq!(store.count().await?, 2);

    let hits = store.search(axis_vector(0), 2, None).await?;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].content, "rbac policy notes");
    assert_eq!(hits[0].meta.category, Category::Security);
    // identical vector: cosine distance 0 => relevance 1
    assert!((hits[0].relevance_score - 1.0).abs() < 1e-5);
    assert!(hits[0].relevance_score > hits[1].relevance_score);
    Ok(())
}

#[tokio::test]
async fn category_filter_excludes_closer_chunks_of_other_categories() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = KnowledgeStore::open(tmp.path(), "knowledge").await?;

    // the infrastructure chunk is the exact nearest neighbor of the query
    let chunks = vec![
        chunk("near", "cluster wiring", Category::Infrastructure),
        chunk("far", "pipeline hardening", Category::Security),
    ];
    store
        .add_chunks(&chunks, &[axis_vector(0), axis_vector(1)])
        .await?;

    let hits = store.search(axis_vector(0), 5, Some(Category::Security)).await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].meta.category, Category::Security);
    assert_eq!(hits[0].content, "pipeline hardening");
    Ok(())
}

#[tokio::test]
async fn metadata_round_trips_through_the_store() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = KnowledgeStore::open(tmp.path(), "knowledge").await?;

    let mut c = chunk("tagged", "readme body", Category::ProjectDocumentation);
    c.meta.repo = Some("sample-service".to_string());
    c.meta.repo_url = Some("https://example.com/sample-service.git".to_string());
    store.add_chunks(&[c], &[axis_vector(3)]).await?;

    let hits = store.search(axis_vector(3), 1, None).await?;
    assert_eq!(hits.len(), 1);
    let meta = &hits[0].meta;
    assert_eq!(meta.repo.as_deref(), Some("sample-service"));
    assert_eq!(meta.repo_url.as_deref(), Some("https://example.com/sample-service.git"));
    assert_eq!(meta.doc_type, DocType::Markdown);
    assert_eq!(
        meta.extra.get("original_format").map(String::as_str),
        Some("markdown")
    );
    Ok(())
}

#[tokio::test]
async fn categories_lists_distinct_sorted_labels() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = KnowledgeStore::open(tmp.path(), "knowledge").await?;

    let chunks = vec![
        chunk("s1", "one", Category::Security),
        chunk("s2", "two", Category::Security),
        chunk("c1", "three", Category::Cicd),
    ];
    store
        .add_chunks(&chunks, &[axis_vector(0), axis_vector(1), axis_vector(2)])
        .await?;

    let cats = store.categories(100).await?;
    assert_eq!(cats, vec!["cicd".to_string(), "security".to_string()]);
    Ok(())
}
