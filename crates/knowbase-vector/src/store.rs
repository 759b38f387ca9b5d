use anyhow::{anyhow, Context, Result};
use futures::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{connect, Connection, DistanceType};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator,
    StringArray,
};

use knowbase_core::types::{Category, DocMeta, DocType, DocumentChunk, Meta, ScoredContext};

use crate::schema::{build_arrow_schema, EMBEDDING_DIM};

const INSERT_BATCH_SIZE: usize = 1000;

/// Handle to the single chunk table of one knowledge base.
pub struct KnowledgeStore {
    db: Connection,
    table_name: String,
}

impl KnowledgeStore {
    pub async fn open(db_path: &Path, table_name: &str) -> Result<Self> {
        let db = connect(db_path.to_string_lossy().as_ref())
            .execute()
            .await
            .with_context(|| format!("opening vector store at {}", db_path.display()))?;
        Ok(Self { db, table_name: table_name.to_string() })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Persist chunks with their embeddings in insert batches. The table
    /// is created on first write; later writes append.
    pub async fn add_chunks(
        &self,
        chunks: &[DocumentChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<()> {
        if chunks.is_empty() {
            debug!("no chunks to index");
            return Ok(());
        }
        anyhow::ensure!(
            chunks.len() == embeddings.len(),
            "chunks and embeddings length must match"
        );
        info!(chunks = chunks.len(), table = %self.table_name, "indexing chunks");
        let pb = ProgressBar::new(chunks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)")?
                .progress_chars("#>-"),
        );
        for (batch_chunks, batch_vecs) in chunks
            .chunks(INSERT_BATCH_SIZE)
            .zip(embeddings.chunks(INSERT_BATCH_SIZE))
        {
            self.insert_batch(batch_chunks, batch_vecs).await?;
            pb.inc(batch_chunks.len() as u64);
        }
        pb.finish_and_clear();
        info!(chunks = chunks.len(), "indexing complete");
        Ok(())
    }

    async fn insert_batch(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> Result<()> {
        let record_batch = to_record_batch(chunks, embeddings)?;
        let schema = record_batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
        if self.table_exists().await? {
            self.db
                .open_table(&self.table_name)
                .execute()
                .await?
                .add(reader)
                .execute()
                .await?;
        } else {
            self.db.create_table(&self.table_name, reader).execute().await?;
        }
        Ok(())
    }

    /// Nearest-neighbor search by cosine distance, optionally restricted
    /// to one category. With a filter the store fetches `2 * k` rows
    /// before truncating, compensating for filter-then-rank interaction.
    /// Results keep the store's ascending-distance order;
    /// `relevance_score = 1 - distance`, unclamped.
    pub async fn search(
        &self,
        query_vector: Vec<f32>,
        k: usize,
        category: Option<Category>,
    ) -> Result<Vec<ScoredContext>> {
        if k == 0 || !self.table_exists().await? {
            return Ok(Vec::new());
        }
        let table = self.db.open_table(&self.table_name).execute().await?;
        let fetch = if category.is_some() { k * 2 } else { k };
        let mut query = table
            .vector_search(query_vector)?
            .distance_type(DistanceType::Cosine)
            .limit(fetch);
        if let Some(cat) = category {
            query = query.only_if(format!("category = '{}'", cat.as_str()));
        }
        let mut stream = query.execute().await?;
        let mut results = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            results.extend(batch_to_contexts(&batch)?);
        }
        results.truncate(k);
        Ok(results)
    }

    /// Total number of stored chunks; a missing table counts as zero.
    pub async fn count(&self) -> Result<usize> {
        if !self.table_exists().await? {
            return Ok(0);
        }
        let table = self.db.open_table(&self.table_name).execute().await?;
        Ok(table.count_rows(None).await?)
    }

    /// Distinct categories observed in a sample of stored rows, sorted.
    pub async fn categories(&self, sample_limit: usize) -> Result<Vec<String>> {
        if !self.table_exists().await? {
            return Ok(Vec::new());
        }
        let table = self.db.open_table(&self.table_name).execute().await?;
        let mut stream = table
            .query()
            .select(Select::columns(&["category"]))
            .limit(sample_limit)
            .execute()
            .await?;
        let mut seen = BTreeSet::new();
        while let Some(batch) = stream.try_next().await? {
            let col = str_col(&batch, "category")?;
            for i in 0..batch.num_rows() {
                seen.insert(col.value(i).to_string());
            }
        }
        Ok(seen.into_iter().collect())
    }

    async fn table_exists(&self) -> Result<bool> {
        let names = self.db.table_names().execute().await?;
        Ok(names.contains(&self.table_name))
    }
}

fn to_record_batch(chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> Result<RecordBatch> {
    let schema = build_arrow_schema();
    let mut ids = Vec::new();
    let mut sources = Vec::new();
    let mut doc_types = Vec::new();
    let mut categories = Vec::new();
    let mut repos: Vec<Option<String>> = Vec::new();
    let mut repo_urls: Vec<Option<String>> = Vec::new();
    let mut extras = Vec::new();
    let mut contents = Vec::new();
    let mut chunk_indices = Vec::new();
    let mut total_chunks = Vec::new();
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
    for (chunk, vector) in chunks.iter().zip(embeddings.iter()) {
        anyhow::ensure!(
            vector.len() == EMBEDDING_DIM as usize,
            "embedding dim {} does not match schema dim {}",
            vector.len(),
            EMBEDDING_DIM
        );
        ids.push(chunk.id.clone());
        sources.push(chunk.meta.source.clone());
        doc_types.push(chunk.meta.doc_type.as_str().to_string());
        categories.push(chunk.meta.category.as_str().to_string());
        repos.push(chunk.meta.repo.clone());
        repo_urls.push(chunk.meta.repo_url.clone());
        extras.push(serde_json::to_string(&chunk.meta.extra)?);
        contents.push(chunk.content.clone());
        chunk_indices.push(chunk.chunk_index as i32);
        total_chunks.push(chunk.total_chunks as i32);
        vectors.push(Some(vector.iter().map(|&x| Some(x)).collect()));
    }
    let record_batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(sources)),
            Arc::new(StringArray::from(doc_types)),
            Arc::new(StringArray::from(categories)),
            Arc::new(StringArray::from(repos)),
            Arc::new(StringArray::from(repo_urls)),
            Arc::new(StringArray::from(extras)),
            Arc::new(StringArray::from(contents)),
            Arc::new(Int32Array::from(chunk_indices)),
            Arc::new(Int32Array::from(total_chunks)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<
                arrow_array::types::Float32Type,
                _,
                _,
            >(vectors.into_iter(), EMBEDDING_DIM)),
        ],
    )?;
    Ok(record_batch)
}

fn batch_to_contexts(batch: &RecordBatch) -> Result<Vec<ScoredContext>> {
    let contents = str_col(batch, "content")?;
    let sources = str_col(batch, "source")?;
    let doc_types = str_col(batch, "doc_type")?;
    let categories = str_col(batch, "category")?;
    let repos = str_col(batch, "repo")?;
    let repo_urls = str_col(batch, "repo_url")?;
    let extras = str_col(batch, "extra")?;
    let distances = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| anyhow!("_distance column missing from search result"))?;

    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let mut meta = DocMeta::new(
            sources.value(i),
            DocType::parse(doc_types.value(i)),
            Category::parse(categories.value(i)),
        );
        if !repos.is_null(i) {
            meta.repo = Some(repos.value(i).to_string());
        }
        if !repo_urls.is_null(i) {
            meta.repo_url = Some(repo_urls.value(i).to_string());
        }
        meta.extra = serde_json::from_str::<Meta>(extras.value(i)).unwrap_or_default();
        out.push(ScoredContext {
            content: contents.value(i).to_string(),
            meta,
            relevance_score: 1.0 - distances.value(i),
        });
    }
    Ok(out)
}

fn str_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("column '{name}' missing or not utf8"))
}
