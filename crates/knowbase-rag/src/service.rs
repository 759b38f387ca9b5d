//! Service facade wiring the chunker, embedder and vector store into the
//! two operations callers use: `ingest` and `query`. One instance is
//! built at process start and shared; calls are stateless beyond the
//! store itself.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use knowbase_core::chunker::{Chunker, ChunkingConfig};
use knowbase_core::traits::Embedder;
use knowbase_core::types::{Category, Document, ScoredContext};
use knowbase_vector::schema::EMBEDDING_DIM;
use knowbase_vector::KnowledgeStore;

use crate::responder;
use crate::stats::{QueryStats, StatsSnapshot};

/// How many stored rows are sampled when listing categories.
const CATEGORY_SAMPLE_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub context_count: usize,
    pub category: Option<Category>,
    pub include_sources: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self { context_count: 5, category: None, include_sources: false }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources_used: usize,
    pub processing_time: Duration,
    /// Populated only when `include_sources` was requested.
    pub contexts: Vec<ScoredContext>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KbStatus {
    Active,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeBaseInfo {
    pub total_chunks: usize,
    pub categories: Vec<String>,
    pub status: KbStatus,
}

pub struct KnowledgeService {
    store: KnowledgeStore,
    embedder: Box<dyn Embedder>,
    chunker: Chunker,
    stats: QueryStats,
}

impl KnowledgeService {
    /// Open (or create) the knowledge base at `db_path`. The embedder
    /// passed here must be the one used for every prior ingestion into
    /// the same store; mixing embedders silently corrupts relevance.
    pub async fn open(
        db_path: &Path,
        table_name: &str,
        embedder: Box<dyn Embedder>,
        chunking: ChunkingConfig,
    ) -> Result<Self> {
        anyhow::ensure!(
            embedder.dim() == EMBEDDING_DIM as usize,
            "embedder dim {} does not match store dim {}",
            embedder.dim(),
            EMBEDDING_DIM
        );
        let store = KnowledgeStore::open(db_path, table_name).await?;
        Ok(Self {
            store,
            embedder,
            chunker: Chunker::new(chunking),
            stats: QueryStats::new(),
        })
    }

    /// Chunk, embed and persist a batch of documents. Duplicate content
    /// is not deduplicated; every chunk gets a fresh id, so re-ingesting
    /// the same corpus stores it again rather than colliding.
    pub async fn ingest(&self, documents: &[Document]) -> Result<IngestReport> {
        let mut chunks = Vec::new();
        for doc in documents {
            chunks.extend(self.chunker.split(doc));
        }
        if chunks.is_empty() {
            info!(documents = documents.len(), "nothing to ingest");
            return Ok(IngestReport { documents: documents.len(), chunks: 0 });
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;
        self.store.add_chunks(&chunks, &embeddings).await?;
        info!(documents = documents.len(), chunks = chunks.len(), "ingest complete");
        Ok(IngestReport { documents: documents.len(), chunks: chunks.len() })
    }

    /// Embed the question and fetch the nearest chunks, optionally
    /// restricted to one category. A blank question or an empty store
    /// yields an empty result, not an error.
    pub async fn retrieve(
        &self,
        question: &str,
        k: usize,
        category: Option<Category>,
    ) -> Result<Vec<ScoredContext>> {
        if question.trim().is_empty() {
            return Ok(Vec::new());
        }
        let query_vector = self
            .embedder
            .embed_batch(&[question.to_string()])?
            .remove(0);
        self.store.search(query_vector, k, category).await
    }

    /// Full question-answering path. Retrieval failures degrade to an
    /// empty context set so the responder always has a defined answer;
    /// latency is recorded in the injected stats aggregator.
    pub async fn query(&self, question: &str, options: &QueryOptions) -> QueryResponse {
        let start = Instant::now();
        let contexts = match self
            .retrieve(question, options.context_count, options.category)
            .await
        {
            Ok(contexts) => contexts,
            Err(e) => {
                warn!(error = %e, "retrieval failed, answering without context");
                Vec::new()
            }
        };
        let answer = responder::compose_answer(question, &contexts);
        let processing_time = start.elapsed();
        self.stats.record(processing_time);
        QueryResponse {
            answer,
            sources_used: contexts.len(),
            processing_time,
            contexts: if options.include_sources { contexts } else { Vec::new() },
        }
    }

    /// Chunk count and observed categories. Store failures degrade to an
    /// empty report with `status: error` instead of propagating.
    pub async fn knowledge_base_info(&self) -> KnowledgeBaseInfo {
        let counted = self.store.count().await;
        let listed = self.store.categories(CATEGORY_SAMPLE_LIMIT).await;
        match (counted, listed) {
            (Ok(total_chunks), Ok(categories)) => KnowledgeBaseInfo {
                total_chunks,
                categories,
                status: KbStatus::Active,
            },
            (count_res, list_res) => {
                if let Err(e) = count_res {
                    warn!(error = %e, "count query failed");
                }
                if let Err(e) = list_res {
                    warn!(error = %e, "category query failed");
                }
                KnowledgeBaseInfo { total_chunks: 0, categories: Vec::new(), status: KbStatus::Error }
            }
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
