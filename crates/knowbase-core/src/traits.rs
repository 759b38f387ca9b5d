/// Text-to-vector provider shared identically between the ingestion and
/// query paths. Mixing embedders across the two paths silently breaks
/// relevance scoring, so a store should only ever see one implementation.
pub trait Embedder: Send + Sync {
    /// Output dimensionality of every vector this embedder produces.
    fn dim(&self) -> usize;
    /// Maximum input length in tokens; longer inputs are truncated.
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}
