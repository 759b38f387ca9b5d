//! Retrieval and answer composition over the embedded knowledge base.

pub mod responder;
pub mod service;
pub mod stats;

pub use service::{
    IngestReport, KbStatus, KnowledgeBaseInfo, KnowledgeService, QueryOptions, QueryResponse,
};
pub use stats::{QueryStats, StatsSnapshot};
