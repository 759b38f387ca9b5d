//! Domain types shared by the ingestion, embedding and retrieval crates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type ChunkId = String;
pub type Meta = HashMap<String, String>;

/// Coarse topical label assigned to a document by filename heuristics and
/// inherited unchanged by all of its chunks. Enables filtered retrieval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Security,
    Cicd,
    Infrastructure,
    AiEngineering,
    CloudCertification,
    ProfessionalProfile,
    ProjectDocumentation,
    General,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Security => "security",
            Category::Cicd => "cicd",
            Category::Infrastructure => "infrastructure",
            Category::AiEngineering => "ai_engineering",
            Category::CloudCertification => "cloud_certification",
            Category::ProfessionalProfile => "professional_profile",
            Category::ProjectDocumentation => "project_documentation",
            Category::General => "general",
        }
    }

    /// Parse the snake_case form back into a `Category`. Unknown labels
    /// map to `General` so stale store rows never fail a read.
    pub fn parse(s: &str) -> Self {
        match s {
            "security" => Category::Security,
            "cicd" => Category::Cicd,
            "infrastructure" => Category::Infrastructure,
            "ai_engineering" => Category::AiEngineering,
            "cloud_certification" => Category::CloudCertification,
            "professional_profile" => Category::ProfessionalProfile,
            "project_documentation" => Category::ProjectDocumentation,
            _ => Category::General,
        }
    }

    /// Human-readable form used in answer headers, e.g. "Ai Engineering".
    pub fn title(self) -> String {
        self.as_str()
            .split('_')
            .map(|w| {
                let mut cs = w.chars();
                match cs.next() {
                    Some(c) => c.to_uppercase().chain(cs).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The input format a document was decoded from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Pdf,
    Docx,
    Markdown,
    Text,
}

impl DocType {
    /// Parse the persisted label; unknown labels fall back to `Text`.
    pub fn parse(s: &str) -> Self {
        match s {
            "pdf" => DocType::Pdf,
            "docx" => DocType::Docx,
            "markdown" => DocType::Markdown,
            _ => DocType::Text,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocType::Pdf => "pdf",
            DocType::Docx => "docx",
            DocType::Markdown => "markdown",
            DocType::Text => "text",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata attached to a normalized document and inherited by its chunks.
///
/// `extra` carries format-specific fields such as `pages`, `paragraphs`,
/// `original_format` or `file_type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocMeta {
    pub source: String,
    pub doc_type: DocType,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub extra: Meta,
}

impl DocMeta {
    pub fn new(source: impl Into<String>, doc_type: DocType, category: Category) -> Self {
        Self {
            source: source.into(),
            doc_type,
            category,
            repo: None,
            repo_url: None,
            extra: Meta::new(),
        }
    }

    /// Final path component of `source`, used when labeling answer sources.
    pub fn file_name(&self) -> &str {
        self.source
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.source.as_str())
    }
}

/// A normalized unit of text produced from one input file or repository
/// artifact. Immutable after creation; consumed by the chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub meta: DocMeta,
}

impl Document {
    pub fn new(content: impl Into<String>, meta: DocMeta) -> Self {
        Self { content: content.into(), meta }
    }
}

/// A bounded-size slice of a document's text, the unit actually embedded
/// and searched. Adjacent chunks of one document share an overlap window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub content: String,
    pub meta: DocMeta,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// One retrieved chunk with its derived relevance.
///
/// `relevance_score` is `1 - distance` for the store's cosine distance
/// (range [0, 2]), so scores can fall below 0 for dissimilar chunks; the
/// value is deliberately left unclamped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredContext {
    pub content: String,
    pub meta: DocMeta,
    pub relevance_score: f32,
}
