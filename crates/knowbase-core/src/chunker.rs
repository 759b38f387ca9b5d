//! Splits normalized documents into overlapping fixed-size windows.
//!
//! Windows are exact substrings of the source text: each chunk after the
//! first begins with exactly the trailing `overlap` characters of its
//! predecessor, so concatenating a chunk with the non-overlapping
//! remainder of its successor reconstructs the original region.

use crate::types::{Document, DocumentChunk};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Characters repeated from the tail of one chunk at the head of the next.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, overlap: 200 }
    }
}

#[derive(Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(mut config: ChunkingConfig) -> Self {
        // overlap must leave room for forward progress
        config.chunk_size = config.chunk_size.max(1);
        config.overlap = config.overlap.min(config.chunk_size / 2);
        Self { config }
    }

    /// Split one document into chunks, each inheriting the parent's full
    /// metadata. Whitespace-only documents yield no chunks. Every chunk
    /// gets a fresh UUID, so repeated ingestion never reuses identifiers.
    pub fn split(&self, doc: &Document) -> Vec<DocumentChunk> {
        if doc.content.trim().is_empty() {
            return Vec::new();
        }
        let chars: Vec<char> = doc.content.chars().collect();
        let pieces = self.split_chars(&chars);
        let total_chunks = pieces.len();
        pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| DocumentChunk {
                id: Uuid::new_v4().to_string(),
                content,
                meta: doc.meta.clone(),
                chunk_index,
                total_chunks,
            })
            .collect()
    }

    fn split_chars(&self, chars: &[char]) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.overlap;
        let mut pieces = Vec::new();
        let mut start = 0usize;
        while start < chars.len() {
            let hard_end = (start + size).min(chars.len());
            let end = if hard_end < chars.len() {
                break_point(chars, start, hard_end)
            } else {
                hard_end
            };
            let piece: String = chars[start..end].iter().collect();
            if !piece.trim().is_empty() {
                pieces.push(piece);
            }
            if end >= chars.len() {
                break;
            }
            start = end.saturating_sub(overlap).max(start + 1);
        }
        pieces
    }
}

/// Pick a break position in `(lo, hi]`, trying separators in priority
/// order: paragraph break, line break, space. Only the back half of the
/// window is searched so no chunk degenerates below half the target size;
/// with no separator there, the hard boundary wins.
fn break_point(chars: &[char], lo: usize, hi: usize) -> usize {
    let floor = lo + (hi - lo) / 2;
    for i in (floor..hi.saturating_sub(1)).rev() {
        if chars[i] == '\n' && chars[i + 1] == '\n' {
            return i + 2;
        }
    }
    for i in (floor..hi).rev() {
        if chars[i] == '\n' {
            return i + 1;
        }
    }
    for i in (floor..hi).rev() {
        if chars[i] == ' ' {
            return i + 1;
        }
    }
    hi
}
