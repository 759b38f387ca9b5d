//! Document normalization: turn heterogeneous inputs (PDF, DOCX,
//! markdown, plain/config text, git repositories) into uniform
//! category-tagged [`Document`]s ready for chunking and embedding.
//!
//! A decode failure is always scoped to the file that caused it: the
//! directory and repository walks log the failure and continue, so one
//! corrupt file never blocks the rest of a batch.

pub mod category;
pub mod formats;
pub mod repo;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use knowbase_core::error::Error;
use knowbase_core::types::Document;

/// Maximum size for repository config files; larger blobs are usually
/// generated artifacts and only pollute the embedding space.
const REPO_CONFIG_MAX_BYTES: u64 = 50_000;

const REPO_CONFIG_EXTENSIONS: &[&str] = &["yml", "yaml", "json", "toml", "cfg"];

pub struct Normalizer {
    repos_dir: PathBuf,
}

impl Normalizer {
    /// `repos_dir` is where repository checkouts are kept between runs.
    pub fn new(repos_dir: impl Into<PathBuf>) -> Self {
        Self { repos_dir: repos_dir.into() }
    }

    /// Decode one file into a `Document`, dispatching on its extension.
    pub fn normalize_file(&self, path: &Path) -> Result<Document> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => formats::read_pdf(path),
            "docx" | "doc" => formats::read_docx(path),
            "md" => formats::read_markdown(path),
            "txt" | "yaml" | "yml" | "json" => formats::read_text(path),
            other => Err(Error::UnsupportedFormat(format!(
                "{} ({})",
                path.display(),
                if other.is_empty() { "no extension" } else { other }
            ))
            .into()),
        }
    }

    /// Recursively normalize every supported file under `dir`. Files that
    /// fail to decode are logged and skipped; unsupported files are
    /// ignored silently.
    pub fn process_directory(&self, dir: &Path) -> Result<Vec<Document>> {
        anyhow::ensure!(dir.is_dir(), "not a directory: {}", dir.display());
        let mut documents = Vec::new();
        let mut skipped = 0usize;
        for entry in WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if !is_supported(path) {
                continue;
            }
            match self.normalize_file(path) {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    skipped += 1;
                    warn!(file = %path.display(), error = %e, "skipping file");
                }
            }
        }
        info!(
            dir = %dir.display(),
            documents = documents.len(),
            skipped,
            "directory normalized"
        );
        Ok(documents)
    }

    /// Clone-or-update a repository, then normalize every markdown file
    /// in it plus every small config file. All resulting documents carry
    /// the repository name and source URL.
    pub fn process_repository(&self, url: &str) -> Result<Vec<Document>> {
        let name = repo::repo_name_from_url(url);
        let dest = self.repos_dir.join(&name);
        std::fs::create_dir_all(&self.repos_dir)
            .with_context(|| format!("creating {}", self.repos_dir.display()))?;
        repo::clone_or_update(url, &dest)?;

        let mut documents = Vec::new();
        for entry in WalkDir::new(&dest)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_lowercase)
                .unwrap_or_default();

            let decoded = if ext == "md" {
                Some(formats::read_markdown(path))
            } else if REPO_CONFIG_EXTENSIONS.contains(&ext.as_str()) {
                match entry.metadata() {
                    Ok(m) if m.len() < REPO_CONFIG_MAX_BYTES => Some(formats::read_text(path)),
                    _ => None,
                }
            } else {
                None
            };

            match decoded {
                Some(Ok(mut doc)) => {
                    doc.meta.repo = Some(name.clone());
                    doc.meta.repo_url = Some(url.to_string());
                    if ext != "md" {
                        doc.meta
                            .extra
                            .insert("file_type".to_string(), "configuration".to_string());
                    }
                    documents.push(doc);
                }
                Some(Err(e)) => warn!(file = %path.display(), error = %e, "skipping repository file"),
                None => {}
            }
        }
        info!(repo = %name, documents = documents.len(), "repository normalized");
        Ok(documents)
    }
}

fn is_supported(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref(),
        Some("pdf" | "docx" | "doc" | "md" | "txt" | "yaml" | "yml" | "json")
    )
}
