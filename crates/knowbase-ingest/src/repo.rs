//! Repository acquisition: clone on first sight, fast-forward to the
//! remote head on every later run, so repeated ingestion picks up new
//! commits instead of re-cloning.

use anyhow::{Context, Result};
use git2::{Repository, ResetType};
use std::path::Path;
use tracing::info;

/// Clone `url` into `dest`, or update the existing checkout by fetching
/// origin and hard-resetting to `FETCH_HEAD`. Idempotent.
pub fn clone_or_update(url: &str, dest: &Path) -> Result<()> {
    if dest.join(".git").exists() {
        info!(path = %dest.display(), "updating existing checkout");
        let repo = Repository::open(dest)
            .with_context(|| format!("opening repository at {}", dest.display()))?;
        let mut remote = repo.find_remote("origin")?;
        remote
            .fetch(&[] as &[&str], None, None)
            .with_context(|| format!("fetching origin for {url}"))?;
        let fetch_head = repo.find_reference("FETCH_HEAD")?;
        let commit = fetch_head.peel_to_commit()?;
        repo.reset(commit.as_object(), ResetType::Hard, None)?;
    } else {
        info!(url, path = %dest.display(), "cloning repository");
        Repository::clone(url, dest).with_context(|| format!("cloning {url}"))?;
    }
    Ok(())
}

/// Repository name derived from the URL's final path segment, without a
/// trailing `.git`.
pub fn repo_name_from_url(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .trim_end_matches(".git")
        .to_string()
}
