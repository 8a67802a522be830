//! Repository source lists.

use std::fs;
use std::path::Path;

use tracing::warn;
use url::Url;

use crate::{Error, Result};

/// One repository to process, identified by (owner, name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSource {
    pub url: Url,
    pub owner: String,
    pub name: String,
}

impl RepoSource {
    /// Manifest key and store-key prefix for this repository.
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    fn from_url(url: Url) -> Result<RepoSource> {
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();
        let [.., owner, name] = segments.as_slice() else {
            return Err(Error::Validation(format!(
                "repository URL {} lacks owner/name path segments",
                url
            )));
        };
        Ok(RepoSource {
            owner: (*owner).to_string(),
            name: (*name).to_string(),
            url,
        })
    }
}

/// Read a newline-delimited repository URL list.
///
/// `#` starts a trailing comment, blank lines are skipped, and a
/// literal `.git` suffix is stripped. Entries with a non-https scheme
/// are skipped with a warning; syntactically malformed entries are
/// fatal before any I/O begins.
pub fn read_source_list(path: &Path) -> Result<Vec<RepoSource>> {
    parse_source_list(&fs::read_to_string(path)?)
}

pub fn parse_source_list(text: &str) -> Result<Vec<RepoSource>> {
    let mut sources = Vec::new();
    for line in text.lines() {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let line = line.trim();
        let line = line.strip_suffix(".git").unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        let url =
            Url::parse(line).map_err(|e| Error::Validation(format!("bad URL '{}': {}", line, e)))?;
        if url.scheme() != "https" {
            warn!(
                "repository URL scheme must be 'https', not {}; skipping {}",
                url.scheme(),
                url
            );
            continue;
        }
        sources.push(RepoSource::from_url(url)?);
    }
    Ok(sources)
}
