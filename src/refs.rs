//! Checkout selection for one repository.

use regex::Regex;
use tracing::debug;

use crate::git::GitRepo;
use crate::{Error, Result};

const ORIGIN: &str = "origin/";

/// The refs chosen for scanning: branches first, then tags.
///
/// A name cannot be both a branch and a tag in this model, so no
/// deduplication happens across the two lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedRefs {
    pub branches: Vec<String>,
    pub tags: Vec<String>,
}

impl SelectedRefs {
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty() && self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.branches.len() + self.tags.len()
    }

    /// Checkout names in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.branches
            .iter()
            .chain(self.tags.iter())
            .map(String::as_str)
    }
}

/// Choose the branches and tags of `repo` to inspect.
///
/// `main` and `master` are always taken when present; other remote
/// branches are taken when their name matches `branch_pattern` anchored
/// at the start. Tags are fetched first (they may have been added after
/// the clone) and all of them are taken.
pub fn select_refs(repo: &GitRepo, branch_pattern: &str) -> Result<SelectedRefs> {
    let branches = select_branch_names(&repo.remote_branches()?, branch_pattern)?;
    debug!("selected branches: {:?}", branches);
    repo.fetch_tags()?;
    let tags = repo.tags()?;
    debug!("tags: {:?}", tags);
    Ok(SelectedRefs { branches, tags })
}

/// Branch filtering over remote-tracking names, split out for testing.
pub(crate) fn select_branch_names(remote: &[String], pattern: &str) -> Result<Vec<String>> {
    let anchored = Regex::new(&format!("^{}{}", ORIGIN, pattern))
        .map_err(|e| Error::Validation(format!("bad branch pattern '{}': {}", pattern, e)))?;
    Ok(remote
        .iter()
        .filter(|name| {
            name.as_str() == "origin/main"
                || name.as_str() == "origin/master"
                || anchored.is_match(name)
        })
        .filter_map(|name| name.strip_prefix(ORIGIN))
        .map(String::from)
        .collect())
}
