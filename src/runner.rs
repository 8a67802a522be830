//! The multi-repository drive loop.
//!
//! Deliberately thin: clone, map, dispose, next. All interesting state
//! lives in the per-repository mapper; a failure in one repository is
//! logged and never aborts the run.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use tracing::{error, info};

use crate::git::GitRepo;
use crate::mapper::OidMapper;
use crate::sources::{read_source_list, RepoSource};
use crate::Result;

pub struct Runner {
    input_file: PathBuf,
    map_dir: PathBuf,
    branch_pattern: String,
    full_map: bool,
}

impl Runner {
    pub fn new(
        input_file: PathBuf,
        map_dir: PathBuf,
        branch_pattern: impl Into<String>,
        full_map: bool,
    ) -> Self {
        Runner {
            input_file,
            map_dir,
            branch_pattern: branch_pattern.into(),
            full_map,
        }
    }

    /// Clone and map every repository in the source list.
    ///
    /// Returns how many repositories failed.
    pub fn map_all(&self) -> Result<usize> {
        let sources = read_source_list(&self.input_file)?;
        info!("{} repositories to map", sources.len());
        let mut failures = 0;
        for source in sources {
            if let Err(err) = self.map_one(&source) {
                error!("mapping failed for {}: {}", source.key(), err);
                failures += 1;
            }
        }
        Ok(failures)
    }

    fn map_one(&self, source: &RepoSource) -> Result<()> {
        // The working directory is scoped to this repository and removed
        // on every exit path when the TempDir drops.
        let workdir = TempDir::new()?;
        let target = workdir.path().join(&source.owner).join(&source.name);
        fs::create_dir_all(&target)?;
        let repo = GitRepo::clone(source.url.as_str(), &target)?;
        OidMapper::new(
            repo,
            self.map_dir.clone(),
            source.owner.clone(),
            source.name.clone(),
            self.branch_pattern.clone(),
            self.full_map,
        )
        .execute()
    }
}
