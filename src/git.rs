//! Thin wrapper over the git command line.
//!
//! The mapping pipeline reads pointer stubs straight out of working
//! trees, so every git invocation runs with `GIT_LFS_SKIP_SMUDGE=1`:
//! even on a host that has the LFS filter installed, a checkout must
//! materialize the stub, never the pointed-to content.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{Error, Result};

/// Handle to one local clone, addressed through `git -C`.
pub struct GitRepo {
    dir: PathBuf,
}

impl GitRepo {
    /// Wrap an existing clone.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        GitRepo {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Clone `url` into `dir` and return a handle to the result.
    pub fn clone(url: &str, dir: &Path) -> Result<GitRepo> {
        let output = Command::new("git")
            .env("GIT_LFS_SKIP_SMUDGE", "1")
            .arg("clone")
            .arg("--quiet")
            .arg(url)
            .arg(dir)
            .output()?;
        if !output.status.success() {
            return Err(Error::Transport(format!(
                "git clone {} failed: {}",
                url,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(GitRepo::open(dir))
    }

    /// The working-tree directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Remote-tracking branch names (`origin/...`), one per line.
    pub fn remote_branches(&self) -> Result<Vec<String>> {
        let out = self.run(&["branch", "-r", "--format=%(refname:short)"])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.ends_with("/HEAD"))
            .map(String::from)
            .collect())
    }

    /// Fetch tags added to the remote after the clone.
    pub fn fetch_tags(&self) -> Result<()> {
        self.run(&["fetch", "--tags"]).map(|_| ())
    }

    /// All local tag names.
    pub fn tags(&self) -> Result<Vec<String>> {
        let out = self.run(&["tag", "-l"])?;
        Ok(out
            .lines()
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    pub fn checkout(&self, name: &str) -> Result<()> {
        self.run(&["checkout", "--quiet", name]).map(|_| ())
    }

    pub fn fetch(&self) -> Result<()> {
        self.run(&["fetch", "--quiet"]).map(|_| ())
    }

    /// Discard any leftovers of a prior checkout step.
    pub fn reset_hard(&self) -> Result<()> {
        self.run(&["reset", "--hard", "--quiet"]).map(|_| ())
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .env("GIT_LFS_SKIP_SMUDGE", "1")
            .arg("-C")
            .arg(&self.dir)
            .args(args)
            .output()?;
        if !output.status.success() {
            return Err(Error::Transport(format!(
                "git {} failed in {}: {}",
                args.join(" "),
                self.dir.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
