//! Copying missing objects from the legacy store to the target store.

use std::collections::BTreeSet;
use std::fs;

use tempfile::TempDir;
use tracing::{debug, error, info};

use crate::checker::MissingIndex;
use crate::store::{LegacyStore, ObjectStore};
use crate::Result;

/// Copies each missing object from the legacy layout (`data/<oid>`) to
/// every repository-qualified key that needs it (`<owner>/<repo>/<oid>`).
pub struct Remediator<'a> {
    legacy: &'a dyn LegacyStore,
    target: &'a dyn ObjectStore,
    dry_run: bool,
}

impl<'a> Remediator<'a> {
    pub fn new(legacy: &'a dyn LegacyStore, target: &'a dyn ObjectStore, dry_run: bool) -> Self {
        Remediator {
            legacy,
            target,
            dry_run,
        }
    }

    /// Fetch each missing OID once and upload it everywhere it is needed.
    ///
    /// Each OID is an independent unit of work: a fetch or upload
    /// failure aborts that OID but not the loop. Returns how many OIDs
    /// failed.
    pub fn remediate(&self, missing: &MissingIndex) -> Result<usize> {
        let mut failures = 0;
        for (oid, repos) in &missing.by_oid {
            if let Err(err) = self.remediate_one(oid, repos) {
                error!("remediation failed for oid {}: {}", oid, err);
                failures += 1;
            }
        }
        Ok(failures)
    }

    fn remediate_one(&self, oid: &str, repos: &BTreeSet<String>) -> Result<()> {
        // One download per OID no matter how many repositories share it.
        let scratch = TempDir::new()?;
        debug!(
            "downloading content from bucket {}/data/{}",
            self.legacy.name(),
            oid
        );
        let bytes = self.legacy.download(&format!("data/{}", oid))?;
        let staged = scratch.path().join(oid);
        fs::write(&staged, &bytes)?;
        drop(bytes);

        for repo in repos {
            let key = format!("{}/{}", repo, oid);
            if self.dry_run {
                info!(
                    "dry run: would upload to bucket {}/{}",
                    self.target.name(),
                    key
                );
                continue;
            }
            info!("uploading content to bucket {}/{}", self.target.name(), key);
            let content = fs::read(&staged)?;
            self.target.upload(&key, &content)?;
        }
        Ok(())
    }
}
