//! Per-repository OID mapping.
//!
//! Walks every selected checkout of one clone, extracting the OIDs its
//! pointer stubs declare, and persists the result as the repository's
//! manifest. Relies on the LFS filter being inert (see [`crate::git`]):
//! the stubs themselves are the input, never the pointed-to content.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use tracing::{debug, info};

use crate::git::GitRepo;
use crate::manifest::{FullManifest, Manifest};
use crate::oid::Oid;
use crate::refs::select_refs;
use crate::scanner::{scan_checkout, ScanOutcome, SkipReason};
use crate::Result;

/// Maps one repository's LFS OIDs across its selected refs.
pub struct OidMapper {
    repo: GitRepo,
    map_dir: PathBuf,
    owner: String,
    repository: String,
    branch_pattern: String,
    full_map: bool,
}

impl OidMapper {
    pub fn new(
        repo: GitRepo,
        map_dir: PathBuf,
        owner: impl Into<String>,
        repository: impl Into<String>,
        branch_pattern: impl Into<String>,
        full_map: bool,
    ) -> Self {
        OidMapper {
            repo,
            map_dir,
            owner: owner.into(),
            repository: repository.into(),
            branch_pattern: branch_pattern.into(),
            full_map,
        }
    }

    fn key(&self) -> String {
        format!("{}/{}", self.owner, self.repository)
    }

    /// Scan every selected checkout and write the manifest(s).
    ///
    /// Checkouts run strictly in selection order on the shared working
    /// tree; each one is checked out, fetched, and hard-reset before
    /// scanning so no state from the previous checkout survives.
    pub fn execute(&self) -> Result<()> {
        let refs = select_refs(&self.repo, &self.branch_pattern)?;
        if refs.is_empty() {
            info!("no checkouts selected for {}", self.key());
        } else {
            info!("{} checkouts to attempt for {}", refs.len(), self.key());
        }

        let mut oids: BTreeSet<Oid> = BTreeSet::new();
        let mut checkouts: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for name in refs.iter() {
            self.scan_one(name, &mut oids, &mut checkouts)?;
        }

        self.write_maps(&oids, checkouts)
    }

    fn scan_one(
        &self,
        name: &str,
        oids: &mut BTreeSet<Oid>,
        checkouts: &mut BTreeMap<String, BTreeMap<String, String>>,
    ) -> Result<()> {
        debug!("checking out/fetching '{}'", name);
        self.repo.checkout(name)?;
        self.repo.fetch()?;
        self.repo.reset_hard()?;

        let Some(scans) = scan_checkout(self.repo.dir())? else {
            debug!(
                "no .gitattributes file for checkout '{}' -- nothing to check",
                name
            );
            return Ok(());
        };
        if scans.is_empty() {
            debug!("no LFS files managed in checkout '{}' -- nothing to check", name);
            return Ok(());
        }

        let entry = checkouts.entry(name.to_string()).or_default();
        for scan in scans {
            let path = scan.path.to_string_lossy().into_owned();
            match scan.outcome {
                ScanOutcome::Resolved(oid) => {
                    debug!("oid '{}' @ [{}] -> {}", oid, name, path);
                    entry.insert(path, oid.as_str().to_string());
                    oids.insert(oid);
                }
                // Symlinks are never recorded anywhere.
                ScanOutcome::Skipped(SkipReason::Symlink) => {}
                // Kept with an empty OID so "known absent" stays visible
                // in full-detail output.
                ScanOutcome::Skipped(_) => {
                    entry.insert(path, String::new());
                }
            }
        }
        Ok(())
    }

    fn write_maps(
        &self,
        oids: &BTreeSet<Oid>,
        checkouts: BTreeMap<String, BTreeMap<String, String>>,
    ) -> Result<()> {
        let mut manifest = Manifest::new();
        manifest.0.entry(self.key()).or_default();
        for oid in oids {
            manifest.insert(&self.key(), oid.bare());
        }
        let path = self
            .map_dir
            .join(Manifest::file_name(&self.owner, &self.repository));
        manifest.save(&path)?;
        info!("wrote {} oids to {}", oids.len(), path.display());

        if !self.full_map {
            return Ok(());
        }
        let mut full = FullManifest::default();
        full.0.insert(self.key(), checkouts);
        let path = self
            .map_dir
            .join(FullManifest::file_name(&self.owner, &self.repository));
        full.save(&path)?;
        debug!("wrote full map to {}", path.display());
        Ok(())
    }
}
