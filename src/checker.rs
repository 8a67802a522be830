//! Reconciliation of persisted manifests against the target store.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::manifest::Manifest;
use crate::store::ObjectStore;
use crate::Result;

/// The missing-object index, built only after a full existence probe of
/// every (repository, OID) pair. Both directions are kept: remediation
/// iterates by OID, reporting reads by repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingIndex {
    pub by_repo: BTreeMap<String, BTreeSet<String>>,
    pub by_oid: BTreeMap<String, BTreeSet<String>>,
}

impl MissingIndex {
    pub fn is_empty(&self) -> bool {
        self.by_repo.is_empty()
    }

    pub fn insert(&mut self, repo: &str, oid: &str) {
        self.by_repo
            .entry(repo.to_string())
            .or_default()
            .insert(oid.to_string());
        self.by_oid
            .entry(oid.to_string())
            .or_default()
            .insert(repo.to_string());
    }

    /// Manifest-schema view of the missing set, used for both the stdout
    /// report and the remediation checkpoint file.
    pub fn to_manifest(&self) -> Manifest {
        let mut manifest = Manifest::new();
        for (repo, oids) in &self.by_repo {
            for oid in oids {
                manifest.insert(repo, oid);
            }
        }
        manifest
    }

    /// Rebuild both directions from a manifest-schema document, the
    /// checkpoint-resume path that skips probing entirely.
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let mut index = MissingIndex::default();
        for (repo, oids) in &manifest.0 {
            for oid in oids {
                index.insert(repo, oid);
            }
        }
        index
    }
}

/// Probes the target store for every recorded (repository, OID) pair.
pub struct ReconciliationChecker<'a> {
    map_dir: PathBuf,
    input_glob: String,
    store: &'a dyn ObjectStore,
}

impl<'a> ReconciliationChecker<'a> {
    pub fn new(map_dir: PathBuf, input_glob: impl Into<String>, store: &'a dyn ObjectStore) -> Self {
        ReconciliationChecker {
            map_dir,
            input_glob: input_glob.into(),
            store,
        }
    }

    /// Load every matching manifest and probe each pair.
    ///
    /// A probe failure propagates: the index is only meaningful when
    /// every pair has actually been checked.
    pub fn check(&self) -> Result<MissingIndex> {
        let manifests = Manifest::load_glob(&self.map_dir, &self.input_glob)?;
        let mut missing = MissingIndex::default();
        for (repo, oids) in &manifests.0 {
            info!("checking {} objects for repo {}", oids.len(), repo);
            for oid in oids {
                let key = format!("{}/{}", repo, oid);
                debug!("checking bucket {} for object {}", self.store.name(), key);
                if !self.store.exists(&key)? {
                    warn!("bucket {} is missing object {}", self.store.name(), key);
                    missing.insert(repo, oid);
                }
            }
        }
        Ok(missing)
    }
}

/// Report the missing set to standard output as sorted JSON.
pub fn report(missing: &MissingIndex) -> Result<()> {
    if missing.is_empty() {
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&missing.to_manifest())?);
    Ok(())
}
