//! Reconciliation tests over persisted manifests and in-memory stores.

use std::cell::RefCell;
use std::collections::BTreeSet;

use tempfile::TempDir;

use lfs_reconcile::{
    Manifest, MissingIndex, ObjectStore, ReconciliationChecker, Remediator, Result,
};

/// Target store fake: a set of present keys plus a probe log.
struct FakeTarget {
    present: BTreeSet<String>,
    probes: RefCell<Vec<String>>,
    uploads: RefCell<Vec<String>>,
}

impl FakeTarget {
    fn with(present: &[&str]) -> Self {
        FakeTarget {
            present: present.iter().map(|s| s.to_string()).collect(),
            probes: RefCell::new(Vec::new()),
            uploads: RefCell::new(Vec::new()),
        }
    }
}

impl ObjectStore for FakeTarget {
    fn exists(&self, key: &str) -> Result<bool> {
        self.probes.borrow_mut().push(key.to_string());
        Ok(self.present.contains(key))
    }

    fn upload(&self, key: &str, _bytes: &[u8]) -> Result<()> {
        self.uploads.borrow_mut().push(key.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "target"
    }
}

struct FakeLegacy {
    downloads: RefCell<Vec<String>>,
}

impl lfs_reconcile::LegacyStore for FakeLegacy {
    fn download(&self, key: &str) -> Result<Vec<u8>> {
        self.downloads.borrow_mut().push(key.to_string());
        Ok(b"object bytes".to_vec())
    }

    fn name(&self) -> &str {
        "legacy"
    }
}

fn write_manifest(dir: &TempDir, owner: &str, repo: &str, oids: &[&str]) {
    let mut manifest = Manifest::new();
    for oid in oids {
        manifest.insert(&format!("{}/{}", owner, repo), oid);
    }
    manifest
        .save(&dir.path().join(Manifest::file_name(owner, repo)))
        .unwrap();
}

#[test]
fn test_missing_detection_builds_both_indices() {
    let td = TempDir::new().unwrap();
    write_manifest(&td, "a", "b", &["oid1", "oid2"]);

    let target = FakeTarget::with(&["a/b/oid1"]);
    let missing = ReconciliationChecker::new(td.path().to_path_buf(), "oids--*.json", &target)
        .check()
        .unwrap();

    assert_eq!(missing.by_repo.len(), 1);
    assert!(missing.by_repo["a/b"].contains("oid2"));
    assert!(!missing.by_repo["a/b"].contains("oid1"));
    assert!(missing.by_oid["oid2"].contains("a/b"));
}

#[test]
fn test_every_pair_is_probed_before_anything_else() {
    let td = TempDir::new().unwrap();
    write_manifest(&td, "a", "b", &["oid1", "oid2"]);
    write_manifest(&td, "c", "d", &["oid1"]);

    let target = FakeTarget::with(&[]);
    let missing = ReconciliationChecker::new(td.path().to_path_buf(), "oids--*.json", &target)
        .check()
        .unwrap();

    let probes = target.probes.borrow();
    assert_eq!(probes.len(), 3);
    assert!(probes.contains(&"a/b/oid1".to_string()));
    assert!(probes.contains(&"c/d/oid1".to_string()));
    // Uniqueness is per-value, not per-repository: the same OID in two
    // repositories is two distinct pairs.
    assert_eq!(missing.by_oid["oid1"].len(), 2);
}

#[test]
fn test_nothing_missing_means_empty_index() {
    let td = TempDir::new().unwrap();
    write_manifest(&td, "a", "b", &["oid1"]);

    let target = FakeTarget::with(&["a/b/oid1"]);
    let missing = ReconciliationChecker::new(td.path().to_path_buf(), "oids--*.json", &target)
        .check()
        .unwrap();
    assert!(missing.is_empty());
}

#[test]
fn test_checkpoint_file_round_trip() {
    // The missing set persists in the manifest schema, so it can feed a
    // retry without rerunning detection.
    let td = TempDir::new().unwrap();
    let mut missing = MissingIndex::default();
    missing.insert("a/b", "oid2");
    missing.insert("c/d", "oid2");

    let path = td.path().join("remediate.json");
    missing.to_manifest().save(&path).unwrap();

    let reloaded = MissingIndex::from_manifest(&Manifest::load(&path).unwrap());
    assert_eq!(reloaded, missing);
}

#[test]
fn test_checkpoint_doubles_as_manifest_input() {
    let td = TempDir::new().unwrap();
    let mut missing = MissingIndex::default();
    missing.insert("a/b", "oid1");
    missing
        .to_manifest()
        .save(&td.path().join("oids--a--b.json"))
        .unwrap();

    let target = FakeTarget::with(&[]);
    let rechecked = ReconciliationChecker::new(td.path().to_path_buf(), "oids--*.json", &target)
        .check()
        .unwrap();
    assert_eq!(rechecked, missing);
}

#[test]
fn test_detect_then_remediate_through_checkpoint() {
    let td = TempDir::new().unwrap();
    write_manifest(&td, "a", "b", &["oid9"]);
    write_manifest(&td, "c", "d", &["oid9"]);

    let target = FakeTarget::with(&[]);
    let missing = ReconciliationChecker::new(td.path().to_path_buf(), "oids--*.json", &target)
        .check()
        .unwrap();

    let legacy = FakeLegacy {
        downloads: RefCell::new(Vec::new()),
    };
    let failures = Remediator::new(&legacy, &target, false)
        .remediate(&missing)
        .unwrap();

    assert_eq!(failures, 0);
    // One fetch for the shared OID, one upload per repository needing it.
    assert_eq!(legacy.downloads.borrow().as_slice(), ["data/oid9"]);
    let uploads = target.uploads.borrow();
    assert_eq!(uploads.as_slice(), ["a/b/oid9", "c/d/oid9"]);
}
