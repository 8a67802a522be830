//! Manifest documents persisted between the mapping and reconciliation
//! phases.
//!
//! Keeping these on disk rather than in memory is what makes the whole
//! pipeline checkpointable: a crash mid-repository just means that
//! repository's manifest is regenerated on retry.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use globset::Glob;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// `"owner/repo"` → sorted set of bare OID strings.
///
/// Sorted maps and sets keep every write byte-identical for the same
/// inputs, which is what makes re-runs idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(pub BTreeMap<String, BTreeSet<String>>);

impl Manifest {
    pub fn new() -> Self {
        Manifest::default()
    }

    /// Record one bare OID for a repository key.
    pub fn insert(&mut self, repo: &str, oid: &str) {
        self.0
            .entry(repo.to_string())
            .or_default()
            .insert(oid.to_string());
    }

    /// Merge another manifest in; its keys overwrite ours.
    pub fn merge(&mut self, other: Manifest) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Conventional file name for a repository's manifest.
    pub fn file_name(owner: &str, repo: &str) -> String {
        format!("oids--{}--{}.json", owner, repo)
    }

    pub fn load(path: &Path) -> Result<Manifest> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Whole-file write, trailing newline included.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut out, self)?;
        out.write_all(b"\n")?;
        Ok(())
    }

    /// Load and merge every manifest under `dir` whose file name matches
    /// `pattern`. Files merge in name order, so a later match overwrites
    /// an earlier one for the same repository key.
    pub fn load_glob(dir: &Path, pattern: &str) -> Result<Manifest> {
        let matcher = Glob::new(pattern)
            .map_err(|e| Error::Config(format!("bad input glob '{}': {}", pattern, e)))?
            .compile_matcher();
        let mut names: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .map(|name| matcher.is_match(name))
                    .unwrap_or(false)
            })
            .collect();
        names.sort();

        let mut merged = Manifest::new();
        for path in names {
            debug!("loading manifest {}", path.display());
            merged.merge(Manifest::load(&path)?);
        }
        Ok(merged)
    }
}

/// Full-detail map: `"owner/repo"` → checkout → file path → OID.
///
/// OID values here keep their namespace prefix; an empty string marks a
/// candidate that resolved to nothing (undecodable, or no record).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FullManifest(pub BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>);

impl FullManifest {
    /// Conventional file name for a repository's full-detail manifest.
    pub fn file_name(owner: &str, repo: &str) -> String {
        format!("fullmap--{}--{}.json", owner, repo)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut out, self)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_is_identical_and_sorted() {
        let td = TempDir::new().unwrap();
        let mut manifest = Manifest::new();
        manifest.insert("a/b", "zz");
        manifest.insert("a/b", "aa");
        manifest.insert("a/b", "aa"); // duplicates collapse
        let path = td.path().join(Manifest::file_name("a", "b"));
        manifest.save(&path).unwrap();

        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded, manifest);
        let oids: Vec<&String> = loaded.0["a/b"].iter().collect();
        assert_eq!(oids, vec!["aa", "zz"]);

        // Saving again reproduces identical bytes.
        let first = fs::read(&path).unwrap();
        loaded.save(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_file_name_convention() {
        assert_eq!(
            Manifest::file_name("lsst-dm", "milestones"),
            "oids--lsst-dm--milestones.json"
        );
        assert_eq!(
            FullManifest::file_name("lsst-dm", "milestones"),
            "fullmap--lsst-dm--milestones.json"
        );
    }

    #[test]
    fn test_load_glob_merges_and_later_wins() {
        let td = TempDir::new().unwrap();
        let mut first = Manifest::new();
        first.insert("a/b", "old");
        first.save(&td.path().join("oids--a--b.json")).unwrap();

        let mut second = Manifest::new();
        second.insert("a/b", "new");
        second.insert("c/d", "other");
        second.save(&td.path().join("oids--z--late.json")).unwrap();

        fs::write(td.path().join("unrelated.json"), "{}").unwrap();

        let merged = Manifest::load_glob(td.path(), "oids--*.json").unwrap();
        assert_eq!(merged.0.len(), 2);
        assert!(merged.0["a/b"].contains("new"));
        assert!(!merged.0["a/b"].contains("old"));
        assert!(merged.0["c/d"].contains("other"));
    }

    #[test]
    fn test_load_glob_empty_dir() {
        let td = TempDir::new().unwrap();
        let merged = Manifest::load_glob(td.path(), "oids--*.json").unwrap();
        assert!(merged.is_empty());
    }
}
