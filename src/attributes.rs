//! Tracked-attributes interpretation.
//!
//! A `.gitattributes` file decides which files a repository hands to the
//! LFS filter. The classifier here is deliberately an ad hoc grammar over
//! the tagged token sequence of each line, not a general attributes
//! parser: the repositories this tool targets only ever use the shapes
//! `git lfs track` emits, plus one variant sentinel (`-crlf`), plus
//! explicit un-tracking lines.
//!
//! Attribute patterns scope to the attributes file's own directory and
//! below, so every glob is resolved with `**/` prepended, rooted there.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;
use walkdir::WalkDir;

use crate::{Error, Result};

/// Trailing sentinel tokens marking a rule as binary, externally filtered.
const RULE_SENTINELS: [&str; 2] = ["-text", "-crlf"];

/// Attribute keys that may be bound to the LFS filter value.
const RULE_KEYS: [&str; 3] = ["filter", "diff", "merge"];

/// Substring marking a line as an exclusion rule.
const EXCLUSION_MARKER: &str = "!filter !diff !merge";

/// Find the single tracked-attributes file of a checkout.
///
/// Returns `Ok(None)` when the checkout has none. More than one is an
/// ambiguous attribute scope this tool does not support.
pub fn locate_attributes_file(root: &Path) -> Result<Option<PathBuf>> {
    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git");
    for entry in walker {
        let entry = entry.map_err(|e| Error::Transport(e.to_string()))?;
        if entry.file_type().is_file() && entry.file_name() == ".gitattributes" {
            found.push(entry.into_path());
        }
    }
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        _ => Err(Error::Config(format!(
            "multiple .gitattributes files found: {:?}",
            found
        ))),
    }
}

/// Does this tokenized line track its glob in LFS?
///
/// The trailing token must be one of the recognized sentinels, and every
/// middle token carrying an assignment must bind one of the recognized
/// keys to `lfs`. A single mismatching key or value invalidates the
/// whole rule; middle tokens without an assignment are ignored.
pub(crate) fn is_lfs_rule(fields: &[&str]) -> bool {
    let Some(last) = fields.last() else {
        return false;
    };
    if !RULE_SENTINELS.contains(last) {
        debug!("{:?} does not end with a recognized sentinel", fields);
        return false;
    }
    let mids = if fields.len() > 2 {
        &fields[1..fields.len() - 1]
    } else {
        &[][..]
    };
    for mid in mids {
        let Some((key, value)) = mid.split_once('=') else {
            continue;
        };
        if !RULE_KEYS.contains(&key) {
            debug!("{} not in {:?}", key, RULE_KEYS);
            return false;
        }
        if value != "lfs" {
            debug!("{} is '{}', not 'lfs'", key, value);
            return false;
        }
    }
    true
}

/// The include and exclude glob sets read from one attributes file.
pub struct AttributeRules {
    dir: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    has_includes: bool,
}

impl AttributeRules {
    /// Interpret one attributes file.
    pub fn parse(attributes_path: &Path) -> Result<Self> {
        let dir = attributes_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let text = fs::read_to_string(attributes_path)?;

        let mut include = GlobSetBuilder::new();
        let mut exclude = GlobSetBuilder::new();
        let mut has_includes = false;
        for line in text.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if line.contains(EXCLUSION_MARKER) {
                debug!("exclusion rule for '{}'", fields[0]);
                exclude.add(compile_glob(fields[0])?);
                continue;
            }
            if is_lfs_rule(&fields) {
                debug!("inclusion rule for '{}'", fields[0]);
                include.add(compile_glob(fields[0])?);
                has_includes = true;
            }
        }

        Ok(AttributeRules {
            dir,
            include: include
                .build()
                .map_err(|e| Error::Config(e.to_string()))?,
            exclude: exclude
                .build()
                .map_err(|e| Error::Config(e.to_string()))?,
            has_includes,
        })
    }

    /// Resolve the effective pointer-file set: everything under the
    /// attributes directory matching an inclusion glob, minus anything
    /// matching an exclusion glob. Exclusion strictly dominates.
    ///
    /// Symlinks are legitimate candidates here; the scanner decides what
    /// to do with them.
    pub fn resolve(&self) -> Result<BTreeSet<PathBuf>> {
        let mut files = BTreeSet::new();
        if !self.has_includes {
            return Ok(files);
        }
        let walker = WalkDir::new(&self.dir)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git");
        for entry in walker {
            let entry = entry.map_err(|e| Error::Transport(e.to_string()))?;
            if entry.file_type().is_dir() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.dir)
                .expect("walked path is under its own root");
            if self.include.is_match(rel) && !self.exclude.is_match(rel) {
                files.insert(entry.into_path());
            }
        }
        debug!("resolved {} pointer-file candidates", files.len());
        Ok(files)
    }
}

/// Compile one attribute pattern, recursive from the attributes directory.
fn compile_glob(pattern: &str) -> Result<globset::Glob> {
    GlobBuilder::new(&format!("**/{}", pattern))
        .literal_separator(true)
        .build()
        .map_err(|e| Error::Config(format!("bad glob '{}': {}", pattern, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fields(line: &str) -> Vec<&str> {
        line.split_whitespace().collect()
    }

    #[test]
    fn test_rule_standard_track_line() {
        assert!(is_lfs_rule(&fields(
            "*.bin filter=lfs diff=lfs merge=lfs -text"
        )));
    }

    #[test]
    fn test_rule_crlf_sentinel() {
        assert!(is_lfs_rule(&fields(
            "*.fits filter=lfs diff=lfs merge=lfs -crlf"
        )));
    }

    #[test]
    fn test_rule_requires_sentinel() {
        assert!(!is_lfs_rule(&fields("*.bin filter=lfs diff=lfs merge=lfs")));
        assert!(!is_lfs_rule(&fields(
            "*.bin filter=lfs diff=lfs merge=lfs text"
        )));
    }

    #[test]
    fn test_rule_bad_key_invalidates() {
        assert!(!is_lfs_rule(&fields(
            "*.bin filter=lfs clean=lfs merge=lfs -text"
        )));
    }

    #[test]
    fn test_rule_bad_value_invalidates() {
        // No partial credit: one wrong binding kills the rule.
        assert!(!is_lfs_rule(&fields(
            "*.bin filter=lfs diff=zip merge=lfs -text"
        )));
    }

    #[test]
    fn test_rule_non_assignment_token_ignored() {
        assert!(is_lfs_rule(&fields("*.bin filter=lfs lockable -text")));
    }

    #[test]
    fn test_rule_empty_line() {
        assert!(!is_lfs_rule(&[]));
    }

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_locate_none() {
        let td = TempDir::new().unwrap();
        assert!(locate_attributes_file(td.path()).unwrap().is_none());
    }

    #[test]
    fn test_locate_nested() {
        let td = TempDir::new().unwrap();
        write(td.path(), "sub/dir/.gitattributes", "*.bin -text\n");
        let found = locate_attributes_file(td.path()).unwrap().unwrap();
        assert!(found.ends_with("sub/dir/.gitattributes"));
    }

    #[test]
    fn test_locate_ambiguous() {
        let td = TempDir::new().unwrap();
        write(td.path(), ".gitattributes", "");
        write(td.path(), "sub/.gitattributes", "");
        match locate_attributes_file(td.path()) {
            Err(Error::Config(_)) => {}
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_recursive_include() {
        let td = TempDir::new().unwrap();
        write(
            td.path(),
            ".gitattributes",
            "*.bin filter=lfs diff=lfs merge=lfs -text\n",
        );
        write(td.path(), "a.bin", "x");
        write(td.path(), "deep/nested/b.bin", "x");
        write(td.path(), "readme.txt", "x");

        let rules = AttributeRules::parse(&td.path().join(".gitattributes")).unwrap();
        let files = rules.resolve().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.contains(&td.path().join("a.bin")));
        assert!(files.contains(&td.path().join("deep/nested/b.bin")));
    }

    #[test]
    fn test_exclusion_dominates_inclusion() {
        let td = TempDir::new().unwrap();
        write(
            td.path(),
            ".gitattributes",
            "*.bin filter=lfs diff=lfs merge=lfs -text\n\
             skipped/*.bin !filter !diff !merge\n",
        );
        write(td.path(), "kept.bin", "x");
        write(td.path(), "skipped/gone.bin", "x");

        let rules = AttributeRules::parse(&td.path().join(".gitattributes")).unwrap();
        let files = rules.resolve().unwrap();
        assert_eq!(files.len(), 1);
        assert!(files.contains(&td.path().join("kept.bin")));
    }

    #[test]
    fn test_resolve_rooted_at_attributes_dir() {
        // A nested attributes file must not see files above its directory.
        let td = TempDir::new().unwrap();
        write(
            td.path(),
            "sub/.gitattributes",
            "*.bin filter=lfs diff=lfs merge=lfs -text\n",
        );
        write(td.path(), "above.bin", "x");
        write(td.path(), "sub/below.bin", "x");

        let rules = AttributeRules::parse(&td.path().join("sub/.gitattributes")).unwrap();
        let files = rules.resolve().unwrap();
        assert_eq!(files.len(), 1);
        assert!(files.contains(&td.path().join("sub/below.bin")));
    }

    #[test]
    fn test_resolve_without_includes_is_empty() {
        let td = TempDir::new().unwrap();
        write(td.path(), ".gitattributes", "*.txt text\n");
        write(td.path(), "a.txt", "x");
        let rules = AttributeRules::parse(&td.path().join(".gitattributes")).unwrap();
        assert!(rules.resolve().unwrap().is_empty());
    }
}
