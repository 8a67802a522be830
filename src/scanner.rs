//! Pointer extraction for one materialized checkout.
//!
//! Every candidate file produces a tagged outcome rather than a
//! provisional map entry, so "skipped and why" is never confused with
//! "not scanned yet".

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::attributes::{locate_attributes_file, AttributeRules};
use crate::oid::Oid;
use crate::Result;

/// Why a candidate file produced no OID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Symlinked content is addressed at its link target's own location
    /// during a different checkout pass, or lies outside the checkout.
    Symlink,
    /// Not valid text; presumed stored directly rather than via LFS.
    Undecodable,
    /// Decoded fine but carries no `oid` record.
    NoRecord,
}

/// Tagged result for one candidate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Resolved(Oid),
    Skipped(SkipReason),
}

/// One scanned candidate, path relative to the checkout root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileScan {
    pub path: PathBuf,
    pub outcome: ScanOutcome,
}

/// Scan one checkout rooted at `root`.
///
/// Returns `Ok(None)` when the checkout has no attributes file at all
/// (not every ref need use LFS). Paths in the result are relative to
/// `root` so that manifests stay identical across working directories.
pub fn scan_checkout(root: &Path) -> Result<Option<Vec<FileScan>>> {
    let Some(attributes) = locate_attributes_file(root)? else {
        return Ok(None);
    };
    let rules = AttributeRules::parse(&attributes)?;
    let files = rules.resolve()?;
    let mut scans = Vec::with_capacity(files.len());
    for path in files {
        let outcome = scan_file(&path)?;
        let rel = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_path_buf();
        scans.push(FileScan { path: rel, outcome });
    }
    Ok(Some(scans))
}

/// Extract the declared OID from one candidate file.
///
/// Only the first `oid <value>` record in the file is authoritative.
pub(crate) fn scan_file(path: &Path) -> Result<ScanOutcome> {
    if fs::symlink_metadata(path)?.file_type().is_symlink() {
        debug!("skipping symlink {}", path.display());
        return Ok(ScanOutcome::Skipped(SkipReason::Symlink));
    }
    let bytes = fs::read(path)?;
    let Ok(text) = std::str::from_utf8(&bytes) else {
        warn!(
            "failed to decode {} as text; skipping (probably stored directly, not in LFS)",
            path.display()
        );
        return Ok(ScanOutcome::Skipped(SkipReason::Undecodable));
    };
    for line in text.lines() {
        let mut fields = line.split_whitespace();
        if fields.next() != Some("oid") {
            continue;
        }
        if let Some(value) = fields.next() {
            debug!("oid '{}' -> {}", value, path.display());
            return Ok(ScanOutcome::Resolved(Oid::new(value)));
        }
    }
    Ok(ScanOutcome::Skipped(SkipReason::NoRecord))
}
