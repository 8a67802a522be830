//! # lfs-reconcile
//!
//! Reconciles Git LFS objects across two object stores - a legacy store
//! and a target store - for a fleet of repositories, without an LFS
//! client installed. Operation relies on inspecting the LFS pointer
//! stubs in each checkout rather than downloading the pointed-to
//! content, which is what makes scanning years of weekly release tags
//! feasible.
//!
//! The pipeline has two independent halves:
//! - **Mapping**: walk the selected branches and tags of each cloned
//!   repository, interpret its tracked-attributes rules, extract the
//!   declared OID from every pointer stub, and persist a per-repository
//!   manifest (see [`OidMapper`]).
//! - **Reconciliation**: load persisted manifests, probe the target
//!   store for every (repository, OID) pair, and copy whatever is
//!   missing from the legacy store (see [`ReconciliationChecker`] and
//!   [`Remediator`]).
//!
//! ## Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use lfs_reconcile::{GitRepo, OidMapper};
//!
//! let repo = GitRepo::open("/tmp/clones/acme/widgets");
//! let mapper = OidMapper::new(
//!     repo,
//!     PathBuf::from("/var/lib/lfs-maps"),
//!     "acme",
//!     "widgets",
//!     r"v\d.*",
//!     false,
//! );
//! mapper.execute().unwrap();
//! ```

mod attributes;
mod checker;
mod config;
mod error;
mod git;
mod manifest;
mod mapper;
mod oid;
mod refs;
mod remediator;
mod runner;
mod scanner;
mod sources;
mod store;

pub use attributes::{locate_attributes_file, AttributeRules};
pub use checker::{report, MissingIndex, ReconciliationChecker};
pub use config::Verbosity;
pub use error::{Error, Result};
pub use git::GitRepo;
pub use manifest::{FullManifest, Manifest};
pub use mapper::OidMapper;
pub use oid::Oid;
pub use refs::{select_refs, SelectedRefs};
pub use remediator::Remediator;
pub use runner::Runner;
pub use scanner::{scan_checkout, FileScan, ScanOutcome, SkipReason};
pub use sources::{parse_source_list, read_source_list, RepoSource};
pub use store::{GcsBucket, LegacyStore, ObjectStore, S3Bucket};
