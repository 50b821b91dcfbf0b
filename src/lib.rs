//! # license_audit
//!
//! License compliance auditing for npm-style projects:
//! - **Reachability**: tag every resolved package as production or development-only
//! - **Normalization**: reconcile modern and legacy `package.json` license fields,
//!   with an optional fallback to `LICENSE` files
//! - **Compliance**: check each license against pluggable predicates
//! - **Aggregation**: partition findings into pass / fail / ignored buckets
//! - **Reporting**: JUnit XML, CSV, JSON and a terminal summary
//!
//! ## Quick Start
//!
//! ```no_run
//! use license_audit::{audit_project, AuditConfig};
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = AuditConfig::default();
//! let report = audit_project(Path::new("."), &config).await?;
//!
//! for (key, result) in report.results.fail.entries() {
//!     println!("{}: {:?}", key, result.reason);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Custom graphs and package stores plug in through [`DependencyGraph`] and
//! [`PackageFetcher`]; custom policies are plain closures wrapped in
//! [`LicensePolicy`].

mod audit;
mod compliance;
mod config;
mod error;
mod fetch;
mod graph;
mod license;
mod lockfile;
mod manifest;
mod policy;
pub mod report;
mod result_map;
mod types;

// Re-export public API
pub use audit::{audit_project, Auditor};
pub use compliance::{classify, is_missing};
pub use config::{
    find_config, load_config, AuditConfig, AuditConfigBuilder, IgnoreConfig, LicenseRuleConfig,
    DEFAULT_CONFIG_FILE,
};
pub use error::{AuditError, Result};
pub use fetch::{DirectoryFiles, PackageFetcher, PackageFiles};
pub use graph::{classify_reachability, DependencyGraph, ReachablePackage, Workspace};
pub use license::{normalize_license, parse_license_field, NormalizedLicense};
pub use lockfile::{NpmLockfile, LOCKFILE_NAME};
pub use manifest::{read_manifest, Manifest, MANIFEST_FILE};
pub use policy::{IgnoreRule, LicensePolicy, LicensePredicate, LicenseRule, PackageIgnorePredicate};
pub use result_map::{Merge, ResultMap};
pub use types::{
    AuditReport, AuditSummary, Bucket, Descriptor, FailureReason, Ident, LicenseCheck,
    LicenseResults, Locator, PackageKey, PackageOutcome, PackageResult, SkipReason,
    SkippedPackage,
};
