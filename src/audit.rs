//! Main audit orchestration logic

use crate::compliance::classify;
use crate::config::AuditConfig;
use crate::error::Result;
use crate::fetch::PackageFetcher;
use crate::graph::{classify_reachability, DependencyGraph, ReachablePackage, Workspace};
use crate::license::{normalize_license, NormalizedLicense};
use crate::lockfile::NpmLockfile;
use crate::manifest::{read_manifest, Manifest};
use crate::policy::LicensePolicy;
use crate::types::{AuditReport, Bucket, PackageOutcome, PackageResult, SkipReason};
use std::path::Path;
use tracing::{debug, info, warn};

/// Runs license checks over every package reachable from a set of workspaces
#[derive(Debug, Clone, Default)]
pub struct Auditor {
    policy: LicensePolicy,
    relaxed: bool,
}

impl Auditor {
    pub fn new(policy: LicensePolicy) -> Self {
        Self {
            policy,
            relaxed: false,
        }
    }

    /// Build an auditor from a loaded configuration
    pub fn from_config(config: &AuditConfig) -> Result<Self> {
        Ok(Self::new(config.policy()?).relaxed(config.relaxed))
    }

    /// Enable the license-file fallback for packages without usable metadata
    pub fn relaxed(mut self, relaxed: bool) -> Self {
        self.relaxed = relaxed;
        self
    }

    /// Audit every third-party package reachable from `workspaces`.
    ///
    /// Packages are processed one at a time in key order. A package whose
    /// manifest or license cannot be read is recorded as skipped; a fetch
    /// failure aborts the whole run.
    pub async fn audit<G, F>(
        &self,
        project_name: &str,
        workspaces: &[Workspace],
        graph: &G,
        fetcher: &F,
    ) -> Result<AuditReport>
    where
        G: DependencyGraph + ?Sized,
        F: PackageFetcher + ?Sized,
    {
        info!("Starting license audit of '{}'", project_name);

        let packages = classify_reachability(workspaces, graph);
        let dev_only = packages.iter().filter(|p| p.dev_only).count();

        info!(
            "Found {} packages for project '{}' ({} development-only)",
            packages.len(),
            project_name,
            dev_only
        );

        let mut report = AuditReport::new(project_name);
        for package in &packages {
            let outcome = self.process_package(package, fetcher).await?;
            report.record(outcome);
        }

        report.compute_summary(dev_only);

        info!(
            "Audit complete: {} passed, {} failed, {} ignored, {} skipped",
            report.summary.passed,
            report.summary.failed,
            report.summary.ignored,
            report.summary.skipped,
        );

        Ok(report)
    }

    /// Fetch, read and classify a single package
    pub async fn process_package<F>(
        &self,
        package: &ReachablePackage,
        fetcher: &F,
    ) -> Result<PackageOutcome>
    where
        F: PackageFetcher + ?Sized,
    {
        debug!(
            "Processing package: {} (dev_only: {})",
            package.key, package.dev_only
        );

        let files = fetcher.fetch(&package.locator).await?;

        let manifest = match read_manifest(&files).await {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("Skipping {}: could not read manifest: {}", package.key, e);
                return Ok(PackageOutcome::Skipped {
                    key: package.key.clone(),
                    reason: SkipReason::Manifest(e.to_string()),
                });
            }
        };

        let normalized = match normalize_license(&manifest, &files, self.relaxed).await {
            Ok(normalized) => normalized,
            Err(e) => {
                warn!("Skipping {}: could not read license: {}", package.key, e);
                return Ok(PackageOutcome::Skipped {
                    key: package.key.clone(),
                    reason: SkipReason::License(e.to_string()),
                });
            }
        };

        Ok(self.classify_package(package, &manifest, &normalized))
    }

    /// Route a package with a normalized license to its bucket.
    ///
    /// The ignore predicate wins over pass/fail.
    fn classify_package(
        &self,
        package: &ReachablePackage,
        manifest: &Manifest,
        normalized: &NormalizedLicense,
    ) -> PackageOutcome {
        let (value, is_file) = normalized.value();
        let check = classify(value, is_file, self.policy.predicate_for(package.dev_only));

        let result = PackageResult {
            reason: check.reason,
            license: normalized.label().map(String::from),
            repository: manifest.repository_url(),
            homepage: manifest.homepage(),
        };

        let name = package.locator.ident.full_name();
        let bucket = if self.policy.is_ignored(&name, result.license.as_deref()) {
            debug!("Ignoring {}", package.key);
            Bucket::Ignored
        } else if check.pass {
            Bucket::Pass
        } else {
            debug!(
                "{} failed: {}",
                package.key,
                check.reason.map(|r| r.printable()).unwrap_or_default()
            );
            Bucket::Fail
        };

        PackageOutcome::Classified {
            key: package.key.clone(),
            bucket,
            result,
        }
    }
}

/// Audit an npm project installed at `project_path`
pub async fn audit_project(project_path: &Path, config: &AuditConfig) -> Result<AuditReport> {
    info!("Starting audit of project at: {}", project_path.display());

    let auditor = Auditor::from_config(config)?;
    let lockfile = NpmLockfile::load(project_path)?;

    auditor
        .audit(
            lockfile.project_name(),
            lockfile.workspaces(),
            &lockfile,
            &lockfile,
        )
        .await
}
