//! Core data types for license audit reporting

use crate::result_map::{Merge, ResultMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Package name, optionally scoped (`@scope/name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ident {
    pub scope: Option<String>,
    pub name: String,
}

impl Ident {
    /// Parse a full package name such as `lodash` or `@types/node`
    pub fn parse(full_name: &str) -> Self {
        if let Some(rest) = full_name.strip_prefix('@') {
            if let Some((scope, name)) = rest.split_once('/') {
                return Self {
                    scope: Some(scope.to_string()),
                    name: name.to_string(),
                };
            }
        }
        Self {
            scope: None,
            name: full_name.to_string(),
        }
    }

    /// Full display name, including the scope
    pub fn full_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "@{}/{}", scope, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Unresolved dependency reference: a package name plus the requested range
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Descriptor {
    pub ident: Ident,
    pub range: String,
}

impl Descriptor {
    pub fn new(ident: Ident, range: impl Into<String>) -> Self {
        Self {
            ident,
            range: range.into(),
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ident, self.range)
    }
}

/// Separator introducing parameters in a locator reference
const REFERENCE_PARAMS_SEPARATOR: &str = "::";

/// A resolved, concrete package instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locator {
    pub ident: Ident,
    pub reference: String,
}

impl Locator {
    pub fn new(ident: Ident, reference: impl Into<String>) -> Self {
        Self {
            ident,
            reference: reference.into(),
        }
    }

    /// Stable display key for this package (reference parameters stripped)
    pub fn key(&self) -> PackageKey {
        let reference = self
            .reference
            .split(REFERENCE_PARAMS_SEPARATOR)
            .next()
            .unwrap_or_default();
        PackageKey(format!("{}@{}", self.ident, reference))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ident, self.reference)
    }
}

/// Human-readable identity of a resolved package, used to key results
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageKey(String);

impl PackageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a package failed the audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureReason {
    /// No usable license information was found
    Missing,
    /// A license was found but the policy rejected it
    Incompatible,
}

impl FailureReason {
    /// Sentence shown to humans in reports
    pub fn printable(&self) -> &'static str {
        match self {
            Self::Missing => "License could not be found.",
            Self::Incompatible => "License is incompatible.",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Incompatible => write!(f, "incompatible"),
        }
    }
}

/// Outcome of checking a single license value against a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LicenseCheck {
    pub pass: bool,
    pub reason: Option<FailureReason>,
}

impl LicenseCheck {
    pub fn passed() -> Self {
        Self {
            pass: true,
            reason: None,
        }
    }

    pub fn failed(reason: FailureReason) -> Self {
        Self {
            pass: false,
            reason: Some(reason),
        }
    }
}

/// Per-package finding stored in a result bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageResult {
    /// Set iff the package did not pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    /// Best-known license label for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

impl Merge for PackageResult {
    fn merge(&mut self, other: Self) {
        if other.reason.is_some() {
            self.reason = other.reason;
        }
        if other.license.is_some() {
            self.license = other.license;
        }
        if other.repository.is_some() {
            self.repository = other.repository;
        }
        if other.homepage.is_some() {
            self.homepage = other.homepage;
        }
    }
}

impl PackageResult {
    /// `field: value` pairs for every field that is set
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(reason) = self.reason {
            fields.push(("reason", reason.to_string()));
        }
        if let Some(license) = &self.license {
            fields.push(("license", license.clone()));
        }
        if let Some(repository) = &self.repository {
            fields.push(("repository", repository.clone()));
        }
        if let Some(homepage) = &self.homepage {
            fields.push(("homepage", homepage.clone()));
        }
        fields
    }
}

/// The three result buckets, ordered by routing precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Pass,
    Fail,
    Ignored,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
            Self::Ignored => write!(f, "ignored"),
        }
    }
}

/// Why a package was left out of every bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "message", rename_all = "lowercase")]
pub enum SkipReason {
    /// The package manifest could not be read or parsed
    Manifest(String),
    /// License extraction failed after the manifest was read
    License(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manifest(msg) => write!(f, "manifest: {}", msg),
            Self::License(msg) => write!(f, "license: {}", msg),
        }
    }
}

/// Result of processing one package during an audit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    Classified {
        key: PackageKey,
        bucket: Bucket,
        result: PackageResult,
    },
    Skipped {
        key: PackageKey,
        reason: SkipReason,
    },
}

/// Aggregated findings, partitioned into pass / fail / ignored
#[derive(Debug, Clone, Serialize)]
pub struct LicenseResults {
    pub pass: ResultMap<PackageKey, PackageResult>,
    pub fail: ResultMap<PackageKey, PackageResult>,
    pub ignored: ResultMap<PackageKey, PackageResult>,
}

impl Default for LicenseResults {
    fn default() -> Self {
        Self {
            pass: ResultMap::new(PackageResult::default()),
            fail: ResultMap::new(PackageResult::default()),
            ignored: ResultMap::new(PackageResult::default()),
        }
    }
}

impl LicenseResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket map for the given bucket
    pub fn bucket_mut(&mut self, bucket: Bucket) -> &mut ResultMap<PackageKey, PackageResult> {
        match bucket {
            Bucket::Pass => &mut self.pass,
            Bucket::Fail => &mut self.fail,
            Bucket::Ignored => &mut self.ignored,
        }
    }

    /// Merge a finding for `key` into `bucket`.
    ///
    /// A key lives in exactly one bucket. When instances sharing a key land
    /// in different buckets, the higher-precedence bucket (ignored, then
    /// fail, then pass) keeps the merged record.
    pub fn merge(&mut self, bucket: Bucket, key: PackageKey, result: PackageResult) {
        let target = self
            .bucket_of(&key)
            .map_or(bucket, |existing| existing.max(bucket));
        for other in [Bucket::Pass, Bucket::Fail, Bucket::Ignored] {
            if other == target {
                continue;
            }
            if let Some(previous) = self.bucket_mut(other).remove(&key) {
                self.bucket_mut(target).merge(key.clone(), previous);
            }
        }
        self.bucket_mut(target).merge(key, result);
    }

    /// Which bucket, if any, holds `key`
    pub fn bucket_of(&self, key: &PackageKey) -> Option<Bucket> {
        if self.ignored.has(key) {
            Some(Bucket::Ignored)
        } else if self.fail.has(key) {
            Some(Bucket::Fail)
        } else if self.pass.has(key) {
            Some(Bucket::Pass)
        } else {
            None
        }
    }

    /// Every entry across the three buckets, sorted by key
    pub fn all_entries(&self) -> Vec<(Bucket, &PackageKey, &PackageResult)> {
        let mut entries: Vec<_> = self
            .pass
            .entries()
            .map(|(k, v)| (Bucket::Pass, k, v))
            .chain(self.fail.entries().map(|(k, v)| (Bucket::Fail, k, v)))
            .chain(self.ignored.entries().map(|(k, v)| (Bucket::Ignored, k, v)))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(b.1));
        entries
    }

    pub fn len(&self) -> usize {
        self.pass.len() + self.fail.len() + self.ignored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Summary statistics for an audit report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_packages: usize,
    pub passed: usize,
    pub failed: usize,
    pub ignored: usize,
    pub skipped: usize,
    pub dev_only: usize,
}

/// A package that was dropped from the audit, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPackage {
    pub key: PackageKey,
    pub reason: SkipReason,
}

/// Complete license audit report for a project
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    /// Name of the audited project
    pub project_name: String,
    /// Timestamp when audit was performed
    pub timestamp: DateTime<Utc>,
    /// Classified packages
    pub results: LicenseResults,
    /// Packages absorbed by per-package failures
    pub skipped: Vec<SkippedPackage>,
    /// Summary statistics
    pub summary: AuditSummary,
}

impl AuditReport {
    /// Create a new, empty audit report
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            timestamp: Utc::now(),
            results: LicenseResults::new(),
            skipped: Vec::new(),
            summary: AuditSummary::default(),
        }
    }

    /// Fold a per-package outcome into the report
    pub fn record(&mut self, outcome: PackageOutcome) {
        match outcome {
            PackageOutcome::Classified {
                key,
                bucket,
                result,
            } => self.results.merge(bucket, key, result),
            PackageOutcome::Skipped { key, reason } => {
                self.skipped.push(SkippedPackage { key, reason })
            }
        }
    }

    /// Compute summary statistics from the buckets
    pub fn compute_summary(&mut self, dev_only: usize) {
        self.summary = AuditSummary {
            total_packages: self.results.len() + self.skipped.len(),
            passed: self.results.pass.len(),
            failed: self.results.fail.len(),
            ignored: self.results.ignored.len(),
            skipped: self.skipped.len(),
            dev_only,
        };
    }

    /// Whether any package failed the audit
    pub fn is_failure(&self) -> bool {
        !self.results.fail.is_empty()
    }
}
