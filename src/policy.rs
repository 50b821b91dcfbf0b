//! License policy predicates
//!
//! The audit engine never interprets license text beyond detecting missing
//! values. Every allow/deny decision is delegated to a [`LicensePredicate`],
//! and every ignore decision to a [`PackageIgnorePredicate`]. Predicates can
//! be plain closures or built from rules (SPDX allow lists, regular
//! expressions, package name lists).

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Decides whether a license is acceptable: `(license_or_file_content, is_file)`
pub type LicensePredicate = Arc<dyn Fn(&str, bool) -> bool + Send + Sync>;

/// Decides whether a package is exempt from the audit: `(package_name, license)`
pub type PackageIgnorePredicate = Arc<dyn Fn(&str, Option<&str>) -> bool + Send + Sync>;

/// Licenses accepted when no policy is configured
static DEFAULT_LICENSES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(mit|apache\b.*2|bsd|isc|unlicense)\b")
        .expect("default license pattern is valid")
});

/// Predicates applied during an audit
#[derive(Clone)]
pub struct LicensePolicy {
    production: LicensePredicate,
    development: LicensePredicate,
    ignore: PackageIgnorePredicate,
}

impl LicensePolicy {
    /// Policy applying `production` to every package and ignoring nothing
    pub fn new(production: LicensePredicate) -> Self {
        Self {
            development: production.clone(),
            production,
            ignore: Arc::new(|_, _| false),
        }
    }

    /// Use a separate predicate for development-only packages
    pub fn with_development(mut self, development: LicensePredicate) -> Self {
        self.development = development;
        self
    }

    pub fn with_ignore(mut self, ignore: PackageIgnorePredicate) -> Self {
        self.ignore = ignore;
        self
    }

    /// Predicate for a package given its reachability
    pub fn predicate_for(&self, dev_only: bool) -> &LicensePredicate {
        if dev_only {
            &self.development
        } else {
            &self.production
        }
    }

    pub fn is_ignored(&self, package_name: &str, license: Option<&str>) -> bool {
        (self.ignore)(package_name, license)
    }
}

impl Default for LicensePolicy {
    fn default() -> Self {
        Self::new(Arc::new(|license, _| DEFAULT_LICENSES.is_match(license)))
    }
}

impl fmt::Debug for LicensePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicensePolicy").finish_non_exhaustive()
    }
}

/// Rule-based license acceptance
#[derive(Debug, Clone, Default)]
pub struct LicenseRule {
    /// SPDX identifiers that are acceptable, compared case-insensitively
    pub allow: HashSet<String>,
    /// Pattern a license label must match
    pub pattern: Option<Regex>,
    /// Pattern license file content must match (relaxed mode)
    pub files: Option<Regex>,
}

impl LicenseRule {
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.pattern.is_none() && self.files.is_none()
    }

    pub fn allows(&self, license: &str, is_file: bool) -> bool {
        if is_file {
            return self.files.as_ref().is_some_and(|re| re.is_match(license));
        }
        if self.pattern.as_ref().is_some_and(|re| re.is_match(license)) {
            return true;
        }
        !self.allow.is_empty() && allowed_by_list(license, &self.allow)
    }

    pub fn into_predicate(self) -> LicensePredicate {
        let allow = self.allow.iter().map(|l| l.to_lowercase()).collect();
        let rule = Self { allow, ..self };
        Arc::new(move |license, is_file| rule.allows(license, is_file))
    }
}

/// Evaluate a license expression against an allow list (lower-cased ids).
///
/// Valid SPDX expressions are evaluated with their AND/OR structure; anything
/// else must match an allowed identifier exactly.
fn allowed_by_list(license: &str, allow: &HashSet<String>) -> bool {
    let trimmed = license.trim();
    if allow.contains(&trimmed.to_lowercase()) {
        return true;
    }
    match spdx::Expression::parse(trimmed) {
        Ok(expression) => expression.evaluate(|req| {
            if let spdx::LicenseItem::Spdx { id, .. } = &req.license {
                allow.contains(&id.name.to_lowercase())
            } else {
                false
            }
        }),
        Err(_) => false,
    }
}

/// Rule-based package exemptions
#[derive(Debug, Clone, Default)]
pub struct IgnoreRule {
    /// Exact package names, including scope
    pub packages: HashSet<String>,
    /// Pattern over package names
    pub pattern: Option<Regex>,
    /// Pattern over license labels
    pub licenses: Option<Regex>,
}

impl IgnoreRule {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.pattern.is_none() && self.licenses.is_none()
    }

    pub fn ignores(&self, package_name: &str, license: Option<&str>) -> bool {
        self.packages.contains(package_name)
            || self.pattern.as_ref().is_some_and(|re| re.is_match(package_name))
            || matches!(
                (&self.licenses, license),
                (Some(re), Some(license)) if re.is_match(license)
            )
    }

    pub fn into_predicate(self) -> PackageIgnorePredicate {
        Arc::new(move |name, license| self.ignores(name, license))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow(ids: &[&str]) -> LicenseRule {
        LicenseRule {
            allow: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_policy_accepts_permissive() {
        let policy = LicensePolicy::default();
        let predicate = policy.predicate_for(false);
        assert!(predicate("MIT", false));
        assert!(predicate("Apache-2.0", false));
        assert!(predicate("BSD-3-Clause", false));
        assert!(!predicate("GPL-3.0", false));
        assert!(!policy.is_ignored("left-pad", Some("MIT")));
    }

    #[test]
    fn test_development_defaults_to_production() {
        let policy = LicensePolicy::new(Arc::new(|license, _| license == "MIT"));
        assert!(policy.predicate_for(true)("MIT", false));
        assert!(!policy.predicate_for(true)("GPL-3.0", false));

        let policy = policy.with_development(Arc::new(|_, _| true));
        assert!(policy.predicate_for(true)("GPL-3.0", false));
        assert!(!policy.predicate_for(false)("GPL-3.0", false));
    }

    #[test]
    fn test_allow_list_evaluates_expressions() {
        let predicate = allow(&["MIT", "Apache-2.0"]).into_predicate();
        assert!(predicate("mit", false));
        assert!(predicate("MIT OR GPL-3.0-only", false));
        assert!(predicate("(MIT OR Apache-2.0)", false));
        assert!(!predicate("MIT AND GPL-3.0-only", false));
        assert!(!predicate("GPL-3.0", false));
        assert!(!predicate("Some custom license", false));
    }

    #[test]
    fn test_file_content_needs_file_pattern() {
        let predicate = allow(&["MIT"]).into_predicate();
        assert!(!predicate("MIT License\n\nPermission is hereby granted", true));

        let rule = LicenseRule {
            files: Some(Regex::new("(?i)permission is hereby granted").unwrap()),
            ..allow(&["MIT"])
        };
        let predicate = rule.into_predicate();
        assert!(predicate("MIT License\n\nPermission is hereby granted", true));
        assert!(!predicate("All rights reserved", true));
    }

    #[test]
    fn test_pattern_rule() {
        let rule = LicenseRule {
            pattern: Some(Regex::new("^(MIT|ISC)$").unwrap()),
            ..Default::default()
        };
        assert!(!rule.is_empty());
        assert!(rule.allows("ISC", false));
        assert!(!rule.allows("BSD-2-Clause", false));
    }

    #[test]
    fn test_ignore_rule() {
        let rule = IgnoreRule {
            packages: ["left-pad".to_string()].into_iter().collect(),
            pattern: Some(Regex::new("^@internal/").unwrap()),
            licenses: Some(Regex::new("^UNLICENSED$").unwrap()),
        };
        assert!(rule.ignores("left-pad", None));
        assert!(rule.ignores("@internal/tools", Some("GPL-3.0")));
        assert!(rule.ignores("private-thing", Some("UNLICENSED")));
        assert!(!rule.ignores("lodash", Some("MIT")));
        assert!(!rule.ignores("lodash", None));
    }
}
