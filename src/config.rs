//! Configuration for license policy and audit behavior

use crate::error::{AuditError, Result};
use crate::policy::{IgnoreRule, LicensePolicy, LicenseRule};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up at the project root when none is given
pub const DEFAULT_CONFIG_FILE: &str = ".licenses.toml";

/// Main configuration for the audit process
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AuditConfig {
    /// Fall back to LICENSE/LICENCE files when manifest metadata is missing
    #[serde(default)]
    pub relaxed: bool,
    /// Policy for packages reachable from production dependencies
    #[serde(default)]
    pub licenses: Option<LicenseRuleConfig>,
    /// Policy for development-only packages (defaults to `licenses`)
    #[serde(default)]
    pub dev_licenses: Option<LicenseRuleConfig>,
    /// Packages exempt from the audit
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

/// A license rule as written in the config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LicenseRuleConfig {
    /// Allowed SPDX identifiers
    #[serde(default)]
    pub allow: Vec<String>,
    /// Regular expression a license label must match
    #[serde(default)]
    pub pattern: Option<String>,
    /// Regular expression license file content must match
    #[serde(default)]
    pub files: Option<String>,
}

/// Package exemptions as written in the config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IgnoreConfig {
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub licenses: Option<String>,
}

fn compile(section: &str, field: &str, pattern: &Option<String>) -> Result<Option<Regex>> {
    pattern
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|e| AuditError::config(format!("{}.{}: {}", section, field, e)))
}

impl LicenseRuleConfig {
    /// Compile into a rule; a rule with nothing to match on is rejected
    pub fn compile(&self, section: &str) -> Result<LicenseRule> {
        let rule = LicenseRule {
            allow: self.allow.iter().cloned().collect(),
            pattern: compile(section, "pattern", &self.pattern)?,
            files: compile(section, "files", &self.files)?,
        };
        if rule.is_empty() {
            return Err(AuditError::config(format!(
                "{}: expected at least one of `allow`, `pattern` or `files`",
                section
            )));
        }
        Ok(rule)
    }
}

impl IgnoreConfig {
    pub fn compile(&self) -> Result<IgnoreRule> {
        Ok(IgnoreRule {
            packages: self.packages.iter().cloned().collect(),
            pattern: compile("ignore", "pattern", &self.pattern)?,
            licenses: compile("ignore", "licenses", &self.licenses)?,
        })
    }
}

impl AuditConfig {
    /// Create a new builder for AuditConfig
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }

    /// Parse a config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Build the predicates described by this config
    pub fn policy(&self) -> Result<LicensePolicy> {
        let mut policy = match &self.licenses {
            Some(rule) => LicensePolicy::new(rule.compile("licenses")?.into_predicate()),
            None => LicensePolicy::default(),
        };
        if let Some(rule) = &self.dev_licenses {
            policy = policy.with_development(rule.compile("dev-licenses")?.into_predicate());
        }
        let ignore = self.ignore.compile()?;
        if !ignore.is_empty() {
            policy = policy.with_ignore(ignore.into_predicate());
        }
        Ok(policy)
    }
}

/// Load the audit configuration.
///
/// An explicit path must exist. Otherwise `.licenses.toml` at the project
/// root is used when present, and the built-in defaults when it is not.
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<AuditConfig> {
    let path = match config_override {
        Some(path) => path.to_path_buf(),
        None => match find_config(project_path) {
            Some(path) => path,
            None => return Ok(AuditConfig::default()),
        },
    };
    let content = std::fs::read_to_string(&path)
        .map_err(|e| AuditError::config(format!("{}: {}", path.display(), e)))?;
    AuditConfig::from_toml(&content)
        .map_err(|e| AuditError::config(format!("{}: {}", path.display(), e)))
}

/// Path of the project's config file, if it has one
pub fn find_config(project_path: &Path) -> Option<PathBuf> {
    let path = project_path.join(DEFAULT_CONFIG_FILE);
    path.is_file().then_some(path)
}

/// Builder for AuditConfig
#[derive(Default)]
pub struct AuditConfigBuilder {
    relaxed: bool,
    licenses: Option<LicenseRuleConfig>,
    dev_licenses: Option<LicenseRuleConfig>,
    ignore: IgnoreConfig,
}

impl AuditConfigBuilder {
    pub fn relaxed(mut self, relaxed: bool) -> Self {
        self.relaxed = relaxed;
        self
    }

    pub fn licenses(mut self, rule: LicenseRuleConfig) -> Self {
        self.licenses = Some(rule);
        self
    }

    pub fn dev_licenses(mut self, rule: LicenseRuleConfig) -> Self {
        self.dev_licenses = Some(rule);
        self
    }

    pub fn ignore_package(mut self, name: impl Into<String>) -> Self {
        self.ignore.packages.push(name.into());
        self
    }

    pub fn build(self) -> AuditConfig {
        AuditConfig {
            relaxed: self.relaxed,
            licenses: self.licenses,
            dev_licenses: self.dev_licenses,
            ignore: self.ignore,
        }
    }
}
