//! License metadata normalization

use crate::error::{AuditError, Result};
use crate::fetch::PackageFiles;
use crate::manifest::Manifest;
use serde_json::Value;
use tracing::debug;

/// Candidate license files at a package root, in priority order
const LICENSE_FILES: [&str; 2] = ["LICENSE", "LICENCE"];

/// Placeholder some manifests use to point at a license file
const SEE_LICENSE: &str = "see license";

/// License information extracted from a package.
///
/// At most one of the two fields is set: either the manifest provided a
/// license label, or (relaxed mode only) the content of a license file was
/// read instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedLicense {
    pub license: Option<String>,
    pub license_file: Option<String>,
}

impl NormalizedLicense {
    /// The value to check against a policy, and whether it is file content
    pub fn value(&self) -> (&str, bool) {
        match (&self.license_file, &self.license) {
            (Some(content), _) => (content.as_str(), true),
            (None, Some(license)) => (license.as_str(), false),
            (None, None) => ("", false),
        }
    }

    /// License label for display, never file content
    pub fn label(&self) -> Option<&str> {
        self.license.as_deref().filter(|l| !l.is_empty())
    }
}

/// Reduce a manifest license field to a single license string.
///
/// Arrays become `(A OR B ...)` in encounter order, with entries lacking a
/// string `type` dropped. Objects yield their `type`; scalars are stringified.
pub fn parse_license_field(field: &Value) -> String {
    match field {
        Value::Array(entries) => {
            let types: Vec<&str> = entries
                .iter()
                .filter_map(|entry| entry.get("type").and_then(Value::as_str))
                .filter(|t| !t.is_empty())
                .collect();
            match types.as_slice() {
                [] => String::new(),
                [single] => single.to_string(),
                many => format!("({})", many.join(" OR ")),
            }
        }
        Value::Object(fields) => fields
            .get("type")
            .and_then(scalar_to_string)
            .unwrap_or_default(),
        other => scalar_to_string(other).unwrap_or_default(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_placeholder(license: &str) -> bool {
    license.is_empty() || license.to_lowercase().contains(SEE_LICENSE)
}

/// Normalize the license of a package.
///
/// In relaxed mode an empty or "see license" value falls back to the content
/// of the first license file found at the package root. Absent files are
/// skipped; any other read failure is returned as an error.
pub async fn normalize_license<F: PackageFiles + ?Sized>(
    manifest: &Manifest,
    files: &F,
    relaxed: bool,
) -> Result<NormalizedLicense> {
    let license = manifest
        .license_field()
        .map(parse_license_field)
        .unwrap_or_default();

    if relaxed && is_placeholder(&license) {
        for filename in LICENSE_FILES {
            match files.read_file(filename).await {
                Ok(content) => {
                    debug!("Using {} in place of license metadata", filename);
                    return Ok(NormalizedLicense {
                        license: None,
                        license_file: Some(content),
                    });
                }
                Err(AuditError::FileNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    Ok(NormalizedLicense {
        license: Some(license),
        license_file: None,
    })
}
