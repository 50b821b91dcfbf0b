//! Package manifest (`package.json`) model

use crate::error::Result;
use crate::fetch::PackageFiles;
use serde::Deserialize;
use serde_json::Value;

/// File name of the package manifest at a package root
pub const MANIFEST_FILE: &str = "package.json";

/// The subset of `package.json` the audit cares about.
///
/// License-related fields are kept as raw JSON because published manifests
/// use several incompatible shapes for them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub license: Option<Value>,
    /// Legacy plural field: `[{ "type": "MIT", "url": "..." }, ...]`
    #[serde(default)]
    pub licenses: Option<Value>,
    #[serde(default)]
    pub homepage: Option<Value>,
    #[serde(default)]
    pub repository: Option<Value>,
}

impl Manifest {
    /// Parse a manifest from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// The license metadata to honor, by priority: a string `license`, then
    /// the legacy `licenses` array, then `license` in any other shape.
    pub fn license_field(&self) -> Option<&Value> {
        match &self.license {
            Some(value @ Value::String(_)) => Some(value),
            _ => self.licenses.as_ref().or(self.license.as_ref()),
        }
    }

    pub fn homepage(&self) -> Option<String> {
        match &self.homepage {
            Some(Value::String(url)) if !url.is_empty() => Some(url.clone()),
            _ => None,
        }
    }

    /// Repository URL, from either `"repository": "url"` or `{ "url": ... }`
    pub fn repository_url(&self) -> Option<String> {
        let url = match &self.repository {
            Some(Value::String(url)) => url.as_str(),
            Some(Value::Object(fields)) => fields.get("url")?.as_str()?,
            _ => return None,
        };
        (!url.is_empty()).then(|| url.to_string())
    }
}

/// Read and parse the manifest at the root of a package
pub async fn read_manifest<F: PackageFiles + ?Sized>(files: &F) -> Result<Manifest> {
    let content = files.read_file(MANIFEST_FILE).await?;
    Manifest::from_json(&content)
}
