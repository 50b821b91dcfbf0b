//! Dependency graph and package access from an npm `package-lock.json`

use crate::error::{AuditError, Result};
use crate::fetch::{DirectoryFiles, PackageFetcher};
use crate::graph::{DependencyGraph, Workspace};
use crate::types::{Descriptor, Ident, Locator};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const LOCKFILE_NAME: &str = "package-lock.json";

const NODE_MODULES: &str = "node_modules/";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageLock {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    lockfile_version: u32,
    #[serde(default)]
    packages: Option<BTreeMap<String, LockEntry>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    link: bool,
    #[serde(default)]
    resolved: Option<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    optional_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    peer_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, String>,
}

/// Workspace entries live outside `node_modules` (the root is the empty path)
fn is_workspace_path(path: &str) -> bool {
    !path.starts_with(NODE_MODULES) && !path.contains("/node_modules/")
}

/// Package name implied by an install path (`node_modules/@s/x` -> `@s/x`)
fn name_from_path(path: &str) -> &str {
    match path.rfind(NODE_MODULES) {
        Some(i) => &path[i + NODE_MODULES.len()..],
        None => path.rsplit('/').next().unwrap_or(path),
    }
}

/// Directory to search next when resolving from `base`, walking up the
/// nested `node_modules` chain towards the project root
fn parent_scope(base: &str) -> &str {
    match base.rfind("/node_modules/") {
        Some(i) => &base[..i],
        None => "",
    }
}

/// Resolved install tree read from `package-lock.json` (lockfile v2 or v3).
///
/// Every installed entry becomes a locator `name@npm:<version>::path=<dir>`,
/// so the same version installed in two places is two package instances
/// sharing one display key.
#[derive(Debug)]
pub struct NpmLockfile {
    project_root: PathBuf,
    project_name: String,
    workspaces: Vec<Workspace>,
    resolutions: HashMap<Descriptor, Locator>,
    dependencies: HashMap<Locator, Vec<Descriptor>>,
    install_paths: HashMap<Locator, String>,
}

impl NpmLockfile {
    /// Load `package-lock.json` from a project directory
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(LOCKFILE_NAME);
        if !path.exists() {
            return Err(AuditError::lockfile(format!(
                "{} not found at {}",
                LOCKFILE_NAME,
                project_root.display()
            )));
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_json(project_root, &content)
    }

    /// Build the graph from lockfile text; `project_root` anchors install paths
    pub fn from_json(project_root: &Path, content: &str) -> Result<Self> {
        let lock: PackageLock = serde_json::from_str(content)
            .map_err(|e| AuditError::lockfile(format!("invalid {}: {}", LOCKFILE_NAME, e)))?;

        let Some(entries) = lock.packages else {
            return Err(AuditError::lockfile(format!(
                "lockfileVersion {} has no `packages` section; regenerate it with npm 7 or newer",
                lock.lockfile_version
            )));
        };

        let project_name = lock
            .name
            .or_else(|| entries.get("").and_then(|root| root.name.clone()))
            .unwrap_or_else(|| {
                project_root
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "project".to_string())
            });

        let mut graph = Self {
            project_root: project_root.to_path_buf(),
            project_name,
            workspaces: Vec::new(),
            resolutions: HashMap::new(),
            dependencies: HashMap::new(),
            install_paths: HashMap::new(),
        };
        graph.index(&entries);

        debug!(
            "Loaded {}: {} workspaces, {} installed packages",
            LOCKFILE_NAME,
            graph.workspaces.len(),
            graph.install_paths.len()
        );

        Ok(graph)
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    fn locator_for(path: &str, entry: &LockEntry) -> Locator {
        let name = entry
            .name
            .clone()
            .unwrap_or_else(|| name_from_path(path).to_string());
        let ident = Ident::parse(&name);
        if is_workspace_path(path) {
            let dir = if path.is_empty() { "." } else { path };
            Locator::new(ident, format!("workspace:{}", dir))
        } else {
            let version = entry.version.as_deref().unwrap_or("0.0.0");
            Locator::new(ident, format!("npm:{}::path={}", version, path))
        }
    }

    /// Install path that `name` resolves to when required from `from`,
    /// following workspace links
    fn lookup<'a>(entries: &'a BTreeMap<String, LockEntry>, from: &str, name: &str) -> Option<&'a str> {
        let mut base = from;
        loop {
            let candidate = if base.is_empty() {
                format!("{}{}", NODE_MODULES, name)
            } else {
                format!("{}/{}{}", base, NODE_MODULES, name)
            };
            if let Some((path, entry)) = entries.get_key_value(&candidate) {
                if entry.link {
                    let target = entry.resolved.as_deref()?;
                    return entries.get_key_value(target).map(|(p, _)| p.as_str());
                }
                return Some(path.as_str());
            }
            if base.is_empty() {
                return None;
            }
            base = parent_scope(base);
        }
    }

    fn index(&mut self, entries: &BTreeMap<String, LockEntry>) {
        let locators: HashMap<&str, Locator> = entries
            .iter()
            .filter(|(_, entry)| !entry.link)
            .map(|(path, entry)| (path.as_str(), Self::locator_for(path, entry)))
            .collect();

        for (path, entry) in entries.iter().filter(|(_, entry)| !entry.link) {
            let Some(locator) = locators.get(path.as_str()).cloned() else {
                continue;
            };
            let workspace = is_workspace_path(path);

            let mut declared: Vec<(&String, &String)> = entry
                .dependencies
                .iter()
                .chain(entry.optional_dependencies.iter())
                .chain(
                    entry
                        .peer_dependencies
                        .iter()
                        .filter(|(name, _)| !entry.dependencies.contains_key(*name)),
                )
                .collect();
            if workspace {
                declared.extend(
                    entry
                        .dev_dependencies
                        .iter()
                        .filter(|(name, _)| !entry.dependencies.contains_key(*name)),
                );
            }

            let mut descriptors = Vec::with_capacity(declared.len());
            for (name, range) in declared {
                let descriptor =
                    Descriptor::new(Ident::parse(name), format!("{}::parent={}", range, path));
                match Self::lookup(entries, path, name).and_then(|target| locators.get(target)) {
                    Some(target) => {
                        self.resolutions.insert(descriptor.clone(), target.clone());
                    }
                    None => debug!("{} is not installed (required by {})", name, locator),
                }
                descriptors.push(descriptor);
            }

            if workspace {
                let dev_dependencies: HashSet<Descriptor> = descriptors
                    .iter()
                    .filter(|d| !entry.dependencies.contains_key(&d.ident.full_name()))
                    .filter(|d| entry.dev_dependencies.contains_key(&d.ident.full_name()))
                    .cloned()
                    .collect();
                // Consumers of a workspace never install its dev dependencies
                let production: Vec<Descriptor> = descriptors
                    .iter()
                    .filter(|d| !dev_dependencies.contains(d))
                    .cloned()
                    .collect();
                self.dependencies.insert(locator.clone(), production);
                self.workspaces.push(Workspace {
                    locator,
                    dependencies: descriptors,
                    dev_dependencies,
                });
            } else {
                self.install_paths.insert(locator.clone(), path.clone());
                self.dependencies.insert(locator, descriptors);
            }
        }
    }
}

impl DependencyGraph for NpmLockfile {
    fn resolve(&self, descriptor: &Descriptor) -> Option<Locator> {
        self.resolutions.get(descriptor).cloned()
    }

    fn dependencies_of(&self, locator: &Locator) -> Vec<Descriptor> {
        self.dependencies.get(locator).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl PackageFetcher for NpmLockfile {
    type Files = DirectoryFiles;

    async fn fetch(&self, locator: &Locator) -> Result<DirectoryFiles> {
        let path = self
            .install_paths
            .get(locator)
            .ok_or_else(|| AuditError::fetch(locator.to_string(), "not installed by the lockfile"))?;
        Ok(DirectoryFiles::new(self.project_root.join(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::classify_reachability;

    const LOCK: &str = r#"{
  "name": "my-app",
  "version": "1.0.0",
  "lockfileVersion": 3,
  "requires": true,
  "packages": {
    "": {
      "name": "my-app",
      "version": "1.0.0",
      "workspaces": ["packages/util"],
      "dependencies": { "express": "^4.18.2", "@my/util": "*" },
      "devDependencies": { "jest": "^29.0.0" }
    },
    "node_modules/@my/util": { "resolved": "packages/util", "link": true },
    "node_modules/express": {
      "version": "4.18.2",
      "license": "MIT",
      "dependencies": { "debug": "2.6.9" }
    },
    "node_modules/debug": { "version": "2.6.9", "dependencies": { "ms": "2.0.0" } },
    "node_modules/ms": { "version": "2.0.0" },
    "node_modules/jest": {
      "version": "29.7.0",
      "dev": true,
      "dependencies": { "debug": "^4.3.1", "fsevents": "^2.3.2" }
    },
    "node_modules/jest/node_modules/debug": {
      "version": "4.3.4",
      "dev": true,
      "dependencies": { "ms": "2.1.2" }
    },
    "node_modules/jest/node_modules/ms": { "version": "2.1.2", "dev": true },
    "packages/util": {
      "name": "@my/util",
      "version": "0.1.0",
      "dependencies": { "ms": "^2.0.0" },
      "devDependencies": { "typescript": "^5.0.0" }
    },
    "node_modules/typescript": { "version": "5.4.5", "dev": true }
  }
}"#;

    fn lockfile() -> NpmLockfile {
        NpmLockfile::from_json(Path::new("/project"), LOCK).unwrap()
    }

    #[test]
    fn test_workspaces_and_dev_sets() {
        let lock = lockfile();
        assert_eq!(lock.project_name(), "my-app");

        let names: Vec<_> = lock
            .workspaces()
            .iter()
            .map(|w| w.locator.to_string())
            .collect();
        assert_eq!(names, vec!["my-app@workspace:.", "@my/util@workspace:packages/util"]);

        let root = &lock.workspaces()[0];
        assert_eq!(root.dependencies.len(), 3);
        let dev: Vec<_> = root.dev_dependencies.iter().map(|d| d.ident.full_name()).collect();
        assert_eq!(dev, vec!["jest"]);
    }

    #[test]
    fn test_nested_resolution_prefers_closest_install() {
        let lock = lockfile();
        let jest = lock
            .resolve(&lock.workspaces()[0].dependencies[2])
            .expect("jest resolves");
        assert_eq!(jest.key().as_str(), "jest@npm:29.7.0");

        let debug_versions: Vec<_> = lock
            .dependencies_of(&jest)
            .iter()
            .filter_map(|d| lock.resolve(d))
            .map(|l| l.key().to_string())
            .collect();
        assert_eq!(debug_versions, vec!["debug@npm:4.3.4"]);
    }

    #[test]
    fn test_reachability_over_lockfile() {
        let lock = lockfile();
        let packages = classify_reachability(lock.workspaces(), &lock);
        let tags: Vec<_> = packages
            .iter()
            .map(|p| (p.key.to_string(), p.dev_only))
            .collect();

        assert_eq!(
            tags,
            vec![
                ("debug@npm:2.6.9".to_string(), false),
                ("debug@npm:4.3.4".to_string(), true),
                ("express@npm:4.18.2".to_string(), false),
                ("jest@npm:29.7.0".to_string(), true),
                ("ms@npm:2.0.0".to_string(), false),
                ("ms@npm:2.1.2".to_string(), true),
                ("typescript@npm:5.4.5".to_string(), true),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_maps_to_install_directory() {
        let lock = lockfile();
        let packages = classify_reachability(lock.workspaces(), &lock);
        let nested = packages
            .iter()
            .find(|p| p.key.as_str() == "ms@npm:2.1.2")
            .unwrap();

        let files = lock.fetch(&nested.locator).await.unwrap();
        assert_eq!(
            files.root(),
            Path::new("/project/node_modules/jest/node_modules/ms")
        );

        let workspace = lock.workspaces()[0].locator.clone();
        assert!(lock.fetch(&workspace).await.is_err());
    }

    #[test]
    fn test_installed_peers_are_reachable() {
        let lock = NpmLockfile::from_json(
            Path::new("/project"),
            r#"{
  "name": "peers",
  "lockfileVersion": 3,
  "packages": {
    "": { "name": "peers", "dependencies": { "react-dom": "^18.2.0" } },
    "node_modules/react-dom": {
      "version": "18.2.0",
      "dependencies": { "scheduler": "^0.23.0" },
      "peerDependencies": { "react": "^18.2.0", "react-native": "*" }
    },
    "node_modules/scheduler": { "version": "0.23.0" },
    "node_modules/react": { "version": "18.2.0", "peer": true }
  }
}"#,
        )
        .unwrap();

        let keys: Vec<_> = classify_reachability(lock.workspaces(), &lock)
            .iter()
            .map(|p| (p.key.to_string(), p.dev_only))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("react-dom@npm:18.2.0".to_string(), false),
                ("react@npm:18.2.0".to_string(), false),
                ("scheduler@npm:0.23.0".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_lockfile_v1_rejected() {
        let err = NpmLockfile::from_json(
            Path::new("/project"),
            r#"{ "name": "old", "lockfileVersion": 1, "dependencies": {} }"#,
        )
        .unwrap_err();
        assert!(matches!(err, AuditError::LockfileError(_)));
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(name_from_path("node_modules/@babel/core"), "@babel/core");
        assert_eq!(name_from_path("node_modules/a/node_modules/b"), "b");
        assert_eq!(parent_scope("node_modules/a/node_modules/b"), "node_modules/a");
        assert_eq!(parent_scope("node_modules/a"), "");
        assert!(is_workspace_path(""));
        assert!(is_workspace_path("packages/util"));
        assert!(!is_workspace_path("packages/util/node_modules/x"));
    }
}
