//! Dependency reachability: which resolved packages are development-only

use crate::types::{Descriptor, Locator, PackageKey};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Read access to a resolved dependency graph
pub trait DependencyGraph {
    /// Resolve a dependency reference; `None` means the edge is skipped
    fn resolve(&self, descriptor: &Descriptor) -> Option<Locator>;

    /// Dependencies declared by a resolved package
    fn dependencies_of(&self, locator: &Locator) -> Vec<Descriptor>;

    /// Peer-dependency variants of another package; never audited on their own
    fn is_virtual(&self, locator: &Locator) -> bool {
        locator.reference.starts_with("virtual:")
    }

    /// Packages that belong to the project itself
    fn is_workspace(&self, locator: &Locator) -> bool {
        locator.reference.starts_with("workspace:")
    }
}

/// A root of the project graph with its own direct dependencies
#[derive(Debug, Clone)]
pub struct Workspace {
    pub locator: Locator,
    /// Every direct dependency, development ones included
    pub dependencies: Vec<Descriptor>,
    /// The subset of `dependencies` declared for development only
    pub dev_dependencies: HashSet<Descriptor>,
}

impl Workspace {
    /// Direct dependencies not declared for development
    pub fn production_dependencies(&self) -> impl Iterator<Item = &Descriptor> {
        self.dependencies
            .iter()
            .filter(|d| !self.dev_dependencies.contains(d))
    }
}

/// A third-party package reached from the workspaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachablePackage {
    pub locator: Locator,
    pub key: PackageKey,
    /// Reachable only through development dependencies
    pub dev_only: bool,
}

/// Breadth-first walk from `seeds`, returning each resolved identity once,
/// in discovery order.
fn traverse<'a, G, I>(graph: &G, seeds: I) -> Vec<Locator>
where
    G: DependencyGraph + ?Sized,
    I: IntoIterator<Item = &'a Descriptor>,
{
    let mut queue: VecDeque<Descriptor> = seeds.into_iter().cloned().collect();
    let mut seen: HashSet<Locator> = HashSet::new();
    let mut visited = Vec::new();

    while let Some(descriptor) = queue.pop_front() {
        let Some(locator) = graph.resolve(&descriptor) else {
            debug!("Unresolved dependency {}, skipping", descriptor);
            continue;
        };
        if !seen.insert(locator.clone()) {
            continue;
        }
        queue.extend(graph.dependencies_of(&locator));
        visited.push(locator);
    }

    visited
}

/// Tag every package reachable from `workspaces` as production or
/// development-only.
///
/// A package is production as soon as any chain of non-development edges
/// reaches it; otherwise it is development-only. Virtual and workspace
/// packages are walked through but left out of the result, which is sorted
/// by package key so it does not depend on traversal order.
pub fn classify_reachability<G>(workspaces: &[Workspace], graph: &G) -> Vec<ReachablePackage>
where
    G: DependencyGraph + ?Sized,
{
    let production: HashSet<Locator> = traverse(
        graph,
        workspaces.iter().flat_map(Workspace::production_dependencies),
    )
    .into_iter()
    .collect();

    let everything = traverse(graph, workspaces.iter().flat_map(|w| w.dependencies.iter()));

    let mut packages: Vec<ReachablePackage> = everything
        .into_iter()
        .filter(|locator| !graph.is_virtual(locator) && !graph.is_workspace(locator))
        .map(|locator| ReachablePackage {
            key: locator.key(),
            dev_only: !production.contains(&locator),
            locator,
        })
        .collect();

    packages.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.locator.cmp(&b.locator)));

    debug!(
        "Reachability: {} packages, {} development-only",
        packages.len(),
        packages.iter().filter(|p| p.dev_only).count()
    );

    packages
}
