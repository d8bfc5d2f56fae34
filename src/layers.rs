//! Layered-architecture checks.
//!
//! Layers are listed from highest to lowest. A higher layer may import a lower
//! one, never the reverse; siblings in an independent layer may not import
//! each other; and nothing may bypass a closed layer on the way down.
//!
//! Violations are reported per offending package pair as a set of [`Route`]s.
//! Rather than listing every module-level chain (there can be millions), the
//! chains are grouped by the modules they pass through outside both packages:
//! one route names the shared middle plus every entry module (head) and exit
//! module (tail) that connects to it.

use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::chains::Exclusions;
use crate::error::{Error, Result};
use crate::graph::{ImportGraph, ModuleId};
use crate::traversal::Direction;

/// One rank in a layered architecture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layer {
    /// Layer module names, relative to the containers when containers are given.
    pub module_tails: BTreeSet<String>,
    /// Whether sibling modules in this layer are forbidden from importing each other.
    pub independent: bool,
    /// Whether higher layers must go through this layer to reach the ones below it.
    pub closed: bool,
}

impl Layer {
    /// An open layer whose siblings are independent.
    pub fn new<I, S>(module_tails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            module_tails: module_tails.into_iter().map(Into::into).collect(),
            independent: true,
            closed: false,
        }
    }

    #[must_use]
    pub fn with_independent(mut self, independent: bool) -> Self {
        self.independent = independent;
        self
    }

    #[must_use]
    pub fn with_closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self
    }
}

impl From<&str> for Layer {
    fn from(name: &str) -> Self {
        Self::new([name])
    }
}

impl From<String> for Layer {
    fn from(name: String) -> Self {
        Self::new([name])
    }
}

/// Compressed evidence for one or more illegal chains between two packages.
///
/// Every head imports the first middle module (or, with an empty middle, a
/// tail directly) and the last middle module imports every tail.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Route {
    pub heads: BTreeSet<String>,
    pub middle: Vec<String>,
    pub tails: BTreeSet<String>,
}

/// All routes from one package to another that it must not depend on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageDependency {
    pub importer: String,
    pub imported: String,
    pub routes: BTreeSet<Route>,
}

/// Layer modules resolved under one container.
struct ResolvedLevel {
    modules: Vec<ModuleId>,
    independent: bool,
    closed: bool,
}

/// A package pair to search, plus the other layers in the same container.
struct Permutation {
    importer: ModuleId,
    imported: ModuleId,
    other_layers: Vec<ModuleId>,
}

impl ImportGraph {
    /// Find dependencies that break the supplied layered architecture.
    ///
    /// `layers` run from highest to lowest. With `containers`, layer names are
    /// relative to each container (`domain` under `mypackage` is
    /// `mypackage.domain`); without them (or with an empty set) names are absolute.
    /// A layer missing from some containers is skipped there, but every layer
    /// must exist under at least one container.
    pub fn find_illegal_dependencies_for_layers(
        &self,
        layers: &[Layer],
        containers: Option<&BTreeSet<String>>,
    ) -> Result<BTreeSet<PackageDependency>> {
        let containers: Vec<Option<&str>> = match containers {
            Some(set) if !set.is_empty() => {
                for container in set {
                    if !self.contains_module(container) {
                        return Err(Error::NoSuchContainer(container.clone()));
                    }
                }
                set.iter().map(|c| Some(c.as_str())).collect()
            }
            _ => vec![None],
        };

        for layer in layers {
            if layer.module_tails.is_empty() {
                return Err(Error::EmptyLayer);
            }
            for tail in &layer.module_tails {
                if !containers.iter().any(|&c| self.resolve_layer(tail, c).is_some()) {
                    return Err(Error::LayerNotFound(tail.clone()));
                }
            }
        }

        let resolved: Vec<Vec<ResolvedLevel>> = containers
            .iter()
            .map(|&container| self.resolve_levels(layers, container))
            .collect();

        let permutations: Vec<Permutation> =
            resolved.iter().flat_map(|levels| forbidden_pairs(levels)).collect();
        tracing::debug!(
            layers = layers.len(),
            containers = containers.len(),
            pairs = permutations.len(),
            "checking layer pairs"
        );

        let dependencies: BTreeSet<PackageDependency> = permutations
            .par_iter()
            .filter_map(|p| self.search_for_package_dependency(p))
            .collect();
        tracing::debug!(violations = dependencies.len(), "layer check finished");
        Ok(dependencies)
    }

    fn resolve_levels(&self, layers: &[Layer], container: Option<&str>) -> Vec<ResolvedLevel> {
        layers
            .iter()
            .map(|layer| ResolvedLevel {
                modules: layer
                    .module_tails
                    .iter()
                    .filter_map(|tail| self.resolve_layer(tail, container))
                    .collect(),
                independent: layer.independent,
                closed: layer.closed,
            })
            .collect()
    }

    fn resolve_layer(&self, tail: &str, container: Option<&str>) -> Option<ModuleId> {
        match container {
            Some(c) => self.id(&format!("{c}.{tail}")),
            None => self.id(tail),
        }
    }

    fn search_for_package_dependency(&self, permutation: &Permutation) -> Option<PackageDependency> {
        let importer = self.family(permutation.importer, true);
        let imported = self.family(permutation.imported, true);
        if !importer.is_disjoint(&imported) {
            tracing::debug!(
                importer = self.name(permutation.importer),
                imported = self.name(permutation.imported),
                "skipping layer pair with shared descendants"
            );
            return None;
        }

        let mut exclusions = Exclusions::default();
        for &layer in &permutation.other_layers {
            exclusions.modules.extend(
                self.family(layer, true)
                    .into_iter()
                    .filter(|m| !importer.contains(m) && !imported.contains(m)),
            );
        }

        let mut routes: BTreeSet<Route> = BTreeSet::new();

        // Direct imports each get their own route, then drop out of the search.
        for &head in &importer {
            for &tail in self.neighbours(head, Direction::Imports).intersection(&imported) {
                routes.insert(Route {
                    heads: self.names([head].iter()),
                    middle: Vec::new(),
                    tails: self.names([tail].iter()),
                });
                exclusions.imports.insert((head, tail));
            }
        }

        // Treat each package as a single node: pop shortest chains until none remain,
        // removing every import the popped chain stands for.
        let mut middles: BTreeSet<Vec<ModuleId>> = BTreeSet::new();
        while let Some(chain) = self.shortest_path(&importer, &imported, &exclusions) {
            let middle = chain[1..chain.len() - 1].to_vec();
            let (Some(&first), Some(&last)) = (middle.first(), middle.last()) else {
                // Direct imports are already excluded; nothing else can be this short.
                break;
            };
            let heads = self.neighbours(first, Direction::ImportedBy);
            for &head in heads.intersection(&importer) {
                exclusions.imports.insert((head, first));
            }
            for pair in middle.windows(2) {
                exclusions.imports.insert((pair[0], pair[1]));
            }
            let tails = self.neighbours(last, Direction::Imports);
            for &tail in tails.intersection(&imported) {
                exclusions.imports.insert((last, tail));
            }
            middles.insert(middle);
        }

        for middle in &middles {
            let first = middle[0];
            let last = middle[middle.len() - 1];
            let heads = self.neighbours(first, Direction::ImportedBy);
            let tails = self.neighbours(last, Direction::Imports);
            routes.insert(Route {
                heads: self.names(heads.intersection(&importer)),
                middle: self.chain_names(middle),
                tails: self.names(tails.intersection(&imported)),
            });
        }

        if routes.is_empty() {
            return None;
        }
        let dependency = PackageDependency {
            importer: self.name(permutation.importer).to_owned(),
            imported: self.name(permutation.imported).to_owned(),
            routes,
        };
        tracing::trace!(
            importer = %dependency.importer,
            imported = %dependency.imported,
            routes = dependency.routes.len(),
            "illegal dependency"
        );
        Some(dependency)
    }
}

/// Every ordered (importer, imported) pair that must not have a chain.
fn forbidden_pairs(levels: &[ResolvedLevel]) -> Vec<Permutation> {
    let all_layers: Vec<ModuleId> = levels.iter().flat_map(|l| l.modules.iter().copied()).collect();
    let permutation = |importer: ModuleId, imported: ModuleId| Permutation {
        importer,
        imported,
        other_layers: all_layers
            .iter()
            .copied()
            .filter(|&m| m != importer && m != imported)
            .collect(),
    };

    let mut result = Vec::new();
    for (index, higher) in levels.iter().enumerate() {
        for &higher_module in &higher.modules {
            if higher.independent {
                for &sibling in higher.modules.iter().filter(|&&s| s != higher_module) {
                    result.push(permutation(sibling, higher_module));
                }
            }
            for (lower_index, lower) in levels.iter().enumerate().skip(index + 1) {
                let bypasses_closed = levels[index + 1..lower_index]
                    .iter()
                    .any(|between| between.closed && !between.modules.is_empty());
                for &lower_module in &lower.modules {
                    result.push(permutation(lower_module, higher_module));
                    if bypasses_closed {
                        result.push(permutation(higher_module, lower_module));
                    }
                }
            }
        }
    }
    result
}
