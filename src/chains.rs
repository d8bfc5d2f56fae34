//! Shortest import chains between modules and packages.
//!
//! All searches are breadth-first over the `BTreeSet` adjacency, so results
//! are deterministic for an unmutated graph.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::error::{Error, Result};
use crate::graph::{ImportGraph, ModuleId};
use crate::traversal::Direction;

/// Modules and imports a search must not use.
#[derive(Debug, Default)]
pub(crate) struct Exclusions {
    pub modules: HashSet<ModuleId>,
    pub imports: HashSet<(ModuleId, ModuleId)>,
}

impl Exclusions {
    fn allows(&self, from: ModuleId, to: ModuleId) -> bool {
        !self.modules.contains(&to) && !self.imports.contains(&(from, to))
    }
}

impl ImportGraph {
    /// Shortest chain of imports from `importer` to `imported`, both ends included.
    pub fn find_shortest_chain(&self, importer: &str, imported: &str) -> Result<Option<Vec<String>>> {
        self.shortest_chain_between(importer, imported, false)
    }

    /// Like [`find_shortest_chain`](Self::find_shortest_chain), but any module in
    /// either package family may start or end the chain.
    pub fn find_shortest_chain_as_packages(
        &self,
        importer: &str,
        imported: &str,
    ) -> Result<Option<Vec<String>>> {
        self.shortest_chain_between(importer, imported, true)
    }

    /// Every distinct chain of the minimum length between the two modules, or
    /// (with `as_packages`, the usual choice) between any members of their
    /// package families.
    pub fn find_shortest_chains(
        &self,
        importer: &str,
        imported: &str,
        as_packages: bool,
    ) -> Result<BTreeSet<Vec<String>>> {
        let (from, to) = self.endpoint_families(importer, imported, as_packages)?;
        Ok(self
            .all_shortest_paths(&from, &to)
            .iter()
            .map(|chain| self.chain_names(chain))
            .collect())
    }

    /// Whether `importer` depends on `imported`, directly or indirectly.
    pub fn chain_exists(&self, importer: &str, imported: &str, as_packages: bool) -> Result<bool> {
        let (from, to) = self.endpoint_families(importer, imported, as_packages)?;
        Ok(self.shortest_path(&from, &to, &Exclusions::default()).is_some())
    }

    /// Shortest chain leaving `module` and coming back to it.
    ///
    /// With `as_package`, the chain leaves the package family and re-enters
    /// it; imports internal to the family are ignored.
    pub fn find_shortest_cycle(&self, module: &str, as_package: bool) -> Result<Option<Vec<String>>> {
        let id = self.require(module)?;
        let family = self.family(id, as_package);

        let mut parent: HashMap<ModuleId, ModuleId> = HashMap::new();
        let mut visited: HashSet<ModuleId> = HashSet::new();
        let mut queue: VecDeque<ModuleId> = VecDeque::new();

        for &member in &family {
            for &next in self.neighbours(member, Direction::Imports).iter() {
                if family.contains(&next) {
                    if !as_package {
                        // Self-import.
                        return Ok(Some(self.chain_names(&[member, next])));
                    }
                    continue;
                }
                if visited.insert(next) {
                    parent.insert(next, member);
                    queue.push_back(next);
                }
            }
        }

        while let Some(mid) = queue.pop_front() {
            for &next in self.neighbours(mid, Direction::Imports).iter() {
                if family.contains(&next) {
                    let mut chain = vec![next, mid];
                    let mut current = mid;
                    while let Some(&p) = parent.get(&current) {
                        chain.push(p);
                        if family.contains(&p) {
                            break;
                        }
                        current = p;
                    }
                    chain.reverse();
                    return Ok(Some(self.chain_names(&chain)));
                }
                if visited.insert(next) {
                    parent.insert(next, mid);
                    queue.push_back(next);
                }
            }
        }

        Ok(None)
    }

    fn shortest_chain_between(
        &self,
        importer: &str,
        imported: &str,
        as_packages: bool,
    ) -> Result<Option<Vec<String>>> {
        let (from, to) = self.endpoint_families(importer, imported, as_packages)?;
        Ok(self
            .shortest_path(&from, &to, &Exclusions::default())
            .map(|chain| self.chain_names(&chain)))
    }

    fn endpoint_families(
        &self,
        importer: &str,
        imported: &str,
        as_packages: bool,
    ) -> Result<(BTreeSet<ModuleId>, BTreeSet<ModuleId>)> {
        let from = self.family(self.require(importer)?, as_packages);
        let to = self.family(self.require(imported)?, as_packages);
        if !from.is_disjoint(&to) {
            return Err(Error::SharedDescendants(importer.to_owned(), imported.to_owned()));
        }
        Ok((from, to))
    }

    /// BFS from every module in `from` to the first module reached in `to`.
    ///
    /// `from` and `to` must be disjoint. Modules in `to` are never expanded,
    /// so the returned chain touches `to` only at its last element.
    pub(crate) fn shortest_path(
        &self,
        from: &BTreeSet<ModuleId>,
        to: &BTreeSet<ModuleId>,
        exclusions: &Exclusions,
    ) -> Option<Vec<ModuleId>> {
        let mut parent: HashMap<ModuleId, ModuleId> = HashMap::new();
        let mut visited: HashSet<ModuleId> = from.iter().copied().collect();
        let mut queue: VecDeque<ModuleId> = from.iter().copied().collect();

        while let Some(mid) = queue.pop_front() {
            for &next in self.neighbours(mid, Direction::Imports).iter() {
                if !exclusions.allows(mid, next) || !visited.insert(next) {
                    continue;
                }
                parent.insert(next, mid);
                if to.contains(&next) {
                    // Reconstruct path
                    let mut chain = vec![next];
                    let mut current = next;
                    while let Some(&p) = parent.get(&current) {
                        chain.push(p);
                        current = p;
                    }
                    chain.reverse();
                    return Some(chain);
                }
                queue.push_back(next);
            }
        }

        None
    }

    /// BFS with multi-parent tracking, then backtrack from every target found
    /// at the minimum depth to recover all shortest paths.
    fn all_shortest_paths(
        &self,
        from: &BTreeSet<ModuleId>,
        to: &BTreeSet<ModuleId>,
    ) -> Vec<Vec<ModuleId>> {
        let mut parents: HashMap<ModuleId, Vec<ModuleId>> = HashMap::new();
        let mut depth: HashMap<ModuleId, u32> = from.iter().map(|&m| (m, 0)).collect();
        let mut queue: VecDeque<ModuleId> = from.iter().copied().collect();

        let mut target_depth: Option<u32> = None;
        let mut targets: Vec<ModuleId> = Vec::new();

        while let Some(mid) = queue.pop_front() {
            let d = depth[&mid];

            // Targets found; everything left in the queue is at least as deep.
            if target_depth.is_some_and(|td| d >= td) {
                break;
            }

            for &next in self.neighbours(mid, Direction::Imports).iter() {
                let next_depth = d + 1;
                match depth.get(&next) {
                    Some(&existing) if existing == next_depth => {
                        parents.entry(next).or_default().push(mid);
                    }
                    None => {
                        depth.insert(next, next_depth);
                        parents.entry(next).or_default().push(mid);
                        if to.contains(&next) {
                            target_depth = Some(next_depth);
                            targets.push(next);
                        } else {
                            queue.push_back(next);
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut all_chains = Vec::new();
        for &target in &targets {
            let mut partial_paths: Vec<Vec<ModuleId>> = vec![vec![target]];
            while let Some(path) = partial_paths.pop() {
                let head = path[path.len() - 1];
                match parents.get(&head) {
                    Some(pars) => {
                        for &p in pars {
                            let mut extended = path.clone();
                            extended.push(p);
                            partial_paths.push(extended);
                        }
                    }
                    None => {
                        let mut chain = path;
                        chain.reverse();
                        all_chains.push(chain);
                    }
                }
            }
        }

        all_chains
    }
}
