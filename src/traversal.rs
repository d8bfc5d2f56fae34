//! Hierarchy and reachability queries.
//!
//! Squashed modules hide their subtree: they have no children, and modules
//! below them never join any package family. The hidden modules stay stored
//! with their own imports, but every hierarchy-aware query sees those imports
//! as imports of the nearest visible squashed ancestor.

use std::borrow::Cow;
use std::collections::{BTreeSet, VecDeque};

use crate::graph::{ImportGraph, ModuleId};
use crate::module;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Follow import edges from importer to imported.
    Imports,
    /// Follow import edges backward, from imported to importer.
    ImportedBy,
}

impl ImportGraph {
    /// Modules exactly one level below `module`, e.g. `foo.bar.one` for `foo.bar`.
    pub fn find_children(&self, module: &str) -> BTreeSet<String> {
        let depth = module::depth(module) + 1;
        self.names(
            self.visible_descendants(module)
                .iter()
                .filter(|&&id| module::depth(self.name(id)) == depth),
        )
    }

    /// All modules below `module`, at any depth.
    pub fn find_descendants(&self, module: &str) -> BTreeSet<String> {
        self.names(&self.visible_descendants(module))
    }

    /// Modules transitively reachable by following imports out of `module`.
    ///
    /// With `as_package`, starts from the module's whole package family and
    /// excludes the family from the result.
    pub fn find_downstream_modules(&self, module: &str, as_package: bool) -> BTreeSet<String> {
        self.closure(module, as_package, Direction::Imports)
    }

    /// Modules that transitively import `module` (or, with `as_package`, any
    /// module in its package family).
    pub fn find_upstream_modules(&self, module: &str, as_package: bool) -> BTreeSet<String> {
        self.closure(module, as_package, Direction::ImportedBy)
    }

    fn closure(&self, module: &str, as_package: bool, direction: Direction) -> BTreeSet<String> {
        let Some(id) = self.id(module) else {
            return BTreeSet::new();
        };
        let start = self.family(id, as_package);
        let reached = self.reachable(&start, direction);
        self.names(reached.difference(&start))
    }

    /// BFS from every module in `start`; each module is visited at most once.
    pub(crate) fn reachable(
        &self,
        start: &BTreeSet<ModuleId>,
        direction: Direction,
    ) -> BTreeSet<ModuleId> {
        let mut visited: BTreeSet<ModuleId> = start.clone();
        let mut queue: VecDeque<ModuleId> = start.iter().copied().collect();

        while let Some(mid) = queue.pop_front() {
            for &next in self.neighbours(mid, direction).iter() {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        visited
    }

    /// Visible modules adjacent to the visible module `id`.
    ///
    /// A squashed module contributes the imports of its whole stored subtree,
    /// and a hidden module on the far end is replaced by its squashed
    /// ancestor. Imports internal to the subtree are dropped; a real
    /// self-import of `id` is kept.
    pub(crate) fn neighbours(
        &self,
        id: ModuleId,
        direction: Direction,
    ) -> Cow<'_, BTreeSet<ModuleId>> {
        if !self.has_squashed_modules() {
            return Cow::Borrowed(self.adjacent(id, direction));
        }
        let mut collapsed = BTreeSet::new();
        for member in self.members(id) {
            for &other in self.adjacent(member, direction) {
                let visible = self.representative(other);
                if visible == id && !(member == id && other == id) {
                    continue;
                }
                collapsed.insert(visible);
            }
        }
        Cow::Owned(collapsed)
    }

    fn adjacent(&self, id: ModuleId, direction: Direction) -> &BTreeSet<ModuleId> {
        match direction {
            Direction::Imports => self.imports_of(id),
            Direction::ImportedBy => self.importers_of(id),
        }
    }

    /// The outermost squashed ancestor of `id`, or `id` itself when nothing
    /// above it is squashed.
    pub(crate) fn representative(&self, id: ModuleId) -> ModuleId {
        if !self.has_squashed_modules() {
            return id;
        }
        let mut representative = id;
        let mut current = module::parent_name(self.name(id));
        while let Some(parent) = current {
            if let Some(ancestor) = self.id(parent).filter(|&a| self.is_squashed(a)) {
                representative = ancestor;
            }
            current = module::parent_name(parent);
        }
        representative
    }

    /// Stored modules a visible module stands for: itself, plus its whole
    /// subtree when squashed.
    fn members(&self, id: ModuleId) -> Vec<ModuleId> {
        let mut members = vec![id];
        if self.is_squashed(id) {
            let prefix = format!("{}.", self.name(id));
            members.extend(
                self.ids_from(&prefix)
                    .take_while(|(candidate, _)| candidate.starts_with(&prefix))
                    .map(|(_, member)| member),
            );
        }
        members
    }

    /// The module (or its squashed ancestor, if hidden) plus, when
    /// `as_package`, its visible descendants.
    pub(crate) fn family(&self, id: ModuleId, as_package: bool) -> BTreeSet<ModuleId> {
        let id = self.representative(id);
        let mut family = BTreeSet::from([id]);
        if as_package {
            family.extend(self.visible_descendants(self.name(id)));
        }
        family
    }

    /// Descendants of `name` not hidden beneath a squashed module.
    fn visible_descendants(&self, name: &str) -> Vec<ModuleId> {
        if self.is_module_squashed(name) {
            return Vec::new();
        }
        let prefix = format!("{name}.");
        self.ids_from(&prefix)
            .take_while(|(candidate, _)| candidate.starts_with(&prefix))
            .filter(|(candidate, _)| !self.is_hidden_below(candidate, name))
            .map(|(_, id)| id)
            .collect()
    }

    /// Whether a squashed module sits strictly between `ancestor` and `name`.
    fn is_hidden_below(&self, name: &str, ancestor: &str) -> bool {
        let mut current = module::parent_name(name);
        while let Some(parent) = current {
            if parent == ancestor {
                return false;
            }
            if self.id(parent).is_some_and(|id| self.is_squashed(id)) {
                return true;
            }
            current = module::parent_name(parent);
        }
        false
    }
}
