//! Import graph storage.
//!
//! An [`ImportGraph`] is a directed graph of dotted module names connected by
//! import edges. Nodes are dense `u32`-indexed [`ModuleId`]s; slots freed by
//! `remove_module` are reused. Each module-level edge can carry any number of
//! [`ImportDetail`] records (one per source line that produced it).
//!
//! The graph owns its squash flags and import details; nothing is shared
//! between instances, so `clone()` yields a fully independent graph.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::module::{self, ModuleExpression};
use crate::traversal::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub(crate) struct ModuleId(pub(crate) u32);

#[derive(Debug, Clone)]
struct Node {
    name: String,
    squashed: bool,
}

/// Where a single import was found in the importing module's source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImportDetail {
    pub line_number: Option<u32>,
    pub line_contents: Option<String>,
}

/// An import together with the source line that produced it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DetailedImport {
    pub importer: String,
    pub imported: String,
    pub line_number: Option<u32>,
    pub line_contents: Option<String>,
}

impl fmt::Display for DetailedImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.importer, self.imported)?;
        if let Some(line) = self.line_number {
            write!(f, " (l. {line})")?;
        }
        Ok(())
    }
}

/// A module-level import, without line information.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DirectImport {
    pub importer: String,
    pub imported: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    /// Slots of removed modules keep their stale node until reused; they are
    /// unreachable because their ids leave `name_to_id` and every adjacency set.
    nodes: Vec<Node>,
    free_ids: Vec<ModuleId>,
    name_to_id: BTreeMap<String, ModuleId>,
    /// Outgoing imports per module (indexed by `ModuleId`)
    imports: Vec<BTreeSet<ModuleId>>,
    /// Incoming imports per module (indexed by `ModuleId`)
    importers: Vec<BTreeSet<ModuleId>>,
    details: HashMap<(ModuleId, ModuleId), BTreeSet<ImportDetail>>,
    import_count: usize,
    /// Live squashed modules. While zero, hierarchy-aware queries read the
    /// adjacency sets directly.
    squashed_count: usize,
}

impl ImportGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Mechanics ---

    /// Add a module, optionally squashed.
    ///
    /// Adding a module that already exists changes nothing, except that
    /// `is_squashed = true` squashes it. Re-adding never un-squashes.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_module(&mut self, name: &str, is_squashed: bool) -> Result<()> {
        if !module::is_valid_name(name) {
            return Err(Error::InvalidModuleName(name.to_owned()));
        }
        if let Some(id) = self.id(name) {
            if is_squashed {
                self.mark_squashed(id);
            }
            return Ok(());
        }

        let node = Node {
            name: name.to_owned(),
            squashed: is_squashed,
        };
        let id = if let Some(id) = self.free_ids.pop() {
            self.nodes[id.0 as usize] = node;
            id
        } else {
            let id = ModuleId(self.nodes.len() as u32);
            self.nodes.push(node);
            self.imports.push(BTreeSet::new());
            self.importers.push(BTreeSet::new());
            id
        };
        self.name_to_id.insert(name.to_owned(), id);
        if is_squashed {
            self.squashed_count += 1;
        }
        Ok(())
    }

    /// Remove a module and every import touching it. No-op if absent.
    pub fn remove_module(&mut self, name: &str) {
        let Some(id) = self.name_to_id.remove(name) else {
            return;
        };

        let imported = std::mem::take(&mut self.imports[id.0 as usize]);
        for target in imported {
            self.importers[target.0 as usize].remove(&id);
            self.details.remove(&(id, target));
            self.import_count -= 1;
        }
        let importers = std::mem::take(&mut self.importers[id.0 as usize]);
        for source in importers {
            // A self-import was already dropped with the outgoing edges.
            if self.imports[source.0 as usize].remove(&id) {
                self.details.remove(&(source, id));
                self.import_count -= 1;
            }
        }

        if self.node(id).squashed {
            self.squashed_count -= 1;
        }
        self.free_ids.push(id);
    }

    /// Mark a module as squashed: it stands in for its whole subtree in
    /// hierarchy-aware queries. Stored descendants and their imports are kept;
    /// those queries attribute the descendants' imports to the squashed module.
    pub fn squash_module(&mut self, name: &str) -> Result<()> {
        let id = self.require(name)?;
        self.mark_squashed(id);
        Ok(())
    }

    fn mark_squashed(&mut self, id: ModuleId) {
        let node = self.node_mut(id);
        if !node.squashed {
            node.squashed = true;
            self.squashed_count += 1;
        }
    }

    /// False for unknown modules.
    pub fn is_module_squashed(&self, name: &str) -> bool {
        self.id(name).is_some_and(|id| self.node(id).squashed)
    }

    pub fn contains_module(&self, name: &str) -> bool {
        self.name_to_id.contains_key(name)
    }

    /// Names of all modules in the graph.
    pub fn modules(&self) -> BTreeSet<String> {
        self.name_to_id.keys().cloned().collect()
    }

    pub fn module_count(&self) -> usize {
        self.name_to_id.len()
    }

    /// Record that `importer` imports `imported`.
    ///
    /// Both modules must already be present. Calling this again for an
    /// existing import only adds the line details (identical details are
    /// stored once). Details are recorded only when at least one of
    /// `line_number`/`line_contents` is given.
    pub fn add_import(
        &mut self,
        importer: &str,
        imported: &str,
        line_number: Option<u32>,
        line_contents: Option<&str>,
    ) -> Result<()> {
        let from = self.require(importer)?;
        let to = self.require(imported)?;
        if line_number == Some(0) {
            return Err(Error::InvalidLineNumber(importer.to_owned(), imported.to_owned()));
        }

        if self.imports[from.0 as usize].insert(to) {
            self.importers[to.0 as usize].insert(from);
            self.import_count += 1;
        }
        if line_number.is_some() || line_contents.is_some() {
            self.details.entry((from, to)).or_default().insert(ImportDetail {
                line_number,
                line_contents: line_contents.map(str::to_owned),
            });
        }
        Ok(())
    }

    /// Remove an import and all its details. No-op if absent.
    pub fn remove_import(&mut self, importer: &str, imported: &str) {
        let (Some(from), Some(to)) = (self.id(importer), self.id(imported)) else {
            return;
        };
        if self.imports[from.0 as usize].remove(&to) {
            self.importers[to.0 as usize].remove(&from);
            self.details.remove(&(from, to));
            self.import_count -= 1;
        }
    }

    /// Number of distinct (importer, imported) pairs.
    pub fn count_imports(&self) -> usize {
        self.import_count
    }

    // --- Direct imports ---

    pub fn find_modules_directly_imported_by(&self, module: &str) -> BTreeSet<String> {
        self.id(module)
            .map(|id| self.names(self.imports_of(id)))
            .unwrap_or_default()
    }

    pub fn find_modules_that_directly_import(&self, module: &str) -> BTreeSet<String> {
        self.id(module)
            .map(|id| self.names(self.importers_of(id)))
            .unwrap_or_default()
    }

    /// Whether `importer` directly imports `imported`.
    ///
    /// With `as_packages`, true if any module in the importer's package family
    /// directly imports any module in the imported's package family.
    pub fn direct_import_exists(&self, importer: &str, imported: &str, as_packages: bool) -> bool {
        let (Some(from), Some(to)) = (self.id(importer), self.id(imported)) else {
            return false;
        };
        if !as_packages {
            return self.imports_of(from).contains(&to);
        }

        let targets = self.family(to, true);
        self.family(from, true).iter().any(|&m| {
            self.neighbours(m, Direction::Imports)
                .iter()
                .any(|t| targets.contains(t))
        })
    }

    /// Every recorded source line for the import, ordered by line number.
    /// Empty if the import does not exist or was added without details.
    pub fn get_import_details(&self, importer: &str, imported: &str) -> Vec<DetailedImport> {
        let (Some(from), Some(to)) = (self.id(importer), self.id(imported)) else {
            return Vec::new();
        };
        self.details
            .get(&(from, to))
            .map(|details| {
                details
                    .iter()
                    .map(|d| DetailedImport {
                        importer: importer.to_owned(),
                        imported: imported.to_owned(),
                        line_number: d.line_number,
                        line_contents: d.line_contents.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    // --- Expressions ---

    /// Modules matching a module expression (`*` = one segment, `**` = one or more).
    pub fn find_matching_modules(&self, expression: &str) -> Result<BTreeSet<String>> {
        let expr = ModuleExpression::parse(expression)?;
        Ok(self
            .name_to_id
            .keys()
            .filter(|name| expr.is_match(name))
            .cloned()
            .collect())
    }

    /// Direct imports matching `"importer_expr -> imported_expr"`, ordered by
    /// importer, then imported.
    pub fn find_matching_direct_imports(&self, import_expression: &str) -> Result<Vec<DirectImport>> {
        let (importer_expr, imported_expr) = module::parse_import_expression(import_expression)?;
        let mut matches = Vec::new();
        for (name, &id) in &self.name_to_id {
            if !importer_expr.is_match(name) {
                continue;
            }
            let mut imported: Vec<&str> = self
                .imports_of(id)
                .iter()
                .map(|&t| self.name(t))
                .filter(|t| imported_expr.is_match(t))
                .collect();
            imported.sort_unstable();
            matches.extend(imported.into_iter().map(|t| DirectImport {
                importer: name.clone(),
                imported: t.to_owned(),
            }));
        }
        Ok(matches)
    }

    // --- Internal accessors ---

    pub(crate) fn id(&self, name: &str) -> Option<ModuleId> {
        self.name_to_id.get(name).copied()
    }

    pub(crate) fn require(&self, name: &str) -> Result<ModuleId> {
        self.id(name)
            .ok_or_else(|| Error::ModuleNotPresent(name.to_owned()))
    }

    fn node(&self, id: ModuleId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: ModuleId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub(crate) fn name(&self, id: ModuleId) -> &str {
        &self.node(id).name
    }

    pub(crate) fn is_squashed(&self, id: ModuleId) -> bool {
        self.node(id).squashed
    }

    pub(crate) fn has_squashed_modules(&self) -> bool {
        self.squashed_count > 0
    }

    pub(crate) fn imports_of(&self, id: ModuleId) -> &BTreeSet<ModuleId> {
        &self.imports[id.0 as usize]
    }

    pub(crate) fn importers_of(&self, id: ModuleId) -> &BTreeSet<ModuleId> {
        &self.importers[id.0 as usize]
    }

    /// Ids of modules whose names fall in the `[from, ..)` key range.
    pub(crate) fn ids_from<'a>(
        &'a self,
        from: &'a str,
    ) -> impl Iterator<Item = (&'a str, ModuleId)> + 'a {
        self.name_to_id
            .range::<str, _>((std::ops::Bound::Included(from), std::ops::Bound::Unbounded))
            .map(|(name, &id)| (name.as_str(), id))
    }

    pub(crate) fn names<'a>(&self, ids: impl IntoIterator<Item = &'a ModuleId>) -> BTreeSet<String> {
        ids.into_iter().map(|&id| self.name(id).to_owned()).collect()
    }

    pub(crate) fn chain_names(&self, chain: &[ModuleId]) -> Vec<String> {
        chain.iter().map(|&id| self.name(id).to_owned()).collect()
    }
}

/// Displays as `<ImportGraph: 'one', 'two', ...>`, listing at most five modules.
impl fmt::Display for ImportGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SHOWN: usize = 5;
        if self.name_to_id.is_empty() {
            return write!(f, "<ImportGraph: empty>");
        }
        let listed: Vec<String> = self
            .name_to_id
            .keys()
            .take(SHOWN)
            .map(|n| format!("'{n}'"))
            .collect();
        write!(f, "<ImportGraph: {}", listed.join(", "))?;
        if self.name_to_id.len() > SHOWN {
            write!(f, ", ...")?;
        }
        write!(f, ">")
    }
}
