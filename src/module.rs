//! Dotted module names and module expressions.
//!
//! A [`Module`] is a fully qualified name such as `mypackage.foo.bar`. Names
//! are validated once, at the graph's mutation boundary; everything past that
//! point assumes well-formed names.
//!
//! A [`ModuleExpression`] refers to a set of modules: `*` stands for exactly
//! one name segment, `**` for one or more.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Module {
    name: String,
}

impl Module {
    /// Validate and wrap a dotted name.
    pub fn new(name: &str) -> Result<Self> {
        if is_valid_name(name) {
            Ok(Self {
                name: name.to_owned(),
            })
        } else {
            Err(Error::InvalidModuleName(name.to_owned()))
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the top-level package, e.g. `mypackage` for `mypackage.foo.bar`.
    pub fn package_name(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    pub fn root(&self) -> Module {
        Module {
            name: self.package_name().to_owned(),
        }
    }

    /// Returns `None` for top-level modules.
    pub fn parent(&self) -> Option<Module> {
        parent_name(&self.name).map(|p| Module { name: p.to_owned() })
    }

    /// Number of segments: `a` is 1, `a.b.c` is 3.
    pub fn depth(&self) -> usize {
        depth(&self.name)
    }

    pub fn is_child_of(&self, other: &Module) -> bool {
        parent_name(&self.name) == Some(other.name.as_str())
    }

    pub fn is_descendant_of(&self, other: &Module) -> bool {
        is_descendant(&self.name, &other.name)
    }

    pub fn is_ancestor_of(&self, other: &Module) -> bool {
        is_descendant(&other.name, &self.name)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .split('.')
            .all(|seg| !seg.is_empty() && !seg.chars().any(char::is_whitespace))
}

pub(crate) fn parent_name(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(parent, _)| parent)
}

pub(crate) fn depth(name: &str) -> usize {
    name.bytes().filter(|&b| b == b'.').count() + 1
}

/// `a.b.c` is a descendant of `a` and `a.b`, not of `a.b.c` or `a.bc`.
pub(crate) fn is_descendant(name: &str, ancestor: &str) -> bool {
    name.len() > ancestor.len() + 1
        && name.starts_with(ancestor)
        && name.as_bytes()[ancestor.len()] == b'.'
}

/// A compiled module expression.
#[derive(Debug, Clone)]
pub struct ModuleExpression {
    source: String,
    pattern: Regex,
}

impl ModuleExpression {
    pub fn parse(expression: &str) -> Result<Self> {
        let invalid = || Error::InvalidModuleExpression(expression.to_owned());
        if expression.is_empty() {
            return Err(invalid());
        }

        let mut pattern = String::from("^");
        let mut previous_was_recursive = false;
        for (i, segment) in expression.split('.').enumerate() {
            if i > 0 {
                pattern.push_str(r"\.");
            }
            match segment {
                "*" => {
                    pattern.push_str(r"[^.]+");
                    previous_was_recursive = false;
                }
                "**" => {
                    // Two adjacent recursive wildcards are ambiguous.
                    if previous_was_recursive {
                        return Err(invalid());
                    }
                    pattern.push_str(r"[^.]+(?:\.[^.]+)*");
                    previous_was_recursive = true;
                }
                seg if seg.is_empty() || seg.contains('*') || seg.chars().any(char::is_whitespace) => {
                    return Err(invalid());
                }
                seg => {
                    pattern.push_str(&regex::escape(seg));
                    previous_was_recursive = false;
                }
            }
        }
        pattern.push('$');

        let pattern = Regex::new(&pattern).map_err(|_| invalid())?;
        Ok(Self {
            source: expression.to_owned(),
            pattern,
        })
    }

    pub fn is_match(&self, module: &str) -> bool {
        self.pattern.is_match(module)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for ModuleExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split `"importer_expr -> imported_expr"` into its two expressions.
pub(crate) fn parse_import_expression(
    expression: &str,
) -> Result<(ModuleExpression, ModuleExpression)> {
    let invalid = || Error::InvalidImportExpression(expression.to_owned());
    let (importer, imported) = expression.split_once("->").ok_or_else(invalid)?;
    let importer = ModuleExpression::parse(importer.trim()).map_err(|_| invalid())?;
    let imported = ModuleExpression::parse(imported.trim()).map_err(|_| invalid())?;
    Ok((importer, imported))
}
