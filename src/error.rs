//! Error types for the import graph engine.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors from graph mutation, path search, and layer contracts.
///
/// Display: lowercase, no trailing punctuation, so it composes into
/// larger error messages.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An operation needed a module that is not in the graph.
    #[error("module '{0}' is not present in the graph")]
    ModuleNotPresent(String),
    /// Empty name, empty segment, or whitespace in a module name.
    #[error("invalid module name '{0}'")]
    InvalidModuleName(String),
    /// Line numbers are 1-based.
    #[error("invalid line number 0 for import {0} -> {1}")]
    InvalidLineNumber(String, String),
    #[error("'{0}' is not a valid module expression")]
    InvalidModuleExpression(String),
    #[error("'{0}' is not a valid import expression")]
    InvalidImportExpression(String),
    /// Path search between families that overlap.
    #[error("modules '{0}' and '{1}' have shared descendants")]
    SharedDescendants(String, String),
    /// A layer container is not a module in the graph.
    #[error("container '{0}' does not exist")]
    NoSuchContainer(String),
    /// A layer name resolved to no module under any container.
    #[error("layer '{0}' does not exist in the graph")]
    LayerNotFound(String),
    /// A layer was declared with no module names.
    #[error("layer contains no modules")]
    EmptyLayer,
    #[error("cannot read layer contract '{}': {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid layer contract: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl Error {
    /// User-facing hint to accompany the error message.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::ModuleNotPresent(_) => Some("add the module with add_module before referring to it"),
            Self::InvalidModuleName(_) => Some("module names are dot-separated, e.g. mypackage.foo.bar"),
            Self::InvalidModuleExpression(_) | Self::InvalidImportExpression(_) => Some(
                "wildcards must replace a whole name segment: mypackage.*.foo or mypackage.** -> other.*",
            ),
            Self::NoSuchContainer(_) => Some("containers are absolute module names such as mypackage.foo"),
            Self::LayerNotFound(_) => {
                Some("layer names are relative to the containers when containers are given")
            }
            Self::SharedDescendants(..) => {
                Some("the importer and imported must not be the same module or contain one another")
            }
            _ => None,
        }
    }

    /// Whether the error comes from a malformed layer contract rather than
    /// from the graph itself.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoSuchContainer(_)
                | Self::LayerNotFound(_)
                | Self::EmptyLayer
                | Self::ConfigRead { .. }
                | Self::ConfigParse(_)
        )
    }
}
