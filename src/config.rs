//! Layer contracts loaded from TOML.
//!
//! ```toml
//! containers = ["mypackage"]
//! layers = [
//!     "api",
//!     { modules = ["orders", "billing"], independent = false, closed = true },
//!     ["domain", "events"],
//!     "utils",
//! ]
//! ```
//!
//! Each entry in `layers` is a single module name, a list of independent
//! sibling modules, or a table spelling out the flags.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::ImportGraph;
use crate::layers::{Layer, PackageDependency};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayersConfig {
    #[serde(default)]
    pub containers: BTreeSet<String>,
    pub layers: Vec<LayerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayerEntry {
    Module(String),
    Siblings(Vec<String>),
    Detailed {
        modules: Vec<String>,
        #[serde(default = "default_independent")]
        independent: bool,
        #[serde(default)]
        closed: bool,
    },
}

fn default_independent() -> bool {
    true
}

impl From<&LayerEntry> for Layer {
    fn from(entry: &LayerEntry) -> Self {
        match entry {
            LayerEntry::Module(name) => Layer::new([name.as_str()]),
            LayerEntry::Siblings(names) => Layer::new(names.iter().map(String::as_str)),
            LayerEntry::Detailed {
                modules,
                independent,
                closed,
            } => Layer::new(modules.iter().map(String::as_str))
                .with_independent(*independent)
                .with_closed(*closed),
        }
    }
}

impl LayersConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(
            path = %path.display(),
            layers = config.layers.len(),
            containers = config.containers.len(),
            "loaded layer contract"
        );
        Ok(config)
    }

    /// Layers from highest to lowest.
    pub fn layers(&self) -> Vec<Layer> {
        self.layers.iter().map(Layer::from).collect()
    }

    /// `None` when the layer names are absolute.
    pub fn containers(&self) -> Option<&BTreeSet<String>> {
        (!self.containers.is_empty()).then_some(&self.containers)
    }
}

impl ImportGraph {
    /// Check the graph against a loaded layer contract.
    pub fn check_layers(&self, config: &LayersConfig) -> Result<BTreeSet<PackageDependency>> {
        self.find_illegal_dependencies_for_layers(&config.layers(), config.containers())
    }
}
