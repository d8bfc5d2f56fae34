#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

//! Import graph engine for architecture linting.
//!
//! An [`ImportGraph`] holds dotted module names and the imports between them.
//! On top of it sit package-aware traversal, shortest-chain search, and
//! [`find_illegal_dependencies_for_layers`](ImportGraph::find_illegal_dependencies_for_layers),
//! which reports layer violations as compressed [`Route`]s.

pub mod chains;
pub mod config;
pub mod error;
pub mod graph;
pub mod layers;
pub mod module;
pub mod traversal;

pub use config::LayersConfig;
pub use error::{Error, Result};
pub use graph::{DetailedImport, DirectImport, ImportDetail, ImportGraph};
pub use layers::{Layer, PackageDependency, Route};
pub use module::{Module, ModuleExpression};
