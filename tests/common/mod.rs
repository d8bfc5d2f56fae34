#![allow(dead_code)]

use std::collections::BTreeSet;

use layergraph::ImportGraph;

/// Route `tracing` output to the test harness; `RUST_LOG=layergraph=trace`
/// shows each search.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a graph from import pairs. Every endpoint (and every ancestor
/// package of every endpoint) is added as a module first.
pub fn graph(imports: &[(&str, &str)]) -> ImportGraph {
    let mut g = ImportGraph::new();
    for (importer, imported) in imports {
        add_with_ancestors(&mut g, importer);
        add_with_ancestors(&mut g, imported);
        g.add_import(importer, imported, None, None).unwrap();
    }
    g
}

pub fn add_with_ancestors(g: &mut ImportGraph, name: &str) {
    let mut prefix = String::new();
    for segment in name.split('.') {
        if !prefix.is_empty() {
            prefix.push('.');
        }
        prefix.push_str(segment);
        g.add_module(&prefix, false).unwrap();
    }
}

pub fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

pub fn chain(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

/// A small layered project:
///
///   mypackage.high  -> imports mypackage.mid.api      (legal)
///   mypackage.mid   -> imports mypackage.low.utils    (legal)
///   mypackage.low.x -> imports mypackage.high.views   (illegal: low -> high)
///   mypackage.low.y -> imports shared.helpers -> mypackage.mid.api (illegal via shared)
pub struct LayeredProject {
    pub graph: ImportGraph,
}

impl LayeredProject {
    pub fn new() -> Self {
        let graph = graph(&[
            ("mypackage.high.views", "mypackage.mid.api"),
            ("mypackage.mid.api", "mypackage.low.utils"),
            ("mypackage.low.x", "mypackage.high.views"),
            ("mypackage.low.y", "shared.helpers"),
            ("shared.helpers", "mypackage.mid.api"),
        ]);
        Self { graph }
    }

    pub fn containers() -> BTreeSet<String> {
        set(&["mypackage"])
    }
}
