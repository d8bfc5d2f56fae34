mod common;

use std::collections::BTreeSet;

use common::{graph, init_tracing, set, LayeredProject};
use layergraph::{Error, Layer, LayersConfig, PackageDependency, Route};

fn route(heads: &[&str], middle: &[&str], tails: &[&str]) -> Route {
    Route {
        heads: set(heads),
        middle: middle.iter().map(|s| (*s).to_string()).collect(),
        tails: set(tails),
    }
}

fn dependency(importer: &str, imported: &str, routes: Vec<Route>) -> PackageDependency {
    PackageDependency {
        importer: importer.to_string(),
        imported: imported.to_string(),
        routes: routes.into_iter().collect(),
    }
}

fn layers(names: &[&str]) -> Vec<Layer> {
    names.iter().map(|&n| Layer::from(n)).collect()
}

fn deps(items: Vec<PackageDependency>) -> BTreeSet<PackageDependency> {
    items.into_iter().collect()
}

// --- Basic direction ---

#[test]
fn lower_layer_importing_higher_is_reported() {
    let g = graph(&[("a.x", "b.y")]);
    let found = g.find_illegal_dependencies_for_layers(&layers(&["b", "a"]), None).unwrap();
    assert_eq!(
        found,
        deps(vec![dependency("a", "b", vec![route(&["a.x"], &[], &["b.y"])])])
    );
}

#[test]
fn higher_layer_importing_lower_is_legal() {
    let g = graph(&[("a.x", "b.y")]);
    let found = g.find_illegal_dependencies_for_layers(&layers(&["a", "b"]), None).unwrap();
    assert!(found.is_empty());
}

#[test]
fn heads_sharing_a_middle_are_merged() {
    let g = graph(&[("a.x1", "m"), ("a.x2", "m"), ("m", "b.y")]);
    let found = g.find_illegal_dependencies_for_layers(&layers(&["b", "a"]), None).unwrap();
    assert_eq!(
        found,
        deps(vec![dependency(
            "a",
            "b",
            vec![route(&["a.x1", "a.x2"], &["m"], &["b.y"])]
        )])
    );
}

#[test]
fn long_middle_collects_all_heads_and_tails() {
    let g = graph(&[
        ("low.one", "m1"),
        ("low.two", "m1"),
        ("m1", "m2"),
        ("m2", "m3"),
        ("m3", "high.one"),
        ("m3", "high.two"),
    ]);
    let found = g
        .find_illegal_dependencies_for_layers(&layers(&["high", "low"]), None)
        .unwrap();
    assert_eq!(
        found,
        deps(vec![dependency(
            "low",
            "high",
            vec![route(&["low.one", "low.two"], &["m1", "m2", "m3"], &["high.one", "high.two"])]
        )])
    );
}

#[test]
fn distinct_middles_are_separate_routes() {
    let g = graph(&[("low.x", "m1"), ("low.x", "m2"), ("m1", "high.y"), ("m2", "high.y")]);
    let found = g
        .find_illegal_dependencies_for_layers(&layers(&["high", "low"]), None)
        .unwrap();
    assert_eq!(
        found,
        deps(vec![dependency(
            "low",
            "high",
            vec![
                route(&["low.x"], &["m1"], &["high.y"]),
                route(&["low.x"], &["m2"], &["high.y"]),
            ]
        )])
    );
}

#[test]
fn direct_imports_are_never_merged() {
    let g = graph(&[
        ("low.one", "high.one"),
        ("low.two", "high.one"),
        ("low.three", "m"),
        ("m", "high.two"),
    ]);
    let found = g
        .find_illegal_dependencies_for_layers(&layers(&["high", "low"]), None)
        .unwrap();
    assert_eq!(
        found,
        deps(vec![dependency(
            "low",
            "high",
            vec![
                route(&["low.one"], &[], &["high.one"]),
                route(&["low.two"], &[], &["high.one"]),
                route(&["low.three"], &["m"], &["high.two"]),
            ]
        )])
    );
}

#[test]
fn import_from_layer_package_itself_counts() {
    let g = graph(&[("low", "high.views")]);
    let found = g
        .find_illegal_dependencies_for_layers(&layers(&["high", "low"]), None)
        .unwrap();
    assert_eq!(
        found,
        deps(vec![dependency("low", "high", vec![route(&["low"], &[], &["high.views"])])])
    );
}

// --- Other layers ---

#[test]
fn chains_through_other_layers_are_attributed_to_each_hop() {
    // low -> mid -> high: two violations, not a third low -> high via mid.
    let g = graph(&[("low.a", "mid.b"), ("mid.b", "high.c")]);
    let found = g
        .find_illegal_dependencies_for_layers(&layers(&["high", "mid", "low"]), None)
        .unwrap();
    assert_eq!(
        found,
        deps(vec![
            dependency("low", "mid", vec![route(&["low.a"], &[], &["mid.b"])]),
            dependency("mid", "high", vec![route(&["mid.b"], &[], &["high.c"])]),
        ])
    );
}

#[test]
fn layered_project_in_container() {
    init_tracing();
    let project = LayeredProject::new();
    let found = project
        .graph
        .find_illegal_dependencies_for_layers(
            &layers(&["high", "mid", "low"]),
            Some(&LayeredProject::containers()),
        )
        .unwrap();
    assert_eq!(
        found,
        deps(vec![
            dependency(
                "mypackage.low",
                "mypackage.high",
                vec![route(&["mypackage.low.x"], &[], &["mypackage.high.views"])]
            ),
            dependency(
                "mypackage.low",
                "mypackage.mid",
                vec![route(&["mypackage.low.y"], &["shared.helpers"], &["mypackage.mid.api"])]
            ),
        ])
    );
}

#[test]
fn results_are_deterministic() {
    let project = LayeredProject::new();
    let containers = LayeredProject::containers();
    let layers = layers(&["high", "mid", "low"]);
    let first = project
        .graph
        .find_illegal_dependencies_for_layers(&layers, Some(&containers))
        .unwrap();
    for _ in 0..5 {
        let again = project
            .graph
            .find_illegal_dependencies_for_layers(&layers, Some(&containers))
            .unwrap();
        assert_eq!(again, first);
    }
}

// --- Sibling layers ---

#[test]
fn independent_siblings_may_not_import_each_other() {
    let g = graph(&[("a.x", "b.y")]);
    let found = g
        .find_illegal_dependencies_for_layers(&[Layer::new(["a", "b"])], None)
        .unwrap();
    assert_eq!(
        found,
        deps(vec![dependency("a", "b", vec![route(&["a.x"], &[], &["b.y"])])])
    );
}

#[test]
fn non_independent_siblings_may_import_each_other() {
    let g = graph(&[("a.x", "b.y"), ("b.y", "a.x")]);
    let found = g
        .find_illegal_dependencies_for_layers(
            &[Layer::new(["a", "b"]).with_independent(false)],
            None,
        )
        .unwrap();
    assert!(found.is_empty());
}

#[test]
fn siblings_still_respect_lower_layers() {
    let g = graph(&[("low.x", "b.y"), ("a.x", "low.y")]);
    let found = g
        .find_illegal_dependencies_for_layers(
            &[Layer::new(["a", "b"]).with_independent(false), Layer::from("low")],
            None,
        )
        .unwrap();
    assert_eq!(
        found,
        deps(vec![dependency("low", "b", vec![route(&["low.x"], &[], &["b.y"])])])
    );
}

// --- Closed layers ---

#[test]
fn bypassing_a_closed_layer_is_reported() {
    let g = graph(&[("high.x", "low.y"), ("mid.z", "low.y")]);
    let contract = [
        Layer::from("high"),
        Layer::from("mid").with_closed(true),
        Layer::from("low"),
    ];
    let found = g.find_illegal_dependencies_for_layers(&contract, None).unwrap();
    assert_eq!(
        found,
        deps(vec![dependency("high", "low", vec![route(&["high.x"], &[], &["low.y"])])])
    );
}

#[test]
fn going_through_a_closed_layer_is_legal() {
    let g = graph(&[("high.x", "mid.z"), ("mid.z", "low.y")]);
    let contract = [
        Layer::from("high"),
        Layer::from("mid").with_closed(true),
        Layer::from("low"),
    ];
    assert!(g.find_illegal_dependencies_for_layers(&contract, None).unwrap().is_empty());
}

#[test]
fn open_layers_can_be_skipped() {
    let g = graph(&[("high.x", "low.y"), ("mid.z", "low.y")]);
    let found = g
        .find_illegal_dependencies_for_layers(&layers(&["high", "mid", "low"]), None)
        .unwrap();
    assert!(found.is_empty());
}

// --- Containers ---

#[test]
fn each_container_is_checked_separately() {
    let g = graph(&[
        ("one.low.x", "one.high.y"),
        ("two.high.y", "two.low.x"),
        // Across containers the layers do not constrain each other.
        ("one.low.x", "two.high.y"),
    ]);
    let found = g
        .find_illegal_dependencies_for_layers(&layers(&["high", "low"]), Some(&set(&["one", "two"])))
        .unwrap();
    assert_eq!(
        found,
        deps(vec![dependency(
            "one.low",
            "one.high",
            vec![route(&["one.low.x"], &[], &["one.high.y"])]
        )])
    );
}

#[test]
fn layer_missing_from_one_container_is_skipped() {
    let mut g = graph(&[("one.low.x", "one.high.y")]);
    g.add_module("two", false).unwrap();
    g.add_module("two.high", false).unwrap();
    let found = g
        .find_illegal_dependencies_for_layers(&layers(&["high", "low"]), Some(&set(&["one", "two"])))
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[test]
fn empty_container_set_means_absolute_names() {
    let g = graph(&[("a.x", "b.y")]);
    let found = g
        .find_illegal_dependencies_for_layers(&layers(&["b", "a"]), Some(&BTreeSet::new()))
        .unwrap();
    assert_eq!(found.len(), 1);
}

// --- Errors ---

#[test]
fn unknown_container_is_an_error() {
    let g = graph(&[("a.x", "b.y")]);
    let err = g
        .find_illegal_dependencies_for_layers(&layers(&["b", "a"]), Some(&set(&["nope"])))
        .unwrap_err();
    assert!(matches!(err, Error::NoSuchContainer(ref c) if c == "nope"));
    assert!(err.is_configuration());
}

#[test]
fn unknown_layer_is_an_error() {
    let g = graph(&[("a.x", "b.y")]);
    let err = g
        .find_illegal_dependencies_for_layers(&layers(&["b", "zzz", "a"]), None)
        .unwrap_err();
    assert!(matches!(err, Error::LayerNotFound(ref l) if l == "zzz"));
}

#[test]
fn empty_layer_is_an_error() {
    let g = graph(&[("a.x", "b.y")]);
    let err = g
        .find_illegal_dependencies_for_layers(&[Layer::from("b"), Layer::new(Vec::<String>::new())], None)
        .unwrap_err();
    assert!(matches!(err, Error::EmptyLayer));
}

// --- Squashing and config ---

#[test]
fn squashed_layer_stands_for_itself_only() {
    let mut g = graph(&[("low.x", "high.y"), ("low", "high")]);
    g.squash_module("low").unwrap();
    let found = g
        .find_illegal_dependencies_for_layers(&layers(&["high", "low"]), None)
        .unwrap();
    assert_eq!(
        found,
        deps(vec![dependency("low", "high", vec![route(&["low"], &[], &["high"])])])
    );
}

#[test]
fn squashed_subpackage_inside_layer_is_part_of_it() {
    let mut g = graph(&[("low.a", "low.sub.x"), ("low.sub.x", "high.y")]);
    g.squash_module("low.sub").unwrap();
    let found = g
        .find_illegal_dependencies_for_layers(&layers(&["high", "low"]), None)
        .unwrap();
    assert_eq!(
        found,
        deps(vec![dependency("low", "high", vec![route(&["low.sub"], &[], &["high.y"])])])
    );
    for dependency in &found {
        for route in &dependency.routes {
            assert!(route.middle.iter().all(|m| !m.starts_with("low.")));
        }
    }
}

#[test]
fn squashed_middle_package_is_reported_by_name() {
    let mut g = graph(&[("low.a", "ext.inner.one"), ("ext.inner.two", "high.y")]);
    g.squash_module("ext").unwrap();
    let found = g
        .find_illegal_dependencies_for_layers(&layers(&["high", "low"]), None)
        .unwrap();
    assert_eq!(
        found,
        deps(vec![dependency("low", "high", vec![route(&["low.a"], &["ext"], &["high.y"])])])
    );
}

#[test]
fn nested_layers_are_skipped_without_error() {
    init_tracing();
    let g = graph(&[("app.core.x", "app.views"), ("app.views", "app.core.y")]);
    let found = g
        .find_illegal_dependencies_for_layers(&layers(&["app", "app.core"]), None)
        .unwrap();
    assert!(found.is_empty());
}

#[test]
fn check_layers_uses_loaded_contract() {
    let config = LayersConfig::from_toml_str(
        r#"
        containers = ["mypackage"]
        layers = ["high", "mid", "low"]
        "#,
    )
    .unwrap();
    let found = LayeredProject::new().graph.check_layers(&config).unwrap();
    let pairs: Vec<(&str, &str)> = found
        .iter()
        .map(|d| (d.importer.as_str(), d.imported.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("mypackage.low", "mypackage.high"), ("mypackage.low", "mypackage.mid")]
    );
}

#[test]
fn dependencies_serialize_to_json() {
    let g = graph(&[("a.x", "b.y")]);
    let found = g.find_illegal_dependencies_for_layers(&layers(&["b", "a"]), None).unwrap();
    let json = serde_json::to_value(&found).unwrap();
    assert_eq!(json[0]["importer"], "a");
    assert_eq!(json[0]["routes"][0]["heads"][0], "a.x");
    assert_eq!(json[0]["routes"][0]["middle"].as_array().unwrap().len(), 0);
}
