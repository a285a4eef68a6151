//! Roll-up of measures through the source tree.

mod common;

use common::fixtures::*;
use common::mock::MemorySource;
use squid_bytecode::domain::metric::{MeasureValue, Metric};
use squid_bytecode::domain::resource::package_of;
use std::collections::BTreeMap;
use squid_bytecode::domain::source_tree::Scope;
use squid_bytecode::{AnalysisInput, EngineConfig, SquidEngine};

const TREE_JSON: &str = r#"{
    "key": "tags",
    "packages": [
        {
            "key": "tags",
            "measures": { "complexity": 7 },
            "files": [
                {
                    "key": "tags/Tag.java",
                    "measures": { "lines": 10, "complexity": 2 },
                    "classes": [{ "key": "tags/Tag" }]
                },
                {
                    "key": "tags/Line.java",
                    "measures": { "lines": 20, "complexity": 2 },
                    "classes": [{ "key": "tags/Line" }]
                }
            ]
        },
        {
            "key": "tags/impl",
            "files": [
                {
                    "key": "tags/impl/Todo.java",
                    "measures": { "lines": 30 },
                    "classes": [{ "key": "tags/impl/Todo" }]
                }
            ]
        }
    ]
}"#;

fn full_report() -> squid_bytecode::AnalysisReport {
    let classes = MemorySource::new(tags_classes());
    let libraries = MemorySource::new(platform_classes());
    common::analyze(&classes, &libraries, EngineConfig::default())
}

fn double(value: Option<&MeasureValue>) -> f64 {
    value.and_then(MeasureValue::as_f64).unwrap()
}

#[test]
fn test_counts_roll_up_to_project() {
    let report = full_report();
    let tree = report.tree();
    assert!(tree.is_well_formed());

    let root = tree.root();
    assert_eq!(tree.measure(root, Metric::Packages), Some(&MeasureValue::Int(2)));
    assert_eq!(tree.measure(root, Metric::Files), Some(&MeasureValue::Int(9)));
    assert_eq!(tree.measure(root, Metric::Classes), Some(&MeasureValue::Int(9)));
    assert_eq!(tree.measure(root, Metric::Functions), Some(&MeasureValue::Int(21)));

    assert_eq!(report.int_measure(Scope::Package, "tags", Metric::Classes), Some(6));
    assert_eq!(report.int_measure(Scope::Package, "tags/impl", Metric::Classes), Some(3));
    assert_eq!(report.int_measure(Scope::Class, TODO, Metric::Functions), Some(6));
}

#[test]
fn test_file_max_and_package_means() {
    let report = full_report();

    assert_eq!(report.int_measure(Scope::File, "tags/impl/Todo.java", Metric::Rfc), Some(9));
    assert_eq!(report.int_measure(Scope::Class, FIX_ME, Metric::Rfc), Some(5));
    assert_eq!(report.int_measure(Scope::Class, LANGUAGE, Metric::Rfc), Some(1));
    assert_eq!(report.int_measure(Scope::Class, FIX_ME, Metric::Lcom4), Some(2));
    assert_eq!(report.int_measure(Scope::Class, LANGUAGE, Metric::Lcom4), Some(1));

    let rfc = double(report.measure(Scope::Package, "tags/impl", Metric::Rfc));
    assert!((rfc - 5.0).abs() < 1e-9);
    let lcom4 = double(report.measure(Scope::Package, "tags/impl", Metric::Lcom4));
    assert!((lcom4 - 2.0).abs() < 1e-9);
    let density = double(report.measure(Scope::Package, "tags/impl", Metric::SuspectLcom4Density));
    assert!((density - 200.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_distributions_only_above_files() {
    let report = full_report();
    for metric in [Metric::RfcDistribution, Metric::Lcom4Distribution] {
        assert!(report.measure(Scope::Class, TODO, metric).is_none());
        assert!(report.measure(Scope::File, "tags/impl/Todo.java", metric).is_none());
        assert!(report.measure(Scope::Package, "tags/impl", metric).is_some());
        assert!(report.measure(Scope::Project, "tags", metric).is_some());
    }
    match report.measure(Scope::Package, "tags/impl", Metric::Lcom4Distribution) {
        // Todo (3) and FixMe (2); Language (1) is below the first limit.
        Some(MeasureValue::Distribution(d)) => assert_eq!(d.total(), 2),
        other => panic!("unexpected {other:?}"),
    }
    match report.measure(Scope::Project, "tags", Metric::RfcDistribution) {
        Some(MeasureValue::Distribution(d)) => assert_eq!(d.total(), 9),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_coupling_per_granularity() {
    let report = full_report();
    assert_eq!(report.int_measure(Scope::Package, "tags/impl", Metric::Ce), Some(1));
    assert_eq!(report.int_measure(Scope::Package, "tags", Metric::Ca), Some(1));
    assert_eq!(report.int_measure(Scope::Package, "tags", Metric::Ce), Some(0));
    assert_eq!(report.int_measure(Scope::File, "tags/Tag.java", Metric::Ca), Some(2));

    let root = report.tree().root();
    assert_eq!(
        report.tree().measure(root, Metric::PackageEdgesWeight),
        Some(&MeasureValue::Int(13))
    );
    assert_eq!(
        report.tree().measure(root, Metric::PackageCycles),
        Some(&MeasureValue::Int(0))
    );
}

#[test]
fn test_package_edge_weight_sums_class_edges() {
    let report = full_report();
    let dependencies = report.dependencies();

    let mut expected: BTreeMap<(String, String), u32> = BTreeMap::new();
    for edge in dependencies.edges(Scope::Class) {
        let (from, to) = (package_of(&edge.from), package_of(&edge.to));
        if from != to {
            *expected.entry((from.to_string(), to.to_string())).or_default() += edge.weight;
        }
    }
    let actual: BTreeMap<(String, String), u32> = dependencies
        .edges(Scope::Package)
        .into_iter()
        .map(|edge| ((edge.from, edge.to), edge.weight))
        .collect();

    assert!(!actual.is_empty());
    assert_eq!(actual, expected);
    for ((from, to), weight) in &expected {
        assert_eq!(report.edge(Scope::Package, from, to).unwrap().weight, *weight);
    }
}

#[test]
fn test_supplied_tree_scopes_analysis() {
    let sample = TagsSample::write().unwrap();
    let tree_path = sample.dir.path().join("tree.json");
    std::fs::write(&tree_path, TREE_JSON).unwrap();

    let input = AnalysisInput::new("ignored", vec![sample.classes.clone()])
        .with_libraries(vec![sample.platform.clone()])
        .with_tree_file(&tree_path)
        .unwrap();
    let report = SquidEngine::new(EngineConfig::default()).analyze(&input).unwrap();
    let tree = report.tree();
    let root = tree.root();

    assert_eq!(tree.node(root).key, "tags");
    assert_eq!(tree.measure(root, Metric::Lines), Some(&MeasureValue::Int(60)));
    assert_eq!(tree.measure(root, Metric::Classes), Some(&MeasureValue::Int(3)));
    assert_eq!(tree.measure(root, Metric::Functions), Some(&MeasureValue::Int(10)));
    // A supplied value wins over the children's sum.
    assert_eq!(report.int_measure(Scope::Package, "tags", Metric::Complexity), Some(7));

    // Only classes of the tree are analyzed and counted as dependencies.
    assert_eq!(report.int_measure(Scope::Class, TODO, Metric::Rfc), Some(9));
    assert_eq!(report.int_measure(Scope::Class, TAG, Metric::Noc), Some(1));
    assert_eq!(report.int_measure(Scope::Class, TAG, Metric::Ce), Some(1));
    let packages = report.edge(Scope::Package, "tags/impl", "tags").unwrap();
    assert_eq!(packages.weight, 4);
}

#[test]
fn test_engine_computed_metric_in_tree_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.json");
    std::fs::write(&path, r#"{ "key": "tags", "measures": { "lcom4": 2 } }"#).unwrap();
    let input = AnalysisInput::new("tags", Vec::new());
    assert!(input.with_tree_file(&path).is_err());
}
