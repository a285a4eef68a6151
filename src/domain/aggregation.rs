//! Bottom-up roll-up of the measures visitors left on classes.
//!
//! SUM metrics: a node keeps its own supplied value, else the sum of its
//! children. Calculated metrics are computed per level: coupling from the
//! dependency index at that granularity, RFC/LCOM4 as max per file and
//! file-weighted means above. Distributions are built per file but only
//! stored on packages and the project.

use crate::config::EngineConfig;
use crate::domain::dependency::DependencyGraph;
use crate::domain::metric::{Distribution, MeasureValue, Metric};
use crate::domain::source_tree::{Scope, SourceTree, TreeId};
use std::collections::HashSet;
use tracing::debug;

pub fn aggregate(tree: &mut SourceTree, dependencies: &DependencyGraph, config: &EngineConfig) {
    set_leaf_counts(tree);
    sum_up(tree);
    set_coupling(tree, dependencies);

    let mut project = Rollup::new(config);
    for package in tree.ids(Scope::Package) {
        let mut rollup = Rollup::new(config);
        let files: Vec<TreeId> = tree.node(package).children.clone();
        for &file in &files {
            rollup_file(tree, file, &mut rollup, config);
        }
        rollup.store(tree, package);

        let keys: HashSet<String> = files.iter().map(|&f| tree.node(f).key.clone()).collect();
        let within = |key: &str| keys.contains(key);
        let weight = dependencies.internal_weight(Scope::File, within);
        let cycles = dependencies.cycles(Scope::File, within);
        tree.set_measure(package, Metric::FileEdgesWeight, MeasureValue::Int(weight as i64));
        tree.set_measure(package, Metric::FileCycles, MeasureValue::Int(cycles as i64));

        project.merge(&rollup);
    }

    let root = tree.root();
    project.store(tree, root);
    let weight = dependencies.internal_weight(Scope::Package, |_| true);
    let cycles = dependencies.cycles(Scope::Package, |_| true);
    tree.set_measure(root, Metric::PackageEdgesWeight, MeasureValue::Int(weight as i64));
    tree.set_measure(root, Metric::PackageCycles, MeasureValue::Int(cycles as i64));
    debug!("Aggregated {} tree nodes", tree.len());
}

fn set_leaf_counts(tree: &mut SourceTree) {
    let counts = [
        (Scope::Method, Metric::Functions),
        (Scope::Class, Metric::Classes),
        (Scope::File, Metric::Files),
        (Scope::Package, Metric::Packages),
    ];
    for (scope, metric) in counts {
        for id in tree.ids(scope) {
            tree.set_measure(id, metric, MeasureValue::Int(1));
        }
    }
}

fn sum_up(tree: &mut SourceTree) {
    for id in tree.post_order() {
        for metric in Metric::SUM {
            if tree.measure(id, metric).is_some() {
                continue;
            }
            let total = tree
                .node(id)
                .children
                .iter()
                .filter_map(|&child| tree.measure(child, metric))
                .try_fold(None, |acc: Option<MeasureValue>, value| match acc {
                    None => Some(Some(value.clone())),
                    Some(acc) => acc.add(value).map(Some),
                });
            if let Some(Some(total)) = total {
                tree.set_measure(id, metric, total);
            }
        }
    }
}

fn set_coupling(tree: &mut SourceTree, dependencies: &DependencyGraph) {
    for scope in [Scope::Class, Scope::File, Scope::Package] {
        for id in tree.ids(scope) {
            let key = tree.node(id).key.clone();
            let ca = dependencies.afferent(scope, &key) as i64;
            let ce = dependencies.efferent(scope, &key) as i64;
            tree.set_measure(id, Metric::Ca, MeasureValue::Int(ca));
            tree.set_measure(id, Metric::Ce, MeasureValue::Int(ce));
        }
    }
}

/// File level: max RFC/LCOM4 over its classes, feeding the package rollup.
fn rollup_file(tree: &mut SourceTree, file: TreeId, rollup: &mut Rollup, config: &EngineConfig) {
    let mut rfc_distribution = Distribution::new(&config.rfc_distribution_limits);
    let mut lcom4_distribution = Distribution::new(&config.lcom4_distribution_limits);
    let mut max_rfc = None;
    let mut max_lcom4 = None;

    for &class in &tree.node(file).children {
        if let Some(rfc) = tree.measure(class, Metric::Rfc).and_then(MeasureValue::as_i64) {
            rfc_distribution.add(rfc);
            max_rfc = max_rfc.max(Some(rfc));
        }
        if let Some(lcom4) = tree.measure(class, Metric::Lcom4).and_then(MeasureValue::as_i64) {
            lcom4_distribution.add(lcom4);
            max_lcom4 = max_lcom4.max(Some(lcom4));
        }
    }

    rollup.rfc_distribution.merge(&rfc_distribution);
    rollup.lcom4_distribution.merge(&lcom4_distribution);
    if let Some(rfc) = max_rfc {
        tree.set_measure(file, Metric::Rfc, MeasureValue::Int(rfc));
        rollup.rfc_sum += rfc as f64;
        rollup.rfc_files += 1;
    }
    if let Some(lcom4) = max_lcom4 {
        tree.set_measure(file, Metric::Lcom4, MeasureValue::Int(lcom4));
        rollup.lcom4_sum += lcom4 as f64;
        rollup.lcom4_files += 1;
        if lcom4 > 1 {
            rollup.suspect_files += 1;
        }
    }
}

/// File-level values accumulated for a package or the project.
struct Rollup {
    rfc_sum: f64,
    rfc_files: u32,
    lcom4_sum: f64,
    lcom4_files: u32,
    suspect_files: u32,
    rfc_distribution: Distribution,
    lcom4_distribution: Distribution,
}

impl Rollup {
    fn new(config: &EngineConfig) -> Self {
        Self {
            rfc_sum: 0.0,
            rfc_files: 0,
            lcom4_sum: 0.0,
            lcom4_files: 0,
            suspect_files: 0,
            rfc_distribution: Distribution::new(&config.rfc_distribution_limits),
            lcom4_distribution: Distribution::new(&config.lcom4_distribution_limits),
        }
    }

    fn merge(&mut self, other: &Rollup) {
        self.rfc_sum += other.rfc_sum;
        self.rfc_files += other.rfc_files;
        self.lcom4_sum += other.lcom4_sum;
        self.lcom4_files += other.lcom4_files;
        self.suspect_files += other.suspect_files;
        self.rfc_distribution.merge(&other.rfc_distribution);
        self.lcom4_distribution.merge(&other.lcom4_distribution);
    }

    fn store(&self, tree: &mut SourceTree, id: TreeId) {
        if self.rfc_files > 0 {
            let mean = self.rfc_sum / f64::from(self.rfc_files);
            tree.set_measure(id, Metric::Rfc, MeasureValue::Double(mean));
        }
        if self.lcom4_files > 0 {
            let mean = self.lcom4_sum / f64::from(self.lcom4_files);
            let density = 100.0 * f64::from(self.suspect_files) / f64::from(self.lcom4_files);
            tree.set_measure(id, Metric::Lcom4, MeasureValue::Double(mean));
            tree.set_measure(id, Metric::SuspectLcom4Density, MeasureValue::Double(density));
        }
        tree.set_measure(
            id,
            Metric::RfcDistribution,
            MeasureValue::Distribution(self.rfc_distribution.clone()),
        );
        tree.set_measure(
            id,
            Metric::Lcom4Distribution,
            MeasureValue::Distribution(self.lcom4_distribution.clone()),
        );
    }
}
