use crate::app::engine::AnalysisReport;
use crate::domain::metric::Metric;
use crate::domain::source_tree::Scope;
use anyhow::{Context as _, Result, anyhow};
use regex::Regex;

const CLASS_COLUMNS: [Metric; 8] = [
    Metric::Dit,
    Metric::Noc,
    Metric::Rfc,
    Metric::Lcom4,
    Metric::Ca,
    Metric::Ce,
    Metric::Functions,
    Metric::Accessors,
];

const SUMMARY_ROWS: [Metric; 11] = [
    Metric::Packages,
    Metric::Files,
    Metric::Classes,
    Metric::Functions,
    Metric::Rfc,
    Metric::Lcom4,
    Metric::SuspectLcom4Density,
    Metric::PackageEdgesWeight,
    Metric::PackageCycles,
    Metric::RfcDistribution,
    Metric::Lcom4Distribution,
];

pub fn compile_filter(pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|p| Regex::new(p).with_context(|| format!("Invalid filter regex: {p}")))
        .transpose()
}

fn matches(filter: Option<&Regex>, key: &str) -> bool {
    filter.is_none_or(|re| re.is_match(key))
}

/// Per-class metric table followed by the project summary.
pub fn print_class_metrics(report: &AnalysisReport, filter: Option<&Regex>) {
    let tree = report.tree();
    let mut classes: Vec<_> = tree
        .ids(Scope::Class)
        .into_iter()
        .filter(|&id| matches(filter, &tree.node(id).key))
        .collect();
    classes.sort_by(|&a, &b| tree.node(a).key.cmp(&tree.node(b).key));

    println!("{}", "=".repeat(80));
    print!("{:<40}", "class");
    for metric in CLASS_COLUMNS {
        print!("{:>5}", short_label(metric));
    }
    println!();
    println!("{}", "-".repeat(80));

    for id in classes {
        let node = tree.node(id);
        print!("{:<40}", truncate(&node.key, 39));
        for metric in CLASS_COLUMNS {
            match tree.measure(id, metric) {
                Some(value) => print!("{:>5}", value.to_string()),
                None => print!("{:>5}", "-"),
            }
        }
        println!();
    }

    println!("{}", "=".repeat(80));
    let root = tree.root();
    println!("Project: {}", tree.node(root).key);
    for metric in SUMMARY_ROWS {
        if let Some(value) = tree.measure(root, metric) {
            println!("  {:<24} {}", metric.key(), value);
        }
    }
}

pub fn print_json(report: &AnalysisReport) -> Result<()> {
    let json = serde_json::to_string_pretty(&report.to_dto()).context("Failed to serialize report")?;
    println!("{json}");
    Ok(())
}

pub fn print_edges(report: &AnalysisReport, scope: Scope, filter: Option<&Regex>) {
    let edges = report.dependencies().edges(scope);
    println!("{}", "=".repeat(80));
    println!("{:?} dependencies", scope);
    println!("{}", "=".repeat(80));
    for edge in edges
        .iter()
        .filter(|e| matches(filter, &e.from) || matches(filter, &e.to))
    {
        println!(
            "{} -> {}  [{:?}, weight {}]",
            edge.from, edge.to, edge.usage, edge.weight
        );
    }
}

pub fn print_blocks(report: &AnalysisReport, class: &str) -> Result<()> {
    let blocks = report
        .blocks(class)
        .ok_or_else(|| anyhow!("No LCOM4 blocks for class: {class}"))?;
    println!("{}", "=".repeat(80));
    println!("{class}: LCOM4 = {}", blocks.len());
    println!("{}", "=".repeat(80));
    for (i, block) in blocks.iter().enumerate() {
        println!("Block {}:", i + 1);
        for member in block {
            println!("  {member}");
        }
    }
    Ok(())
}

pub fn print_overrides(report: &AnalysisReport, filter: Option<&Regex>) {
    println!("{}", "=".repeat(80));
    println!("Virtual dispatch links");
    println!("{}", "=".repeat(80));
    for link in report.overrides() {
        if !matches(filter, &link.method) {
            continue;
        }
        println!("{}", link.method);
        for implementation in &link.implementations {
            println!("  -> {implementation}");
        }
    }
}

fn short_label(metric: Metric) -> &'static str {
    match metric {
        Metric::Functions => "fn",
        Metric::Accessors => "acc",
        Metric::Lcom4 => "lcom",
        other => other.key(),
    }
}

fn truncate(key: &str, width: usize) -> String {
    if key.chars().count() <= width {
        return key.to_string();
    }
    let tail: String = key.chars().rev().take(width - 1).collect::<Vec<_>>().into_iter().rev().collect();
    format!("…{tail}")
}
