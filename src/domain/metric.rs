use serde::{Deserialize, Serialize};
use std::fmt;

/// How a metric moves up the SourceCode tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationKind {
    /// Parent = own value if supplied, else the sum of its children.
    Sum,
    /// Computed independently at every level.
    Calculated,
    /// Bucketed histogram, persisted only above file level.
    Distribution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    // ============ Size (SUM) ============
    Lines,
    Ncloc,
    Statements,
    Complexity,
    Packages,
    Files,
    Classes,
    Functions,
    Accessors,

    // ============ Design (CALCULATED) ============
    Dit,
    Noc,
    Rfc,
    Lcom4,
    Lcom4Blocks,
    Ca,
    Ce,
    SuspectLcom4Density,
    FileEdgesWeight,
    PackageEdgesWeight,
    FileCycles,
    PackageCycles,

    // ============ Distributions ============
    RfcDistribution,
    Lcom4Distribution,
}

impl Metric {
    pub const SUM: [Metric; 9] = [
        Metric::Lines,
        Metric::Ncloc,
        Metric::Statements,
        Metric::Complexity,
        Metric::Packages,
        Metric::Files,
        Metric::Classes,
        Metric::Functions,
        Metric::Accessors,
    ];

    pub fn kind(self) -> AggregationKind {
        match self {
            Metric::Lines
            | Metric::Ncloc
            | Metric::Statements
            | Metric::Complexity
            | Metric::Packages
            | Metric::Files
            | Metric::Classes
            | Metric::Functions
            | Metric::Accessors => AggregationKind::Sum,
            Metric::RfcDistribution | Metric::Lcom4Distribution => AggregationKind::Distribution,
            _ => AggregationKind::Calculated,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Metric::Lines => "lines",
            Metric::Ncloc => "ncloc",
            Metric::Statements => "statements",
            Metric::Complexity => "complexity",
            Metric::Packages => "packages",
            Metric::Files => "files",
            Metric::Classes => "classes",
            Metric::Functions => "functions",
            Metric::Accessors => "accessors",
            Metric::Dit => "dit",
            Metric::Noc => "noc",
            Metric::Rfc => "rfc",
            Metric::Lcom4 => "lcom4",
            Metric::Lcom4Blocks => "lcom4_blocks",
            Metric::Ca => "ca",
            Metric::Ce => "ce",
            Metric::SuspectLcom4Density => "suspect_lcom4_density",
            Metric::FileEdgesWeight => "file_edges_weight",
            Metric::PackageEdgesWeight => "package_edges_weight",
            Metric::FileCycles => "file_cycles",
            Metric::PackageCycles => "package_cycles",
            Metric::RfcDistribution => "rfc_distribution",
            Metric::Lcom4Distribution => "lcom4_distribution",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Value stored against a metric on a tree node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MeasureValue {
    Int(i64),
    Double(f64),
    /// LCOM4 partition: member keys per block.
    Blocks(Vec<Vec<String>>),
    Distribution(Distribution),
}

impl MeasureValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MeasureValue::Int(v) => Some(*v as f64),
            MeasureValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MeasureValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric sum, staying integral while both sides are.
    pub fn add(&self, other: &MeasureValue) -> Option<MeasureValue> {
        match (self, other) {
            (MeasureValue::Int(a), MeasureValue::Int(b)) => Some(MeasureValue::Int(a + b)),
            _ => Some(MeasureValue::Double(self.as_f64()? + other.as_f64()?)),
        }
    }
}

impl fmt::Display for MeasureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureValue::Int(v) => write!(f, "{v}"),
            MeasureValue::Double(v) => write!(f, "{v:.1}"),
            MeasureValue::Blocks(blocks) => write!(f, "{} blocks", blocks.len()),
            MeasureValue::Distribution(d) => write!(f, "{d}"),
        }
    }
}

/// Histogram over bottom limits: a value lands in the bucket of the greatest
/// limit not above it; values below the first limit are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Distribution {
    pub limits: Vec<u32>,
    pub counts: Vec<u64>,
}

impl Distribution {
    pub fn new(limits: &[u32]) -> Self {
        Self {
            limits: limits.to_vec(),
            counts: vec![0; limits.len()],
        }
    }

    pub fn add(&mut self, value: i64) {
        let bucket = self.limits.iter().rposition(|&limit| value >= i64::from(limit));
        if let Some(bucket) = bucket {
            self.counts[bucket] += 1;
        }
    }

    /// Bucket-wise sum. Distributions built on different limits are left untouched.
    pub fn merge(&mut self, other: &Distribution) {
        if self.limits != other.limits {
            return;
        }
        for (count, more) in self.counts.iter_mut().zip(&other.counts) {
            *count += more;
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .limits
            .iter()
            .zip(&self.counts)
            .map(|(limit, count)| format!("{limit}={count}"))
            .collect();
        f.write_str(&pairs.join(";"))
    }
}
