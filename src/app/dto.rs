use crate::domain::edge::Usage;
use crate::domain::metric::{MeasureValue, Metric};
use crate::domain::source_tree::Scope;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct ReportDto {
    pub project: String,
    pub resource_count: usize,
    pub edge_count: usize,
    pub nodes: Vec<NodeDto>,
    pub dependencies: Vec<DependencyDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeDto {
    pub key: String,
    pub scope: Scope,
    pub measures: BTreeMap<Metric, MeasureValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyDto {
    pub scope: Scope,
    pub from: String,
    pub to: String,
    pub usage: Usage,
    pub weight: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverrideDto {
    pub method: String,
    pub implementations: Vec<String>,
}
