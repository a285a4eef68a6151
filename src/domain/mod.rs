pub mod aggregation;
pub mod builder;
pub mod dependency;
pub mod edge;
pub mod graph;
pub mod linker;
pub mod metric;
pub mod metrics;
pub mod ports;
pub mod provider;
pub mod resource;
pub mod source_tree;
pub mod visitor;
